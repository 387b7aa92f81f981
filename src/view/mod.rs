//! Derived, presentation-ready figures. Nothing here talks to the API.

use crate::data::question::{Question, QuestionType};

pub mod analytics;
pub mod assignments;
pub mod dashboard;

/// `m:ss`, as shown next to a running quiz.
pub fn format_time(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Turns what a student typed into the answer stored for `question`.
///
/// Multiple choice accepts the option itself or its 1-based number; true/false
/// accepts `t`/`f`, `true`/`false` and `yes`/`no`. Short answers are kept as
/// typed, minus surrounding whitespace.
pub fn resolve_answer(question: &Question, input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    match question.question_type {
        QuestionType::MultipleChoice => {
            if let Ok(n) = input.parse::<usize>() {
                return n
                    .checked_sub(1)
                    .and_then(|i| question.options.get(i))
                    .cloned();
            }
            question
                .options
                .iter()
                .find(|it| it.eq_ignore_ascii_case(input))
                .cloned()
        }
        QuestionType::TrueFalse => match input.to_ascii_lowercase().as_str() {
            "t" | "true" | "y" | "yes" => Some("true".to_string()),
            "f" | "false" | "n" | "no" => Some("false".to_string()),
            _ => None,
        },
        QuestionType::ShortAnswer => Some(input.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::question;

    #[test]
    fn time_is_minutes_and_padded_seconds() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(59), "0:59");
        assert_eq!(format_time(605), "10:05");
    }

    #[test]
    fn choices_resolve_by_number_or_text() {
        let mut q = question("q1");
        q.question_type = QuestionType::MultipleChoice;
        q.options = vec!["3".to_string(), "Four".to_string()];

        assert_eq!(resolve_answer(&q, "2").as_deref(), Some("Four"));
        assert_eq!(resolve_answer(&q, "four").as_deref(), Some("Four"));
        assert_eq!(resolve_answer(&q, "0"), None);
        assert_eq!(resolve_answer(&q, "5"), None);
        assert_eq!(resolve_answer(&q, "five"), None);
    }

    #[test]
    fn true_false_is_normalized() {
        let q = question("q1");
        assert_eq!(resolve_answer(&q, "T").as_deref(), Some("true"));
        assert_eq!(resolve_answer(&q, "no").as_deref(), Some("false"));
        assert_eq!(resolve_answer(&q, "maybe"), None);
    }

    #[test]
    fn short_answer_is_trimmed() {
        let mut q = question("q1");
        q.question_type = QuestionType::ShortAnswer;
        assert_eq!(resolve_answer(&q, "  Paris ").as_deref(), Some("Paris"));
        assert_eq!(resolve_answer(&q, "   "), None);
    }
}
