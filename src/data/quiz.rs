use chrono::{DateTime, Utc};

use super::question::Question;
use crate::error::ClientError;

/// A quiz lists its questions either by id or, on some endpoints, populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionRef {
    Id(String),
    Populated(Question),
}

impl QuestionRef {
    pub fn id(&self) -> &str {
        match self {
            QuestionRef::Id(id) => id,
            QuestionRef::Populated(question) => &question.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<QuestionRef>,
    /// Minutes; `0` means unlimited.
    #[serde(default)]
    pub time_limit: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Quiz {
    pub fn question_ids(&self) -> Vec<&str> {
        self.questions.iter().map(QuestionRef::id).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuiz {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<String>,
    #[serde(default)]
    pub time_limit: u32,
}

impl NewQuiz {
    /// Adds the question if it isn't selected yet, removes it otherwise.
    pub fn toggle_question(&mut self, question_id: &str) {
        if let Some(i) = self.questions.iter().position(|it| it == question_id) {
            self.questions.remove(i);
        } else {
            self.questions.push(question_id.to_string());
        }
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.title.trim().is_empty() {
            return Err(ClientError::Validation("Quiz title is required.".to_string()));
        }
        if self.questions.is_empty() {
            return Err(ClientError::Validation(
                "Please select at least one question".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&Quiz> for NewQuiz {
    fn from(quiz: &Quiz) -> Self {
        NewQuiz {
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            questions: quiz
                .question_ids()
                .into_iter()
                .map(str::to_string)
                .collect(),
            time_limit: quiz.time_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_accepts_ids_and_populated_questions() {
        let quiz: Quiz = serde_json::from_str(
            r#"{
                "_id": "z1",
                "title": "Algebra",
                "questions": [
                    "q1",
                    {"_id": "q2", "questionText": "x?", "questionType": "short-answer"}
                ],
                "timeLimit": 15,
                "createdAt": "2024-03-01T10:00:00Z"
            }"#,
        )
        .expect("valid quiz");

        assert_eq!(quiz.question_ids(), vec!["q1", "q2"]);
        assert_eq!(quiz.time_limit, 15);
        assert!(quiz.created_at.is_some());
        assert_eq!(quiz.description, "");
    }

    #[test]
    fn toggling_keeps_selection_order() {
        let mut quiz = NewQuiz::default();
        quiz.toggle_question("a");
        quiz.toggle_question("b");
        quiz.toggle_question("c");
        quiz.toggle_question("b");
        assert_eq!(quiz.questions, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn empty_question_selection_is_rejected() {
        let quiz = NewQuiz {
            title: "Empty".to_string(),
            ..Default::default()
        };
        let err = quiz.validate().unwrap_err();
        assert_eq!(err.message(""), "Please select at least one question");
    }
}
