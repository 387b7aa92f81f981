use crate::error::ClientError;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

impl Default for QuestionType {
    fn default() -> Self {
        QuestionType::MultipleChoice
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionType::MultipleChoice => write!(f, "multiple-choice"),
            QuestionType::TrueFalse => write!(f, "true-false"),
            QuestionType::ShortAnswer => write!(f, "short-answer"),
        }
    }
}

impl std::str::FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple-choice" | "mc" => Ok(QuestionType::MultipleChoice),
            "true-false" | "tf" => Ok(QuestionType::TrueFalse),
            "short-answer" | "short" => Ok(QuestionType::ShortAnswer),
            other => Err(format!("unknown question type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: String,
    pub question_text: String,
    #[serde(default)]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    /// Absent when the API hides answers, e.g. in a started quiz session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// Payload for creating a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    pub question_text: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    pub answer: String,
}

impl NewQuestion {
    /// Trims options and drops blank ones. Only multiple choice questions
    /// keep options at all.
    pub fn normalized(mut self) -> NewQuestion {
        self.options = match self.question_type {
            QuestionType::MultipleChoice => self
                .options
                .iter()
                .map(|it| it.trim())
                .filter(|it| !it.is_empty())
                .map(str::to_string)
                .collect(),
            _ => vec![],
        };
        self
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.question_text.trim().is_empty() {
            return Err(ClientError::Validation(
                "Question text is required.".to_string(),
            ));
        }
        if self.answer.trim().is_empty() {
            return Err(ClientError::Validation("Answer is required.".to_string()));
        }
        if self.question_type == QuestionType::MultipleChoice && self.options.len() < 2 {
            return Err(ClientError::Validation(
                "Multiple choice questions need at least two options.".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadFileType {
    Json,
    Csv,
}

impl UploadFileType {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadFileType::Json => "json",
            UploadFileType::Csv => "csv",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            UploadFileType::Json => "application/json",
            UploadFileType::Csv => "text/csv",
        }
    }

    /// Guess from a file extension.
    pub fn from_path(path: &std::path::Path) -> Option<UploadFileType> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(UploadFileType::Json),
            "csv" => Some(UploadFileType::Csv),
            _ => None,
        }
    }
}

/// Bulk question file sent as the `questionsFile` multipart field.
#[derive(Debug, Clone)]
pub struct QuestionUpload {
    pub file_name: String,
    pub file_type: UploadFileType,
    pub contents: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_reads_api_json() {
        let q: Question = serde_json::from_str(
            r#"{"_id":"q1","questionText":"2+2?","questionType":"multiple-choice","options":["3","4"],"answer":"4"}"#,
        )
        .expect("valid question");

        assert_eq!(q.id, "q1");
        assert_eq!(q.question_type, QuestionType::MultipleChoice);
        assert_eq!(q.answer.as_deref(), Some("4"));
    }

    #[test]
    fn session_questions_may_omit_answer() {
        let q: Question = serde_json::from_str(
            r#"{"_id":"q2","questionText":"Sky is blue","questionType":"true-false"}"#,
        )
        .expect("valid question");

        assert!(q.answer.is_none());
        assert!(q.options.is_empty());
    }

    #[test]
    fn normalizing_drops_blank_options() {
        let q = NewQuestion {
            question_text: "Pick".to_string(),
            question_type: QuestionType::MultipleChoice,
            options: vec![" a ".into(), "".into(), "b".into(), "   ".into()],
            answer: "a".to_string(),
        }
        .normalized();
        assert_eq!(q.options, vec!["a".to_string(), "b".to_string()]);
        assert!(q.validate().is_ok());

        let tf = NewQuestion {
            question_type: QuestionType::TrueFalse,
            answer: "true".to_string(),
            ..q
        }
        .normalized();
        assert!(tf.options.is_empty());
        assert!(tf.validate().is_ok());
    }

    #[test]
    fn multiple_choice_needs_two_options() {
        let q = NewQuestion {
            question_text: "Pick".to_string(),
            question_type: QuestionType::MultipleChoice,
            options: vec!["only".into()],
            answer: "only".to_string(),
        };
        assert!(q.validate().is_err());
    }
}
