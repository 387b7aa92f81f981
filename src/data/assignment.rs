use chrono::{DateTime, Utc};

use crate::error::ClientError;
use crate::util::split_list;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentStatus {
    Assigned,
    InProgress,
    Completed,
    Overdue,
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentStatus::Assigned => write!(f, "assigned"),
            AssignmentStatus::InProgress => write!(f, "in-progress"),
            AssignmentStatus::Completed => write!(f, "completed"),
            AssignmentStatus::Overdue => write!(f, "overdue"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuizRef {
    Id(String),
    Populated(QuizSummary),
}

impl QuizRef {
    pub fn id(&self) -> &str {
        match self {
            QuizRef::Id(id) => id,
            QuizRef::Populated(quiz) => &quiz.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            QuizRef::Populated(QuizSummary {
                title: Some(title), ..
            }) => title,
            _ => "Quiz",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "quizId")]
    pub quiz: QuizRef,
    pub student_id: String,
    pub due_date: DateTime<Utc>,
    pub status: AssignmentStatus,
}

impl Assignment {
    /// Display hint only; `status` as computed by the API is authoritative.
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now && self.status != AssignmentStatus::Completed
    }

    pub fn can_start(&self) -> bool {
        self.status == AssignmentStatus::Assigned
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub student_ids: Vec<String>,
    pub due_date: DateTime<Utc>,
}

impl AssignRequest {
    /// Builds a request from a comma separated list of student ids.
    pub fn parse(student_ids: &str, due_date: DateTime<Utc>) -> Result<AssignRequest, ClientError> {
        let student_ids = split_list(student_ids);
        if student_ids.is_empty() {
            return Err(ClientError::Validation(
                "At least one student id is required.".to_string(),
            ));
        }
        Ok(AssignRequest {
            student_ids,
            due_date,
        })
    }
}
