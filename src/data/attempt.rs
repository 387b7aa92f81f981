use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::question::Question;

/// Response of starting a quiz session. Questions come without answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStart {
    #[serde(default)]
    pub quiz_title: String,
    pub questions: Vec<Question>,
    /// Minutes; missing or `0` means unlimited.
    #[serde(default)]
    pub time_limit: Option<u32>,
}

impl SessionStart {
    /// Saturates rather than overflowing on absurd limits.
    pub fn time_limit_secs(&self) -> Option<u32> {
        match self.time_limit {
            Some(minutes) if minutes > 0 => Some(minutes.saturating_mul(60)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub answers: HashMap<String, String>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub score: f64,
    #[serde(default)]
    pub msg: Option<String>,
}
