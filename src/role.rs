use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    /// Indicates whether user with role can author questions and quizzes.
    ///
    /// This only decides which views are offered; the API enforces it.
    pub fn can_author(self) -> bool {
        self == Role::Teacher
    }
}

impl std::default::Default for Role {
    fn default() -> Self {
        Role::Student
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Teacher => write!(f, "teacher"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}
