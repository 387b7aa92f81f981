use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

use crate::error::ClientError;

/// Error body returned by the API.
///
/// The API answers with `{ "msg": ... }`; [RFC7807](https://tools.ietf.org/html/rfc7807)
/// bodies from proxies in front of it are understood as well.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Problem {
    #[serde(skip, default = "default_status")]
    pub status: StatusCode,

    #[serde(default)]
    pub msg: Option<String>,

    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,

    #[serde(flatten)]
    pub body: Map<String, Value>,
}

fn default_status() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

impl Default for Problem {
    fn default() -> Self {
        Problem {
            status: default_status(),
            msg: None,
            title: None,
            detail: None,
            body: Map::new(),
        }
    }
}

impl Problem {
    /// Reads an error body. Bodies that aren't JSON objects produce a problem
    /// without a message.
    pub fn from_body(status: StatusCode, body: &[u8]) -> Problem {
        let mut problem = serde_json::from_slice::<Problem>(body).unwrap_or_else(|_| {
            tracing::debug!("error response body isn't a JSON object");
            Problem::default()
        });
        problem.status = status;
        problem
    }

    pub fn message(&self) -> Option<String> {
        self.msg
            .clone()
            .or_else(|| self.detail.clone())
            .or_else(|| self.title.clone())
            .filter(|it| !it.trim().is_empty())
    }

    /// Field validation errors in the `errors: [{ "msg": ... }]` shape.
    pub fn field_errors(&self) -> Vec<String> {
        self.body
            .get("errors")
            .and_then(Value::as_array)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|it| it.get("msg").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Display for Problem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{}: {}", self.status, message),
            None => write!(f, "{}", self.status),
        }
    }
}

impl std::error::Error for Problem {}

impl From<Problem> for ClientError {
    fn from(problem: Problem) -> Self {
        let message = problem.message().or_else(|| {
            let errors = problem.field_errors();
            if errors.is_empty() {
                None
            } else {
                Some(errors.join(" "))
            }
        });

        ClientError::api(problem.status, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msg_field_is_preferred() {
        let p = Problem::from_body(
            StatusCode::BAD_REQUEST,
            br#"{"msg":"Invalid credentials","title":"Bad Request"}"#,
        );
        assert_eq!(p.message().as_deref(), Some("Invalid credentials"));
    }

    #[test]
    fn rfc7807_detail_is_understood() {
        let p = Problem::from_body(
            StatusCode::NOT_FOUND,
            br#"{"type":"about:blank","title":"Not Found","detail":"Quiz doesn't exist."}"#,
        );
        assert_eq!(p.message().as_deref(), Some("Quiz doesn't exist."));
    }

    #[test]
    fn non_json_body_has_no_message() {
        let p = Problem::from_body(StatusCode::BAD_GATEWAY, b"<html>oops</html>");
        assert_eq!(p.message(), None);
        assert_eq!(p.status, StatusCode::BAD_GATEWAY);

        match ClientError::from(p) {
            ClientError::Api { status, message } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert!(message.is_none());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn validation_errors_are_joined() {
        let p = Problem::from_body(
            StatusCode::BAD_REQUEST,
            br#"{"errors":[{"msg":"Email is invalid."},{"msg":"Password is too short."}]}"#,
        );
        assert_eq!(
            ClientError::from(p).message("fallback"),
            "Email is invalid. Password is too short."
        );
    }
}
