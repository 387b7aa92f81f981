use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("configuration file not found in '{0}'")]
    NotFound(PathBuf),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid API root: {0}")]
    ApiRoot(#[from] url::ParseError),
    #[error("invalid auth header name '{0}'")]
    AuthHeader(String),
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token isn't a JWT; expected three '.' separated segments")]
    Segments,
    #[error("token payload isn't valid base64")]
    Base64(#[from] base64::DecodeError),
    #[error("token payload doesn't contain user claims")]
    Claims(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The API rejected the auth token. Session state has already been
    /// cleared when this is returned from [`ApiClient`](crate::api::http::ApiClient).
    #[error("session expired; please log in again")]
    SessionExpired,
    #[error("{status}: {}", message.as_deref().unwrap_or("request failed"))]
    Api {
        status: StatusCode,
        message: Option<String>,
    },
    #[error("{0}")]
    Validation(String),
    #[error("request was aborted")]
    Aborted,

    // External errors
    #[error(transparent)]
    Network(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Storage(#[from] std::io::Error),
}

impl ClientError {
    pub fn api(status: StatusCode, message: Option<String>) -> ClientError {
        ClientError::Api { status, message }
    }

    /// Text shown to the user for a failed operation.
    ///
    /// Server provided messages and local validation failures are shown as-is,
    /// everything else collapses into `fallback`.
    pub fn message(&self, fallback: &str) -> String {
        match self {
            ClientError::Api {
                message: Some(message),
                ..
            } => message.clone(),
            ClientError::Validation(message) => message.clone(),
            ClientError::SessionExpired => self.to_string(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ClientError::SessionExpired)
    }
}
