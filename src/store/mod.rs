//! Client side state containers.
//!
//! Each store owns a [`tokio::sync::watch`] channel; every completed call
//! results in at most one state update, which subscribers are notified of.

use thiserror::Error;

use crate::error::ClientError;

pub mod auth;
pub mod quiz;
pub mod storage;

/// Failed store operation, carrying the text to show the user.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ActionError {
    pub message: String,
    #[source]
    pub source: ClientError,
}

impl ActionError {
    pub fn new(source: ClientError, fallback: &str) -> ActionError {
        ActionError {
            message: source.message(fallback),
            source,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        self.source.is_session_expired()
    }
}

pub(crate) trait OrMessage<T> {
    fn or_message(self, fallback: &str) -> Result<T, ActionError>;
}

impl<T> OrMessage<T> for Result<T, ClientError> {
    fn or_message(self, fallback: &str) -> Result<T, ActionError> {
        self.map_err(|e| ActionError::new(e, fallback))
    }
}
