//! Error types for the dialogue engine and its collaborators

use std::time::Duration;

use crate::value_objects::UserId;

/// Failure reported by an external collaborator (catalog, log, responder, outbox)
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    /// The collaborator could not be reached or refused to serve
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete within its deadline
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Transport-level HTTP failure
    #[error("HTTP: {0}")]
    Http(String),

    /// The responder answered but produced no usable text
    #[error("empty response")]
    EmptyResponse,

    /// The collaborator rejected the request
    #[error("rejected: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Unavailable(format!("request timed out: {e}"))
        } else {
            Self::Http(e.to_string())
        }
    }
}

/// Errors surfaced by the dialogue engine
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// The final reply of a turn could not be handed to the transport
    #[error("failed to deliver reply to {user_id}: {source}")]
    Delivery {
        user_id: UserId,
        #[source]
        source: CollaboratorError,
    },

    #[error("config: {0}")]
    Config(String),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

pub type DialogResult<T> = Result<T, DialogError>;
