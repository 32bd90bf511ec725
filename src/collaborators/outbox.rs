//! Outbound delivery to the user's channel

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::errors::CollaboratorError;
use crate::value_objects::UserId;

/// Where replies go. One inbound turn may deliver zero, one or two messages.
#[async_trait]
pub trait Outbox: Send + Sync {
    async fn deliver(&self, user_id: &UserId, text: &str) -> Result<(), CollaboratorError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub user_id: UserId,
    pub text: String,
}

/// Outbox that keeps everything it was asked to send
#[derive(Debug, Default)]
pub struct RecordingOutbox {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Remove and return what has been sent so far
    pub async fn drain(&self) -> Vec<SentMessage> {
        std::mem::take(&mut *self.sent.lock().await)
    }
}

#[async_trait]
impl Outbox for RecordingOutbox {
    async fn deliver(&self, user_id: &UserId, text: &str) -> Result<(), CollaboratorError> {
        self.sent.lock().await.push(SentMessage {
            user_id: user_id.clone(),
            text: text.to_string(),
        });
        Ok(())
    }
}
