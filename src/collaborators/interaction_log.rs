//! Interaction log contract and an in-memory log

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::CollaboratorError;
use crate::value_objects::{InteractionRecord, UserId};

/// Append-only sink for exchanges
#[async_trait]
pub trait InteractionLog: Send + Sync {
    async fn append(&self, record: InteractionRecord) -> Result<(), CollaboratorError>;
}

/// Read side of a log, used by queries only
#[async_trait]
pub trait InteractionHistory: Send + Sync {
    /// Records in append order, optionally restricted to one user
    async fn records(&self, user_id: Option<&UserId>) -> Result<Vec<InteractionRecord>, CollaboratorError>;
}

#[derive(Debug, Default)]
pub struct InMemoryInteractionLog {
    records: RwLock<Vec<InteractionRecord>>,
}

impl InMemoryInteractionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything logged so far
    pub async fn snapshot(&self) -> Vec<InteractionRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl InteractionLog for InMemoryInteractionLog {
    async fn append(&self, record: InteractionRecord) -> Result<(), CollaboratorError> {
        self.records.write().await.push(record);
        Ok(())
    }
}

#[async_trait]
impl InteractionHistory for InMemoryInteractionLog {
    async fn records(&self, user_id: Option<&UserId>) -> Result<Vec<InteractionRecord>, CollaboratorError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| user_id.is_none_or(|id| &r.user_id == id))
            .cloned()
            .collect())
    }
}
