//! Read-side queries for operators and dashboards
//!
//! Answers questions about the FAQ catalog, the interaction log and live
//! session activity without going through the dialogue engine.

use crate::collaborators::{FaqCatalog, InteractionHistory};
use crate::projections::{ActivityState, ActivityStatistics, SessionActivity, UserActivity};
use crate::value_objects::{FaqEntry, InteractionRecord, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Query types for the chat domain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatQuery {
    /// Every FAQ entry, in catalog order
    ListFaqs,

    /// Logged exchanges, optionally for a single user
    ListMessages { user_id: Option<UserId> },

    /// Live session summary for one user
    GetUserActivity { user_id: UserId },

    /// All live sessions, optionally only those in one state
    GetActiveUsers { state: Option<ActivityState> },

    /// Running totals
    GetStatistics,
}

/// Query result for chat queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatQueryResult {
    Faqs(Vec<FaqEntry>),
    Messages(Vec<InteractionRecord>),
    User(Option<UserActivity>),
    Users(Vec<UserActivity>),
    Statistics(ActivityStatistics),
    /// A backing collaborator failed
    Error(String),
}

/// Chat query handler
pub struct ChatQueryHandler {
    catalog: Arc<dyn FaqCatalog>,
    history: Arc<dyn InteractionHistory>,
    activity: Arc<RwLock<SessionActivity>>,
}

impl ChatQueryHandler {
    pub fn new(
        catalog: Arc<dyn FaqCatalog>,
        history: Arc<dyn InteractionHistory>,
        activity: Arc<RwLock<SessionActivity>>,
    ) -> Self {
        Self {
            catalog,
            history,
            activity,
        }
    }

    /// Execute a query
    pub async fn execute(&self, query: ChatQuery) -> ChatQueryResult {
        match query {
            ChatQuery::ListFaqs => self.list_faqs().await,
            ChatQuery::ListMessages { user_id } => self.list_messages(user_id.as_ref()).await,
            ChatQuery::GetUserActivity { user_id } => {
                let activity = self.activity.read().await;
                ChatQueryResult::User(activity.user(&user_id).cloned())
            }
            ChatQuery::GetActiveUsers { state } => {
                let activity = self.activity.read().await;
                let users = match state {
                    Some(state) => activity.users_in(state),
                    None => activity.active_users(),
                };
                ChatQueryResult::Users(users.into_iter().cloned().collect())
            }
            ChatQuery::GetStatistics => {
                ChatQueryResult::Statistics(self.activity.read().await.statistics())
            }
        }
    }

    async fn list_faqs(&self) -> ChatQueryResult {
        match self.catalog.list_all().await {
            Ok(faqs) => ChatQueryResult::Faqs(faqs),
            Err(e) => {
                tracing::warn!(error = %e, "listing FAQs failed");
                ChatQueryResult::Error(e.to_string())
            }
        }
    }

    async fn list_messages(&self, user_id: Option<&UserId>) -> ChatQueryResult {
        match self.history.records(user_id).await {
            Ok(records) => ChatQueryResult::Messages(records),
            Err(e) => {
                tracing::warn!(error = %e, "listing messages failed");
                ChatQueryResult::Error(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Session;
    use crate::collaborators::{default_faqs, InMemoryFaqCatalog, InMemoryInteractionLog, InteractionLog};
    use crate::projections::SessionProjection;

    #[tokio::test]
    async fn test_query_handler() {
        let catalog = Arc::new(InMemoryFaqCatalog::with_entries(default_faqs()));
        let log = Arc::new(InMemoryInteractionLog::new());
        log.append(InteractionRecord::new(UserId::new("U1"), "hi", "hello"))
            .await
            .unwrap();

        let mut activity = SessionActivity::new();
        let (_, started) = Session::start(UserId::new("U1"));
        activity.apply_event(&started);

        let handler = ChatQueryHandler::new(catalog, log, Arc::new(RwLock::new(activity)));

        match handler.execute(ChatQuery::ListFaqs).await {
            ChatQueryResult::Faqs(faqs) => assert_eq!(faqs.len(), 3),
            other => panic!("Expected FAQs, got {other:?}"),
        }

        match handler
            .execute(ChatQuery::ListMessages {
                user_id: Some(UserId::new("U1")),
            })
            .await
        {
            ChatQueryResult::Messages(records) => assert_eq!(records.len(), 1),
            other => panic!("Expected messages, got {other:?}"),
        }

        match handler
            .execute(ChatQuery::GetActiveUsers {
                state: Some(ActivityState::AwaitingName),
            })
            .await
        {
            ChatQueryResult::Users(users) => assert_eq!(users.len(), 1),
            other => panic!("Expected users, got {other:?}"),
        }

        match handler.execute(ChatQuery::GetStatistics).await {
            ChatQueryResult::Statistics(stats) => {
                assert_eq!(stats.active_sessions, 1);
                assert_eq!(stats.sessions_started, 1);
            }
            other => panic!("Expected statistics, got {other:?}"),
        }
    }
}
