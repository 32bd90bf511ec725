//! SessionActivity projection - who is talking to the assistant and how
//!
//! Tracks one entry per live session plus running counters over every event
//! seen since the projection was created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::SessionProjection;
use crate::events::SessionDomainEvent;
use crate::value_objects::UserId;

/// Dialogue phase as seen by the read model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityState {
    AwaitingName,
    Idle,
    FaqSelection,
}

/// Live session summary for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserActivity {
    pub user_id: UserId,
    pub session_id: Uuid,
    pub display_name: Option<String>,
    pub state: ActivityState,
    pub started_at: DateTime<Utc>,
    pub last_event_at: DateTime<Utc>,
    pub faq_answers: u32,
    pub fallbacks: u32,
}

/// Running totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStatistics {
    pub active_sessions: usize,
    pub sessions_started: u64,
    pub names_captured: u64,
    pub resets: u64,
    pub expirations: u64,
    pub faq_lists: u64,
    pub faq_answers: u64,
    pub selections_rejected: u64,
    pub fallbacks: u64,
    pub fallback_failures: u64,
    pub repairs: u64,
}

#[derive(Debug, Clone, Default)]
pub struct SessionActivity {
    users: HashMap<UserId, UserActivity>,
    stats: ActivityStatistics,
}

impl SessionActivity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self, user_id: &UserId) -> Option<&UserActivity> {
        self.users.get(user_id)
    }

    /// Live sessions, ordered by user id
    pub fn active_users(&self) -> Vec<&UserActivity> {
        let mut users: Vec<&UserActivity> = self.users.values().collect();
        users.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        users
    }

    pub fn users_in(&self, state: ActivityState) -> Vec<&UserActivity> {
        self.active_users()
            .into_iter()
            .filter(|u| u.state == state)
            .collect()
    }

    pub fn statistics(&self) -> ActivityStatistics {
        ActivityStatistics {
            active_sessions: self.users.len(),
            ..self.stats.clone()
        }
    }

    fn touch(&mut self, user_id: &UserId, at: DateTime<Utc>) -> Option<&mut UserActivity> {
        let user = self.users.get_mut(user_id)?;
        user.last_event_at = at;
        Some(user)
    }
}

impl SessionProjection for SessionActivity {
    fn apply_event(&mut self, event: &SessionDomainEvent) {
        match event {
            SessionDomainEvent::SessionStarted(e) => {
                self.stats.sessions_started += 1;
                self.users.insert(
                    e.user_id.clone(),
                    UserActivity {
                        user_id: e.user_id.clone(),
                        session_id: e.session_id,
                        display_name: None,
                        state: ActivityState::AwaitingName,
                        started_at: e.started_at,
                        last_event_at: e.started_at,
                        faq_answers: 0,
                        fallbacks: 0,
                    },
                );
            }
            SessionDomainEvent::NameCaptured(e) => {
                self.stats.names_captured += 1;
                if let Some(user) = self.touch(&e.user_id, e.captured_at) {
                    user.display_name = Some(e.display_name.clone());
                    user.state = ActivityState::Idle;
                }
            }
            SessionDomainEvent::SessionReset(e) => {
                self.stats.resets += 1;
                self.users.remove(&e.user_id);
            }
            SessionDomainEvent::SessionExpired(e) => {
                self.stats.expirations += 1;
                self.users.remove(&e.user_id);
            }
            SessionDomainEvent::FaqListPresented(e) => {
                self.stats.faq_lists += 1;
                if let Some(user) = self.touch(&e.user_id, e.presented_at) {
                    user.state = ActivityState::FaqSelection;
                }
            }
            SessionDomainEvent::FaqAnswered(e) => {
                self.stats.faq_answers += 1;
                if let Some(user) = self.touch(&e.user_id, e.answered_at) {
                    user.faq_answers += 1;
                }
            }
            SessionDomainEvent::FaqSelectionRejected(e) => {
                self.stats.selections_rejected += 1;
                self.touch(&e.user_id, e.rejected_at);
            }
            SessionDomainEvent::FallbackAnswered(e) => {
                self.stats.fallbacks += 1;
                if !e.responder_succeeded {
                    self.stats.fallback_failures += 1;
                }
                if let Some(user) = self.touch(&e.user_id, e.answered_at) {
                    user.fallbacks += 1;
                }
            }
            SessionDomainEvent::SessionRepaired(e) => {
                self.stats.repairs += 1;
                if let Some(user) = self.touch(&e.user_id, e.repaired_at) {
                    user.state = if user.display_name.is_some() {
                        ActivityState::Idle
                    } else {
                        ActivityState::AwaitingName
                    };
                }
            }
        }
    }

    fn id(&self) -> &str {
        "session_activity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Session;
    use crate::value_objects::FaqEntry;

    #[test]
    fn test_tracks_lifecycle() {
        let mut activity = SessionActivity::new();
        let (mut session, started) = Session::start(UserId::new("U1"));
        activity.apply_event(&started);
        assert_eq!(
            activity.user(&UserId::new("U1")).unwrap().state,
            ActivityState::AwaitingName
        );

        activity.apply_event(&session.capture_name("Sam").unwrap());
        activity.apply_event(&session.present_faqs(vec![FaqEntry::new(1, "Q", "A")]).unwrap());
        let (_, answered) = session.select_faq("1").unwrap();
        activity.apply_event(&answered);

        let user = activity.user(&UserId::new("U1")).unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Sam"));
        assert_eq!(user.state, ActivityState::FaqSelection);
        assert_eq!(user.faq_answers, 1);
        assert_eq!(activity.users_in(ActivityState::FaqSelection).len(), 1);

        activity.apply_event(&session.reset());
        let stats = activity.statistics();
        assert_eq!(stats.active_sessions, 0);
        assert_eq!(stats.sessions_started, 1);
        assert_eq!(stats.resets, 1);
        assert_eq!(stats.faq_answers, 1);
        assert_eq!(activity.id(), "session_activity");
    }

    #[test]
    fn test_counts_failed_fallbacks() {
        let mut activity = SessionActivity::new();
        let (mut session, started) = Session::start(UserId::new("U1"));
        activity.apply_event(&started);
        activity.apply_event(&session.capture_name("Sam").unwrap());
        activity.apply_event(&session.record_fallback(true));
        activity.apply_event(&session.record_fallback(false));

        let stats = activity.statistics();
        assert_eq!(stats.fallbacks, 2);
        assert_eq!(stats.fallback_failures, 1);
        assert_eq!(activity.user(&UserId::new("U1")).unwrap().fallbacks, 2);
    }
}
