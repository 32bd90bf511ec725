//! Session domain events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::UserId;

/// Common surface of every session event
pub trait DomainEvent {
    /// Subject used when publishing the event
    fn subject(&self) -> String;

    /// Id of the session the event belongs to
    fn aggregate_id(&self) -> Uuid;

    /// Short event name
    fn event_type(&self) -> &'static str;
}

/// Session started on first contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStarted {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub started_at: DateTime<Utc>,
}

impl DomainEvent for SessionStarted {
    fn subject(&self) -> String {
        "chat.session.started.v1".to_string()
    }

    fn aggregate_id(&self) -> Uuid {
        self.session_id
    }

    fn event_type(&self) -> &'static str {
        "SessionStarted"
    }
}

/// User supplied their display name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameCaptured {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub display_name: String,
    pub captured_at: DateTime<Utc>,
}

impl DomainEvent for NameCaptured {
    fn subject(&self) -> String {
        "chat.session.name_captured.v1".to_string()
    }

    fn aggregate_id(&self) -> Uuid {
        self.session_id
    }

    fn event_type(&self) -> &'static str {
        "NameCaptured"
    }
}

/// Session removed by a reset/exit command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReset {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub reset_at: DateTime<Utc>,
}

impl DomainEvent for SessionReset {
    fn subject(&self) -> String {
        "chat.session.reset.v1".to_string()
    }

    fn aggregate_id(&self) -> Uuid {
        self.session_id
    }

    fn event_type(&self) -> &'static str {
        "SessionReset"
    }
}

/// Session dropped because it sat idle past the configured timeout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExpired {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub last_active_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
}

impl DomainEvent for SessionExpired {
    fn subject(&self) -> String {
        "chat.session.expired.v1".to_string()
    }

    fn aggregate_id(&self) -> Uuid {
        self.session_id
    }

    fn event_type(&self) -> &'static str {
        "SessionExpired"
    }
}

/// FAQ questions listed; session entered selection mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqListPresented {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub faq_ids: Vec<u64>,
    pub presented_at: DateTime<Utc>,
}

impl DomainEvent for FaqListPresented {
    fn subject(&self) -> String {
        "chat.faq.listed.v1".to_string()
    }

    fn aggregate_id(&self) -> Uuid {
        self.session_id
    }

    fn event_type(&self) -> &'static str {
        "FaqListPresented"
    }
}

/// A listed FAQ was selected and answered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqAnswered {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub faq_id: u64,
    pub position: usize,
    pub answered_at: DateTime<Utc>,
}

impl DomainEvent for FaqAnswered {
    fn subject(&self) -> String {
        "chat.faq.answered.v1".to_string()
    }

    fn aggregate_id(&self) -> Uuid {
        self.session_id
    }

    fn event_type(&self) -> &'static str {
        "FaqAnswered"
    }
}

/// A selection could not be honoured (not a number, or out of range)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqSelectionRejected {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub input: String,
    pub rejected_at: DateTime<Utc>,
}

impl DomainEvent for FaqSelectionRejected {
    fn subject(&self) -> String {
        "chat.faq.selection_rejected.v1".to_string()
    }

    fn aggregate_id(&self) -> Uuid {
        self.session_id
    }

    fn event_type(&self) -> &'static str {
        "FaqSelectionRejected"
    }
}

/// Free text handed to the responder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackAnswered {
    pub session_id: Uuid,
    pub user_id: UserId,
    /// False when the apology text was substituted
    pub responder_succeeded: bool,
    pub answered_at: DateTime<Utc>,
}

impl DomainEvent for FallbackAnswered {
    fn subject(&self) -> String {
        "chat.fallback.answered.v1".to_string()
    }

    fn aggregate_id(&self) -> Uuid {
        self.session_id
    }

    fn event_type(&self) -> &'static str {
        "FallbackAnswered"
    }
}

/// An inconsistent selection state was found and cleared back to idle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRepaired {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub repaired_at: DateTime<Utc>,
}

impl DomainEvent for SessionRepaired {
    fn subject(&self) -> String {
        "chat.session.repaired.v1".to_string()
    }

    fn aggregate_id(&self) -> Uuid {
        self.session_id
    }

    fn event_type(&self) -> &'static str {
        "SessionRepaired"
    }
}

/// Enum wrapper for all session domain events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionDomainEvent {
    SessionStarted(SessionStarted),
    NameCaptured(NameCaptured),
    SessionReset(SessionReset),
    SessionExpired(SessionExpired),
    FaqListPresented(FaqListPresented),
    FaqAnswered(FaqAnswered),
    FaqSelectionRejected(FaqSelectionRejected),
    FallbackAnswered(FallbackAnswered),
    SessionRepaired(SessionRepaired),
}

impl SessionDomainEvent {
    fn inner(&self) -> &dyn DomainEvent {
        match self {
            Self::SessionStarted(e) => e,
            Self::NameCaptured(e) => e,
            Self::SessionReset(e) => e,
            Self::SessionExpired(e) => e,
            Self::FaqListPresented(e) => e,
            Self::FaqAnswered(e) => e,
            Self::FaqSelectionRejected(e) => e,
            Self::FallbackAnswered(e) => e,
            Self::SessionRepaired(e) => e,
        }
    }

    /// User the event concerns
    pub fn user_id(&self) -> &UserId {
        match self {
            Self::SessionStarted(e) => &e.user_id,
            Self::NameCaptured(e) => &e.user_id,
            Self::SessionReset(e) => &e.user_id,
            Self::SessionExpired(e) => &e.user_id,
            Self::FaqListPresented(e) => &e.user_id,
            Self::FaqAnswered(e) => &e.user_id,
            Self::FaqSelectionRejected(e) => &e.user_id,
            Self::FallbackAnswered(e) => &e.user_id,
            Self::SessionRepaired(e) => &e.user_id,
        }
    }
}

impl DomainEvent for SessionDomainEvent {
    fn subject(&self) -> String {
        self.inner().subject()
    }

    fn aggregate_id(&self) -> Uuid {
        self.inner().aggregate_id()
    }

    fn event_type(&self) -> &'static str {
        self.inner().event_type()
    }
}
