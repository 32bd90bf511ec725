//! Session aggregate - the per-user conversational context
//!
//! A session tracks:
//! - Whether the user's display name is known yet
//! - The current dialogue mode (idle or choosing from an FAQ list)
//! - A snapshot of the FAQ list being browsed, while in selection mode
//!
//! Every mutation returns the domain event it produced.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DialogError, DialogResult};
use crate::events::{
    FallbackAnswered, FaqAnswered, FaqListPresented, FaqSelectionRejected, NameCaptured,
    SessionDomainEvent, SessionExpired, SessionRepaired, SessionReset, SessionStarted,
};
use crate::value_objects::{FaqEntry, FaqSelection, UserId};

/// Current phase of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogState {
    /// Waiting for the user to say their name
    AwaitingName,
    /// Name known, no mode active
    Idle,
    /// Browsing a numbered FAQ list
    FaqSelection {
        /// Entries in the order they were listed; position `n-1` answers input `n`
        faqs: Vec<FaqEntry>,
    },
}

impl DialogState {
    /// Short label used in logs and projections
    pub fn label(&self) -> &'static str {
        match self {
            Self::AwaitingName => "awaiting_name",
            Self::Idle => "idle",
            Self::FaqSelection { .. } => "faq_selection",
        }
    }
}

/// Session aggregate root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique per session lifetime; a reset mints a new one
    session_id: Uuid,

    /// Owning user
    user_id: UserId,

    /// Set once, when the user answers the name prompt
    display_name: Option<String>,

    /// Dialogue mode
    state: DialogState,

    created_at: DateTime<Utc>,

    last_active_at: DateTime<Utc>,

    /// Incremented on every mutation
    version: u64,
}

impl Session {
    /// Start a session for a user seen for the first time
    pub fn start(user_id: UserId) -> (Self, SessionDomainEvent) {
        let now = Utc::now();
        let session = Self {
            session_id: Uuid::new_v4(),
            user_id: user_id.clone(),
            display_name: None,
            state: DialogState::AwaitingName,
            created_at: now,
            last_active_at: now,
            version: 0,
        };

        let event = SessionDomainEvent::SessionStarted(SessionStarted {
            session_id: session.session_id,
            user_id,
            started_at: now,
        });

        (session, event)
    }

    /// Get the session's ID
    pub fn id(&self) -> Uuid {
        self.session_id
    }

    /// Get the owning user
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Get the display name, if captured
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Get the dialogue state
    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_active_at(&self) -> DateTime<Utc> {
        self.last_active_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// A missing name means the session is awaiting one, whatever the nominal state
    pub fn is_awaiting_name(&self) -> bool {
        self.display_name.is_none() || self.state == DialogState::AwaitingName
    }

    /// The FAQ snapshot being browsed, empty outside selection mode
    pub fn active_faqs(&self) -> &[FaqEntry] {
        match &self.state {
            DialogState::FaqSelection { faqs } => faqs,
            _ => &[],
        }
    }

    /// Whether the session has been idle for longer than `ttl`
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_active_at) > ttl
    }

    /// Record activity without changing state
    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
        self.version += 1;
    }

    /// Capture the user's name and move to idle
    pub fn capture_name(&mut self, raw: &str) -> DialogResult<SessionDomainEvent> {
        if !self.is_awaiting_name() {
            return Err(DialogError::InvalidState(format!(
                "name already captured for {}",
                self.user_id
            )));
        }

        let name = raw.trim();
        if name.is_empty() {
            return Err(DialogError::InvalidState("display name is empty".to_string()));
        }

        self.display_name = Some(name.to_string());
        self.state = DialogState::Idle;
        self.touch();

        Ok(SessionDomainEvent::NameCaptured(NameCaptured {
            session_id: self.session_id,
            user_id: self.user_id.clone(),
            display_name: name.to_string(),
            captured_at: self.last_active_at,
        }))
    }

    /// Enter selection mode over a freshly fetched FAQ list.
    ///
    /// Replaces any list already being browsed.
    pub fn present_faqs(&mut self, faqs: Vec<FaqEntry>) -> DialogResult<SessionDomainEvent> {
        if self.is_awaiting_name() {
            return Err(DialogError::InvalidState(
                "cannot list FAQs before the name is known".to_string(),
            ));
        }
        if faqs.is_empty() {
            return Err(DialogError::InvalidState(
                "selection mode requires a non-empty FAQ list".to_string(),
            ));
        }

        let faq_ids = faqs.iter().map(|f| f.id).collect();
        self.state = DialogState::FaqSelection { faqs };
        self.touch();

        Ok(SessionDomainEvent::FaqListPresented(FaqListPresented {
            session_id: self.session_id,
            user_id: self.user_id.clone(),
            faq_ids,
            presented_at: self.last_active_at,
        }))
    }

    /// Interpret `input` as a selection from the active list.
    ///
    /// The state is left unchanged either way; a valid pick keeps the list
    /// so the user can select again.
    pub fn select_faq(&mut self, input: &str) -> DialogResult<(FaqSelection, SessionDomainEvent)> {
        let faqs = self.active_faqs();
        if faqs.is_empty() {
            return Err(DialogError::InvalidState(
                "no FAQ list is active".to_string(),
            ));
        }

        let selection = FaqSelection::parse(input, faqs.len());
        let now = Utc::now();
        let event = match selection {
            FaqSelection::Valid(index) => SessionDomainEvent::FaqAnswered(FaqAnswered {
                session_id: self.session_id,
                user_id: self.user_id.clone(),
                faq_id: faqs[index].id,
                position: index + 1,
                answered_at: now,
            }),
            FaqSelection::OutOfRange { .. } | FaqSelection::NotANumber => {
                SessionDomainEvent::FaqSelectionRejected(FaqSelectionRejected {
                    session_id: self.session_id,
                    user_id: self.user_id.clone(),
                    input: input.trim().to_string(),
                    rejected_at: now,
                })
            }
        };

        self.touch();
        Ok((selection, event))
    }

    /// Note a free-text turn answered by the responder (or the apology)
    pub fn record_fallback(&mut self, responder_succeeded: bool) -> SessionDomainEvent {
        self.touch();
        SessionDomainEvent::FallbackAnswered(FallbackAnswered {
            session_id: self.session_id,
            user_id: self.user_id.clone(),
            responder_succeeded,
            answered_at: self.last_active_at,
        })
    }

    /// Clear a selection state that has no list behind it.
    ///
    /// Returns the repair event when something was fixed.
    pub fn repair(&mut self) -> Option<SessionDomainEvent> {
        let corrupt = matches!(&self.state, DialogState::FaqSelection { faqs } if faqs.is_empty());
        let nameless = self.display_name.is_none() && self.state != DialogState::AwaitingName;
        if !corrupt && !nameless {
            return None;
        }

        self.state = if self.display_name.is_some() {
            DialogState::Idle
        } else {
            DialogState::AwaitingName
        };
        self.version += 1;

        Some(SessionDomainEvent::SessionRepaired(SessionRepaired {
            session_id: self.session_id,
            user_id: self.user_id.clone(),
            repaired_at: Utc::now(),
        }))
    }

    /// End the session on a reset/exit command
    pub fn reset(self) -> SessionDomainEvent {
        SessionDomainEvent::SessionReset(SessionReset {
            session_id: self.session_id,
            user_id: self.user_id,
            reset_at: Utc::now(),
        })
    }

    /// End the session because it sat idle too long
    pub fn expire(self) -> SessionDomainEvent {
        SessionDomainEvent::SessionExpired(SessionExpired {
            session_id: self.session_id,
            user_id: self.user_id,
            last_active_at: self.last_active_at,
            expired_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named_session() -> Session {
        let (mut session, _) = Session::start(UserId::new("U1"));
        session.capture_name("Sam").unwrap();
        session
    }

    fn catalog() -> Vec<FaqEntry> {
        vec![
            FaqEntry::new(1, "Return policy?", "30-day refund"),
            FaqEntry::new(2, "Hours?", "9 to 6"),
        ]
    }

    #[test]
    fn test_new_session_awaits_name() {
        let (session, event) = Session::start(UserId::new("U1"));
        assert!(session.is_awaiting_name());
        assert_eq!(session.display_name(), None);
        assert!(matches!(event, SessionDomainEvent::SessionStarted(_)));
    }

    #[test]
    fn test_capture_name_trims_and_goes_idle() {
        let (mut session, _) = Session::start(UserId::new("U1"));
        session.capture_name("  Sam \n").unwrap();
        assert_eq!(session.display_name(), Some("Sam"));
        assert_eq!(session.state(), &DialogState::Idle);
        assert!(session.capture_name("Other").is_err());
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let (mut session, _) = Session::start(UserId::new("U1"));
        assert!(session.capture_name("   ").is_err());
        assert!(session.is_awaiting_name());
    }

    #[test]
    fn test_present_faqs_requires_entries() {
        let mut session = named_session();
        assert!(session.present_faqs(Vec::new()).is_err());
        assert_eq!(session.state(), &DialogState::Idle);

        session.present_faqs(catalog()).unwrap();
        assert_eq!(session.active_faqs().len(), 2);
    }

    #[test]
    fn test_select_keeps_list() {
        let mut session = named_session();
        session.present_faqs(catalog()).unwrap();

        let (selection, event) = session.select_faq("2").unwrap();
        assert_eq!(selection, FaqSelection::Valid(1));
        assert!(matches!(event, SessionDomainEvent::FaqAnswered(ref e) if e.faq_id == 2));
        assert_eq!(session.active_faqs().len(), 2);

        let (selection, _) = session.select_faq("9").unwrap();
        assert_eq!(selection, FaqSelection::OutOfRange { requested: 9, max: 2 });
    }

    #[test]
    fn test_repair_clears_empty_selection() {
        let mut session = named_session();
        session.state = DialogState::FaqSelection { faqs: Vec::new() };

        assert!(session.repair().is_some());
        assert_eq!(session.state(), &DialogState::Idle);
        assert!(session.repair().is_none());
    }

    #[test]
    fn test_nameless_idle_is_awaiting_name() {
        let (mut session, _) = Session::start(UserId::new("U1"));
        session.state = DialogState::Idle;
        assert!(session.is_awaiting_name());
        assert!(session.repair().is_some());
        assert_eq!(session.state(), &DialogState::AwaitingName);
    }

    #[test]
    fn test_expiry() {
        let session = named_session();
        let later = session.last_active_at() + Duration::minutes(31);
        assert!(session.is_expired(Duration::minutes(30), later));
        assert!(!session.is_expired(Duration::minutes(30), session.last_active_at()));
    }
}
