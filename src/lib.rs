//! Chat dialogue engine
//!
//! Turns inbound chat messages into contextual replies by tracking a
//! lightweight per-user dialogue state. It provides:
//! - Name capture on first contact
//! - A numbered FAQ menu with repeatable selection
//! - Reset/exit from any state
//! - Free-text fallback to a natural-language responder
//! - Best-effort logging of every exchange
//!
//! Transport, FAQ storage, message-log persistence and the responder are
//! collaborators reached through the traits in [`collaborators`].

pub mod aggregate;
pub mod collaborators;
pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod projections;
pub mod queries;
pub mod routing;
pub mod store;
pub mod value_objects;

// Re-export main types
pub use aggregate::{DialogState, Session};

pub use collaborators::{
    default_faqs, FaqCatalog, FreeTextResponder, InMemoryFaqCatalog, InMemoryInteractionLog,
    InteractionHistory, InteractionLog, OpenAiResponder, Outbox, RecordingOutbox, SentMessage,
};

pub use config::{EngineConfig, ReplyTemplates, ResponderConfig};
pub use errors::{CollaboratorError, DialogError, DialogResult};

pub use events::{
    DomainEvent, FallbackAnswered, FaqAnswered, FaqListPresented, FaqSelectionRejected,
    NameCaptured, SessionDomainEvent, SessionExpired, SessionRepaired, SessionReset,
    SessionStarted,
};

pub use handlers::{Collaborators, DialogueEngine, TurnOutcome};
pub use projections::{ActivityState, ActivityStatistics, SessionActivity, SessionProjection, UserActivity};
pub use queries::{ChatQuery, ChatQueryHandler, ChatQueryResult};
pub use routing::{Rule, TurnRouter};
pub use store::{SessionLease, SessionStore};

pub use value_objects::{FaqEntry, FaqSelection, InteractionRecord, Keyword, UserId};
