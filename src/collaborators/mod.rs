//! External collaborators of the dialogue engine
//!
//! The engine reaches everything outside the session state through these
//! narrow traits:
//! - [`FaqCatalog`] lists question/answer entries
//! - [`InteractionLog`] records each exchange
//! - [`FreeTextResponder`] answers free text
//! - [`Outbox`] delivers replies to the user's channel
//!
//! In-memory implementations are provided for tests and local runs, along
//! with an OpenAI-compatible HTTP responder.

pub mod faq_catalog;
pub mod interaction_log;
pub mod outbox;
pub mod responder;

pub use faq_catalog::{default_faqs, FaqCatalog, InMemoryFaqCatalog};
pub use interaction_log::{InMemoryInteractionLog, InteractionHistory, InteractionLog};
pub use outbox::{Outbox, RecordingOutbox, SentMessage};
pub use responder::{FreeTextResponder, OpenAiResponder};
