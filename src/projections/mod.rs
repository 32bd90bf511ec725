//! Session read models
//!
//! Projections fold the domain events produced by turns into views that can
//! be queried without touching the session store.

use crate::events::SessionDomainEvent;

pub mod session_activity;

pub use session_activity::{ActivityState, ActivityStatistics, SessionActivity, UserActivity};

/// Common trait for session projections
pub trait SessionProjection: Send + Sync {
    /// Update the projection based on an event
    fn apply_event(&mut self, event: &SessionDomainEvent);

    /// Get the projection ID
    fn id(&self) -> &str;
}
