//! Dialogue engine: turns one inbound message into a reply
//!
//! A turn runs under the user's session lease, so turns for the same user are
//! processed one at a time while different users proceed in parallel:
//! 1. Drop the session if it expired, repair it if inconsistent
//! 2. Route the message through the ordered rule table
//! 3. Apply the rule (possibly querying the catalog or the responder)
//! 4. Start the log append, then deliver the reply
//!
//! Collaborator failures are absorbed here and turned into degraded replies.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::task::JoinSet;

use crate::aggregate::Session;
use crate::collaborators::{FaqCatalog, FreeTextResponder, InteractionLog, Outbox};
use crate::config::EngineConfig;
use crate::errors::{CollaboratorError, DialogError, DialogResult};
use crate::events::{DomainEvent, SessionDomainEvent};
use crate::projections::{SessionActivity, SessionProjection};
use crate::routing::{RouteContext, Rule, TurnRouter};
use crate::store::{SessionLease, SessionStore};
use crate::value_objects::{FaqSelection, InteractionRecord, UserId};

/// Everything the engine talks to besides its own session store
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn FaqCatalog>,
    pub log: Arc<dyn InteractionLog>,
    pub responder: Arc<dyn FreeTextResponder>,
    pub outbox: Arc<dyn Outbox>,
}

/// Result of one turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Rule that handled the message
    pub rule: Rule,
    /// Final reply, as delivered and logged
    pub reply: String,
    /// Whether a "thinking" acknowledgement went out before the reply
    pub acknowledged: bool,
    /// Domain events produced during the turn
    pub events: Vec<SessionDomainEvent>,
}

/// The per-user dialogue state machine.
///
/// Dropping the engine detaches log appends still in flight; they run to
/// completion on the runtime. Call [`DialogueEngine::flush_logs`] to wait for them.
pub struct DialogueEngine {
    store: Arc<SessionStore>,
    collaborators: Collaborators,
    router: TurnRouter,
    config: EngineConfig,
    activity: Option<Arc<RwLock<SessionActivity>>>,
    pending_logs: Mutex<JoinSet<()>>,
}

impl DialogueEngine {
    /// Create an engine with its own session store
    pub fn new(collaborators: Collaborators, config: EngineConfig) -> Self {
        Self::with_store(Arc::new(SessionStore::new()), collaborators, config)
    }

    /// Create an engine over an existing session store
    pub fn with_store(
        store: Arc<SessionStore>,
        collaborators: Collaborators,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            collaborators,
            router: TurnRouter::standard(),
            config,
            activity: None,
            pending_logs: Mutex::new(JoinSet::new()),
        }
    }

    /// Feed every produced event into an activity projection
    pub fn with_activity(mut self, activity: Arc<RwLock<SessionActivity>>) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Process one inbound message from `user_id`.
    ///
    /// The final reply is delivered through the outbox and returned. Only a
    /// failed delivery of that reply is reported as an error; the session
    /// change made by the turn stands either way.
    pub async fn handle(&self, user_id: &UserId, text: &str) -> DialogResult<TurnOutcome> {
        let inbound = text.trim();
        let mut lease = self.store.lease(user_id).await;
        let mut events = Vec::new();

        self.expire_if_idle(&mut lease, &mut events);
        if let Some(event) = lease.session_mut().and_then(Session::repair) {
            tracing::warn!(user_id = %user_id, "inconsistent session state reset to idle");
            events.push(event);
        }

        let rule = self.router.route(&RouteContext::new(lease.session(), inbound));
        tracing::debug!(user_id = %user_id, rule = ?rule, "handling turn");

        let mut acknowledged = false;
        let reply = match rule {
            Rule::FirstContact => self.start_session(&mut lease, &mut events),
            Rule::CaptureName => self.capture_name(&mut lease, inbound, &mut events)?,
            Rule::Reset => self.reset_session(&mut lease, &mut events),
            Rule::ListFaqs => self.list_faqs(&mut lease, &mut events).await?,
            Rule::SelectFaq => self.select_faq(&mut lease, inbound, &mut events)?,
            Rule::Fallback => {
                let (reply, acked) = self.fallback(&mut lease, inbound, &mut events).await?;
                acknowledged = acked;
                reply
            }
        };

        self.record_events(&events).await;
        self.spawn_log(InteractionRecord::new(user_id.clone(), inbound, reply.as_str()));

        self.collaborators
            .outbox
            .deliver(user_id, &reply)
            .await
            .map_err(|source| DialogError::Delivery {
                user_id: user_id.clone(),
                source,
            })?;

        Ok(TurnOutcome {
            rule,
            reply,
            acknowledged,
            events,
        })
    }

    /// Wait for every log append started so far
    pub async fn flush_logs(&self) {
        let mut pending = std::mem::take(
            &mut *self
                .pending_logs
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        while pending.join_next().await.is_some() {}
    }

    /// Drop sessions idle past the configured timeout. Returns how many expired.
    pub async fn sweep_idle_sessions(&self) -> usize {
        let expired = self.store.sweep_idle(self.config.session_idle_timeout()).await;
        let events: Vec<SessionDomainEvent> = expired.into_iter().map(Session::expire).collect();
        self.record_events(&events).await;
        events.len()
    }

    fn expire_if_idle(&self, lease: &mut SessionLease, events: &mut Vec<SessionDomainEvent>) {
        let Some(ttl) = self.config.session_idle_timeout() else {
            return;
        };
        if !lease.session().is_some_and(|s| s.is_expired(ttl, Utc::now())) {
            return;
        }
        if let Some(session) = lease.remove() {
            tracing::info!(user_id = %session.user_id(), session_id = %session.id(), "idle session expired");
            events.push(session.expire());
        }
    }

    fn start_session(&self, lease: &mut SessionLease, events: &mut Vec<SessionDomainEvent>) -> String {
        let (session, event) = Session::start(lease.user_id().clone());
        tracing::info!(user_id = %lease.user_id(), session_id = %session.id(), "session started");
        lease.insert(session);
        events.push(event);
        self.config.messages.name_prompt(&self.config.assistant_name)
    }

    fn capture_name(
        &self,
        lease: &mut SessionLease,
        inbound: &str,
        events: &mut Vec<SessionDomainEvent>,
    ) -> DialogResult<String> {
        let session = leased_session(lease)?;
        if inbound.is_empty() {
            session.touch();
            return Ok(self.config.messages.name_prompt(&self.config.assistant_name));
        }

        events.push(session.capture_name(inbound)?);
        Ok(self.config.messages.name_confirmation(inbound))
    }

    fn reset_session(&self, lease: &mut SessionLease, events: &mut Vec<SessionDomainEvent>) -> String {
        if let Some(session) = lease.remove() {
            tracing::info!(user_id = %session.user_id(), session_id = %session.id(), "session reset");
            events.push(session.reset());
        }
        self.config.messages.reset.clone()
    }

    async fn list_faqs(
        &self,
        lease: &mut SessionLease,
        events: &mut Vec<SessionDomainEvent>,
    ) -> DialogResult<String> {
        let faqs = match self.collaborators.catalog.list_all().await {
            Ok(faqs) => faqs,
            Err(e) => {
                tracing::warn!(user_id = %lease.user_id(), error = %e, "FAQ catalog unavailable");
                Vec::new()
            }
        };

        let session = leased_session(lease)?;
        if faqs.is_empty() {
            session.touch();
            return Ok(self.config.messages.no_faqs.clone());
        }

        let reply = self
            .config
            .messages
            .faq_list(faqs.iter().map(|f| f.question.as_str()));
        events.push(session.present_faqs(faqs)?);
        Ok(reply)
    }

    fn select_faq(
        &self,
        lease: &mut SessionLease,
        inbound: &str,
        events: &mut Vec<SessionDomainEvent>,
    ) -> DialogResult<String> {
        let session = leased_session(lease)?;
        let (selection, event) = session.select_faq(inbound)?;
        events.push(event);

        let messages = &self.config.messages;
        let reply = match selection {
            FaqSelection::Valid(index) => session
                .active_faqs()
                .get(index)
                .map(|f| f.answer.clone())
                .unwrap_or_else(|| messages.invalid_selection.clone()),
            FaqSelection::OutOfRange { max, .. } => messages.out_of_range(max),
            FaqSelection::NotANumber => messages.invalid_selection.clone(),
        };
        Ok(reply)
    }

    async fn fallback(
        &self,
        lease: &mut SessionLease,
        inbound: &str,
        events: &mut Vec<SessionDomainEvent>,
    ) -> DialogResult<(String, bool)> {
        let user_id = lease.user_id().clone();

        // Best effort; never logged.
        let acknowledged = match self
            .collaborators
            .outbox
            .deliver(&user_id, &self.config.messages.thinking)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "failed to send acknowledgement");
                false
            }
        };

        let timeout = self.config.responder_timeout();
        let answer = tokio::time::timeout(timeout, self.collaborators.responder.respond(inbound))
            .await
            .unwrap_or(Err(CollaboratorError::Timeout(timeout)))
            .inspect_err(|e| {
                tracing::warn!(user_id = %user_id, error = %e, "free-text responder failed");
            })
            .ok();

        let session = leased_session(lease)?;
        events.push(session.record_fallback(answer.is_some()));

        let reply = answer.unwrap_or_else(|| self.config.messages.apology.clone());
        Ok((reply, acknowledged))
    }

    async fn record_events(&self, events: &[SessionDomainEvent]) {
        for event in events {
            tracing::trace!(subject = %event.subject(), session_id = %event.aggregate_id(), "session event");
        }
        if let Some(activity) = &self.activity {
            let mut activity = activity.write().await;
            for event in events {
                activity.apply_event(event);
            }
        }
    }

    fn spawn_log(&self, record: InteractionRecord) {
        let log = Arc::clone(&self.collaborators.log);
        let mut pending = self
            .pending_logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while pending.try_join_next().is_some() {}

        pending.spawn(async move {
            let user_id = record.user_id.clone();
            if let Err(e) = log.append(record).await {
                tracing::warn!(user_id = %user_id, error = %e, "failed to log interaction");
            }
        });
    }
}

impl Drop for DialogueEngine {
    fn drop(&mut self) {
        self.pending_logs
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .detach_all();
    }
}

fn leased_session(lease: &mut SessionLease) -> DialogResult<&mut Session> {
    let user_id = lease.user_id().clone();
    lease
        .session_mut()
        .ok_or_else(|| DialogError::InvalidState(format!("no session for {user_id}")))
}
