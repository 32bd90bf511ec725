//! Shared fixtures for engine tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use chat_dialogue_engine::{
    Collaborators, CollaboratorError, DialogueEngine, EngineConfig, FaqCatalog, FaqEntry,
    FreeTextResponder, InMemoryFaqCatalog, InMemoryInteractionLog, InteractionLog,
    InteractionRecord, Outbox, RecordingOutbox, SessionActivity, UserId,
};

/// How the fake responder behaves
#[derive(Clone)]
pub enum Script {
    Answer(String),
    Fail,
    Hang(Duration),
}

pub struct ScriptedResponder {
    script: Script,
    pub prompts: RwLock<Vec<String>>,
}

impl ScriptedResponder {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            prompts: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl FreeTextResponder for ScriptedResponder {
    async fn respond(&self, prompt: &str) -> Result<String, CollaboratorError> {
        self.prompts.write().await.push(prompt.to_string());
        match &self.script {
            Script::Answer(text) => Ok(text.clone()),
            Script::Fail => Err(CollaboratorError::Unavailable("model offline".into())),
            Script::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                Ok("too late".into())
            }
        }
    }
}

pub struct FailingLog {
    pub attempts: AtomicUsize,
}

impl FailingLog {
    pub fn new() -> Self {
        Self {
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InteractionLog for FailingLog {
    async fn append(&self, _record: InteractionRecord) -> Result<(), CollaboratorError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(CollaboratorError::Unavailable("database down".into()))
    }
}

/// In-memory log whose appends complete only after a delay
pub struct SlowLog {
    pub delay: Duration,
    pub inner: Arc<InMemoryInteractionLog>,
}

#[async_trait]
impl InteractionLog for SlowLog {
    async fn append(&self, record: InteractionRecord) -> Result<(), CollaboratorError> {
        tokio::time::sleep(self.delay).await;
        self.inner.append(record).await
    }
}

pub struct FailingCatalog;

#[async_trait]
impl FaqCatalog for FailingCatalog {
    async fn list_all(&self) -> Result<Vec<FaqEntry>, CollaboratorError> {
        Err(CollaboratorError::Unavailable("catalog down".into()))
    }
}

/// Rejects the "thinking" acknowledgement, accepts everything else
pub struct AckRejectingOutbox {
    pub inner: RecordingOutbox,
    pub thinking: String,
}

#[async_trait]
impl Outbox for AckRejectingOutbox {
    async fn deliver(&self, user_id: &UserId, text: &str) -> Result<(), CollaboratorError> {
        if text == self.thinking {
            return Err(CollaboratorError::Unavailable("channel busy".into()));
        }
        self.inner.deliver(user_id, text).await
    }
}

pub struct DeadOutbox;

#[async_trait]
impl Outbox for DeadOutbox {
    async fn deliver(&self, _user_id: &UserId, _text: &str) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unavailable("channel closed".into()))
    }
}

/// Engine wired to in-memory collaborators
pub struct Harness {
    pub engine: DialogueEngine,
    pub catalog: Arc<InMemoryFaqCatalog>,
    pub log: Arc<InMemoryInteractionLog>,
    pub outbox: Arc<RecordingOutbox>,
    pub responder: Arc<ScriptedResponder>,
    pub activity: Arc<RwLock<SessionActivity>>,
}

impl Harness {
    pub fn new(faqs: Vec<FaqEntry>, script: Script) -> Self {
        Self::with_config(faqs, script, EngineConfig::default())
    }

    pub fn with_config(faqs: Vec<FaqEntry>, script: Script, config: EngineConfig) -> Self {
        let catalog = Arc::new(InMemoryFaqCatalog::with_entries(faqs));
        let log = Arc::new(InMemoryInteractionLog::new());
        let outbox = Arc::new(RecordingOutbox::new());
        let responder = Arc::new(ScriptedResponder::new(script));
        let activity = Arc::new(RwLock::new(SessionActivity::new()));

        let engine = DialogueEngine::new(
            Collaborators {
                catalog: catalog.clone(),
                log: log.clone(),
                responder: responder.clone(),
                outbox: outbox.clone(),
            },
            config,
        )
        .with_activity(activity.clone());

        Self {
            engine,
            catalog,
            log,
            outbox,
            responder,
            activity,
        }
    }

    /// Send a message and return the final reply
    pub async fn say(&self, user: &str, text: &str) -> String {
        self.engine
            .handle(&UserId::new(user), text)
            .await
            .expect("turn should succeed")
            .reply
    }

    /// Create a named session for `user`
    pub async fn onboard(&self, user: &str, name: &str) {
        self.say(user, "hi").await;
        self.say(user, name).await;
    }
}

pub fn return_policy_catalog() -> Vec<FaqEntry> {
    vec![FaqEntry::new(1, "Return policy?", "30-day refund")]
}

pub fn three_faqs() -> Vec<FaqEntry> {
    vec![
        FaqEntry::new(1, "Return policy?", "30-day refund"),
        FaqEntry::new(2, "Business hours?", "Mon-Fri 9-6"),
        FaqEntry::new(3, "Location?", "Online only"),
    ]
}
