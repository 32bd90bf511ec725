//! Console transport for the dialogue engine.
//!
//! Reads one message per line from stdin and prints replies. A line of the
//! form `user: text` speaks as `user`; anything else speaks as `console`.
//!
//! Usage: `chat-console [config.toml]`

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

use chat_dialogue_engine::{
    default_faqs, Collaborators, CollaboratorError, DialogueEngine, EngineConfig, FreeTextResponder,
    InMemoryFaqCatalog, InMemoryInteractionLog, OpenAiResponder, Outbox, SessionActivity, UserId,
};

struct StdoutOutbox;

#[async_trait]
impl Outbox for StdoutOutbox {
    async fn deliver(&self, user_id: &UserId, text: &str) -> Result<(), CollaboratorError> {
        println!("[to {user_id}] {text}\n");
        Ok(())
    }
}

/// Used when no API key is configured; every fallback gets the apology text.
struct OfflineResponder;

#[async_trait]
impl FreeTextResponder for OfflineResponder {
    async fn respond(&self, _prompt: &str) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Unavailable("no responder configured".into()))
    }
}

fn parse_line(line: &str) -> (UserId, &str) {
    match line.split_once(':') {
        Some((user, text)) if !user.trim().is_empty() && !user.contains(' ') => {
            (UserId::new(user.trim()), text)
        }
        _ => (UserId::new("console"), line),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => EngineConfig::load(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    config.apply_env();
    config.validate()?;

    let responder: Arc<dyn FreeTextResponder> = match config.responder.api_key {
        Some(_) => Arc::new(
            OpenAiResponder::new(config.responder_settings(), config.responder_timeout())
                .context("building responder")?,
        ),
        None => {
            tracing::warn!("no responder API key set; free-text questions will get the apology reply");
            Arc::new(OfflineResponder)
        }
    };

    let catalog = Arc::new(InMemoryFaqCatalog::new());
    catalog.seed_if_empty(default_faqs()).await;

    let activity = Arc::new(RwLock::new(SessionActivity::new()));
    let idle_timeout = config.session_idle_timeout();
    let engine = Arc::new(
        DialogueEngine::new(
            Collaborators {
                catalog,
                log: Arc::new(InMemoryInteractionLog::new()),
                responder,
                outbox: Arc::new(StdoutOutbox),
            },
            config,
        )
        .with_activity(Arc::clone(&activity)),
    );

    if idle_timeout.is_some() {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(60));
            loop {
                ticker.tick().await;
                let expired = engine.sweep_idle_sessions().await;
                if expired > 0 {
                    tracing::info!(expired, "swept idle sessions");
                }
            }
        });
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let (user_id, text) = parse_line(&line);
        if let Err(e) = engine.handle(&user_id, text).await {
            tracing::error!(user_id = %user_id, error = %e, "turn failed");
        }
    }

    engine.flush_logs().await;
    let stats = activity.read().await.statistics();
    tracing::info!(?stats, "console session finished");
    Ok(())
}
