//! Collaborator outages must degrade replies, never break turns

mod common;

use std::sync::Arc;
use std::time::Duration;

use chat_dialogue_engine::{
    Collaborators, DialogError, DialogState, DialogueEngine, EngineConfig, InMemoryFaqCatalog,
    InMemoryInteractionLog, RecordingOutbox, ReplyTemplates, Rule, UserId,
};
use common::{
    three_faqs, AckRejectingOutbox, DeadOutbox, FailingCatalog, FailingLog, Script,
    ScriptedResponder, SlowLog,
};

#[tokio::test]
async fn test_log_failure_does_not_affect_reply() {
    let log = Arc::new(FailingLog::new());
    let outbox = Arc::new(RecordingOutbox::new());
    let engine = DialogueEngine::new(
        Collaborators {
            catalog: Arc::new(InMemoryFaqCatalog::with_entries(three_faqs())),
            log: log.clone(),
            responder: Arc::new(ScriptedResponder::new(Script::Fail)),
            outbox: outbox.clone(),
        },
        EngineConfig::default(),
    );
    let user = UserId::new("U1");

    engine.handle(&user, "hi").await.unwrap();
    engine.handle(&user, "Sam").await.unwrap();
    let outcome = engine.handle(&user, "faq").await.unwrap();
    assert_eq!(outcome.rule, Rule::ListFaqs);

    engine.flush_logs().await;
    assert_eq!(log.attempts(), 3);

    // Each reply delivered exactly once.
    let sent = outbox.sent().await;
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[2].text, outcome.reply);
}

#[tokio::test]
async fn test_catalog_failure_reads_as_empty() {
    let engine = DialogueEngine::new(
        Collaborators {
            catalog: Arc::new(FailingCatalog),
            log: Arc::new(InMemoryInteractionLog::new()),
            responder: Arc::new(ScriptedResponder::new(Script::Fail)),
            outbox: Arc::new(RecordingOutbox::new()),
        },
        EngineConfig::default(),
    );
    let user = UserId::new("U1");
    engine.handle(&user, "hi").await.unwrap();
    engine.handle(&user, "Sam").await.unwrap();

    let outcome = engine.handle(&user, "faq").await.unwrap();
    assert_eq!(outcome.reply, ReplyTemplates::default().no_faqs);
    assert!(outcome.events.is_empty());

    let session = engine.store().get(&user).await.unwrap();
    assert_eq!(session.state(), &DialogState::Idle);
}

#[tokio::test]
async fn test_failed_acknowledgement_still_answers() {
    let templates = ReplyTemplates::default();
    let outbox = Arc::new(AckRejectingOutbox {
        inner: RecordingOutbox::new(),
        thinking: templates.thinking.clone(),
    });
    let engine = DialogueEngine::new(
        Collaborators {
            catalog: Arc::new(InMemoryFaqCatalog::new()),
            log: Arc::new(InMemoryInteractionLog::new()),
            responder: Arc::new(ScriptedResponder::new(Script::Answer("Happy to help".into()))),
            outbox: outbox.clone(),
        },
        EngineConfig::default(),
    );
    let user = UserId::new("U1");
    engine.handle(&user, "hi").await.unwrap();
    engine.handle(&user, "Sam").await.unwrap();

    let outcome = engine.handle(&user, "help me").await.unwrap();
    assert!(!outcome.acknowledged);
    assert_eq!(outcome.reply, "Happy to help");
    assert_eq!(outbox.inner.sent().await.last().unwrap().text, "Happy to help");
}

#[tokio::test]
async fn test_delivery_failure_is_reported_but_state_stands() {
    let log = Arc::new(InMemoryInteractionLog::new());
    let engine = DialogueEngine::new(
        Collaborators {
            catalog: Arc::new(InMemoryFaqCatalog::new()),
            log: log.clone(),
            responder: Arc::new(ScriptedResponder::new(Script::Fail)),
            outbox: Arc::new(DeadOutbox),
        },
        EngineConfig::default(),
    );
    let user = UserId::new("U1");

    let err = engine.handle(&user, "hi").await.unwrap_err();
    assert!(matches!(err, DialogError::Delivery { ref user_id, .. } if user_id == &user));
    assert!(engine.store().get(&user).await.is_some());

    engine.flush_logs().await;
    assert_eq!(log.snapshot().await.len(), 1);
}

#[tokio::test]
async fn test_pending_appends_outlive_the_engine() {
    let records = Arc::new(InMemoryInteractionLog::new());
    let engine = DialogueEngine::new(
        Collaborators {
            catalog: Arc::new(InMemoryFaqCatalog::new()),
            log: Arc::new(SlowLog {
                delay: Duration::from_millis(50),
                inner: records.clone(),
            }),
            responder: Arc::new(ScriptedResponder::new(Script::Fail)),
            outbox: Arc::new(RecordingOutbox::new()),
        },
        EngineConfig::default(),
    );

    engine.handle(&UserId::new("U1"), "hi").await.unwrap();
    drop(engine);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let logged = records.snapshot().await;
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].inbound_text, "hi");
}
