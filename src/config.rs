//! Engine configuration: reply texts, timeouts and responder settings.
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//! Responder credentials are normally supplied through the environment.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{DialogError, DialogResult};

const DEFAULT_PERSONA: &str = "\
You are {assistant}, a friendly and professional customer support assistant. \
Your primary goal is to help customers quickly and politely. \
You have knowledge about the products, return policies, shipping details and business hours. \
Be polite and empathetic, clear and concise, and written in simple language. \
Offer additional details when they seem relevant. \
When unsure, politely apologize and say you don't have that information. \
Never reveal internal or confidential data.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name the assistant introduces itself with
    pub assistant_name: String,
    /// Upper bound on a single responder call
    pub responder_timeout_secs: u64,
    /// Sessions idle this long start over; `None` keeps them until reset
    pub session_idle_timeout_secs: Option<u64>,
    pub messages: ReplyTemplates,
    pub responder: ResponderConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            assistant_name: "Chaty".into(),
            responder_timeout_secs: 20,
            session_idle_timeout_secs: None,
            messages: ReplyTemplates::default(),
            responder: ResponderConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document
    pub fn from_toml_str(raw: &str) -> DialogResult<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| DialogError::Config(format!("parsing config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn load(path: &Path) -> DialogResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DialogError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Override responder settings from the environment
    pub fn apply_env(&mut self) {
        if let Some(key) = env_var("CHAT_RESPONDER_API_KEY").or_else(|| env_var("OPENAI_API_KEY")) {
            self.responder.api_key = Some(key);
        }
        if let Some(model) = env_var("CHAT_RESPONDER_MODEL") {
            self.responder.model = model;
        }
        if let Some(base_url) = env_var("CHAT_RESPONDER_BASE_URL") {
            self.responder.base_url = base_url;
        }
    }

    pub fn validate(&self) -> DialogResult<()> {
        if self.responder_timeout_secs == 0 {
            return Err(DialogError::Config(
                "responder_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.session_idle_timeout_secs == Some(0) {
            return Err(DialogError::Config(
                "session_idle_timeout_secs must be greater than zero; omit it to disable expiry"
                    .into(),
            ));
        }
        if self.assistant_name.trim().is_empty() {
            return Err(DialogError::Config("assistant_name must not be empty".into()));
        }
        Ok(())
    }

    /// Responder settings with `{assistant}` in the persona filled in
    pub fn responder_settings(&self) -> ResponderConfig {
        ResponderConfig {
            persona: self.responder.persona.replace("{assistant}", &self.assistant_name),
            ..self.responder.clone()
        }
    }

    pub fn responder_timeout(&self) -> Duration {
        Duration::from_secs(self.responder_timeout_secs)
    }

    pub fn session_idle_timeout(&self) -> Option<chrono::Duration> {
        self.session_idle_timeout_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .map(chrono::Duration::seconds)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Every user-facing text the engine sends.
///
/// `{assistant}`, `{name}` and `{max}` are substituted where noted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyTemplates {
    /// Uses `{assistant}`
    pub name_prompt: String,
    /// Uses `{name}`
    pub name_confirmation: String,
    pub reset: String,
    pub no_faqs: String,
    pub faq_list_header: String,
    pub faq_list_footer: String,
    pub invalid_selection: String,
    /// Uses `{max}`
    pub out_of_range: String,
    pub thinking: String,
    pub apology: String,
}

impl Default for ReplyTemplates {
    fn default() -> Self {
        Self {
            name_prompt: "Hi! I'm {assistant}, your support assistant. What's your name?\n\n\
                          Please respond only with your name"
                .into(),
            name_confirmation: "Nice to meet you, {name}! Type 'faq' to see our FAQs.\n\
                                You can exit this session anytime by typing 'reset' or 'exit'."
                .into(),
            reset: "Your session has been reset. Send any message to start again.".into(),
            no_faqs: "No FAQs are available right now.".into(),
            faq_list_header: "Here are our FAQs:\n".into(),
            faq_list_footer: "\nPlease reply with the corresponding number to see the answer."
                .into(),
            invalid_selection: "You appear to be in FAQ selection mode. Please send the \
                                corresponding number or type 'reset' to exit."
                .into(),
            out_of_range: "Invalid choice. Please send a number between 1 and {max}, \
                           or type 'reset' to exit."
                .into(),
            thinking: "Thinking, a moment please ....".into(),
            apology: "I'm sorry, but there was an error generating a response.\n\n\
                      Please type exit to start over or type faqs to see frequently asked questions."
                .into(),
        }
    }
}

impl ReplyTemplates {
    pub fn name_prompt(&self, assistant: &str) -> String {
        self.name_prompt.replace("{assistant}", assistant)
    }

    pub fn name_confirmation(&self, name: &str) -> String {
        self.name_confirmation.replace("{name}", name)
    }

    pub fn out_of_range(&self, max: usize) -> String {
        self.out_of_range.replace("{max}", &max.to_string())
    }

    /// Numbered question list; answers are withheld
    pub fn faq_list<'a>(&self, questions: impl IntoIterator<Item = &'a str>) -> String {
        let mut text = self.faq_list_header.clone();
        for (i, question) in questions.into_iter().enumerate() {
            text.push_str(&format!("\n{}. {}\n", i + 1, question));
        }
        text.push_str(&self.faq_list_footer);
        text
    }
}

/// Settings for the OpenAI-compatible free-text responder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// System prompt, fixed per deployment. Uses `{assistant}`
    pub persona: String,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-3.5-turbo".into(),
            api_key: None,
            max_tokens: 100,
            temperature: 0.7,
            persona: DEFAULT_PERSONA.into(),
        }
    }
}
