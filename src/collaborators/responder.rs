//! Free-text responder contract and an OpenAI-compatible implementation

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::ResponderConfig;
use crate::errors::CollaboratorError;

/// Answers arbitrary text with a best-effort natural-language reply
#[async_trait]
pub trait FreeTextResponder: Send + Sync {
    async fn respond(&self, prompt: &str) -> Result<String, CollaboratorError>;
}

/// Chat-completions client for any OpenAI-compatible endpoint.
///
/// Sends the configured persona as the system message and the user's text as
/// the only user message.
pub struct OpenAiResponder {
    config: ResponderConfig,
    client: reqwest::Client,
}

impl OpenAiResponder {
    pub fn new(config: ResponderConfig, timeout: Duration) -> Result<Self, CollaboratorError> {
        if config.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(CollaboratorError::Rejected("no responder API key configured".into()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": self.config.persona },
                { "role": "user", "content": prompt },
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

fn first_content(response: CompletionResponse) -> Result<String, CollaboratorError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(CollaboratorError::EmptyResponse)
}

#[async_trait]
impl FreeTextResponder for OpenAiResponder {
    async fn respond(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&self.build_body(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Http(format!("{status}: {body}")));
        }

        first_content(response.json::<CompletionResponse>().await?)
    }
}
