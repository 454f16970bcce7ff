use std::time::Duration;

use async_trait::async_trait;
use rig::client::Nothing;
use rig::completion::Chat;
use rig::message::Message as RigMessage;
use rig::prelude::CompletionClient;
use rig::providers::ollama;
use tracing::{error, warn};

use super::Responder;
use crate::config::LiveSettings;
use crate::errors::{AppError, ResponderError};
use crate::models::{MessageRole, Turn};

const PREAMBLE: &str = "Você é um assistente acolhedor e atencioso. \
                        Responda em português, de forma breve, gentil e honesta. \
                        Se não souber algo, diga isso.";

/// Replays stored turns as rig history, in order.
fn to_rig_history(history: &[Turn]) -> Vec<RigMessage> {
    history
        .iter()
        .map(|t| match t.role {
            MessageRole::User => RigMessage::user(&t.content),
            MessageRole::Assistant => RigMessage::assistant(&t.content),
        })
        .collect()
}

fn preamble_with_context(context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(doc) => format!(
            "{PREAMBLE}\n\nUse o documento abaixo como contexto ao responder:\n---\n{doc}\n---"
        ),
        None => PREAMBLE.to_string(),
    }
}

/// Maps a backend error message onto the failure kinds the UI distinguishes.
pub fn classify_failure(message: &str, host: &str, model: &str) -> ResponderError {
    let msg = message.to_lowercase();
    if msg.contains("429") || msg.contains("rate limit") || msg.contains("too many requests") {
        ResponderError::RateLimited
    } else if msg.contains("401")
        || msg.contains("403")
        || msg.contains("unauthorized")
        || msg.contains("forbidden")
        || msg.contains("api key")
    {
        ResponderError::Auth { message: message.to_string() }
    } else if msg.contains("model") && (msg.contains("not found") || msg.contains("404")) {
        ResponderError::ModelNotFound { model_name: model.to_string() }
    } else if msg.contains("connect") || msg.contains("dns") || msg.contains("503") {
        ResponderError::Unavailable { host: host.to_string() }
    } else {
        ResponderError::Inference { message: message.to_string() }
    }
}

/// Responder backed by an Ollama server through rig. A fresh agent is built per
/// request so the history is replayed from the store each time.
///
/// Without a base URL every call answers [`ResponderError::NotConfigured`], so the app
/// still starts and the conversation shows why no reply came.
#[derive(Clone)]
pub struct LiveResponder {
    client: Option<ollama::Client>,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl LiveResponder {
    pub fn new(settings: &LiveSettings) -> Result<Self, AppError> {
        let client = match settings.base_url.as_deref() {
            Some(base_url) => Some(
                ollama::Client::builder()
                    .api_key(Nothing)
                    .base_url(base_url)
                    .build()
                    .map_err(|e| AppError::ResponderSetup { message: e.to_string() })?,
            ),
            None => {
                warn!("OLLAMA_API_BASE_URL is not set; live replies will report missing configuration");
                None
            }
        };
        Ok(Self {
            client,
            base_url: settings.base_url.clone().unwrap_or_default(),
            model: settings.model.clone(),
            timeout: settings.timeout,
        })
    }
}

#[async_trait]
impl Responder for LiveResponder {
    async fn generate(
        &self,
        history: &[Turn],
        new_input: &str,
        context: Option<&str>,
    ) -> Result<String, ResponderError> {
        let Some(client) = &self.client else {
            return Err(ResponderError::NotConfigured);
        };

        let preamble = preamble_with_context(context);
        let agent = client.agent(&self.model).preamble(&preamble).build();
        let rig_history = to_rig_history(history);

        let content = tokio::time::timeout(self.timeout, agent.chat(new_input, rig_history))
            .await
            .map_err(|_| {
                warn!("Ollama did not answer within {:?}", self.timeout);
                ResponderError::Timeout { secs: self.timeout.as_secs() }
            })?
            .map_err(|e| {
                error!("Ollama inference failed: {e}");
                classify_failure(&e.to_string(), &self.base_url, &self.model)
            })?;

        if content.trim().is_empty() {
            return Err(ResponderError::EmptyReply);
        }
        Ok(content)
    }
}
