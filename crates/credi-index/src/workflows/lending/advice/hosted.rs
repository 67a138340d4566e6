use std::sync::Arc;

use serde_json::{json, Value};

use super::provider::{AdviceError, AdvicePrompt, AdviceProvider};
use super::transport::{JsonTransport, TransportError};

pub const GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GOOGLE_MODEL: &str = "gemini-2.0-flash-exp";
pub const LETTA_BASE_URL: &str = "https://api.letta.com/v1";

/// Analyst backed by the Google Generative Language `generateContent` API.
pub struct GoogleAnalyst {
    api_key: Option<String>,
    base_url: String,
    model: String,
    transport: Arc<dyn JsonTransport>,
}

impl GoogleAnalyst {
    pub fn new(api_key: Option<String>, transport: Arc<dyn JsonTransport>) -> Self {
        Self {
            api_key,
            base_url: GOOGLE_BASE_URL.to_string(),
            model: GOOGLE_MODEL.to_string(),
            transport,
        }
    }

    pub fn with_endpoint(mut self, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self.model = model.into();
        self
    }
}

impl AdviceProvider for GoogleAnalyst {
    fn name(&self) -> &'static str {
        "google"
    }

    fn complete(&self, prompt: &AdvicePrompt) -> Result<String, AdviceError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AdviceError::NotConfigured {
                provider: self.name(),
                reason: "GOOGLE_API_KEY is not set".to_string(),
            });
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let body = json!({ "contents": [{ "parts": [{ "text": prompt.text }] }] });

        let reply = self
            .transport
            .post_json(&url, &[("x-goog-api-key", api_key)], &body)
            .map_err(|err| unavailable(self.name(), err))?;

        reply
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
            .ok_or(AdviceError::EmptyResponse {
                provider: self.name(),
            })
    }
}

/// Refiner that forwards the analyst draft to a Letta agent.
pub struct LettaRefiner {
    api_key: Option<String>,
    agent_id: Option<String>,
    base_url: String,
    transport: Arc<dyn JsonTransport>,
}

impl LettaRefiner {
    pub fn new(
        api_key: Option<String>,
        agent_id: Option<String>,
        transport: Arc<dyn JsonTransport>,
    ) -> Self {
        Self {
            api_key,
            agent_id,
            base_url: LETTA_BASE_URL.to_string(),
            transport,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl AdviceProvider for LettaRefiner {
    fn name(&self) -> &'static str {
        "letta"
    }

    fn complete(&self, prompt: &AdvicePrompt) -> Result<String, AdviceError> {
        let (Some(api_key), Some(agent_id)) = (self.api_key.as_deref(), self.agent_id.as_deref())
        else {
            let missing = if self.api_key.is_none() {
                "LETTA_API_KEY"
            } else {
                "LETTA_AGENT_ID"
            };
            return Err(AdviceError::NotConfigured {
                provider: self.name(),
                reason: format!("{missing} is not set"),
            });
        };

        let url = format!(
            "{}/agents/{}/messages",
            self.base_url.trim_end_matches('/'),
            agent_id
        );
        let bearer = format!("Bearer {api_key}");
        let body = json!({
            "messages": [{ "role": "user", "content": prompt.text }],
            "stream": false,
        });

        let reply = self
            .transport
            .post_json(&url, &[("authorization", bearer.as_str())], &body)
            .map_err(|err| unavailable(self.name(), err))?;

        letta_reply(&reply).ok_or(AdviceError::EmptyResponse {
            provider: self.name(),
        })
    }
}

fn unavailable(provider: &'static str, err: TransportError) -> AdviceError {
    AdviceError::Unavailable {
        provider,
        reason: err.to_string(),
    }
}

/// Agent replies arrive as a message list (tagged by `role` or `message_type`), a bare
/// `content`/`text` field, or a plain string.
fn letta_reply(body: &Value) -> Option<String> {
    if let Some(messages) = body.get("messages").and_then(Value::as_array) {
        return messages
            .iter()
            .find(|message| {
                message.get("role").and_then(Value::as_str) == Some("assistant")
                    || message.get("message_type").and_then(Value::as_str)
                        == Some("assistant_message")
            })
            .and_then(text_field);
    }

    text_field(body).or_else(|| {
        body.as_str()
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
    })
}

fn text_field(value: &Value) -> Option<String> {
    ["content", "text"]
        .into_iter()
        .filter_map(|key| value.get(key).and_then(Value::as_str))
        .find(|text| !text.trim().is_empty())
        .map(str::to_string)
}
