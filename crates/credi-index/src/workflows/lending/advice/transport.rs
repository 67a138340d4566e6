use std::time::Duration;

use serde_json::Value;

const ERROR_BODY_LIMIT: usize = 200;

/// Blocking JSON-over-HTTP seam used by the hosted providers.
pub trait JsonTransport: Send + Sync {
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<Value, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid JSON response: {0}")]
    Decode(String),
}

/// `reqwest` blocking transport. A client is built per request, so calls must run off the async
/// executor (the routers use `spawn_blocking`).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl JsonTransport for HttpTransport {
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<Value, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| TransportError::Network(err.without_url().to_string()))?;

        let mut request = client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        // Error text never includes the URL.
        let response = request
            .send()
            .map_err(|err| TransportError::Network(err.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        response
            .json::<Value>()
            .map_err(|err| TransportError::Decode(err.without_url().to_string()))
    }
}
