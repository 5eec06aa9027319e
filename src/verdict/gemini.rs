//! Gemini-backed oracle over the `generateContent` REST endpoint.

use super::oracle::{Judgement, Oracle, OracleError, parse_judgement};
use log::debug;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Build the comparison prompt for two source texts.
pub fn build_prompt(source_a: &str, source_b: &str) -> String {
    format!(
        r#"You are an expert code plagiarism detector for 8051 assembly and C.
Compare the following two programs and determine whether one was copied from the other.
Both were written for the same lab assignment, so very similar algorithms are acceptable as long as some part of the logic differs.
Ignore renamed labels and variables, comment changes, and whitespace differences.
Focus on logic, register usage, control flow, and algorithm structure.

Left:
```
{}
```

Right:
```
{}
```

Analyze the similarities and differences, then conclude with a JSON object in exactly this format:
{{
    "reasoning": "Brief explanation",
    "is_plagiarized": true or false
}}"#,
        source_a, source_b
    )
}

#[derive(Debug, Clone)]
pub struct GeminiOracle {
    agent: ureq::Agent,
    api_key: String,
    model: String,
    endpoint: String,
    timeout: Duration,
}

impl GeminiOracle {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout,
        }
    }

    /// Read the credential from `GEMINI_API_KEY`. `None` when unset or blank.
    pub fn from_env(model: impl Into<String>, timeout: Duration) -> Option<Self> {
        let api_key = std::env::var(API_KEY_ENV).ok()?;
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return None;
        }
        Some(Self::new(api_key, model, timeout))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    fn map_error(&self, error: ureq::Error) -> OracleError {
        match error {
            ureq::Error::Status(code, response) => {
                let body = response.into_string().unwrap_or_default();
                OracleError::Transport(format!(
                    "HTTP {}: {}",
                    code,
                    body.chars().take(200).collect::<String>()
                ))
            }
            ureq::Error::Transport(transport) if is_timeout(&transport) => OracleError::Timeout {
                seconds: self.timeout.as_secs(),
            },
            ureq::Error::Transport(transport) => OracleError::Transport(transport.to_string()),
        }
    }
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    std::error::Error::source(transport)
        .and_then(|source| source.downcast_ref::<std::io::Error>())
        .is_some_and(|io| {
            matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            )
        })
}

/// Concatenate the text parts of the first candidate of a `generateContent` response.
pub fn extract_candidate_text(body: &serde_json::Value) -> Result<String, OracleError> {
    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| OracleError::Malformed("response has no candidate content".to_string()))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(serde_json::Value::as_str))
        .collect();

    if text.trim().is_empty() {
        return Err(OracleError::Malformed("candidate text is empty".to_string()));
    }
    Ok(text)
}

impl Oracle for GeminiOracle {
    fn name(&self) -> &str {
        "gemini"
    }

    fn judge(&self, source_a: &str, source_b: &str) -> Result<Judgement, OracleError> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": build_prompt(source_a, source_b) }] }]
        });

        let response = self
            .agent
            .post(&self.request_url())
            .set("Content-Type", "application/json")
            .set("x-goog-api-key", &self.api_key)
            .send_string(&body.to_string())
            .map_err(|e| self.map_error(e))?;

        let raw = response
            .into_string()
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| OracleError::Malformed(format!("response is not JSON: {}", e)))?;

        let text = extract_candidate_text(&value)?;
        debug!("{} oracle answered with {} chars", self.model, text.len());
        parse_judgement(&text)
    }
}
