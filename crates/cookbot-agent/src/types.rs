//! Type definitions for model invocations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use cookbot_core::GatewayConfig;

/// Longest role label shown in logs
const ROLE_LABEL_MAX_CHARS: usize = 30;

/// Chat segment roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role-tagged text segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Immutable request for one model call
///
/// Built through [`InvocationRequest::builder`]; the system segment always
/// comes first.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    messages: Vec<ChatMessage>,
    model: String,
    temperature: f32,
    max_tokens: usize,
    json_mode: bool,
}

impl InvocationRequest {
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
    pub const DEFAULT_MAX_TOKENS: usize = 4096;

    pub fn builder(model: impl Into<String>) -> InvocationRequestBuilder {
        InvocationRequestBuilder::new(model)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn json_mode(&self) -> bool {
        self.json_mode
    }

    /// Text of the system segment, empty if there is none
    pub fn system_text(&self) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    /// Text of the last user segment, empty if there is none
    pub fn user_text(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    /// Short name of the calling role for log lines
    ///
    /// First sentence of the system segment, capped at 30 characters.
    pub fn role_label(&self) -> String {
        let first = self.system_text().split('.').next().unwrap_or_default().trim();
        if first.is_empty() {
            return "Agent".to_string();
        }
        first.chars().take(ROLE_LABEL_MAX_CHARS).collect()
    }

    /// Value handed back when the call fails
    pub fn neutral_result(&self) -> String {
        if self.json_mode {
            "{}".to_string()
        } else {
            String::new()
        }
    }
}

/// Builder for [`InvocationRequest`]
#[derive(Debug, Clone)]
pub struct InvocationRequestBuilder {
    system: Option<String>,
    user: Vec<String>,
    model: String,
    temperature: f32,
    max_tokens: usize,
    json_mode: bool,
}

impl InvocationRequestBuilder {
    fn new(model: impl Into<String>) -> Self {
        Self {
            system: None,
            user: Vec::new(),
            model: model.into(),
            temperature: InvocationRequest::DEFAULT_TEMPERATURE,
            max_tokens: InvocationRequest::DEFAULT_MAX_TOKENS,
            json_mode: false,
        }
    }

    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.system = Some(content.into());
        self
    }

    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.user.push(content.into());
        self
    }

    /// Sampling temperature, clamped to [0, 1]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = if temperature.is_nan() {
            InvocationRequest::DEFAULT_TEMPERATURE
        } else {
            temperature.clamp(0.0, 1.0)
        };
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    /// Ask the backend for a strict JSON object
    pub fn json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    pub fn build(self) -> InvocationRequest {
        let mut messages = Vec::with_capacity(self.user.len() + 1);
        if let Some(system) = self.system {
            messages.push(ChatMessage {
                role: Role::System,
                content: system,
            });
        }
        messages.extend(self.user.into_iter().map(|content| ChatMessage {
            role: Role::User,
            content,
        }));

        InvocationRequest {
            messages,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            json_mode: self.json_mode,
        }
    }
}

/// Why a model call produced no text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The backend asked us to slow down (HTTP 429)
    RateLimited,
    /// Any other backend, transport, or decode failure
    TransientOther,
    /// No credential or backend to call
    Unavailable,
    /// Rate-limit retries ran out
    BoundExhausted,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::RateLimited => write!(f, "rate limited"),
            FailureKind::TransientOther => write!(f, "transient failure"),
            FailureKind::Unavailable => write!(f, "unavailable"),
            FailureKind::BoundExhausted => write!(f, "retries exhausted"),
        }
    }
}

/// Typed failure of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct InvocationFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl InvocationFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(FailureKind::RateLimited, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(FailureKind::TransientOther, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unavailable, message)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == FailureKind::RateLimited
    }
}

/// Retry and pacing policy of the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayPolicy {
    /// Attempts for a rate-limited call, first try included
    pub max_attempts: u32,
    /// Wait before the first retry; doubled after every retry
    pub initial_backoff: Duration,
    /// Gate hold time after a successful call
    pub cooldown: Duration,
}

impl Default for GatewayPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            cooldown: Duration::from_millis(500),
        }
    }
}

impl From<&GatewayConfig> for GatewayPolicy {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: config.initial_backoff(),
            cooldown: config.cooldown(),
        }
    }
}
