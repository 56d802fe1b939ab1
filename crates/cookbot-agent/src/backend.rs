//! Model backends behind the invocation gateway

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::credentials::Credential;
use crate::types::{ChatMessage, FailureKind, InvocationFailure, InvocationRequest};

/// Groq's OpenAI-compatible chat completions endpoint
pub const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// One raw call to a chat model (allows mocking in tests)
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Send `request` once, authenticated with `credential`
    async fn complete(
        &self,
        credential: &Credential,
        request: &InvocationRequest,
    ) -> Result<String, InvocationFailure>;
}

/// Chat completions request body
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Backend speaking the OpenAI chat completions protocol (Groq by default)
#[derive(Debug, Clone)]
pub struct GroqBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl GroqBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for GroqBackend {
    fn default() -> Self {
        Self::new(GROQ_CHAT_URL)
    }
}

#[async_trait]
impl ModelBackend for GroqBackend {
    #[instrument(skip_all, fields(model = %request.model()))]
    async fn complete(
        &self,
        credential: &Credential,
        request: &InvocationRequest,
    ) -> Result<String, InvocationFailure> {
        let body = ChatCompletionRequest {
            model: request.model(),
            messages: request.messages(),
            temperature: request.temperature(),
            max_tokens: request.max_tokens(),
            response_format: request.json_mode().then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        debug!("Sending chat completion request to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential.secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| InvocationFailure::transient(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if status.as_u16() == 429 {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown".to_string());
            return Err(InvocationFailure::rate_limited(format!(
                "429 Too Many Requests: {}",
                error_text
            )));
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown".to_string());
            return Err(InvocationFailure::transient(format!(
                "Model API error {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| InvocationFailure::transient(format!("Failed to parse response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| InvocationFailure::transient("No choices in response"))
    }
}

/// A call observed by [`MockBackend`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub credential: String,
    pub role_label: String,
    pub user_text: String,
    pub json_mode: bool,
    pub started_at: tokio::time::Instant,
}

/// Scripted backend for tests
///
/// Replies are keyed by a prefix of the request's role label. Each key holds
/// a queue; the last reply of a queue repeats once the others are used up.
/// Requests matching no key get the fallback reply.
pub struct MockBackend {
    replies: Mutex<Vec<(String, VecDeque<Result<String, InvocationFailure>>)>>,
    fallback: Result<String, InvocationFailure>,
    latency: Duration,
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            fallback: Err(InvocationFailure::transient("No mock response")),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Backend answering every request with `text`
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new().with_fallback(Ok(text.into()))
    }

    /// Backend failing every request with `kind`
    pub fn failing(kind: FailureKind) -> Self {
        Self::new().with_fallback(Err(InvocationFailure::new(kind, "mock failure")))
    }

    pub fn with_fallback(mut self, reply: Result<String, InvocationFailure>) -> Self {
        self.fallback = reply;
        self
    }

    /// Queue a text reply for requests whose role label starts with `label`
    pub fn with_response(self, label: &str, text: impl Into<String>) -> Self {
        self.with_reply(label, Ok(text.into()))
    }

    pub fn with_failure(self, label: &str, kind: FailureKind) -> Self {
        self.with_reply(label, Err(InvocationFailure::new(kind, "mock failure")))
    }

    fn with_reply(self, label: &str, reply: Result<String, InvocationFailure>) -> Self {
        {
            let mut replies = self.replies.lock().unwrap_or_else(|e| e.into_inner());
            match replies.iter_mut().find(|(key, _)| key == label) {
                Some((_, queue)) => queue.push_back(reply),
                None => replies.push((label.to_string(), VecDeque::from([reply]))),
            }
        }
        self
    }

    /// Simulated time spent inside each call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Calls observed with a role label starting with `label`
    pub fn calls_for(&self, label: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.role_label.starts_with(label))
            .collect()
    }

    /// Highest number of calls ever running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, role_label: &str) -> Result<String, InvocationFailure> {
        let mut replies = self.replies.lock().unwrap_or_else(|e| e.into_inner());
        let Some((_, queue)) = replies
            .iter_mut()
            .find(|(key, _)| role_label.starts_with(key.as_str()))
        else {
            return self.fallback.clone();
        };

        if queue.len() > 1 {
            queue.pop_front().unwrap_or_else(|| self.fallback.clone())
        } else {
            queue.front().cloned().unwrap_or_else(|| self.fallback.clone())
        }
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    async fn complete(
        &self,
        credential: &Credential,
        request: &InvocationRequest,
    ) -> Result<String, InvocationFailure> {
        let role_label = request.role_label();
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                credential: credential.secret().to_string(),
                role_label: role_label.clone(),
                user_text: request.user_text().to_string(),
                json_mode: request.json_mode(),
                started_at: tokio::time::Instant::now(),
            });

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.next_reply(&role_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(system: &str) -> InvocationRequest {
        InvocationRequest::builder("test-model")
            .system(system)
            .user("hello")
            .build()
    }

    #[test]
    fn test_request_body_shape() {
        let req = InvocationRequest::builder("llama")
            .system("You are the Head Chef.")
            .user("cook")
            .json_mode(true)
            .build();
        let body = ChatCompletionRequest {
            model: req.model(),
            messages: req.messages(),
            temperature: req.temperature(),
            max_tokens: req.max_tokens(),
            response_format: req.json_mode().then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "llama");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["max_tokens"], 4096);
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"{\"ok\":true}"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("{\"ok\":true}")
        );
    }

    #[tokio::test]
    async fn test_mock_backend_queues_by_label() {
        let backend = MockBackend::new()
            .with_response("You are the Head Chef", "first")
            .with_response("You are the Head Chef", "second")
            .with_fallback(Ok("other".to_string()));
        let credential = Credential::new("k");

        let chef = request("You are the Head Chef. Cook things.");
        assert_eq!(backend.complete(&credential, &chef).await.unwrap(), "first");
        assert_eq!(backend.complete(&credential, &chef).await.unwrap(), "second");
        // Last reply repeats
        assert_eq!(backend.complete(&credential, &chef).await.unwrap(), "second");

        let other = request("You are someone else.");
        assert_eq!(backend.complete(&credential, &other).await.unwrap(), "other");

        assert_eq!(backend.call_count(), 4);
        assert_eq!(backend.calls_for("You are the Head Chef").len(), 3);
    }

    #[tokio::test]
    async fn test_mock_backend_failure() {
        let backend = MockBackend::failing(FailureKind::RateLimited);
        let result = backend
            .complete(&Credential::new("k"), &request("Any."))
            .await;
        assert!(result.unwrap_err().is_rate_limited());
    }
}
