//! Invocation gateway: the single way to ask the model anything
//!
//! The gateway owns the credential pool, a one-permit gate, and the retry
//! policy. All model calls in the process serialize on the gate. Rate limits
//! are retried with exponential backoff while the gate is held; every other
//! failure ends the call immediately. Callers of [`Gateway::invoke`] never see
//! an error, only the neutral result.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use cookbot_core::ModelConfig;

use crate::backend::{GroqBackend, ModelBackend};
use crate::credentials::CredentialPool;
use crate::types::{FailureKind, GatewayPolicy, InvocationFailure, InvocationRequest};

pub struct Gateway {
    backend: Arc<dyn ModelBackend>,
    pool: CredentialPool,
    gate: Semaphore,
    policy: GatewayPolicy,
    model: String,
    temperature: f32,
    max_tokens: usize,
}

impl Gateway {
    pub fn new(backend: Arc<dyn ModelBackend>, pool: CredentialPool, policy: GatewayPolicy) -> Self {
        Self {
            backend,
            pool,
            gate: Semaphore::new(1),
            policy,
            model: "llama-3.1-8b-instant".to_string(),
            temperature: InvocationRequest::DEFAULT_TEMPERATURE,
            max_tokens: InvocationRequest::DEFAULT_MAX_TOKENS,
        }
    }

    /// Gateway over Groq with the configured model settings
    pub fn groq(model: &ModelConfig, pool: CredentialPool, policy: GatewayPolicy) -> Self {
        Self::new(Arc::new(GroqBackend::new(&model.endpoint)), pool, policy).with_model(model)
    }

    /// Use `model` for requests built through [`Gateway::request`]
    pub fn with_model(mut self, model: &ModelConfig) -> Self {
        self.model = model.name.clone();
        self.temperature = model.temperature;
        self.max_tokens = model.max_tokens;
        self
    }

    /// Request builder preloaded with this gateway's model settings
    pub fn request(&self) -> crate::types::InvocationRequestBuilder {
        InvocationRequest::builder(&self.model)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
    }

    pub fn has_credentials(&self) -> bool {
        !self.pool.is_empty()
    }

    pub fn policy(&self) -> &GatewayPolicy {
        &self.policy
    }

    /// Ask the model; failures degrade to the request's neutral result
    pub async fn invoke(&self, request: &InvocationRequest) -> String {
        match self.try_invoke(request).await {
            Ok(text) => text,
            Err(failure) => {
                debug!(
                    "{}: returning neutral result after {}",
                    request.role_label(),
                    failure.kind
                );
                request.neutral_result()
            }
        }
    }

    /// Ask the model and report why it failed, if it did
    pub async fn try_invoke(&self, request: &InvocationRequest) -> Result<String, InvocationFailure> {
        let label = request.role_label();

        let Some(credential) = self.pool.choose() else {
            warn!("{}: model unavailable (no credentials)", label);
            return Err(InvocationFailure::unavailable("no credentials configured"));
        };

        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| InvocationFailure::unavailable("gateway closed"))?;

        let max_attempts = self.policy.max_attempts.max(1);
        let mut backoff = self.policy.initial_backoff;

        for attempt in 1..=max_attempts {
            match self.backend.complete(credential, request).await {
                Ok(text) => {
                    if attempt > 1 {
                        info!("{} succeeded (attempt {})", label, attempt);
                    }
                    tokio::time::sleep(self.policy.cooldown).await;
                    return Ok(text);
                }
                Err(failure) if failure.is_rate_limited() => {
                    if attempt == max_attempts {
                        error!("{}: rate limited after {} attempts", label, max_attempts);
                        break;
                    }
                    warn!(
                        "{}: rate limited, waiting {:?} before attempt {}/{}",
                        label,
                        backoff,
                        attempt + 1,
                        max_attempts
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(failure) => {
                    warn!("{}: model call failed: {}", label, failure);
                    return Err(failure);
                }
            }
        }

        Err(InvocationFailure::new(
            FailureKind::BoundExhausted,
            format!("rate limited {} times", max_attempts),
        ))
    }
}
