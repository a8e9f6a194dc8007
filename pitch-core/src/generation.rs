//! Pitch generation backends
//!
//! Provides a `PitchGenerator` trait with implementations for:
//! - **Webhook**: one POST to an external generation webhook, bounded by a
//!   hard timeout, with the response run through the normalizer
//! - **Static**: a fixed demo pitch, no I/O
//!
//! Generation never retries; a caller that wants another attempt resubmits.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::GenerationConfig;
use crate::models::PitchContent;
use crate::normalize::{normalize, RawPayload};

/// Connect timeout for the webhook; the overall deadline is configured separately.
const CONNECT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// PitchGenerator trait
// ============================================================================

/// Abstraction over pitch generation providers.
#[async_trait]
pub trait PitchGenerator: Send + Sync {
    /// Generate a complete pitch for the given idea.
    async fn generate(&self, idea: &str) -> Result<PitchContent, GenerationError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

/// Pitch generation errors
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Idea must not be empty")]
    InvalidInput,

    #[error("Generation timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Upstream error (status {status:?}): {body}")]
    Upstream { status: Option<u16>, body: String },

    #[error("Upstream returned an empty payload")]
    MalformedPayload,

    #[error("Missing generation webhook URL")]
    MissingWebhookUrl,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl GenerationError {
    /// True for failures caused by the upstream service rather than the caller.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Upstream { .. } | Self::MalformedPayload | Self::Http(_)
        )
    }
}

/// Reject blank ideas; returns the trimmed idea.
pub fn validate_idea(idea: &str) -> Result<&str, GenerationError> {
    let idea = idea.trim();
    if idea.is_empty() {
        return Err(GenerationError::InvalidInput);
    }
    Ok(idea)
}

/// Create the configured backend. Unknown names fall back to `webhook`.
pub fn create_generator(
    config: &GenerationConfig,
) -> Result<Box<dyn PitchGenerator>, GenerationError> {
    match config.backend.as_str() {
        "static" => Ok(Box::new(StaticGenerator)),
        other => {
            if other != "webhook" {
                tracing::warn!(backend = other, "Unknown generation backend, using webhook");
            }
            let url = config
                .resolved_webhook_url()
                .ok_or(GenerationError::MissingWebhookUrl)?;
            Ok(Box::new(WebhookGenerator::new(
                url,
                Duration::from_secs(config.timeout_seconds),
            )?))
        }
    }
}

// ============================================================================
// Webhook wire format (private)
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookRequest<'a> {
    chat_input: &'a str,
    message: &'a str,
    session_id: String,
    timestamp: String,
}

impl<'a> WebhookRequest<'a> {
    fn new(idea: &'a str) -> Self {
        Self {
            chat_input: idea,
            message: idea,
            session_id: format!("session_{}", Uuid::new_v4()),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

// ============================================================================
// WebhookGenerator
// ============================================================================

/// Generation client: calls the external generation webhook once per request.
#[derive(Debug, Clone)]
pub struct WebhookGenerator {
    client: Client,
    url: String,
    timeout: Duration,
}

impl WebhookGenerator {
    pub fn new(url: String, timeout: Duration) -> Result<Self, GenerationError> {
        if url.trim().is_empty() {
            return Err(GenerationError::MissingWebhookUrl);
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    /// Send one request and read the whole body. Dropped on timeout.
    async fn call(&self, idea: &str) -> Result<String, GenerationError> {
        let request = WebhookRequest::new(idea);
        tracing::debug!(session_id = %request.session_id, "Sending generation request");

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Upstream {
                status: None,
                body: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| GenerationError::Upstream {
            status: Some(status.as_u16()),
            body: e.to_string(),
        })?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), body = %body, "Generation webhook error");
            return Err(GenerationError::Upstream {
                status: Some(status.as_u16()),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl PitchGenerator for WebhookGenerator {
    async fn generate(&self, idea: &str) -> Result<PitchContent, GenerationError> {
        let idea = validate_idea(idea)?;

        let body = match tokio::time::timeout(self.timeout, self.call(idea)).await {
            Ok(result) => result?,
            Err(_) => {
                let millis = self.timeout.as_millis() as u64;
                tracing::error!(timeout_ms = millis, "Generation webhook timed out");
                return Err(GenerationError::Timeout { millis });
            }
        };

        let raw = RawPayload::from_body(&body).ok_or_else(|| {
            tracing::error!("Generation webhook returned an empty body");
            GenerationError::MalformedPayload
        })?;

        Ok(normalize(&raw, idea))
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

// ============================================================================
// StaticGenerator
// ============================================================================

/// Returns the same complete demo pitch for every idea.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticGenerator;

#[async_trait]
impl PitchGenerator for StaticGenerator {
    async fn generate(&self, idea: &str) -> Result<PitchContent, GenerationError> {
        validate_idea(idea)?;
        Ok(PitchContent {
            title: "Revolutionary Startup Idea".to_string(),
            description: "A comprehensive solution that addresses market needs with innovative technology.".to_string(),
            problem: "Many businesses struggle with inefficient processes and lack of automation, leading to wasted time, increased costs, and reduced productivity.".to_string(),
            solution: "An intuitive platform that integrates with existing workflows, automates repetitive tasks and scales with the business.".to_string(),
            target_market: "Small to medium-sized businesses with 10-500 employees looking to digitize their operations.".to_string(),
            revenue_model: "Subscription SaaS with Basic ($29/month), Professional ($99/month) and Enterprise ($299/month) tiers.".to_string(),
            call_to_action: "Join the beta program today and get 50% off the first year.".to_string(),
        })
    }

    fn name(&self) -> &str {
        "static"
    }
}

// ============================================================================
// TESTS
// ============================================================================
