//! Bearer-token verification against a Supabase-compatible identity service.
//!
//! `GET {url}/auth/v1/user` with the caller's access token returns the user;
//! its `id` becomes the pitch owner id.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::AuthConfig;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Verifies a bearer token and yields an opaque owner id.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, token: &str) -> Result<String, AuthError>;
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or_else(|| AuthError::Unauthorized("missing bearer token".into()))?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .unwrap_or("")
        .trim();
    if token.is_empty() {
        return Err(AuthError::Unauthorized("missing bearer token".into()));
    }
    Ok(token)
}

#[derive(Debug, Deserialize)]
struct SupabaseUser {
    id: Option<String>,
}

/// Identity provider backed by the Supabase auth REST API.
#[derive(Debug, Clone)]
pub struct SupabaseIdentity {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseIdentity {
    pub fn new(base_url: String, api_key: String) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let api_key = config.service_key();
        if api_key.is_empty() {
            tracing::warn!(
                env = %config.service_key_env,
                "Identity service key not set; token verification will likely fail"
            );
        }
        Self::new(config.supabase_url.clone(), api_key)
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn verify(&self, token: &str) -> Result<String, AuthError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Identity provider rejected token");
            return Err(AuthError::Unauthorized(format!(
                "token rejected ({})",
                status.as_u16()
            )));
        }

        let user: SupabaseUser = response
            .json()
            .await
            .map_err(|e| AuthError::Unauthorized(format!("unreadable user: {}", e)))?;

        user.id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AuthError::Unauthorized("user has no id".into()))
    }
}
