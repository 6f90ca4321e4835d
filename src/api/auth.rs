//! Bearer-token authentication against the database provider.

use anyhow::Context;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    Json,
};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::{api::types::ErrorBody, config::Settings};

use super::AppState;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing or invalid Authorization header")]
    MissingToken,
    #[error("Invalid token")]
    Rejected,
    #[error("Token missing subject")]
    MissingSubject,
    #[error("Token verification failed: {0}")]
    Upstream(String),
}

/// Resolves a bearer token to the caller's subject id.
pub trait TokenVerifier: Send + Sync {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<String, AuthError>>;
}

/// Delegates verification to the provider's `/auth/v1/user` endpoint.
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ProviderUser {
    #[serde(default)]
    id: Option<String>,
}

impl SupabaseAuth {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let (url, key) = settings.supabase()?;
        let client = Client::builder()
            .user_agent("janani-assistant/0.1")
            .build()
            .context("building auth client")?;
        Ok(Self {
            client,
            base_url: url.to_string(),
            api_key: key.to_string(),
        })
    }
}

impl TokenVerifier for SupabaseAuth {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<String, AuthError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(format!("{}/auth/v1/user", self.base_url))
                .header("apikey", &self.api_key)
                .bearer_auth(token)
                .send()
                .await
                .map_err(|e| AuthError::Upstream(e.to_string()))?;
            check_provider_status(response.status())?;
            let user: ProviderUser = response
                .json()
                .await
                .map_err(|e| AuthError::Upstream(e.to_string()))?;
            user.id
                .filter(|id| !id.is_empty())
                .ok_or(AuthError::MissingSubject)
        })
    }
}

/// Only 401 and 403 mean the token itself was refused; anything else
/// unsuccessful (rate limiting, outages) is a provider failure.
fn check_provider_status(status: reqwest::StatusCode) -> Result<(), AuthError> {
    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            Err(AuthError::Rejected)
        }
        status if status.is_success() => Ok(()),
        status => Err(AuthError::Upstream(format!("provider returned {status}"))),
    }
}

/// Authenticated caller, extracted from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = (StatusCode, Json<ErrorBody>);

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let unauthorized = |err: AuthError| (StatusCode::UNAUTHORIZED, Json(ErrorBody::new(err)));
        let token = bearer_token(parts).ok_or_else(|| unauthorized(AuthError::MissingToken))?;
        match state.auth.verify(token).await {
            Ok(user_id) => Ok(Caller { user_id }),
            Err(err) => {
                warn!(error = %err, "rejected caller");
                Err(unauthorized(err))
            }
        }
    }
}
