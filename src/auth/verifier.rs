//! Bearer token verification
//!
//! Resolves a bearer token to a caller profile, either against the local
//! `sessions` table or the hosted auth backend.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::hash_token;
use crate::database::models::Profile;
use crate::database::queries::Queries;
use crate::database::Database;
use crate::error::{Result, ReviewError};

#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// `Err(ReviewError::Unauthorized)` for unknown, expired or revoked tokens.
    async fn verify(&self, token: &str) -> Result<Profile>;
}

pub struct DatabaseSessionVerifier {
    database: Database,
}

impl DatabaseSessionVerifier {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl SessionVerifier for DatabaseSessionVerifier {
    async fn verify(&self, token: &str) -> Result<Profile> {
        let profile =
            Queries::get_profile_by_session(self.database.pool(), &hash_token(token), Utc::now())
                .await?;

        match profile {
            Some(profile) => {
                debug!("Session resolved to {}", profile.id);
                Ok(profile)
            }
            None => Err(ReviewError::Unauthorized),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: String,
}

/// Verifies tokens with the hosted auth service (`GET /auth/v1/user`), then
/// loads the caller's profile locally.
pub struct RemoteSessionVerifier {
    base_url: String,
    anon_key: Option<String>,
    http_client: Client,
    database: Database,
}

impl RemoteSessionVerifier {
    pub fn new(base_url: String, anon_key: Option<String>, database: Database) -> Self {
        Self {
            base_url,
            anon_key,
            http_client: Client::new(),
            database,
        }
    }

    fn user_endpoint(&self) -> String {
        format!("{}/auth/v1/user", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SessionVerifier for RemoteSessionVerifier {
    async fn verify(&self, token: &str) -> Result<Profile> {
        let mut request = self.http_client.get(self.user_endpoint()).bearer_auth(token);
        if let Some(key) = &self.anon_key {
            request = request.header("apikey", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReviewError::AuthBackendError(format!("Auth request failed: {}", e)))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ReviewError::Unauthorized);
            }
            status if !status.is_success() => {
                warn!("Auth backend returned {}", status);
                return Err(ReviewError::AuthBackendError(format!(
                    "Auth backend returned {}",
                    status
                )));
            }
            _ => {}
        }

        let user: RemoteUser = response
            .json()
            .await
            .map_err(|e| ReviewError::AuthBackendError(format!("Invalid auth response: {}", e)))?;

        Queries::get_profile(self.database.pool(), &user.id)
            .await?
            .ok_or_else(|| {
                warn!("Authenticated user {} has no profile", user.id);
                ReviewError::Unauthorized
            })
    }
}
