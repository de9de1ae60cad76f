//! Where a client vote is persisted: through the gateway, or straight into
//! the store.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::auth::CurrentUser;
use crate::config::ClientConfig;
use crate::database::models::{Review, ReviewUpsert};
use crate::database::Database;
use crate::error::{Result, ReviewError};
use crate::gateway::submit_vote::{SubmitVoteRequest, SubmitVoteResponse};
use crate::vote_flow::draft::VoteIntent;

#[async_trait]
pub trait VoteBackend: Send + Sync {
    async fn persist(&self, user: &CurrentUser, proposal_id: &str, intent: &VoteIntent)
        -> Result<Review>;
}

/// Submits through `POST /functions/v1/submit-vote`, so the vote is audited.
pub struct GatewayBackend {
    gateway_url: String,
    http_client: Client,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

impl GatewayBackend {
    pub fn new(gateway_url: String) -> Self {
        Self {
            gateway_url,
            http_client: Client::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.gateway_url.clone())
    }
}

#[async_trait]
impl VoteBackend for GatewayBackend {
    async fn persist(
        &self,
        user: &CurrentUser,
        proposal_id: &str,
        intent: &VoteIntent,
    ) -> Result<Review> {
        let request = SubmitVoteRequest {
            proposal_id: Some(proposal_id.to_string()),
            vote_status: Some(intent.vote_status().as_str().to_string()),
            comments: Some(intent.comment().to_string()).filter(|c| !c.is_empty()),
            signature_data: intent.signature().map(String::from),
        };

        let response = self
            .http_client
            .post(&self.gateway_url)
            .bearer_auth(&user.access_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(ReviewError::GatewayError(message));
        }

        let body: SubmitVoteResponse = response.json().await?;
        debug!("Gateway accepted vote, review {}", body.review.id);
        Ok(body.review)
    }
}

/// Writes the review row directly. No audit entry is produced on this path.
pub struct DirectBackend {
    database: Database,
}

impl DirectBackend {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl VoteBackend for DirectBackend {
    async fn persist(
        &self,
        user: &CurrentUser,
        proposal_id: &str,
        intent: &VoteIntent,
    ) -> Result<Review> {
        let upsert = ReviewUpsert {
            proposal_id: proposal_id.to_string(),
            reviewer_id: user.id().to_string(),
            vote_status: intent.vote_status(),
            comments: Some(intent.comment().to_string()).filter(|c| !c.is_empty()),
            signature_data: intent.signature().map(String::from),
        };
        self.database.upsert_review(&upsert).await
    }
}
