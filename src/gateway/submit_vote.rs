use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{error, info, warn};

use crate::audit::{AuditEvent, UNKNOWN_ADDRESS};
use crate::database::models::{Review, ReviewUpsert, VoteStatus};
use crate::database::queries::Queries;
use crate::error::{Result, ReviewError};
use crate::gateway::AppState;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SubmitVoteRequest {
    #[serde(default)]
    pub proposal_id: Option<String>,
    #[serde(default)]
    pub vote_status: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub signature_data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitVoteResponse {
    pub success: bool,
    pub review: Review,
}

impl SubmitVoteRequest {
    /// Validate and bind to the resolved caller.
    pub fn into_upsert(self, reviewer_id: &str) -> Result<ReviewUpsert> {
        let proposal_id = self.proposal_id.filter(|s| !s.trim().is_empty());
        let vote_status = self.vote_status.filter(|s| !s.trim().is_empty());

        let (Some(proposal_id), Some(vote_status)) = (proposal_id, vote_status) else {
            return Err(ReviewError::missing_required_fields());
        };

        let vote_status = match VoteStatus::from_str(vote_status.trim()) {
            Ok(status @ (VoteStatus::Approve | VoteStatus::Reject)) => status,
            _ => {
                return Err(ReviewError::ValidationError(format!(
                    "Invalid vote_status: {}",
                    vote_status
                )))
            }
        };

        Ok(ReviewUpsert {
            proposal_id,
            reviewer_id: reviewer_id.to_string(),
            vote_status,
            comments: self.comments.filter(|c| !c.is_empty()),
            signature_data: self.signature_data.filter(|s| !s.is_empty()),
        })
    }
}

/// First hop of `x-forwarded-for`, or "unknown".
pub fn client_address(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_ADDRESS)
        .to_string()
}

/// `POST /functions/v1/submit-vote`
///
/// Order matters: authenticate, validate, upsert, then audit. Nothing is
/// written unless the first two succeed, and an audit failure is logged
/// without affecting the response.
pub async fn submit_vote(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SubmitVoteResponse>> {
    let client_ip = client_address(&headers);

    let caller = state.authenticate(&headers).await.map_err(|e| {
        warn!("Rejected vote from {}: {}", client_ip, e);
        e
    })?;

    let request: SubmitVoteRequest = serde_json::from_slice(&body)?;
    let upsert = request.into_upsert(&caller.id)?;

    if Queries::get_proposal(state.database.pool(), &upsert.proposal_id)
        .await?
        .is_none()
    {
        return Err(ReviewError::NotFound(format!("proposal {}", upsert.proposal_id)));
    }

    let review = state.database.upsert_review(&upsert).await.map_err(|e| {
        error!("Vote upsert failed for {}: {}", upsert.proposal_id, e);
        e
    })?;

    let event = AuditEvent::vote_cast(
        &caller.id,
        &client_ip,
        &review.proposal_id,
        serde_json::json!({
            "vote_status": review.vote_status,
            "comments": review.comments,
            "review_id": review.id,
        }),
    );
    if let Err(e) = state.audit.record(event).await {
        error!("Audit log failed: {}", e);
    }

    info!(
        "Vote {} recorded on {} by {}",
        review.vote_status, review.proposal_id, caller.id
    );

    Ok(Json(SubmitVoteResponse {
        success: true,
        review,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn request(proposal_id: Option<&str>, vote_status: Option<&str>) -> SubmitVoteRequest {
        SubmitVoteRequest {
            proposal_id: proposal_id.map(String::from),
            vote_status: vote_status.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_fields() {
        for req in [
            request(None, Some("Approve")),
            request(Some("p1"), None),
            request(Some(""), Some("Approve")),
            request(Some("p1"), Some("  ")),
        ] {
            let err = req.into_upsert("u1").unwrap_err();
            assert_eq!(err.envelope_message(), "Missing required fields");
        }
    }

    #[test]
    fn test_pending_is_not_a_submittable_vote() {
        let err = request(Some("p1"), Some("Pending")).into_upsert("u1").unwrap_err();
        assert!(matches!(err, ReviewError::ValidationError(_)));
    }

    #[test]
    fn test_empty_comment_becomes_null() {
        let req = SubmitVoteRequest {
            comments: Some(String::new()),
            ..request(Some("p1"), Some("Reject"))
        };
        let upsert = req.into_upsert("u1").unwrap();
        assert_eq!(upsert.reviewer_id, "u1");
        assert_eq!(upsert.vote_status, VoteStatus::Reject);
        assert_eq!(upsert.comments, None);
    }

    #[test]
    fn test_client_address() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_address(&headers), "unknown");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_address(&headers), "203.0.113.7");

        headers.insert("x-forwarded-for", HeaderValue::from_static(" "));
        assert_eq!(client_address(&headers), "unknown");
    }
}
