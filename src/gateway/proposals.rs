use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::models::{AuditRecord, NewProposal, Proposal, Review};
use crate::database::queries::Queries;
use crate::error::{Result, ReviewError};
use crate::gateway::AppState;
use crate::tracker::{DashboardStats, VoteTracker};

pub const DEFAULT_LIST_LIMIT: i64 = 5;
pub const MAX_LIST_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProposalList {
    pub proposals: Vec<Proposal>,
    pub stats: DashboardStats,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateProposalRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub pdf_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProposalDetail {
    pub proposal: Proposal,
    pub my_review: Option<Review>,
    /// Present for admins only.
    pub vote_tracker: Option<VoteTracker>,
}

impl CreateProposalRequest {
    pub fn into_new_proposal(self, created_by: &str) -> Result<NewProposal> {
        let title = self.title.trim();
        let department = self.department.trim();
        let pdf_url = self.pdf_url.trim();

        if title.is_empty() || department.is_empty() || pdf_url.is_empty() {
            return Err(ReviewError::missing_required_fields());
        }

        let url = Url::parse(pdf_url)
            .map_err(|e| ReviewError::ValidationError(format!("Invalid pdf_url: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ReviewError::ValidationError(
                "pdf_url must be an http(s) URL".to_string(),
            ));
        }

        Ok(NewProposal {
            title: title.to_string(),
            department: department.to_string(),
            pdf_url: url.to_string(),
            created_by: created_by.to_string(),
        })
    }
}

/// `GET /api/proposals?limit=N`
pub async fn list_proposals(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ProposalList>> {
    state.authenticate(&headers).await?;
    let Query(params) = params
        .map_err(|e| ReviewError::ValidationError(format!("Invalid query: {}", e.body_text())))?;

    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let proposals = Queries::list_recent_proposals(state.database.pool(), limit).await?;
    let stats = DashboardStats::from_proposals(&proposals);

    Ok(Json(ProposalList { proposals, stats }))
}

/// `POST /api/proposals` (admin)
pub async fn create_proposal(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Proposal>)> {
    let caller = state.authenticate_admin(&headers).await?;

    let request: CreateProposalRequest = serde_json::from_slice(&body)?;
    let new = request.into_new_proposal(&caller.id)?;
    let proposal = state.database.create_proposal(&new).await?;

    info!("Proposal {} created by {}", proposal.id, caller.id);
    Ok((StatusCode::CREATED, Json(proposal)))
}

/// `GET /api/proposals/:id`
pub async fn get_proposal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ProposalDetail>> {
    let caller = state.authenticate(&headers).await?;
    let pool = state.database.pool();

    let proposal = Queries::get_proposal(pool, &id)
        .await?
        .ok_or_else(|| ReviewError::NotFound(format!("proposal {}", id)))?;
    let my_review = Queries::get_review(pool, &id, &caller.id).await?;

    let vote_tracker = if caller.is_admin() {
        let members = Queries::list_members(pool).await?;
        let reviews = Queries::list_reviews_for_proposal(pool, &id).await?;
        Some(VoteTracker::build(&members, &reviews))
    } else {
        None
    };

    Ok(Json(ProposalDetail {
        proposal,
        my_review,
        vote_tracker,
    }))
}

/// `GET /api/proposals/:id/audit` (admin)
pub async fn get_audit_trail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<AuditRecord>>> {
    state.authenticate_admin(&headers).await?;

    if Queries::get_proposal(state.database.pool(), &id).await?.is_none() {
        return Err(ReviewError::NotFound(format!("proposal {}", id)));
    }

    let records = Queries::list_audit_records_for_resource(state.database.pool(), &id).await?;
    Ok(Json(records))
}
