//! HTTP surface: the vote submission gateway and the proposal API.

pub mod proposals;
pub mod submit_vote;

use axum::{
    extract::State,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, HeaderName, HeaderValue, Method,
    },
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::audit::AuditSink;
use crate::auth::{bearer_token, SessionVerifier};
use crate::config::AppConfig;
use crate::database::models::Profile;
use crate::database::Database;
use crate::error::{Result, ReviewError};

pub const SUBMIT_VOTE_PATH: &str = "/functions/v1/submit-vote";

/// Shared handler state. Collaborators are trait objects so tests can swap
/// the verifier or the audit sink.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub database: Database,
    pub sessions: Arc<dyn SessionVerifier>,
    pub audit: Arc<dyn AuditSink>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        database: Database,
        sessions: Arc<dyn SessionVerifier>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            database,
            sessions,
            audit,
        }
    }

    /// Resolve the caller from `Authorization: Bearer <token>`.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Profile> {
        let token = bearer_token(headers).ok_or(ReviewError::Unauthorized)?;
        self.sessions.verify(token).await
    }

    pub async fn authenticate_admin(&self, headers: &HeaderMap) -> Result<Profile> {
        let caller = self.authenticate(headers).await?;
        if !caller.is_admin() {
            return Err(ReviewError::Forbidden("admin role required".to_string()));
        }
        Ok(caller)
    }
}

pub fn cors_layer(config: &AppConfig) -> Result<CorsLayer> {
    let allow_origin = if config.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let origins = config
            .cors
            .allowed_origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o.trim())
                    .map_err(|e| ReviewError::ConfigError(format!("Invalid CORS origin {:?}: {}", o, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            CONTENT_TYPE,
        ])
        .max_age(Duration::from_secs(config.cors.max_age_secs)))
}

pub fn router(state: AppState) -> Result<Router> {
    let cors = cors_layer(&state.config)?;

    Ok(Router::new()
        .route("/health", get(health_check))
        .route(SUBMIT_VOTE_PATH, post(submit_vote::submit_vote))
        .route(
            "/api/proposals",
            get(proposals::list_proposals).post(proposals::create_proposal),
        )
        .route("/api/proposals/:id", get(proposals::get_proposal))
        .route("/api/proposals/:id/audit", get(proposals::get_audit_trail))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .into_inner(),
        )
        .with_state(state))
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "proposal-review",
        "server_id": state.config.server_id,
        "timestamp": chrono::Utc::now()
    }))
}
