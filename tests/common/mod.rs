//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use proposal_review::audit::{AuditEvent, AuditLogger, AuditSink};
use proposal_review::auth::DatabaseSessionVerifier;
use proposal_review::config::AppConfig;
use proposal_review::database::models::{Profile, ProposalStatus, Role};
use proposal_review::database::{format_timestamp, Database};
use proposal_review::error::{Result as ReviewResult, ReviewError};
use proposal_review::gateway::{router, AppState, SUBMIT_VOTE_PATH};

pub const MEMBER_TOKEN: &str = "token-u1";
pub const SECOND_MEMBER_TOKEN: &str = "token-u2";
pub const ADMIN_TOKEN: &str = "token-admin";
pub const PROPOSAL_ID: &str = "p1";

/// Setup an in-memory SQLite database for testing
pub async fn setup_test_db() -> Database {
    Database::new_in_memory()
        .await
        .expect("Failed to create test database")
}

pub fn profile(id: &str, role: Role) -> Profile {
    Profile {
        id: id.to_string(),
        email: format!("{}@example.org", id),
        role,
        department: "Finance".to_string(),
    }
}

pub async fn insert_proposal(db: &Database, id: &str, status: ProposalStatus) {
    sqlx::query(
        "INSERT INTO proposals (id, title, department, pdf_url, status, created_at, created_by, signed_off)
         VALUES (?, ?, 'Finance', 'https://docs.example.org/budget.pdf', ?, ?, 'admin', 0)",
    )
    .bind(id)
    .bind(format!("Proposal {}", id))
    .bind(status.as_str())
    .bind(format_timestamp(Utc::now()))
    .execute(db.pool())
    .await
    .expect("Failed to insert proposal");
}

/// Two members, one admin, their sessions and a pending proposal `p1`.
pub async fn seed(db: &Database) {
    let expires = Utc::now() + Duration::hours(1);
    for (p, token) in [
        (profile("u1", Role::Member), MEMBER_TOKEN),
        (profile("u2", Role::Member), SECOND_MEMBER_TOKEN),
        (profile("admin", Role::Admin), ADMIN_TOKEN),
    ] {
        db.insert_profile(&p).await.expect("Failed to insert profile");
        db.insert_session(token, &p.id, expires)
            .await
            .expect("Failed to insert session");
    }
    insert_proposal(db, PROPOSAL_ID, ProposalStatus::Pending).await;
}

pub async fn review_count(db: &Database) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
        .fetch_one(db.pool())
        .await
        .expect("Failed to count reviews")
}

pub async fn audit_count(db: &Database) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM legal_audit_log")
        .fetch_one(db.pool())
        .await
        .expect("Failed to count audit rows")
}

/// Audit sink that always fails, to exercise the best-effort path.
pub struct FailingAuditSink;

#[async_trait]
impl AuditSink for FailingAuditSink {
    async fn record(&self, _event: AuditEvent) -> ReviewResult<()> {
        Err(ReviewError::AuditError("audit table unavailable".to_string()))
    }
}

pub struct TestApp {
    pub database: Database,
    pub router: Router,
}

pub async fn spawn_app() -> TestApp {
    let database = setup_test_db().await;
    let audit = AuditLogger::new(database.clone())
        .await
        .expect("Failed to create audit logger");
    spawn_app_with(database, Arc::new(audit)).await
}

pub async fn spawn_app_with(database: Database, audit: Arc<dyn AuditSink>) -> TestApp {
    seed(&database).await;
    let state = AppState::new(
        AppConfig::default(),
        database.clone(),
        Arc::new(DatabaseSessionVerifier::new(database.clone())),
        audit,
    );
    let router = router(state).expect("Failed to build router");
    TestApp { database, router }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, headers, body)
    }

    pub async fn submit_vote(&self, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let (status, _, body) = self.send(vote_request(token, &body.to_string())).await;
        (status, body)
    }

    pub async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .expect("Failed to build request");
        let (status, _, body) = self.send(request).await;
        (status, body)
    }
}

pub fn vote_request(token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(SUBMIT_VOTE_PATH)
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}
