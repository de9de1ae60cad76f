//! Remote session verification against a mocked auth service.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;
use proposal_review::audit::TracingAuditSink;
use proposal_review::auth::{RemoteSessionVerifier, SessionVerifier};
use proposal_review::config::AppConfig;
use proposal_review::database::Database;
use proposal_review::error::ReviewError;
use proposal_review::gateway::{router, AppState};

async fn verifier_for(server: &MockServer) -> (RemoteSessionVerifier, Database) {
    let db = setup_test_db().await;
    seed(&db).await;
    let verifier = RemoteSessionVerifier::new(server.uri(), Some("anon-key".to_string()), db.clone());
    (verifier, db)
}

#[tokio::test]
async fn test_remote_token_resolves_to_local_profile() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer remote-token"))
        .and(header("apikey", "anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u1",
            "email": "u1@example.org"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (verifier, _) = verifier_for(&server).await;
    let profile = verifier.verify("remote-token").await?;
    assert_eq!(profile.id, "u1");

    println!("✅ Remote session resolved");
    Ok(())
}

#[tokio::test]
async fn test_remote_rejections_map_to_unauthorized() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer revoked"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer orphan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "ghost"})))
        .mount(&server)
        .await;

    let (verifier, _) = verifier_for(&server).await;
    assert!(matches!(verifier.verify("revoked").await, Err(ReviewError::Unauthorized)));
    assert!(matches!(verifier.verify("orphan").await, Err(ReviewError::Unauthorized)));
    Ok(())
}

#[tokio::test]
async fn test_backend_outage_is_service_unavailable() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (verifier, db) = verifier_for(&server).await;
    assert!(matches!(
        verifier.verify("any").await,
        Err(ReviewError::AuthBackendError(_))
    ));

    let state = AppState::new(
        AppConfig::default(),
        db.clone(),
        Arc::new(verifier),
        Arc::new(TracingAuditSink),
    );
    let app = TestApp {
        database: db,
        router: router(state)?,
    };
    let (status, body) = app
        .submit_vote(
            Some("any"),
            json!({"proposal_id": PROPOSAL_ID, "vote_status": "Approve"}),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
    assert_eq!(review_count(&app.database).await, 0);

    println!("✅ Auth outage surfaced as 503 with no writes");
    Ok(())
}
