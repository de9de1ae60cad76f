pub mod models;
pub mod queries;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::debug;

use crate::audit::AuditLogEntry;
use crate::error::{Result, ReviewError};
use models::*;
use queries::{audit_record_from_row, proposal_from_row, review_from_row};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

/// Fixed-width RFC 3339 so stored timestamps sort lexically.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Database {
    pub async fn new(database_url: &str) -> std::result::Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Ok(Database { pool })
    }

    /// Open an existing database without creating it or allowing writes.
    pub async fn open_read_only(database_url: &str) -> std::result::Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(false)
            .read_only(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Ok(Database { pool })
    }

    /// Single-connection in-memory database; every connection to
    /// `sqlite::memory:` is a separate database, so the pool is pinned to one.
    pub async fn new_in_memory() -> std::result::Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let db = Database { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert-or-replace the single review for (proposal_id, reviewer_id).
    pub async fn upsert_review(&self, upsert: &ReviewUpsert) -> Result<Review> {
        let now = format_timestamp(Utc::now());
        let row = sqlx::query(
            r#"
            INSERT INTO reviews
                (id, proposal_id, reviewer_id, vote_status, comments, signature_data, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (proposal_id, reviewer_id) DO UPDATE SET
                vote_status = excluded.vote_status,
                comments = excluded.comments,
                signature_data = COALESCE(excluded.signature_data, reviews.signature_data),
                updated_at = excluded.updated_at
            RETURNING id, proposal_id, reviewer_id, vote_status, comments, signature_data,
                      created_at, updated_at
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&upsert.proposal_id)
        .bind(&upsert.reviewer_id)
        .bind(upsert.vote_status.as_str())
        .bind(&upsert.comments)
        .bind(&upsert.signature_data)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ReviewError::PersistenceError(format!("Failed to upsert review: {}", e)))?;

        let review = review_from_row(&row)?;
        debug!(
            "Upserted review {} ({} on {} by {})",
            review.id, review.vote_status, review.proposal_id, review.reviewer_id
        );
        Ok(review)
    }

    pub async fn create_proposal(&self, new: &NewProposal) -> Result<Proposal> {
        let row = sqlx::query(
            r#"
            INSERT INTO proposals (id, title, department, pdf_url, status, created_at, created_by, signed_off)
            VALUES (?, ?, ?, ?, 'Pending', ?, ?, 0)
            RETURNING id, title, department, pdf_url, status, created_at, created_by, signed_off
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&new.title)
        .bind(&new.department)
        .bind(&new.pdf_url)
        .bind(format_timestamp(Utc::now()))
        .bind(&new.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ReviewError::DatabaseError(format!("Failed to create proposal: {}", e)))?;

        proposal_from_row(&row)
    }

    /// Append one audit row. Hashes are computed by the caller.
    pub async fn insert_audit_record(&self, entry: &AuditLogEntry) -> Result<AuditRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO legal_audit_log
                (id, user_id, action, ip_address, resource_id, metadata, created_at, previous_hash, entry_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING sequence, id, user_id, action, ip_address, resource_id, metadata,
                      created_at, previous_hash, entry_hash
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(&entry.action)
        .bind(&entry.ip_address)
        .bind(&entry.resource_id)
        .bind(serde_json::to_string(&entry.metadata)?)
        .bind(format_timestamp(entry.created_at))
        .bind(&entry.previous_hash)
        .bind(&entry.entry_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ReviewError::AuditError(format!("Failed to insert audit record: {}", e)))?;

        audit_record_from_row(&row)
    }

    pub async fn insert_profile(&self, profile: &Profile) -> Result<()> {
        sqlx::query("INSERT INTO profiles (id, email, role, department) VALUES (?, ?, ?, ?)")
            .bind(&profile.id)
            .bind(&profile.email)
            .bind(profile.role.as_str())
            .bind(&profile.department)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Register a bearer token for `user_id`; only its hash is stored.
    pub async fn insert_session(
        &self,
        token: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("INSERT INTO sessions (token_hash, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(crate::auth::hash_token(token))
            .bind(user_id)
            .bind(format_timestamp(expires_at))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
