use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use crate::database::format_timestamp;
use crate::database::models::*;
use crate::error::{Result, ReviewError};

pub struct Queries;

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ReviewError::DatabaseError(format!("Invalid timestamp {:?}: {}", raw, e)))
}

pub(crate) fn profile_from_row(row: &SqliteRow) -> Result<Profile> {
    let role: String = row.try_get("role")?;
    Ok(Profile {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        role: Role::from_str(&role).map_err(ReviewError::DatabaseError)?,
        department: row.try_get("department")?,
    })
}

pub(crate) fn proposal_from_row(row: &SqliteRow) -> Result<Proposal> {
    let status: String = row.try_get("status")?;
    Ok(Proposal {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        department: row.try_get("department")?,
        pdf_url: row.try_get("pdf_url")?,
        status: ProposalStatus::from_str(&status).map_err(ReviewError::DatabaseError)?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        created_by: row.try_get("created_by")?,
        signed_off: row.try_get("signed_off")?,
    })
}

pub(crate) fn review_from_row(row: &SqliteRow) -> Result<Review> {
    let vote_status: String = row.try_get("vote_status")?;
    Ok(Review {
        id: row.try_get("id")?,
        proposal_id: row.try_get("proposal_id")?,
        reviewer_id: row.try_get("reviewer_id")?,
        vote_status: VoteStatus::from_str(&vote_status).map_err(ReviewError::DatabaseError)?,
        comments: row.try_get("comments")?,
        signature_data: row.try_get("signature_data")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?)?,
    })
}

pub(crate) fn audit_record_from_row(row: &SqliteRow) -> Result<AuditRecord> {
    let metadata: String = row.try_get("metadata")?;
    Ok(AuditRecord {
        sequence: row.try_get("sequence")?,
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        action: row.try_get("action")?,
        ip_address: row.try_get("ip_address")?,
        resource_id: row.try_get("resource_id")?,
        metadata: serde_json::from_str(&metadata)
            .map_err(|e| ReviewError::DatabaseError(format!("Invalid audit metadata: {}", e)))?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        previous_hash: row.try_get("previous_hash")?,
        entry_hash: row.try_get("entry_hash")?,
    })
}

const AUDIT_COLUMNS: &str = "sequence, id, user_id, action, ip_address, resource_id, metadata, \
                             created_at, previous_hash, entry_hash";

impl Queries {
    pub async fn get_profile(pool: &SqlitePool, id: &str) -> Result<Option<Profile>> {
        let row = sqlx::query("SELECT id, email, role, department FROM profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.as_ref().map(profile_from_row).transpose()
    }

    /// Profile owning an unexpired session with this token hash.
    pub async fn get_profile_by_session(
        pool: &SqlitePool,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Profile>> {
        let row = sqlx::query(
            r#"
            SELECT p.id, p.email, p.role, p.department
            FROM sessions s
            JOIN profiles p ON p.id = s.user_id
            WHERE s.token_hash = ? AND s.expires_at > ?
            "#,
        )
        .bind(token_hash)
        .bind(format_timestamp(now))
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(profile_from_row).transpose()
    }

    pub async fn list_members(pool: &SqlitePool) -> Result<Vec<Profile>> {
        let rows = sqlx::query(
            "SELECT id, email, role, department FROM profiles WHERE role = 'member' ORDER BY email",
        )
        .fetch_all(pool)
        .await?;

        rows.iter().map(profile_from_row).collect()
    }

    pub async fn get_proposal(pool: &SqlitePool, id: &str) -> Result<Option<Proposal>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, department, pdf_url, status, created_at, created_by, signed_off
            FROM proposals
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(proposal_from_row).transpose()
    }

    pub async fn list_recent_proposals(pool: &SqlitePool, limit: i64) -> Result<Vec<Proposal>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, department, pdf_url, status, created_at, created_by, signed_off
            FROM proposals
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        rows.iter().map(proposal_from_row).collect()
    }

    pub async fn get_review(
        pool: &SqlitePool,
        proposal_id: &str,
        reviewer_id: &str,
    ) -> Result<Option<Review>> {
        let row = sqlx::query(
            r#"
            SELECT id, proposal_id, reviewer_id, vote_status, comments, signature_data,
                   created_at, updated_at
            FROM reviews
            WHERE proposal_id = ? AND reviewer_id = ?
            "#,
        )
        .bind(proposal_id)
        .bind(reviewer_id)
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(review_from_row).transpose()
    }

    pub async fn list_reviews_for_proposal(
        pool: &SqlitePool,
        proposal_id: &str,
    ) -> Result<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT id, proposal_id, reviewer_id, vote_status, comments, signature_data,
                   created_at, updated_at
            FROM reviews
            WHERE proposal_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(proposal_id)
        .fetch_all(pool)
        .await?;

        rows.iter().map(review_from_row).collect()
    }

    /// Whole audit trail in append order.
    pub async fn list_audit_records(pool: &SqlitePool) -> Result<Vec<AuditRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM legal_audit_log ORDER BY sequence",
            AUDIT_COLUMNS
        ))
        .fetch_all(pool)
        .await?;

        rows.iter().map(audit_record_from_row).collect()
    }

    pub async fn list_audit_records_for_resource(
        pool: &SqlitePool,
        resource_id: &str,
    ) -> Result<Vec<AuditRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM legal_audit_log WHERE resource_id = ? ORDER BY sequence",
            AUDIT_COLUMNS
        ))
        .bind(resource_id)
        .fetch_all(pool)
        .await?;

        rows.iter().map(audit_record_from_row).collect()
    }

    pub async fn last_audit_hash(pool: &SqlitePool) -> Result<Option<String>> {
        let row = sqlx::query(
            "SELECT entry_hash FROM legal_audit_log ORDER BY sequence DESC LIMIT 1",
        )
        .fetch_optional(pool)
        .await?;

        row.map(|r| r.try_get::<String, _>("entry_hash"))
            .transpose()
            .map_err(ReviewError::from)
    }
}
