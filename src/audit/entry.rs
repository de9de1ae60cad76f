//! Audit Log Entry
//!
//! One row of the legal audit trail, linked to its predecessor by a
//! SHA-256 hash chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::database::format_timestamp;
use crate::database::models::AuditRecord;

pub const ACTION_VOTE_CAST: &str = "VOTE_CAST";

/// `previous_hash` of the first entry in an empty log.
pub const GENESIS_HASH: &str =
    "sha256:0000000000000000000000000000000000000000000000000000000000000000";

/// Origin address recorded when no forwarded-for header is present.
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// What happened, before it is placed in the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub user_id: String,
    pub action: String,
    pub ip_address: String,
    pub resource_id: String,
    pub metadata: serde_json::Value,
}

impl AuditEvent {
    pub fn vote_cast(
        user_id: &str,
        ip_address: &str,
        proposal_id: &str,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            action: ACTION_VOTE_CAST.to_string(),
            ip_address: ip_address.to_string(),
            resource_id: proposal_id.to_string(),
            metadata,
        }
    }
}

/// Audit log entry with cryptographic hash chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub user_id: String,
    pub action: String,
    pub ip_address: String,
    pub resource_id: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub previous_hash: String,
    pub entry_hash: String,
}

impl AuditLogEntry {
    /// Chain `event` after `previous_hash`.
    pub fn new(event: AuditEvent, previous_hash: String) -> Self {
        let mut entry = Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: event.user_id,
            action: event.action,
            ip_address: event.ip_address,
            resource_id: event.resource_id,
            metadata: event.metadata,
            created_at: Utc::now(),
            previous_hash,
            entry_hash: String::new(),
        };

        entry.entry_hash = entry.calculate_hash();
        entry
    }

    /// Rebuild from a stored row, keeping the stored hash for verification.
    pub fn from_record(record: &AuditRecord) -> Self {
        Self {
            id: record.id.clone(),
            user_id: record.user_id.clone(),
            action: record.action.clone(),
            ip_address: record.ip_address.clone(),
            resource_id: record.resource_id.clone(),
            metadata: record.metadata.clone(),
            created_at: record.created_at,
            previous_hash: record.previous_hash.clone(),
            entry_hash: record.entry_hash.clone(),
        }
    }

    /// Create canonical string representation for hashing
    pub fn canonical_string(&self) -> String {
        // serde_json::Value objects are key-sorted, so this is deterministic
        format!(
            "id:{}|user_id:{}|action:{}|ip_address:{}|resource_id:{}|created_at:{}|previous_hash:{}|metadata:{}",
            self.id,
            self.user_id,
            self.action,
            self.ip_address,
            self.resource_id,
            format_timestamp(self.created_at),
            self.previous_hash,
            self.metadata
        )
    }

    pub fn calculate_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_string().as_bytes());
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }

    pub fn verify_hash(&self) -> bool {
        self.entry_hash == self.calculate_hash()
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} by {} from {}",
            self.action, self.resource_id, self.user_id, self.ip_address
        )
    }
}
