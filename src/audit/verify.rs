//! Audit Log Verification
//!
//! Checks stored audit rows for hash and chain integrity.

use anyhow::{anyhow, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::audit::entry::{AuditLogEntry, GENESIS_HASH};
use crate::database::models::AuditRecord;
use crate::database::queries::Queries;
use crate::database::Database;

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub entry_count: usize,
    pub head_hash: String,
}

/// Verify the complete chain, oldest first. An empty log is valid.
pub fn verify_audit_chain(records: &[AuditRecord]) -> Result<VerificationReport> {
    let mut expected_previous = GENESIS_HASH.to_string();

    for (i, record) in records.iter().enumerate() {
        let entry = AuditLogEntry::from_record(record);

        if !entry.verify_hash() {
            return Err(anyhow!(
                "Invalid hash in entry {} (sequence {}, id {})",
                i,
                record.sequence,
                record.id
            ));
        }

        if entry.previous_hash != expected_previous {
            return Err(anyhow!(
                "Hash chain broken at entry {}: expected {}, got {}",
                i,
                expected_previous,
                entry.previous_hash
            ));
        }

        debug!("Entry {} ok: {}", i, entry.summary());
        expected_previous = entry.entry_hash;
    }

    info!("Audit log verification successful: {} entries", records.len());
    Ok(VerificationReport {
        entry_count: records.len(),
        head_hash: expected_previous,
    })
}

pub async fn verify_database_audit_log(database: &Database) -> Result<VerificationReport> {
    let records = Queries::list_audit_records(database.pool())
        .await
        .map_err(|e| anyhow!("Failed to load audit log: {}", e))?;
    verify_audit_chain(&records)
}
