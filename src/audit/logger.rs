//! Audit Logger
//!
//! Appends hash-chained entries to `legal_audit_log`.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::audit::entry::{AuditEvent, AuditLogEntry, GENESIS_HASH};
use crate::database::models::AuditRecord;
use crate::database::queries::Queries;
use crate::database::Database;
use crate::error::Result;

/// Destination for audit events.
///
/// Callers treat failures as advisory; see the vote gateway.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent) -> Result<()>;
}

/// Database-backed audit logger
#[derive(Clone)]
pub struct AuditLogger {
    database: Database,
    head_hash: Arc<Mutex<String>>,
}

impl AuditLogger {
    /// Resume the chain from the last stored entry.
    pub async fn new(database: Database) -> Result<Self> {
        let head = Queries::last_audit_hash(database.pool())
            .await?
            .unwrap_or_else(|| GENESIS_HASH.to_string());

        info!("Audit logger resuming chain at {}", head);

        Ok(Self {
            database,
            head_hash: Arc::new(Mutex::new(head)),
        })
    }

    /// Chain and persist one entry. The head lock is held across the insert
    /// so concurrent appends stay linear; a failed insert leaves the head
    /// where it was.
    pub async fn append(&self, event: AuditEvent) -> Result<AuditRecord> {
        let mut head = self.head_hash.lock().await;

        let entry = AuditLogEntry::new(event, head.clone());
        let record = self.database.insert_audit_record(&entry).await?;
        *head = record.entry_hash.clone();

        debug!("Appended audit entry: {}", entry.summary());
        Ok(record)
    }

    pub async fn get_head_hash(&self) -> String {
        self.head_hash.lock().await.clone()
    }
}

#[async_trait]
impl AuditSink for AuditLogger {
    async fn record(&self, event: AuditEvent) -> Result<()> {
        self.append(event).await.map(|_| ())
    }
}

/// Used when `audit.enabled = false`: events only reach the operational log.
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<()> {
        info!(
            "Audit (not persisted): {} {} by {} from {}",
            event.action, event.resource_id, event.user_id, event.ip_address
        );
        Ok(())
    }
}
