//! Legal Audit Log
//!
//! Append-only, hash-chained record of vote activity. Writes are
//! best-effort: the vote record is authoritative, the audit trail advisory.

pub mod entry;
pub mod logger;
pub mod verify;

pub use entry::{AuditEvent, AuditLogEntry, ACTION_VOTE_CAST, GENESIS_HASH, UNKNOWN_ADDRESS};
pub use logger::{AuditLogger, AuditSink, TracingAuditSink};
pub use verify::{verify_audit_chain, verify_database_audit_log, VerificationReport};
