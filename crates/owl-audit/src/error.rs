// error.rs — Error types for the audit subsystem.
//
// Audit failures are reportable faults. They never reverse a BLOCK that has
// already been decided at the output boundary.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during audit operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Failed to open or create the audit log file.
    #[error("failed to open audit log at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write an event to the log.
    #[error("failed to append event: {0}")]
    WriteFailed(#[from] std::io::Error),

    /// Failed to serialize or deserialize an event (malformed JSON).
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The audit log has been tampered with — hash chain is broken.
    #[error("integrity check failed at line {line}: expected hash {expected}, got {actual}")]
    IntegrityViolation {
        line: usize,
        expected: String,
        actual: String,
    },

    /// The event does not satisfy the BLOCK event contract.
    #[error("block event {event_id} rejected: {reason}")]
    InvalidEvent { event_id: Uuid, reason: String },

    /// A writer panicked while holding the log; the log state is unknown.
    #[error("audit log lock poisoned")]
    LockPoisoned,
}
