//! # owl-audit
//!
//! Append-only BLOCK event log for the Owlume governance gate.
//!
//! Every confirmed BLOCK is recorded as a [`BlockEvent`] in a JSONL file.
//! Events are hash-chained: each line carries the SHA-256 of the line before
//! it, so edits and deletions are detectable with [`AuditLog::verify_chain`].
//! Each event is also bound to the [`owl_policy::PolicyFingerprint`] in force
//! when it fired, which [`detect_policy_drift`] compares against the current
//! policy.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use owl_audit::{AuditLog, AuditSink, SharedAuditLog};
//!
//! let sink = SharedAuditLog::open(".owl/block_events.jsonl").unwrap();
//! // sink.append(&mut event)?;
//! let checked = AuditLog::verify_chain(".owl/block_events.jsonl").unwrap();
//! println!("{} events verified", checked);
//! ```

pub mod drift;
pub mod error;
pub mod event;
pub mod hasher;
pub mod log;
pub mod sink;

pub use drift::{detect_policy_drift, DriftFinding, DriftReport, DriftSeverity, DriftSignal};
pub use error::AuditError;
pub use event::{
    BlockEvent, BlockEventType, BlockJustification, BlockSubject, PolicyBinding, UnblockPlan,
};
pub use log::AuditLog;
pub use sink::{AuditSink, MemoryAuditSink, SharedAuditLog};
