// error.rs — Error types for the gate crate.

use std::path::PathBuf;

use thiserror::Error;

/// A closing judgment that cannot terminate an interaction.
///
/// Always recoverable: supply a valid, user-owned, acknowledged judgment and
/// retry.
#[derive(Debug, Error, PartialEq)]
pub enum LandingError {
    #[error("missing judgment terminal state; cannot terminate interaction")]
    Missing,

    #[error("judgment must be user-owned (owner = \"user\"), got owner = {owner:?}")]
    NotUserOwned { owner: String },

    #[error("judgment must be explicitly acknowledged")]
    NotAcknowledged,

    #[error("invalid judgment type: {0:?} (expected position, constraint, next_step or defer)")]
    InvalidType(String),

    #[error("judgment statement has {chars} characters; expected between {min} and {max}")]
    StatementLength { chars: usize, min: usize, max: usize },

    #[error("confidence {value} is outside [0, 1]")]
    ConfidenceOutOfRange { value: f64 },
}

/// Errors that can occur while configuring or running the gate.
#[derive(Debug, Error)]
pub enum GateError {
    /// The policy failed to load or validate. Fatal at startup.
    #[error("policy error: {0}")]
    Policy(#[from] owl_policy::PolicyError),

    /// The audit log could not be opened or written.
    #[error("audit error: {0}")]
    Audit(#[from] owl_audit::AuditError),

    /// Persistence was refused by the termination invariant.
    #[error("judgment landing rejected: {0}")]
    Landing(#[from] LandingError),

    #[error("failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config at {path}: {source}")]
    ConfigInvalid {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("interaction record rejected: {0}")]
    InvalidRecord(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
