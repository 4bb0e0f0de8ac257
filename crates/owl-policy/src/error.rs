// error.rs — Error types for the policy subsystem.
//
// Every variant is a policy integrity error: the artifact on disk (or the
// embedded copy) cannot be treated as law. None of these are recovered from
// at runtime; the caller must refuse to serve decisions.

use std::path::PathBuf;

use thiserror::Error;

use crate::state::GovernanceState;

/// Errors raised while loading or validating policy artifacts.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The artifact file could not be read.
    #[error("failed to read policy artifact at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The artifact is not valid JSON, or does not match its structural contract
    /// (unknown fields, wrong types, values outside the closed enums).
    #[error("{artifact} does not match its structural contract: {source}")]
    Contract {
        artifact: &'static str,
        source: serde_json::Error,
    },

    /// The spec header is present but unacceptable.
    #[error("{artifact} header rejected: {reason}")]
    Header {
        artifact: &'static str,
        reason: String,
    },

    /// The decision table does not have exactly 27 rows.
    #[error("decision table must have exactly 27 rows; got {count}")]
    RowCount { count: usize },

    /// Two rows share the same state key.
    #[error("duplicate decision table row for {state}")]
    DuplicateKey { state: GovernanceState },

    /// Some states in the cross product have no row.
    #[error("decision table is missing rows for: {}", format_states(.states))]
    MissingKeys { states: Vec<GovernanceState> },

    /// The table does not contain exactly one BLOCK row.
    #[error("decision table must contain exactly one BLOCK row; got {count}")]
    BlockRowCount { count: usize },

    /// The single BLOCK row is keyed on a state other than the most severe one.
    #[error("BLOCK row must be {expected}; got {actual}")]
    BlockRowMisplaced {
        expected: GovernanceState,
        actual: GovernanceState,
    },

    /// A prohibition entry is malformed (empty or duplicate code, empty trigger).
    #[error("invalid prohibition '{code}': {reason}")]
    InvalidProhibition { code: String, reason: String },
}

fn format_states(states: &[GovernanceState]) -> String {
    states
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
