// artifact.rs — Shared plumbing for the two versioned policy documents.
//
// Both the decision table and the negative rule set are JSON documents with
// a `spec` header. Loading keeps the raw `serde_json::Value` alongside the
// typed form: the typed form drives evaluation, the raw form is what gets
// fingerprinted.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// The `spec` header every policy artifact carries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PolicyHeader {
    /// Artifact name (e.g. "action_gating_table").
    pub name: String,
    /// Version string; bumped whenever the law changes.
    pub version: String,
    /// Must be `true`. Policy artifacts are law, not tuning surfaces.
    pub non_tunable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PolicyHeader {
    pub(crate) fn check(&self, artifact: &'static str) -> Result<(), PolicyError> {
        if !self.non_tunable {
            return Err(PolicyError::Header {
                artifact,
                reason: "non_tunable must be true".to_string(),
            });
        }
        if self.version.trim().is_empty() {
            return Err(PolicyError::Header {
                artifact,
                reason: "version must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Read an artifact file into a raw JSON value.
pub(crate) fn read_value(path: &Path, artifact: &'static str) -> Result<serde_json::Value, PolicyError> {
    let content = std::fs::read_to_string(path).map_err(|source| PolicyError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    parse_value(&content, artifact)
}

pub(crate) fn parse_value(content: &str, artifact: &'static str) -> Result<serde_json::Value, PolicyError> {
    serde_json::from_str(content).map_err(|source| PolicyError::Contract { artifact, source })
}

/// Deserialize the typed document from the raw value. Unknown fields and
/// out-of-vocabulary enum values fail here.
pub(crate) fn typed<T: DeserializeOwned>(
    value: &serde_json::Value,
    artifact: &'static str,
) -> Result<T, PolicyError> {
    T::deserialize(value).map_err(|source| PolicyError::Contract { artifact, source })
}
