// fingerprint.rs — Deterministic SHA-256 digests over policy artifacts.
//
// The digest is taken over a canonical byte form (keys sorted at every
// level, no insignificant whitespace) so reformatting a policy file does not
// change its fingerprint, while changing any value does.
//
// A BlockEvent embeds both digests. Recomputing them from the current
// policy files and comparing against a historical event detects drift
// between when the BLOCK happened and when it is audited.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::artifact;
use crate::error::PolicyError;
use crate::rules::NegativeRuleSet;
use crate::table::DecisionTable;

/// Digests of the two policy artifacts in force.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PolicyFingerprint {
    pub decision_table_sha256: String,
    pub negative_rules_sha256: String,
}

impl PolicyFingerprint {
    /// Recompute both digests from loaded artifacts.
    pub fn compute(table: &DecisionTable, rules: &NegativeRuleSet) -> Self {
        Self {
            decision_table_sha256: fingerprint(table.document()),
            negative_rules_sha256: fingerprint(rules.document()),
        }
    }

    /// Recompute both digests straight from files on disk, without
    /// validating them. Used by verifiers auditing historical events.
    pub fn from_files(
        decision_table: impl AsRef<Path>,
        negative_rules: impl AsRef<Path>,
    ) -> Result<Self, PolicyError> {
        let table = artifact::read_value(decision_table.as_ref(), "decision table")?;
        let rules = artifact::read_value(negative_rules.as_ref(), "negative rule set")?;
        Ok(Self {
            decision_table_sha256: fingerprint(&table),
            negative_rules_sha256: fingerprint(&rules),
        })
    }

    /// Whether both digests are 64-char lowercase hex.
    pub fn is_well_formed(&self) -> bool {
        is_sha256_hex(&self.decision_table_sha256) && is_sha256_hex(&self.negative_rules_sha256)
    }
}

/// Hex-encoded SHA-256 of an artifact's canonical bytes.
pub fn fingerprint(artifact: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json_bytes(artifact));
    format!("{:x}", hasher.finalize())
}

/// Canonical serialization: sorted object keys, compact separators, UTF-8.
pub fn canonical_json_bytes(value: &serde_json::Value) -> Vec<u8> {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out.into_bytes()
}

fn write_canonical(value: &serde_json::Value, out: &mut String) {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

pub(crate) fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}
