// table.rs — Decision Table Engine.
//
// Maps every GovernanceState to exactly one Action. The table is validated
// once, at construction, and is read-only afterwards:
//
// 1. Structural contract (strict deserialization + header check)
// 2. Exactly 27 rows
// 3. No duplicate state keys
// 4. No missing state keys
// 5. Exactly one BLOCK row
// 6. The BLOCK row is (HARD, HIGH, COMPROMISED)
//
// Any failure aborts construction. There is no partially-valid table and no
// default action: `decide` is total because construction proved it is.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::artifact::{self, PolicyHeader};
use crate::error::PolicyError;
use crate::state::{Action, ConstraintStatus, GovernanceState, HarmProfile, JudgmentIntegrity};

const ARTIFACT: &str = "decision table";

const STATE_COUNT: usize = 27;

/// The canonical v1 decision table shipped with the crate.
pub const CANONICAL_DECISION_TABLE: &str = include_str!("../policy/decision_table.v1.json");

/// One row of the decision table document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TableRow {
    pub constraint_status: ConstraintStatus,
    pub harm_profile: HarmProfile,
    pub judgment_integrity: JudgmentIntegrity,
    pub action: Action,
}

impl TableRow {
    pub fn state(&self) -> GovernanceState {
        GovernanceState::new(
            self.constraint_status,
            self.harm_profile,
            self.judgment_integrity,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableDocument {
    spec: PolicyHeader,
    rows: Vec<TableRow>,
}

/// The decision plus the policy version that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatingDecision {
    pub state: GovernanceState,
    pub action: Action,
    pub policy_version: String,
}

/// A validated, immutable decision table.
///
/// There is no mutation API. Share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct DecisionTable {
    header: PolicyHeader,
    rows: Vec<TableRow>,
    actions: [Action; STATE_COUNT],
    document: serde_json::Value,
}

impl DecisionTable {
    /// Load and validate a decision table from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let value = artifact::read_value(path.as_ref(), ARTIFACT)?;
        Self::from_value(value)
    }

    /// Parse and validate a decision table from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self, PolicyError> {
        Self::from_value(artifact::parse_value(content, ARTIFACT)?)
    }

    /// The canonical v1 table embedded in the crate.
    pub fn canonical() -> Result<Self, PolicyError> {
        Self::from_json_str(CANONICAL_DECISION_TABLE)
    }

    /// Validate a raw JSON document and build the table.
    pub fn from_value(document: serde_json::Value) -> Result<Self, PolicyError> {
        let doc: TableDocument = artifact::typed(&document, ARTIFACT)?;
        doc.spec.check(ARTIFACT)?;

        if doc.rows.len() != STATE_COUNT {
            return Err(PolicyError::RowCount {
                count: doc.rows.len(),
            });
        }

        let mut slots: [Option<Action>; STATE_COUNT] = [None; STATE_COUNT];
        for row in &doc.rows {
            let state = row.state();
            let slot = &mut slots[ordinal(&state)];
            if slot.is_some() {
                return Err(PolicyError::DuplicateKey { state });
            }
            *slot = Some(row.action);
        }

        let mut actions = [Action::Advisory; STATE_COUNT];
        let mut missing = Vec::new();
        for state in GovernanceState::all() {
            match slots[ordinal(&state)] {
                Some(action) => actions[ordinal(&state)] = action,
                None => missing.push(state),
            }
        }
        if !missing.is_empty() {
            return Err(PolicyError::MissingKeys { states: missing });
        }

        let block_rows: Vec<&TableRow> = doc
            .rows
            .iter()
            .filter(|r| r.action == Action::Block)
            .collect();
        if block_rows.len() != 1 {
            return Err(PolicyError::BlockRowCount {
                count: block_rows.len(),
            });
        }
        let block_state = block_rows[0].state();
        if block_state != GovernanceState::MOST_SEVERE {
            return Err(PolicyError::BlockRowMisplaced {
                expected: GovernanceState::MOST_SEVERE,
                actual: block_state,
            });
        }

        Ok(Self {
            header: doc.spec,
            rows: doc.rows,
            actions,
            document,
        })
    }

    /// Map a state to its action. Total over the 27-state space.
    pub fn decide(&self, state: GovernanceState) -> Action {
        self.actions[ordinal(&state)]
    }

    /// Same as `decide`, tagged with the policy version for audit trails.
    pub fn gating_decision(&self, state: GovernanceState) -> GatingDecision {
        GatingDecision {
            state,
            action: self.decide(state),
            policy_version: self.header.version.clone(),
        }
    }

    pub fn version(&self) -> &str {
        &self.header.version
    }

    pub fn header(&self) -> &PolicyHeader {
        &self.header
    }

    /// Rows in document order.
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// The raw document this table was built from (input to fingerprinting).
    pub fn document(&self) -> &serde_json::Value {
        &self.document
    }
}

/// Position of a state in axis order: constraint x 9 + harm x 3 + integrity.
fn ordinal(state: &GovernanceState) -> usize {
    let cs = match state.constraint_status {
        ConstraintStatus::None => 0,
        ConstraintStatus::Soft => 1,
        ConstraintStatus::Hard => 2,
    };
    let hp = match state.harm_profile {
        HarmProfile::Low => 0,
        HarmProfile::Medium => 1,
        HarmProfile::High => 2,
    };
    let ji = match state.judgment_integrity {
        JudgmentIntegrity::Intact => 0,
        JudgmentIntegrity::Degraded => 1,
        JudgmentIntegrity::Compromised => 2,
    };
    cs * 9 + hp * 3 + ji
}
