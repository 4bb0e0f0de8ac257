//! # owl-policy
//!
//! Policy layer of the Owlume governance gate.
//!
//! Two canonical, versioned artifacts are loaded once and treated as law:
//! the [`DecisionTable`] (27 governance states → one of six escalating
//! actions) and the [`NegativeRuleSet`] (conditions that forbid BLOCK).
//! A [`PolicyStore`] bundles both with their [`PolicyFingerprint`].
//!
//! ## Key invariants
//!
//! - **Total table**: every one of the 27 states maps to exactly one action.
//! - **Single BLOCK**: exactly one row maps to BLOCK, keyed on
//!   `(HARD, HIGH, COMPROMISED)`.
//! - **Fail closed**: any integrity violation aborts loading; missing context
//!   at decision time is a prohibition violation, never a permissive default.
//! - **Immutable**: no API mutates a loaded table, rule set or store.

pub mod artifact;
pub mod context;
pub mod error;
pub mod fingerprint;
pub mod rules;
pub mod signals;
pub mod state;
pub mod store;
pub mod table;
pub mod veto;

pub use artifact::PolicyHeader;
pub use context::{BlockContext, ContextField, Justification, OutputKind, UnblockConditions};
pub use error::PolicyError;
pub use fingerprint::{canonical_json_bytes, fingerprint, PolicyFingerprint};
pub use rules::{NegativeRuleSet, Prohibition, Severity, Trigger};
pub use signals::GovernanceSignals;
pub use state::{Action, ConstraintStatus, GovernanceState, HarmProfile, JudgmentIntegrity};
pub use store::{PolicyPaths, PolicyStore};
pub use table::{DecisionTable, GatingDecision, TableRow};
pub use veto::{ProhibitionEngine, Violation, MALFORMED_CONTEXT};
