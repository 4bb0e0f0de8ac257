// store.rs — PolicyStore: the loaded, validated policy in force.
//
// Constructed once at startup. Construction performs every validation step
// for both artifacts and computes their fingerprints; if anything fails, no
// store exists and the caller must not serve decisions. After construction
// the store is immutable and meant to be shared behind an `Arc`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::context::BlockContext;
use crate::error::PolicyError;
use crate::fingerprint::PolicyFingerprint;
use crate::rules::NegativeRuleSet;
use crate::state::{Action, GovernanceState};
use crate::table::DecisionTable;
use crate::veto::{ProhibitionEngine, Violation};

/// Where to load the two policy artifacts from.
///
/// `None` selects the canonical copy embedded in this crate.
#[derive(Debug, Clone, Default)]
pub struct PolicyPaths {
    pub decision_table: Option<PathBuf>,
    pub negative_rules: Option<PathBuf>,
}

/// The complete policy in force for the process lifetime.
#[derive(Debug)]
pub struct PolicyStore {
    table: Arc<DecisionTable>,
    prohibitions: ProhibitionEngine,
    fingerprint: PolicyFingerprint,
}

impl PolicyStore {
    /// Build a store from already-validated artifacts.
    pub fn new(table: DecisionTable, rules: NegativeRuleSet) -> Self {
        let fingerprint = PolicyFingerprint::compute(&table, &rules);
        tracing::info!(
            table_version = %table.version(),
            rules_version = %rules.version(),
            decision_table_sha256 = %fingerprint.decision_table_sha256,
            negative_rules_sha256 = %fingerprint.negative_rules_sha256,
            "policy loaded"
        );
        Self {
            table: Arc::new(table),
            prohibitions: ProhibitionEngine::new(Arc::new(rules)),
            fingerprint,
        }
    }

    /// Load both artifacts, falling back to the embedded canonical copies.
    pub fn load(paths: &PolicyPaths) -> Result<Self, PolicyError> {
        let table = match &paths.decision_table {
            Some(path) => DecisionTable::load(path)?,
            None => DecisionTable::canonical()?,
        };
        let rules = match &paths.negative_rules {
            Some(path) => NegativeRuleSet::load(path)?,
            None => NegativeRuleSet::canonical()?,
        };
        Ok(Self::new(table, rules))
    }

    /// Load both artifacts from explicit files.
    pub fn from_files(
        decision_table: impl AsRef<Path>,
        negative_rules: impl AsRef<Path>,
    ) -> Result<Self, PolicyError> {
        Ok(Self::new(
            DecisionTable::load(decision_table)?,
            NegativeRuleSet::load(negative_rules)?,
        ))
    }

    /// The embedded canonical v1 policy.
    pub fn canonical() -> Result<Self, PolicyError> {
        Self::load(&PolicyPaths::default())
    }

    pub fn decide(&self, state: GovernanceState) -> Action {
        self.table.decide(state)
    }

    pub fn check_prohibitions(&self, ctx: &BlockContext) -> Vec<Violation> {
        self.prohibitions.check(ctx)
    }

    pub fn table(&self) -> &DecisionTable {
        &self.table
    }

    pub fn rules(&self) -> &NegativeRuleSet {
        self.prohibitions.rules()
    }

    /// Fingerprint of the artifacts this store was built from.
    pub fn fingerprint(&self) -> &PolicyFingerprint {
        &self.fingerprint
    }
}
