// config.rs — Gate configuration.
//
// GateConfig only says where things live: the two policy artifacts and the
// two append-only logs. It carries no thresholds. The `for_project()`
// constructor lays everything out under a `.owl/` directory in the project
// root; `load()` overlays `.owl/gate.toml` when present.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use owl_audit::SharedAuditLog;
use owl_policy::{PolicyPaths, PolicyStore};
use serde::{Deserialize, Serialize};

use crate::error::GateError;
use crate::gate::OutputGate;

pub const CONFIG_DIR: &str = ".owl";
pub const CONFIG_FILE: &str = "gate.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateConfig {
    /// Decision table override. `None` uses the embedded canonical table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_table: Option<PathBuf>,

    /// Negative rule set override. `None` uses the embedded canonical rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_rules: Option<PathBuf>,

    /// Append-only BLOCK event log.
    pub audit_log: PathBuf,

    /// Append-only log of landed interaction records.
    pub interaction_log: PathBuf,
}

/// On-disk shape of `gate.toml`. Every key optional, nothing else allowed.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GateConfigFile {
    decision_table: Option<PathBuf>,
    negative_rules: Option<PathBuf>,
    audit_log: Option<PathBuf>,
    interaction_log: Option<PathBuf>,
}

impl GateConfig {
    /// Create a config with the standard `.owl/` layout for a project.
    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        let owl_dir = project_root.as_ref().join(CONFIG_DIR);
        Self {
            decision_table: None,
            negative_rules: None,
            audit_log: owl_dir.join("block_events.jsonl"),
            interaction_log: owl_dir.join("interactions.jsonl"),
        }
    }

    /// Load `<root>/.owl/gate.toml`, falling back to `for_project` defaults
    /// for anything it leaves out. Relative paths resolve against `root`.
    pub fn load(project_root: impl AsRef<Path>) -> Result<Self, GateError> {
        let root = project_root.as_ref();
        let path = root.join(CONFIG_DIR).join(CONFIG_FILE);
        let defaults = Self::for_project(root);
        if !path.exists() {
            return Ok(defaults);
        }

        let content = std::fs::read_to_string(&path).map_err(|source| GateError::ConfigRead {
            path: path.clone(),
            source,
        })?;
        let file: GateConfigFile =
            toml::from_str(&content).map_err(|source| GateError::ConfigInvalid {
                path: path.clone(),
                source,
            })?;

        let resolve = |p: PathBuf| if p.is_absolute() { p } else { root.join(p) };
        let config = Self {
            decision_table: file.decision_table.map(resolve),
            negative_rules: file.negative_rules.map(resolve),
            audit_log: file.audit_log.map(resolve).unwrap_or(defaults.audit_log),
            interaction_log: file
                .interaction_log
                .map(resolve)
                .unwrap_or(defaults.interaction_log),
        };
        tracing::debug!(path = %path.display(), "gate config loaded");
        Ok(config)
    }

    pub fn policy_paths(&self) -> PolicyPaths {
        PolicyPaths {
            decision_table: self.decision_table.clone(),
            negative_rules: self.negative_rules.clone(),
        }
    }

    /// Load the policy and open the audit log. Any policy failure is fatal:
    /// no gate is produced.
    pub fn open_gate(&self) -> Result<OutputGate, GateError> {
        let policy = PolicyStore::load(&self.policy_paths())?;
        let audit = SharedAuditLog::open(&self.audit_log)?;
        Ok(OutputGate::new(Arc::new(policy), Arc::new(audit)))
    }
}
