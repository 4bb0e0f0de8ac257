// rules.rs — Negative Rule Set: the charter of conditions that forbid BLOCK.
//
// Each prohibition is either a charter statement (code + description, no
// runtime trigger) or a conditional rule with a `when` clause drawn from a
// closed vocabulary of trigger kinds. An unrecognized trigger kind fails the
// structural contract at load time.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::artifact::{self, PolicyHeader};
use crate::context::{BlockContext, ContextField, OutputKind};
use crate::error::PolicyError;
use crate::state::{Action, GovernanceState};

const ARTIFACT: &str = "negative rule set";

/// The canonical v1 negative rule set shipped with the crate.
pub const CANONICAL_NEGATIVE_RULES: &str = include_str!("../policy/negative_rules.v1.json");

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Hard,
    Soft,
}

/// Runtime-evaluable trigger for a prohibition.
///
/// A trigger *fires* when the context makes BLOCK illegitimate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum Trigger {
    /// Fires when the context state is absent or differs from `expected`.
    StateMismatch { expected: GovernanceState },
    /// Fires when any listed field is absent, blank, or an empty list.
    MissingField { fields: Vec<ContextField> },
    /// Fires when any listed flag is true.
    FlagTrue { flags: Vec<String> },
    /// Fires when the context mode equals `mode`.
    ModeEquals { mode: String },
    /// Fires when the output kind is one of `kinds`.
    OutputKindIn { kinds: Vec<OutputKind> },
    /// Fires when `failed_interventions` is absent or lacks any of `required`.
    FailedInterventionsMissing { required: Vec<Action> },
}

impl Trigger {
    /// Evaluate the trigger. Returns a detail string when it fires.
    pub fn fires(&self, ctx: &BlockContext) -> Option<String> {
        match self {
            Trigger::StateMismatch { expected } => match ctx.state() {
                None => Some("governance state is incomplete".to_string()),
                Some(state) if state != *expected => {
                    Some(format!("state {} is not {}", state, expected))
                }
                Some(_) => None,
            },
            Trigger::MissingField { fields } => {
                let missing: Vec<&str> = fields
                    .iter()
                    .filter(|f| ctx.field(**f).is_none())
                    .map(|f| f.path())
                    .collect();
                if missing.is_empty() {
                    None
                } else {
                    Some(format!("missing or empty: {}", missing.join(", ")))
                }
            }
            Trigger::FlagTrue { flags } => {
                let raised: Vec<&str> = flags
                    .iter()
                    .filter(|f| ctx.flags.get(f.as_str()).copied().unwrap_or(false))
                    .map(String::as_str)
                    .collect();
                if raised.is_empty() {
                    None
                } else {
                    Some(format!("flag(s) raised: {}", raised.join(", ")))
                }
            }
            Trigger::ModeEquals { mode } => match ctx.mode.as_deref() {
                Some(m) if m == mode => Some(format!("mode is {}", mode)),
                _ => None,
            },
            Trigger::OutputKindIn { kinds } => match ctx.output_kind {
                Some(kind) if kinds.contains(&kind) => Some(format!("output kind is {}", kind)),
                _ => None,
            },
            Trigger::FailedInterventionsMissing { required } => {
                match ctx.failed_interventions.as_deref() {
                    None => Some("failed_interventions is missing".to_string()),
                    Some(tried) => {
                        let absent: Vec<String> = required
                            .iter()
                            .filter(|r| !tried.contains(r))
                            .map(|r| r.to_string())
                            .collect();
                        if absent.is_empty() {
                            None
                        } else {
                            Some(format!("not yet tried: {}", absent.join(", ")))
                        }
                    }
                }
            }
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Trigger::MissingField { fields } => fields.is_empty(),
            Trigger::FlagTrue { flags } => flags.is_empty(),
            Trigger::OutputKindIn { kinds } => kinds.is_empty(),
            Trigger::FailedInterventionsMissing { required } => required.is_empty(),
            Trigger::ModeEquals { mode } => mode.trim().is_empty(),
            Trigger::StateMismatch { .. } => false,
        }
    }
}

/// A named prohibition from the negative charter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Prohibition {
    pub code: String,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    pub description: String,
    /// Absent for charter statements that are not runtime-evaluable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Trigger>,
}

fn default_severity() -> Severity {
    Severity::Hard
}

impl Prohibition {
    /// Charter statements document law but never produce a violation.
    pub fn is_charter(&self) -> bool {
        self.when.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesDocument {
    spec: PolicyHeader,
    prohibitions: Vec<Prohibition>,
}

/// A validated, immutable negative rule set.
#[derive(Debug, Clone)]
pub struct NegativeRuleSet {
    header: PolicyHeader,
    prohibitions: Vec<Prohibition>,
    document: serde_json::Value,
}

impl NegativeRuleSet {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let value = artifact::read_value(path.as_ref(), ARTIFACT)?;
        Self::from_value(value)
    }

    pub fn from_json_str(content: &str) -> Result<Self, PolicyError> {
        Self::from_value(artifact::parse_value(content, ARTIFACT)?)
    }

    /// The canonical v1 rule set embedded in the crate.
    pub fn canonical() -> Result<Self, PolicyError> {
        Self::from_json_str(CANONICAL_NEGATIVE_RULES)
    }

    pub fn from_value(document: serde_json::Value) -> Result<Self, PolicyError> {
        let doc: RulesDocument = artifact::typed(&document, ARTIFACT)?;
        doc.spec.check(ARTIFACT)?;

        let mut seen = HashSet::new();
        for p in &doc.prohibitions {
            if p.code.trim().is_empty() {
                return Err(PolicyError::InvalidProhibition {
                    code: p.code.clone(),
                    reason: "code must not be empty".to_string(),
                });
            }
            if !seen.insert(p.code.as_str()) {
                return Err(PolicyError::InvalidProhibition {
                    code: p.code.clone(),
                    reason: "duplicate code".to_string(),
                });
            }
            if p.when.as_ref().is_some_and(Trigger::is_empty) {
                return Err(PolicyError::InvalidProhibition {
                    code: p.code.clone(),
                    reason: "trigger has nothing to evaluate".to_string(),
                });
            }
        }

        Ok(Self {
            header: doc.spec,
            prohibitions: doc.prohibitions,
            document,
        })
    }

    pub fn version(&self) -> &str {
        &self.header.version
    }

    pub fn header(&self) -> &PolicyHeader {
        &self.header
    }

    pub fn prohibitions(&self) -> &[Prohibition] {
        &self.prohibitions
    }

    /// Prohibitions with a runtime trigger.
    pub fn conditional(&self) -> impl Iterator<Item = (&Prohibition, &Trigger)> {
        self.prohibitions
            .iter()
            .filter_map(|p| p.when.as_ref().map(|t| (p, t)))
    }

    pub fn document(&self) -> &serde_json::Value {
        &self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ConstraintStatus, HarmProfile, JudgmentIntegrity};
    use serde_json::json;

    fn doc(prohibitions: serde_json::Value) -> serde_json::Value {
        json!({
            "spec": {"name": "rules", "version": "1", "non_tunable": true},
            "prohibitions": prohibitions
        })
    }

    #[test]
    fn canonical_rules_load() {
        let rules = NegativeRuleSet::canonical().unwrap();
        assert!(rules.prohibitions().iter().any(|p| p.code == "NEG-007"));
        assert!(rules.prohibitions().iter().any(Prohibition::is_charter));
        assert!(rules.conditional().count() >= 5);
    }

    #[test]
    fn unknown_trigger_kind_fails_contract() {
        let value = doc(json!([
            {"code": "X", "description": "d", "when": {"kind": "regex_match", "pattern": ".*"}}
        ]));
        let err = NegativeRuleSet::from_value(value).unwrap_err();
        assert!(matches!(err, PolicyError::Contract { .. }));
    }

    #[test]
    fn unknown_field_path_fails_contract() {
        let value = doc(json!([
            {"code": "X", "description": "d", "when": {"kind": "missing_field", "fields": ["justification.mood"]}}
        ]));
        assert!(NegativeRuleSet::from_value(value).is_err());
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let value = doc(json!([
            {"code": "X", "description": "a"},
            {"code": "X", "description": "b"}
        ]));
        let err = NegativeRuleSet::from_value(value).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidProhibition { .. }));
    }

    #[test]
    fn empty_trigger_is_rejected() {
        let value = doc(json!([
            {"code": "X", "description": "a", "when": {"kind": "flag_true", "flags": []}}
        ]));
        assert!(NegativeRuleSet::from_value(value).is_err());
    }

    #[test]
    fn tunable_rule_set_is_rejected() {
        let mut value = doc(json!([]));
        value["spec"]["non_tunable"] = json!(false);
        assert!(NegativeRuleSet::from_value(value).is_err());
    }

    #[test]
    fn state_mismatch_fires_on_other_or_missing_state() {
        let trigger = Trigger::StateMismatch {
            expected: GovernanceState::MOST_SEVERE,
        };
        assert!(trigger.fires(&BlockContext::default()).is_some());
        let other = BlockContext::default().with_state(GovernanceState::new(
            ConstraintStatus::Hard,
            HarmProfile::Medium,
            JudgmentIntegrity::Compromised,
        ));
        assert!(trigger.fires(&other).is_some());
        let severe = BlockContext::default().with_state(GovernanceState::MOST_SEVERE);
        assert!(trigger.fires(&severe).is_none());
    }

    #[test]
    fn failed_interventions_trigger_requires_superset() {
        let trigger = Trigger::FailedInterventionsMissing {
            required: vec![Action::Reflect, Action::Warn],
        };
        let only_reflect = BlockContext::default().with_failed_interventions(vec![Action::Reflect]);
        assert!(trigger.fires(&only_reflect).is_some());
        let both = BlockContext::default().with_failed_interventions(vec![
            Action::Slow,
            Action::Warn,
            Action::Reflect,
        ]);
        assert!(trigger.fires(&both).is_none());
    }

    #[test]
    fn flag_trigger_ignores_false_and_absent_flags() {
        let trigger = Trigger::FlagTrue {
            flags: vec!["moral_disagreement".to_string()],
        };
        assert!(trigger.fires(&BlockContext::default()).is_none());
        let off = BlockContext::default().with_flag("moral_disagreement", false);
        assert!(trigger.fires(&off).is_none());
        let on = BlockContext::default().with_flag("moral_disagreement", true);
        assert!(trigger.fires(&on).is_some());
    }

    #[test]
    fn output_kind_trigger() {
        let trigger = Trigger::OutputKindIn {
            kinds: vec![OutputKind::Questions, OutputKind::Analysis],
        };
        let analysis = BlockContext::default().with_output_kind(OutputKind::Analysis);
        assert!(trigger.fires(&analysis).is_some());
        let action = BlockContext::default().with_output_kind(OutputKind::Action);
        assert!(trigger.fires(&action).is_none());
    }
}
