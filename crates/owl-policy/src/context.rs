// context.rs — The record the prohibition engine evaluates.
//
// Every field is optional on purpose: the context arrives from external
// collaborators and may be incomplete or malformed. Neither is an error
// here. Deserialization never fails: a value of the wrong shape is dropped
// and its path recorded in `malformed`, and the veto engine turns both
// absence and malformation into violations.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::{Action, ConstraintStatus, GovernanceState, HarmProfile, JudgmentIntegrity};

/// Kind of output a surface is attempting to deliver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputKind {
    Action,
    Advice,
    Instructions,
    Questions,
    Reframe,
    Analysis,
    /// Anything outside the known vocabulary. Never treated as action-like.
    #[serde(other)]
    Other,
}

impl OutputKind {
    /// Only action-guiding output is eligible for gating.
    pub fn is_action_like(self) -> bool {
        matches!(
            self,
            OutputKind::Action | OutputKind::Advice | OutputKind::Instructions
        )
    }
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputKind::Action => "ACTION",
            OutputKind::Advice => "ADVICE",
            OutputKind::Instructions => "INSTRUCTIONS",
            OutputKind::Questions => "QUESTIONS",
            OutputKind::Reframe => "REFRAME",
            OutputKind::Analysis => "ANALYSIS",
            OutputKind::Other => "OTHER",
        };
        write!(f, "{}", s)
    }
}

/// Why BLOCK is being proposed, in the reviewer's own words.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Justification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_block_is_necessary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_lower_measures_failed: Option<String>,
}

/// What has to happen before a BLOCK can be lifted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnblockConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_actions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reassessment_triggers: Option<Vec<String>>,
}

/// Everything needed to certify (or refuse) the legitimacy of a BLOCK.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "serde_json::Value")]
pub struct BlockContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_status: Option<ConstraintStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harm_profile: Option<HarmProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judgment_integrity: Option<JudgmentIntegrity>,

    /// Interventions already attempted without effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_interventions: Option<Vec<Action>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<Justification>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unblock_conditions: Option<UnblockConditions>,

    /// Named boolean flags (e.g. "moral_disagreement").
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,

    /// Interaction mode (e.g. "EXECUTION", "ANALYSIS_ONLY").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// The output kind being gated. Filled in by the gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_kind: Option<OutputKind>,

    /// Any other keys supplied by the caller. Kept so tuning knobs smuggled
    /// into the context can be detected.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,

    /// Dotted paths of supplied values that had the wrong shape.
    #[serde(skip)]
    pub malformed: Vec<String>,
}

impl From<Value> for BlockContext {
    fn from(value: Value) -> Self {
        let mut ctx = BlockContext::default();
        let map = match value {
            Value::Object(map) => map,
            Value::Null => return ctx,
            _ => {
                ctx.malformed.push("governance".to_string());
                return ctx;
            }
        };

        for (key, value) in map {
            match key.as_str() {
                "constraint_status" => ctx.constraint_status = ctx.lenient(&key, value),
                "harm_profile" => ctx.harm_profile = ctx.lenient(&key, value),
                "judgment_integrity" => ctx.judgment_integrity = ctx.lenient(&key, value),
                "failed_interventions" => ctx.failed_interventions = ctx.parse_interventions(value),
                "justification" => ctx.justification = ctx.parse_justification(value),
                "unblock_conditions" => ctx.unblock_conditions = ctx.parse_unblock_conditions(value),
                "flags" => ctx.flags = ctx.parse_flags(value),
                "mode" => ctx.mode = ctx.lenient(&key, value),
                "output_kind" => ctx.output_kind = ctx.lenient(&key, value),
                _ => {
                    ctx.extra.insert(key, value);
                }
            }
        }
        ctx
    }
}

impl BlockContext {
    /// The governance state, if all three axes are present.
    pub fn state(&self) -> Option<GovernanceState> {
        Some(GovernanceState::new(
            self.constraint_status?,
            self.harm_profile?,
            self.judgment_integrity?,
        ))
    }

    pub fn with_state(mut self, state: GovernanceState) -> Self {
        self.constraint_status = Some(state.constraint_status);
        self.harm_profile = Some(state.harm_profile);
        self.judgment_integrity = Some(state.judgment_integrity);
        self
    }

    pub fn with_failed_interventions(mut self, interventions: Vec<Action>) -> Self {
        self.failed_interventions = Some(interventions);
        self
    }

    pub fn with_justification(
        mut self,
        why_block_is_necessary: impl Into<String>,
        why_lower_measures_failed: impl Into<String>,
    ) -> Self {
        self.justification = Some(Justification {
            why_block_is_necessary: Some(why_block_is_necessary.into()),
            why_lower_measures_failed: Some(why_lower_measures_failed.into()),
        });
        self
    }

    pub fn with_unblock_conditions(
        mut self,
        required_actions: Vec<String>,
        reassessment_triggers: Vec<String>,
    ) -> Self {
        self.unblock_conditions = Some(UnblockConditions {
            required_actions: Some(required_actions),
            reassessment_triggers: Some(reassessment_triggers),
        });
        self
    }

    pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.flags.insert(name.into(), value);
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_output_kind(mut self, kind: OutputKind) -> Self {
        self.output_kind = Some(kind);
        self
    }

    /// Parse one value; null is absent, anything unparseable is recorded.
    fn lenient<T: DeserializeOwned>(&mut self, path: &str, value: Value) -> Option<T> {
        match serde_json::from_value::<Option<T>>(value) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(path, error = %e, "malformed context value dropped");
                self.malformed.push(path.to_string());
                None
            }
        }
    }

    /// Keeps the recognised interventions; a non-list is dropped entirely.
    fn parse_interventions(&mut self, value: Value) -> Option<Vec<Action>> {
        let items = match value {
            Value::Null => return None,
            Value::Array(items) => items,
            _ => {
                self.malformed.push(ContextField::FailedInterventions.path().to_string());
                return None;
            }
        };
        let total = items.len();
        let actions: Vec<Action> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();
        if actions.len() != total {
            self.malformed.push(ContextField::FailedInterventions.path().to_string());
        }
        Some(actions)
    }

    fn parse_justification(&mut self, value: Value) -> Option<Justification> {
        let mut map = self.parse_object("justification", value)?;
        Some(Justification {
            why_block_is_necessary: self.lenient(
                ContextField::WhyBlockIsNecessary.path(),
                map.remove("why_block_is_necessary").unwrap_or(Value::Null),
            ),
            why_lower_measures_failed: self.lenient(
                ContextField::WhyLowerMeasuresFailed.path(),
                map.remove("why_lower_measures_failed").unwrap_or(Value::Null),
            ),
        })
    }

    fn parse_unblock_conditions(&mut self, value: Value) -> Option<UnblockConditions> {
        let mut map = self.parse_object("unblock_conditions", value)?;
        Some(UnblockConditions {
            required_actions: self.lenient(
                ContextField::RequiredActions.path(),
                map.remove("required_actions").unwrap_or(Value::Null),
            ),
            reassessment_triggers: self.lenient(
                ContextField::ReassessmentTriggers.path(),
                map.remove("reassessment_triggers").unwrap_or(Value::Null),
            ),
        })
    }

    fn parse_flags(&mut self, value: Value) -> BTreeMap<String, bool> {
        let Some(map) = self.parse_object("flags", value) else {
            return BTreeMap::new();
        };
        let mut flags = BTreeMap::new();
        for (name, value) in map {
            match value {
                Value::Bool(set) => {
                    flags.insert(name, set);
                }
                _ => self.malformed.push(format!("flags.{}", name)),
            }
        }
        flags
    }

    fn parse_object(&mut self, path: &str, value: Value) -> Option<serde_json::Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            Value::Null => None,
            _ => {
                self.malformed.push(path.to_string());
                None
            }
        }
    }

    /// Look up a required field; `None` when it is absent or blank.
    pub fn field(&self, field: ContextField) -> Option<FieldValue<'_>> {
        let present = match field {
            ContextField::ConstraintStatus => self.constraint_status.map(|_| FieldValue::Axis),
            ContextField::HarmProfile => self.harm_profile.map(|_| FieldValue::Axis),
            ContextField::JudgmentIntegrity => self.judgment_integrity.map(|_| FieldValue::Axis),
            ContextField::FailedInterventions => self
                .failed_interventions
                .as_deref()
                .map(FieldValue::Interventions),
            ContextField::WhyBlockIsNecessary => self
                .justification
                .as_ref()
                .and_then(|j| j.why_block_is_necessary.as_deref())
                .map(FieldValue::Text),
            ContextField::WhyLowerMeasuresFailed => self
                .justification
                .as_ref()
                .and_then(|j| j.why_lower_measures_failed.as_deref())
                .map(FieldValue::Text),
            ContextField::RequiredActions => self
                .unblock_conditions
                .as_ref()
                .and_then(|u| u.required_actions.as_deref())
                .map(FieldValue::List),
            ContextField::ReassessmentTriggers => self
                .unblock_conditions
                .as_ref()
                .and_then(|u| u.reassessment_triggers.as_deref())
                .map(FieldValue::List),
        };
        present.filter(|v| !v.is_blank())
    }
}

/// Fields a `missing_field` trigger may name. Serialized as dotted paths.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ContextField {
    #[serde(rename = "constraint_status")]
    ConstraintStatus,
    #[serde(rename = "harm_profile")]
    HarmProfile,
    #[serde(rename = "judgment_integrity")]
    JudgmentIntegrity,
    #[serde(rename = "failed_interventions")]
    FailedInterventions,
    #[serde(rename = "justification.why_block_is_necessary")]
    WhyBlockIsNecessary,
    #[serde(rename = "justification.why_lower_measures_failed")]
    WhyLowerMeasuresFailed,
    #[serde(rename = "unblock_conditions.required_actions")]
    RequiredActions,
    #[serde(rename = "unblock_conditions.reassessment_triggers")]
    ReassessmentTriggers,
}

impl ContextField {
    /// Justification and unblock fields every legitimate BLOCK needs.
    pub const REQUIRED_NARRATIVE: [ContextField; 4] = [
        ContextField::WhyBlockIsNecessary,
        ContextField::WhyLowerMeasuresFailed,
        ContextField::RequiredActions,
        ContextField::ReassessmentTriggers,
    ];

    pub fn path(self) -> &'static str {
        match self {
            ContextField::ConstraintStatus => "constraint_status",
            ContextField::HarmProfile => "harm_profile",
            ContextField::JudgmentIntegrity => "judgment_integrity",
            ContextField::FailedInterventions => "failed_interventions",
            ContextField::WhyBlockIsNecessary => "justification.why_block_is_necessary",
            ContextField::WhyLowerMeasuresFailed => "justification.why_lower_measures_failed",
            ContextField::RequiredActions => "unblock_conditions.required_actions",
            ContextField::ReassessmentTriggers => "unblock_conditions.reassessment_triggers",
        }
    }
}

/// Borrowed view of a context field's value.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Axis,
    Interventions(&'a [Action]),
    Text(&'a str),
    List(&'a [String]),
}

impl FieldValue<'_> {
    fn is_blank(&self) -> bool {
        match self {
            FieldValue::Axis | FieldValue::Interventions(_) => false,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => {
                items.is_empty() || items.iter().any(|i| i.trim().is_empty())
            }
        }
    }
}
