// event.rs — BLOCK event data model.
//
// A BlockEvent is written exactly once, by the output boundary gate, when a
// BLOCK is confirmed by all three layers. It is never mutated or deleted
// after append. `validate()` is the record's structural contract and is
// enforced by the log before anything touches disk.

use chrono::{DateTime, Utc};
use owl_policy::{Action, GovernanceSignals, GovernanceState, OutputKind, PolicyFingerprint};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuditError;

/// The only event type this log carries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockEventType {
    BlockTriggered,
}

/// Free-text reasons recorded with the BLOCK.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BlockJustification {
    pub why_block_is_necessary: String,
    pub why_lower_measures_failed: String,
}

/// What lifts the BLOCK.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct UnblockPlan {
    pub required_actions: Vec<String>,
    pub reassessment_triggers: Vec<String>,
}

/// The policy in force when the BLOCK fired.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PolicyBinding {
    pub decision_table_version: String,
    pub negative_rules_version: String,
    pub fingerprint: PolicyFingerprint,
}

/// Who and what the BLOCK applied to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BlockSubject {
    pub interaction_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub principle: Option<String>,
    #[serde(default)]
    pub trace_ref: Option<String>,
}

/// A single BLOCK audit record — one line in the JSONL block log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BlockEvent {
    pub event_id: Uuid,
    pub event_type: BlockEventType,
    pub timestamp: DateTime<Utc>,
    pub subject: BlockSubject,
    pub output_kind_attempted: OutputKind,
    pub governance_state: GovernanceState,
    pub reason_code: String,
    /// The four output-level signals as they stood at trigger time.
    pub conditions: GovernanceSignals,
    pub failed_interventions: Vec<Action>,
    pub justification: BlockJustification,
    pub unblock_conditions: UnblockPlan,
    pub policy: PolicyBinding,
    /// Hash of the previous line in the log; set by the log on append.
    #[serde(default)]
    pub previous_hash: Option<String>,
}

impl BlockEvent {
    /// Create a new event with the current timestamp and a random UUID.
    ///
    /// Evidence (interventions, justification, unblock plan) starts empty and
    /// must be supplied before the event passes `validate()`.
    pub fn new(
        subject: BlockSubject,
        output_kind_attempted: OutputKind,
        governance_state: GovernanceState,
        reason_code: impl Into<String>,
        policy: PolicyBinding,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: BlockEventType::BlockTriggered,
            timestamp: Utc::now(),
            subject,
            output_kind_attempted,
            governance_state,
            reason_code: reason_code.into(),
            conditions: GovernanceSignals::default(),
            failed_interventions: Vec::new(),
            justification: BlockJustification::default(),
            unblock_conditions: UnblockPlan::default(),
            policy,
            previous_hash: None,
        }
    }

    pub fn with_conditions(mut self, conditions: GovernanceSignals) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_failed_interventions(mut self, interventions: Vec<Action>) -> Self {
        self.failed_interventions = interventions;
        self
    }

    pub fn with_justification(mut self, justification: BlockJustification) -> Self {
        self.justification = justification;
        self
    }

    pub fn with_unblock_conditions(mut self, plan: UnblockPlan) -> Self {
        self.unblock_conditions = plan;
        self
    }

    /// Parse one log line and check it against the contract.
    pub fn from_json_line(line: &str) -> Result<Self, AuditError> {
        let event: BlockEvent = serde_json::from_str(line)?;
        event.validate()?;
        Ok(event)
    }

    /// Enforce the BLOCK event contract. Fails closed on the first breach.
    pub fn validate(&self) -> Result<(), AuditError> {
        let fail = |reason: String| -> Result<(), AuditError> {
            Err(AuditError::InvalidEvent {
                event_id: self.event_id,
                reason,
            })
        };

        if self.subject.interaction_id.trim().is_empty() {
            return fail("subject.interaction_id must not be empty".to_string());
        }
        if !self.output_kind_attempted.is_action_like() {
            return fail(format!(
                "output kind {} is not action-like",
                self.output_kind_attempted
            ));
        }
        if self.governance_state != GovernanceState::MOST_SEVERE {
            return fail(format!(
                "governance_state must be {}; got {}",
                GovernanceState::MOST_SEVERE,
                self.governance_state
            ));
        }
        if self.reason_code.trim().is_empty() {
            return fail("reason_code must not be empty".to_string());
        }
        if !self.conditions.all_hold() {
            return fail("all four legitimacy conditions must hold".to_string());
        }
        for required in [Action::Reflect, Action::Warn] {
            if !self.failed_interventions.contains(&required) {
                return fail(format!("failed_interventions must include {}", required));
            }
        }
        if self.justification.why_block_is_necessary.trim().is_empty() {
            return fail("justification.why_block_is_necessary is empty".to_string());
        }
        if self.justification.why_lower_measures_failed.trim().is_empty() {
            return fail("justification.why_lower_measures_failed is empty".to_string());
        }
        if !has_content(&self.unblock_conditions.required_actions) {
            return fail("unblock_conditions.required_actions is empty".to_string());
        }
        if !has_content(&self.unblock_conditions.reassessment_triggers) {
            return fail("unblock_conditions.reassessment_triggers is empty".to_string());
        }
        if !self.policy.fingerprint.is_well_formed() {
            return fail("policy fingerprints must be 64-char lowercase hex".to_string());
        }
        Ok(())
    }
}

fn has_content(items: &[String]) -> bool {
    !items.is_empty() && items.iter().all(|i| !i.trim().is_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use owl_policy::PolicyStore;

    /// A contract-satisfying event bound to the canonical policy.
    pub(crate) fn valid_event() -> BlockEvent {
        let store = PolicyStore::canonical().unwrap();
        BlockEvent::new(
            BlockSubject {
                interaction_id: "DLM-20261018-101500".to_string(),
                user_id: Some("u-17".to_string()),
                ..Default::default()
            },
            OutputKind::Action,
            GovernanceState::MOST_SEVERE,
            "BLOCK_ALL_CONDITIONS_MET",
            PolicyBinding {
                decision_table_version: store.table().version().to_string(),
                negative_rules_version: store.rules().version().to_string(),
                fingerprint: store.fingerprint().clone(),
            },
        )
        .with_conditions(GovernanceSignals::all_raised())
        .with_failed_interventions(vec![Action::Reflect, Action::Warn])
        .with_justification(BlockJustification {
            why_block_is_necessary: "Signing today is irreversible".to_string(),
            why_lower_measures_failed: "Prompts to pause were skipped twice".to_string(),
        })
        .with_unblock_conditions(UnblockPlan {
            required_actions: vec!["List what would change your mind".to_string()],
            reassessment_triggers: vec!["24 hours elapsed".to_string()],
        })
    }

    #[test]
    fn valid_event_passes_contract() {
        valid_event().validate().unwrap();
    }

    #[test]
    fn event_type_serializes_as_block_triggered() {
        let json = serde_json::to_value(valid_event()).unwrap();
        assert_eq!(json["event_type"], "BLOCK_TRIGGERED");
        assert_eq!(json["governance_state"]["harm_profile"], "HIGH");
    }

    #[test]
    fn missing_warn_breaks_contract() {
        let event = valid_event().with_failed_interventions(vec![Action::Reflect, Action::Slow]);
        let err = event.validate().unwrap_err();
        assert!(err.to_string().contains("WARN"));
    }

    #[test]
    fn non_severe_state_breaks_contract() {
        let mut event = valid_event();
        event.governance_state.harm_profile = owl_policy::HarmProfile::Medium;
        assert!(event.validate().is_err());
    }

    #[test]
    fn empty_unblock_plan_breaks_contract() {
        let event = valid_event().with_unblock_conditions(UnblockPlan {
            required_actions: vec![],
            reassessment_triggers: vec!["x".to_string()],
        });
        assert!(event.validate().is_err());
    }

    #[test]
    fn malformed_fingerprint_breaks_contract() {
        let mut event = valid_event();
        event.policy.fingerprint.negative_rules_sha256 = "not-a-digest".to_string();
        assert!(event.validate().is_err());
    }

    #[test]
    fn json_line_with_unknown_field_is_rejected() {
        let mut json = serde_json::to_value(valid_event()).unwrap();
        json["override_block"] = serde_json::json!(true);
        let line = serde_json::to_string(&json).unwrap();
        assert!(BlockEvent::from_json_line(&line).is_err());
    }

    #[test]
    fn json_line_with_other_event_type_is_rejected() {
        let mut json = serde_json::to_value(valid_event()).unwrap();
        json["event_type"] = serde_json::json!("WARN_TRIGGERED");
        let line = serde_json::to_string(&json).unwrap();
        assert!(BlockEvent::from_json_line(&line).is_err());
    }

    #[test]
    fn event_ids_are_unique() {
        assert_ne!(valid_event().event_id, valid_event().event_id);
    }
}
