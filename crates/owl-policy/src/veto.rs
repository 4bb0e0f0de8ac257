// veto.rs — Prohibition Veto Engine.
//
// Evaluates a BlockContext against two layers, independently and without
// short-circuiting:
//
// 1. Built-in conservative checks. These hold regardless of what the rule
//    set says: if the context cannot certify legitimacy, BLOCK is forbidden.
// 2. Every conditional prohibition in the negative rule set. Charter
//    statements (no `when`) are skipped.
//
// Any returned violation makes BLOCK illegitimate, whatever the decision
// table recommends. All violations are returned for audit completeness.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::{BlockContext, ContextField};
use crate::rules::{NegativeRuleSet, Severity};
use crate::state::Action;

/// Context keys that would amount to tuning BLOCK at runtime.
const TUNING_KEYS: &[&str] = &[
    "block_threshold",
    "override_block",
    "allow_block_override",
    "tune_block",
];

pub const MALFORMED_CONTEXT: &str = "MALFORMED_CONTEXT";
pub const MISSING_CORE_CONTEXT: &str = "MISSING_CORE_CONTEXT";
pub const MISSING_REQUIRED_CONTEXT: &str = "MISSING_REQUIRED_CONTEXT";
pub const MISSING_FAILED_INTERVENTIONS: &str = "MISSING_FAILED_INTERVENTIONS";
pub const INSUFFICIENT_PRIOR_INTERVENTIONS: &str = "INSUFFICIENT_PRIOR_INTERVENTIONS";
pub const NO_CONFIG_KNOBS: &str = "NO_CONFIG_KNOBS";

/// A triggered prohibition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    pub rule_id: String,
    pub severity: Severity,
    pub description: String,
}

impl Violation {
    fn hard(rule_id: &str, description: String) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity: Severity::Hard,
            description,
        }
    }
}

/// Evaluates contexts against the negative charter.
#[derive(Debug, Clone)]
pub struct ProhibitionEngine {
    rules: Arc<NegativeRuleSet>,
}

impl ProhibitionEngine {
    pub fn new(rules: Arc<NegativeRuleSet>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &NegativeRuleSet {
        &self.rules
    }

    /// Return every violation the context triggers. Empty means BLOCK is
    /// not prohibited.
    pub fn check(&self, ctx: &BlockContext) -> Vec<Violation> {
        let mut violations = builtin_checks(ctx);

        for (prohibition, trigger) in self.rules.conditional() {
            if let Some(detail) = trigger.fires(ctx) {
                violations.push(Violation {
                    rule_id: prohibition.code.clone(),
                    severity: prohibition.severity,
                    description: format!("{} ({})", prohibition.description, detail),
                });
            }
        }

        for v in &violations {
            tracing::warn!(rule_id = %v.rule_id, "BLOCK prohibited: {}", v.description);
        }
        violations
    }
}

fn builtin_checks(ctx: &BlockContext) -> Vec<Violation> {
    let mut violations = Vec::new();

    if !ctx.malformed.is_empty() {
        violations.push(Violation::hard(
            MALFORMED_CONTEXT,
            format!(
                "BLOCK prohibited: malformed context ({})",
                ctx.malformed.join(", ")
            ),
        ));
    }

    let core = [
        ContextField::ConstraintStatus,
        ContextField::HarmProfile,
        ContextField::JudgmentIntegrity,
    ];
    let missing_core: Vec<&str> = core
        .iter()
        .filter(|f| ctx.field(**f).is_none())
        .map(|f| f.path())
        .collect();
    if !missing_core.is_empty() {
        violations.push(Violation::hard(
            MISSING_CORE_CONTEXT,
            format!(
                "BLOCK prohibited: missing core context ({})",
                missing_core.join(", ")
            ),
        ));
    }

    for field in ContextField::REQUIRED_NARRATIVE {
        if ctx.field(field).is_none() {
            violations.push(Violation::hard(
                MISSING_REQUIRED_CONTEXT,
                format!(
                    "BLOCK prohibited: missing or empty required field {}",
                    field.path()
                ),
            ));
        }
    }

    match ctx.failed_interventions.as_deref() {
        None => violations.push(Violation::hard(
            MISSING_FAILED_INTERVENTIONS,
            "BLOCK prohibited: failed_interventions missing".to_string(),
        )),
        Some(tried) => {
            if !tried.contains(&Action::Reflect) || !tried.contains(&Action::Warn) {
                violations.push(Violation::hard(
                    INSUFFICIENT_PRIOR_INTERVENTIONS,
                    "BLOCK prohibited: failed_interventions must include REFLECT and WARN"
                        .to_string(),
                ));
            }
        }
    }

    let knobs: Vec<&str> = TUNING_KEYS
        .iter()
        .copied()
        .filter(|k| ctx.extra.contains_key(*k))
        .collect();
    if !knobs.is_empty() {
        violations.push(Violation::hard(
            NO_CONFIG_KNOBS,
            format!(
                "BLOCK prohibited: no thresholds, knobs or overrides permitted ({})",
                knobs.join(", ")
            ),
        ));
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OutputKind;
    use crate::state::GovernanceState;
    use serde_json::json;

    fn engine() -> ProhibitionEngine {
        ProhibitionEngine::new(Arc::new(NegativeRuleSet::canonical().unwrap()))
    }

    fn legitimate() -> BlockContext {
        BlockContext::default()
            .with_state(GovernanceState::MOST_SEVERE)
            .with_failed_interventions(vec![Action::Reflect, Action::Warn, Action::Slow])
            .with_justification(
                "Wiring the deposit now cannot be undone",
                "Reflection prompts and warnings were dismissed",
            )
            .with_unblock_conditions(
                vec!["Sleep on it and revisit the numbers".to_string()],
                vec!["New evidence about the counterparty".to_string()],
            )
            .with_flag("moral_disagreement", false)
            .with_flag("political_disagreement", false)
            .with_flag("ideological_disagreement", false)
            .with_mode("EXECUTION")
            .with_output_kind(OutputKind::Action)
    }

    fn ids(violations: &[Violation]) -> Vec<&str> {
        violations.iter().map(|v| v.rule_id.as_str()).collect()
    }

    #[test]
    fn legitimate_context_has_no_violations() {
        assert!(engine().check(&legitimate()).is_empty());
    }

    #[test]
    fn empty_context_is_conservatively_prohibited() {
        let violations = engine().check(&BlockContext::default());
        let ids = ids(&violations);
        assert!(ids.contains(&MISSING_CORE_CONTEXT));
        assert!(ids.contains(&MISSING_REQUIRED_CONTEXT));
        assert!(ids.contains(&MISSING_FAILED_INTERVENTIONS));
    }

    #[test]
    fn each_missing_minimum_field_yields_a_violation() {
        for field in 0..6 {
            let mut ctx = legitimate();
            match field {
                0 => ctx.constraint_status = None,
                1 => ctx.harm_profile = None,
                2 => ctx.judgment_integrity = None,
                3 => ctx.failed_interventions = None,
                4 => ctx.justification = None,
                _ => ctx.unblock_conditions = None,
            }
            assert!(!engine().check(&ctx).is_empty(), "field {} not enforced", field);
        }
    }

    #[test]
    fn malformed_values_are_violations() {
        let shapes = [
            json!({"flags": {"moral_disagreement": "yes"}}),
            json!({"failed_interventions": ["REFLECT", "WARN", "NUDGE"]}),
            json!({"justification": {"why_block_is_necessary": ["not", "text"]}}),
            json!({"unblock_conditions": {"required_actions": [1, 2]}}),
            json!({"mode": 3}),
        ];
        for shape in shapes {
            let mut value = serde_json::to_value(legitimate()).unwrap();
            for (key, v) in shape.as_object().unwrap() {
                value[key.as_str()] = v.clone();
            }
            let ctx: BlockContext = serde_json::from_value(value).unwrap();
            let violations = engine().check(&ctx);
            assert!(
                ids(&violations).contains(&MALFORMED_CONTEXT),
                "{} not vetoed",
                shape
            );
        }
    }

    #[test]
    fn malformed_axis_is_also_missing_core_context() {
        let mut value = serde_json::to_value(legitimate()).unwrap();
        value["constraint_status"] = json!("EXTREME");
        let ctx: BlockContext = serde_json::from_value(value).unwrap();
        let violations = engine().check(&ctx);
        let ids = ids(&violations);
        assert!(ids.contains(&MALFORMED_CONTEXT));
        assert!(ids.contains(&MISSING_CORE_CONTEXT));
    }

    #[test]
    fn moral_disagreement_always_prohibits() {
        let ctx = legitimate().with_flag("moral_disagreement", true);
        let violations = engine().check(&ctx);
        assert!(ids(&violations).contains(&"NEG-007"));
    }

    #[test]
    fn analysis_only_mode_always_prohibits() {
        let ctx = legitimate().with_mode("ANALYSIS_ONLY");
        let violations = engine().check(&ctx);
        assert!(ids(&violations).contains(&"NEG-008"));
    }

    #[test]
    fn missing_warn_is_insufficient() {
        let ctx = legitimate().with_failed_interventions(vec![Action::Reflect, Action::Slow]);
        let violations = engine().check(&ctx);
        let ids = ids(&violations);
        assert!(ids.contains(&INSUFFICIENT_PRIOR_INTERVENTIONS));
        assert!(ids.contains(&"NEG-003"));
    }

    #[test]
    fn all_violations_are_reported_without_short_circuit() {
        let ctx = legitimate()
            .with_flag("political_disagreement", true)
            .with_mode("ANALYSIS_ONLY")
            .with_output_kind(OutputKind::Reframe);
        let violations = engine().check(&ctx);
        let ids = ids(&violations);
        assert!(ids.contains(&"NEG-005"));
        assert!(ids.contains(&"NEG-007"));
        assert!(ids.contains(&"NEG-008"));
    }

    #[test]
    fn tuning_knobs_in_context_are_prohibited() {
        let mut ctx = legitimate();
        ctx.extra.insert("block_threshold".to_string(), json!(0.2));
        let violations = engine().check(&ctx);
        assert_eq!(ids(&violations), vec![NO_CONFIG_KNOBS]);
    }

    #[test]
    fn charter_statements_never_fire() {
        let rules = NegativeRuleSet::from_value(json!({
            "spec": {"name": "r", "version": "1", "non_tunable": true},
            "prohibitions": [{"code": "C-1", "description": "charter only"}]
        }))
        .unwrap();
        let engine = ProhibitionEngine::new(Arc::new(rules));
        assert!(engine.check(&legitimate()).is_empty());
    }
}
