// gate.rs — Output Boundary Gate.
//
// The single call site between "candidate output" and "delivered output".
// BLOCK requires three independent layers to agree:
//
// 1. the narrow legitimacy conjunction over the four output-level signals,
// 2. the decision table mapping the current state to BLOCK,
// 3. the prohibition engine reporting zero violations.
//
// Non-action output is never touched. A BLOCK also needs a subject to record
// it against, and its BlockEvent must pass the event contract before the
// gate commits. When all of that holds the attempted output is replaced with
// fixed reflective questions and the event is appended to the audit sink. A
// storage failure is reported in the trace but never delivers the blocked
// output.

use std::sync::Arc;

use owl_audit::{AuditSink, BlockEvent, BlockJustification, BlockSubject, PolicyBinding, UnblockPlan};
use owl_policy::{
    Action, BlockContext, GovernanceSignals, GovernanceState, OutputKind, PolicyStore, Violation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::output::OutputPacket;

/// Reason code recorded on every BLOCK.
pub const REASON_BLOCK_ALL_CONDITIONS_MET: &str = "BLOCK_ALL_CONDITIONS_MET";

/// Marker placed in the replacement's meta.
pub const BLOCKED_BY: &str = "OWL_OUTPUT_GATE";

/// Delivered instead of blocked action guidance. Keeps the user seeing,
/// never silences them.
pub const REPLACEMENT_CONTENT: &str = "I can't give action-guiding instructions here.\n\n\
Before acting, let's widen the reflection window:\n\
1) What is the irreversible downside if you act on this now?\n\
2) Which assumption would cost the most if it turned out to be wrong?\n\
3) What evidence would change your decision?\n\
4) If a trusted peer were in your place, what would you ask them to question first?\n";

/// Why the gate reached its outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceReason {
    NonActionOutput,
    CharterConditionsNotMet,
    MissingSubject,
    MissingGovernanceState,
    TableActionNotBlock,
    Prohibited,
    InvalidBlockEvent,
    BlockTriggered,
}

/// One check performed by the gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateStep {
    pub check: String,
    pub outcome: String,
    /// Whether this step decided the outcome.
    pub terminal: bool,
}

/// Diagnostic record of a single `finalize` call.
///
/// Observability only. Nothing in the gate reads it back, and it carries no
/// knob that could tune BLOCK.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionTrace {
    pub blocked: bool,
    pub reason: TraceReason,
    pub conditions: GovernanceSignals,
    pub steps: Vec<GateStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<Violation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_fault: Option<String>,
}

impl DecisionTrace {
    fn new(conditions: GovernanceSignals) -> Self {
        Self {
            blocked: false,
            reason: TraceReason::NonActionOutput,
            conditions,
            steps: Vec::new(),
            table_action: None,
            violations: None,
            reason_code: None,
            event_id: None,
            audit_fault: None,
        }
    }

    fn step(&mut self, check: &str, outcome: impl Into<String>, terminal: bool) {
        self.steps.push(GateStep {
            check: check.to_string(),
            outcome: outcome.into(),
            terminal,
        });
    }

    fn pass(mut self, reason: TraceReason) -> Self {
        self.reason = reason;
        self
    }
}

/// Who the output is for and the governance record backing a BLOCK.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateContext {
    pub subject: BlockSubject,
    #[serde(default)]
    pub governance: BlockContext,
}

impl GateContext {
    pub fn new(interaction_id: impl Into<String>) -> Self {
        Self {
            subject: BlockSubject {
                interaction_id: interaction_id.into(),
                ..Default::default()
            },
            governance: BlockContext::default(),
        }
    }

    pub fn with_governance(mut self, governance: BlockContext) -> Self {
        self.governance = governance;
        self
    }

    /// The record handed to the prohibition engine: the attempted kind is
    /// always the one being gated, and the subject's mode fills a missing
    /// governance mode.
    fn veto_context(&self, kind: OutputKind) -> BlockContext {
        let mut ctx = self.governance.clone().with_output_kind(kind);
        if ctx.mode.is_none() {
            ctx.mode = self.subject.mode.clone();
        }
        ctx
    }
}

/// The output boundary. Cheap to clone; share one per process.
#[derive(Clone)]
pub struct OutputGate {
    policy: Arc<PolicyStore>,
    audit: Arc<dyn AuditSink>,
}

impl OutputGate {
    pub fn new(policy: Arc<PolicyStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { policy, audit }
    }

    pub fn policy(&self) -> &PolicyStore {
        &self.policy
    }

    /// Decide whether `attempted` is delivered as-is or replaced.
    ///
    /// Always returns something deliverable. The trace is diagnostic only.
    pub fn finalize(
        &self,
        attempted: OutputPacket,
        signals: GovernanceSignals,
        ctx: &GateContext,
    ) -> (OutputPacket, DecisionTrace) {
        let mut trace = DecisionTrace::new(signals);

        if !attempted.kind.is_action_like() {
            trace.step("output_kind", format!("{} is not action-like", attempted.kind), true);
            tracing::debug!(kind = %attempted.kind, "non-action output passed through");
            return (attempted, trace.pass(TraceReason::NonActionOutput));
        }
        trace.step("output_kind", format!("{} is action-like", attempted.kind), false);

        if !signals.all_hold() {
            trace.step("legitimacy_conjunction", "not all four conditions hold", true);
            tracing::debug!(kind = %attempted.kind, "charter conditions not met; passed through");
            return (attempted, trace.pass(TraceReason::CharterConditionsNotMet));
        }
        trace.step("legitimacy_conjunction", "all four conditions hold", false);

        if ctx.subject.interaction_id.trim().is_empty() {
            trace.step("subject", "interaction_id missing", true);
            tracing::warn!("conjunction held but no interaction_id to record against; BLOCK denied");
            return (attempted, trace.pass(TraceReason::MissingSubject));
        }
        trace.step("subject", ctx.subject.interaction_id.clone(), false);

        let Some(state) = ctx.governance.state() else {
            trace.step("governance_state", "one or more axes missing", true);
            tracing::warn!(
                interaction_id = %ctx.subject.interaction_id,
                "conjunction held but governance state incomplete; BLOCK denied"
            );
            return (attempted, trace.pass(TraceReason::MissingGovernanceState));
        };

        let action = self.policy.decide(state);
        trace.table_action = Some(action);
        if action != Action::Block {
            trace.step("decision_table", format!("{} -> {}", state, action), true);
            return (attempted, trace.pass(TraceReason::TableActionNotBlock));
        }
        trace.step("decision_table", format!("{} -> {}", state, action), false);

        let violations = self.policy.check_prohibitions(&ctx.veto_context(attempted.kind));
        if !violations.is_empty() {
            let codes: Vec<&str> = violations.iter().map(|v| v.rule_id.as_str()).collect();
            trace.step("prohibitions", format!("vetoed by {}", codes.join(", ")), true);
            trace.violations = Some(violations);
            return (attempted, trace.pass(TraceReason::Prohibited));
        }
        trace.violations = Some(Vec::new());
        trace.step("prohibitions", "no violations", false);

        let event = self.block_event(&attempted, signals, ctx, state);
        if let Err(e) = event.validate() {
            trace.step("block_event", e.to_string(), true);
            tracing::error!(
                interaction_id = %ctx.subject.interaction_id,
                error = %e,
                "BLOCK could not be recorded; BLOCK denied"
            );
            return (attempted, trace.pass(TraceReason::InvalidBlockEvent));
        }
        trace.step("block_event", "contract satisfied", true);

        self.block(attempted, ctx, event, trace)
    }

    fn block(
        &self,
        attempted: OutputPacket,
        ctx: &GateContext,
        mut event: BlockEvent,
        mut trace: DecisionTrace,
    ) -> (OutputPacket, DecisionTrace) {
        match self.audit.append(&mut event) {
            Ok(()) => trace.event_id = Some(event.event_id),
            Err(e) => {
                tracing::error!(
                    event_id = %event.event_id,
                    interaction_id = %ctx.subject.interaction_id,
                    error = %e,
                    "failed to record BLOCK event; block still enforced"
                );
                trace.audit_fault = Some(e.to_string());
            }
        }

        tracing::warn!(
            interaction_id = %ctx.subject.interaction_id,
            kind = %attempted.kind,
            reason_code = REASON_BLOCK_ALL_CONDITIONS_MET,
            "BLOCK triggered; output replaced with reflective questions"
        );

        let mut meta = attempted.meta;
        meta.insert("blocked".to_string(), serde_json::Value::Bool(true));
        meta.insert("blocked_by".to_string(), BLOCKED_BY.into());
        meta.insert(
            "blocked_reason_code".to_string(),
            REASON_BLOCK_ALL_CONDITIONS_MET.into(),
        );
        let replacement = OutputPacket {
            kind: OutputKind::Questions,
            content: REPLACEMENT_CONTENT.to_string(),
            meta,
        };

        trace.blocked = true;
        trace.reason = TraceReason::BlockTriggered;
        trace.reason_code = Some(REASON_BLOCK_ALL_CONDITIONS_MET.to_string());
        (replacement, trace)
    }

    fn block_event(
        &self,
        attempted: &OutputPacket,
        signals: GovernanceSignals,
        ctx: &GateContext,
        state: GovernanceState,
    ) -> BlockEvent {
        let governance = &ctx.governance;
        let justification = governance.justification.clone().unwrap_or_default();
        let unblock = governance.unblock_conditions.clone().unwrap_or_default();

        BlockEvent::new(
            ctx.subject.clone(),
            attempted.kind,
            state,
            REASON_BLOCK_ALL_CONDITIONS_MET,
            PolicyBinding {
                decision_table_version: self.policy.table().version().to_string(),
                negative_rules_version: self.policy.rules().version().to_string(),
                fingerprint: self.policy.fingerprint().clone(),
            },
        )
        .with_conditions(signals)
        .with_failed_interventions(governance.failed_interventions.clone().unwrap_or_default())
        .with_justification(BlockJustification {
            why_block_is_necessary: justification.why_block_is_necessary.unwrap_or_default(),
            why_lower_measures_failed: justification.why_lower_measures_failed.unwrap_or_default(),
        })
        .with_unblock_conditions(UnblockPlan {
            required_actions: unblock.required_actions.unwrap_or_default(),
            reassessment_triggers: unblock.reassessment_triggers.unwrap_or_default(),
        })
    }
}
