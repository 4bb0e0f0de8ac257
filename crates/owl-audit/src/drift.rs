// drift.rs — Policy drift detection.
//
// Every BLOCK event is bound to the fingerprint of the policy in force when
// it fired. Comparing those bindings against the policy loaded now shows
// whether the law changed underneath the audit trail:
//
// 1. Decision table changed — the table that produced the BLOCK is gone.
// 2. Negative rules changed — the veto layer differs from what was certified.
// 3. Malformed fingerprint — the recorded binding cannot be compared at all.
//
// Drift is reported, never repaired. Historical events stay as written.

use chrono::{DateTime, Utc};
use owl_policy::PolicyFingerprint;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::BlockEvent;

/// Which part of the policy binding drifted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DriftSignal {
    DecisionTableChanged,
    NegativeRulesChanged,
    MalformedFingerprint,
}

/// How severe the drift is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DriftSeverity {
    /// Recorded binding matches the current policy.
    Normal,
    /// The veto layer moved; the BLOCK decision itself is still reproducible.
    Warning,
    /// The BLOCK can no longer be reproduced against the current policy.
    Alert,
}

impl std::fmt::Display for DriftSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriftSeverity::Normal => write!(f, "normal"),
            DriftSeverity::Warning => write!(f, "warning"),
            DriftSeverity::Alert => write!(f, "alert"),
        }
    }
}

/// A single event whose policy binding no longer matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriftFinding {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub signal: DriftSignal,
    pub severity: DriftSeverity,
    /// Digest recorded in the event.
    pub recorded: String,
    /// Digest of the policy loaded now.
    pub current: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriftReport {
    pub computed_at: DateTime<Utc>,
    pub current: PolicyFingerprint,
    pub events_checked: usize,
    pub findings: Vec<DriftFinding>,
    /// Worst severity across all findings.
    pub overall_severity: DriftSeverity,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Compare each event's recorded fingerprint against the current policy.
pub fn detect_policy_drift(events: &[BlockEvent], current: &PolicyFingerprint) -> DriftReport {
    let mut findings = Vec::new();

    for event in events {
        let recorded = &event.policy.fingerprint;
        let finding = |signal, severity, recorded: &str, current: &str| DriftFinding {
            event_id: event.event_id,
            timestamp: event.timestamp,
            signal,
            severity,
            recorded: recorded.to_string(),
            current: current.to_string(),
        };

        if !recorded.is_well_formed() {
            findings.push(finding(
                DriftSignal::MalformedFingerprint,
                DriftSeverity::Alert,
                &format!(
                    "{}/{}",
                    recorded.decision_table_sha256, recorded.negative_rules_sha256
                ),
                &format!(
                    "{}/{}",
                    current.decision_table_sha256, current.negative_rules_sha256
                ),
            ));
            continue;
        }
        if recorded.decision_table_sha256 != current.decision_table_sha256 {
            findings.push(finding(
                DriftSignal::DecisionTableChanged,
                DriftSeverity::Alert,
                &recorded.decision_table_sha256,
                &current.decision_table_sha256,
            ));
        }
        if recorded.negative_rules_sha256 != current.negative_rules_sha256 {
            findings.push(finding(
                DriftSignal::NegativeRulesChanged,
                DriftSeverity::Warning,
                &recorded.negative_rules_sha256,
                &current.negative_rules_sha256,
            ));
        }
    }

    let overall_severity = findings
        .iter()
        .map(|f| f.severity)
        .max()
        .unwrap_or(DriftSeverity::Normal);

    if overall_severity > DriftSeverity::Normal {
        tracing::warn!(
            events = events.len(),
            findings = findings.len(),
            severity = %overall_severity,
            "policy drift detected in block log"
        );
    }

    DriftReport {
        computed_at: Utc::now(),
        current: current.clone(),
        events_checked: events.len(),
        findings,
        overall_severity,
    }
}
