// finalize.rs — Run one attempted output through the output gate.
//
// Request (JSON, file or stdin):
//   { "attempted": { "kind": "ACTION", "content": "...", "meta": {} },
//     "signals":   { "action_imminent": true, ... },
//     "context":   { "subject": { "interaction_id": "..." }, "governance": { ... } } }
//
// Prints { "delivered": ..., "trace": ... } on stdout. Surfaces show
// `delivered`; `trace` is diagnostic only.

use std::io::Read;
use std::path::Path;

use owl_gate::{DecisionTrace, GateConfig, GateContext, OutputPacket};
use owl_policy::GovernanceSignals;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FinalizeRequest {
    attempted: OutputPacket,
    #[serde(default)]
    signals: GovernanceSignals,
    context: GateContext,
}

#[derive(Debug, Serialize)]
struct FinalizeResponse {
    delivered: OutputPacket,
    trace: DecisionTrace,
}

pub fn execute(input: Option<&Path>, config: &GateConfig) -> anyhow::Result<()> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let request: FinalizeRequest = serde_json::from_str(&raw)?;

    let gate = config.open_gate()?;
    let (delivered, trace) = gate.finalize(request.attempted, request.signals, &request.context);

    let response = FinalizeResponse { delivered, trace };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_request_parses_with_default_signals() {
        let request: FinalizeRequest = serde_json::from_str(
            r#"{
                "attempted": { "kind": "QUESTIONS", "content": "What would change your mind?" },
                "context": { "subject": { "interaction_id": "DLM-1" } }
            }"#,
        )
        .unwrap();
        assert!(!request.signals.all_hold());
        assert_eq!(request.context.subject.interaction_id, "DLM-1");
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let result: Result<FinalizeRequest, _> = serde_json::from_str(
            r#"{
                "attempted": { "kind": "ACTION", "content": "Go." },
                "context": { "subject": { "interaction_id": "DLM-2" } },
                "block_threshold": 0.1
            }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn malformed_governance_still_parses() {
        let request: FinalizeRequest = serde_json::from_str(
            r#"{
                "attempted": { "kind": "ANALYSIS", "content": "Two options remain." },
                "signals": {
                    "action_imminent": true,
                    "irreversible_risk": true,
                    "distortion_present": true,
                    "insufficient_reflection_window": true
                },
                "context": {
                    "subject": { "interaction_id": "DLM-4" },
                    "governance": {
                        "constraint_status": "EXTREME",
                        "failed_interventions": ["REFLECT", "NUDGE"],
                        "flags": { "moral_disagreement": "yes" }
                    }
                }
            }"#,
        )
        .unwrap();
        assert!(request.signals.all_hold());
        assert_eq!(request.context.governance.malformed.len(), 3);

        let dir = tempfile::tempdir().unwrap();
        let gate = GateConfig::for_project(dir.path()).open_gate().unwrap();
        let (delivered, trace) =
            gate.finalize(request.attempted.clone(), request.signals, &request.context);
        assert_eq!(delivered, request.attempted);
        assert!(!trace.blocked);
    }

    #[test]
    fn finalize_against_temp_project() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("request.json");
        std::fs::write(
            &input,
            r#"{
                "attempted": { "kind": "ANALYSIS", "content": "Two options remain." },
                "context": { "subject": { "interaction_id": "DLM-3" } }
            }"#,
        )
        .unwrap();

        let config = GateConfig::for_project(dir.path());
        execute(Some(&input), &config).unwrap();
        assert!(config.audit_log.exists());
    }
}
