// audit.rs — Audit subcommands: verify, tail, drift.

use std::path::PathBuf;

use clap::Subcommand;
use owl_audit::{detect_policy_drift, AuditError, AuditLog, DriftSeverity};
use owl_gate::GateConfig;
use owl_policy::PolicyStore;

#[derive(Subcommand)]
pub enum AuditCommands {
    /// Verify the BLOCK log: hash chain and every event's contract.
    Verify {
        /// Path to the block log (defaults to .owl/block_events.jsonl).
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Show recent BLOCK events.
    Tail {
        /// Path to the block log (defaults to .owl/block_events.jsonl).
        #[arg(long)]
        log: Option<PathBuf>,
        /// Number of events to show.
        #[arg(short, default_value = "10")]
        n: usize,
    },
    /// Compare each event's recorded policy fingerprint with the policy in force.
    Drift {
        /// Path to the block log (defaults to .owl/block_events.jsonl).
        #[arg(long)]
        log: Option<PathBuf>,
        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(cmd: &AuditCommands, config: &GateConfig) -> anyhow::Result<()> {
    match cmd {
        AuditCommands::Verify { log } => {
            let path = log.clone().unwrap_or_else(|| config.audit_log.clone());
            if !path.exists() {
                println!("No block log found at {}", path.display());
                return Ok(());
            }

            match AuditLog::verify_chain(&path) {
                Ok(count) => {
                    println!("Block log verified: {} event(s), hash chain intact.", count);
                }
                Err(AuditError::IntegrityViolation {
                    line,
                    expected,
                    actual,
                }) => {
                    println!("INTEGRITY VIOLATION at line {}:", line);
                    println!("  Expected previous_hash: {}", expected);
                    println!("  Actual previous_hash:   {}", actual);
                    println!();
                    println!("The block log may have been tampered with.");
                    anyhow::bail!("Block log integrity check failed");
                }
                Err(AuditError::InvalidEvent { event_id, reason }) => {
                    println!("INVALID EVENT {}: {}", event_id, reason);
                    anyhow::bail!("Block log contains an event that breaks the contract");
                }
                Err(e) => return Err(e.into()),
            }
        }

        AuditCommands::Tail { log, n } => {
            let path = log.clone().unwrap_or_else(|| config.audit_log.clone());
            if !path.exists() {
                println!("No block log found at {}", path.display());
                return Ok(());
            }

            let events = AuditLog::read_all(&path)?;
            let start = events.len().saturating_sub(*n);
            let recent = &events[start..];

            if recent.is_empty() {
                println!("No block events.");
                return Ok(());
            }

            println!(
                "{:<20} {:<28} {:<13} {:<10} REASON",
                "TIMESTAMP", "INTERACTION", "KIND", "USER"
            );
            println!("{}", "-".repeat(96));

            for event in recent {
                println!(
                    "{:<20} {:<28} {:<13} {:<10} {}",
                    event.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    event.subject.interaction_id,
                    event.output_kind_attempted.to_string(),
                    event.subject.user_id.as_deref().unwrap_or("-"),
                    event.reason_code,
                );
            }
        }

        AuditCommands::Drift { log, json } => {
            let path = log.clone().unwrap_or_else(|| config.audit_log.clone());
            let events = if path.exists() {
                AuditLog::read_all(&path)?
            } else {
                Vec::new()
            };
            let store = PolicyStore::load(&config.policy_paths())?;
            let report = detect_policy_drift(&events, store.fingerprint());

            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if report.is_clean() {
                println!(
                    "No policy drift: {} event(s) match the policy in force.",
                    report.events_checked
                );
            } else {
                println!(
                    "Policy drift ({}): {} finding(s) across {} event(s)",
                    report.overall_severity,
                    report.findings.len(),
                    report.events_checked
                );
                for finding in &report.findings {
                    println!(
                        "  {} {} {:?} [{}]",
                        finding.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        finding.event_id,
                        finding.signal,
                        finding.severity
                    );
                }
            }

            if report.overall_severity == DriftSeverity::Alert {
                anyhow::bail!("Block log drift at alert severity");
            }
        }
    }

    Ok(())
}
