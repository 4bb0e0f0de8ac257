// policy.rs — Policy subcommands: check, decide, fingerprint.

use std::path::PathBuf;

use clap::Subcommand;
use owl_gate::GateConfig;
use owl_policy::{GovernanceState, PolicyFingerprint, PolicyStore};
use serde::de::DeserializeOwned;

#[derive(Subcommand)]
pub enum PolicyCommands {
    /// Load and validate both policy artifacts; print versions and fingerprints.
    Check,
    /// Look up the action for one governance state.
    Decide {
        /// NONE, SOFT or HARD.
        constraint_status: String,
        /// LOW, MEDIUM or HIGH.
        harm_profile: String,
        /// INTACT, DEGRADED or COMPROMISED.
        judgment_integrity: String,
    },
    /// Print the full 27-row decision table.
    Table,
    /// Print artifact fingerprints. With both paths given, hashes those
    /// files without validating them.
    Fingerprint {
        #[arg(long, requires = "rules")]
        table: Option<PathBuf>,
        #[arg(long, requires = "table")]
        rules: Option<PathBuf>,
    },
}

pub fn execute(cmd: &PolicyCommands, config: &GateConfig) -> anyhow::Result<()> {
    match cmd {
        PolicyCommands::Check => {
            let store = PolicyStore::load(&config.policy_paths())?;
            println!(
                "Decision table {} ({} rows) OK",
                store.table().version(),
                store.table().rows().len()
            );
            println!(
                "Negative rules {} ({} prohibitions, {} runtime) OK",
                store.rules().version(),
                store.rules().prohibitions().len(),
                store.rules().conditional().count()
            );
            print_fingerprint(store.fingerprint());
        }

        PolicyCommands::Decide {
            constraint_status,
            harm_profile,
            judgment_integrity,
        } => {
            let store = PolicyStore::load(&config.policy_paths())?;
            let state = GovernanceState::new(
                parse_axis(constraint_status, "constraint_status")?,
                parse_axis(harm_profile, "harm_profile")?,
                parse_axis(judgment_integrity, "judgment_integrity")?,
            );
            let decision = store.table().gating_decision(state);
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }

        PolicyCommands::Table => {
            let store = PolicyStore::load(&config.policy_paths())?;
            println!("{:<8} {:<8} {:<13} ACTION", "CS", "HP", "JI");
            println!("{}", "-".repeat(44));
            for state in GovernanceState::all() {
                println!(
                    "{:<8} {:<8} {:<13} {}",
                    state.constraint_status.to_string(),
                    state.harm_profile.to_string(),
                    state.judgment_integrity.to_string(),
                    store.decide(state)
                );
            }
        }

        PolicyCommands::Fingerprint { table, rules } => {
            let fingerprint = match (table, rules) {
                (Some(table), Some(rules)) => PolicyFingerprint::from_files(table, rules)?,
                _ => PolicyStore::load(&config.policy_paths())?.fingerprint().clone(),
            };
            print_fingerprint(&fingerprint);
        }
    }

    Ok(())
}

fn print_fingerprint(fingerprint: &PolicyFingerprint) {
    println!("decision_table_sha256 {}", fingerprint.decision_table_sha256);
    println!("negative_rules_sha256 {}", fingerprint.negative_rules_sha256);
}

/// Parse an axis value case-insensitively through its serde names.
fn parse_axis<T: DeserializeOwned>(value: &str, axis: &str) -> anyhow::Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_ascii_uppercase()))
        .map_err(|e| anyhow::anyhow!("invalid {}: {:?} ({})", axis, value, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use owl_policy::{ConstraintStatus, JudgmentIntegrity};

    #[test]
    fn axes_parse_case_insensitively() {
        let cs: ConstraintStatus = parse_axis("hard", "constraint_status").unwrap();
        assert_eq!(cs, ConstraintStatus::Hard);
        let ji: JudgmentIntegrity = parse_axis("Compromised", "judgment_integrity").unwrap();
        assert_eq!(ji, JudgmentIntegrity::Compromised);
    }

    #[test]
    fn unknown_axis_value_is_an_error() {
        let result: anyhow::Result<ConstraintStatus> = parse_axis("extreme", "constraint_status");
        assert!(result.is_err());
    }
}
