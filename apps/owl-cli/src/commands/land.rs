// land.rs — Land a closing judgment and persist the interaction.

use std::path::PathBuf;

use clap::Args;
use owl_gate::{
    GateConfig, InteractionRecord, InteractionStore, JudgmentTerminalState, JudgmentType, ACK_TEXT,
};

#[derive(Args)]
pub struct LandArgs {
    /// Interaction being closed.
    #[arg(long)]
    interaction_id: String,
    /// position, constraint, next_step or defer.
    #[arg(long = "type")]
    judgment_type: String,
    /// The judgment in the user's own words (10-500 characters).
    #[arg(long)]
    statement: String,
    /// Confidence in [0, 1].
    #[arg(long)]
    confidence: f64,
    /// Affirm the acknowledgment; without it nothing is persisted.
    #[arg(long)]
    ack: bool,
    #[arg(long)]
    user_id: Option<String>,
    #[arg(long)]
    mode: Option<String>,
    #[arg(long)]
    principle: Option<String>,
    /// JSON file stored as the record payload.
    #[arg(long)]
    payload: Option<PathBuf>,
}

pub fn execute(args: &LandArgs, config: &GateConfig) -> anyhow::Result<()> {
    let judgment_type: JudgmentType = args.judgment_type.parse()?;
    let landing = JudgmentTerminalState::build(
        judgment_type,
        &args.statement,
        args.confidence,
        args.ack,
    )?;

    let payload = match &args.payload {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => serde_json::Value::Null,
    };

    let mut record = InteractionRecord::new(args.interaction_id.clone()).with_landing(landing);
    record.user_id = args.user_id.clone();
    record.mode = args.mode.clone();
    record.principle = args.principle.clone();
    record.payload = payload;

    let store = InteractionStore::open(&config.interaction_log)?;
    store.persist(&record)?;

    println!("{}", ACK_TEXT);
    println!(
        "Interaction {} landed ({}) -> {}",
        record.interaction_id,
        judgment_type,
        store.path().display()
    );
    Ok(())
}
