//! # owl-gate
//!
//! The output boundary of the Owlume governance core, plus the termination
//! invariant that every interaction must satisfy before it is persisted.
//!
//! - [`OutputGate::finalize`] is the only place an attempted output can be
//!   replaced. Non-action output always passes; action-like output is
//!   replaced with reflective questions only when the legitimacy
//!   conjunction, the decision table and the prohibition engine all agree.
//! - [`enforce`] refuses any interaction without a user-owned, acknowledged
//!   [`JudgmentTerminalState`]; [`InteractionStore`] calls it before every
//!   write.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use owl_gate::{GateConfig, GateContext, OutputPacket};
//! use owl_policy::{GovernanceSignals, OutputKind};
//!
//! let gate = GateConfig::load(".").unwrap().open_gate().unwrap();
//! let attempted = OutputPacket::new(OutputKind::Advice, "Quit today.");
//! let (delivered, trace) = gate.finalize(
//!     attempted,
//!     GovernanceSignals::default(),
//!     &GateContext::new("DLM-20261018-120000"),
//! );
//! assert!(!trace.blocked);
//! println!("{}", delivered.content);
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod landing;
pub mod output;
pub mod record;

pub use config::GateConfig;
pub use error::{GateError, LandingError};
pub use gate::{
    DecisionTrace, GateContext, GateStep, OutputGate, TraceReason, BLOCKED_BY,
    REASON_BLOCK_ALL_CONDITIONS_MET, REPLACEMENT_CONTENT,
};
pub use landing::{enforce, JudgmentTerminalState, JudgmentType, ACK_TEXT};
pub use output::OutputPacket;
pub use record::{InteractionRecord, InteractionStore};
