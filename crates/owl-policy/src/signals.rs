// signals.rs — The four output-level legitimacy signals.
//
// Supplied as booleans by upstream assessors. When a signal is uncertain the
// assessor should report `false`: the conjunction is meant to miss
// borderline cases rather than block them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GovernanceSignals {
    #[serde(default)]
    pub action_imminent: bool,
    #[serde(default)]
    pub irreversible_risk: bool,
    #[serde(default)]
    pub distortion_present: bool,
    #[serde(default)]
    pub insufficient_reflection_window: bool,
}

impl GovernanceSignals {
    /// All four signals raised.
    pub fn all_raised() -> Self {
        Self {
            action_imminent: true,
            irreversible_risk: true,
            distortion_present: true,
            insufficient_reflection_window: true,
        }
    }

    /// The narrow legitimacy conjunction: every signal must hold.
    pub fn all_hold(&self) -> bool {
        self.action_imminent
            && self.irreversible_risk
            && self.distortion_present
            && self.insufficient_reflection_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_no_signal() {
        let signals: GovernanceSignals = serde_json::from_str("{}").unwrap();
        assert_eq!(signals, GovernanceSignals::default());
        assert!(!signals.all_hold());
    }

    #[test]
    fn any_false_signal_breaks_the_conjunction() {
        assert!(GovernanceSignals::all_raised().all_hold());
        let mut s = GovernanceSignals::all_raised();
        s.distortion_present = false;
        assert!(!s.all_hold());
    }
}
