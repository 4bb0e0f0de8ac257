// state.rs — The three governance axes and the six escalating actions.
//
// A GovernanceState is one point in the 3 x 3 x 3 space indexed by
// (constraint_status, harm_profile, judgment_integrity). Every point maps to
// exactly one Action through the decision table.

use serde::{Deserialize, Serialize};

/// How strongly the user's own constraints bind the attempted action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintStatus {
    None,
    Soft,
    Hard,
}

impl ConstraintStatus {
    pub const ALL: [ConstraintStatus; 3] = [Self::None, Self::Soft, Self::Hard];
}

impl std::fmt::Display for ConstraintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConstraintStatus::None => "NONE",
            ConstraintStatus::Soft => "SOFT",
            ConstraintStatus::Hard => "HARD",
        };
        write!(f, "{}", s)
    }
}

/// Severity of the harm if the action goes ahead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmProfile {
    Low,
    Medium,
    High,
}

impl HarmProfile {
    pub const ALL: [HarmProfile; 3] = [Self::Low, Self::Medium, Self::High];
}

impl std::fmt::Display for HarmProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HarmProfile::Low => "LOW",
            HarmProfile::Medium => "MEDIUM",
            HarmProfile::High => "HIGH",
        };
        write!(f, "{}", s)
    }
}

/// How intact the user's judgment appears to be.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JudgmentIntegrity {
    Intact,
    Degraded,
    Compromised,
}

impl JudgmentIntegrity {
    pub const ALL: [JudgmentIntegrity; 3] = [Self::Intact, Self::Degraded, Self::Compromised];
}

impl std::fmt::Display for JudgmentIntegrity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JudgmentIntegrity::Intact => "INTACT",
            JudgmentIntegrity::Degraded => "DEGRADED",
            JudgmentIntegrity::Compromised => "COMPROMISED",
        };
        write!(f, "{}", s)
    }
}

/// Governance actions, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Advisory,
    Reflect,
    Warn,
    Slow,
    RequireAck,
    Block,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Advisory => "ADVISORY",
            Action::Reflect => "REFLECT",
            Action::Warn => "WARN",
            Action::Slow => "SLOW",
            Action::RequireAck => "REQUIRE_ACK",
            Action::Block => "BLOCK",
        };
        write!(f, "{}", s)
    }
}

/// One point in the governance state space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GovernanceState {
    pub constraint_status: ConstraintStatus,
    pub harm_profile: HarmProfile,
    pub judgment_integrity: JudgmentIntegrity,
}

impl GovernanceState {
    /// The single state the decision table is allowed to map to BLOCK.
    pub const MOST_SEVERE: GovernanceState = GovernanceState {
        constraint_status: ConstraintStatus::Hard,
        harm_profile: HarmProfile::High,
        judgment_integrity: JudgmentIntegrity::Compromised,
    };

    pub fn new(
        constraint_status: ConstraintStatus,
        harm_profile: HarmProfile,
        judgment_integrity: JudgmentIntegrity,
    ) -> Self {
        Self {
            constraint_status,
            harm_profile,
            judgment_integrity,
        }
    }

    /// Iterate over all 27 states in axis order.
    pub fn all() -> impl Iterator<Item = GovernanceState> {
        ConstraintStatus::ALL.into_iter().flat_map(|cs| {
            HarmProfile::ALL.into_iter().flat_map(move |hp| {
                JudgmentIntegrity::ALL
                    .into_iter()
                    .map(move |ji| GovernanceState::new(cs, hp, ji))
            })
        })
    }
}

impl std::fmt::Display for GovernanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.constraint_status, self.harm_profile, self.judgment_integrity
        )
    }
}
