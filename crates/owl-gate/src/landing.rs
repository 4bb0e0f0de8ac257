// landing.rs — Termination invariant (judgment landing).
//
// No interaction ends without a closing judgment that the user owns and has
// explicitly acknowledged. `build` is how the closing step creates one;
// `enforce` is the pure check run at the single point where a record is
// about to be persisted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LandingError;

/// The acknowledgment the user affirms when landing a judgment.
pub const ACK_TEXT: &str = "This judgment is mine. Owlume did not decide for me.";

/// The only legitimate owner of a judgment.
pub const OWNER_USER: &str = "user";

pub const STATEMENT_MIN_CHARS: usize = 10;
pub const STATEMENT_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JudgmentType {
    Position,
    Constraint,
    NextStep,
    Defer,
}

impl FromStr for JudgmentType {
    type Err = LandingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "position" => Ok(JudgmentType::Position),
            "constraint" => Ok(JudgmentType::Constraint),
            "next_step" => Ok(JudgmentType::NextStep),
            "defer" => Ok(JudgmentType::Defer),
            other => Err(LandingError::InvalidType(other.to_string())),
        }
    }
}

impl fmt::Display for JudgmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JudgmentType::Position => "position",
            JudgmentType::Constraint => "constraint",
            JudgmentType::NextStep => "next_step",
            JudgmentType::Defer => "defer",
        };
        write!(f, "{}", s)
    }
}

/// The closing judgment attached to a persisted interaction.
///
/// `owner` and `acknowledged` are kept as plain data so records read back
/// from storage can be checked, not assumed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JudgmentTerminalState {
    #[serde(rename = "type")]
    pub judgment_type: JudgmentType,
    pub statement: String,
    pub confidence: f64,
    pub owner: String,
    pub acknowledged: bool,
    pub timestamp: DateTime<Utc>,
}

impl JudgmentTerminalState {
    /// Build a user-owned, acknowledged terminal state.
    ///
    /// The statement is trimmed before its length is checked. Refuses to
    /// build anything when `acknowledged` is false.
    pub fn build(
        judgment_type: JudgmentType,
        statement: &str,
        confidence: f64,
        acknowledged: bool,
    ) -> Result<Self, LandingError> {
        let statement = statement.trim().to_string();
        check_statement(&statement)?;
        check_confidence(confidence)?;
        if !acknowledged {
            return Err(LandingError::NotAcknowledged);
        }

        Ok(Self {
            judgment_type,
            statement,
            confidence,
            owner: OWNER_USER.to_string(),
            acknowledged: true,
            timestamp: Utc::now(),
        })
    }
}

/// Refuse termination unless a structurally valid, user-owned, acknowledged
/// judgment is present. Never mutates its input.
pub fn enforce(state: Option<&JudgmentTerminalState>) -> Result<(), LandingError> {
    let state = state.ok_or(LandingError::Missing)?;

    if state.owner != OWNER_USER {
        return Err(LandingError::NotUserOwned {
            owner: state.owner.clone(),
        });
    }
    if !state.acknowledged {
        return Err(LandingError::NotAcknowledged);
    }
    check_statement(state.statement.trim())?;
    check_confidence(state.confidence)
}

fn check_statement(statement: &str) -> Result<(), LandingError> {
    let chars = statement.chars().count();
    if !(STATEMENT_MIN_CHARS..=STATEMENT_MAX_CHARS).contains(&chars) {
        return Err(LandingError::StatementLength {
            chars,
            min: STATEMENT_MIN_CHARS,
            max: STATEMENT_MAX_CHARS,
        });
    }
    Ok(())
}

fn check_confidence(value: f64) -> Result<(), LandingError> {
    // NaN fails the range check too.
    if !(0.0..=1.0).contains(&value) {
        return Err(LandingError::ConfidenceOutOfRange { value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> JudgmentTerminalState {
        JudgmentTerminalState::build(
            JudgmentType::Position,
            "I will wait a week before signing.",
            0.7,
            true,
        )
        .unwrap()
    }

    #[test]
    fn minimal_valid_state_passes() {
        let state = minimal();
        assert_eq!(state.owner, "user");
        assert!(state.acknowledged);
        enforce(Some(&state)).unwrap();
    }

    #[test]
    fn absent_state_always_fails() {
        assert_eq!(enforce(None), Err(LandingError::Missing));
    }

    #[test]
    fn foreign_owner_fails() {
        let mut state = minimal();
        state.owner = "owlume".to_string();
        assert!(matches!(
            enforce(Some(&state)),
            Err(LandingError::NotUserOwned { .. })
        ));
    }

    #[test]
    fn unacknowledged_state_fails() {
        let mut state = minimal();
        state.acknowledged = false;
        assert_eq!(enforce(Some(&state)), Err(LandingError::NotAcknowledged));
    }

    #[test]
    fn build_refuses_without_acknowledgment() {
        let result = JudgmentTerminalState::build(
            JudgmentType::Defer,
            "Not ready to decide yet.",
            0.2,
            false,
        );
        assert_eq!(result, Err(LandingError::NotAcknowledged));
    }

    #[test]
    fn statement_bounds_are_inclusive() {
        let ten = "a".repeat(10);
        let five_hundred = "b".repeat(500);
        assert!(JudgmentTerminalState::build(JudgmentType::NextStep, &ten, 0.0, true).is_ok());
        assert!(
            JudgmentTerminalState::build(JudgmentType::NextStep, &five_hundred, 1.0, true).is_ok()
        );
        assert!(JudgmentTerminalState::build(JudgmentType::NextStep, "too short", 0.5, true).is_err());
        assert!(
            JudgmentTerminalState::build(JudgmentType::NextStep, &"c".repeat(501), 0.5, true)
                .is_err()
        );
    }

    #[test]
    fn statement_is_trimmed_before_length_check() {
        let padded = format!("   {}   ", "x".repeat(9));
        assert!(JudgmentTerminalState::build(JudgmentType::Position, &padded, 0.5, true).is_err());

        let state =
            JudgmentTerminalState::build(JudgmentType::Position, "  Keep the job.  ", 0.5, true)
                .unwrap();
        assert_eq!(state.statement, "Keep the job.");
    }

    #[test]
    fn confidence_out_of_range_fails() {
        for value in [-0.01, 1.01, f64::NAN] {
            let mut state = minimal();
            state.confidence = value;
            assert!(enforce(Some(&state)).is_err(), "confidence {value} accepted");
        }
    }

    #[test]
    fn enforce_does_not_mutate() {
        let state = minimal();
        let before = state.clone();
        let _ = enforce(Some(&state));
        assert_eq!(state, before);
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(matches!(
            "verdict".parse::<JudgmentType>(),
            Err(LandingError::InvalidType(_))
        ));
        assert_eq!("next_step".parse::<JudgmentType>().unwrap(), JudgmentType::NextStep);

        let mut json = serde_json::to_value(minimal()).unwrap();
        json["type"] = serde_json::json!("verdict");
        assert!(serde_json::from_value::<JudgmentTerminalState>(json).is_err());
    }

    #[test]
    fn serializes_type_field_name() {
        let json = serde_json::to_value(minimal()).unwrap();
        assert_eq!(json["type"], "position");
        assert_eq!(json["owner"], "user");
    }
}
