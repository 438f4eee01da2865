use std::fmt;

use crate::{BaseStat, GameState, ShipStat};

/// A state that no sequence of inputs should be able to reach.
#[derive(Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    FleetMismatch { total: u64, expected: i64 },
    RiskOutOfRange(f64),
    NegativeCredits(f64),
    InvalidShipStat { stat: ShipStat, value: f64 },
    InvalidBaseStat { stat: BaseStat, value: f64 },
    ProgressOutOfRange { build: f64, repair: f64 },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FleetMismatch { total, expected } => write!(
                f,
                "fleet phases sum to {total} but commissioned - destroyed is {expected}"
            ),
            Self::RiskOutOfRange(risk) => write!(f, "risk level {risk} outside [0, 100]"),
            Self::NegativeCredits(credits) => write!(f, "credits went negative: {credits}"),
            Self::InvalidShipStat { stat, value } => {
                write!(f, "ship stat {stat:?} is {value}")
            }
            Self::InvalidBaseStat { stat, value } => {
                write!(f, "base stat {stat:?} is {value}")
            }
            Self::ProgressOutOfRange { build, repair } => {
                write!(f, "progress out of range: build {build}, repair {repair}")
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}

fn in_percent_range(value: f64) -> bool {
    (0.0..=100.0).contains(&value)
}

/// Check the state-wide invariants. Runs after every [`crate::step`].
pub fn check_invariants(state: &GameState) -> Result<(), InvariantViolation> {
    let fleet = &state.fleet;
    let expected = i64::from(fleet.commissioned) - i64::from(fleet.destroyed);
    if i64::try_from(fleet.total()).ok() != Some(expected) {
        return Err(InvariantViolation::FleetMismatch {
            total: fleet.total(),
            expected,
        });
    }
    if !in_percent_range(state.risk_level) {
        return Err(InvariantViolation::RiskOutOfRange(state.risk_level));
    }
    if state.credits.is_nan() || state.credits < 0.0 {
        return Err(InvariantViolation::NegativeCredits(state.credits));
    }
    for stat in ShipStat::ALL {
        let value = state.ship_stats.get(stat);
        if !value.is_finite() || value <= 0.0 {
            return Err(InvariantViolation::InvalidShipStat { stat, value });
        }
    }
    for stat in BaseStat::ALL {
        let value = state.base_stats.get(stat);
        if !value.is_finite() || value <= 0.0 {
            return Err(InvariantViolation::InvalidBaseStat { stat, value });
        }
    }
    if !in_percent_range(state.progress.build) || !in_percent_range(state.progress.repair) {
        return Err(InvariantViolation::ProgressOutOfRange {
            build: state.progress.build,
            repair: state.progress.repair,
        });
    }
    Ok(())
}
