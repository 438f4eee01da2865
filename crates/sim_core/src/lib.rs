//! `sim_core`: deterministic asteroid-mining simulation.
//!
//! No IO, no network. All randomness via the passed-in Rng. Every mutation
//! goes through [`step`], one input at a time.

mod commands;
mod engine;
mod invariants;
mod market;
pub mod metrics;
mod mining;
mod notify;
mod progress;
mod refinery;
mod types;
mod upgrades;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

pub use engine::{is_active, process_interval_ms, step, tick, transition};
pub use invariants::{check_invariants, InvariantViolation};
pub use market::market_index;
pub use metrics::{compute_metrics, MetricsFileWriter, MetricsSnapshot};
pub use mining::{attack_damage, discovery_yield, ships_hit};
pub use notify::{notification, Notification, Severity};
pub use types::*;
pub use upgrades::{can_afford, can_afford_base_upgrade, can_afford_ship_upgrade};

pub(crate) fn emit(counters: &mut Counters, tick: u64, event: Event) -> EventEnvelope {
    let id = EventId(format!("evt_{:06}", counters.next_event_id));
    counters.next_event_id += 1;
    EventEnvelope { id, tick, event }
}

#[cfg(test)]
mod tests;
