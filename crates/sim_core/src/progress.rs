//! Build and repair progress bars.
//!
//! Both are the same machine: while ships wait in the source phase the counter
//! fills by `rate * 100 / reference_rate` per tick. At 100 exactly one ship moves
//! to idle and the counter restarts from 0. Overshoot is discarded.

use crate::{Event, EventEnvelope, EventLevel, GameContent, GameState, Process};

pub(crate) fn advance_build(
    state: &mut GameState,
    content: &GameContent,
    event_level: EventLevel,
    events: &mut Vec<EventEnvelope>,
) {
    let increment = fill_increment(
        state.base_stats.ship_production,
        content.constants.build_reference_rate,
    );
    let completed = advance_counter(
        &mut state.progress.build,
        &mut state.fleet.building,
        &mut state.fleet.idle,
        increment,
    );
    let progress = state.progress.build;
    record(state, Process::Build, completed, progress, event_level, events);
}

pub(crate) fn advance_repair(
    state: &mut GameState,
    content: &GameContent,
    event_level: EventLevel,
    events: &mut Vec<EventEnvelope>,
) {
    let increment = fill_increment(
        state.base_stats.healing,
        content.constants.repair_reference_rate,
    );
    let completed = advance_counter(
        &mut state.progress.repair,
        &mut state.fleet.repairing,
        &mut state.fleet.idle,
        increment,
    );
    let progress = state.progress.repair;
    record(state, Process::Repair, completed, progress, event_level, events);
}

fn fill_increment(rate: f64, reference_rate: f64) -> f64 {
    if reference_rate > 0.0 {
        rate * 100.0 / reference_rate
    } else {
        100.0
    }
}

/// Returns `Some(true)` when a ship completed, `Some(false)` when the counter
/// only advanced, `None` when nothing is waiting.
fn advance_counter(
    counter: &mut f64,
    waiting: &mut u32,
    idle: &mut u32,
    increment: f64,
) -> Option<bool> {
    if *waiting == 0 {
        *counter = 0.0;
        return None;
    }
    *counter = (*counter + increment).min(100.0);
    if *counter < 100.0 {
        return Some(false);
    }
    *waiting -= 1;
    *idle += 1;
    *counter = 0.0;
    Some(true)
}

fn record(
    state: &mut GameState,
    process: Process,
    completed: Option<bool>,
    progress: f64,
    event_level: EventLevel,
    events: &mut Vec<EventEnvelope>,
) {
    let event = match (completed, event_level) {
        (Some(true), _) if process == Process::Build => Event::ShipBuilt,
        (Some(true), _) => Event::ShipRepaired,
        (Some(false), EventLevel::Debug) => Event::ProgressAdvanced { process, progress },
        _ => return,
    };
    events.push(crate::emit(&mut state.counters, state.meta.tick, event));
}
