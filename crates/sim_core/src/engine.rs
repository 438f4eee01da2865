use rand::Rng;
use tracing::debug;

use crate::{
    CommandEnvelope, EventEnvelope, EventLevel, GameContent, GameState, Input, MiningIntervalStat,
    Process,
};

/// Advance the simulation by one frame of `elapsed_ms` wall-clock time.
///
/// Order of operations:
/// 1. Apply commands scheduled for this frame.
/// 2. Advance each periodic process timer (mining, build, repair, refinery,
///    market) and fire it once per whole interval elapsed.
/// 3. Increment the frame counter.
///
/// Returns all events produced this frame.
pub fn tick(
    state: &mut GameState,
    commands: &[CommandEnvelope],
    content: &GameContent,
    rng: &mut impl Rng,
    elapsed_ms: u64,
    event_level: EventLevel,
) -> Vec<EventEnvelope> {
    let mut events = Vec::new();
    let current_tick = state.meta.tick;

    for envelope in commands {
        if envelope.execute_at_tick != current_tick {
            continue;
        }
        let input = Input::Command(envelope.command.clone());
        events.extend(step(state, &input, content, rng, event_level));
    }

    for process in Process::ALL {
        advance_process(state, process, content, rng, elapsed_ms, event_level, &mut events);
    }

    state.meta.elapsed_ms += elapsed_ms;
    state.meta.tick += 1;
    events
}

/// Apply a single input to the state. This is the only mutation path.
///
/// Rejected commands leave the state untouched and return no events.
pub fn step(
    state: &mut GameState,
    input: &Input,
    content: &GameContent,
    rng: &mut impl Rng,
    event_level: EventLevel,
) -> Vec<EventEnvelope> {
    let mut events = Vec::new();
    match input {
        Input::Command(command) => {
            crate::commands::apply_command(state, command, content, &mut events);
        }
        Input::Tick(process) => {
            fire_process(state, *process, content, rng, event_level, &mut events);
        }
    }

    let checked = crate::check_invariants(state);
    debug_assert!(checked.is_ok(), "after {input:?}: {checked:?}");
    events
}

/// By-value form of [`step`]: `(state, input) -> (state', events)`.
pub fn transition(
    mut state: GameState,
    input: &Input,
    content: &GameContent,
    rng: &mut impl Rng,
    event_level: EventLevel,
) -> (GameState, Vec<EventEnvelope>) {
    let events = step(&mut state, input, content, rng, event_level);
    (state, events)
}

/// Whether a periodic process currently has a running timer.
pub fn is_active(state: &GameState, process: Process) -> bool {
    match process {
        Process::Mining => state.fleet.mining + state.fleet.returning > 0,
        Process::Build => state.fleet.building > 0,
        Process::Repair => state.fleet.repairing > 0,
        Process::Refinery => state.refine_targets.values().any(|pct| *pct > 0.0),
        Process::Market => true,
    }
}

/// Current firing interval of a process in milliseconds. Never zero.
pub fn process_interval_ms(state: &GameState, process: Process, content: &GameContent) -> u64 {
    let constants = &content.constants;
    let interval = match process {
        Process::Mining => {
            let gate = match constants.mining_interval_stat {
                MiningIntervalStat::ShipProduction => state.base_stats.ship_production,
                MiningIntervalStat::Speed => state.ship_stats.speed,
            };
            divide_ms(constants.base_mining_tick_ms, gate)
        }
        Process::Build | Process::Repair => constants.progress_tick_ms,
        Process::Refinery => divide_ms(constants.base_refine_ms, state.base_stats.refining_speed),
        Process::Market => constants.market_tick_ms,
    };
    interval.max(1)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn divide_ms(base_ms: u64, rate: f64) -> u64 {
    if rate.is_finite() && rate > 0.0 {
        (base_ms as f64 / rate).round() as u64
    } else {
        base_ms
    }
}

fn advance_process(
    state: &mut GameState,
    process: Process,
    content: &GameContent,
    rng: &mut impl Rng,
    elapsed_ms: u64,
    event_level: EventLevel,
    events: &mut Vec<EventEnvelope>,
) {
    if !is_active(state, process) {
        *state.timers.slot(process) = 0;
        return;
    }
    *state.timers.slot(process) += elapsed_ms;

    // The interval is re-read each firing: an upgrade bought mid-frame applies
    // to the next interval, and a process that goes idle stops firing.
    while is_active(state, process) {
        let interval = process_interval_ms(state, process, content);
        let accumulated = *state.timers.slot(process);
        if accumulated < interval {
            break;
        }
        *state.timers.slot(process) = accumulated - interval;
        debug!(?process, tick = state.meta.tick, "process fired");
        events.extend(step(state, &Input::Tick(process), content, rng, event_level));
    }

    if !is_active(state, process) {
        *state.timers.slot(process) = 0;
    }
}

fn fire_process(
    state: &mut GameState,
    process: Process,
    content: &GameContent,
    rng: &mut impl Rng,
    event_level: EventLevel,
    events: &mut Vec<EventEnvelope>,
) {
    match process {
        Process::Mining => crate::mining::resolve_mining_tick(state, content, rng, events),
        Process::Build => crate::progress::advance_build(state, content, event_level, events),
        Process::Repair => crate::progress::advance_repair(state, content, event_level, events),
        Process::Refinery => crate::refinery::auto_refine(state, content, events),
        Process::Market => crate::market::update_prices(state, content, rng, event_level, events),
    }
}
