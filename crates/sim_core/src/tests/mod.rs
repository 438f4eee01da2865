use super::*;
use crate::test_fixtures::{base_content, base_state, make_rng, minimal_content};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

mod commands;
mod upgrades;

// --- Shared test helpers ------------------------------------------------

fn test_content() -> GameContent {
    base_content()
}

fn test_state(content: &GameContent) -> GameState {
    base_state(content)
}

fn mineral(id: &str) -> MineralId {
    MineralId(id.to_string())
}

fn envelope(state: &GameState, command: Command) -> CommandEnvelope {
    let id = CommandId(format!("cmd_{:06}", state.meta.tick));
    CommandEnvelope {
        id,
        issued_tick: state.meta.tick,
        execute_at_tick: state.meta.tick,
        command,
    }
}

/// Apply one command through the transition function.
fn apply(state: &mut GameState, content: &GameContent, command: Command) -> Vec<EventEnvelope> {
    let mut rng = make_rng();
    step(
        state,
        &Input::Command(command),
        content,
        &mut rng,
        EventLevel::Normal,
    )
}

/// Fire one process tick through the transition function.
fn fire(
    state: &mut GameState,
    content: &GameContent,
    rng: &mut ChaCha8Rng,
    process: Process,
) -> Vec<EventEnvelope> {
    step(state, &Input::Tick(process), content, rng, EventLevel::Normal)
}

/// State with `count` ships moved from idle to mining (extra ships commissioned as needed).
fn state_with_miners(content: &GameContent, count: u32) -> GameState {
    let mut state = test_state(content);
    state.fleet = FleetState {
        mining: count,
        commissioned: count,
        ..FleetState::default()
    };
    state
}

fn has_event(events: &[EventEnvelope], pred: impl Fn(&Event) -> bool) -> bool {
    events.iter().any(|e| pred(&e.event))
}
