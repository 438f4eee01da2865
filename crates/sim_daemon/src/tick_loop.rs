use crate::state::{EventTx, SharedSim, SimState, StreamEvent};
use sim_control::CommandSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Advances the simulation by `frame_ms` of game time per wall-clock frame.
/// Returns once `max_ms` of game time has elapsed, or never if `None`.
pub async fn run_tick_loop(
    sim: SharedSim,
    event_tx: EventTx,
    frame_ms: u64,
    max_ms: Option<u64>,
    paused: Arc<AtomicBool>,
) {
    let mut interval = tokio::time::interval(Duration::from_millis(frame_ms.max(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Burst);

    loop {
        interval.tick().await;
        if paused.load(Ordering::Relaxed) {
            continue;
        }

        let (events, done) = {
            let mut guard = sim.lock();
            let events = advance_frame(&mut guard, frame_ms);
            let done = max_ms.is_some_and(|max| guard.game_state.meta.elapsed_ms >= max);
            (events, done)
        };

        if !events.is_empty() {
            // No subscribers is not an error.
            let _ = event_tx.send(events);
        }

        if done {
            tracing::info!("max game time reached, tick loop stopping");
            break;
        }
    }
}

/// One frame: player commands first, then the autopilot, then the engine.
pub fn advance_frame(sim: &mut SimState, frame_ms: u64) -> Vec<StreamEvent> {
    let SimState {
        game_state,
        content,
        rng,
        player,
        autopilot,
        next_command_id,
        event_level,
        ..
    } = sim;

    let mut commands = player.generate_commands(game_state, content, next_command_id);
    if let Some(autopilot) = autopilot {
        commands.extend(autopilot.generate_commands(game_state, content, next_command_id));
    }
    let events = sim_core::tick(game_state, &commands, content, rng, frame_ms, *event_level);

    if sim.metrics_every_ms > 0 && sim.game_state.meta.elapsed_ms >= sim.next_metrics_ms {
        let snapshot = sim_core::compute_metrics(&sim.game_state, &sim.content);
        sim.push_metrics(snapshot);
        sim.next_metrics_ms += sim.metrics_every_ms;
    }

    events
        .into_iter()
        .map(|envelope| StreamEvent {
            notification: sim_core::notification(&envelope.event, &sim.content),
            envelope,
        })
        .collect()
}
