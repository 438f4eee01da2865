use parking_lot::Mutex;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use sim_control::{AutopilotController, CommandQueue};
use sim_core::{EventEnvelope, EventLevel, GameContent, GameState, MetricsSnapshot, Notification};
use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Metrics samples kept in memory for `/api/v1/metrics`.
pub const METRICS_HISTORY_CAP: usize = 720;

pub struct SimState {
    pub game_state: GameState,
    pub content: GameContent,
    pub rng: ChaCha8Rng,
    /// Commands submitted over HTTP, applied on the next frame.
    pub player: CommandQueue,
    pub autopilot: Option<AutopilotController>,
    pub next_command_id: u64,
    pub event_level: EventLevel,
    pub metrics_every_ms: u64,
    pub next_metrics_ms: u64,
    pub metrics_history: VecDeque<MetricsSnapshot>,
}

impl SimState {
    pub fn new(
        game_state: GameState,
        content: GameContent,
        rng: ChaCha8Rng,
        autopilot: bool,
        metrics_every_ms: u64,
    ) -> Self {
        Self {
            game_state,
            content,
            rng,
            player: CommandQueue::default(),
            autopilot: autopilot.then(AutopilotController::new),
            next_command_id: 0,
            event_level: EventLevel::Normal,
            metrics_every_ms,
            next_metrics_ms: metrics_every_ms,
            metrics_history: VecDeque::new(),
        }
    }

    pub fn clock(&self) -> Clock {
        Clock {
            tick: self.game_state.meta.tick,
            elapsed_ms: self.game_state.meta.elapsed_ms,
        }
    }

    pub fn push_metrics(&mut self, snapshot: MetricsSnapshot) {
        if self.metrics_history.len() >= METRICS_HISTORY_CAP {
            self.metrics_history.pop_front();
        }
        self.metrics_history.push_back(snapshot);
    }
}

/// Game-time position, sent as the stream heartbeat and embedded in `/api/v1/meta`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Clock {
    pub tick: u64,
    pub elapsed_ms: u64,
}

/// An event as pushed to stream subscribers, with its player-facing message if any.
#[derive(Debug, Clone, Serialize)]
pub struct StreamEvent {
    #[serde(flatten)]
    pub envelope: EventEnvelope,
    pub notification: Option<Notification>,
}

pub type SharedSim = Arc<Mutex<SimState>>;
pub type EventTx = broadcast::Sender<Vec<StreamEvent>>;

#[derive(Clone)]
pub struct AppState {
    pub sim: SharedSim,
    pub event_tx: EventTx,
    pub frame_ms: u64,
    pub paused: Arc<AtomicBool>,
}
