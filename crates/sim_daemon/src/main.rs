mod routes;
mod state;
mod tick_loop;

use anyhow::{bail, Context, Result};
use axum::http::HeaderValue;
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use routes::make_router_with_cors;
use sim_world::{apply_overrides, build_initial_state, default_content, load_content, parse_set_args};
use state::{AppState, SimState};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tick_loop::run_tick_loop;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sim_daemon", about = "Real-time asteroid mining sim daemon")]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    /// Load content from this directory instead of the built-in content.
    #[arg(long)]
    content_dir: Option<String>,
    /// Wall-clock and game-time milliseconds per frame.
    #[arg(long, default_value_t = 100)]
    frame_ms: u64,
    #[arg(long, default_value_t = 3001)]
    port: u16,
    #[arg(long, default_value = "http://localhost:5173")]
    cors_origin: String,
    /// Let the autopilot play alongside submitted commands.
    #[arg(long)]
    autopilot: bool,
    /// Stop advancing after this many seconds of game time.
    #[arg(long)]
    max_seconds: Option<u64>,
    /// Sample metrics every N game seconds. 0 disables.
    #[arg(long, default_value_t = 5)]
    metrics_every_secs: u64,
    /// Override a constant, e.g. `--set junk_chance=0.2`. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sim_daemon=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    if cli.frame_ms == 0 {
        bail!("--frame-ms must be positive");
    }
    let cors_origin: HeaderValue = cli
        .cors_origin
        .parse()
        .with_context(|| format!("invalid --cors-origin '{}'", cli.cors_origin))?;

    let mut content = match &cli.content_dir {
        Some(dir) => load_content(dir)?,
        None => default_content()?,
    };
    if !cli.overrides.is_empty() {
        let overrides = parse_set_args(&cli.overrides)?;
        apply_overrides(&mut content.constants, &overrides).context("applying --set overrides")?;
    }

    let seed = cli.seed.unwrap_or_else(rand::random);
    let game_state = build_initial_state(&content, seed);
    let rng = ChaCha8Rng::seed_from_u64(seed);
    tracing::info!(
        seed,
        content_version = %content.content_version,
        autopilot = cli.autopilot,
        "simulation initialised"
    );

    let sim = Arc::new(parking_lot::Mutex::new(SimState::new(
        game_state,
        content,
        rng,
        cli.autopilot,
        cli.metrics_every_secs.saturating_mul(1000),
    )));
    let (event_tx, _) = tokio::sync::broadcast::channel(256);
    let paused = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        sim: sim.clone(),
        event_tx: event_tx.clone(),
        frame_ms: cli.frame_ms,
        paused: paused.clone(),
    };

    let max_ms = cli.max_seconds.map(|s| s.saturating_mul(1000));
    tokio::spawn(run_tick_loop(sim, event_tx, cli.frame_ms, max_ms, paused));

    let app = make_router_with_cors(app_state, cors_origin);
    let addr = format!("0.0.0.0:{}", cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("listening on http://{addr}");
    axum::serve(listener, app).await.context("serving HTTP")?;
    Ok(())
}
