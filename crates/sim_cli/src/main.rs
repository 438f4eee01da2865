use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_control::{AutopilotController, CommandSource};
use sim_core::{EventLevel, GameContent, GameState, MetricsFileWriter, Severity};
use sim_world::{apply_overrides, build_initial_state, default_content, load_content, parse_set_args};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "sim_cli", about = "Asteroid mining sim CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation headless under the autopilot for a span of game time.
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Simulated seconds to run.
    #[arg(long)]
    seconds: u64,
    /// Simulated milliseconds per frame.
    #[arg(long, default_value_t = 100)]
    step_ms: u64,
    #[arg(long)]
    seed: Option<u64>,
    /// Load content from this directory instead of the built-in content.
    #[arg(long)]
    content_dir: Option<String>,
    #[arg(long, default_value_t = 60)]
    print_every_secs: u64,
    /// Sample metrics every N simulated seconds.
    #[arg(long, default_value_t = 10)]
    metrics_every_secs: u64,
    /// Disable automatic metrics collection to runs/ directory.
    #[arg(long)]
    no_metrics: bool,
    #[arg(long, default_value = "normal", value_parser = ["normal", "debug"])]
    event_level: String,
    /// Override a constant, e.g. `--set market_volatility=0.2`. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,
}

impl RunArgs {
    fn event_level(&self) -> EventLevel {
        match self.event_level.as_str() {
            "debug" => EventLevel::Debug,
            _ => EventLevel::Normal,
        }
    }
}

// ---------------------------------------------------------------------------
// Run setup
// ---------------------------------------------------------------------------

fn generate_run_id(seed: u64) -> String {
    let started = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    format!("{started}_seed{seed}")
}

fn create_run_dir(run_id: &str) -> Result<std::path::PathBuf> {
    let dir = std::path::PathBuf::from("runs").join(run_id);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating run directory: {}", dir.display()))?;
    Ok(dir)
}

fn write_run_info(
    dir: &std::path::Path,
    run_id: &str,
    seed: u64,
    content_version: &str,
    args: &RunArgs,
) -> Result<()> {
    let info = serde_json::json!({
        "run_id": run_id,
        "seed": seed,
        "content_version": content_version,
        "metrics_every_secs": args.metrics_every_secs,
        "runner": "sim_cli",
        "args": {
            "seconds": args.seconds,
            "step_ms": args.step_ms,
            "print_every_secs": args.print_every_secs,
            "overrides": args.overrides,
        }
    });
    let path = dir.join("run_info.json");
    let file =
        std::fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, &info)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn resolve_content(args: &RunArgs) -> Result<GameContent> {
    let mut content = match &args.content_dir {
        Some(dir) => load_content(dir)?,
        None => default_content()?,
    };
    if !args.overrides.is_empty() {
        let overrides = parse_set_args(&args.overrides)?;
        apply_overrides(&mut content.constants, &overrides).context("applying --set overrides")?;
        info!(count = overrides.len(), "applied constant overrides");
    }
    Ok(content)
}

fn open_metrics(
    args: &RunArgs,
    state: &GameState,
    content: &GameContent,
) -> Result<Option<MetricsFileWriter>> {
    if args.no_metrics {
        return Ok(None);
    }
    let run_id = generate_run_id(state.meta.seed);
    let run_dir = create_run_dir(&run_id)?;
    write_run_info(&run_dir, &run_id, state.meta.seed, &content.content_version, args)?;
    let writer = MetricsFileWriter::new(run_dir.clone())
        .with_context(|| format!("opening metrics CSV in {}", run_dir.display()))?;
    println!("Run directory: {}", run_dir.display());
    Ok(Some(writer))
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

fn run(args: &RunArgs) -> Result<()> {
    if args.step_ms == 0 {
        bail!("--step-ms must be positive");
    }
    let content = resolve_content(args)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut state = build_initial_state(&content, seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut metrics_writer = open_metrics(args, &state, &content)?;
    let event_level = args.event_level();

    let mut autopilot = AutopilotController::new();
    let mut next_command_id = 0u64;
    let end_ms = args.seconds.saturating_mul(1000);
    let print_every_ms = args.print_every_secs.max(1) * 1000;
    let metrics_every_ms = args.metrics_every_secs.max(1) * 1000;
    let mut next_print_ms = print_every_ms;
    let mut next_metrics_ms = metrics_every_ms;

    info!(
        seed,
        seconds = args.seconds,
        step_ms = args.step_ms,
        content_version = %content.content_version,
        "starting simulation"
    );
    println!("{}", "-".repeat(80));

    while state.meta.elapsed_ms < end_ms {
        let commands = autopilot.generate_commands(&state, &content, &mut next_command_id);
        let frame_ms = args.step_ms.min(end_ms - state.meta.elapsed_ms);
        let events = sim_core::tick(&mut state, &commands, &content, &mut rng, frame_ms, event_level);

        for event in &events {
            if let Some(note) = sim_core::notification(&event.event, &content) {
                println!(
                    "{} {:<7} {}",
                    format_clock(state.meta.elapsed_ms),
                    severity_tag(note.severity),
                    note.message
                );
            }
        }

        if state.meta.elapsed_ms >= next_print_ms {
            print_status(&state, &content);
            next_print_ms += print_every_ms;
        }

        if let Some(ref mut writer) = metrics_writer {
            if state.meta.elapsed_ms >= next_metrics_ms {
                let snapshot = sim_core::compute_metrics(&state, &content);
                writer.write_row(&snapshot).context("writing metrics row")?;
                next_metrics_ms += metrics_every_ms;
            }
        }
    }

    println!("{}", "-".repeat(80));
    println!("Done. Final state after {} frames:", state.meta.tick);
    print_status(&state, &content);

    if let Some(ref mut writer) = metrics_writer {
        writer.flush().context("final metrics flush")?;
        println!("Metrics written to runs/ directory.");
    }
    info!(frames = state.meta.tick, "simulation finished");

    Ok(())
}

fn format_clock(elapsed_ms: u64) -> String {
    let secs = elapsed_ms / 1000;
    format!("[{:02}:{:02}:{:02}]", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => "OK",
        Severity::Warning => "WARN",
        Severity::Error => "ALERT",
        Severity::Info => "INFO",
    }
}

fn print_status(state: &GameState, content: &GameContent) {
    let metrics = sim_core::compute_metrics(state, content);
    println!(
        "{clock}  ships={total} (idle={idle} mining={mining} returning={returning} \
         repairing={repairing} building={building} lost={lost})  \
         credits={credits:.1}  raw={raw}  refined={refined}  \
         risk={risk:.1}%  market={market:.3}",
        clock = format_clock(state.meta.elapsed_ms),
        total = metrics.fleet_total,
        idle = metrics.fleet_idle,
        mining = metrics.fleet_mining,
        returning = metrics.fleet_returning,
        repairing = metrics.fleet_repairing,
        building = metrics.fleet_building,
        lost = metrics.ships_destroyed,
        credits = metrics.credits,
        raw = metrics.raw_units,
        refined = metrics.refined_units,
        risk = metrics.risk_level,
        market = metrics.market_index,
    );
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(&args)?,
    }
    Ok(())
}
