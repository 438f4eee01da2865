//! Snapshot metrics computed from `GameState`.
//!
//! A single `compute_metrics(&GameState, &GameContent) -> MetricsSnapshot` function
//! samples the current state for time-series analysis. No state mutation, no IO
//! apart from the CSV writers at the bottom.

use std::io::Write;

use serde::Serialize;

use crate::{GameContent, GameState, Rarity};

/// Current schema version. Bump when fields are added/removed/reordered.
const METRICS_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub tick: u64,
    pub elapsed_ms: u64,
    pub metrics_version: u32,

    // Fleet
    pub fleet_total: u64,
    pub fleet_idle: u32,
    pub fleet_mining: u32,
    pub fleet_returning: u32,
    pub fleet_repairing: u32,
    pub fleet_building: u32,
    pub ships_destroyed: u32,

    // Economy
    pub credits: f64,
    pub raw_units: u64,
    pub refined_units: u64,
    pub junk_units: u64,
    pub market_index: f64,

    // Risk
    pub risk_level: f64,
    pub attacks: u64,
    pub mining_ticks: u64,

    // Progress
    pub build_progress: f64,
    pub repair_progress: f64,

    // Stats
    pub mining_capacity: f64,
    pub ship_production: f64,
}

#[derive(Default)]
struct InventoryTotals {
    raw: u64,
    refined: u64,
    junk: u64,
}

impl InventoryTotals {
    fn collect(state: &GameState, content: &GameContent) -> Self {
        let mut totals = Self::default();
        for mineral in &content.minerals {
            let raw = state.inventory.raw_of(&mineral.id);
            if mineral.rarity == Rarity::Junk {
                totals.junk += raw;
            } else {
                totals.raw += raw;
            }
            totals.refined += state.inventory.refined_of(&mineral.id);
        }
        totals
    }
}

pub fn compute_metrics(state: &GameState, content: &GameContent) -> MetricsSnapshot {
    let totals = InventoryTotals::collect(state, content);
    let fleet = &state.fleet;

    MetricsSnapshot {
        tick: state.meta.tick,
        elapsed_ms: state.meta.elapsed_ms,
        metrics_version: METRICS_VERSION,
        fleet_total: fleet.total(),
        fleet_idle: fleet.idle,
        fleet_mining: fleet.mining,
        fleet_returning: fleet.returning,
        fleet_repairing: fleet.repairing,
        fleet_building: fleet.building,
        ships_destroyed: fleet.destroyed,
        credits: state.credits,
        raw_units: totals.raw,
        refined_units: totals.refined,
        junk_units: totals.junk,
        market_index: crate::market_index(state, content),
        risk_level: state.risk_level,
        attacks: state.counters.attacks,
        mining_ticks: state.counters.mining_ticks,
        build_progress: state.progress.build,
        repair_progress: state.progress.repair,
        mining_capacity: state.ship_stats.mining_capacity,
        ship_production: state.base_stats.ship_production,
    }
}

/// Write the CSV header row for metrics.
pub fn write_metrics_header(writer: &mut impl std::io::Write) -> std::io::Result<()> {
    writeln!(
        writer,
        "tick,elapsed_ms,metrics_version,\
         fleet_total,fleet_idle,fleet_mining,fleet_returning,fleet_repairing,fleet_building,ships_destroyed,\
         credits,raw_units,refined_units,junk_units,market_index,\
         risk_level,attacks,mining_ticks,\
         build_progress,repair_progress,\
         mining_capacity,ship_production"
    )
}

/// Append a single metrics snapshot as a CSV row.
pub fn append_metrics_row(
    writer: &mut impl std::io::Write,
    snapshot: &MetricsSnapshot,
) -> std::io::Result<()> {
    writeln!(
        writer,
        "{},{},{},{},{},{},{},{},{},{},{:.2},{},{},{},{:.4},{:.2},{},{},{:.1},{:.1},{:.4},{:.4}",
        snapshot.tick,
        snapshot.elapsed_ms,
        snapshot.metrics_version,
        snapshot.fleet_total,
        snapshot.fleet_idle,
        snapshot.fleet_mining,
        snapshot.fleet_returning,
        snapshot.fleet_repairing,
        snapshot.fleet_building,
        snapshot.ships_destroyed,
        snapshot.credits,
        snapshot.raw_units,
        snapshot.refined_units,
        snapshot.junk_units,
        snapshot.market_index,
        snapshot.risk_level,
        snapshot.attacks,
        snapshot.mining_ticks,
        snapshot.build_progress,
        snapshot.repair_progress,
        snapshot.mining_capacity,
        snapshot.ship_production,
    )
}

/// Maximum data rows per CSV file before rotating to a new file.
const MAX_ROWS_PER_FILE: usize = 50_000;

/// Rotating metrics CSV writer. Splits into numbered files
/// (`metrics_000.csv`, `metrics_001.csv`, ...) after [`MAX_ROWS_PER_FILE`] rows each.
pub struct MetricsFileWriter {
    run_dir: std::path::PathBuf,
    file_index: u32,
    rows_in_current_file: usize,
    writer: std::io::BufWriter<std::fs::File>,
}

impl MetricsFileWriter {
    /// Create a new writer, opening the first CSV file with a header row.
    pub fn new(run_dir: std::path::PathBuf) -> std::io::Result<Self> {
        let writer = open_csv_file(&run_dir, 0)?;
        Ok(Self {
            run_dir,
            file_index: 0,
            rows_in_current_file: 0,
            writer,
        })
    }

    /// Append one snapshot row, rotating to a new file if the current one is full.
    pub fn write_row(&mut self, snapshot: &MetricsSnapshot) -> std::io::Result<()> {
        if self.rows_in_current_file >= MAX_ROWS_PER_FILE {
            self.writer.flush()?;
            self.file_index += 1;
            self.writer = open_csv_file(&self.run_dir, self.file_index)?;
            self.rows_in_current_file = 0;
        }
        append_metrics_row(&mut self.writer, snapshot)?;
        self.rows_in_current_file += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

fn open_csv_file(
    run_dir: &std::path::Path,
    index: u32,
) -> std::io::Result<std::io::BufWriter<std::fs::File>> {
    let path = run_dir.join(format!("metrics_{index:03}.csv"));
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write_metrics_header(&mut writer)?;
    Ok(writer)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
