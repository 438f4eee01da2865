//! Content loading and initial-state construction shared between sim_cli and sim_daemon.

mod overrides;

pub use overrides::{apply_overrides, parse_set_args};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use sim_core::{
    BaseStat, BaseStats, Constants, Counters, FleetState, GameContent, GameState, Inventory,
    MarketState, MetaState, MineralDef, MineralId, PriceHistory, ProgressCounters, Rarity,
    ShipStat, ShipStats, TimerState, UpgradeDef,
};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const DEFAULT_MINERALS: &str = include_str!("../../../content/minerals.json");
const DEFAULT_UPGRADES: &str = include_str!("../../../content/upgrades.json");
const DEFAULT_CONSTANTS: &str = include_str!("../../../content/constants.json");

#[derive(Deserialize)]
struct MineralsFile {
    content_version: String,
    minerals: Vec<MineralDef>,
}

#[derive(Deserialize)]
struct UpgradesFile {
    initial_ship_stats: ShipStats,
    ship_upgrades: BTreeMap<ShipStat, UpgradeDef>,
    base_upgrades: BTreeMap<BaseStat, UpgradeDef>,
}

/// Validates loaded content, panicking on any authoring error.
///
/// Catches mistakes like: a duplicate mineral id, a discovery chance outside
/// [0, 1], or an upgrade cost naming a mineral the catalog does not have.
pub fn validate_content(content: &GameContent) {
    let mut mineral_ids: HashSet<&MineralId> = HashSet::new();
    for mineral in &content.minerals {
        assert!(
            !mineral.id.0.is_empty(),
            "mineral '{}' has an empty id",
            mineral.name
        );
        assert!(
            mineral_ids.insert(&mineral.id),
            "mineral id '{}' is defined more than once",
            mineral.id
        );
        assert!(
            (0.0..=1.0).contains(&mineral.discovery_chance),
            "mineral '{}' discovery_chance {} is outside [0, 1]",
            mineral.id,
            mineral.discovery_chance
        );
        assert!(
            mineral.base_value > 0.0,
            "mineral '{}' has non-positive base_value {}",
            mineral.id,
            mineral.base_value
        );
    }

    let junk_entries = content
        .minerals
        .iter()
        .filter(|m| m.rarity == Rarity::Junk)
        .count();
    assert!(
        junk_entries <= 1,
        "catalog has {junk_entries} junk minerals, at most one is allowed"
    );

    let upgrade_tables = content
        .ship_upgrades
        .iter()
        .map(|(stat, def)| (stat.label(), def))
        .chain(
            content
                .base_upgrades
                .iter()
                .map(|(stat, def)| (stat.label(), def)),
        );
    for (label, def) in upgrade_tables {
        assert!(
            def.multiplier.is_finite() && def.multiplier > 0.0,
            "upgrade '{label}' has non-positive multiplier {}",
            def.multiplier
        );
        for mineral in def.costs.keys() {
            assert!(
                mineral_ids.contains(mineral),
                "upgrade '{label}' cost '{mineral}' is not a known mineral"
            );
        }
    }

    for stat in ShipStat::ALL {
        let value = content.initial_ship_stats.get(stat);
        assert!(
            value.is_finite() && value > 0.0,
            "initial ship stat '{}' must be positive, got {value}",
            stat.label()
        );
    }

    if let Err(err) = check_constants(&content.constants) {
        panic!("{err}");
    }
}

/// Range checks on the tunable constants. Shared by content loading and
/// `--set` overrides, which run after the files have been validated.
pub(crate) fn check_constants(c: &Constants) -> Result<()> {
    for (name, interval) in [
        ("base_mining_tick_ms", c.base_mining_tick_ms),
        ("progress_tick_ms", c.progress_tick_ms),
        ("market_tick_ms", c.market_tick_ms),
        ("base_refine_ms", c.base_refine_ms),
    ] {
        ensure!(interval > 0, "constant '{name}' must be a positive interval");
    }
    for (name, chance) in [
        ("junk_chance", c.junk_chance),
        ("base_hit_rate", c.base_hit_rate),
        ("market_floor_ratio", c.market_floor_ratio),
        ("market_volatility", c.market_volatility),
        ("market_reversion", c.market_reversion),
    ] {
        ensure!(
            (0.0..=1.0).contains(&chance),
            "constant '{name}' {chance} is outside [0, 1]"
        );
    }
    for (name, value) in [
        ("units_per_discovery", c.units_per_discovery),
        ("reference_mining_capacity", c.reference_mining_capacity),
        ("build_reference_rate", c.build_reference_rate),
        ("repair_reference_rate", c.repair_reference_rate),
        ("max_defense", c.max_defense),
    ] {
        ensure!(
            value.is_finite() && value > 0.0,
            "constant '{name}' must be positive, got {value}"
        );
    }
    for (name, value) in [
        ("base_danger_increase", c.base_danger_increase),
        ("base_damage", c.base_damage),
        ("lethal_damage_threshold", c.lethal_damage_threshold),
        ("ship_cost", c.ship_cost),
        ("initial_credits", c.initial_credits),
    ] {
        ensure!(
            value.is_finite() && value >= 0.0,
            "constant '{name}' must not be negative, got {value}"
        );
    }
    ensure!(
        (0.0..=100.0).contains(&c.risk_warning_threshold),
        "constant 'risk_warning_threshold' {} is outside [0, 100]",
        c.risk_warning_threshold
    );
    Ok(())
}

fn parse_content(minerals: &str, upgrades: &str, constants: &str) -> Result<GameContent> {
    let minerals_file: MineralsFile =
        serde_json::from_str(minerals).context("parsing minerals.json")?;
    let upgrades_file: UpgradesFile =
        serde_json::from_str(upgrades).context("parsing upgrades.json")?;
    let constants: Constants = serde_json::from_str(constants).context("parsing constants.json")?;
    let content = GameContent {
        content_version: minerals_file.content_version,
        minerals: minerals_file.minerals,
        ship_upgrades: upgrades_file.ship_upgrades,
        base_upgrades: upgrades_file.base_upgrades,
        initial_ship_stats: upgrades_file.initial_ship_stats,
        constants,
    };
    validate_content(&content);
    Ok(content)
}

pub fn load_content(content_dir: &str) -> Result<GameContent> {
    let dir = Path::new(content_dir);
    let minerals =
        std::fs::read_to_string(dir.join("minerals.json")).context("reading minerals.json")?;
    let upgrades =
        std::fs::read_to_string(dir.join("upgrades.json")).context("reading upgrades.json")?;
    let constants =
        std::fs::read_to_string(dir.join("constants.json")).context("reading constants.json")?;
    parse_content(&minerals, &upgrades, &constants)
        .with_context(|| format!("loading content from {content_dir}"))
}

/// The content files compiled into the binary.
pub fn default_content() -> Result<GameContent> {
    parse_content(DEFAULT_MINERALS, DEFAULT_UPGRADES, DEFAULT_CONSTANTS)
        .context("loading built-in content")
}

pub fn build_initial_state(content: &GameContent, seed: u64) -> GameState {
    let c = &content.constants;
    let prices = content
        .minerals
        .iter()
        .map(|m| (m.id.clone(), PriceHistory::opening(m.base_value)))
        .collect();
    GameState {
        meta: MetaState {
            tick: 0,
            elapsed_ms: 0,
            seed,
            schema_version: 1,
            content_version: content.content_version.clone(),
        },
        fleet: FleetState {
            idle: c.initial_idle_ships,
            commissioned: c.initial_idle_ships,
            ..FleetState::default()
        },
        ship_stats: content.initial_ship_stats.clone(),
        base_stats: BaseStats::default(),
        inventory: Inventory::default(),
        credits: c.initial_credits,
        risk_level: 0.0,
        progress: ProgressCounters::default(),
        market: MarketState { prices },
        refine_targets: BTreeMap::new(),
        timers: TimerState::default(),
        counters: Counters::default(),
    }
}
