//! Shared test fixtures for sim_core and downstream crates.
//!
//! `base_content()` mirrors the shipped default content (full catalog, upgrade
//! tables, default constants). `minimal_content()` has a single guaranteed
//! mineral plus junk, with junk rolls disabled, so yields are exact.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    BaseStat, BaseStats, Constants, Counters, FleetState, GameContent, GameState, Inventory,
    MarketState, MetaState, MineralDef, MineralId, MiningIntervalStat, PriceHistory,
    ProgressCounters, Rarity, ShipStat, ShipStats, TimerState, UpgradeDef,
};

fn mineral(id: &str, name: &str, rarity: Rarity, chance: f64, value: f64) -> MineralDef {
    MineralDef {
        id: MineralId(id.to_string()),
        name: name.to_string(),
        rarity,
        discovery_chance: chance,
        base_value: value,
    }
}

fn upgrade(multiplier: f64, costs: &[(&str, u64)]) -> UpgradeDef {
    UpgradeDef {
        multiplier,
        costs: costs
            .iter()
            .map(|(id, amount)| (MineralId((*id).to_string()), *amount))
            .collect(),
    }
}

pub fn default_constants() -> Constants {
    Constants {
        base_mining_tick_ms: 5000,
        mining_interval_stat: MiningIntervalStat::ShipProduction,
        units_per_discovery: 10.0,
        reference_mining_capacity: 100.0,
        junk_chance: 0.4,
        base_danger_increase: 0.1,
        risk_warning_threshold: 75.0,
        base_hit_rate: 0.3,
        base_damage: 1.5,
        max_defense: 100.0,
        lethal_damage_threshold: 1.0,
        lethal_attacks: false,
        returning_phase: true,
        ship_cost: 100.0,
        progress_tick_ms: 1000,
        build_reference_rate: 10.0,
        repair_reference_rate: 10.0,
        market_tick_ms: 5000,
        market_volatility: 0.1,
        market_reversion: 0.1,
        market_floor_ratio: 0.1,
        base_refine_ms: 2000,
        initial_idle_ships: 1,
        initial_credits: 0.0,
    }
}

/// Full catalog, upgrade tables and default constants.
pub fn base_content() -> GameContent {
    GameContent {
        content_version: "test".to_string(),
        minerals: vec![
            mineral("ferrox", "Ferrox", Rarity::Common, 0.1, 10.0),
            mineral("silicor", "Silicor", Rarity::Common, 0.1, 12.0),
            mineral("ionite", "Ionite", Rarity::Uncommon, 0.05, 25.0),
            mineral("tritum_spark", "Tritum Spark", Rarity::Uncommon, 0.05, 30.0),
            mineral("celestium", "Celestium", Rarity::Rare, 0.02, 50.0),
            mineral("crystite", "Crystite", Rarity::Rare, 0.02, 55.0),
            mineral("xotheneium", "Xotheneium", Rarity::ExtremelyRare, 0.001, 200.0),
            mineral("junk", "Junk", Rarity::Junk, 0.0, 1.0),
        ],
        ship_upgrades: BTreeMap::from([
            (ShipStat::MiningCapacity, upgrade(1.2, &[("ferrox", 50), ("silicor", 50)])),
            (ShipStat::Defense, upgrade(1.15, &[("ionite", 30), ("tritum_spark", 30)])),
            (ShipStat::Evasion, upgrade(1.1, &[("ionite", 20), ("celestium", 10)])),
            (ShipStat::Speed, upgrade(1.1, &[("ferrox", 30), ("tritum_spark", 20)])),
            (ShipStat::Repairability, upgrade(1.15, &[("crystite", 20)])),
            (ShipStat::Stealth, upgrade(1.1, &[("silicor", 40), ("crystite", 20)])),
        ]),
        base_upgrades: BTreeMap::from([
            (BaseStat::ShipProduction, upgrade(1.1, &[("ferrox", 100), ("silicor", 100)])),
            (BaseStat::Healing, upgrade(1.1, &[("ionite", 50), ("tritum_spark", 50)])),
            (BaseStat::RefiningSpeed, upgrade(1.1, &[("celestium", 25), ("crystite", 25)])),
        ]),
        initial_ship_stats: ShipStats {
            mining_capacity: 100.0,
            defense: 100.0,
            evasion: 10.0,
            speed: 1.0,
            repairability: 10.0,
            stealth: 10.0,
        },
        constants: default_constants(),
    }
}

/// One mineral with `discovery_chance = 1.0`, plus junk. Junk rolls disabled.
pub fn minimal_content() -> GameContent {
    let mut constants = default_constants();
    constants.junk_chance = 0.0;
    GameContent {
        content_version: "minimal".to_string(),
        minerals: vec![
            mineral("ferrox", "Ferrox", Rarity::Common, 1.0, 10.0),
            mineral("junk", "Junk", Rarity::Junk, 0.0, 1.0),
        ],
        ship_upgrades: BTreeMap::from([(
            ShipStat::MiningCapacity,
            upgrade(1.2, &[("ferrox", 50)]),
        )]),
        base_upgrades: BTreeMap::new(),
        initial_ship_stats: base_content().initial_ship_stats,
        constants,
    }
}

/// Fresh game: one idle ship, no credits, no stock, prices at base.
pub fn base_state(content: &GameContent) -> GameState {
    let ships = content.constants.initial_idle_ships;
    GameState {
        meta: MetaState {
            tick: 0,
            elapsed_ms: 0,
            seed: 42,
            schema_version: 1,
            content_version: content.content_version.clone(),
        },
        fleet: FleetState {
            idle: ships,
            commissioned: ships,
            ..FleetState::default()
        },
        ship_stats: content.initial_ship_stats.clone(),
        base_stats: BaseStats::default(),
        inventory: Inventory::default(),
        credits: content.constants.initial_credits,
        risk_level: 0.0,
        progress: ProgressCounters::default(),
        market: MarketState {
            prices: content
                .minerals
                .iter()
                .map(|m| (m.id.clone(), PriceHistory::opening(m.base_value)))
                .collect(),
        },
        refine_targets: BTreeMap::new(),
        timers: TimerState::default(),
        counters: Counters::default(),
    }
}

/// Deterministic RNG seeded with 42.
pub fn make_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}
