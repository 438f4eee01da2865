//! Type definitions for `sim_core`.
//!
//! All public types, structs, enums, and ID newtypes used by the simulation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(MineralId);
string_id!(CommandId);
string_id!(EventId);

// ---------------------------------------------------------------------------
// Core enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Fallback bucket for ships that found nothing. Never rolled directly.
    Junk,
    Common,
    Uncommon,
    Rare,
    VeryRare,
    ExtremelyRare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipStat {
    MiningCapacity,
    Defense,
    Evasion,
    Speed,
    Repairability,
    Stealth,
}

impl ShipStat {
    pub const ALL: [ShipStat; 6] = [
        ShipStat::MiningCapacity,
        ShipStat::Defense,
        ShipStat::Evasion,
        ShipStat::Speed,
        ShipStat::Repairability,
        ShipStat::Stealth,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ShipStat::MiningCapacity => "Mining Capacity",
            ShipStat::Defense => "Defense",
            ShipStat::Evasion => "Evasion",
            ShipStat::Speed => "Speed",
            ShipStat::Repairability => "Repairability",
            ShipStat::Stealth => "Stealth",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseStat {
    ShipProduction,
    Healing,
    RefiningSpeed,
}

impl BaseStat {
    pub const ALL: [BaseStat; 3] = [
        BaseStat::ShipProduction,
        BaseStat::Healing,
        BaseStat::RefiningSpeed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BaseStat::ShipProduction => "Ship Production",
            BaseStat::Healing => "Healing",
            BaseStat::RefiningSpeed => "Refining Speed",
        }
    }
}

/// The periodic processes that mutate state on their own timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Process {
    Mining,
    Build,
    Repair,
    Refinery,
    Market,
}

impl Process {
    /// Firing order within one frame.
    pub const ALL: [Process; 5] = [
        Process::Mining,
        Process::Build,
        Process::Repair,
        Process::Refinery,
        Process::Market,
    ];
}

/// Which stat divides `base_mining_tick_ms` to get the mining interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiningIntervalStat {
    #[default]
    ShipProduction,
    Speed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventLevel {
    Normal,
    Debug,
}

// ---------------------------------------------------------------------------
// State types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub meta: MetaState,
    pub fleet: FleetState,
    pub ship_stats: ShipStats,
    pub base_stats: BaseStats,
    pub inventory: Inventory,
    pub credits: f64,
    /// Alien danger, always within [0, 100].
    pub risk_level: f64,
    pub progress: ProgressCounters,
    pub market: MarketState,
    /// Auto-refine target percentage per mineral. Absent means 0.
    pub refine_targets: BTreeMap<MineralId, f64>,
    pub timers: TimerState,
    pub counters: Counters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaState {
    /// Frame counter, incremented once per `tick` call.
    pub tick: u64,
    pub elapsed_ms: u64,
    pub seed: u64,
    pub schema_version: u32,
    pub content_version: String,
}

/// Ship counts by lifecycle phase. Ships are fungible; only counts are tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetState {
    pub idle: u32,
    pub mining: u32,
    pub returning: u32,
    pub repairing: u32,
    pub building: u32,
    /// Starting fleet plus every build started.
    pub commissioned: u32,
    /// Ships permanently lost to lethal attacks.
    pub destroyed: u32,
}

impl FleetState {
    /// Sum over every phase. Widened so oversized phase counts cannot wrap.
    pub fn total(&self) -> u64 {
        [
            self.idle,
            self.mining,
            self.returning,
            self.repairing,
            self.building,
        ]
        .into_iter()
        .map(u64::from)
        .sum()
    }
}

/// Partial phase-count overwrite. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetPatch {
    #[serde(default)]
    pub idle: Option<u32>,
    #[serde(default)]
    pub mining: Option<u32>,
    #[serde(default)]
    pub returning: Option<u32>,
    #[serde(default)]
    pub repairing: Option<u32>,
    #[serde(default)]
    pub building: Option<u32>,
}

/// Fleet-wide multipliers. Only ever raised by upgrades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipStats {
    pub mining_capacity: f64,
    pub defense: f64,
    pub evasion: f64,
    pub speed: f64,
    pub repairability: f64,
    pub stealth: f64,
}

impl ShipStats {
    pub fn get(&self, stat: ShipStat) -> f64 {
        match stat {
            ShipStat::MiningCapacity => self.mining_capacity,
            ShipStat::Defense => self.defense,
            ShipStat::Evasion => self.evasion,
            ShipStat::Speed => self.speed,
            ShipStat::Repairability => self.repairability,
            ShipStat::Stealth => self.stealth,
        }
    }

    pub fn set(&mut self, stat: ShipStat, value: f64) {
        let slot = match stat {
            ShipStat::MiningCapacity => &mut self.mining_capacity,
            ShipStat::Defense => &mut self.defense,
            ShipStat::Evasion => &mut self.evasion,
            ShipStat::Speed => &mut self.speed,
            ShipStat::Repairability => &mut self.repairability,
            ShipStat::Stealth => &mut self.stealth,
        };
        *slot = value;
    }
}

/// Base productivity multipliers, 1.0 at start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub ship_production: f64,
    pub healing: f64,
    pub refining_speed: f64,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            ship_production: 1.0,
            healing: 1.0,
            refining_speed: 1.0,
        }
    }
}

impl BaseStats {
    pub fn get(&self, stat: BaseStat) -> f64 {
        match stat {
            BaseStat::ShipProduction => self.ship_production,
            BaseStat::Healing => self.healing,
            BaseStat::RefiningSpeed => self.refining_speed,
        }
    }

    pub fn set(&mut self, stat: BaseStat, value: f64) {
        let slot = match stat {
            BaseStat::ShipProduction => &mut self.ship_production,
            BaseStat::Healing => &mut self.healing,
            BaseStat::RefiningSpeed => &mut self.refining_speed,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub raw: BTreeMap<MineralId, u64>,
    pub refined: BTreeMap<MineralId, u64>,
}

impl Inventory {
    pub fn raw_of(&self, mineral: &MineralId) -> u64 {
        self.raw.get(mineral).copied().unwrap_or(0)
    }

    pub fn refined_of(&self, mineral: &MineralId) -> u64 {
        self.refined.get(mineral).copied().unwrap_or(0)
    }
}

/// Percentages in [0, 100]. Reaching 100 completes one unit and resets to 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressCounters {
    pub build: f64,
    pub repair: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    pub prices: BTreeMap<MineralId, PriceHistory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub current: f64,
    pub previous: f64,
    /// Running mean over every sample, including the opening price.
    pub average: f64,
    pub samples: u64,
}

impl PriceHistory {
    pub fn opening(base_value: f64) -> Self {
        Self {
            current: base_value,
            previous: base_value,
            average: base_value,
            samples: 1,
        }
    }
}

/// Per-process elapsed time since its last firing. Reset when a process goes inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mining_ms: u64,
    pub build_ms: u64,
    pub repair_ms: u64,
    pub refinery_ms: u64,
    pub market_ms: u64,
}

impl TimerState {
    pub(crate) fn slot(&mut self, process: Process) -> &mut u64 {
        match process {
            Process::Mining => &mut self.mining_ms,
            Process::Build => &mut self.build_ms,
            Process::Repair => &mut self.repair_ms,
            Process::Refinery => &mut self.refinery_ms,
            Process::Market => &mut self.market_ms,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counters {
    pub next_event_id: u64,
    pub mining_ticks: u64,
    pub attacks: u64,
}

// ---------------------------------------------------------------------------
// Command types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub id: CommandId,
    pub issued_tick: u64,
    pub execute_at_tick: u64,
    pub command: Command,
}

/// The closed set of intents the presentation layer may dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    StartBuildingShip,
    UpdateShipCounts {
        patch: FleetPatch,
    },
    /// Move `count` idle ships (all of them when `None`) to mining.
    SendIdleShipsMining {
        #[serde(default)]
        count: Option<u32>,
    },
    RefineMineral {
        mineral: MineralId,
        amount: u64,
    },
    SellMineral {
        mineral: MineralId,
        amount: u64,
        price: f64,
    },
    SellAtMarket {
        mineral: MineralId,
        amount: u64,
    },
    UpgradeShipStat {
        stat: ShipStat,
        value: f64,
    },
    UpgradeBaseStat {
        stat: BaseStat,
        value: f64,
    },
    PurchaseShipUpgrade {
        stat: ShipStat,
    },
    PurchaseBaseUpgrade {
        stat: BaseStat,
    },
    SetRefineTarget {
        mineral: MineralId,
        percent: f64,
    },
}

/// One input to the transition function: an intent or a synthesized timer tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Input {
    Command(Command),
    Tick(Process),
}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    pub tick: u64,
    pub event: Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackOutcome {
    Damaged,
    Destroyed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ShipBuildStarted {
        cost: f64,
    },
    ShipBuilt,
    ShipRepaired,
    ShipsDispatched {
        count: u32,
    },
    ShipsReturned {
        count: u32,
    },
    ShipCountsUpdated {
        fleet: FleetState,
    },
    MiningResults {
        found: BTreeMap<MineralId, u64>,
        junk: u64,
    },
    RiskWarning {
        level: f64,
    },
    AttackResolved {
        ships_hit: u32,
        outcome: AttackOutcome,
        damage: f64,
    },
    MineralRefined {
        mineral: MineralId,
        amount: u64,
        automatic: bool,
    },
    MineralSold {
        mineral: MineralId,
        amount: u64,
        price: f64,
        credits: f64,
    },
    ShipStatUpgraded {
        stat: ShipStat,
        value: f64,
        purchased: bool,
    },
    BaseStatUpgraded {
        stat: BaseStat,
        value: f64,
        purchased: bool,
    },
    RefineTargetSet {
        mineral: MineralId,
        percent: f64,
    },
    /// Only emitted at `EventLevel::Debug`.
    PriceUpdated {
        mineral: MineralId,
        previous: f64,
        current: f64,
    },
    /// Only emitted at `EventLevel::Debug`.
    ProgressAdvanced {
        process: Process,
        progress: f64,
    },
}

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameContent {
    pub content_version: String,
    pub minerals: Vec<MineralDef>,
    pub ship_upgrades: BTreeMap<ShipStat, UpgradeDef>,
    pub base_upgrades: BTreeMap<BaseStat, UpgradeDef>,
    pub initial_ship_stats: ShipStats,
    pub constants: Constants,
}

impl GameContent {
    pub fn mineral(&self, id: &MineralId) -> Option<&MineralDef> {
        self.minerals.iter().find(|m| &m.id == id)
    }

    /// Minerals rolled directly by mining ships, in catalog order.
    pub fn discoverable(&self) -> impl Iterator<Item = &MineralDef> {
        self.minerals.iter().filter(|m| m.rarity != Rarity::Junk)
    }

    pub fn junk(&self) -> Option<&MineralDef> {
        self.minerals.iter().find(|m| m.rarity == Rarity::Junk)
    }

    pub fn mineral_name<'a>(&'a self, id: &'a MineralId) -> &'a str {
        self.mineral(id).map_or(id.0.as_str(), |m| m.name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MineralDef {
    pub id: MineralId,
    pub name: String,
    pub rarity: Rarity,
    /// Probability in [0, 1] per ship per mining tick.
    pub discovery_chance: f64,
    /// Market anchor price.
    pub base_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeDef {
    pub multiplier: f64,
    /// Refined units consumed per purchase.
    pub costs: BTreeMap<MineralId, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constants {
    pub base_mining_tick_ms: u64,
    #[serde(default)]
    pub mining_interval_stat: MiningIntervalStat,
    pub units_per_discovery: f64,
    pub reference_mining_capacity: f64,
    /// Chance for a ship that found nothing to haul junk. 0 disables.
    pub junk_chance: f64,
    pub base_danger_increase: f64,
    pub risk_warning_threshold: f64,
    pub base_hit_rate: f64,
    pub base_damage: f64,
    pub max_defense: f64,
    pub lethal_damage_threshold: f64,
    /// When false, every hit ship goes to repair regardless of damage.
    pub lethal_attacks: bool,
    /// Ships pass through `returning` for one mining tick before going idle.
    pub returning_phase: bool,
    pub ship_cost: f64,
    pub progress_tick_ms: u64,
    pub build_reference_rate: f64,
    pub repair_reference_rate: f64,
    pub market_tick_ms: u64,
    pub market_volatility: f64,
    pub market_reversion: f64,
    pub market_floor_ratio: f64,
    pub base_refine_ms: u64,
    pub initial_idle_ships: u32,
    pub initial_credits: f64,
}
