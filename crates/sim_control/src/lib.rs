use sim_core::{
    can_afford_base_upgrade, can_afford_ship_upgrade, BaseStat, Command, CommandEnvelope,
    CommandId, GameContent, GameState, MineralId, ShipStat, UpgradeDef,
};
use std::collections::{BTreeMap, VecDeque};

pub trait CommandSource {
    fn generate_commands(
        &mut self,
        state: &GameState,
        content: &GameContent,
        next_command_id: &mut u64,
    ) -> Vec<CommandEnvelope>;
}

/// One purchasable upgrade, ship-side or base-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeTarget {
    Ship(ShipStat),
    Base(BaseStat),
}

impl UpgradeTarget {
    fn def(self, content: &GameContent) -> Option<&UpgradeDef> {
        match self {
            UpgradeTarget::Ship(stat) => content.ship_upgrades.get(&stat),
            UpgradeTarget::Base(stat) => content.base_upgrades.get(&stat),
        }
    }

    fn affordable(self, state: &GameState, content: &GameContent) -> bool {
        match self {
            UpgradeTarget::Ship(stat) => can_afford_ship_upgrade(state, content, stat),
            UpgradeTarget::Base(stat) => can_afford_base_upgrade(state, content, stat),
        }
    }

    fn purchase(self) -> Command {
        match self {
            UpgradeTarget::Ship(stat) => Command::PurchaseShipUpgrade { stat },
            UpgradeTarget::Base(stat) => Command::PurchaseBaseUpgrade { stat },
        }
    }
}

/// Upgrade rotation: yield first, then survival, then throughput.
pub const UPGRADE_ROTATION: [UpgradeTarget; 9] = [
    UpgradeTarget::Ship(ShipStat::MiningCapacity),
    UpgradeTarget::Ship(ShipStat::Evasion),
    UpgradeTarget::Base(BaseStat::ShipProduction),
    UpgradeTarget::Ship(ShipStat::Defense),
    UpgradeTarget::Ship(ShipStat::Speed),
    UpgradeTarget::Base(BaseStat::RefiningSpeed),
    UpgradeTarget::Ship(ShipStat::Stealth),
    UpgradeTarget::Base(BaseStat::Healing),
    UpgradeTarget::Ship(ShipStat::Repairability),
];

/// Plays the game each frame:
/// 1. Send every idle ship mining.
/// 2. Refine raw stock toward the cost of the next upgrade in the rotation.
/// 3. Sell the remaining raw stock of any mineral trading at or above its average.
/// 4. Buy the next upgrade once affordable, then move along the rotation.
/// 5. Start a ship build whenever the yard is free and credits allow.
#[derive(Debug, Default)]
pub struct AutopilotController {
    next_upgrade: usize,
}

impl AutopilotController {
    pub fn new() -> Self {
        Self::default()
    }

    /// The upgrade the autopilot is currently saving for.
    pub fn target(&self) -> UpgradeTarget {
        UPGRADE_ROTATION[self.next_upgrade % UPGRADE_ROTATION.len()]
    }

    /// Skips rotation entries with no upgrade defined in `content`.
    fn current_target<'a>(
        &mut self,
        content: &'a GameContent,
    ) -> Option<(UpgradeTarget, &'a UpgradeDef)> {
        for _ in 0..UPGRADE_ROTATION.len() {
            let target = self.target();
            if let Some(def) = target.def(content) {
                return Some((target, def));
            }
            self.next_upgrade += 1;
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Allocates a command ID and builds a `CommandEnvelope` due this frame.
fn make_cmd(tick: u64, next_id: &mut u64, command: Command) -> CommandEnvelope {
    let cmd_id = CommandId(format!("cmd_{:06}", *next_id));
    *next_id += 1;
    CommandEnvelope {
        id: cmd_id,
        issued_tick: tick,
        execute_at_tick: tick,
        command,
    }
}

/// Raw units to refine per mineral so refined stock covers `costs`.
fn refine_plan(state: &GameState, costs: &BTreeMap<MineralId, u64>) -> BTreeMap<MineralId, u64> {
    costs
        .iter()
        .filter_map(|(mineral, needed)| {
            let missing = needed.saturating_sub(state.inventory.refined_of(mineral));
            let amount = missing.min(state.inventory.raw_of(mineral));
            (amount > 0).then(|| (mineral.clone(), amount))
        })
        .collect()
}

/// Raw stock left after refining, for minerals whose price is at or above average.
fn sell_plan(
    state: &GameState,
    refining: &BTreeMap<MineralId, u64>,
) -> Vec<(MineralId, u64)> {
    state
        .inventory
        .raw
        .iter()
        .filter_map(|(mineral, held)| {
            let reserved = refining.get(mineral).copied().unwrap_or(0);
            let surplus = held.saturating_sub(reserved);
            let favourable = state
                .market
                .prices
                .get(mineral)
                .is_none_or(|history| history.current >= history.average);
            (surplus > 0 && favourable).then(|| (mineral.clone(), surplus))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// AutopilotController
// ---------------------------------------------------------------------------

impl CommandSource for AutopilotController {
    fn generate_commands(
        &mut self,
        state: &GameState,
        content: &GameContent,
        next_command_id: &mut u64,
    ) -> Vec<CommandEnvelope> {
        let tick = state.meta.tick;
        let mut commands = Vec::new();

        if state.fleet.idle > 0 {
            commands.push(make_cmd(
                tick,
                next_command_id,
                Command::SendIdleShipsMining { count: None },
            ));
        }

        let target = self.current_target(content);
        let refining = target.map_or_else(BTreeMap::new, |(_, def)| refine_plan(state, &def.costs));
        for (mineral, amount) in &refining {
            commands.push(make_cmd(
                tick,
                next_command_id,
                Command::RefineMineral {
                    mineral: mineral.clone(),
                    amount: *amount,
                },
            ));
        }
        for (mineral, amount) in sell_plan(state, &refining) {
            commands.push(make_cmd(
                tick,
                next_command_id,
                Command::SellAtMarket { mineral, amount },
            ));
        }

        // Affordability is judged on last frame's refined stock; the refines
        // above land before the purchase but are not counted here.
        if let Some((target, _)) = target {
            if target.affordable(state, content) {
                commands.push(make_cmd(tick, next_command_id, target.purchase()));
                self.next_upgrade += 1;
            }
        }

        if state.fleet.building == 0 && state.credits >= content.constants.ship_cost {
            commands.push(make_cmd(
                tick,
                next_command_id,
                Command::StartBuildingShip,
            ));
        }

        commands
    }
}

// ---------------------------------------------------------------------------
// CommandQueue
// ---------------------------------------------------------------------------

/// Commands submitted from outside the simulation (a player or an API client),
/// stamped and released on the next frame in submission order.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<Command>,
}

impl CommandQueue {
    pub fn push(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl CommandSource for CommandQueue {
    fn generate_commands(
        &mut self,
        state: &GameState,
        _content: &GameContent,
        next_command_id: &mut u64,
    ) -> Vec<CommandEnvelope> {
        self.pending
            .drain(..)
            .map(|command| make_cmd(state.meta.tick, next_command_id, command))
            .collect()
    }
}
