use tracing::debug;

use crate::refinery::refine;
use crate::upgrades::spend;
use crate::{
    BaseStat, Command, Event, EventEnvelope, FleetPatch, GameContent, GameState, MineralId,
    ShipStat,
};

pub(crate) fn apply_command(
    state: &mut GameState,
    command: &Command,
    content: &GameContent,
    events: &mut Vec<EventEnvelope>,
) {
    match command {
        Command::StartBuildingShip => handle_start_building(state, content, events),
        Command::UpdateShipCounts { patch } => handle_update_counts(state, patch, events),
        Command::SendIdleShipsMining { count } => handle_send_mining(state, *count, events),
        Command::RefineMineral { mineral, amount } => {
            handle_refine(state, mineral, *amount, content, events);
        }
        Command::SellMineral {
            mineral,
            amount,
            price,
        } => handle_sell(state, mineral, *amount, *price, content, events),
        Command::SellAtMarket { mineral, amount } => {
            let Some(def) = content.mineral(mineral) else {
                reject(command, "unknown mineral");
                return;
            };
            let price = state
                .market
                .prices
                .get(mineral)
                .map_or(def.base_value, |p| p.current);
            handle_sell(state, mineral, *amount, price, content, events);
        }
        Command::UpgradeShipStat { stat, value } => {
            handle_set_ship_stat(state, *stat, *value, false, events);
        }
        Command::UpgradeBaseStat { stat, value } => {
            handle_set_base_stat(state, *stat, *value, false, events);
        }
        Command::PurchaseShipUpgrade { stat } => handle_purchase_ship(state, *stat, content, events),
        Command::PurchaseBaseUpgrade { stat } => handle_purchase_base(state, *stat, content, events),
        Command::SetRefineTarget { mineral, percent } => {
            handle_set_refine_target(state, mineral, *percent, content, events);
        }
    }
}

fn reject(command: &Command, reason: &str) {
    debug!(?command, reason, "command rejected");
}

fn handle_start_building(
    state: &mut GameState,
    content: &GameContent,
    events: &mut Vec<EventEnvelope>,
) {
    let cost = content.constants.ship_cost;
    if state.fleet.building > 0 {
        reject(&Command::StartBuildingShip, "build slot occupied");
        return;
    }
    if state.credits < cost {
        reject(&Command::StartBuildingShip, "insufficient credits");
        return;
    }

    state.credits -= cost;
    state.fleet.building += 1;
    state.fleet.commissioned += 1;

    events.push(crate::emit(
        &mut state.counters,
        state.meta.tick,
        Event::ShipBuildStarted { cost },
    ));
}

fn handle_update_counts(state: &mut GameState, patch: &FleetPatch, events: &mut Vec<EventEnvelope>) {
    let mut fleet = state.fleet.clone();
    fleet.idle = patch.idle.unwrap_or(fleet.idle);
    fleet.mining = patch.mining.unwrap_or(fleet.mining);
    fleet.returning = patch.returning.unwrap_or(fleet.returning);
    fleet.repairing = patch.repairing.unwrap_or(fleet.repairing);
    fleet.building = patch.building.unwrap_or(fleet.building);

    if fleet.total() != state.fleet.total() {
        debug!(
            before = state.fleet.total(),
            after = fleet.total(),
            "ship count patch rejected: total changed"
        );
        return;
    }
    if fleet == state.fleet {
        return;
    }

    state.fleet = fleet;
    events.push(crate::emit(
        &mut state.counters,
        state.meta.tick,
        Event::ShipCountsUpdated {
            fleet: state.fleet.clone(),
        },
    ));
}

fn handle_send_mining(state: &mut GameState, count: Option<u32>, events: &mut Vec<EventEnvelope>) {
    let count = count.unwrap_or(state.fleet.idle);
    if count == 0 || count > state.fleet.idle {
        debug!(count, idle = state.fleet.idle, "dispatch rejected");
        return;
    }

    state.fleet.idle -= count;
    state.fleet.mining += count;

    events.push(crate::emit(
        &mut state.counters,
        state.meta.tick,
        Event::ShipsDispatched { count },
    ));
}

fn handle_refine(
    state: &mut GameState,
    mineral: &MineralId,
    amount: u64,
    content: &GameContent,
    events: &mut Vec<EventEnvelope>,
) {
    if content.mineral(mineral).is_none() {
        debug!(%mineral, "refine rejected: unknown mineral");
        return;
    }
    if amount == 0 {
        return;
    }
    if !refine(&mut state.inventory, mineral, amount) {
        debug!(%mineral, amount, "refine rejected: not enough raw stock");
        return;
    }

    events.push(crate::emit(
        &mut state.counters,
        state.meta.tick,
        Event::MineralRefined {
            mineral: mineral.clone(),
            amount,
            automatic: false,
        },
    ));
}

fn handle_sell(
    state: &mut GameState,
    mineral: &MineralId,
    amount: u64,
    price: f64,
    content: &GameContent,
    events: &mut Vec<EventEnvelope>,
) {
    if content.mineral(mineral).is_none() {
        debug!(%mineral, "sale rejected: unknown mineral");
        return;
    }
    if !price.is_finite() || price < 0.0 {
        debug!(%mineral, price, "sale rejected: invalid price");
        return;
    }
    let held = state.inventory.raw_of(mineral);
    if held < amount {
        debug!(%mineral, amount, held, "sale rejected: not enough raw stock");
        return;
    }
    if amount == 0 {
        return;
    }

    let proceeds = amount as f64 * price;
    let credits = state.credits + proceeds;
    if !credits.is_finite() {
        debug!(%mineral, amount, price, "sale rejected: proceeds overflow");
        return;
    }
    state.inventory.raw.insert(mineral.clone(), held - amount);
    state.credits = credits;

    events.push(crate::emit(
        &mut state.counters,
        state.meta.tick,
        Event::MineralSold {
            mineral: mineral.clone(),
            amount,
            price,
            credits: proceeds,
        },
    ));
}

fn valid_stat_value(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn handle_set_ship_stat(
    state: &mut GameState,
    stat: ShipStat,
    value: f64,
    purchased: bool,
    events: &mut Vec<EventEnvelope>,
) {
    if !valid_stat_value(value) {
        debug!(?stat, value, "ship stat rejected: must be finite and positive");
        return;
    }
    state.ship_stats.set(stat, value);
    events.push(crate::emit(
        &mut state.counters,
        state.meta.tick,
        Event::ShipStatUpgraded {
            stat,
            value,
            purchased,
        },
    ));
}

fn handle_set_base_stat(
    state: &mut GameState,
    stat: BaseStat,
    value: f64,
    purchased: bool,
    events: &mut Vec<EventEnvelope>,
) {
    if !valid_stat_value(value) {
        debug!(?stat, value, "base stat rejected: must be finite and positive");
        return;
    }
    state.base_stats.set(stat, value);
    events.push(crate::emit(
        &mut state.counters,
        state.meta.tick,
        Event::BaseStatUpgraded {
            stat,
            value,
            purchased,
        },
    ));
}

fn handle_purchase_ship(
    state: &mut GameState,
    stat: ShipStat,
    content: &GameContent,
    events: &mut Vec<EventEnvelope>,
) {
    let Some(def) = content.ship_upgrades.get(&stat) else {
        debug!(?stat, "purchase rejected: no upgrade defined");
        return;
    };
    let value = state.ship_stats.get(stat) * def.multiplier;
    if !valid_stat_value(value) {
        debug!(?stat, value, "purchase rejected: resulting stat invalid");
        return;
    }
    if !spend(&mut state.inventory, &def.costs) {
        debug!(?stat, "purchase rejected: not enough refined stock");
        return;
    }
    handle_set_ship_stat(state, stat, value, true, events);
}

fn handle_purchase_base(
    state: &mut GameState,
    stat: BaseStat,
    content: &GameContent,
    events: &mut Vec<EventEnvelope>,
) {
    let Some(def) = content.base_upgrades.get(&stat) else {
        debug!(?stat, "purchase rejected: no upgrade defined");
        return;
    };
    let value = state.base_stats.get(stat) * def.multiplier;
    if !valid_stat_value(value) {
        debug!(?stat, value, "purchase rejected: resulting stat invalid");
        return;
    }
    if !spend(&mut state.inventory, &def.costs) {
        debug!(?stat, "purchase rejected: not enough refined stock");
        return;
    }
    handle_set_base_stat(state, stat, value, true, events);
}

fn handle_set_refine_target(
    state: &mut GameState,
    mineral: &MineralId,
    percent: f64,
    content: &GameContent,
    events: &mut Vec<EventEnvelope>,
) {
    if content.mineral(mineral).is_none() || !percent.is_finite() {
        debug!(%mineral, percent, "refine target rejected");
        return;
    }
    let percent = percent.clamp(0.0, 100.0);
    if percent > 0.0 {
        state.refine_targets.insert(mineral.clone(), percent);
    } else {
        state.refine_targets.remove(mineral);
    }

    events.push(crate::emit(
        &mut state.counters,
        state.meta.tick,
        Event::RefineTargetSet {
            mineral: mineral.clone(),
            percent,
        },
    ));
}
