use std::collections::BTreeMap;

use crate::{BaseStat, GameContent, GameState, Inventory, MineralId, ShipStat};

/// Whether refined stock covers every line of a cost table.
pub fn can_afford(inventory: &Inventory, costs: &BTreeMap<MineralId, u64>) -> bool {
    costs
        .iter()
        .all(|(mineral, amount)| inventory.refined_of(mineral) >= *amount)
}

/// Deduct a cost table from refined stock, all or nothing.
pub(crate) fn spend(inventory: &mut Inventory, costs: &BTreeMap<MineralId, u64>) -> bool {
    if !can_afford(inventory, costs) {
        return false;
    }
    for (mineral, amount) in costs {
        if *amount == 0 {
            continue;
        }
        if let Some(held) = inventory.refined.get_mut(mineral) {
            *held -= amount;
        }
    }
    true
}

pub fn can_afford_ship_upgrade(state: &GameState, content: &GameContent, stat: ShipStat) -> bool {
    content
        .ship_upgrades
        .get(&stat)
        .is_some_and(|def| can_afford(&state.inventory, &def.costs))
}

pub fn can_afford_base_upgrade(state: &GameState, content: &GameContent, stat: BaseStat) -> bool {
    content
        .base_upgrades
        .get(&stat)
        .is_some_and(|def| can_afford(&state.inventory, &def.costs))
}
