use crate::{Event, EventEnvelope, GameContent, GameState, Inventory, MineralId};

/// Move `amount` raw units to refined. Returns false and leaves the inventory
/// untouched when there is not enough raw stock.
pub(crate) fn refine(inventory: &mut Inventory, mineral: &MineralId, amount: u64) -> bool {
    let available = inventory.raw_of(mineral);
    if available < amount {
        return false;
    }
    if amount == 0 {
        return true;
    }
    inventory.raw.insert(mineral.clone(), available - amount);
    *inventory.refined.entry(mineral.clone()).or_insert(0) += amount;
    true
}

/// Refined units the auto-refinery aims to hold for a target percentage.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn desired_refined(raw: u64, percent: f64) -> u64 {
    (raw as f64 * percent / 100.0).floor().max(0.0) as u64
}

/// One refinery tick: each mineral below its target refines a single unit.
pub(crate) fn auto_refine(
    state: &mut GameState,
    content: &GameContent,
    events: &mut Vec<EventEnvelope>,
) {
    for mineral in &content.minerals {
        let percent = state.refine_targets.get(&mineral.id).copied().unwrap_or(0.0);
        if percent <= 0.0 {
            continue;
        }
        let raw = state.inventory.raw_of(&mineral.id);
        if raw == 0 || desired_refined(raw, percent) <= state.inventory.refined_of(&mineral.id) {
            continue;
        }
        if refine(&mut state.inventory, &mineral.id, 1) {
            events.push(crate::emit(
                &mut state.counters,
                state.meta.tick,
                Event::MineralRefined {
                    mineral: mineral.id.clone(),
                    amount: 1,
                    automatic: true,
                },
            ));
        }
    }
}
