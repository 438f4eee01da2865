//! Mining tick: discovery rolls, junk fallback, alien risk and attacks.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::{debug, warn};

use crate::{AttackOutcome, Constants, Event, EventEnvelope, GameContent, GameState, MineralId};

/// Units credited for `successes` discoveries at the given mining capacity.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn discovery_yield(successes: u32, mining_capacity: f64, constants: &Constants) -> u64 {
    if successes == 0 || constants.reference_mining_capacity <= 0.0 {
        return 0;
    }
    let units = f64::from(successes) * constants.units_per_discovery * mining_capacity
        / constants.reference_mining_capacity;
    units.floor().max(0.0) as u64
}

/// Ships hit by an attack on `mining` ships.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn ships_hit(mining: u32, evasion: f64, constants: &Constants) -> u32 {
    let exposed = (1.0 - evasion / 100.0).clamp(0.0, 1.0);
    let hits = (f64::from(mining) * exposed * constants.base_hit_rate).floor();
    (hits.max(0.0) as u32).min(mining)
}

/// Damage factor dealt to each hit ship.
pub fn attack_damage(defense: f64, constants: &Constants) -> f64 {
    let unprotected = if constants.max_defense > 0.0 {
        (1.0 - defense / constants.max_defense).clamp(0.0, 1.0)
    } else {
        1.0
    };
    unprotected * constants.base_damage
}

pub(crate) fn resolve_mining_tick(
    state: &mut GameState,
    content: &GameContent,
    rng: &mut impl Rng,
    events: &mut Vec<EventEnvelope>,
) {
    let current_tick = state.meta.tick;

    // Ships that came back last mining tick dock now.
    let docked = std::mem::take(&mut state.fleet.returning);
    if docked > 0 {
        state.fleet.idle += docked;
        events.push(crate::emit(
            &mut state.counters,
            current_tick,
            Event::ShipsReturned { count: docked },
        ));
    }

    let mining = state.fleet.mining;
    if mining == 0 {
        return;
    }
    state.counters.mining_ticks += 1;

    roll_discoveries(state, content, rng, events);
    accrue_risk(state, content, events);

    if content.constants.returning_phase {
        state.fleet.returning += std::mem::take(&mut state.fleet.mining);
    }
}

/// Roll every mining ship against every discoverable mineral, then credit
/// the scaled yields to raw inventory in one pass.
fn roll_discoveries(
    state: &mut GameState,
    content: &GameContent,
    rng: &mut impl Rng,
    events: &mut Vec<EventEnvelope>,
) {
    let constants = &content.constants;
    let mut successes: BTreeMap<&MineralId, u32> = BTreeMap::new();
    let mut junk_successes = 0_u32;

    for _ in 0..state.fleet.mining {
        let mut found_any = false;
        for mineral in content.discoverable() {
            if rng.gen::<f64>() < mineral.discovery_chance {
                *successes.entry(&mineral.id).or_insert(0) += 1;
                found_any = true;
            }
        }
        if !found_any && constants.junk_chance > 0.0 && rng.gen::<f64>() < constants.junk_chance
        {
            junk_successes += 1;
        }
    }

    let capacity = state.ship_stats.mining_capacity;
    let mut found = BTreeMap::new();
    for (mineral_id, count) in successes {
        let units = discovery_yield(count, capacity, constants);
        if units > 0 {
            *state.inventory.raw.entry(mineral_id.clone()).or_insert(0) += units;
            found.insert(mineral_id.clone(), units);
        }
    }

    let mut junk = 0;
    if let Some(junk_def) = content.junk() {
        junk = discovery_yield(junk_successes, capacity, constants);
        if junk > 0 {
            *state.inventory.raw.entry(junk_def.id.clone()).or_insert(0) += junk;
        }
    }

    debug!(minerals = found.len(), junk, "mining results");
    events.push(crate::emit(
        &mut state.counters,
        state.meta.tick,
        Event::MiningResults { found, junk },
    ));
}

fn accrue_risk(state: &mut GameState, content: &GameContent, events: &mut Vec<EventEnvelope>) {
    let constants = &content.constants;
    let current_tick = state.meta.tick;
    let previous = state.risk_level;

    let exposure = (1.0 - state.ship_stats.stealth / 100.0).clamp(0.0, 1.0);
    let increase = constants.base_danger_increase * f64::from(state.fleet.mining) * exposure;
    state.risk_level = (previous + increase).clamp(0.0, 100.0);

    if state.risk_level < 100.0 {
        let threshold = constants.risk_warning_threshold;
        if previous < threshold && state.risk_level >= threshold {
            events.push(crate::emit(
                &mut state.counters,
                current_tick,
                Event::RiskWarning {
                    level: state.risk_level,
                },
            ));
        }
        return;
    }

    resolve_attack(state, constants, events);
    state.risk_level = 0.0;
}

fn resolve_attack(state: &mut GameState, constants: &Constants, events: &mut Vec<EventEnvelope>) {
    let hits = ships_hit(state.fleet.mining, state.ship_stats.evasion, constants);
    let damage = attack_damage(state.ship_stats.defense, constants);
    let outcome = if constants.lethal_attacks && damage >= constants.lethal_damage_threshold {
        AttackOutcome::Destroyed
    } else {
        AttackOutcome::Damaged
    };

    state.fleet.mining -= hits;
    match outcome {
        AttackOutcome::Damaged => state.fleet.repairing += hits,
        AttackOutcome::Destroyed => {
            state.fleet.destroyed += hits;
            if hits > 0 {
                warn!(ships = hits, damage, "alien attack destroyed ships");
            }
        }
    }
    state.counters.attacks += 1;

    events.push(crate::emit(
        &mut state.counters,
        state.meta.tick,
        Event::AttackResolved {
            ships_hit: hits,
            outcome,
            damage,
        },
    ));
}
