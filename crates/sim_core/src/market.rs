//! Mean-reverting random-walk market with a price floor.

use rand::Rng;

use crate::{Constants, Event, EventEnvelope, EventLevel, GameContent, GameState, PriceHistory};

/// Next market price from one uniform draw in [0, 1).
///
/// Bounded below at `base_value * market_floor_ratio`. There is no ceiling.
pub(crate) fn next_price(current: f64, base_value: f64, draw: f64, constants: &Constants) -> f64 {
    let random_walk = (draw - 0.5) * 2.0 * constants.market_volatility * current;
    let mean_reversion = (base_value - current) * constants.market_reversion;
    (current + random_walk + mean_reversion).max(base_value * constants.market_floor_ratio)
}

pub(crate) fn record_sample(history: &mut PriceHistory, price: f64) {
    let samples = history.samples as f64;
    history.previous = history.current;
    history.current = price;
    history.average = (history.average * samples + price) / (samples + 1.0);
    history.samples += 1;
}

pub(crate) fn update_prices(
    state: &mut GameState,
    content: &GameContent,
    rng: &mut impl Rng,
    event_level: EventLevel,
    events: &mut Vec<EventEnvelope>,
) {
    for mineral in &content.minerals {
        let history = state
            .market
            .prices
            .entry(mineral.id.clone())
            .or_insert_with(|| PriceHistory::opening(mineral.base_value));
        let price = next_price(
            history.current,
            mineral.base_value,
            rng.gen::<f64>(),
            &content.constants,
        );
        record_sample(history, price);
        let previous = history.previous;

        if event_level == EventLevel::Debug {
            events.push(crate::emit(
                &mut state.counters,
                state.meta.tick,
                Event::PriceUpdated {
                    mineral: mineral.id.clone(),
                    previous,
                    current: price,
                },
            ));
        }
    }
}

/// Mean of `current / base_value` across the catalog. 1.0 means prices sit at base.
pub fn market_index(state: &GameState, content: &GameContent) -> f64 {
    let ratios: Vec<f64> = content
        .minerals
        .iter()
        .filter(|m| m.base_value > 0.0)
        .map(|m| {
            state
                .market
                .prices
                .get(&m.id)
                .map_or(1.0, |p| p.current / m.base_value)
        })
        .collect();
    if ratios.is_empty() {
        return 1.0;
    }
    ratios.iter().sum::<f64>() / ratios.len() as f64
}
