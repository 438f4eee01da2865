//! Content validation tests for the JSON game data.
//!
//! These tests load the actual `content/*.json` files and check:
//! 1. Schema validity: all files deserialize without error
//! 2. Range constraints on the catalog and constants
//! 3. Cross-reference integrity between upgrades and the catalog
//! 4. Playability of the starting position
//! 5. Loader error reporting for broken directories

use sim_core::{BaseStat, GameContent, Rarity, ShipStat};
use sim_world::{build_initial_state, default_content, load_content};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Integration tests run from the crate directory, so go up two levels.
fn content_dir() -> String {
    let manifest = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    format!("{manifest}/../../content")
}

/// Shared content loaded once across all tests in this module.
fn load_test_content() -> &'static GameContent {
    static CONTENT: OnceLock<GameContent> = OnceLock::new();
    CONTENT.get_or_init(|| {
        load_content(&content_dir()).expect("load_content should succeed for production content")
    })
}

// =========================================================================
// 1. Schema validation
// =========================================================================

#[test]
fn content_loads_successfully() {
    let content = load_test_content();
    assert!(!content.content_version.is_empty());
}

#[test]
fn embedded_content_matches_files_on_disk() {
    let on_disk = load_test_content();
    let embedded = default_content().expect("built-in content parses");
    assert_eq!(
        serde_json::to_value(on_disk).unwrap(),
        serde_json::to_value(&embedded).unwrap()
    );
}

// =========================================================================
// 2. Range constraints
// =========================================================================

#[test]
fn mineral_ids_and_names_are_non_empty() {
    let content = load_test_content();
    for mineral in &content.minerals {
        assert!(!mineral.id.0.is_empty(), "mineral has empty id");
        assert!(!mineral.name.is_empty(), "mineral '{}' has empty name", mineral.id);
    }
}

#[test]
fn no_duplicate_mineral_ids() {
    let content = load_test_content();
    let mut seen = HashSet::new();
    for mineral in &content.minerals {
        assert!(seen.insert(&mineral.id), "duplicate mineral id '{}'", mineral.id);
    }
}

#[test]
fn discovery_chances_are_probabilities() {
    let content = load_test_content();
    for mineral in &content.minerals {
        assert!(
            (0.0..=1.0).contains(&mineral.discovery_chance),
            "mineral '{}' has discovery_chance {}",
            mineral.id,
            mineral.discovery_chance
        );
    }
}

#[test]
fn junk_is_never_rolled_directly() {
    let content = load_test_content();
    let junk = content.junk().expect("catalog has a junk entry");
    assert!(junk.discovery_chance.abs() < f64::EPSILON);
    assert!(content.discoverable().all(|m| m.rarity != Rarity::Junk));
}

#[test]
fn rarer_minerals_are_worth_more() {
    let content = load_test_content();
    let mut by_rarity: Vec<_> = content.discoverable().collect();
    by_rarity.sort_by_key(|m| m.rarity);
    for pair in by_rarity.windows(2) {
        if pair[0].rarity < pair[1].rarity {
            assert!(
                pair[0].base_value < pair[1].base_value,
                "'{}' is rarer than '{}' but not worth more",
                pair[1].id,
                pair[0].id
            );
        }
    }
}

#[test]
fn constants_intervals_are_positive() {
    let c = &load_test_content().constants;
    assert!(c.base_mining_tick_ms > 0);
    assert!(c.progress_tick_ms > 0);
    assert!(c.market_tick_ms > 0);
    assert!(c.base_refine_ms > 0);
}

#[test]
fn constants_market_parameters_are_sane() {
    let c = &load_test_content().constants;
    assert!(c.market_volatility >= 0.0 && c.market_volatility < 1.0);
    assert!((0.0..=1.0).contains(&c.market_reversion));
    assert!(c.market_floor_ratio > 0.0 && c.market_floor_ratio < 1.0);
}

#[test]
fn constants_risk_parameters_are_sane() {
    let c = &load_test_content().constants;
    assert!(c.base_danger_increase > 0.0);
    assert!(c.risk_warning_threshold > 0.0 && c.risk_warning_threshold < 100.0);
    assert!((0.0..=1.0).contains(&c.base_hit_rate));
    assert!((0.0..=1.0).contains(&c.junk_chance));
}

// =========================================================================
// 3. Cross-reference integrity
// =========================================================================

#[test]
fn every_stat_has_an_upgrade() {
    let content = load_test_content();
    for stat in ShipStat::ALL {
        assert!(
            content.ship_upgrades.contains_key(&stat),
            "no upgrade for ship stat '{}'",
            stat.label()
        );
    }
    for stat in BaseStat::ALL {
        assert!(
            content.base_upgrades.contains_key(&stat),
            "no upgrade for base stat '{}'",
            stat.label()
        );
    }
}

#[test]
fn upgrade_costs_reference_discoverable_minerals() {
    let content = load_test_content();
    let discoverable: HashSet<_> = content.discoverable().map(|m| &m.id).collect();
    let costs = content
        .ship_upgrades
        .values()
        .chain(content.base_upgrades.values())
        .flat_map(|def| def.costs.iter());
    for (mineral, amount) in costs {
        assert!(
            discoverable.contains(mineral),
            "upgrade cost '{mineral}' cannot be mined"
        );
        assert!(*amount > 0, "upgrade cost '{mineral}' is zero");
    }
}

#[test]
fn upgrade_multipliers_improve_stats() {
    let content = load_test_content();
    for def in content
        .ship_upgrades
        .values()
        .chain(content.base_upgrades.values())
    {
        assert!(def.multiplier > 1.0 && def.multiplier < 2.0);
    }
}

// =========================================================================
// 4. Playability
// =========================================================================

#[test]
fn initial_state_is_consistent() {
    let content = load_test_content();
    let state = build_initial_state(content, 42);
    assert!(sim_core::check_invariants(&state).is_ok());
    assert!(state.fleet.idle > 0, "the player starts with a ship to send");
    assert_eq!(state.market.prices.len(), content.minerals.len());
}

#[test]
fn first_ship_is_affordable_from_common_finds() {
    let content = load_test_content();
    let c = &content.constants;
    let per_hit = sim_core::discovery_yield(1, content.initial_ship_stats.mining_capacity, c);
    assert!(per_hit > 0, "a single discovery yields something");

    let cheapest_common = content
        .discoverable()
        .filter(|m| m.rarity == Rarity::Common)
        .map(|m| m.base_value)
        .fold(f64::INFINITY, f64::min);
    let hits_needed = (c.ship_cost / (cheapest_common * per_hit as f64)).ceil();
    assert!(
        hits_needed <= 10.0,
        "first ship needs {hits_needed} common discoveries"
    );
}

// =========================================================================
// 5. Loader error reporting
// =========================================================================

#[test]
fn missing_file_reports_which_one() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_content(dir.path().to_str().unwrap()).unwrap_err();
    assert!(format!("{err:#}").contains("minerals.json"), "{err:#}");
}

#[test]
fn malformed_json_reports_which_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = content_dir();
    for name in ["minerals.json", "upgrades.json"] {
        std::fs::copy(format!("{source}/{name}"), dir.path().join(name)).unwrap();
    }
    std::fs::write(dir.path().join("constants.json"), "{ not json").unwrap();

    let err = load_content(dir.path().to_str().unwrap()).unwrap_err();
    assert!(format!("{err:#}").contains("parsing constants.json"), "{err:#}");
}
