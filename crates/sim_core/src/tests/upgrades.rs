use super::*;

fn stock(state: &mut GameState, pairs: &[(&str, u64)]) {
    for (id, amount) in pairs {
        state.inventory.refined.insert(mineral(id), *amount);
    }
}

#[test]
fn test_purchase_ship_upgrade_spends_and_multiplies() {
    let content = test_content();
    let mut state = test_state(&content);
    stock(&mut state, &[("ferrox", 60), ("silicor", 50)]);

    let events = apply(
        &mut state,
        &content,
        Command::PurchaseShipUpgrade {
            stat: ShipStat::MiningCapacity,
        },
    );

    assert!((state.ship_stats.mining_capacity - 120.0).abs() < 1e-9);
    assert_eq!(state.inventory.refined_of(&mineral("ferrox")), 10);
    assert_eq!(state.inventory.refined_of(&mineral("silicor")), 0);
    assert!(has_event(&events, |e| matches!(
        e,
        Event::ShipStatUpgraded {
            stat: ShipStat::MiningCapacity,
            purchased: true,
            ..
        }
    )));
}

#[test]
fn test_unaffordable_purchase_is_noop() {
    let content = test_content();
    let mut state = test_state(&content);
    stock(&mut state, &[("ferrox", 100), ("silicor", 49)]);
    let before = serde_json::to_string(&state).unwrap();

    let events = apply(
        &mut state,
        &content,
        Command::PurchaseShipUpgrade {
            stat: ShipStat::MiningCapacity,
        },
    );

    assert!(events.is_empty());
    assert_eq!(serde_json::to_string(&state).unwrap(), before);
}

#[test]
fn test_purchase_base_upgrade() {
    let content = test_content();
    let mut state = test_state(&content);
    stock(&mut state, &[("celestium", 25), ("crystite", 30)]);

    apply(
        &mut state,
        &content,
        Command::PurchaseBaseUpgrade {
            stat: BaseStat::RefiningSpeed,
        },
    );

    assert!((state.base_stats.refining_speed - 1.1).abs() < 1e-9);
    assert_eq!(state.inventory.refined_of(&mineral("celestium")), 0);
    assert_eq!(state.inventory.refined_of(&mineral("crystite")), 5);
}

#[test]
fn test_repeated_purchases_compound() {
    let content = test_content();
    let mut state = test_state(&content);
    stock(&mut state, &[("ionite", 100), ("celestium", 100)]);

    for _ in 0..2 {
        apply(
            &mut state,
            &content,
            Command::PurchaseShipUpgrade {
                stat: ShipStat::Evasion,
            },
        );
    }

    assert!((state.ship_stats.evasion - 10.0 * 1.1 * 1.1).abs() < 1e-9);
    assert_eq!(state.inventory.refined_of(&mineral("ionite")), 60);
}

#[test]
fn test_affordability_queries() {
    let content = test_content();
    let mut state = test_state(&content);
    assert!(!can_afford_ship_upgrade(&state, &content, ShipStat::Repairability));

    stock(&mut state, &[("crystite", 20)]);
    assert!(can_afford_ship_upgrade(&state, &content, ShipStat::Repairability));
    assert!(!can_afford_base_upgrade(&state, &content, BaseStat::RefiningSpeed));
}

#[test]
fn test_mining_interval_follows_gate_stat() {
    let mut content = test_content();
    let mut state = test_state(&content);
    assert_eq!(process_interval_ms(&state, Process::Mining, &content), 5000);

    state.base_stats.ship_production = 1.25;
    assert_eq!(process_interval_ms(&state, Process::Mining, &content), 4000);

    content.constants.mining_interval_stat = MiningIntervalStat::Speed;
    state.ship_stats.speed = 2.0;
    assert_eq!(process_interval_ms(&state, Process::Mining, &content), 2500);
}
