use super::*;

fn snapshot(state: &GameState) -> String {
    serde_json::to_string(state).unwrap()
}

#[test]
fn test_build_deducts_cost_and_occupies_slot() {
    let content = test_content();
    let mut state = test_state(&content);
    state.credits = 150.0;

    let events = apply(&mut state, &content, Command::StartBuildingShip);
    assert!((state.credits - 50.0).abs() < 1e-9);
    assert_eq!(state.fleet.building, 1);
    assert_eq!(state.fleet.commissioned, 2);
    assert!(has_event(&events, |e| matches!(e, Event::ShipBuildStarted { .. })));

    let before = snapshot(&state);
    let events = apply(&mut state, &content, Command::StartBuildingShip);
    assert!(events.is_empty());
    assert_eq!(snapshot(&state), before, "second build while building must be a no-op");
}

#[test]
fn test_build_rejected_without_credits() {
    let content = test_content();
    let mut state = test_state(&content);
    state.credits = 99.99;
    let before = snapshot(&state);

    let events = apply(&mut state, &content, Command::StartBuildingShip);

    assert!(events.is_empty());
    assert_eq!(snapshot(&state), before);
}

#[test]
fn test_refine_zero_is_noop() {
    let content = test_content();
    let mut state = test_state(&content);
    state.inventory.raw.insert(mineral("ferrox"), 20);
    let before = snapshot(&state);

    let events = apply(
        &mut state,
        &content,
        Command::RefineMineral {
            mineral: mineral("ferrox"),
            amount: 0,
        },
    );

    assert!(events.is_empty());
    assert_eq!(snapshot(&state), before);
}

#[test]
fn test_refine_more_than_held_is_noop() {
    let content = test_content();
    let mut state = test_state(&content);
    state.inventory.raw.insert(mineral("ferrox"), 20);
    let before = snapshot(&state);

    apply(
        &mut state,
        &content,
        Command::RefineMineral {
            mineral: mineral("ferrox"),
            amount: 21,
        },
    );

    assert_eq!(snapshot(&state), before, "no partial refine");
}

#[test]
fn test_refine_moves_raw_to_refined() {
    let content = test_content();
    let mut state = test_state(&content);
    state.inventory.raw.insert(mineral("ferrox"), 20);

    let events = apply(
        &mut state,
        &content,
        Command::RefineMineral {
            mineral: mineral("ferrox"),
            amount: 15,
        },
    );

    assert_eq!(state.inventory.raw_of(&mineral("ferrox")), 5);
    assert_eq!(state.inventory.refined_of(&mineral("ferrox")), 15);
    assert!(has_event(&events, |e| matches!(
        e,
        Event::MineralRefined {
            amount: 15,
            automatic: false,
            ..
        }
    )));
}

#[test]
fn test_refine_unknown_mineral_rejected() {
    let content = test_content();
    let mut state = test_state(&content);
    let before = snapshot(&state);

    apply(
        &mut state,
        &content,
        Command::RefineMineral {
            mineral: mineral("unobtainium"),
            amount: 1,
        },
    );

    assert_eq!(snapshot(&state), before);
}

#[test]
fn test_sell_credits_exact_proceeds() {
    let content = test_content();
    let mut state = test_state(&content);
    state.credits = 5.0;
    state.inventory.raw.insert(mineral("silicor"), 30);

    let events = apply(
        &mut state,
        &content,
        Command::SellMineral {
            mineral: mineral("silicor"),
            amount: 12,
            price: 2.5,
        },
    );

    assert!((state.credits - 35.0).abs() < 1e-9, "5 + 12 * 2.5");
    assert_eq!(state.inventory.raw_of(&mineral("silicor")), 18);
    assert!(has_event(&events, |e| matches!(e, Event::MineralSold { amount: 12, .. })));
}

#[test]
fn test_sell_leaves_refined_stock_alone() {
    let content = test_content();
    let mut state = test_state(&content);
    state.inventory.raw.insert(mineral("silicor"), 10);
    state.inventory.refined.insert(mineral("silicor"), 10);

    apply(
        &mut state,
        &content,
        Command::SellMineral {
            mineral: mineral("silicor"),
            amount: 10,
            price: 1.0,
        },
    );

    assert_eq!(state.inventory.raw_of(&mineral("silicor")), 0);
    assert_eq!(state.inventory.refined_of(&mineral("silicor")), 10);
}

#[test]
fn test_sell_overdraw_and_bad_price_rejected() {
    let content = test_content();
    let mut state = test_state(&content);
    state.inventory.raw.insert(mineral("silicor"), 5);
    let before = snapshot(&state);

    for (amount, price) in [(6, 1.0), (1, -1.0), (1, f64::NAN), (1, f64::INFINITY)] {
        apply(
            &mut state,
            &content,
            Command::SellMineral {
                mineral: mineral("silicor"),
                amount,
                price,
            },
        );
    }

    assert_eq!(snapshot(&state), before);
}

#[test]
fn test_sell_rejected_when_proceeds_overflow() {
    let content = test_content();
    let mut state = test_state(&content);
    state.inventory.raw.insert(mineral("silicor"), 5);
    let before = snapshot(&state);

    let events = apply(
        &mut state,
        &content,
        Command::SellMineral {
            mineral: mineral("silicor"),
            amount: 5,
            price: f64::MAX,
        },
    );

    assert!(events.is_empty());
    assert_eq!(snapshot(&state), before);
    assert!(check_invariants(&state).is_ok());
}

#[test]
fn test_sell_at_market_uses_current_price() {
    let content = test_content();
    let mut state = test_state(&content);
    state.inventory.raw.insert(mineral("ionite"), 4);
    state
        .market
        .prices
        .get_mut(&mineral("ionite"))
        .unwrap()
        .current = 40.0;

    apply(
        &mut state,
        &content,
        Command::SellAtMarket {
            mineral: mineral("ionite"),
            amount: 4,
        },
    );

    assert!((state.credits - 160.0).abs() < 1e-9);
    assert_eq!(state.inventory.raw_of(&mineral("ionite")), 0);
}

#[test]
fn test_update_counts_merges_patch() {
    let content = test_content();
    let mut state = test_state(&content);
    state.fleet.idle = 4;
    state.fleet.commissioned = 4;

    let events = apply(
        &mut state,
        &content,
        Command::UpdateShipCounts {
            patch: FleetPatch {
                idle: Some(1),
                mining: Some(3),
                ..FleetPatch::default()
            },
        },
    );

    assert_eq!(state.fleet.idle, 1);
    assert_eq!(state.fleet.mining, 3);
    assert!(has_event(&events, |e| matches!(e, Event::ShipCountsUpdated { .. })));
}

#[test]
fn test_update_counts_rejects_total_change() {
    let content = test_content();
    let mut state = test_state(&content);
    let before = snapshot(&state);

    apply(
        &mut state,
        &content,
        Command::UpdateShipCounts {
            patch: FleetPatch {
                mining: Some(5),
                ..FleetPatch::default()
            },
        },
    );

    assert_eq!(snapshot(&state), before, "patch would conjure ships");
}

#[test]
fn test_update_counts_rejects_wrapping_total() {
    let content = test_content();
    let mut state = test_state(&content);
    assert_eq!(state.fleet.total(), 1);
    let before = snapshot(&state);

    // u32::MAX + 2 wraps to 1 in 32 bits, matching the real total.
    let events = apply(
        &mut state,
        &content,
        Command::UpdateShipCounts {
            patch: FleetPatch {
                idle: Some(u32::MAX),
                mining: Some(2),
                ..FleetPatch::default()
            },
        },
    );

    assert!(events.is_empty());
    assert_eq!(snapshot(&state), before);
    assert!(check_invariants(&state).is_ok());
}

#[test]
fn test_send_idle_ships_mining() {
    let content = test_content();
    let mut state = test_state(&content);
    state.fleet.idle = 5;
    state.fleet.commissioned = 5;

    apply(&mut state, &content, Command::SendIdleShipsMining { count: Some(2) });
    assert_eq!((state.fleet.idle, state.fleet.mining), (3, 2));

    apply(&mut state, &content, Command::SendIdleShipsMining { count: None });
    assert_eq!((state.fleet.idle, state.fleet.mining), (0, 5));

    let events = apply(&mut state, &content, Command::SendIdleShipsMining { count: None });
    assert!(events.is_empty(), "nothing idle to send");
}

#[test]
fn test_send_more_than_idle_rejected() {
    let content = test_content();
    let mut state = test_state(&content);
    let before = snapshot(&state);

    apply(&mut state, &content, Command::SendIdleShipsMining { count: Some(2) });

    assert_eq!(snapshot(&state), before);
}

#[test]
fn test_stat_overwrite_validates_value() {
    let content = test_content();
    let mut state = test_state(&content);

    apply(
        &mut state,
        &content,
        Command::UpgradeShipStat {
            stat: ShipStat::Evasion,
            value: 42.0,
        },
    );
    assert!((state.ship_stats.evasion - 42.0).abs() < 1e-9);

    for value in [0.0, -1.0, f64::NAN] {
        apply(
            &mut state,
            &content,
            Command::UpgradeBaseStat {
                stat: BaseStat::Healing,
                value,
            },
        );
    }
    assert!((state.base_stats.healing - 1.0).abs() < 1e-9);

    apply(
        &mut state,
        &content,
        Command::UpgradeBaseStat {
            stat: BaseStat::Healing,
            value: 2.0,
        },
    );
    assert!((state.base_stats.healing - 2.0).abs() < 1e-9);
}

#[test]
fn test_refine_target_clamped_and_cleared() {
    let content = test_content();
    let mut state = test_state(&content);

    apply(
        &mut state,
        &content,
        Command::SetRefineTarget {
            mineral: mineral("ferrox"),
            percent: 140.0,
        },
    );
    assert_eq!(state.refine_targets.get(&mineral("ferrox")), Some(&100.0));

    apply(
        &mut state,
        &content,
        Command::SetRefineTarget {
            mineral: mineral("ferrox"),
            percent: 0.0,
        },
    );
    assert!(state.refine_targets.is_empty());
}

#[test]
fn test_commands_only_apply_on_their_tick() {
    let content = test_content();
    let mut state = test_state(&content);
    state.credits = 100.0;
    let mut rng = make_rng();

    let mut late = envelope(&state, Command::StartBuildingShip);
    late.execute_at_tick = 1;

    tick(&mut state, &[late.clone()], &content, &mut rng, 0, EventLevel::Normal);
    assert_eq!(state.fleet.building, 0, "scheduled for the next frame");

    tick(&mut state, &[late], &content, &mut rng, 0, EventLevel::Normal);
    assert_eq!(state.fleet.building, 1);
}
