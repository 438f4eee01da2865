//! Human-readable notifications derived from events.
//!
//! Delivery and display are the caller's concern; this module only decides
//! which events are worth telling the player about and how.

use serde::Serialize;

use crate::{AttackOutcome, Event, GameContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Warning,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    fn new(message: String, severity: Severity) -> Self {
        Self { message, severity }
    }
}

/// Notification for an event, or `None` for events the player is not told about
/// (auto-refine steps, price ticks, progress ticks, bookkeeping).
pub fn notification(event: &Event, content: &GameContent) -> Option<Notification> {
    let notification = match event {
        Event::MiningResults { found, junk } => {
            let mut parts: Vec<String> = found
                .iter()
                .map(|(id, amount)| format!("{amount} {}", content.mineral_name(id)))
                .collect();
            if *junk > 0 {
                let name = content.junk().map_or("Junk", |j| j.name.as_str());
                parts.push(format!("{junk} {name}"));
            }
            if parts.is_empty() {
                Notification::new("Mining trip came back empty".to_string(), Severity::Info)
            } else {
                Notification::new(
                    format!("Mining results: {}", parts.join(", ")),
                    Severity::Success,
                )
            }
        }
        Event::RiskWarning { level } => Notification::new(
            format!("High alien activity detected! ({}%)", level.floor()),
            Severity::Warning,
        ),
        Event::AttackResolved { ships_hit: 0, .. } => Notification::new(
            "Alien attack! All ships evaded".to_string(),
            Severity::Info,
        ),
        Event::AttackResolved {
            ships_hit,
            outcome: AttackOutcome::Damaged,
            ..
        } => Notification::new(
            format!("{ships_hit} ships damaged and need repairs"),
            Severity::Warning,
        ),
        Event::AttackResolved {
            ships_hit,
            outcome: AttackOutcome::Destroyed,
            ..
        } => Notification::new(
            format!("{ships_hit} ships destroyed by aliens!"),
            Severity::Error,
        ),
        Event::ShipBuildStarted { cost } => Notification::new(
            format!("Ship construction started ({cost} credits)"),
            Severity::Info,
        ),
        Event::ShipBuilt => Notification::new("New ship ready".to_string(), Severity::Success),
        Event::ShipRepaired => {
            Notification::new("Ship repaired".to_string(), Severity::Success)
        }
        Event::ShipsDispatched { count } => Notification::new(
            format!("{count} ships sent mining"),
            Severity::Info,
        ),
        Event::MineralRefined {
            mineral,
            amount,
            automatic: false,
        } => Notification::new(
            format!("Refined {amount} {}", content.mineral_name(mineral)),
            Severity::Success,
        ),
        Event::MineralSold {
            mineral,
            amount,
            credits,
            ..
        } => Notification::new(
            format!(
                "Sold {amount} {} for {credits:.2} credits",
                content.mineral_name(mineral)
            ),
            Severity::Success,
        ),
        Event::ShipStatUpgraded {
            stat,
            purchased: true,
            ..
        } => Notification::new(
            format!("Ship {} upgraded", stat.label()),
            Severity::Success,
        ),
        Event::BaseStatUpgraded {
            stat,
            purchased: true,
            ..
        } => Notification::new(
            format!("Base {} upgraded", stat.label()),
            Severity::Success,
        ),
        _ => return None,
    };
    Some(notification)
}
