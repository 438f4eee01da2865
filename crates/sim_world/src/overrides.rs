//! String-keyed overrides for `Constants`, as passed via `--set key=value`.

use std::collections::HashMap;

use anyhow::{anyhow, bail, Context, Result};
use sim_core::{Constants, MiningIntervalStat};

const VALID_KEYS: &[&str] = &[
    "base_mining_tick_ms",
    "mining_interval_stat",
    "units_per_discovery",
    "reference_mining_capacity",
    "junk_chance",
    "base_danger_increase",
    "risk_warning_threshold",
    "base_hit_rate",
    "base_damage",
    "max_defense",
    "lethal_damage_threshold",
    "lethal_attacks",
    "returning_phase",
    "ship_cost",
    "progress_tick_ms",
    "build_reference_rate",
    "repair_reference_rate",
    "market_tick_ms",
    "market_volatility",
    "market_reversion",
    "market_floor_ratio",
    "base_refine_ms",
    "initial_idle_ships",
    "initial_credits",
];

/// Applies every override, then range-checks the result the same way loaded
/// content is checked.
pub fn apply_overrides(
    constants: &mut Constants,
    overrides: &HashMap<String, serde_json::Value>,
) -> Result<()> {
    for (key, value) in overrides {
        if apply_non_numeric(constants, key, value)? {
            continue;
        }
        match key.as_str() {
            "base_mining_tick_ms" => constants.base_mining_tick_ms = as_u64(key, value)?,
            "units_per_discovery" => constants.units_per_discovery = as_f64(key, value)?,
            "reference_mining_capacity" => {
                constants.reference_mining_capacity = as_f64(key, value)?;
            }
            "junk_chance" => constants.junk_chance = as_f64(key, value)?,
            "base_danger_increase" => constants.base_danger_increase = as_f64(key, value)?,
            "risk_warning_threshold" => constants.risk_warning_threshold = as_f64(key, value)?,
            "base_hit_rate" => constants.base_hit_rate = as_f64(key, value)?,
            "base_damage" => constants.base_damage = as_f64(key, value)?,
            "max_defense" => constants.max_defense = as_f64(key, value)?,
            "lethal_damage_threshold" => {
                constants.lethal_damage_threshold = as_f64(key, value)?;
            }
            "ship_cost" => constants.ship_cost = as_f64(key, value)?,
            "progress_tick_ms" => constants.progress_tick_ms = as_u64(key, value)?,
            "build_reference_rate" => constants.build_reference_rate = as_f64(key, value)?,
            "repair_reference_rate" => constants.repair_reference_rate = as_f64(key, value)?,
            "market_tick_ms" => constants.market_tick_ms = as_u64(key, value)?,
            "market_volatility" => constants.market_volatility = as_f64(key, value)?,
            "market_reversion" => constants.market_reversion = as_f64(key, value)?,
            "market_floor_ratio" => constants.market_floor_ratio = as_f64(key, value)?,
            "base_refine_ms" => constants.base_refine_ms = as_u64(key, value)?,
            "initial_credits" => constants.initial_credits = as_f64(key, value)?,
            _ => bail!(
                "unknown override key '{key}'. Valid keys: {}",
                VALID_KEYS.join(", ")
            ),
        }
    }
    crate::check_constants(constants).context("constants out of range after overrides")
}

/// Flags, enums and counts. Returns false when `key` is not one of them.
fn apply_non_numeric(
    constants: &mut Constants,
    key: &str,
    value: &serde_json::Value,
) -> Result<bool> {
    match key {
        "mining_interval_stat" => {
            constants.mining_interval_stat =
                serde_json::from_value::<MiningIntervalStat>(value.clone()).with_context(|| {
                    format!("override '{key}': expected \"ship_production\" or \"speed\"")
                })?;
        }
        "lethal_attacks" => constants.lethal_attacks = as_bool(key, value)?,
        "returning_phase" => constants.returning_phase = as_bool(key, value)?,
        "initial_idle_ships" => constants.initial_idle_ships = as_u32(key, value)?,
        _ => return Ok(false),
    }
    Ok(true)
}

/// Parse `key=value` pairs. Values are read as JSON, falling back to a bare string.
pub fn parse_set_args(args: &[String]) -> Result<HashMap<String, serde_json::Value>> {
    let mut overrides = HashMap::new();
    for arg in args {
        let Some((key, raw)) = arg.split_once('=') else {
            bail!("override '{arg}' is not of the form key=value");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("override '{arg}' has an empty key");
        }
        let value = serde_json::from_str(raw.trim())
            .unwrap_or_else(|_| serde_json::Value::String(raw.trim().to_string()));
        overrides.insert(key.to_string(), value);
    }
    Ok(overrides)
}

fn as_f64(key: &str, value: &serde_json::Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| anyhow!("override '{key}': expected a number, got {value}"))
}

fn as_bool(key: &str, value: &serde_json::Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| anyhow!("override '{key}': expected true or false, got {value}"))
}

fn as_u64(key: &str, value: &serde_json::Value) -> Result<u64> {
    value
        .as_u64()
        .ok_or_else(|| anyhow!("override '{key}': expected a positive integer, got {value}"))
}

fn as_u32(key: &str, value: &serde_json::Value) -> Result<u32> {
    let val = as_u64(key, value)?;
    u32::try_from(val).map_err(|_| anyhow!("override '{key}': value {val} exceeds u32 range"))
}
