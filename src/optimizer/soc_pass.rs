//! Step 6 (forward SOC pass) and step 7 (savings summary) of the
//! optimizer (spec §4.8). Per the open questions in spec §9: the
//! savings summary always uses post-pass watts, since the forward pass
//! may downgrade a `charge_grid`/`charge_solar`/`discharge` to `idle`
//! (or `charge_solar` to `sell`) when the battery is near a SOC bound.

use crate::config::{BatteryConfig, GridConfig};
use crate::domain::{Action, ScheduleSlot};

use super::SavingsSummary;

/// Mutates `schedule` in place with soc_start/soc_end and any
/// action/watts downgrades, then returns the savings summary computed
/// from the resulting (post-pass) slots.
pub fn forward_soc_pass(
    schedule: &mut [ScheduleSlot],
    battery: &BatteryConfig,
    grid: &GridConfig,
    start_soc_pct: Option<f64>,
) -> SavingsSummary {
    schedule.sort_by(|a, b| a.slot_ts.cmp(&b.slot_ts));

    let capacity_wh = battery.capacity_kwh * 1000.0;
    let min_soc_wh = battery.min_soc / 100.0 * capacity_wh;
    let max_soc_wh = battery.max_soc / 100.0 * capacity_wh;

    let mut soc = match start_soc_pct {
        Some(pct) => (pct / 100.0 * capacity_wh).clamp(min_soc_wh, max_soc_wh),
        None => min_soc_wh,
    };

    for slot in schedule.iter_mut() {
        let soc_start_wh = soc;
        match slot.action {
            Action::ChargeGrid => {
                let stored = (slot.target_watts * 0.25 * battery.efficiency).min(max_soc_wh - soc).max(0.0);
                if stored <= 0.0 {
                    slot.action = Action::Idle;
                    slot.target_watts = 0.0;
                } else {
                    soc += stored;
                    slot.target_watts = stored / (0.25 * battery.efficiency);
                }
            }
            Action::ChargeSolar => {
                let stored = (slot.target_watts * 0.25).min(max_soc_wh - soc).max(0.0);
                if stored <= 0.0 {
                    let sell_p = sell_price(slot.price_per_kwh, grid);
                    let available_net = (slot.solar_forecast_w - slot.consumption_w).max(0.0);
                    if grid.sell_enabled && sell_p > 0.0 && available_net > 0.0 {
                        slot.action = Action::Sell;
                        slot.target_watts = available_net;
                    } else {
                        slot.action = Action::Idle;
                        slot.target_watts = 0.0;
                    }
                } else {
                    soc += stored;
                }
            }
            Action::Discharge | Action::Sell => {
                let drawn = (slot.target_watts * 0.25).min(soc - min_soc_wh).max(0.0);
                if drawn <= 0.0 {
                    slot.action = Action::Idle;
                    slot.target_watts = 0.0;
                } else {
                    soc -= drawn;
                    slot.target_watts = drawn / 0.25;
                }
            }
            Action::Idle => {}
        }

        slot.soc_start_pct = round1(soc_start_wh / capacity_wh * 100.0);
        slot.soc_end_pct = round1(soc / capacity_wh * 100.0);
    }

    savings_summary(schedule, grid)
}

fn sell_price(spot: f64, grid: &GridConfig) -> f64 {
    if grid.sell_enabled {
        spot * grid.sell_price_factor - grid.transfer_export_kwh
    } else {
        0.0
    }
}

fn buy_price(spot: f64, grid: &GridConfig) -> f64 {
    spot + grid.transfer_import_kwh + grid.energy_tax_kwh
}

fn round1(pct: f64) -> f64 {
    (pct * 10.0).round() / 10.0
}

/// Step 7: without-battery baseline vs. with-battery cost using
/// post-pass watts.
fn savings_summary(schedule: &[ScheduleSlot], grid: &GridConfig) -> SavingsSummary {
    let mut without_battery = 0.0;
    let mut with_battery = 0.0;

    for slot in schedule {
        let buy = buy_price(slot.price_per_kwh, grid);
        let base_kwh = ((slot.consumption_w - slot.solar_forecast_w).max(0.0)) * 0.25 / 1000.0;
        without_battery += base_kwh * buy;

        with_battery += match slot.action {
            Action::Discharge => {
                let discharge_kwh = slot.target_watts * 0.25 / 1000.0;
                (base_kwh - discharge_kwh).max(0.0) * buy
            }
            Action::ChargeGrid => base_kwh * buy + slot.target_watts * 0.25 / 1000.0 * buy,
            Action::Sell => {
                let sell_p = sell_price(slot.price_per_kwh, grid);
                base_kwh * buy - slot.target_watts * 0.25 / 1000.0 * sell_p
            }
            Action::ChargeSolar | Action::Idle => base_kwh * buy,
        };
    }

    SavingsSummary {
        without_battery,
        with_battery,
        savings: without_battery - with_battery,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn battery() -> BatteryConfig {
        BatteryConfig {
            capacity_kwh: 10.0,
            max_charge_w: 5000.0,
            max_discharge_w: 5000.0,
            efficiency: 1.0,
            min_soc: 0.0,
            max_soc: 100.0,
        }
    }

    fn slot(ts: &str, action: Action, watts: f64, price: f64, solar: f64, consumption: f64) -> ScheduleSlot {
        ScheduleSlot {
            slot_ts: ts.into(),
            action,
            target_watts: watts,
            soc_start_pct: 0.0,
            soc_end_pct: 0.0,
            price_per_kwh: price,
            solar_forecast_w: solar,
            consumption_w: consumption,
        }
    }

    #[test]
    fn consecutive_slots_chain_soc_end_to_next_soc_start() {
        let grid = GridConfig::default();
        let mut schedule = vec![
            slot("2026-06-01T02:00", Action::ChargeGrid, 2000.0, 0.10, 0.0, 1000.0),
            slot("2026-06-01T18:00", Action::Discharge, 2000.0, 1.00, 0.0, 2000.0),
        ];
        forward_soc_pass(&mut schedule, &battery(), &grid, None);
        assert!((schedule[0].soc_end_pct - schedule[1].soc_start_pct).abs() < 0.1);
    }

    #[test]
    fn soc_never_leaves_min_max_bounds() {
        let grid = GridConfig::default();
        let mut schedule = vec![slot("2026-06-01T02:00", Action::ChargeGrid, 50000.0, 0.10, 0.0, 1000.0)];
        let b = battery();
        forward_soc_pass(&mut schedule, &b, &grid, None);
        assert!(schedule[0].soc_end_pct <= b.max_soc + 1e-9);
        assert!(schedule[0].soc_end_pct >= b.min_soc - 1e-9);
    }

    #[test]
    fn full_battery_downgrades_charge_grid_to_idle() {
        let grid = GridConfig::default();
        let mut schedule = vec![slot("2026-06-01T02:00", Action::ChargeGrid, 1000.0, 0.10, 0.0, 1000.0)];
        forward_soc_pass(&mut schedule, &battery(), &grid, Some(100.0));
        assert_eq!(schedule[0].action, Action::Idle);
        assert_eq!(schedule[0].target_watts, 0.0);
    }

    #[test]
    fn s4_discharge_from_eighty_percent_start() {
        let grid = GridConfig::default();
        let b = BatteryConfig {
            capacity_kwh: 10.0,
            max_charge_w: 5000.0,
            max_discharge_w: 5000.0,
            efficiency: 1.0,
            min_soc: 10.0,
            max_soc: 100.0,
        };
        let mut schedule = vec![slot("2026-06-01T10:00", Action::Discharge, 3000.0, 0.5, 0.0, 0.0)];
        forward_soc_pass(&mut schedule, &b, &grid, Some(80.0));
        assert!((schedule[0].soc_end_pct - 72.5).abs() < 1e-6);
    }
}
