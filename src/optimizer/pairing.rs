//! Steps 2–4 of the optimizer (spec §4.8): build per-slot buy/sell
//! prices and avoidable energy, compute the efficiency-loss break-even
//! spread, and greedily pair discharge slots against charge slots.

use crate::config::{BatteryConfig, GridConfig};
use crate::domain::PriceSlot;

use super::interpolate_hourly;

#[derive(Debug, Clone)]
pub struct BuildSlot {
    pub slot_ts: String,
    pub spot: f64,
    pub buy: f64,
    pub sell_p: f64,
    pub net: f64,
    pub avoidable_wh: f64,
    pub solar_w: f64,
    pub consumption_w: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Pair {
    pub charge_idx: usize,
    pub discharge_idx: usize,
    pub charge_wh: f64,
    pub discharge_wh: f64,
}

/// Step 2: builds one [`BuildSlot`] per price slot.
pub fn build_slots(
    prices: &[PriceSlot],
    battery: &BatteryConfig,
    grid: &GridConfig,
    solar_forecast_w: &[f64; 24],
    consumption_w: &[f64; 24],
    flat_watts: f64,
) -> Vec<BuildSlot> {
    let solar_series = interpolate_hourly(prices, solar_forecast_w);
    let consumption_series = interpolate_hourly(prices, consumption_w);

    prices
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let solar = solar_series.get(i).copied().unwrap_or(0.0).max(0.0);
            let consumption = consumption_series.get(i).copied().unwrap_or(flat_watts).max(0.0);
            let net = solar - consumption;

            let buy = p.price_per_kwh + grid.transfer_import_kwh + grid.energy_tax_kwh;
            let sell_p = if grid.sell_enabled {
                p.price_per_kwh * grid.sell_price_factor - grid.transfer_export_kwh
            } else {
                0.0
            };
            let avoidable_wh = (-net).max(0.0).min(battery.max_discharge_w) * 0.25;

            BuildSlot {
                slot_ts: p.slot_ts.clone(),
                spot: p.price_per_kwh,
                buy,
                sell_p,
                net,
                avoidable_wh,
                solar_w: solar,
                consumption_w: consumption,
            }
        })
        .collect()
}

/// Step 3: the efficiency-loss break-even spread below which a pair is
/// unprofitable.
pub fn min_spread(slots: &[BuildSlot], efficiency: f64) -> f64 {
    if slots.is_empty() {
        return 0.0;
    }
    let avg_buy: f64 = slots.iter().map(|s| s.buy).sum::<f64>() / slots.len() as f64;
    avg_buy * (1.0 / efficiency - 1.0)
}

/// Step 4: greedy pointer walk over discharge candidates (by `buy`
/// descending) and charge candidates (by `buy` ascending, `net ≤ 0`
/// only), stopping once the spread no longer clears the break-even.
pub fn pair_candidates(slots: &[BuildSlot], spread_floor: &f64, battery: &BatteryConfig) -> Vec<Pair> {
    let mut discharge_candidates: Vec<usize> = (0..slots.len()).filter(|&i| slots[i].avoidable_wh > 0.0).collect();
    discharge_candidates.sort_by(|&a, &b| slots[b].buy.partial_cmp(&slots[a].buy).unwrap());

    let mut charge_candidates: Vec<usize> = (0..slots.len()).filter(|&i| slots[i].net <= 0.0).collect();
    charge_candidates.sort_by(|&a, &b| slots[a].buy.partial_cmp(&slots[b].buy).unwrap());

    let mut pairs = Vec::new();
    let mut remaining_capacity_wh = battery.capacity_kwh * 1000.0 * (battery.max_soc - battery.min_soc) / 100.0;
    let mut ci = 0usize;
    let mut di = 0usize;

    while ci < charge_candidates.len() && di < discharge_candidates.len() {
        let charge_idx = charge_candidates[ci];
        let discharge_idx = discharge_candidates[di];
        if charge_idx == discharge_idx {
            ci += 1;
            continue;
        }
        let spread = slots[discharge_idx].buy - slots[charge_idx].buy;
        if spread <= *spread_floor {
            break;
        }

        let discharge_wh = slots[discharge_idx]
            .avoidable_wh
            .min(battery.max_discharge_w * 0.25)
            .min(remaining_capacity_wh);
        let charge_wh = (discharge_wh / battery.efficiency).min(battery.max_charge_w * 0.25);
        if charge_wh <= 0.0 {
            di += 1;
            continue;
        }

        pairs.push(Pair {
            charge_idx,
            discharge_idx,
            charge_wh,
            discharge_wh,
        });
        remaining_capacity_wh -= charge_wh;
        ci += 1;
        di += 1;
    }

    pairs
}
