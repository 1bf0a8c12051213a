//! Inverter driver (spec §4.9, §6 "Modbus TCP map", §9 "Ownership of
//! connections"). The reserved-SOC-floor strategy lets a single holding
//! register steer the whole device: writing a high value blocks
//! discharge, a low value permits it, the current SOC holds.

pub mod modbus;
pub mod registers;

use async_trait::async_trait;

pub use crate::domain::action::Intent;
use crate::domain::ScheduleSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InverterMode {
    Waiting,
    Normal,
    Fault,
    Flash,
    Storage(u16),
    Unknown(u16),
}

impl InverterMode {
    pub fn from_status_code(code: u16) -> Self {
        match code {
            0 => InverterMode::Waiting,
            1 => InverterMode::Normal,
            3 => InverterMode::Fault,
            4 => InverterMode::Flash,
            5..=8 => InverterMode::Storage(code),
            other => InverterMode::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InverterState {
    pub soc_pct: f64,
    pub power_w: f64,
    pub mode: InverterMode,
}

/// Metrics read off the device. `battery_voltage_raw` is exposed
/// unscaled because the source's BMS voltage scaling is not pinned
/// down from live data; nothing here feeds it back into `battery_w`.
#[derive(Debug, Clone, Copy)]
pub struct InverterMetrics {
    pub soc_pct: f64,
    pub battery_w: f64,
    pub battery_voltage_raw: u16,
    pub grid_import_w: f64,
    pub grid_export_w: f64,
    pub solar_w: f64,
    pub consumption_w: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyTotals {
    pub pv_kwh: f64,
    pub load_kwh: f64,
    pub grid_import_kwh: f64,
    pub grid_export_kwh: f64,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ControlResult {
    pub soc_pct: f64,
    pub target_soc_pct: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOutcome {
    pub applied: u32,
    pub skipped: u32,
}

/// Finds the slot whose `slot_ts` is the latest one `≤ now`, falling
/// back to the first slot if none qualify.
pub fn current_slot<'a>(slots: &'a [ScheduleSlot], now_ts: &str) -> Option<&'a ScheduleSlot> {
    slots
        .iter()
        .filter(|s| s.slot_ts.as_str() <= now_ts)
        .max_by(|a, b| a.slot_ts.cmp(&b.slot_ts))
        .or_else(|| slots.first())
}

#[async_trait]
pub trait InverterDriver: Send + Sync {
    async fn get_state(&self) -> anyhow::Result<InverterState>;
    async fn get_metrics(&self) -> anyhow::Result<InverterMetrics>;
    async fn get_energy_totals(&self) -> anyhow::Result<EnergyTotals>;
    async fn apply_schedule(&self, slots: &[ScheduleSlot], now_ts: &str) -> anyhow::Result<ApplyOutcome>;
    async fn charge(&self) -> anyhow::Result<ControlResult>;
    async fn discharge(&self) -> anyhow::Result<ControlResult>;
    async fn idle(&self) -> anyhow::Result<ControlResult>;
    async fn set_peak_shaving_target(&self, kw: f64) -> anyhow::Result<()>;
    async fn reset_to_default(&self) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Action;

    #[test]
    fn mode_lookup_covers_known_and_unknown_codes() {
        assert_eq!(InverterMode::from_status_code(0), InverterMode::Waiting);
        assert_eq!(InverterMode::from_status_code(1), InverterMode::Normal);
        assert_eq!(InverterMode::from_status_code(3), InverterMode::Fault);
        assert_eq!(InverterMode::from_status_code(6), InverterMode::Storage(6));
        assert_eq!(InverterMode::from_status_code(99), InverterMode::Unknown(99));
    }

    fn slot(ts: &str) -> ScheduleSlot {
        ScheduleSlot {
            slot_ts: ts.into(),
            action: Action::Idle,
            target_watts: 0.0,
            soc_start_pct: 0.0,
            soc_end_pct: 0.0,
            price_per_kwh: 0.0,
            solar_forecast_w: 0.0,
            consumption_w: 0.0,
        }
    }

    #[test]
    fn current_slot_picks_latest_at_or_before_now() {
        let slots = vec![slot("2026-06-01T10:00"), slot("2026-06-01T10:15"), slot("2026-06-01T10:30")];
        let found = current_slot(&slots, "2026-06-01T10:20").unwrap();
        assert_eq!(found.slot_ts, "2026-06-01T10:15");
    }

    #[test]
    fn current_slot_falls_back_to_first_when_all_future() {
        let slots = vec![slot("2026-06-01T10:00"), slot("2026-06-01T10:15")];
        let found = current_slot(&slots, "2026-06-01T00:00").unwrap();
        assert_eq!(found.slot_ts, "2026-06-01T10:00");
    }
}
