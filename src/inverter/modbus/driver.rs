//! Modbus TCP reference inverter driver (spec §4.9). All writes honor
//! `dry_run` by logging the intended register write instead of
//! transmitting it.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ScheduleSlot;
use crate::inverter::registers::*;
use crate::inverter::{
    current_slot, ApplyOutcome, ControlResult, EnergyTotals, InverterDriver, InverterMetrics, InverterMode,
    InverterState, Intent,
};

use super::client::ModbusConnection;

/// `battery_w = consumption − solar − grid_import`,
/// `grid_export = max(0, solar − consumption − max(0, −battery))` (spec
/// §4.9). Pulled out as a pure function so the balance can be tested
/// without a live Modbus connection.
fn derive_power_balance(solar_w: f64, consumption_w: f64, grid_import_w: f64) -> (f64, f64) {
    let battery_w = consumption_w - solar_w - grid_import_w;
    let grid_export_w = (solar_w - consumption_w - (-battery_w).max(0.0)).max(0.0);
    (battery_w, grid_export_w)
}

pub struct ModbusInverterDriver {
    conn: ModbusConnection,
    dry_run: bool,
    charge_soc: f64,
    discharge_soc: f64,
}

impl ModbusInverterDriver {
    pub fn new(host: &str, port: u16, unit_id: u8, response_timeout_ms: u64, dry_run: bool, charge_soc: f64, discharge_soc: f64) -> Self {
        Self {
            conn: ModbusConnection::new(host, port, unit_id, response_timeout_ms),
            dry_run,
            charge_soc,
            discharge_soc,
        }
    }

    async fn write_soc_floor(&self, target_pct: f64) -> anyhow::Result<()> {
        let target = clamp_soc_target(target_pct);
        let raw = target.round() as u16;
        if self.dry_run {
            info!(target_pct = target, register = REG_RESERVED_SOC_FLOOR, "dry-run: skipping modbus write");
            return Ok(());
        }
        self.conn.write_single_register(REG_RESERVED_SOC_FLOOR, raw).await
    }

    fn target_for_intent(&self, intent: Intent, current_soc: f64) -> f64 {
        match intent {
            Intent::Charge => self.charge_soc,
            Intent::Discharge => self.discharge_soc,
            Intent::Idle => current_soc,
        }
    }

    async fn read_soc(&self) -> anyhow::Result<f64> {
        let regs = self.conn.read_input_registers(REG_BMS_SOC, 1).await?;
        Ok(regs[0] as f64)
    }
}

#[async_trait]
impl InverterDriver for ModbusInverterDriver {
    async fn get_state(&self) -> anyhow::Result<InverterState> {
        let status = self.conn.read_input_registers(REG_STATUS, 1).await?;
        let bms = self.conn.read_input_registers(REG_BMS_VOLTAGE, 3).await?;
        let voltage_raw = bms[0];
        let current = decode_i16(bms[1]) as f64 / 10.0;
        let soc_pct = bms[2] as f64;
        let power_w = -(voltage_raw as f64) * current / 10.0;
        Ok(InverterState {
            soc_pct,
            power_w,
            mode: InverterMode::from_status_code(status[0]),
        })
    }

    async fn get_metrics(&self) -> anyhow::Result<InverterMetrics> {
        let pv = self.conn.read_input_registers(REG_PV_POWER, 2).await?;
        let solar_w = decode_u32_be(pv[0], pv[1]) as f64 * 0.1;

        let bms = self.conn.read_input_registers(REG_BMS_VOLTAGE, 3).await?;
        let voltage_raw = bms[0];
        let soc_pct = bms[2] as f64;

        let grid_import = self.conn.read_input_registers(REG_GRID_IMPORT_INSTANT, 2).await?;
        let grid_import_w = decode_u32_be(grid_import[0], grid_import[1]) as f64 * 0.1;

        let daily = self
            .conn
            .read_input_registers(REG_DAILY_ENERGY_BLOCK_START, DAILY_ENERGY_BLOCK_LEN)
            .await?;
        let consumption_w = decode_u32_be(daily[OFFSET_LOAD_W], daily[OFFSET_LOAD_W + 1]) as f64 * 0.1;

        // battery_w and grid_export_w are derived from the other three
        // readings (spec-defined balance), not from the BMS voltage·current
        // figure — that raw reading is unreliable and only surfaced via
        // `battery_voltage_raw` for inspection, never fed into accounting.
        let (battery_w, grid_export_w) = derive_power_balance(solar_w, consumption_w, grid_import_w);

        Ok(InverterMetrics {
            soc_pct,
            battery_w,
            battery_voltage_raw: voltage_raw,
            grid_import_w,
            grid_export_w,
            solar_w,
            consumption_w,
        })
    }

    async fn get_energy_totals(&self) -> anyhow::Result<EnergyTotals> {
        let daily = self
            .conn
            .read_input_registers(REG_DAILY_ENERGY_BLOCK_START, DAILY_ENERGY_BLOCK_LEN)
            .await?;
        let decode_kwh = |offset: usize| decode_u32_be(daily[offset], daily[offset + 1]) as f64 / 10.0;
        Ok(EnergyTotals {
            pv_kwh: decode_kwh(OFFSET_PV_KWH_X10),
            load_kwh: decode_kwh(OFFSET_LOAD_KWH_X10),
            grid_import_kwh: decode_kwh(OFFSET_GRID_IMPORT_KWH_X10),
            grid_export_kwh: decode_kwh(OFFSET_GRID_EXPORT_KWH_X10),
        })
    }

    async fn apply_schedule(&self, slots: &[ScheduleSlot], now_ts: &str) -> anyhow::Result<ApplyOutcome> {
        let Some(slot) = current_slot(slots, now_ts) else {
            return Ok(ApplyOutcome { applied: 0, skipped: 1 });
        };
        let current_soc = self.read_soc().await.unwrap_or(slot.soc_start_pct);
        let intent = slot.action.intent();
        let target = self.target_for_intent(intent, current_soc);
        self.write_soc_floor(target).await?;
        Ok(ApplyOutcome { applied: 1, skipped: 0 })
    }

    async fn charge(&self) -> anyhow::Result<ControlResult> {
        let soc_pct = self.read_soc().await.unwrap_or(0.0);
        self.write_soc_floor(self.charge_soc).await?;
        Ok(ControlResult {
            soc_pct,
            target_soc_pct: clamp_soc_target(self.charge_soc),
        })
    }

    async fn discharge(&self) -> anyhow::Result<ControlResult> {
        let soc_pct = self.read_soc().await.unwrap_or(0.0);
        self.write_soc_floor(self.discharge_soc).await?;
        Ok(ControlResult {
            soc_pct,
            target_soc_pct: clamp_soc_target(self.discharge_soc),
        })
    }

    async fn idle(&self) -> anyhow::Result<ControlResult> {
        let soc_pct = self.read_soc().await.unwrap_or(0.0);
        self.write_soc_floor(soc_pct).await?;
        Ok(ControlResult {
            soc_pct,
            target_soc_pct: clamp_soc_target(soc_pct),
        })
    }

    async fn set_peak_shaving_target(&self, kw: f64) -> anyhow::Result<()> {
        let raw = (kw * 10.0).round() as u16;
        if self.dry_run {
            info!(kw, register = REG_GRID_IMPORT_CAP, "dry-run: skipping modbus write");
            return Ok(());
        }
        self.conn.write_single_register(REG_GRID_IMPORT_CAP, raw).await
    }

    async fn reset_to_default(&self) -> anyhow::Result<()> {
        self.write_soc_floor(self.discharge_soc).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // S6 (dry-run apply_schedule) lives as an integration test under
    // `tests/`, exercising this driver through the crate's public API.

    #[test]
    fn target_for_intent_uses_current_soc_when_idle() {
        let driver = ModbusInverterDriver::new("127.0.0.1", 1, 1, 100, true, 90.0, 20.0);
        assert_eq!(driver.target_for_intent(Intent::Idle, 47.0), 47.0);
        assert_eq!(driver.target_for_intent(Intent::Charge, 47.0), 90.0);
        assert_eq!(driver.target_for_intent(Intent::Discharge, 47.0), 20.0);
    }

    // Solar covers load and charges the battery: battery_w is negative
    // (charging), grid_export_w is 0 since the surplus went to the battery.
    #[test]
    fn power_balance_charging_from_surplus_solar() {
        let (battery_w, grid_export_w) = derive_power_balance(3000.0, 500.0, 0.0);
        assert_eq!(battery_w, 500.0 - 3000.0 - 0.0);
        assert_eq!(grid_export_w, 0.0);
    }

    // Verifies the exact spec formula term-by-term, including the
    // `max(0, -battery)` floor inside grid_export_w's subtraction.
    #[test]
    fn power_balance_matches_spec_formula_directly() {
        let solar_w = 1000.0_f64;
        let consumption_w = 200.0_f64;
        let grid_import_w = 100.0_f64;
        let (battery_w, grid_export_w) = derive_power_balance(solar_w, consumption_w, grid_import_w);
        assert_eq!(battery_w, consumption_w - solar_w - grid_import_w);
        assert_eq!(grid_export_w, (solar_w - consumption_w - (-battery_w).max(0.0)).max(0.0));
    }

    // Battery discharges to cover load beyond solar and grid import:
    // battery_w is positive (discharging), grid_export_w is 0.
    #[test]
    fn power_balance_discharging_to_cover_load() {
        let (battery_w, grid_export_w) = derive_power_balance(200.0, 1000.0, 300.0);
        assert_eq!(battery_w, 1000.0 - 200.0 - 300.0);
        assert_eq!(battery_w, 500.0);
        assert_eq!(grid_export_w, 0.0);
    }
}
