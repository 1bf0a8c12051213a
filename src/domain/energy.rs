use serde::{Deserialize, Serialize};

/// A 15-minute snapshot of the inverter's daily-cumulative energy
/// counters. All four counters reset at local midnight and are
/// monotonically non-decreasing within a calendar day (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySnapshot {
    pub slot_ts: String,
    pub pv_kwh: f64,
    pub load_kwh: f64,
    pub grid_import_kwh: f64,
    pub grid_export_kwh: f64,
}

impl EnergySnapshot {
    pub fn is_valid(&self) -> bool {
        self.pv_kwh >= 0.0
            && self.load_kwh >= 0.0
            && self.grid_import_kwh >= 0.0
            && self.grid_export_kwh >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_counter_is_invalid() {
        let mut s = EnergySnapshot {
            slot_ts: "2026-06-01T10:00".into(),
            pv_kwh: 1.0,
            load_kwh: 1.0,
            grid_import_kwh: 1.0,
            grid_export_kwh: 1.0,
        };
        assert!(s.is_valid());
        s.grid_export_kwh = -0.1;
        assert!(!s.is_valid());
    }
}
