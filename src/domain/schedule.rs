use serde::{Deserialize, Serialize};

use super::Action;

/// One 15-minute slot of the rolling 24h battery schedule (spec §3
/// "Schedule slot"). Produced by each optimizer run, which first deletes
/// any existing rows in the same `[from, to)` range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub slot_ts: String,
    pub action: Action,
    pub target_watts: f64,
    pub soc_start_pct: f64,
    pub soc_end_pct: f64,
    pub price_per_kwh: f64,
    pub solar_forecast_w: f64,
    pub consumption_w: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_watts_non_negative_by_construction_site() {
        let s = ScheduleSlot {
            slot_ts: "2026-06-01T10:00".into(),
            action: Action::Idle,
            target_watts: 0.0,
            soc_start_pct: 40.0,
            soc_end_pct: 40.0,
            price_per_kwh: 1.0,
            solar_forecast_w: 0.0,
            consumption_w: 400.0,
        };
        assert!(s.target_watts >= 0.0);
    }
}
