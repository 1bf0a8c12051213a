use serde::{Deserialize, Serialize};

/// A 15-minute day-ahead spot price slot, keyed by local timestamp
/// "YYYY-MM-DDTHH:MM" with MM in {00,15,30,45}. A valid day has exactly
/// 96 of these (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSlot {
    pub slot_ts: String,
    pub price_per_kwh: f64,
    pub region: String,
}

/// 96 slots per day, MM in {00, 15, 30, 45}.
pub const SLOTS_PER_DAY: usize = 96;
