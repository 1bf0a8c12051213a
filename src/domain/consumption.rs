use serde::{Deserialize, Serialize};

/// An estimated or measured household consumption reading for one hour
/// (spec §3 "Consumption reading").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionReading {
    pub hour_ts: String,
    pub watts: f64,
    pub outdoor_temp_c: Option<f64>,
    pub source: ConsumptionSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConsumptionSource {
    InverterDelta,
    InverterInstant,
    Manual,
    Flat,
}
