use serde::{Deserialize, Serialize};

/// A solar production reading for a single hour, keyed by an hour-aligned
/// local timestamp ("YYYY-MM-DDTHH:00"). See spec §3 "Solar reading".
///
/// Lifecycle: created by the weather parser with `irradiance_w_m2` set;
/// mutated by the forecast model (`forecast_kwh`, `confidence`,
/// `correction_applied`); then by telemetry (`actual_kwh`); then by the
/// learner (`correction`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarReading {
    pub hour_ts: String,
    pub irradiance_w_m2: f64,
    pub forecast_kwh: Option<f64>,
    /// The matrix+fallback blended correction actually applied when
    /// producing `forecast_kwh` (excludes the recency-bias scalar `b`).
    pub correction_applied: Option<f64>,
    pub actual_kwh: Option<f64>,
    /// `actual_kwh / forecast_kwh`, set only once both are known.
    pub correction: Option<f64>,
    pub confidence: Option<f64>,
}

impl SolarReading {
    pub fn seed(hour_ts: impl Into<String>, irradiance_w_m2: f64) -> Self {
        Self {
            hour_ts: hour_ts.into(),
            irradiance_w_m2: irradiance_w_m2.max(0.0),
            forecast_kwh: None,
            correction_applied: None,
            actual_kwh: None,
            correction: None,
            confidence: None,
        }
    }

    /// True once this row is eligible for the learner: an actual is known,
    /// no correction has been derived yet, and the forecast is positive.
    pub fn is_unprocessed_actual(&self) -> bool {
        matches!(
            (self.actual_kwh, self.forecast_kwh, self.correction),
            (Some(_), Some(f), None) if f > 0.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_clamps_negative_irradiance() {
        let r = SolarReading::seed("2026-06-01T10:00", -5.0);
        assert_eq!(r.irradiance_w_m2, 0.0);
    }

    #[test]
    fn unprocessed_actual_requires_positive_forecast_and_no_correction() {
        let mut r = SolarReading::seed("2026-06-01T10:00", 500.0);
        assert!(!r.is_unprocessed_actual());
        r.forecast_kwh = Some(1.2);
        r.actual_kwh = Some(1.0);
        assert!(r.is_unprocessed_actual());
        r.correction = Some(0.83);
        assert!(!r.is_unprocessed_actual());
    }
}
