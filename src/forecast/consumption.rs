//! Consumption estimator (spec §4.6): 24 hourly watt estimates for
//! today, from yesterday's readings adjusted for a temperature delta,
//! or a flat fallback.

use crate::clock;
use crate::config::{ClimateKind, ConsumptionConfig, ConsumptionSourceKind};
use crate::store::Store;

const FACTOR_MIN: f64 = 0.7;
const FACTOR_MAX: f64 = 1.3;

/// A learned per-hour temperature→consumption regression, if one is
/// available for that hour. Nothing in this system currently trains
/// these; the hook exists so a future learner can populate it without
/// changing the estimator's call shape.
pub type HourlyRegression = [Option<(f64, f64)>; 24];

pub struct TemperatureContext<'a> {
    pub today_forecast_c: Option<&'a [f64; 24]>,
    pub yesterday_actual_c: Option<&'a [f64; 24]>,
    pub regression: Option<&'a HourlyRegression>,
}

/// Produces exactly 24 hourly watt estimates for `today_date`
/// ("YYYY-MM-DD").
pub async fn estimate_consumption(
    store: &Store,
    cfg: &ConsumptionConfig,
    today_date: &str,
    temps: &TemperatureContext<'_>,
) -> anyhow::Result<[f64; 24]> {
    if cfg.source != ConsumptionSourceKind::Yesterday {
        return Ok([cfg.flat_watts; 24]);
    }

    let yesterday_date = clock::add_days(today_date, -1);
    let rows = store
        .get_consumption_for_range(&format!("{yesterday_date}T00:00"), &format!("{today_date}T00:00"))
        .await?;
    if rows.is_empty() {
        return Ok([cfg.flat_watts; 24]);
    }

    let mut yesterday_watts: [Option<f64>; 24] = [None; 24];
    for row in &rows {
        let hour = clock::hour_of_day(&row.hour_ts) as usize;
        yesterday_watts[hour] = Some(row.watts);
    }

    let mut out = [cfg.flat_watts; 24];
    for hour in 0..24usize {
        out[hour] = estimate_hour(cfg, hour, yesterday_watts[hour], temps);
    }
    Ok(out)
}

fn estimate_hour(
    cfg: &ConsumptionConfig,
    hour: usize,
    yesterday_w: Option<f64>,
    temps: &TemperatureContext<'_>,
) -> f64 {
    if let (Some(regression), Some(today_temps)) = (temps.regression, temps.today_forecast_c) {
        if let Some((slope, intercept)) = regression[hour] {
            let t = today_temps[hour];
            return (slope * t + intercept).clamp(100.0, 3.0 * cfg.flat_watts);
        }
    }

    let Some(yesterday_w) = yesterday_w else {
        return cfg.flat_watts;
    };

    let (Some(today_temps), Some(yesterday_temps)) = (temps.today_forecast_c, temps.yesterday_actual_c) else {
        return yesterday_w;
    };

    let delta_t = today_temps[hour] - yesterday_temps[hour];
    let s = cfg.heating_sensitivity;
    let factor = match cfg.climate {
        ClimateKind::Heating => 1.0 - delta_t * s,
        ClimateKind::Cooling => 1.0 + delta_t * s,
    }
    .clamp(FACTOR_MIN, FACTOR_MAX);

    yesterday_w * factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConsumptionSource;
    use crate::store::Store;

    fn cfg() -> ConsumptionConfig {
        ConsumptionConfig {
            source: ConsumptionSourceKind::Yesterday,
            heating_sensitivity: 0.03,
            climate: ClimateKind::Heating,
            flat_watts: 500.0,
        }
    }

    #[tokio::test]
    async fn falls_back_to_flat_when_no_yesterday_rows() {
        let store = Store::connect_in_memory().await.unwrap();
        let temps = TemperatureContext {
            today_forecast_c: None,
            yesterday_actual_c: None,
            regression: None,
        };
        let out = estimate_consumption(&store, &cfg(), "2026-06-02", &temps).await.unwrap();
        assert_eq!(out, [500.0; 24]);
    }

    #[tokio::test]
    async fn uses_yesterday_watts_unmodified_without_temperature_data() {
        let store = Store::connect_in_memory().await.unwrap();
        store
            .upsert_consumption("2026-06-01T10:00", 600.0, None, ConsumptionSource::InverterDelta)
            .await
            .unwrap();
        let temps = TemperatureContext {
            today_forecast_c: None,
            yesterday_actual_c: None,
            regression: None,
        };
        let out = estimate_consumption(&store, &cfg(), "2026-06-02", &temps).await.unwrap();
        assert_eq!(out[10], 600.0);
        assert_eq!(out[11], 500.0);
    }

    #[tokio::test]
    async fn colder_today_increases_heating_climate_consumption() {
        let store = Store::connect_in_memory().await.unwrap();
        store
            .upsert_consumption("2026-06-01T10:00", 600.0, Some(15.0), ConsumptionSource::InverterDelta)
            .await
            .unwrap();
        let mut today = [15.0; 24];
        today[10] = 5.0;
        let yesterday = [15.0; 24];
        let temps = TemperatureContext {
            today_forecast_c: Some(&today),
            yesterday_actual_c: Some(&yesterday),
            regression: None,
        };
        let out = estimate_consumption(&store, &cfg(), "2026-06-02", &temps).await.unwrap();
        assert!(out[10] > 600.0);
    }

    #[test]
    fn hourly_factor_is_clamped_to_thirty_percent_band() {
        let cfg = cfg();
        let mut today = [0.0; 24];
        let mut yesterday = [0.0; 24];
        today[0] = -100.0;
        yesterday[0] = 0.0;
        let temps = TemperatureContext {
            today_forecast_c: Some(&today),
            yesterday_actual_c: Some(&yesterday),
            regression: None,
        };
        let estimate = estimate_hour(&cfg, 0, Some(1000.0), &temps);
        assert!((estimate - 1300.0).abs() < 1e-9);
    }
}
