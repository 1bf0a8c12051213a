//! Gaussian cross-day-of-year smoother (spec §4.5). The sole writer of
//! the smoothed matrix; never touches the raw correction matrix.

use std::collections::HashMap;

use crate::clock;
use crate::domain::SmoothedCell;
use crate::store::Store;

const SIGMA_DAYS: f64 = 3.0;
const WINDOW: i32 = 7;
const DAYS_IN_YEAR: i32 = 365;

struct Contribution {
    correction: f64,
    confidence: f64,
    actual_kwh: Option<f64>,
}

/// Rebuilds the whole smoothed table from current raw readings.
/// Deterministic in its inputs: running twice with the same readings
/// produces byte-identical smoothed cells.
pub async fn run_smoother(store: &Store) -> anyhow::Result<usize> {
    let readings = store.get_readings_for_smoothing().await?;

    let mut by_day_hour: HashMap<(u32, u32), Vec<Contribution>> = HashMap::new();
    for r in &readings {
        // Day 366 (Feb 29) folds into day 365's contributions; it is not
        // itself a smoothed key (spec §4.5).
        let doy = clock::day_of_year(&r.hour_ts).min(DAYS_IN_YEAR as u32);
        let hour = clock::hour_of_day(&r.hour_ts);
        by_day_hour.entry((doy, hour)).or_default().push(Contribution {
            correction: r.correction.expect("filtered by get_readings_for_smoothing"),
            confidence: r.confidence.expect("filtered by get_readings_for_smoothing"),
            actual_kwh: r.actual_kwh,
        });
    }

    let mut written = 0;
    for day in 1..=DAYS_IN_YEAR {
        for hour in 0..=23u32 {
            let mut weighted_sum = 0.0;
            let mut weight_sum = 0.0;
            let mut sample_count: u64 = 0;

            for off in -WINDOW..=WINDOW {
                let neighbor_day = (((day + off - 1).rem_euclid(DAYS_IN_YEAR)) + 1) as u32;
                let dist_raw = off.unsigned_abs() as f64;
                let dist = dist_raw.min(DAYS_IN_YEAR as f64 - dist_raw);
                let gauss = (-(dist * dist) / (2.0 * SIGMA_DAYS * SIGMA_DAYS)).exp();

                if let Some(contribs) = by_day_hour.get(&(neighbor_day, hour)) {
                    for c in contribs {
                        let prod_weight = match c.actual_kwh {
                            Some(a) if a > 0.0 => (a / 2.0).min(1.0),
                            _ => 0.1,
                        };
                        let weight = gauss * c.confidence * prod_weight;
                        weighted_sum += c.correction * weight;
                        weight_sum += weight;
                        sample_count += 1;
                    }
                }
            }

            if weight_sum > 0.0 {
                let cell = SmoothedCell {
                    day_of_year: day as u32,
                    hour,
                    avg_correction: weighted_sum / weight_sum,
                    sample_count,
                };
                store.upsert_smoothed(&cell).await?;
                written += 1;
            }
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn smoothing_twice_on_same_input_is_idempotent() {
        let store = Store::connect_in_memory().await.unwrap();
        store.upsert_irradiance("2026-06-15T12:00", 700.0).await.unwrap();
        store.update_forecast("2026-06-15T12:00", 3.0, 0.9, 1.0).await.unwrap();
        store.update_actual("2026-06-15T12:00", 3.3).await.unwrap();
        store.update_correction("2026-06-15T12:00", 1.1).await.unwrap();

        run_smoother(&store).await.unwrap();
        let first = store.get_smoothed(166, 12).await.unwrap().unwrap();
        run_smoother(&store).await.unwrap();
        let second = store.get_smoothed(166, 12).await.unwrap().unwrap();

        assert_eq!(first, second);
        assert!(first.sample_count > 0);
    }
}
