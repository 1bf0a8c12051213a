//! Irradiance-weighted incremental learner (spec §4.4). The sole writer
//! of correction-matrix cells (spec §5 ordering rule, §9 "Global state").

use crate::clock;
use crate::store::Store;

const IRRADIANCE_HALF_SATURATION: f64 = 50.0;

/// `actual / forecast`. The caller has already filtered out non-positive
/// forecasts.
fn correction_of(actual: f64, forecast: f64) -> f64 {
    actual / forecast
}

/// Irradiance-weighted confidence in `[0, 1)`: zero irradiance carries no
/// weight, and weight saturates toward 1 as irradiance grows.
fn irradiance_weight(irradiance_w_m2: f64) -> f64 {
    if irradiance_w_m2 > 0.0 {
        irradiance_w_m2 / (irradiance_w_m2 + IRRADIANCE_HALF_SATURATION)
    } else {
        0.0
    }
}

/// Folds one `(correction, weight, actual)` observation into a matrix
/// cell's running weighted average (spec §4.4). Pulled out as a pure
/// function so the update arithmetic can be property-tested without a
/// store.
fn fold_correction(mut cell: crate::domain::CorrectionCell, correction: f64, weight: f64, actual: f64, hour_ts: &str) -> crate::domain::CorrectionCell {
    let new_total_weight = cell.total_weight + weight;
    cell.avg_correction = if new_total_weight == 0.0 {
        correction
    } else {
        (cell.avg_correction * cell.total_weight + correction * weight) / new_total_weight
    };
    cell.total_weight = new_total_weight;
    cell.count += 1;
    cell.max_actual_kwh = cell.max_actual_kwh.max(actual);
    cell.last_updated_ts = Some(hour_ts.to_string());
    cell
}

/// Consumes every unprocessed actual, folding it into its matrix cell's
/// weighted running average. Idempotent: re-running with no new
/// unprocessed actuals touches nothing, since `get_unprocessed_actuals`
/// only returns rows without a stored `correction`.
pub async fn run_learner(store: &Store) -> anyhow::Result<usize> {
    let rows = store.get_unprocessed_actuals().await?;
    let mut processed = 0;
    for row in rows {
        let forecast = row.forecast_kwh.expect("filtered by get_unprocessed_actuals");
        let actual = row.actual_kwh.expect("filtered by get_unprocessed_actuals");
        if forecast <= 0.0 {
            continue;
        }
        let correction = correction_of(actual, forecast);
        let weight = irradiance_weight(row.irradiance_w_m2);

        let (_year, month, day) = clock::year_month_day(&row.hour_ts);
        let hour = clock::hour_of_day(&row.hour_ts);
        let cell = store
            .get_correction_cell(month, day, hour)
            .await?
            .unwrap_or_else(|| crate::domain::CorrectionCell::seeded(month, day, hour));
        let cell = fold_correction(cell, correction, weight, actual, &row.hour_ts);

        store.update_correction(&row.hour_ts, correction).await?;
        store.update_correction_matrix(&cell).await?;
        processed += 1;
    }
    Ok(processed)
}
