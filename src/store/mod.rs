//! Typed store facade over SQLite (spec §4.2, §3).
//!
//! Grounded on the teacher's `repo::pg::PgRepo` (one connection-pool owner
//! exposing named, typed operations) and `repo::prices::PriceRepository`
//! (per-entity query shape). The teacher splits one repository struct per
//! entity over a shared `PgPool`; this is collapsed into a single `Store`
//! facade matching spec §4.2's flat operation list, over a `SqlitePool`
//! instead of Postgres (this system is a single-tenant embedded-DB
//! service, not a multi-tenant web backend — noted in DESIGN.md).
//!
//! Every operation here can fail with a storage error; callers classify
//! the enclosing pipeline run as `error` but must never let that error
//! escape the process (spec §4.2 "Failure").

mod schema;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use crate::domain::{
    Action, ConsumptionReading, ConsumptionSource, CorrectionCell, EnergySnapshot, PipelineRun,
    PipelineStatus, PriceSlot, ScheduleSlot, SmoothedCell, SolarReading,
};

pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Connects (creating the file if absent) and runs the schema's
    /// `CREATE TABLE IF NOT EXISTS` statements once. No external
    /// migration tool is used: the schema is small and stable enough
    /// that version-gated migrations would be a premature abstraction.
    pub async fn connect(path: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .context("failed to open sqlite store")?;
        schema::create_all(&pool).await?;
        Ok(Self { pool })
    }

    /// In-memory store for tests.
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        schema::create_all(&pool).await?;
        Ok(Self { pool })
    }

    // ---- Solar readings ----------------------------------------------

    pub async fn upsert_irradiance(&self, hour_ts: &str, irr: f64) -> Result<()> {
        sqlx::query(
            "INSERT INTO solar_readings (hour_ts, irradiance_w_m2) VALUES (?1, ?2)
             ON CONFLICT(hour_ts) DO UPDATE SET irradiance_w_m2 = excluded.irradiance_w_m2",
        )
        .bind(hour_ts)
        .bind(irr)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_forecast(
        &self,
        hour_ts: &str,
        prod_forecast: f64,
        confidence: f64,
        correction_applied: f64,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE solar_readings SET forecast_kwh = ?2, confidence = ?3, correction_applied = ?4
             WHERE hour_ts = ?1",
        )
        .bind(hour_ts)
        .bind(prod_forecast)
        .bind(confidence)
        .bind(correction_applied)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_actual(&self, hour_ts: &str, prod_actual: f64) -> Result<()> {
        sqlx::query("UPDATE solar_readings SET actual_kwh = ?2 WHERE hour_ts = ?1")
            .bind(hour_ts)
            .bind(prod_actual)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_correction(&self, hour_ts: &str, correction: f64) -> Result<()> {
        sqlx::query("UPDATE solar_readings SET correction = ?2 WHERE hour_ts = ?1")
            .bind(hour_ts)
            .bind(correction)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_reading(&self, hour_ts: &str) -> Result<Option<SolarReading>> {
        let row = sqlx::query(
            "SELECT hour_ts, irradiance_w_m2, forecast_kwh, correction_applied, actual_kwh, correction, confidence
             FROM solar_readings WHERE hour_ts = ?1",
        )
        .bind(hour_ts)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(row_to_solar_reading))
    }

    pub async fn readings_missing_forecast(&self) -> Result<Vec<SolarReading>> {
        let rows = sqlx::query(
            "SELECT hour_ts, irradiance_w_m2, forecast_kwh, correction_applied, actual_kwh, correction, confidence
             FROM solar_readings WHERE forecast_kwh IS NULL AND irradiance_w_m2 IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_solar_reading).collect())
    }

    pub async fn get_unprocessed_actuals(&self) -> Result<Vec<SolarReading>> {
        let rows = sqlx::query(
            "SELECT hour_ts, irradiance_w_m2, forecast_kwh, correction_applied, actual_kwh, correction, confidence
             FROM solar_readings
             WHERE actual_kwh IS NOT NULL AND correction IS NULL AND forecast_kwh > 0",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_solar_reading).collect())
    }

    pub async fn get_readings_for_smoothing(&self) -> Result<Vec<SolarReading>> {
        let rows = sqlx::query(
            "SELECT hour_ts, irradiance_w_m2, forecast_kwh, correction_applied, actual_kwh, correction, confidence
             FROM solar_readings
             WHERE correction IS NOT NULL AND confidence IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_solar_reading).collect())
    }

    /// Most recent reading with a known actual for the given hour-of-day,
    /// used by the model's back-calculation fallback (spec §4.3 step 3).
    pub async fn latest_actual_for_hour(&self, hour: u32) -> Result<Option<SolarReading>> {
        let rows = sqlx::query(
            "SELECT hour_ts, irradiance_w_m2, forecast_kwh, correction_applied, actual_kwh, correction, confidence
             FROM solar_readings
             WHERE actual_kwh IS NOT NULL AND substr(hour_ts, 12, 2) = ?1
             ORDER BY hour_ts DESC LIMIT 1",
        )
        .bind(format!("{hour:02}"))
        .fetch_optional(&self.pool)
        .await?;
        Ok(rows.map(row_to_solar_reading))
    }

    /// Rows in `[from, to)` with a stored `correction_applied`, an actual,
    /// and positive irradiance — feeds the recency-bias window (§4.3 step 5).
    pub async fn readings_in_range(&self, from: &str, to: &str) -> Result<Vec<SolarReading>> {
        let rows = sqlx::query(
            "SELECT hour_ts, irradiance_w_m2, forecast_kwh, correction_applied, actual_kwh, correction, confidence
             FROM solar_readings WHERE hour_ts >= ?1 AND hour_ts < ?2 ORDER BY hour_ts ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_solar_reading).collect())
    }

    // ---- Correction matrix ---------------------------------------------

    pub async fn seed_correction_matrix_if_empty(&self) -> Result<()> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM correction_matrix")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for month in 1..=12u32 {
            for day in 1..=31u32 {
                for hour in 0..=23u32 {
                    if !CorrectionCell::is_valid_triple(month, day, hour) {
                        continue;
                    }
                    sqlx::query(
                        "INSERT INTO correction_matrix (month, day, hour, avg_correction, total_weight, count, max_actual_kwh, last_updated_ts)
                         VALUES (?1, ?2, ?3, 1.0, 0.0, 0, 0.0, NULL)",
                    )
                    .bind(month as i64)
                    .bind(day as i64)
                    .bind(hour as i64)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_correction_cell(&self, month: u32, day: u32, hour: u32) -> Result<Option<CorrectionCell>> {
        let row = sqlx::query(
            "SELECT month, day, hour, avg_correction, total_weight, count, max_actual_kwh, last_updated_ts
             FROM correction_matrix WHERE month = ?1 AND day = ?2 AND hour = ?3",
        )
        .bind(month as i64)
        .bind(day as i64)
        .bind(hour as i64)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(row_to_correction_cell))
    }

    pub async fn update_correction_matrix(&self, cell: &CorrectionCell) -> Result<()> {
        sqlx::query(
            "UPDATE correction_matrix SET avg_correction = ?4, total_weight = ?5, count = ?6,
             max_actual_kwh = ?7, last_updated_ts = ?8
             WHERE month = ?1 AND day = ?2 AND hour = ?3",
        )
        .bind(cell.month as i64)
        .bind(cell.day as i64)
        .bind(cell.hour as i64)
        .bind(cell.avg_correction)
        .bind(cell.total_weight)
        .bind(cell.count as i64)
        .bind(cell.max_actual_kwh)
        .bind(&cell.last_updated_ts)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ---- Smoothed matrix -------------------------------------------------

    pub async fn upsert_smoothed(&self, cell: &SmoothedCell) -> Result<()> {
        sqlx::query(
            "INSERT INTO smoothed_matrix (day_of_year, hour, avg_correction, sample_count)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(day_of_year, hour) DO UPDATE SET
               avg_correction = excluded.avg_correction, sample_count = excluded.sample_count",
        )
        .bind(cell.day_of_year as i64)
        .bind(cell.hour as i64)
        .bind(cell.avg_correction)
        .bind(cell.sample_count as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_smoothed(&self, day_of_year: u32, hour: u32) -> Result<Option<SmoothedCell>> {
        let row = sqlx::query(
            "SELECT day_of_year, hour, avg_correction, sample_count FROM smoothed_matrix
             WHERE day_of_year = ?1 AND hour = ?2",
        )
        .bind(day_of_year as i64)
        .bind(hour as i64)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| SmoothedCell {
            day_of_year: r.get::<i64, _>("day_of_year") as u32,
            hour: r.get::<i64, _>("hour") as u32,
            avg_correction: r.get("avg_correction"),
            sample_count: r.get::<i64, _>("sample_count") as u64,
        }))
    }

    // ---- Prices ------------------------------------------------------

    pub async fn upsert_price(&self, slot_ts: &str, price: f64, region: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO prices (slot_ts, price_per_kwh, region) VALUES (?1, ?2, ?3)
             ON CONFLICT(slot_ts) DO UPDATE SET price_per_kwh = excluded.price_per_kwh, region = excluded.region",
        )
        .bind(slot_ts)
        .bind(price)
        .bind(region)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_prices_for_range(&self, from: &str, to: &str) -> Result<Vec<PriceSlot>> {
        let rows = sqlx::query("SELECT slot_ts, price_per_kwh, region FROM prices WHERE slot_ts >= ?1 AND slot_ts < ?2 ORDER BY slot_ts ASC")
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| PriceSlot {
                slot_ts: r.get("slot_ts"),
                price_per_kwh: r.get("price_per_kwh"),
                region: r.get("region"),
            })
            .collect())
    }

    // ---- Consumption ---------------------------------------------------

    pub async fn upsert_consumption(
        &self,
        hour_ts: &str,
        watts: f64,
        temp: Option<f64>,
        source: ConsumptionSource,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO consumption (hour_ts, watts, outdoor_temp_c, source) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(hour_ts) DO UPDATE SET watts = excluded.watts, outdoor_temp_c = excluded.outdoor_temp_c, source = excluded.source",
        )
        .bind(hour_ts)
        .bind(watts)
        .bind(temp)
        .bind(source.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_consumption_for_range(&self, from: &str, to: &str) -> Result<Vec<ConsumptionReading>> {
        let rows = sqlx::query(
            "SELECT hour_ts, watts, outdoor_temp_c, source FROM consumption WHERE hour_ts >= ?1 AND hour_ts < ?2 ORDER BY hour_ts ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| ConsumptionReading {
                hour_ts: r.get("hour_ts"),
                watts: r.get("watts"),
                outdoor_temp_c: r.get("outdoor_temp_c"),
                source: ConsumptionSource::from_str(&r.get::<String, _>("source")).unwrap_or(ConsumptionSource::Flat),
            })
            .collect())
    }

    // ---- Energy snapshots ------------------------------------------------

    pub async fn upsert_energy_snapshot(&self, snap: &EnergySnapshot) -> Result<()> {
        sqlx::query(
            "INSERT INTO energy_snapshots (slot_ts, pv_kwh, load_kwh, grid_import_kwh, grid_export_kwh)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(slot_ts) DO UPDATE SET pv_kwh = excluded.pv_kwh, load_kwh = excluded.load_kwh,
               grid_import_kwh = excluded.grid_import_kwh, grid_export_kwh = excluded.grid_export_kwh",
        )
        .bind(&snap.slot_ts)
        .bind(snap.pv_kwh)
        .bind(snap.load_kwh)
        .bind(snap.grid_import_kwh)
        .bind(snap.grid_export_kwh)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All snapshots in `[from, to)`, for the dashboard's history view.
    pub async fn get_energy_snapshots_for_range(&self, from: &str, to: &str) -> Result<Vec<EnergySnapshot>> {
        let rows = sqlx::query(
            "SELECT slot_ts, pv_kwh, load_kwh, grid_import_kwh, grid_export_kwh FROM energy_snapshots
             WHERE slot_ts >= ?1 AND slot_ts < ?2 ORDER BY slot_ts ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| EnergySnapshot {
                slot_ts: r.get("slot_ts"),
                pv_kwh: r.get("pv_kwh"),
                load_kwh: r.get("load_kwh"),
                grid_import_kwh: r.get("grid_import_kwh"),
                grid_export_kwh: r.get("grid_export_kwh"),
            })
            .collect())
    }

    pub async fn get_snapshot_at_or_before(&self, ts: &str) -> Result<Option<EnergySnapshot>> {
        let row = sqlx::query(
            "SELECT slot_ts, pv_kwh, load_kwh, grid_import_kwh, grid_export_kwh FROM energy_snapshots
             WHERE slot_ts <= ?1 ORDER BY slot_ts DESC LIMIT 1",
        )
        .bind(ts)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| EnergySnapshot {
            slot_ts: r.get("slot_ts"),
            pv_kwh: r.get("pv_kwh"),
            load_kwh: r.get("load_kwh"),
            grid_import_kwh: r.get("grid_import_kwh"),
            grid_export_kwh: r.get("grid_export_kwh"),
        }))
    }

    // ---- Schedule --------------------------------------------------------

    /// Deletes `[from, to)` and inserts `slots` inside one transaction, so
    /// the schedule table never observes a partial replace (spec §3, §8).
    pub async fn replace_schedule_for_range(&self, from: &str, to: &str, slots: &[ScheduleSlot]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM schedule WHERE slot_ts >= ?1 AND slot_ts < ?2")
            .bind(from)
            .bind(to)
            .execute(&mut *tx)
            .await?;
        for slot in slots {
            sqlx::query(
                "INSERT INTO schedule (slot_ts, action, target_watts, soc_start_pct, soc_end_pct, price_per_kwh, solar_forecast_w, consumption_w)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(&slot.slot_ts)
            .bind(slot.action.to_string())
            .bind(slot.target_watts)
            .bind(slot.soc_start_pct)
            .bind(slot.soc_end_pct)
            .bind(slot.price_per_kwh)
            .bind(slot.solar_forecast_w)
            .bind(slot.consumption_w)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_schedule_for_range(&self, from: &str, to: &str) -> Result<Vec<ScheduleSlot>> {
        let rows = sqlx::query(
            "SELECT slot_ts, action, target_watts, soc_start_pct, soc_end_pct, price_per_kwh, solar_forecast_w, consumption_w
             FROM schedule WHERE slot_ts >= ?1 AND slot_ts < ?2 ORDER BY slot_ts ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_schedule_slot).collect())
    }

    // ---- Pipeline ledger ---------------------------------------------

    pub async fn record_pipeline_run(&self, pipeline: &str, last_run_ts: &str, status: PipelineStatus) -> Result<()> {
        sqlx::query(
            "INSERT INTO pipeline_runs (pipeline, last_run_ts, status) VALUES (?1, ?2, ?3)
             ON CONFLICT(pipeline) DO UPDATE SET last_run_ts = excluded.last_run_ts, status = excluded.status",
        )
        .bind(pipeline)
        .bind(last_run_ts)
        .bind(status.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_all_pipeline_runs(&self) -> Result<Vec<PipelineRun>> {
        let rows = sqlx::query("SELECT pipeline, last_run_ts, status FROM pipeline_runs")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| PipelineRun {
                pipeline: r.get("pipeline"),
                last_run_ts: r.get("last_run_ts"),
                status: PipelineStatus::from_str(&r.get::<String, _>("status")).unwrap_or(PipelineStatus::NeverRun),
            })
            .collect())
    }
}

fn row_to_solar_reading(r: sqlx::sqlite::SqliteRow) -> SolarReading {
    SolarReading {
        hour_ts: r.get("hour_ts"),
        irradiance_w_m2: r.get("irradiance_w_m2"),
        forecast_kwh: r.get("forecast_kwh"),
        correction_applied: r.get("correction_applied"),
        actual_kwh: r.get("actual_kwh"),
        correction: r.get("correction"),
        confidence: r.get("confidence"),
    }
}

fn row_to_correction_cell(r: sqlx::sqlite::SqliteRow) -> CorrectionCell {
    CorrectionCell {
        month: r.get::<i64, _>("month") as u32,
        day: r.get::<i64, _>("day") as u32,
        hour: r.get::<i64, _>("hour") as u32,
        avg_correction: r.get("avg_correction"),
        total_weight: r.get("total_weight"),
        count: r.get::<i64, _>("count") as u64,
        max_actual_kwh: r.get("max_actual_kwh"),
        last_updated_ts: r.get("last_updated_ts"),
    }
}

fn row_to_schedule_slot(r: sqlx::sqlite::SqliteRow) -> ScheduleSlot {
    ScheduleSlot {
        slot_ts: r.get("slot_ts"),
        action: Action::from_str(&r.get::<String, _>("action")).expect("valid action in store"),
        target_watts: r.get("target_watts"),
        soc_start_pct: r.get("soc_start_pct"),
        soc_end_pct: r.get("soc_end_pct"),
        price_per_kwh: r.get("price_per_kwh"),
        solar_forecast_w: r.get("solar_forecast_w"),
        consumption_w: r.get("consumption_w"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeding_matrix_twice_is_idempotent() {
        let store = Store::connect_in_memory().await.unwrap();
        store.seed_correction_matrix_if_empty().await.unwrap();
        let count_after_first: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM correction_matrix")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        store.seed_correction_matrix_if_empty().await.unwrap();
        let count_after_second: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM correction_matrix")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count_after_first, count_after_second);
        assert_eq!(count_after_first, 366 * 24);
    }

    #[tokio::test]
    async fn schedule_replace_is_atomic_delete_then_insert() {
        let store = Store::connect_in_memory().await.unwrap();
        let slot = ScheduleSlot {
            slot_ts: "2026-06-01T00:00".into(),
            action: Action::Idle,
            target_watts: 0.0,
            soc_start_pct: 50.0,
            soc_end_pct: 50.0,
            price_per_kwh: 1.0,
            solar_forecast_w: 0.0,
            consumption_w: 400.0,
        };
        store
            .replace_schedule_for_range("2026-06-01T00:00", "2026-06-02T00:00", &[slot.clone()])
            .await
            .unwrap();
        let got = store
            .get_schedule_for_range("2026-06-01T00:00", "2026-06-02T00:00")
            .await
            .unwrap();
        assert_eq!(got.len(), 1);

        store
            .replace_schedule_for_range("2026-06-01T00:00", "2026-06-02T00:00", &[])
            .await
            .unwrap();
        let got = store
            .get_schedule_for_range("2026-06-01T00:00", "2026-06-02T00:00")
            .await
            .unwrap();
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn pipeline_ledger_upserts_by_name() {
        let store = Store::connect_in_memory().await.unwrap();
        store
            .record_pipeline_run("fetch", "2026-06-01T00:00", PipelineStatus::Ok)
            .await
            .unwrap();
        store
            .record_pipeline_run("fetch", "2026-06-01T06:00", PipelineStatus::Error)
            .await
            .unwrap();
        let runs = store.get_all_pipeline_runs().await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, PipelineStatus::Error);
        assert_eq!(runs[0].last_run_ts, "2026-06-01T06:00");
    }

    // Synthetic snapshots generated with `fake`, one per 15-minute slot
    // across a day, to confirm `get_snapshot_at_or_before` picks the
    // latest row not after the query timestamp out of a realistically
    // sized table rather than just the one row a hand-written fixture
    // would cover.
    #[tokio::test]
    async fn snapshot_lookup_picks_latest_row_at_or_before_query_ts() {
        use fake::Fake;

        let store = Store::connect_in_memory().await.unwrap();
        let mut snapshots = Vec::new();
        for quarter_hour in 0..96u32 {
            let h = quarter_hour / 4;
            let m = (quarter_hour % 4) * 15;
            let slot_ts = format!("2026-06-01T{h:02}:{m:02}");
            let snapshot = EnergySnapshot {
                slot_ts: slot_ts.clone(),
                pv_kwh: (0.0..20.0).fake::<f64>(),
                load_kwh: (0.0..20.0).fake::<f64>(),
                grid_import_kwh: (0.0..20.0).fake::<f64>(),
                grid_export_kwh: (0.0..20.0).fake::<f64>(),
            };
            store.upsert_energy_snapshot(&snapshot).await.unwrap();
            snapshots.push(snapshot);
        }

        let found = store.get_snapshot_at_or_before("2026-06-01T10:07").await.unwrap().unwrap();
        assert_eq!(found.slot_ts, "2026-06-01T10:00");
        assert!(snapshots.iter().all(|s| s.is_valid()));
    }
}
