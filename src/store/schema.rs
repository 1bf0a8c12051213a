//! `CREATE TABLE IF NOT EXISTS` statements, run once per connect. No
//! external migration tool: the schema is small and changes rarely
//! enough that a migrations directory would outweigh its benefit here.

use anyhow::Result;
use sqlx::SqlitePool;

pub async fn create_all(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS solar_readings (
            hour_ts TEXT PRIMARY KEY,
            irradiance_w_m2 REAL NOT NULL,
            forecast_kwh REAL,
            correction_applied REAL,
            actual_kwh REAL,
            correction REAL,
            confidence REAL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS correction_matrix (
            month INTEGER NOT NULL,
            day INTEGER NOT NULL,
            hour INTEGER NOT NULL,
            avg_correction REAL NOT NULL,
            total_weight REAL NOT NULL,
            count INTEGER NOT NULL,
            max_actual_kwh REAL NOT NULL,
            last_updated_ts TEXT,
            PRIMARY KEY (month, day, hour)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS smoothed_matrix (
            day_of_year INTEGER NOT NULL,
            hour INTEGER NOT NULL,
            avg_correction REAL NOT NULL,
            sample_count INTEGER NOT NULL,
            PRIMARY KEY (day_of_year, hour)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS prices (
            slot_ts TEXT PRIMARY KEY,
            price_per_kwh REAL NOT NULL,
            region TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS consumption (
            hour_ts TEXT PRIMARY KEY,
            watts REAL NOT NULL,
            outdoor_temp_c REAL,
            source TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS energy_snapshots (
            slot_ts TEXT PRIMARY KEY,
            pv_kwh REAL NOT NULL,
            load_kwh REAL NOT NULL,
            grid_import_kwh REAL NOT NULL,
            grid_export_kwh REAL NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schedule (
            slot_ts TEXT PRIMARY KEY,
            action TEXT NOT NULL,
            target_watts REAL NOT NULL,
            soc_start_pct REAL NOT NULL,
            soc_end_pct REAL NOT NULL,
            price_per_kwh REAL NOT NULL,
            solar_forecast_w REAL NOT NULL,
            consumption_w REAL NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS pipeline_runs (
            pipeline TEXT PRIMARY KEY,
            last_run_ts TEXT NOT NULL,
            status TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}
