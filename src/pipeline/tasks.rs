//! The seven named pipeline bodies (spec §4.10). Each function does one
//! unit of work and returns `anyhow::Result<()>`; the orchestrator is
//! the only caller that decides what a failure means for the ledger.

use tracing::{info, warn};

use crate::clock;
use crate::config::AppConfig;
use crate::domain::{ConsumptionSource, EnergySnapshot};
use crate::forecast::consumption::TemperatureContext;
use crate::forecast::{estimate_consumption, run_forecast, run_learner, run_smoother};
use crate::inverter::InverterDriver;
use crate::optimizer::run_optimizer;
use crate::prices::{run_price_ingestor, PriceProvider};
use crate::prices::ingestor::SlotShape;
use crate::store::Store;
use crate::weather::WeatherProvider;

/// The next 24-hour window starting at the current hour, e.g.
/// "2026-06-01T10:00" → ("2026-06-01T10:00", "2026-06-02T10:00").
fn next_24h_window(now_ts: &str) -> (String, String) {
    let from = clock::hour_start(now_ts);
    let date = &from[0..10];
    let time = &from[10..];
    let to = format!("{}{}", clock::add_days(date, 1), time);
    (from, to)
}

fn price_shape(cfg: &AppConfig) -> SlotShape {
    match cfg.price.source {
        crate::config::PriceSource::Nordpool15m => SlotShape::Native,
        crate::config::PriceSource::Hourly => SlotShape::Hourly { mwh_denominated: true },
    }
}

/// fetch: pull an irradiance forecast, seed/update solar readings, run
/// the forecast model over whatever now lacks a forecast.
pub async fn run_fetch(
    store: &Store,
    cfg: &AppConfig,
    weather: &dyn WeatherProvider,
    now_ts: &str,
) -> anyhow::Result<()> {
    let hours = weather
        .fetch_irradiance_forecast(cfg.location.lat, cfg.location.lon, cfg.forecast.horizon_hours)
        .await?;
    for hour in &hours {
        store.upsert_irradiance(&hour.hour_ts, hour.irradiance_w_m2).await?;
    }
    let updated = run_forecast(store, cfg, now_ts).await?;
    info!(fetched = hours.len(), forecasted = updated, "fetch pipeline complete");
    Ok(())
}

/// learn: fold newly-actualized hours into the correction matrix.
pub async fn run_learn(store: &Store) -> anyhow::Result<()> {
    let n = run_learner(store).await?;
    info!(updated = n, "learn pipeline complete");
    Ok(())
}

/// smooth: rebuild the Gaussian cross-day smoothed matrix.
pub async fn run_smooth(store: &Store) -> anyhow::Result<()> {
    let n = run_smoother(store).await?;
    info!(cells = n, "smooth pipeline complete");
    Ok(())
}

/// consumption: fold last hour's consumption into the store — from the
/// energy-snapshot delta when both endpoints exist, otherwise from a
/// single instantaneous metrics read — tagged with the outdoor
/// temperature for that hour when the weather provider has it.
pub async fn run_consumption(
    store: &Store,
    cfg: &AppConfig,
    weather: &dyn WeatherProvider,
    driver: &dyn InverterDriver,
    now_ts: &str,
) -> anyhow::Result<()> {
    let hour_ts = clock::hour_start(now_ts);
    let prev_hour = previous_hour_ts(&hour_ts);
    let prev_date = &prev_hour[0..10];

    let outdoor_temp_c = match weather.fetch_temperature(cfg.location.lat, cfg.location.lon, prev_date).await {
        Ok(hours) => hours
            .iter()
            .find(|h| h.hour_ts == prev_hour)
            .map(|h| h.temperature_c),
        Err(e) => {
            warn!(error = %e, "temperature lookup failed, consumption row stored without it");
            None
        }
    };

    let snapshot_delta = match (
        store.get_snapshot_at_or_before(&hour_ts).await?,
        store.get_snapshot_at_or_before(&prev_hour).await?,
    ) {
        (Some(current), Some(prev)) => Some((current.load_kwh - prev.load_kwh).max(0.0) * 1000.0),
        _ => None,
    };

    let (watts, source) = match snapshot_delta {
        Some(w) => (w, ConsumptionSource::InverterDelta),
        None => {
            warn!("no energy-snapshot pair for the previous hour, falling back to an instantaneous metrics read");
            let metrics = driver.get_metrics().await?;
            (metrics.consumption_w, ConsumptionSource::InverterInstant)
        }
    };

    store.upsert_consumption(&prev_hour, watts, outdoor_temp_c, source).await?;
    info!(watts, ?source, "consumption pipeline complete");
    Ok(())
}

fn previous_hour_ts(hour_ts: &str) -> String {
    let hour: i64 = hour_ts[11..13].parse().expect("well-formed timestamp");
    if hour == 0 {
        let date = &hour_ts[0..10];
        format!("{}T23:00", clock::add_days(date, -1))
    } else {
        format!("{}T{:02}:00", &hour_ts[0..10], hour - 1)
    }
}

/// battery: fetch prices, estimate consumption and solar, read live SOC,
/// and replan the next 24-hour schedule.
pub async fn run_battery(
    store: &Store,
    cfg: &AppConfig,
    provider: &dyn PriceProvider,
    weather: &dyn WeatherProvider,
    driver: &dyn InverterDriver,
    now_ts: &str,
) -> anyhow::Result<()> {
    let today_date = &now_ts[0..10];
    run_price_ingestor(store, provider, &price_shape(cfg), &cfg.price.region, &cfg.archive_dir, today_date).await?;

    let yesterday_date = clock::add_days(today_date, -1);
    let yesterday_rows = store
        .get_consumption_for_range(&format!("{yesterday_date}T00:00"), &format!("{today_date}T00:00"))
        .await?;
    let mut yesterday_actual_c = [0.0f64; 24];
    let mut have_yesterday_temps = false;
    for row in &yesterday_rows {
        if let Some(t) = row.outdoor_temp_c {
            yesterday_actual_c[clock::hour_of_day(&row.hour_ts) as usize] = t;
            have_yesterday_temps = true;
        }
    }

    let today_forecast_c = match weather.fetch_temperature(cfg.location.lat, cfg.location.lon, today_date).await {
        Ok(hours) => {
            let mut arr = [0.0f64; 24];
            for h in &hours {
                arr[clock::hour_of_day(&h.hour_ts) as usize] = h.temperature_c;
            }
            Some(arr)
        }
        Err(e) => {
            warn!(error = %e, "temperature fetch failed, consumption estimate falls back to yesterday's raw watts");
            None
        }
    };

    let temps = TemperatureContext {
        today_forecast_c: today_forecast_c.as_ref(),
        yesterday_actual_c: if have_yesterday_temps { Some(&yesterday_actual_c) } else { None },
        regression: None,
    };
    let consumption_w = estimate_consumption(store, &cfg.consumption, today_date, &temps).await?;

    let (from, to) = next_24h_window(now_ts);
    let mut solar_forecast_w = [0.0f64; 24];
    let mut cursor = from.clone();
    for slot in solar_forecast_w.iter_mut() {
        if let Some(reading) = store.get_reading(&cursor).await? {
            *slot = reading.forecast_kwh.unwrap_or(0.0) * 1000.0;
        }
        cursor = next_hour_ts(&cursor);
    }

    let start_soc_pct = match driver.get_state().await {
        Ok(state) => Some(state.soc_pct),
        Err(e) => {
            warn!(error = %e, "could not read live SOC, optimizer seeds from battery.min_soc");
            None
        }
    };

    let output = run_optimizer(
        store,
        &cfg.battery,
        &cfg.grid,
        &from,
        &to,
        &solar_forecast_w,
        &consumption_w,
        cfg.consumption.flat_watts,
        start_soc_pct,
    )
    .await?;
    info!(
        slots = output.slots.len(),
        savings = output.summary.savings,
        "battery pipeline complete"
    );
    Ok(())
}

fn next_hour_ts(hour_ts: &str) -> String {
    let hour: i64 = hour_ts[11..13].parse().expect("well-formed timestamp");
    if hour == 23 {
        format!("{}T00:00", clock::add_days(&hour_ts[0..10], 1))
    } else {
        format!("{}T{:02}:00", &hour_ts[0..10], hour + 1)
    }
}

/// snapshot: read cumulative daily energy totals off the inverter and
/// upsert the running energy snapshot for this quarter-hour slot.
pub async fn run_snapshot(store: &Store, driver: &dyn InverterDriver, now_ts: &str) -> anyhow::Result<()> {
    let totals = driver.get_energy_totals().await?;
    let snap = EnergySnapshot {
        slot_ts: clock::slot_start(now_ts),
        pv_kwh: totals.pv_kwh,
        load_kwh: totals.load_kwh,
        grid_import_kwh: totals.grid_import_kwh,
        grid_export_kwh: totals.grid_export_kwh,
    };
    store.upsert_energy_snapshot(&snap).await?;
    Ok(())
}

/// execute: apply whichever schedule slot governs right now. On failure,
/// attempt exactly one `reset_to_default` and surface the original error.
pub async fn run_execute(store: &Store, driver: &dyn InverterDriver, now_ts: &str) -> anyhow::Result<()> {
    let window_from = clock::hour_start(now_ts);
    let window_to = {
        let (_, to) = next_24h_window(now_ts);
        to
    };
    let slots = store.get_schedule_for_range(&window_from, &window_to).await?;
    let future_slots: Vec<_> = slots.into_iter().filter(|s| s.slot_ts.as_str() <= now_ts).collect();

    match driver.apply_schedule(&future_slots, now_ts).await {
        Ok(outcome) => {
            info!(applied = outcome.applied, skipped = outcome.skipped, "execute pipeline complete");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "apply_schedule failed, attempting a single reset_to_default");
            if let Err(reset_err) = driver.reset_to_default().await {
                warn!(error = %reset_err, "reset_to_default also failed, leaving inverter state as-is");
            }
            Err(e)
        }
    }
}

