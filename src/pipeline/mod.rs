//! Pipeline orchestration (spec §4.10, §5 "single-process, cooperatively
//! scheduled event loop", §7 "Failure isolation").
//!
//! Grounded on the teacher's `controller::scheduler` (one spawned task
//! per periodic job against a shared `AppState`), collapsed here into a
//! single cooperative minute-tick loop: this system has seven named
//! pipelines with overlapping, interdependent schedules (the 15-minute
//! cluster must run snapshot, then execute, then battery in that order),
//! so one sequential loop makes the ordering explicit instead of relying
//! on task-spawn race avoidance.

pub mod tasks;

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::clock;
use crate::config::AppConfig;
use crate::domain::PipelineStatus;
use crate::error::ControllerError;
use crate::inverter::InverterDriver;
use crate::prices::PriceProvider;
use crate::store::Store;
use crate::weather::WeatherProvider;

const TICK_INTERVAL: Duration = Duration::from_secs(60);

pub struct Orchestrator {
    pub store: Arc<Store>,
    pub cfg: Arc<AppConfig>,
    pub driver: Arc<dyn InverterDriver>,
    pub price_provider: Arc<dyn PriceProvider>,
    pub weather: Arc<dyn WeatherProvider>,
}

impl Orchestrator {
    fn now_ts(&self) -> String {
        clock::local_now_string(chrono::Utc::now(), self.cfg.timezone())
    }

    /// Runs one named pipeline, swallowing its error into the ledger
    /// (spec §7 "every pipeline run updates the ledger with ok/error").
    async fn record<F, Fut>(&self, name: &str, now_ts: &str, f: F)
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<()>>,
    {
        let status = match f().await {
            Ok(()) => PipelineStatus::Ok,
            Err(e) => {
                let kind = ControllerError::classify(&e);
                error!(pipeline = name, kind, error = %e, "pipeline run failed");
                PipelineStatus::Error
            }
        };
        if let Err(e) = self.store.record_pipeline_run(name, now_ts, status).await {
            error!(pipeline = name, error = %e, "failed to update pipeline ledger");
        }
    }

    async fn fetch(&self, now_ts: &str) {
        self.record("fetch", now_ts, || tasks::run_fetch(&self.store, &self.cfg, self.weather.as_ref(), now_ts))
            .await;
    }

    async fn learn(&self, now_ts: &str) {
        self.record("learn", now_ts, || tasks::run_learn(&self.store)).await;
    }

    async fn smooth(&self, now_ts: &str) {
        self.record("smooth", now_ts, || tasks::run_smooth(&self.store)).await;
    }

    async fn consumption(&self, now_ts: &str) {
        self.record("consumption", now_ts, || {
            tasks::run_consumption(&self.store, &self.cfg, self.weather.as_ref(), self.driver.as_ref(), now_ts)
        })
        .await;
    }

    async fn battery(&self, now_ts: &str) {
        self.record("battery", now_ts, || {
            tasks::run_battery(
                &self.store,
                &self.cfg,
                self.price_provider.as_ref(),
                self.weather.as_ref(),
                self.driver.as_ref(),
                now_ts,
            )
        })
        .await;
    }

    async fn snapshot(&self, now_ts: &str) {
        self.record("snapshot", now_ts, || tasks::run_snapshot(&self.store, self.driver.as_ref(), now_ts))
            .await;
    }

    async fn execute(&self, now_ts: &str) {
        self.record("execute", now_ts, || tasks::run_execute(&self.store, self.driver.as_ref(), now_ts))
            .await;
    }

    /// The fused 15-minute cluster: snapshot, then execute, then battery
    /// when battery's own schedule happens to land on this tick (spec
    /// §4.10 "ordering"). In `data_collection_only` mode only snapshot
    /// runs — the controller never touches the inverter's actuators.
    async fn quarter_cluster(&self, now_ts: &str, hour: u32, minute: u32) {
        self.snapshot(now_ts).await;
        if self.cfg.inverter.data_collection_only {
            return;
        }
        self.execute(now_ts).await;
        if battery_due(hour, minute, self.cfg.price.day_ahead_hour) {
            self.battery(now_ts).await;
        }
    }

    async fn tick(&self, now_ts: &str) {
        let hour = clock::hour_of_day(now_ts);
        let minute = clock::minute_of_hour(now_ts);

        if fetch_due(hour, minute, self.cfg.forecast.fetch_interval_hours) {
            self.fetch(now_ts).await;
        }
        if minute == 0 {
            self.learn(now_ts).await;
        }
        if hour == 2 && minute == 0 {
            self.smooth(now_ts).await;
        }
        if minute == 5 {
            self.consumption(now_ts).await;
        }
        if minute % 15 == 0 {
            self.quarter_cluster(now_ts, hour, minute).await;
        }
    }

    /// Startup sequence (spec §7): the non-write pipelines run once,
    /// immediately, in table order, then execute+replan unless
    /// `data_collection_only`.
    pub async fn run_startup(&self) {
        let now_ts = self.now_ts();
        if let Err(e) = self.store.seed_correction_matrix_if_empty().await {
            error!(error = %e, "failed to seed correction matrix at startup");
        }
        info!(now = %now_ts, "running startup pipeline sequence");
        self.fetch(&now_ts).await;
        self.learn(&now_ts).await;
        self.smooth(&now_ts).await;
        self.battery(&now_ts).await;
        self.consumption(&now_ts).await;
        self.snapshot(&now_ts).await;
        if !self.cfg.inverter.data_collection_only {
            self.execute(&now_ts).await;
            self.battery(&now_ts).await;
        }
    }

    /// The cooperative minute-tick loop. Runs until the process exits.
    pub async fn run_forever(self: Arc<Self>) {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            interval.tick().await;
            let now_ts = self.now_ts();
            self.tick(&now_ts).await;
        }
    }
}

/// battery: at `day_ahead_hour`+:15, and at every hour's :30 (spec §4.10).
fn battery_due(hour: u32, minute: u32, day_ahead_hour: u32) -> bool {
    (hour == day_ahead_hour && minute == 15) || minute == 30
}

/// fetch: every `fetch_interval_hours`, on the hour (spec §4.10).
fn fetch_due(hour: u32, minute: u32, fetch_interval_hours: u32) -> bool {
    minute == 0 && hour % fetch_interval_hours.max(1) == 0
}
