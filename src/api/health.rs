use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::clock;
use crate::domain::PipelineStatus;

use super::state::AppState;

#[derive(Debug, Serialize)]
pub struct PipelineHealth {
    pipeline: String,
    last_run_ts: String,
    status: PipelineStatus,
    overdue: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    healthy: bool,
    pipelines: Vec<PipelineHealth>,
}

/// Expected tick interval per pipeline, in minutes, for overdue
/// detection (spec §4.10's schedule table, §6 "GET /health").
fn expected_interval_minutes(pipeline: &str, cfg: &crate::config::AppConfig) -> u32 {
    match pipeline {
        "fetch" => cfg.forecast.fetch_interval_hours * 60,
        "learn" => 60,
        "smooth" => 24 * 60,
        "battery" => 60,
        "consumption" => 60,
        "snapshot" => 15,
        "execute" => 15,
        _ => 60,
    }
}

/// GET /health — 503 if any pipeline's last run is an error, or is
/// overdue by more than 1.5x its expected interval.
pub async fn get_health(State(state): State<AppState>) -> impl IntoResponse {
    let now_ts = clock::local_now_string(chrono::Utc::now(), state.cfg.timezone());
    let runs = match state.store.get_all_pipeline_runs().await {
        Ok(runs) => runs,
        Err(e) => return super::error::internal(e).into_response(),
    };

    let mut healthy = true;
    let pipelines: Vec<PipelineHealth> = runs
        .into_iter()
        .map(|run| {
            let interval_minutes = expected_interval_minutes(&run.pipeline, &state.cfg);
            let overdue = minutes_since(&run.last_run_ts, &now_ts, state.cfg.timezone())
                .map(|elapsed| elapsed as f64 > interval_minutes as f64 * 1.5)
                .unwrap_or(true);
            if overdue || run.status == PipelineStatus::Error {
                healthy = false;
            }
            PipelineHealth {
                pipeline: run.pipeline,
                last_run_ts: run.last_run_ts,
                status: run.status,
                overdue,
            }
        })
        .collect();

    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(HealthResponse { healthy, pipelines })).into_response()
}

fn minutes_since(last_run_ts: &str, now_ts: &str, tz: chrono_tz::Tz) -> Option<i64> {
    let last = clock::parse_in_zone(last_run_ts, tz)?;
    let now = clock::parse_in_zone(now_ts, tz)?;
    Some((now - last).num_minutes())
}
