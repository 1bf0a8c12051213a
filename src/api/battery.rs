use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::{http::StatusCode, Json};
use serde::Deserialize;

use crate::clock;

use super::state::AppState;
use super::window::{default_day_window, RangeQuery};

/// GET /battery/schedule — the persisted schedule in `[from, to)`,
/// defaulting to today's local calendar day.
pub async fn get_schedule(State(state): State<AppState>, Query(q): Query<RangeQuery>) -> impl IntoResponse {
    let now_ts = clock::local_now_string(chrono::Utc::now(), state.cfg.timezone());
    let (from, to) = default_day_window(&q, &now_ts);
    match state.store.get_schedule_for_range(&from, &to).await {
        Ok(slots) => Json(slots).into_response(),
        Err(e) => super::error::internal(e).into_response(),
    }
}

/// GET /battery/history — energy snapshots in `[from, to)`, defaulting
/// to today's local calendar day.
pub async fn get_history(State(state): State<AppState>, Query(q): Query<RangeQuery>) -> impl IntoResponse {
    let now_ts = clock::local_now_string(chrono::Utc::now(), state.cfg.timezone());
    let (from, to) = default_day_window(&q, &now_ts);
    match state.store.get_energy_snapshots_for_range(&from, &to).await {
        Ok(snaps) => Json(snaps).into_response(),
        Err(e) => super::error::internal(e).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct PeakShavingRequest {
    pub kw: f64,
}

/// POST /battery/control/{charge,discharge,idle,peak-shaving} — manual
/// overrides of the reserved-SOC-floor strategy (spec §4.9).
pub async fn control(
    State(state): State<AppState>,
    Path(action): Path<String>,
    body: axum::body::Bytes,
) -> impl IntoResponse {
    match action.as_str() {
        "charge" => match state.driver.charge().await {
            Ok(result) => Json(result).into_response(),
            Err(e) => super::error::internal(e).into_response(),
        },
        "discharge" => match state.driver.discharge().await {
            Ok(result) => Json(result).into_response(),
            Err(e) => super::error::internal(e).into_response(),
        },
        "idle" => match state.driver.idle().await {
            Ok(result) => Json(result).into_response(),
            Err(e) => super::error::internal(e).into_response(),
        },
        "peak-shaving" => {
            let req: PeakShavingRequest = match serde_json::from_slice(&body) {
                Ok(r) => r,
                Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            };
            match state.driver.set_peak_shaving_target(req.kw).await {
                Ok(()) => StatusCode::NO_CONTENT.into_response(),
                Err(e) => super::error::internal(e).into_response(),
            }
        }
        other => (StatusCode::NOT_FOUND, format!("unknown control action: {other}")).into_response(),
    }
}
