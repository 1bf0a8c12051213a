use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::clock;

use super::state::AppState;
use super::window::{default_day_window, RangeQuery};

/// GET /api/solar — raw solar readings (irradiance, forecast, actual,
/// correction) in `[from, to)`, defaulting to today's local calendar day.
pub async fn get_solar(State(state): State<AppState>, Query(q): Query<RangeQuery>) -> impl IntoResponse {
    let now_ts = clock::local_now_string(chrono::Utc::now(), state.cfg.timezone());
    let (from, to) = default_day_window(&q, &now_ts);
    match state.store.readings_in_range(&from, &to).await {
        Ok(readings) => Json(readings).into_response(),
        Err(e) => super::error::internal(e).into_response(),
    }
}
