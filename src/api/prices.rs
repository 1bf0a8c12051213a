use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::clock;

use super::state::AppState;
use super::window::{default_day_window, RangeQuery};

/// GET /api/prices — stored price slots in `[from, to)`, defaulting to
/// today's local calendar day.
pub async fn get_prices(State(state): State<AppState>, Query(q): Query<RangeQuery>) -> impl IntoResponse {
    let now_ts = clock::local_now_string(chrono::Utc::now(), state.cfg.timezone());
    let (from, to) = default_day_window(&q, &now_ts);
    match state.store.get_prices_for_range(&from, &to).await {
        Ok(slots) => Json(slots).into_response(),
        Err(e) => super::error::internal(e).into_response(),
    }
}
