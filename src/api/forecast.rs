use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::clock;

use super::state::AppState;
use super::window::{default_day_window, RangeQuery};

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    #[serde(flatten)]
    pub range: RangeQuery,
}

/// GET /forecast — forecast production for each hour in `[from, to)`,
/// defaulting to today's local calendar day.
pub async fn get_forecast(State(state): State<AppState>, Query(q): Query<ForecastQuery>) -> impl IntoResponse {
    let now_ts = clock::local_now_string(chrono::Utc::now(), state.cfg.timezone());
    let (from, to) = default_day_window(&q.range, &now_ts);

    let mut hours = Vec::new();
    let mut cursor = from.clone();
    while cursor < to {
        if let Ok(Some(reading)) = state.store.get_reading(&cursor).await {
            hours.push(reading);
        }
        cursor = next_hour(&cursor);
    }
    Json(hours)
}

fn next_hour(hour_ts: &str) -> String {
    let hour: i64 = hour_ts[11..13].parse().expect("well-formed timestamp");
    if hour == 23 {
        format!("{}T00:00", clock::add_days(&hour_ts[0..10], 1))
    } else {
        format!("{}T{:02}:00", &hour_ts[0..10], hour + 1)
    }
}

