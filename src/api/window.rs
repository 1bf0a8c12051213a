use serde::Deserialize;

use crate::clock;

/// Optional `from`/`to` query parameters shared by the range-reading
/// endpoints. Both are local "YYYY-MM-DDTHH:MM" strings.
#[derive(Debug, Deserialize, Default)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Resolves a `RangeQuery` against today's local calendar day when
/// either bound is missing.
pub fn default_day_window(q: &RangeQuery, now_ts: &str) -> (String, String) {
    let today = &now_ts[0..10];
    let tomorrow = clock::add_days(today, 1);
    let from = q.from.clone().unwrap_or_else(|| format!("{today}T00:00"));
    let to = q.to.clone().unwrap_or_else(|| format!("{tomorrow}T00:00"));
    (from, to)
}
