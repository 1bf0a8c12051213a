//! Concrete [`PriceProvider`] implementations (spec §4.7, §6 "Price
//! provider contract"). Grounded on the teacher's
//! `forecast::prices::ElprisetJustNuPriceForecaster`: a `reqwest`
//! client with a fixed user agent, hitting a per-date JSON endpoint and
//! treating a non-success response as "not published yet" rather than
//! a hard error.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::warn;

use super::provider::{FetchOutcome, PriceProvider, RawSlot};

fn http_client() -> anyhow::Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("pv-battery-controller/1.0"));
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .default_headers(headers)
        .build()?)
}

fn split_date(date: &str) -> anyhow::Result<(i32, u32, u32)> {
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d")?;
    Ok((d.year(), d.month(), d.day()))
}

/// Hourly day-ahead prices from elprisetjustnu.se, one JSON document per
/// calendar date and bidding area. A 404 means tomorrow's prices have
/// not been published yet, which the ingestor treats as `Absent`, not
/// an error (spec §4.7 "Absent").
pub struct ElprisetJustNuProvider {
    base_url: String,
    client: reqwest::Client,
}

impl ElprisetJustNuProvider {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            client: http_client()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ElprisetEntry {
    #[serde(rename = "SEK_per_kWh")]
    sek_per_kwh: f64,
    time_start: String,
}

#[async_trait]
impl PriceProvider for ElprisetJustNuProvider {
    async fn fetch(&self, date: &str, region: &str) -> anyhow::Result<FetchOutcome> {
        let (y, m, d) = split_date(date)?;
        let url = format!(
            "{}/api/v1/prices/{y:04}/{m:02}-{d:02}_{region}.json",
            self.base_url.trim_end_matches('/')
        );
        let resp = self.client.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(FetchOutcome::Absent);
        }
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            warn!(%status, url, "price provider returned a non-404 error, treating as absent");
            return Ok(FetchOutcome::Absent);
        }
        let entries: Vec<ElprisetEntry> = serde_json::from_str(&body)?;
        let slots = entries
            .into_iter()
            .map(|e| RawSlot {
                local_ts: e.time_start[0..16].to_string(),
                price_per_kwh: e.sek_per_kwh,
            })
            .collect();
        Ok(FetchOutcome::Present { slots, raw: body })
    }
}

/// Native 15-minute day-ahead prices from Nord Pool's public data
/// portal. Shares the same absent-on-not-found contract.
pub struct NordpoolProvider {
    base_url: String,
    client: reqwest::Client,
}

impl NordpoolProvider {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            client: http_client()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct NordpoolEntry {
    #[serde(rename = "deliveryStart")]
    delivery_start: String,
    price: f64,
}

#[derive(Debug, Deserialize)]
struct NordpoolResponse {
    entries: Vec<NordpoolEntry>,
}

#[async_trait]
impl PriceProvider for NordpoolProvider {
    async fn fetch(&self, date: &str, region: &str) -> anyhow::Result<FetchOutcome> {
        let url = format!(
            "{}/api/v1/prices?date={date}&market=DayAhead&deliveryArea={region}",
            self.base_url.trim_end_matches('/')
        );
        let resp = self.client.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(FetchOutcome::Absent);
        }
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            warn!(%status, url, "price provider returned a non-404 error, treating as absent");
            return Ok(FetchOutcome::Absent);
        }
        let parsed: NordpoolResponse = serde_json::from_str(&body)?;
        let slots = parsed
            .entries
            .into_iter()
            .map(|e| RawSlot {
                local_ts: e.delivery_start[0..16].to_string(),
                price_per_kwh: e.price / 1000.0,
            })
            .collect();
        Ok(FetchOutcome::Present { slots, raw: body })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn elpriset_just_nu_parses_a_published_day() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/prices/2026/06-01_SE3.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"SEK_per_kWh": 0.42, "time_start": "2026-06-01T00:00:00+02:00"},
                {"SEK_per_kWh": 0.39, "time_start": "2026-06-01T01:00:00+02:00"},
            ])))
            .mount(&server)
            .await;

        let provider = ElprisetJustNuProvider::new(server.uri()).unwrap();
        let outcome = provider.fetch("2026-06-01", "SE3").await.unwrap();
        match outcome {
            FetchOutcome::Present { slots, .. } => {
                assert_eq!(slots.len(), 2);
                assert_eq!(slots[0].local_ts, "2026-06-01T00:00");
                assert_eq!(slots[0].price_per_kwh, 0.42);
            }
            FetchOutcome::Absent => panic!("expected a published day"),
        }
    }

    #[tokio::test]
    async fn elpriset_just_nu_treats_404_as_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/prices/2026/06-02_SE3.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = ElprisetJustNuProvider::new(server.uri()).unwrap();
        let outcome = provider.fetch("2026-06-02", "SE3").await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Absent));
    }

    #[tokio::test]
    async fn nordpool_parses_entries_and_converts_to_kwh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/prices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "entries": [
                    {"deliveryStart": "2026-06-01T00:00:00Z", "price": 420.0},
                ]
            })))
            .mount(&server)
            .await;

        let provider = NordpoolProvider::new(server.uri()).unwrap();
        let outcome = provider.fetch("2026-06-01", "SE3").await.unwrap();
        match outcome {
            FetchOutcome::Present { slots, .. } => {
                assert_eq!(slots.len(), 1);
                assert_eq!(slots[0].price_per_kwh, 0.42);
            }
            FetchOutcome::Absent => panic!("expected a published day"),
        }
    }
}
