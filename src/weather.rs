//! Weather provider contract (spec §1 "raw weather provider HTTP calls"
//! are out-of-core plumbing, specified only at their interface). The
//! fetch pipeline depends only on this trait.

use async_trait::async_trait;
use serde::Deserialize;

/// One hourly irradiance forecast point, local "YYYY-MM-DDTHH:00".
#[derive(Debug, Clone)]
pub struct IrradianceHour {
    pub hour_ts: String,
    pub irradiance_w_m2: f64,
}

/// One hourly outdoor temperature point, local "YYYY-MM-DDTHH:00".
#[derive(Debug, Clone)]
pub struct TemperatureHour {
    pub hour_ts: String,
    pub temperature_c: f64,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch_irradiance_forecast(&self, lat: f64, lon: f64, horizon_hours: u32) -> anyhow::Result<Vec<IrradianceHour>>;
    async fn fetch_temperature(&self, lat: f64, lon: f64, date: &str) -> anyhow::Result<Vec<TemperatureHour>>;
}

/// Thin client over a generic hourly-forecast HTTP API (e.g. Open-Meteo
/// style). Response shape is minimal and intentionally permissive since
/// the exact upstream contract is plumbing, out of the controller's core.
pub struct HttpWeatherProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpWeatherProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HourlyResponse {
    hourly: HourlyBlock,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    #[serde(default)]
    shortwave_radiation: Vec<f64>,
    #[serde(default)]
    temperature_2m: Vec<f64>,
}

#[async_trait]
impl WeatherProvider for HttpWeatherProvider {
    async fn fetch_irradiance_forecast(&self, lat: f64, lon: f64, horizon_hours: u32) -> anyhow::Result<Vec<IrradianceHour>> {
        let url = format!(
            "{}/v1/forecast?latitude={lat}&longitude={lon}&hourly=shortwave_radiation&forecast_hours={horizon_hours}",
            self.base_url
        );
        let resp: HourlyResponse = self.client.get(&url).send().await?.error_for_status()?.json().await?;
        Ok(resp
            .hourly
            .time
            .into_iter()
            .zip(resp.hourly.shortwave_radiation)
            .map(|(hour_ts, irradiance_w_m2)| IrradianceHour { hour_ts, irradiance_w_m2 })
            .collect())
    }

    async fn fetch_temperature(&self, lat: f64, lon: f64, date: &str) -> anyhow::Result<Vec<TemperatureHour>> {
        let url = format!(
            "{}/v1/forecast?latitude={lat}&longitude={lon}&hourly=temperature_2m&start_date={date}&end_date={date}",
            self.base_url
        );
        let resp: HourlyResponse = self.client.get(&url).send().await?.error_for_status()?.json().await?;
        Ok(resp
            .hourly
            .time
            .into_iter()
            .zip(resp.hourly.temperature_2m)
            .map(|(hour_ts, temperature_c)| TemperatureHour { hour_ts, temperature_c })
            .collect())
    }
}
