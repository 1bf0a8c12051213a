//! Configuration loading and startup validation (spec §6).
//!
//! Grounded on the teacher's `figment`(TOML + env)-backed `AppConfig` with
//! `validator::Validate` derives (`open-energy-controller`'s
//! `src/config.rs`). Any validation failure is fatal at startup: the
//! caller prints one readable line and exits, per spec §7.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_config"))]
pub struct AppConfig {
    #[validate(nested)]
    pub location: LocationConfig,
    #[validate(nested)]
    pub panel: PanelConfig,
    #[validate(nested)]
    pub learning: LearningConfig,
    #[validate(nested)]
    pub forecast: ForecastConfig,
    #[validate(nested)]
    pub battery: BatteryConfig,
    #[validate(nested)]
    pub grid: GridConfig,
    #[validate(nested)]
    pub consumption: ConsumptionConfig,
    #[validate(nested)]
    pub inverter: InverterConfig,
    #[validate(nested)]
    pub price: PriceConfig,
    #[validate(nested)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default = "default_archive_dir")]
    pub archive_dir: String,
}

fn default_archive_dir() -> String {
    "data/archive".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct LocationConfig {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: f64,
    pub timezone: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PanelConfig {
    #[validate(range(exclusive_min = 0.0))]
    pub peak_kw: f64,
    #[validate(range(min = 0.0, max = 90.0))]
    pub tilt: f64,
    #[validate(range(min = 0.0, max = 360.0))]
    pub azimuth: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub efficiency: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct LearningConfig {
    #[serde(default = "default_min_irradiance_weight")]
    pub min_irradiance_weight: f64,
    #[serde(default = "default_empirical_blend_threshold")]
    pub empirical_blend_threshold: f64,
    #[serde(default)]
    #[validate(nested)]
    pub recency_bias: RecencyBiasConfig,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            min_irradiance_weight: default_min_irradiance_weight(),
            empirical_blend_threshold: default_empirical_blend_threshold(),
            recency_bias: RecencyBiasConfig::default(),
        }
    }
}

fn default_min_irradiance_weight() -> f64 {
    400.0
}
fn default_empirical_blend_threshold() -> f64 {
    30.0
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RecencyBiasConfig {
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    #[serde(default = "default_min_samples")]
    pub min_samples: u32,
    #[serde(default = "default_clamp_min")]
    pub clamp_min: f64,
    #[serde(default = "default_clamp_max")]
    pub clamp_max: f64,
}

impl Default for RecencyBiasConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            min_samples: default_min_samples(),
            clamp_min: default_clamp_min(),
            clamp_max: default_clamp_max(),
        }
    }
}

fn default_window_days() -> u32 {
    14
}
fn default_min_samples() -> u32 {
    10
}
fn default_clamp_min() -> f64 {
    0.5
}
fn default_clamp_max() -> f64 {
    2.0
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ForecastConfig {
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: u32,
    #[serde(default = "default_fetch_interval_hours")]
    pub fetch_interval_hours: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_hours: default_horizon_hours(),
            fetch_interval_hours: default_fetch_interval_hours(),
        }
    }
}

fn default_horizon_hours() -> u32 {
    24
}
fn default_fetch_interval_hours() -> u32 {
    6
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct BatteryConfig {
    #[validate(range(exclusive_min = 0.0))]
    pub capacity_kwh: f64,
    #[validate(range(min = 0.0))]
    pub max_charge_w: f64,
    #[validate(range(min = 0.0))]
    pub max_discharge_w: f64,
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub efficiency: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub min_soc: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub max_soc: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct GridConfig {
    #[serde(default)]
    pub sell_enabled: bool,
    #[serde(default = "default_sell_price_factor")]
    pub sell_price_factor: f64,
    #[serde(default)]
    pub transfer_import_kwh: f64,
    #[serde(default)]
    pub transfer_export_kwh: f64,
    #[serde(default)]
    pub energy_tax_kwh: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            sell_enabled: false,
            sell_price_factor: default_sell_price_factor(),
            transfer_import_kwh: 0.0,
            transfer_export_kwh: 0.0,
            energy_tax_kwh: 0.0,
        }
    }
}

fn default_sell_price_factor() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionSourceKind {
    Yesterday,
    Flat,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ConsumptionConfig {
    pub source: ConsumptionSourceKind,
    #[serde(default = "default_heating_sensitivity")]
    pub heating_sensitivity: f64,
    pub climate: ClimateKind,
    #[validate(range(min = 0.0))]
    pub flat_watts: f64,
}

fn default_heating_sensitivity() -> f64 {
    0.03
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClimateKind {
    Heating,
    Cooling,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InverterBrand {
    Generic,
    Huawei,
    SolarEdge,
    Sungrow,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_inverter_config"))]
pub struct InverterConfig {
    pub brand: InverterBrand,
    pub host: String,
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,
    #[validate(range(min = 1, max = 247))]
    pub unit_id: u8,
    #[serde(default = "default_modbus_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub data_collection_only: bool,
    #[validate(range(min = 0.0, exclusive_max = 100.0))]
    pub charge_soc: f64,
    #[validate(range(min = 13.0, max = 100.0))]
    pub discharge_soc: f64,
}

fn default_modbus_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PriceSource {
    Nordpool15m,
    Hourly,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PriceConfig {
    pub source: PriceSource,
    pub region: String,
    pub currency: String,
    #[validate(range(min = 0, max = 23))]
    pub day_ahead_hour: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct DashboardConfig {
    #[serde(default)]
    pub auth_user: String,
    #[serde(default)]
    pub auth_pass: String,
}

impl DashboardConfig {
    pub fn auth_enabled(&self) -> bool {
        !self.auth_pass.is_empty()
    }
}

fn validate_config(cfg: &AppConfig) -> Result<(), validator::ValidationError> {
    if chrono_tz::Tz::from_str(&cfg.location.timezone).is_err() {
        return Err(validator::ValidationError::new("invalid IANA timezone"));
    }
    validate_inverter_config(&cfg.inverter)?;
    if cfg.battery.min_soc >= cfg.battery.max_soc {
        return Err(validator::ValidationError::new(
            "battery.min_soc must be less than battery.max_soc",
        ));
    }
    Ok(())
}

fn validate_inverter_config(inv: &InverterConfig) -> Result<(), validator::ValidationError> {
    if inv.discharge_soc >= inv.charge_soc {
        return Err(validator::ValidationError::new(
            "inverter.discharge_soc must be less than inverter.charge_soc",
        ));
    }
    Ok(())
}

impl AppConfig {
    /// Loads config/default.toml merged with `PVBC__`-prefixed environment
    /// overrides, then validates it. On any problem this returns `Err`;
    /// `main` prints one line and exits per spec §7.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    pub fn load_from(path: Option<&str>) -> Result<Self> {
        let mut figment = Figment::new();
        figment = figment.merge(Toml::file(path.unwrap_or("config/default.toml")));
        figment = figment.merge(Env::prefixed("PVBC__").split("__"));

        let config: AppConfig = figment.extract().context("failed to parse configuration")?;
        config.validate().context("configuration validation failed")?;
        Ok(config)
    }

    pub fn timezone(&self) -> chrono_tz::Tz {
        chrono_tz::Tz::from_str(&self.location.timezone).expect("validated at startup")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            location: LocationConfig {
                lat: 59.3,
                lon: 18.0,
                timezone: "Europe/Stockholm".into(),
            },
            panel: PanelConfig {
                peak_kw: 8.0,
                tilt: 35.0,
                azimuth: 180.0,
                efficiency: 0.2,
            },
            learning: LearningConfig::default(),
            forecast: ForecastConfig::default(),
            battery: BatteryConfig {
                capacity_kwh: 10.0,
                max_charge_w: 5000.0,
                max_discharge_w: 5000.0,
                efficiency: 0.95,
                min_soc: 10.0,
                max_soc: 95.0,
            },
            grid: GridConfig::default(),
            consumption: ConsumptionConfig {
                source: ConsumptionSourceKind::Flat,
                heating_sensitivity: 0.03,
                climate: ClimateKind::Heating,
                flat_watts: 500.0,
            },
            inverter: InverterConfig {
                brand: InverterBrand::Generic,
                host: "192.168.1.50".into(),
                port: 502,
                unit_id: 1,
                timeout_ms: 5000,
                dry_run: true,
                data_collection_only: false,
                charge_soc: 90.0,
                discharge_soc: 20.0,
            },
            price: PriceConfig {
                source: PriceSource::Nordpool15m,
                region: "SE3".into(),
                currency: "SEK".into(),
                day_ahead_hour: 13,
            },
            dashboard: DashboardConfig {
                auth_user: String::new(),
                auth_pass: String::new(),
            },
            server: ServerConfig::default(),
            database_path: None,
            archive_dir: default_archive_dir(),
        }
    }

    #[test]
    fn baseline_config_is_valid() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn invalid_timezone_fails() {
        let mut cfg = valid_config();
        cfg.location.timezone = "Not/AZone".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn discharge_soc_must_be_below_charge_soc() {
        let mut cfg = valid_config();
        cfg.inverter.discharge_soc = 95.0;
        cfg.inverter.charge_soc = 90.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn min_soc_must_be_below_max_soc() {
        let mut cfg = valid_config();
        cfg.battery.min_soc = 95.0;
        cfg.battery.max_soc = 10.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_auth_pass_disables_dashboard_auth() {
        let cfg = valid_config();
        assert!(!cfg.dashboard.auth_enabled());
    }
}
