use std::sync::Arc;

use tracing::{error, info};

use pv_battery_controller::config::{AppConfig, PriceSource};
use pv_battery_controller::inverter::modbus::ModbusInverterDriver;
use pv_battery_controller::inverter::InverterDriver;
use pv_battery_controller::pipeline::Orchestrator;
use pv_battery_controller::prices::{ElprisetJustNuProvider, NordpoolProvider, PriceProvider};
use pv_battery_controller::store::Store;
use pv_battery_controller::weather::{HttpWeatherProvider, WeatherProvider};
use pv_battery_controller::{api, telemetry};

#[tokio::main]
async fn main() {
    telemetry::init_tracing();

    let config_path = config_path_from_args(std::env::args().skip(1));
    let cfg = match AppConfig::load_from(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("configuration invalid: {e:#}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cfg).await {
        error!(error = %e, "fatal error");
        std::process::exit(1);
    }
}

/// Looks for `--config <path>` or `--config=<path>` among the process
/// arguments. Anything else is ignored — this is the only flag the
/// controller accepts.
fn config_path_from_args(args: impl Iterator<Item = String>) -> Option<String> {
    let mut args = args.peekable();
    while let Some(arg) = args.next() {
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(path.to_string());
        }
        if arg == "--config" {
            return args.next();
        }
    }
    None
}

async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let cfg = Arc::new(cfg);

    let db_path = cfg.database_path.clone().unwrap_or_else(|| "data/controller.sqlite".to_string());
    let store = Arc::new(Store::connect(&db_path).await?);

    let driver: Arc<dyn InverterDriver> = Arc::new(ModbusInverterDriver::new(
        &cfg.inverter.host,
        cfg.inverter.port,
        cfg.inverter.unit_id,
        cfg.inverter.timeout_ms,
        cfg.inverter.dry_run,
        cfg.inverter.charge_soc,
        cfg.inverter.discharge_soc,
    ));

    let price_provider: Arc<dyn PriceProvider> = match cfg.price.source {
        PriceSource::Hourly => Arc::new(ElprisetJustNuProvider::new("https://www.elprisetjustnu.se")?),
        PriceSource::Nordpool15m => Arc::new(NordpoolProvider::new("https://dataportal-api.nordpoolgroup.com")?),
    };

    let weather: Arc<dyn WeatherProvider> = Arc::new(HttpWeatherProvider::new("https://api.open-meteo.com"));

    let app_state = api::AppState {
        store: store.clone(),
        cfg: cfg.clone(),
        driver: driver.clone(),
    };
    let app = api::router(app_state, &cfg);

    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    info!(%addr, "starting pv-battery-controller");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let orchestrator = Arc::new(Orchestrator {
        store,
        cfg,
        driver,
        price_provider,
        weather,
    });
    orchestrator.run_startup().await;
    tokio::spawn(orchestrator.run_forever());

    axum::serve(listener, app).with_graceful_shutdown(telemetry::shutdown_signal()).await?;

    info!("shutdown complete");
    Ok(())
}
