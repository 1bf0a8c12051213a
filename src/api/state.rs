use std::sync::Arc;

use crate::config::AppConfig;
use crate::inverter::InverterDriver;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub cfg: Arc<AppConfig>,
    pub driver: Arc<dyn InverterDriver>,
}
