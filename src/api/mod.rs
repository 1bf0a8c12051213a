//! Dashboard HTTP API (spec §6). Grounded on the teacher's
//! `api::v1::router` (one flat `Router` built from per-resource
//! modules, `CorsLayer` + `TraceLayer`, auth applied as the outermost
//! layer) generalized to this system's narrower, read-mostly surface.

pub mod battery;
pub mod error;
pub mod forecast;
pub mod health;
pub mod prices;
pub mod solar;
pub mod state;
pub mod window;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

use crate::config::AppConfig;

pub fn router(app_state: AppState, cfg: &AppConfig) -> Router {
    let mut router = Router::new()
        .route("/forecast", get(forecast::get_forecast))
        .route("/api/prices", get(prices::get_prices))
        .route("/api/solar", get(solar::get_solar))
        .route("/battery/schedule", get(battery::get_schedule))
        .route("/battery/history", get(battery::get_history))
        .route("/battery/control/:action", post(battery::control))
        .route("/health", get(health::get_health))
        .with_state(app_state);

    if cfg.dashboard.auth_enabled() {
        let user = cfg.dashboard.auth_user.clone();
        let pass = cfg.dashboard.auth_pass.clone();
        // `axum::middleware::from_fn` returns an opaque type that must be
        // handed straight to `.layer()` — naming it via a wrapper function
        // returning `impl Clone` would erase the `tower::Layer` impl.
        router = router.layer(middleware::from_fn(move |req: Request, next: Next| {
            let user = user.clone();
            let pass = pass.clone();
            async move {
                if crate::auth::credentials_match(req.headers(), &user, &pass) {
                    Ok::<Response, StatusCode>(next.run(req).await)
                } else {
                    Err(StatusCode::UNAUTHORIZED)
                }
            }
        }));
    }

    router.layer(CorsLayer::permissive()).layer(TraceLayer::new_for_http())
}
