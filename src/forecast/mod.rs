//! The learning forecast core (spec §4.3–§4.6): physics fallback blended
//! with an empirical correction matrix, an irradiance-weighted learner,
//! a Gaussian cross-day smoother, and a consumption estimator.

pub mod consumption;
pub mod learner;
pub mod model;
pub mod smoother;

pub use consumption::estimate_consumption;
pub use learner::run_learner;
pub use model::run_forecast;
pub use smoother::run_smoother;
