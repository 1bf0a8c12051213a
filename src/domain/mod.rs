//! Core data model shared by the forecast core, the optimizer, and the
//! inverter driver. Every row here is keyed by a string timestamp in the
//! operator's local zone (see [`crate::clock`]) rather than a `DateTime`,
//! so storage keys never shift under a system timezone change.

pub mod action;
pub mod consumption;
pub mod energy;
pub mod matrix;
pub mod pipeline_run;
pub mod price;
pub mod schedule;
pub mod solar;

pub use action::Action;
pub use consumption::{ConsumptionReading, ConsumptionSource};
pub use energy::EnergySnapshot;
pub use matrix::{CorrectionCell, SmoothedCell};
pub use pipeline_run::{PipelineRun, PipelineStatus};
pub use price::PriceSlot;
pub use schedule::ScheduleSlot;
pub use solar::SolarReading;
