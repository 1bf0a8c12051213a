//! Day-ahead price ingestion (spec §4.7). Grounded on the teacher's
//! `repo::prices::PriceRepository` for the persisted shape, generalized
//! to a provider trait over native-15-minute and hourly sources.

pub mod ingestor;
pub mod provider;
pub mod providers;

pub use ingestor::run_price_ingestor;
pub use provider::{FetchOutcome, PriceProvider, RawSlot};
pub use providers::{ElprisetJustNuProvider, NordpoolProvider};
