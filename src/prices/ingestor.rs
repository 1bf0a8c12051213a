//! Price ingestor (spec §4.7): fetches today and tomorrow, archives raw
//! responses, and upserts only on `Present`.

use tracing::{info, warn};

use crate::archive;
use crate::clock;
use crate::domain::PriceSlot;
use crate::store::Store;

use super::provider::{expand_hourly_slots, native_slots_to_price_slots, FetchOutcome, PriceProvider};

pub enum SlotShape {
    Native,
    Hourly { mwh_denominated: bool },
}

/// Fetches `today_date` and `tomorrow_date`, upserting whichever are
/// `Present`. Returns the number of price rows written.
pub async fn run_price_ingestor(
    store: &Store,
    provider: &dyn PriceProvider,
    shape: &SlotShape,
    region: &str,
    archive_dir: &str,
    today_date: &str,
) -> anyhow::Result<usize> {
    let tomorrow_date = clock::add_days(today_date, 1);
    let mut written = 0;
    for date in [today_date, &tomorrow_date] {
        written += fetch_and_store(store, provider, shape, region, archive_dir, date).await?;
    }
    Ok(written)
}

async fn fetch_and_store(
    store: &Store,
    provider: &dyn PriceProvider,
    shape: &SlotShape,
    region: &str,
    archive_dir: &str,
    date: &str,
) -> anyhow::Result<usize> {
    match provider.fetch(date, region).await? {
        FetchOutcome::Absent => {
            info!(date, "price data not yet published");
            Ok(0)
        }
        FetchOutcome::Present { slots, raw } => {
            if let Err(e) = archive::write_raw(archive_dir, "prices", date, &raw).await {
                warn!(error = %e, "failed to archive raw price response");
            }
            let price_slots: Vec<PriceSlot> = match shape {
                SlotShape::Native => native_slots_to_price_slots(&slots, region),
                SlotShape::Hourly { mwh_denominated } => {
                    expand_hourly_slots(&slots, region, *mwh_denominated)
                }
            };
            for slot in &price_slots {
                store
                    .upsert_price(&slot.slot_ts, slot.price_per_kwh, &slot.region)
                    .await?;
            }
            Ok(price_slots.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::provider::RawSlot;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PriceProvider for FixedProvider {
        async fn fetch(&self, date: &str, _region: &str) -> anyhow::Result<FetchOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if date.ends_with("02") {
                return Ok(FetchOutcome::Absent);
            }
            Ok(FetchOutcome::Present {
                slots: vec![RawSlot {
                    local_ts: format!("{date}T10:00"),
                    price_per_kwh: 0.42,
                }],
                raw: "{}".into(),
            })
        }
    }

    #[tokio::test]
    async fn absent_tomorrow_does_not_touch_the_store() {
        let store = Store::connect_in_memory().await.unwrap();
        let provider = FixedProvider { calls: AtomicUsize::new(0) };
        let dir = std::env::temp_dir().join("pv-battery-controller-test-archive");
        let written = run_price_ingestor(
            &store,
            &provider,
            &SlotShape::Native,
            "SE3",
            dir.to_str().unwrap(),
            "2026-06-01",
        )
        .await
        .unwrap();
        assert_eq!(written, 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}
