//! Price provider contract (spec §6 "Price provider contract", §4.7).
//! A provider module exposes `fetch(date, region)` returning either the
//! full 96-slot set for a date or `Absent` (e.g. tomorrow not yet
//! published). Raw HTTP calls are plumbing and out of scope; the trait
//! boundary here is what the ingestor and tests depend on.

use async_trait::async_trait;

use crate::domain::PriceSlot;

/// A single raw slot as returned by a provider before local-timestamp
/// normalization: either one already-15-minute entry, or one hourly
/// entry to be expanded into four.
#[derive(Debug, Clone)]
pub struct RawSlot {
    pub local_ts: String,
    pub price_per_kwh: f64,
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Present { slots: Vec<RawSlot>, raw: String },
    Absent,
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetches the full set of slots for `date` ("YYYY-MM-DD") in `region`.
    async fn fetch(&self, date: &str, region: &str) -> anyhow::Result<FetchOutcome>;
}

/// Expands a provider's already-96-entry response into `PriceSlot`s
/// without reinterpreting the timestamp (the native provider already
/// emits local "YYYY-MM-DDTHH:MM" strings).
pub fn native_slots_to_price_slots(slots: &[RawSlot], region: &str) -> Vec<PriceSlot> {
    slots
        .iter()
        .map(|s| PriceSlot {
            slot_ts: s.local_ts.clone(),
            price_per_kwh: s.price_per_kwh,
            region: region.to_string(),
        })
        .collect()
}

/// Expands 24 hourly entries into 96 15-min slots at offsets
/// 0/15/30/45, converting from MWh to kWh pricing when `mwh_denominated`.
pub fn expand_hourly_slots(hourly: &[RawSlot], region: &str, mwh_denominated: bool) -> Vec<PriceSlot> {
    let mut out = Vec::with_capacity(hourly.len() * 4);
    for h in hourly {
        let price = if mwh_denominated {
            h.price_per_kwh / 1000.0
        } else {
            h.price_per_kwh
        };
        let hour_prefix = &h.local_ts[0..13]; // "YYYY-MM-DDTHH"
        for minute in [0, 15, 30, 45] {
            out.push(PriceSlot {
                slot_ts: format!("{hour_prefix}:{minute:02}"),
                price_per_kwh: price,
                region: region.to_string(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hourly_expansion_produces_four_slots_per_hour() {
        let hourly = vec![RawSlot {
            local_ts: "2026-06-01T10:00".into(),
            price_per_kwh: 45.0,
        }];
        let out = expand_hourly_slots(&hourly, "SE3", true);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].slot_ts, "2026-06-01T10:00");
        assert_eq!(out[3].slot_ts, "2026-06-01T10:45");
        assert!((out[0].price_per_kwh - 0.045).abs() < 1e-12);
    }

    #[test]
    fn native_slots_pass_through_timestamp_unchanged() {
        let native = vec![RawSlot {
            local_ts: "2026-06-01T10:15".into(),
            price_per_kwh: 0.5,
        }];
        let out = native_slots_to_price_slots(&native, "SE3");
        assert_eq!(out[0].slot_ts, "2026-06-01T10:15");
    }
}
