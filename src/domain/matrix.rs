use serde::{Deserialize, Serialize};

/// A calendar-indexed correction factor cell: (month, day-of-month,
/// hour-of-day). Seeded exhaustively for every valid triple (Feb 29
/// included) with a unit average, zero weight, zero count (spec §3).
/// The learner is the sole writer after seeding (spec §5 ordering rule).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionCell {
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub avg_correction: f64,
    pub total_weight: f64,
    pub count: u64,
    pub max_actual_kwh: f64,
    pub last_updated_ts: Option<String>,
}

impl CorrectionCell {
    pub fn seeded(month: u32, day: u32, hour: u32) -> Self {
        Self {
            month,
            day,
            hour,
            avg_correction: 1.0,
            total_weight: 0.0,
            count: 0,
            max_actual_kwh: 0.0,
            last_updated_ts: None,
        }
    }

    /// True for every (month, day, hour) valid on the Gregorian calendar,
    /// counting Feb 29.
    pub fn is_valid_triple(month: u32, day: u32, hour: u32) -> bool {
        if !(1..=12).contains(&month) || hour > 23 {
            return false;
        }
        let max_day = match month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 => 29,
            _ => unreachable!(),
        };
        (1..=max_day).contains(&day)
    }
}

/// A day-of-year-indexed, Gaussian-smoothed correction cell. Rebuilt
/// wholesale by the smoother; never touched by the learner (spec §3, §5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedCell {
    pub day_of_year: u32,
    pub hour: u32,
    pub avg_correction: f64,
    pub sample_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_cell_has_unit_average_and_zero_weight() {
        let c = CorrectionCell::seeded(6, 15, 12);
        assert_eq!(c.avg_correction, 1.0);
        assert_eq!(c.total_weight, 0.0);
        assert_eq!(c.count, 0);
    }

    #[test]
    fn feb_29_is_valid() {
        assert!(CorrectionCell::is_valid_triple(2, 29, 10));
        assert!(!CorrectionCell::is_valid_triple(2, 30, 10));
        assert!(!CorrectionCell::is_valid_triple(4, 31, 10));
        assert!(!CorrectionCell::is_valid_triple(13, 1, 10));
        assert!(!CorrectionCell::is_valid_triple(1, 1, 24));
    }

    #[test]
    fn exhaustive_seed_count_matches_calendar() {
        let mut count = 0;
        for month in 1..=12u32 {
            for day in 1..=31u32 {
                for hour in 0..=23u32 {
                    if CorrectionCell::is_valid_triple(month, day, hour) {
                        count += 1;
                    }
                }
            }
        }
        // 365 calendar days (including Feb 29) * 24 hours.
        assert_eq!(count, 366 * 24);
    }
}
