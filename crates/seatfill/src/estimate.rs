//! Seasonal estimates for weeks with no concrete data.
//!
//! All figures here are non-authoritative approximations of typical weekly
//! Broadway attendance. They are only ever served with an `historical`,
//! `estimated` or `fallback` quality label.

use crate::types::{EstimateBasis, Period, Tally};

/// Weeks from this one onward in 2020 were dark.
pub const SHUTDOWN_WEEK_2020: u32 = 11;
/// Houses reopened in this week of 2021.
pub const REOPENING_WEEK_2021: u32 = 37;

/// Years the generic baseline is willing to estimate.
const GENERIC_YEARS: std::ops::RangeInclusive<i32> = 1996..=2099;

const FALLBACK_SHOW_COUNT: u32 = 32;
const FALLBACK_AVERAGE_HOUSE: u64 = 850;
const PERFORMANCES_PER_WEEK: u64 = 8;

/// Last-resort figures: 32 shows playing 8 performances to 850 people each.
pub const DEFAULT_TALLY: Tally = Tally {
    attendance: FALLBACK_SHOW_COUNT as u64 * FALLBACK_AVERAGE_HOUSE * PERFORMANCES_PER_WEEK,
    capacity: None,
    show_count: FALLBACK_SHOW_COUNT,
};

#[derive(Debug, Clone, Copy)]
struct Baseline {
    year: i32,
    attendance: u64,
    capacity: u64,
    shows: u32,
    context: &'static str,
}

const GENERIC_BASELINE: Baseline = Baseline {
    year: 0,
    attendance: 250_000,
    capacity: 290_000,
    shows: FALLBACK_SHOW_COUNT,
    context: "typical season",
};

#[rustfmt::skip]
const BASELINES: [Baseline; 10] = [
    Baseline { year: 2016, attendance: 256_000, capacity: 290_000, shows: 34, context: "2016 season" },
    Baseline { year: 2017, attendance: 262_000, capacity: 292_000, shows: 34, context: "2017 season" },
    Baseline { year: 2018, attendance: 275_000, capacity: 300_000, shows: 34, context: "2018 season" },
    Baseline { year: 2019, attendance: 282_000, capacity: 305_000, shows: 35, context: "record 2019 season" },
    Baseline { year: 2020, attendance: 280_000, capacity: 305_000, shows: 34, context: "2020 season until the March shutdown" },
    Baseline { year: 2021, attendance: 190_000, capacity: 240_000, shows: 26, context: "2021 reopening season" },
    Baseline { year: 2022, attendance: 225_000, capacity: 275_000, shows: 31, context: "2022 recovery season" },
    Baseline { year: 2023, attendance: 235_000, capacity: 280_000, shows: 33, context: "2023 season" },
    Baseline { year: 2024, attendance: 240_000, capacity: 282_000, shows: 32, context: "2024 season" },
    Baseline { year: 2025, attendance: 245_000, capacity: 285_000, shows: 32, context: "2025 season" },
];

#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub tally: Tally,
    pub basis: EstimateBasis,
    pub context: String,
}

/// Piecewise seasonal scalar and the name of the season it stands for.
pub fn season(week: u32) -> (f64, &'static str) {
    match week {
        0..=10 => (0.85, "winter slump"),
        11..=20 => (1.0, "spring pickup"),
        21..=25 => (1.1, "awards-season peak"),
        26..=35 => (0.95, "summer slump"),
        36..=45 => (1.05, "fall pickup"),
        _ => (1.2, "holiday peak"),
    }
}

pub fn seasonal_multiplier(week: u32) -> f64 {
    season(week).0
}

fn is_dark(period: Period) -> bool {
    match period.year {
        2020 => period.week >= SHUTDOWN_WEEK_2020,
        2021 => period.week < REOPENING_WEEK_2021,
        _ => false,
    }
}

fn scale(base: u64, multiplier: f64) -> u64 {
    (base as f64 * multiplier).round() as u64
}

/// Estimate for `period`, or `None` outside the years this model covers.
pub fn estimate(period: Period) -> Option<Estimate> {
    if !(1..=53).contains(&period.week) {
        return None;
    }

    let (baseline, basis) = match BASELINES.iter().find(|b| b.year == period.year) {
        Some(b) => (*b, EstimateBasis::Tabulated),
        None if GENERIC_YEARS.contains(&period.year) => {
            (GENERIC_BASELINE, EstimateBasis::Generic)
        }
        None => return None,
    };

    if is_dark(period) {
        return Some(Estimate {
            tally: Tally {
                attendance: 0,
                capacity: Some(0),
                show_count: 0,
            },
            basis,
            context: format!("Theatres were dark in {} ({})", period, baseline.context),
        });
    }

    let (multiplier, season_name) = season(period.week);
    Some(Estimate {
        tally: Tally {
            attendance: scale(baseline.attendance, multiplier),
            capacity: Some(scale(baseline.capacity, multiplier)),
            show_count: baseline.shows,
        },
        basis,
        context: format!(
            "Estimated from the {} baseline, {} ({})",
            baseline.context, season_name, period
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(year: i32, week: u32) -> Period {
        Period::new(year, week).unwrap()
    }

    #[test]
    fn test_multiplier_bands() {
        assert_eq!(seasonal_multiplier(1), 0.85);
        assert_eq!(seasonal_multiplier(10), 0.85);
        assert_eq!(seasonal_multiplier(11), 1.0);
        assert_eq!(seasonal_multiplier(25), 1.1);
        assert_eq!(seasonal_multiplier(35), 0.95);
        assert_eq!(seasonal_multiplier(45), 1.05);
        assert_eq!(seasonal_multiplier(46), 1.2);
        assert_eq!(seasonal_multiplier(53), 1.2);
    }

    #[test]
    fn test_multiplier_bounds() {
        for week in 1..=53 {
            let m = seasonal_multiplier(week);
            assert!((0.85..=1.2).contains(&m), "week {week} out of bounds: {m}");
        }
    }

    #[test]
    fn test_before_reopening_is_dark() {
        let estimate = estimate(period(2021, 10)).unwrap();
        assert_eq!(estimate.tally.attendance, 0);
        assert_eq!(estimate.tally.show_count, 0);
        assert_eq!(estimate.basis, EstimateBasis::Tabulated);
    }

    #[test]
    fn test_shutdown_boundaries() {
        assert!(estimate(period(2020, 10)).unwrap().tally.attendance > 0);
        assert_eq!(estimate(period(2020, 11)).unwrap().tally.attendance, 0);
        assert_eq!(estimate(period(2021, 36)).unwrap().tally.attendance, 0);
        assert!(estimate(period(2021, 37)).unwrap().tally.attendance > 0);
    }

    #[test]
    fn test_tabulated_year_rounds_base_times_multiplier() {
        let estimate = estimate(period(2019, 50)).unwrap();
        assert_eq!(estimate.tally.attendance, 338_400);
        assert_eq!(estimate.tally.capacity, Some(366_000));
        assert_eq!(estimate.tally.show_count, 35);
        assert_eq!(estimate.basis, EstimateBasis::Tabulated);
    }

    #[test]
    fn test_untabulated_year_is_generic() {
        let estimate = estimate(period(2005, 30)).unwrap();
        assert_eq!(estimate.basis, EstimateBasis::Generic);
        assert_eq!(estimate.tally.attendance, 237_500);
        assert_eq!(estimate.tally.capacity, Some(275_500));
    }

    #[test]
    fn test_out_of_range_years_have_no_estimate() {
        assert!(estimate(period(1950, 30)).is_none());
        assert!(estimate(Period { year: 2019, week: 60 }).is_none());
    }

    #[test]
    fn test_default_tally() {
        assert_eq!(DEFAULT_TALLY.attendance, 217_600);
        assert_eq!(DEFAULT_TALLY.show_count, 32);
        assert_eq!(DEFAULT_TALLY.capacity, None);
    }
}
