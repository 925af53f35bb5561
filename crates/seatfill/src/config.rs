use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Weekday;

use crate::types::Period;

pub const DEFAULT_DATASET_PATH: &str = "historical_weekly_data.csv";

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub current_url: String,
    /// `{year}` and `{week}` are substituted per request.
    pub by_week_url: String,
    pub dataset_path: PathBuf,
    /// Years served from the bundled dataset instead of the by-week page.
    pub dataset_years: RangeInclusive<i32>,
    /// A current-week scrape with this many shows or fewer is labelled
    /// `fallback`; degraded parsing tends to find only a handful of rows.
    pub live_threshold: u32,
    /// Weekday the publisher closes its weeks on.
    pub week_boundary: Weekday,
    pub fetch_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            current_url: format!("{}/grosses.cfm", crate::BASE_URL),
            by_week_url: format!(
                "{}/grossesbyweek.cfm?year={{year}}&week={{week}}",
                crate::BASE_URL
            ),
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            dataset_years: 2016..=2019,
            live_threshold: 30,
            week_boundary: Weekday::Sun,
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

impl ResolverConfig {
    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn by_week_url_for(&self, period: Period) -> String {
        self.by_week_url
            .replace("{year}", &period.year.to_string())
            .replace("{week}", &period.week.to_string())
    }

    pub fn uses_dataset(&self, year: i32) -> bool {
        self.dataset_years.contains(&year)
    }
}
