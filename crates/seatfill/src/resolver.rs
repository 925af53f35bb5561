//! Fallback chain from raw inputs to a single [`AttendanceRecord`].
//!
//! Each stage returns `Result<_, ResolutionFailure>`; the public async entry
//! points are the only place a failure is turned into a lower-confidence
//! record, so callers always get a record back.

use chrono::NaiveDate;

use crate::config::ResolverConfig;
use crate::dataset::{self, DatasetError};
use crate::estimate::{self, DEFAULT_TALLY};
use crate::parser::{self, Extraction, Extractor, ParseError};
use crate::scraper::{DataSource, ScraperError, WebScraper};
use crate::types::{AttendanceRecord, GrossesPage, Labels, Period, Source, Tally};
use crate::utils::{
    last_updated_label, most_recent_week_boundary, week_ending_label, week_number_to_date,
};

#[derive(Debug, thiserror::Error)]
pub enum ResolutionFailure {
    #[error("No strategy matched")]
    NoMatch,
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Source unavailable: {0}")]
    SourceUnavailable(#[from] ScraperError),
    #[error("All sources exhausted for {0}")]
    AllSourcesExhausted(Period),
}

impl From<ParseError> for ResolutionFailure {
    fn from(e: ParseError) -> Self {
        ResolutionFailure::MalformedInput(e.to_string())
    }
}

impl From<DatasetError> for ResolutionFailure {
    fn from(e: DatasetError) -> Self {
        match e {
            DatasetError::NotFound(_) => ResolutionFailure::NoMatch,
            other => ResolutionFailure::MalformedInput(other.to_string()),
        }
    }
}

fn log_failure(stage: &str, failure: &ResolutionFailure) {
    match failure {
        ResolutionFailure::NoMatch => log::debug!("{stage}: {failure}, falling back"),
        ResolutionFailure::AllSourcesExhausted(_) => log::info!("{stage}: {failure}"),
        _ => log::warn!("{stage}: {failure}, falling back"),
    }
}

/// Runs `extractors` in order and tallies the first one that yields rows.
pub fn run_extractors(
    extractors: &[Box<dyn Extractor>],
    html: &str,
) -> Result<Tally, ResolutionFailure> {
    let mut last_error = None;

    for extractor in extractors {
        match extractor.extract(html) {
            Ok(Extraction::Rows(rows)) => {
                if let Some(tally) = Tally::from_rows(&rows) {
                    log::debug!(
                        "{} strategy matched {} rows ({} shows)",
                        extractor.name(),
                        rows.len(),
                        tally.show_count
                    );
                    return Ok(tally);
                }
                log::debug!(
                    "{} strategy rows could not be tallied ({} rows)",
                    extractor.name(),
                    rows.len()
                );
            }
            Ok(Extraction::NoMatch) => log::debug!("{} strategy found no rows", extractor.name()),
            Err(e) => {
                log::debug!("{} strategy failed: {}", extractor.name(), e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.map_or(ResolutionFailure::NoMatch, Into::into))
}

/// Labels for a period resolved from historical sources.
fn period_labels(period: Period, context: String) -> Labels {
    match week_number_to_date(period.year, period.week) {
        Some(date) => Labels {
            week_ending: week_ending_label(date),
            last_updated: last_updated_label(date),
            context,
        },
        None => Labels {
            week_ending: period.to_string(),
            last_updated: period.to_string(),
            context,
        },
    }
}

/// Seasonal estimate for `period`, if the model covers it.
pub fn estimate_record(period: Period) -> Option<AttendanceRecord> {
    let estimate = estimate::estimate(period)?;
    Some(AttendanceRecord::new(
        estimate.tally,
        period,
        period_labels(period, estimate.context),
        Source::SeasonalEstimate {
            basis: estimate.basis,
        },
    ))
}

/// The hardcoded last-resort record for a historical `period`.
pub fn fallback_record(period: Period) -> AttendanceRecord {
    AttendanceRecord::new(
        DEFAULT_TALLY,
        period,
        period_labels(period, fallback_context()),
        Source::HardcodedFallback,
    )
}

fn fallback_context() -> String {
    "Approximate figures for a typical week; no source could be read".to_string()
}

#[derive(Debug, Clone)]
pub struct Resolver<S> {
    source: S,
    config: ResolverConfig,
}

impl Resolver<WebScraper> {
    /// Resolver backed by the live site and the dataset file on disk.
    pub fn live(config: ResolverConfig) -> Result<Self, ScraperError> {
        let scraper = WebScraper::new(config.clone())?;
        Ok(Self::new(scraper, config))
    }
}

impl<S: DataSource> Resolver<S> {
    pub fn new(source: S, config: ResolverConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Record for the week currently published on the grosses page.
    pub async fn current_week(&self, today: NaiveDate) -> AttendanceRecord {
        let resolved = match self.source.current_grosses().await {
            Ok(html) => self.record_from_current_html(&html, today),
            Err(e) => Err(e.into()),
        };

        resolved.unwrap_or_else(|failure| {
            log_failure("Current week", &failure);
            self.current_fallback(today)
        })
    }

    /// Record for an explicit historical week.
    pub async fn historical_week(&self, period: Period) -> AttendanceRecord {
        let primary = if self.config.uses_dataset(period.year) {
            match self.source.historical_dataset().await {
                Ok(text) => self.record_from_dataset(period, &text),
                Err(e) => Err(e.into()),
            }
        } else {
            match self.source.grosses_by_week(period).await {
                Ok(html) => self.record_from_week_html(period, &html),
                Err(e) => Err(e.into()),
            }
        };

        primary
            .or_else(|failure| {
                log_failure(&format!("Historical {period}"), &failure);
                estimate_record(period).ok_or(ResolutionFailure::AllSourcesExhausted(period))
            })
            .unwrap_or_else(|failure| {
                log_failure(&format!("Historical {period}"), &failure);
                fallback_record(period)
            })
    }

    pub fn record_from_current_html(
        &self,
        html: &str,
        today: NaiveDate,
    ) -> Result<AttendanceRecord, ResolutionFailure> {
        let tally = run_extractors(&parser::current_page_extractors(), html)?;
        let trusted = tally.show_count > self.config.live_threshold;

        let (week_ending, last_updated) = match parser::parse_week_ending(html) {
            Some(date) => (date, date),
            None => (
                most_recent_week_boundary(today, self.config.week_boundary),
                today,
            ),
        };

        let context = if trusted {
            format!(
                "Live weekly grosses from BroadwayWorld across {} shows",
                tally.show_count
            )
        } else {
            log::warn!(
                "Only {} shows parsed from the grosses page (expected more than {})",
                tally.show_count,
                self.config.live_threshold
            );
            format!(
                "Only {} shows could be read from BroadwayWorld; figures may be incomplete",
                tally.show_count
            )
        };

        Ok(AttendanceRecord::new(
            tally,
            Period::containing(week_ending),
            Labels {
                week_ending: week_ending_label(week_ending),
                last_updated: last_updated_label(last_updated),
                context,
            },
            Source::ScrapedLive {
                page: GrossesPage::Current,
                trusted,
            },
        ))
    }

    pub fn record_from_week_html(
        &self,
        period: Period,
        html: &str,
    ) -> Result<AttendanceRecord, ResolutionFailure> {
        let tally = run_extractors(&parser::by_week_extractors(period), html)?;
        Ok(AttendanceRecord::new(
            tally,
            period,
            period_labels(
                period,
                format!("Real weekly data from BroadwayWorld ({period})"),
            ),
            Source::ScrapedLive {
                page: GrossesPage::ByWeek,
                trusted: true,
            },
        ))
    }

    pub fn record_from_dataset(
        &self,
        period: Period,
        csv_text: &str,
    ) -> Result<AttendanceRecord, ResolutionFailure> {
        let tally = dataset::lookup(period, csv_text)?;
        Ok(AttendanceRecord::new(
            tally,
            period,
            period_labels(
                period,
                format!("Real weekly data from the historical dataset ({period})"),
            ),
            Source::BundledDataset,
        ))
    }

    fn current_fallback(&self, today: NaiveDate) -> AttendanceRecord {
        let week_ending = most_recent_week_boundary(today, self.config.week_boundary);
        AttendanceRecord::new(
            DEFAULT_TALLY,
            Period::containing(week_ending),
            Labels {
                week_ending: week_ending_label(week_ending),
                last_updated: last_updated_label(today),
                context: fallback_context(),
            },
            Source::HardcodedFallback,
        )
    }
}
