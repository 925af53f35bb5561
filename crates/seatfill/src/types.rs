use std::fmt::Display;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::utils::week_of_year;

#[derive(Debug, thiserror::Error)]
#[error("Invalid week {0}. Accepted values: 1 to 53")]
pub struct PeriodError(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PeriodFields")]
pub struct Period {
    pub year: i32,
    pub week: u32,
}

#[derive(Deserialize)]
struct PeriodFields {
    year: i32,
    week: u32,
}

impl TryFrom<PeriodFields> for Period {
    type Error = PeriodError;

    fn try_from(fields: PeriodFields) -> Result<Self, Self::Error> {
        Period::new(fields.year, fields.week)
    }
}

impl Period {
    pub fn new(year: i32, week: u32) -> Result<Self, PeriodError> {
        if !(1..=53).contains(&week) {
            return Err(PeriodError(week));
        }
        Ok(Self { year, week })
    }

    /// The week `date` falls in; used as the default request period.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            week: week_of_year(date),
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, week {}", self.year, self.week)
    }
}

/// Which remote page layout a scraped figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrossesPage {
    Current,
    ByWeek,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateBasis {
    /// The year has its own row in the seasonal table.
    Tabulated,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
    ScrapedLive { page: GrossesPage, trusted: bool },
    BundledDataset,
    SeasonalEstimate { basis: EstimateBasis },
    HardcodedFallback,
}

impl Source {
    pub fn quality(&self) -> DataQuality {
        match self {
            Source::ScrapedLive { trusted: false, .. } => DataQuality::Fallback,
            Source::ScrapedLive {
                page: GrossesPage::Current,
                ..
            } => DataQuality::Live,
            Source::ScrapedLive {
                page: GrossesPage::ByWeek,
                ..
            } => DataQuality::Real,
            Source::BundledDataset => DataQuality::Real,
            Source::SeasonalEstimate {
                basis: EstimateBasis::Tabulated,
            } => DataQuality::Historical,
            Source::SeasonalEstimate {
                basis: EstimateBasis::Generic,
            } => DataQuality::Estimated,
            Source::HardcodedFallback => DataQuality::Fallback,
        }
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::ScrapedLive {
                page: GrossesPage::Current,
                ..
            } => write!(f, "BroadwayWorld"),
            Source::ScrapedLive {
                page: GrossesPage::ByWeek,
                ..
            } => write!(f, "BroadwayWorld (grosses by week)"),
            Source::BundledDataset => write!(f, "Historical dataset"),
            Source::SeasonalEstimate { .. } => write!(f, "Seasonal estimate"),
            Source::HardcodedFallback => write!(f, "BroadwayWorld (fallback)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    Live,
    Real,
    Historical,
    Estimated,
    Fallback,
}

impl Display for DataQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DataQuality::Live => "live",
            DataQuality::Real => "real",
            DataQuality::Historical => "historical",
            DataQuality::Estimated => "estimated",
            DataQuality::Fallback => "fallback",
        };
        f.write_str(label)
    }
}

/// One show's figures as reported by a source.
///
/// `shows` is 1 for per-show rows. Aggregate rows (the by-week page reports a
/// single line for the whole week) carry the page's own show count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRow {
    pub attendance: u64,
    pub capacity: Option<u64>,
    pub shows: u32,
}

impl RawRow {
    pub fn show(attendance: u64, capacity: Option<u64>) -> Self {
        Self {
            attendance,
            capacity,
            shows: 1,
        }
    }

    /// Header rows, ad rows and mis-tokenized rows fail this check.
    pub fn is_plausible(&self) -> bool {
        if self.attendance == 0 {
            return false;
        }
        self.capacity
            .is_none_or(|capacity| capacity > 0 && self.attendance <= capacity)
    }
}

/// Sum of accepted rows. Tallies built from rows are never empty: an empty
/// aggregation is a `NoMatch`, and so is one whose sums overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub attendance: u64,
    pub capacity: Option<u64>,
    pub show_count: u32,
}

impl Tally {
    pub fn from_rows(rows: &[RawRow]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let attendance = rows
            .iter()
            .try_fold(0u64, |acc, r| acc.checked_add(r.attendance))?;
        let show_count = rows
            .iter()
            .try_fold(0u32, |acc, r| acc.checked_add(r.shows))?;
        // Capacity is only known when every row reports one.
        let capacity = match rows.iter().map(|r| r.capacity).collect::<Option<Vec<u64>>>() {
            Some(capacities) => Some(capacities.into_iter().try_fold(0u64, u64::checked_add)?),
            None => None,
        };

        let tally = Tally {
            attendance,
            capacity,
            show_count,
        };
        (tally.show_count > 0).then_some(tally)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub attendance: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u8>,
    pub show_count: u32,
    pub period: Period,
    pub week_ending: String,
    pub last_updated: String,
    pub context: String,
    pub source: Source,
    pub data_quality: DataQuality,
}

/// Display labels attached to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub week_ending: String,
    pub last_updated: String,
    pub context: String,
}

impl AttendanceRecord {
    pub fn new(tally: Tally, period: Period, labels: Labels, source: Source) -> Self {
        Self {
            attendance: tally.attendance,
            capacity: tally.capacity,
            percentage: fill_percentage(tally.attendance, tally.capacity),
            show_count: tally.show_count,
            period,
            week_ending: labels.week_ending,
            last_updated: labels.last_updated,
            context: labels.context,
            source,
            data_quality: source.quality(),
        }
    }
}

/// `round(attendance / capacity * 100)`, clamped to 100.
pub fn fill_percentage(attendance: u64, capacity: Option<u64>) -> Option<u8> {
    let capacity = capacity.filter(|c| *c > 0)?;
    let pct = (u128::from(attendance) * 100 + u128::from(capacity) / 2) / u128::from(capacity);
    Some(pct.min(100) as u8)
}

impl Display for AttendanceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "┌─ Week ending {} ({})", self.week_ending, self.period)?;
        write!(f, "│  Attendance: {}", self.attendance)?;
        if let Some(capacity) = self.capacity {
            write!(f, " / {}", capacity)?;
        }
        if let Some(pct) = self.percentage {
            write!(f, " ({}% full)", pct)?;
        }
        writeln!(f)?;
        writeln!(f, "│  Shows: {}", self.show_count)?;
        writeln!(f, "│  Source: {} [{}]", self.source, self.data_quality)?;
        writeln!(f, "│  {}", self.context)?;
        write!(f, "└─ Last updated {}", self.last_updated)
    }
}
