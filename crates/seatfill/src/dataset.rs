//! Lookup into the bundled weekly dataset.
//!
//! Rows are joined on their `week_number` column and the year taken from the
//! `week_ending` text (`DD-MM-YY`). Every matching row that passes the row
//! acceptance rule counts as one show. When the file has a capacity column,
//! a row with a blank or zero capacity, or more seats sold than capacity, is
//! discarded rather than summed.

use serde::Deserialize;

use crate::types::{Period, RawRow, Tally};
use crate::utils::parse_grouped_int;

const REQUIRED_COLUMNS: [&str; 3] = ["week_number", "week_ending", "seats_sold"];
const CAPACITY_COLUMN: &str = "seats_in_theatre";

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Dataset is missing column '{0}'")]
    MissingColumn(&'static str),
    #[error("No dataset rows for {0}")]
    NotFound(Period),
}

#[derive(Debug, Deserialize)]
struct DatasetRow {
    week_number: String,
    week_ending: String,
    seats_sold: String,
    #[serde(default)]
    seats_in_theatre: Option<String>,
}

impl DatasetRow {
    fn matches(&self, period: Period) -> bool {
        self.week_number.trim().parse::<u32>().ok() == Some(period.week)
            && week_ending_year(&self.week_ending) == Some(period.year)
    }

    /// `tracks_capacity` is whether the file has a capacity column at all; a
    /// blank cell in that column reads as a capacity of 0.
    fn to_raw_row(&self, tracks_capacity: bool) -> RawRow {
        let capacity = tracks_capacity
            .then(|| parse_grouped_int(self.seats_in_theatre.as_deref().unwrap_or_default()));
        RawRow::show(parse_grouped_int(&self.seats_sold), capacity)
    }
}

/// Year of a `DD-MM-YY` (or `DD-MM-YYYY`) week ending.
fn week_ending_year(week_ending: &str) -> Option<i32> {
    let parts: Vec<&str> = week_ending.trim().split('-').collect();
    let [_, _, year] = parts.as_slice() else {
        return None;
    };
    let value: i32 = year.parse().ok()?;
    match year.len() {
        2 => Some(2000 + value),
        4 => Some(value),
        _ => None,
    }
}

/// Sums the dataset rows for `period`.
pub fn lookup(period: Period, csv_text: &str) -> Result<Tally, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(csv_text.as_bytes());

    let headers = reader.headers()?.clone();
    if let Some(missing) = REQUIRED_COLUMNS
        .into_iter()
        .find(|col| !headers.iter().any(|h| h == *col))
    {
        return Err(DatasetError::MissingColumn(missing));
    }
    let tracks_capacity = headers.iter().any(|h| h == CAPACITY_COLUMN);

    let mut rows = Vec::new();
    for (line, result) in reader.deserialize::<DatasetRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                log::warn!("Skipping dataset record {}: {}", line + 1, e);
                continue;
            }
        };
        if row.matches(period) {
            rows.push(row.to_raw_row(tracks_capacity));
        }
    }

    let matched = rows.len();
    let counted: Vec<RawRow> = rows.into_iter().filter(RawRow::is_plausible).collect();
    if counted.len() < matched {
        log::debug!(
            "Discarded {} implausible dataset rows for {}",
            matched - counted.len(),
            period
        );
    }
    log::debug!("{} dataset rows counted for {}", counted.len(), period);

    Tally::from_rows(&counted).ok_or(DatasetError::NotFound(period))
}
