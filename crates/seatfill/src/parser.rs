use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{Html, Selector};

use crate::types::{Period, RawRow};
use crate::utils::parse_grouped_int;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Malformed row: {0}")]
    MalformedRow(String),
}

/// Outcome of running one strategy over a page.
///
/// `NoMatch` is the ordinary "try the next strategy" signal; errors are
/// reserved for markup the strategy could not make sense of at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Rows(Vec<RawRow>),
    NoMatch,
}

impl Extraction {
    /// Keeps only plausible rows; an empty result is a `NoMatch`.
    pub fn from_rows(rows: impl IntoIterator<Item = RawRow>) -> Self {
        let rows: Vec<RawRow> = rows.into_iter().filter(RawRow::is_plausible).collect();
        if rows.is_empty() {
            Extraction::NoMatch
        } else {
            Extraction::Rows(rows)
        }
    }
}

/// A candidate parser for one assumed page shape.
pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, html: &str) -> Result<Extraction, ParseError>;
}

static RE_TABLE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").expect("invalid regex: table row"));
static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("invalid regex: tag"));
static RE_NUMBER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:,\d{3})*").expect("invalid regex: number token"));
static RE_TABLE_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<td\b[^>]*>.*?</td>").expect("invalid regex: table cell"));
static RE_CELL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s*([0-9][0-9,]*)\s*<").expect("invalid regex: cell number"));
static RE_WEEK_ENDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Week Ending (\d{1,2}/\d{1,2}/\d{4})").expect("invalid regex: week ending")
});
static RE_BOX_OFFICE_UPDATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Box Office Updated:\s*([^<]+)").expect("invalid regex: box office updated")
});

/// One row per element carrying the attendance attribute.
///
/// Matches the current grosses page layout, where each show is a
/// `<div class="row" data-attendee="8,210">`. No capacity is published there.
#[derive(Debug, Clone)]
pub struct AttributeExtractor {
    selector: String,
    attribute: String,
}

impl Default for AttributeExtractor {
    fn default() -> Self {
        Self::new("div.row[data-attendee]", "data-attendee")
    }
}

impl AttributeExtractor {
    pub fn new(selector: &str, attribute: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attribute: attribute.to_string(),
        }
    }
}

impl Extractor for AttributeExtractor {
    fn name(&self) -> &'static str {
        "attribute"
    }

    fn extract(&self, html: &str) -> Result<Extraction, ParseError> {
        let selector = Selector::parse(&self.selector).map_err(|e| ParseError::Selector {
            selector: self.selector.clone(),
            reason: e.to_string(),
        })?;
        let document = Html::parse_document(html);

        let rows = document
            .select(&selector)
            .filter_map(|e| e.value().attr(&self.attribute))
            .map(|value| RawRow::show(parse_grouped_int(value), None));

        Ok(Extraction::from_rows(rows))
    }
}

/// Positional reading of `<tr>` blocks: the 5th number on the row is the
/// attendance and the 6th the capacity.
///
/// XXX: this mirrors one observed table layout and breaks on any column
/// reordering. It is kept as a secondary strategy only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableRowExtractor;

impl TableRowExtractor {
    const ATTENDANCE_TOKEN: usize = 4;
    const CAPACITY_TOKEN: usize = 5;
}

impl Extractor for TableRowExtractor {
    fn name(&self) -> &'static str {
        "table_row"
    }

    fn extract(&self, html: &str) -> Result<Extraction, ParseError> {
        let rows = RE_TABLE_ROW.captures_iter(html).filter_map(|caps| {
            let text = RE_TAG.replace_all(&caps[1], " ");
            let tokens: Vec<u64> = RE_NUMBER_TOKEN
                .find_iter(&text)
                .map(|m| parse_grouped_int(m.as_str()))
                .collect();
            let attendance = *tokens.get(Self::ATTENDANCE_TOKEN)?;
            let capacity = *tokens.get(Self::CAPACITY_TOKEN)?;
            Some(RawRow::show(attendance, Some(capacity)))
        });

        Ok(Extraction::from_rows(rows))
    }
}

/// Reads the single row for one year/week off the grosses-by-week page.
///
/// That page lists the same week across many years; the wanted row is the
/// one whose year link points back at the requested period.
#[derive(Debug, Clone, Copy)]
pub struct CellPositionExtractor {
    period: Period,
}

impl CellPositionExtractor {
    const MIN_CELLS: usize = 8;
    const SEATS_SOLD_CELL: usize = 5;
    const SHOW_COUNT_CELL: usize = 7;

    pub fn new(period: Period) -> Self {
        Self { period }
    }

    fn anchor_pattern(&self) -> Result<Regex, ParseError> {
        let Period { year, week } = self.period;
        Ok(Regex::new(&format!(
            r#"(?i)<a\s+href="[^"]*year={year}&(?:amp;)?week={week}"[^>]*>\s*{year}\s*</a>"#
        ))?)
    }
}

fn cell_number(cell: &str, label: &str) -> Result<u64, ParseError> {
    RE_CELL_NUMBER
        .captures(cell)
        .map(|caps| parse_grouped_int(&caps[1]))
        .ok_or_else(|| ParseError::MalformedRow(format!("No numeric {label} in cell: {cell}")))
}

impl Extractor for CellPositionExtractor {
    fn name(&self) -> &'static str {
        "cell_position"
    }

    fn extract(&self, html: &str) -> Result<Extraction, ParseError> {
        let Some(anchor) = self.anchor_pattern()?.find(html) else {
            return Ok(Extraction::NoMatch);
        };

        // ASCII lowercasing keeps byte offsets aligned with `html`.
        let lower = html.to_ascii_lowercase();
        let row_start = lower[..anchor.start()].rfind("<tr").ok_or_else(|| {
            ParseError::MalformedRow(format!("Row for {} is not inside a <tr>", self.period))
        })?;
        let row_end = lower[anchor.end()..]
            .find("</tr>")
            .map(|i| anchor.end() + i + "</tr>".len())
            .unwrap_or(html.len());
        let row = &html[row_start..row_end];

        let cells: Vec<&str> = RE_TABLE_CELL.find_iter(row).map(|m| m.as_str()).collect();
        if cells.len() < Self::MIN_CELLS {
            return Err(ParseError::MalformedRow(format!(
                "Expected at least {} cells for {}, found {}",
                Self::MIN_CELLS,
                self.period,
                cells.len()
            )));
        }

        let seats_sold = cell_number(cells[Self::SEATS_SOLD_CELL], "seats sold")?;
        let show_count = cell_number(cells[Self::SHOW_COUNT_CELL], "show count")?;
        if show_count == 0 {
            return Ok(Extraction::NoMatch);
        }

        Ok(Extraction::from_rows([RawRow {
            attendance: seats_sold,
            capacity: None,
            shows: u32::try_from(show_count).unwrap_or(u32::MAX),
        }]))
    }
}

/// Strategies for the current grosses page, in priority order.
pub fn current_page_extractors() -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(AttributeExtractor::default()),
        Box::new(TableRowExtractor),
    ]
}

/// Strategies for the grosses-by-week page, in priority order.
///
/// The positional table reader is left out here: every row on that page is
/// a whole week for some year, so its tokens would be read as one show.
pub fn by_week_extractors(period: Period) -> Vec<Box<dyn Extractor>> {
    vec![Box::new(CellPositionExtractor::new(period))]
}

/// Week-ending date announced in the page banner, if any.
///
/// An unparseable `Week Ending` date falls through to the box-office banner.
pub fn parse_week_ending(html: &str) -> Option<NaiveDate> {
    RE_WEEK_ENDING
        .captures(html)
        .and_then(|caps| NaiveDate::parse_from_str(&caps[1], "%m/%d/%Y").ok())
        .or_else(|| {
            let caps = RE_BOX_OFFICE_UPDATED.captures(html)?;
            NaiveDate::parse_from_str(caps[1].trim(), "%B %d, %Y").ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(extraction: Extraction) -> Vec<RawRow> {
        match extraction {
            Extraction::Rows(rows) => rows,
            Extraction::NoMatch => panic!("expected rows, got NoMatch"),
        }
    }

    const CURRENT_PAGE: &str = r#"
        <html><body>
          <h1>Broadway Grosses: Week Ending 8/31/2025</h1>
          <div class="row" data-attendee="8,210" data-show="hamilton"></div>
          <div class="row" data-attendee="12,403" data-show="wicked"></div>
          <div class="row" data-attendee="" data-show="closing"></div>
          <div class="row header" data-attendee="ATTENDANCE"></div>
          <div class="ad" data-attendee="9,999"></div>
        </body></html>
    "#;

    const BY_WEEK_PAGE: &str = r#"
        <TABLE>
          <TR><TD>Year</TD><TD>Week</TD><TD>Gross</TD><TD>Avg</TD><TD>Cap</TD><TD>Seats</TD><TD>Perfs</TD><TD>Shows</TD></TR>
          <TR>
            <td class="y"><a href="grossesbyweek.cfm?year=2022&week=35">2022</a></td>
            <td>35</td><td>$29,211,520</td><td>$121</td><td>88%</td>
            <td><b>241,300</b></td><td>248</td><td>31</td>
          </TR>
          <TR>
            <td class="y"><a href="grossesbyweek.cfm?year=2023&amp;week=35">2023</a></td>
            <td>35</td><td>$31,002,114</td><td>$127</td><td>90%</td>
            <td>252,114</td><td>264</td><td>33</td>
          </TR>
        </TABLE>
    "#;

    #[test]
    fn test_attribute_extractor_reads_rows() {
        let rows = rows(AttributeExtractor::default().extract(CURRENT_PAGE).unwrap());

        assert_eq!(rows.len(), 2, "blank and non-numeric attributes are skipped");
        assert_eq!(rows[0], RawRow::show(8210, None));
        assert_eq!(rows[1], RawRow::show(12_403, None));
    }

    #[test]
    fn test_attribute_extractor_no_match() {
        let extraction = AttributeExtractor::default()
            .extract("<html><body><p>Nothing here</p></body></html>")
            .unwrap();
        assert_eq!(extraction, Extraction::NoMatch);
    }

    #[test]
    fn test_attribute_extractor_bad_selector() {
        let err = AttributeExtractor::new("div[[", "data-attendee")
            .extract(CURRENT_PAGE)
            .unwrap_err();
        assert!(matches!(err, ParseError::Selector { .. }));
    }

    #[test]
    fn test_table_row_extractor_positional_tokens() {
        let html = r#"
            <table>
              <tr><th>Show</th><th>Gross</th><th>Prev</th><th>Avg %</th><th>Perfs</th><th>Attend</th><th>Cap</th></tr>
              <tr class="show"><td><a href="/shows/hamilton">Hamilton</a></td><td>$2,345,678</td><td>1,234</td>
                  <td>98%</td><td>8</td><td>10,640</td><td>10,752</td></tr>
              <tr><td>Wicked</td><td>$2,011,004</td><td>950</td><td>95%</td><td>8</td><td>13,002</td><td>14,472</td></tr>
            </table>
        "#;

        let rows = rows(TableRowExtractor.extract(html).unwrap());

        assert_eq!(rows.len(), 2, "header row carries no numbers");
        assert_eq!(rows[0], RawRow::show(10_640, Some(10_752)));
        assert_eq!(rows[1], RawRow::show(13_002, Some(14_472)));
    }

    #[test]
    fn test_table_row_extractor_discards_impossible_rows() {
        let html = r#"
            <table>
              <tr><td>Over</td><td>1</td><td>2</td><td>3</td><td>4</td><td>20,000</td><td>10,000</td></tr>
              <tr><td>Zero cap</td><td>1</td><td>2</td><td>3</td><td>4</td><td>500</td><td>0</td></tr>
              <tr><td>Short</td><td>1</td><td>2</td><td>3</td></tr>
              <tr><td>Good</td><td>1</td><td>2</td><td>3</td><td>4</td><td>7,000</td><td>9,000</td></tr>
            </table>
        "#;

        let rows = rows(TableRowExtractor.extract(html).unwrap());

        assert_eq!(rows, vec![RawRow::show(7000, Some(9000))]);
    }

    #[test]
    fn test_table_row_extractor_no_rows() {
        assert_eq!(TableRowExtractor.extract("").unwrap(), Extraction::NoMatch);
        assert_eq!(
            TableRowExtractor.extract("<div>no table</div>").unwrap(),
            Extraction::NoMatch
        );
    }

    #[test]
    fn test_cell_position_extractor_finds_period_row() {
        let period = Period::new(2022, 35).unwrap();
        let rows = rows(CellPositionExtractor::new(period).extract(BY_WEEK_PAGE).unwrap());

        assert_eq!(
            rows,
            vec![RawRow {
                attendance: 241_300,
                capacity: None,
                shows: 31
            }]
        );
    }

    #[test]
    fn test_cell_position_extractor_accepts_escaped_ampersand() {
        let period = Period::new(2023, 35).unwrap();
        let rows = rows(CellPositionExtractor::new(period).extract(BY_WEEK_PAGE).unwrap());

        assert_eq!(rows[0].attendance, 252_114);
        assert_eq!(rows[0].shows, 33);
    }

    #[test]
    fn test_cell_position_extractor_missing_anchor() {
        let period = Period::new(2005, 35).unwrap();
        let extraction = CellPositionExtractor::new(period).extract(BY_WEEK_PAGE).unwrap();
        assert_eq!(extraction, Extraction::NoMatch);
    }

    #[test]
    fn test_cell_position_extractor_too_few_cells() {
        let html = r#"<table><tr><td><a href="x.cfm?year=2022&week=35">2022</a></td><td>35</td></tr></table>"#;
        let period = Period::new(2022, 35).unwrap();
        let err = CellPositionExtractor::new(period).extract(html).unwrap_err();
        assert!(matches!(err, ParseError::MalformedRow(_)));
    }

    #[test]
    fn test_cell_position_extractor_non_numeric_cell() {
        let html = r#"<table><tr><td><a href="x.cfm?year=2022&week=35">2022</a></td>
            <td>35</td><td>-</td><td>-</td><td>-</td><td>n/a</td><td>-</td><td>30</td></tr></table>"#;
        let period = Period::new(2022, 35).unwrap();
        let err = CellPositionExtractor::new(period).extract(html).unwrap_err();
        assert!(matches!(err, ParseError::MalformedRow(_)));
    }

    #[test]
    fn test_cell_position_extractor_zero_values() {
        let html = r#"<table><tr><td><a href="x.cfm?year=2020&week=20">2020</a></td>
            <td>20</td><td>0</td><td>0</td><td>0</td><td>0</td><td>0</td><td>0</td></tr></table>"#;
        let period = Period::new(2020, 20).unwrap();
        let extraction = CellPositionExtractor::new(period).extract(html).unwrap();
        assert_eq!(extraction, Extraction::NoMatch);
    }

    #[test]
    fn test_parse_week_ending_numeric() {
        assert_eq!(
            parse_week_ending(CURRENT_PAGE),
            NaiveDate::from_ymd_opt(2025, 8, 31)
        );
    }

    #[test]
    fn test_parse_week_ending_box_office_banner() {
        let html = "<span>Box Office Updated: September 7, 2025</span>";
        assert_eq!(parse_week_ending(html), NaiveDate::from_ymd_opt(2025, 9, 7));
    }

    #[test]
    fn test_parse_week_ending_invalid_date_uses_box_office_banner() {
        let html = "<h1>Week Ending 13/45/2025</h1><span>Box Office Updated: September 7, 2025</span>";
        assert_eq!(parse_week_ending(html), NaiveDate::from_ymd_opt(2025, 9, 7));
        assert_eq!(parse_week_ending("<h1>Week Ending 13/45/2025</h1>"), None);
    }

    #[test]
    fn test_parse_week_ending_absent() {
        assert_eq!(parse_week_ending("<html></html>"), None);
        assert_eq!(parse_week_ending("Box Office Updated: soon<"), None);
    }
}
