use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Parses a comma-grouped integer such as `"1,234,567"`.
///
/// Returns 0 for anything that is not a non-negative integer once the
/// separators are removed.
pub fn parse_grouped_int(text: &str) -> u64 {
    let digits: String = text.trim().chars().filter(|c| *c != ',').collect();
    digits.parse().unwrap_or(0)
}

/// Latest date on or before `today` that falls on `boundary`.
pub fn most_recent_week_boundary(today: NaiveDate, boundary: Weekday) -> NaiveDate {
    let days_back = (today.weekday().num_days_from_monday() + 7
        - boundary.num_days_from_monday())
        % 7;
    today - Days::new(u64::from(days_back))
}

/// Last day of the `week`th seven-day block counted from January 1st.
///
/// This is an approximation of the publisher's week ending (within a few
/// days); only determinism matters for callers.
pub fn week_number_to_date(year: i32, week: u32) -> Option<NaiveDate> {
    if !(1..=53).contains(&week) {
        return None;
    }
    let offset = Days::new(u64::from((week - 1) * 7 + 6));
    NaiveDate::from_ymd_opt(year, 1, 1)?.checked_add_days(offset)
}

/// Inverse of [`week_number_to_date`].
pub fn week_of_year(date: NaiveDate) -> u32 {
    date.ordinal0() / 7 + 1
}

pub fn week_ending_label(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

pub fn last_updated_label(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}
