//! UTC calendar helpers

use chrono::{Datelike, NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::domain::{HabitLog, DATE_FORMAT};

/// Format a date as `YYYY-MM-DD`
pub fn to_yyyymmdd(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// The current calendar date in UTC
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Every date of `year`, in order.
///
/// For the year containing `today` the list stops at `today` (inclusive);
/// later years yield nothing.
pub fn dates_for_year(year: i32, today: NaiveDate) -> Vec<NaiveDate> {
    if year > today.year() {
        return Vec::new();
    }

    let (Some(first), Some(last)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        return Vec::new();
    };

    let end = if year == today.year() { today } else { last };

    first.iter_days().take_while(|date| *date <= end).collect()
}

/// [`dates_for_year`] relative to the current UTC date
pub fn dates_for_year_utc(year: i32) -> Vec<NaiveDate> {
    dates_for_year(year, today_utc())
}

/// Partition logs into buckets keyed by calendar year
pub fn group_logs_by_year(logs: &[HabitLog]) -> BTreeMap<i32, Vec<HabitLog>> {
    let mut groups: BTreeMap<i32, Vec<HabitLog>> = BTreeMap::new();
    for log in logs {
        groups.entry(log.date.year()).or_default().push(log.clone());
    }
    groups
}

/// Years that have logs, newest first; the current year when there are none
pub fn years_to_render(logs: &[HabitLog], today: NaiveDate) -> Vec<i32> {
    let mut years: Vec<i32> = group_logs_by_year(logs).into_keys().rev().collect();
    if years.is_empty() {
        years.push(today.year());
    }
    years
}
