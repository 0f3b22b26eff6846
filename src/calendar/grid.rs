//! Week/weekday placement
//!
//! Columns are weeks counted from the week containing January 1st, rows are
//! weekdays starting on Sunday.

use chrono::{Datelike, NaiveDate};

pub const DAYS_PER_WEEK: u32 = 7;

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A cell of the year grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    /// Column, 0 for the week containing January 1st
    pub week: u32,
    /// Row, 0 = Sunday
    pub weekday: u32,
}

impl GridCell {
    pub fn new(week: u32, weekday: u32) -> Self {
        Self { week, weekday }
    }
}

/// Position of `date` within its year's grid
///
/// Weeks run from 0 to 53. Week 53 only exists when December 31st of a leap
/// year falls on a Sunday (Jan 1st on a Saturday); those dates are kept in a
/// 54th column instead of being dropped.
pub fn grid_position(date: NaiveDate) -> GridCell {
    let weekday = date.weekday().num_days_from_sunday();
    let day_of_year = date.ordinal0();
    let jan1_weekday = (weekday + DAYS_PER_WEEK - day_of_year % DAYS_PER_WEEK) % DAYS_PER_WEEK;

    GridCell {
        week: (day_of_year + jan1_weekday) / DAYS_PER_WEEK,
        weekday,
    }
}
