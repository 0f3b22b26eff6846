//! PeakStreak Calendar Heatmap
//!
//! Turns a year of habit logs into a drawable heatmap:
//!
//! - **dates**: UTC calendar helpers (`dates_for_year`, `group_logs_by_year`)
//! - **grid**: (week, weekday) placement of every date
//! - **outline**: boundary tracing of a month's cells into polygons
//! - **blob**: padded, rounded SVG paths around those polygons
//! - **layout**: pixel layout of days and month regions
//! - **palette**: per-hue colours
//! - **svg**: SVG document rendering
//!
//! # Pipeline
//!
//! ```text
//! logs ─▶ dates_for_year ─▶ grid_position ─▶ bucket by month
//!                                               │
//!             blob_path ◀─ trace_outlines (holes wind clockwise)
//!                 │
//!                 ▼
//!           HeatmapLayout ─▶ render_svg
//! ```
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use peakstreak::calendar::{HeatmapLayout, LayoutOptions};
//! use std::collections::HashMap;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
//! let layout = HeatmapLayout::build(2024, today, &HashMap::new(), LayoutOptions::default());
//! assert_eq!(layout.days.len(), 366);
//! assert_eq!(layout.months.len(), 12);
//! ```

mod blob;
mod dates;
mod grid;
mod layout;
mod outline;
mod palette;
mod svg;

pub use blob::blob_path;
pub use dates::{
    dates_for_year, dates_for_year_utc, group_logs_by_year, to_yyyymmdd, today_utc,
    years_to_render,
};
pub use grid::{grid_position, GridCell, DAYS_PER_WEEK, MONTH_NAMES};
pub use layout::{DayCell, HeatmapLayout, LayoutOptions, MonthRegion, Rect};
pub use outline::{orient_ccw, reduce_colinear, signed_area, trace_outlines, Point};
pub use palette::{Hsl, Palette};
pub use svg::{render_habit_heatmap, render_svg};
