//! Pixel layout of a year heatmap

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};

use super::blob::blob_path;
use super::dates::dates_for_year;
use super::grid::{grid_position, GridCell, DAYS_PER_WEEK, MONTH_NAMES};
use super::outline::{trace_outlines, Point};
use crate::domain::HabitLog;

/// Sizes used to lay out a heatmap, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    /// Side of a day square
    pub cell_size: f64,
    /// Space between neighbouring day squares
    pub cell_gap: f64,
    /// Distance from a month's outer day squares to its outline.
    /// Keep below half the gap so neighbouring months stay apart.
    pub month_padding: f64,
    pub corner_radius: f64,
    /// Height of the month label row above the grid
    pub label_height: f64,
    pub margin: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            cell_size: 12.0,
            cell_gap: 6.0,
            month_padding: 2.0,
            corner_radius: 4.0,
            label_height: 16.0,
            margin: 8.0,
        }
    }
}

impl LayoutOptions {
    /// Distance between the origins of neighbouring cells
    pub fn pitch(&self) -> f64 {
        self.cell_size + self.cell_gap
    }

    fn origin(&self) -> Point {
        Point::new(self.margin, self.margin + self.label_height)
    }

    /// Map a grid-line coordinate to pixels
    fn grid_to_pixels(&self, p: Point) -> Point {
        let origin = self.origin();
        Point::new(origin.x + p.x * self.pitch(), origin.y + p.y * self.pitch())
    }

    /// Offset from grid lines to the month outline; negative moves inward
    fn outline_offset(&self) -> f64 {
        self.month_padding - self.cell_gap / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One day square
#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub cell: GridCell,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    /// Logged value for the day, 0 when nothing was logged
    pub value: i32,
}

impl DayCell {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.size,
            height: self.size,
        }
    }
}

/// The rounded region drawn behind one month's days
#[derive(Debug, Clone, PartialEq)]
pub struct MonthRegion {
    /// 1 = January
    pub month: u32,
    pub label: &'static str,
    pub label_x: f64,
    pub label_y: f64,
    pub bounds: Rect,
    /// Traced outlines on pixel grid lines, before padding
    pub outlines: Vec<Vec<Point>>,
    /// SVG path data, one closed subpath per outline
    pub path: String,
    pub day_count: usize,
}

/// A fully positioned heatmap for one year
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapLayout {
    pub year: i32,
    pub width: f64,
    pub height: f64,
    pub days: Vec<DayCell>,
    pub months: Vec<MonthRegion>,
    /// Largest value among the days, 0 when none were logged
    pub max_value: i32,
    pub options: LayoutOptions,
}

impl HeatmapLayout {
    /// Lay out `year` up to `today`, colouring days from `values`
    pub fn build(
        year: i32,
        today: NaiveDate,
        values: &HashMap<NaiveDate, i32>,
        options: LayoutOptions,
    ) -> Self {
        let pitch = options.pitch();
        let inset = options.cell_gap / 2.0;

        let days: Vec<DayCell> = dates_for_year(year, today)
            .into_iter()
            .map(|date| {
                let cell = grid_position(date);
                let corner =
                    options.grid_to_pixels(Point::new(f64::from(cell.week), f64::from(cell.weekday)));
                DayCell {
                    date,
                    cell,
                    x: corner.x + inset,
                    y: corner.y + inset,
                    size: options.cell_size,
                    value: values.get(&date).copied().unwrap_or(0).max(0),
                }
            })
            .collect();

        let max_value = days.iter().map(|d| d.value).max().unwrap_or(0);

        let mut by_month: BTreeMap<u32, Vec<GridCell>> = BTreeMap::new();
        for day in &days {
            by_month.entry(day.date.month()).or_default().push(day.cell);
        }

        let months = by_month
            .into_iter()
            .map(|(month, cells)| month_region(month, &cells, &options))
            .collect();

        let weeks = days.iter().map(|d| d.cell.week + 1).max().unwrap_or(0);
        let origin = options.origin();

        Self {
            year,
            width: origin.x + f64::from(weeks) * pitch + options.margin,
            height: origin.y + f64::from(DAYS_PER_WEEK) * pitch + options.margin,
            days,
            months,
            max_value,
            options,
        }
    }

    /// Lay out `year` from a habit's logs
    pub fn from_logs(
        year: i32,
        today: NaiveDate,
        logs: &[HabitLog],
        options: LayoutOptions,
    ) -> Self {
        let values: HashMap<NaiveDate, i32> = logs
            .iter()
            .filter(|log| log.date.year() == year)
            .map(|log| (log.date, log.value))
            .collect();
        Self::build(year, today, &values, options)
    }

    /// Number of week columns
    pub fn weeks(&self) -> u32 {
        self.days.iter().map(|d| d.cell.week + 1).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

fn month_region(month: u32, cells: &[GridCell], options: &LayoutOptions) -> MonthRegion {
    let offset = options.outline_offset();

    let outlines: Vec<Vec<Point>> = trace_outlines(cells)
        .into_iter()
        .map(|poly| {
            poly.into_iter()
                .map(|p| options.grid_to_pixels(p))
                .collect()
        })
        .collect();

    let path = outlines
        .iter()
        .map(|poly| blob_path(poly, offset, options.corner_radius))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in outlines.iter().flatten() {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let bounds = if min_x.is_finite() {
        Rect {
            x: min_x - offset,
            y: min_y - offset,
            width: (max_x - min_x) + 2.0 * offset,
            height: (max_y - min_y) + 2.0 * offset,
        }
    } else {
        Rect {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        }
    };

    let label = MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("");

    MonthRegion {
        month,
        label,
        label_x: bounds.x,
        label_y: options.margin + options.label_height * 0.75,
        bounds,
        outlines,
        path,
        day_count: cells.len(),
    }
}
