//! SVG rendering of a heatmap layout

use chrono::NaiveDate;
use std::fmt::Write;

use super::blob::fmt_num;
use super::dates::to_yyyymmdd;
use super::layout::{HeatmapLayout, LayoutOptions};
use super::palette::Palette;
use crate::domain::HabitWithLogs;

const FONT_SIZE: f64 = 10.0;
const CELL_RADIUS: f64 = 2.0;

/// Render `layout` as a standalone SVG document
pub fn render_svg(
    layout: &HeatmapLayout,
    palette: &Palette,
    is_boolean: bool,
    title: Option<&str>,
) -> String {
    let mut svg = String::with_capacity(256 + layout.days.len() * 160);

    let width = fmt_num(layout.width);
    let height = fmt_num(layout.height);
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );

    if let Some(title) = title {
        let _ = writeln!(svg, "<title>{} {}</title>", escape_xml(title), layout.year);
    }

    let _ = writeln!(
        svg,
        r#"<rect width="100%" height="100%" rx="{}" fill="{}"/>"#,
        fmt_num(layout.options.margin),
        palette.background
    );

    svg.push_str("<g class=\"months\">\n");
    for month in &layout.months {
        if !month.path.is_empty() {
            let _ = writeln!(
                svg,
                r#"<path d="{}" fill="{}"/>"#,
                month.path, palette.month_background
            );
        }
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" fill="{}" font-size="{}" font-family="sans-serif">{}</text>"#,
            fmt_num(month.label_x),
            fmt_num(month.label_y),
            palette.text,
            fmt_num(FONT_SIZE),
            month.label
        );
    }
    svg.push_str("</g>\n");

    svg.push_str("<g class=\"days\">\n");
    for day in &layout.days {
        let (fill, stroke) = match palette.day_fill(day.value, layout.max_value, is_boolean) {
            Some(colour) => (colour.to_css(), "none".to_string()),
            None => ("none".to_string(), palette.cell_border.to_css()),
        };
        let label = if is_boolean || day.value == 0 {
            to_yyyymmdd(day.date)
        } else {
            format!("{}: {}", to_yyyymmdd(day.date), day.value)
        };
        let _ = writeln!(
            svg,
            r#"<rect x="{}" y="{}" width="{size}" height="{size}" rx="{}" fill="{fill}" stroke="{stroke}"><title>{label}</title></rect>"#,
            fmt_num(day.x),
            fmt_num(day.y),
            fmt_num(CELL_RADIUS),
            size = fmt_num(day.size),
        );
    }
    svg.push_str("</g>\n");

    svg.push_str("</svg>\n");
    svg
}

/// Lay out and render one year of a habit with default sizes
pub fn render_habit_heatmap(habit: &HabitWithLogs, year: i32, today: NaiveDate) -> String {
    let layout = HeatmapLayout::from_logs(year, today, &habit.logs, LayoutOptions::default());
    let palette = Palette::for_hue(habit.habit.color_hue);
    render_svg(
        &layout,
        &palette,
        habit.habit.is_boolean,
        Some(&habit.habit.name),
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
