//! Per-habit colours derived from a single hue

use std::fmt;

use crate::domain::MAX_COLOR_HUE;

/// An HSL colour, rendered as CSS `hsl(h s% l%)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsl {
    pub hue: i32,
    pub saturation: u8,
    pub lightness: u8,
}

impl Hsl {
    pub const fn new(hue: i32, saturation: u8, lightness: u8) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    pub fn to_css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({} {}% {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

/// The colour set used to draw one habit card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Card background
    pub background: Hsl,
    /// Fill of a month region
    pub month_background: Hsl,
    /// Outline of an empty day
    pub cell_border: Hsl,
    /// Fill of a completed day
    pub cell: Hsl,
    /// Labels
    pub text: Hsl,
}

impl Palette {
    pub fn for_hue(hue: i32) -> Self {
        let hue = hue.clamp(0, MAX_COLOR_HUE);
        Self {
            background: Hsl::new(hue, 54, 13),
            month_background: Hsl::new(hue, 60, 19),
            cell_border: Hsl::new(hue, 54, 29),
            cell: Hsl::new(hue, 100, 60),
            text: Hsl::new(hue, 60, 50),
        }
    }

    /// Fill for a day with `value` given the year's largest value.
    ///
    /// `None` means the day is empty and only its border is drawn. Graded
    /// habits shade from the border colour up to the full cell colour.
    pub fn day_fill(&self, value: i32, max_value: i32, is_boolean: bool) -> Option<Hsl> {
        if value <= 0 {
            return None;
        }
        if is_boolean || max_value <= 1 {
            return Some(self.cell);
        }

        let ratio = (f64::from(value) / f64::from(max_value)).clamp(0.0, 1.0);
        let low = f64::from(self.cell_border.lightness);
        let high = f64::from(self.cell.lightness);
        let lightness = (low + (high - low) * ratio).round() as u8;

        Some(Hsl::new(self.cell.hue, self.cell.saturation, lightness))
    }
}
