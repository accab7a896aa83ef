//! # Units
//!
//! Everything on the page is measured in PDF points (1/72 inch). These
//! helpers convert physical units into points and parse CSS-style dimension
//! strings such as `12px`, `1.5em` or `20mm`.

use crate::error::{LayoutError, Result};

pub const POINTS_PER_INCH: f64 = 72.0;
pub const POINTS_PER_PICA: f64 = 12.0;
pub const MM_PER_INCH: f64 = 25.4;

/// Screen resolution assumed for `px` values unless configured otherwise.
pub const DEFAULT_DPI: f64 = 96.0;

pub fn inches(value: f64) -> f64 {
    value * POINTS_PER_INCH
}

pub fn millimeters(value: f64) -> f64 {
    value * POINTS_PER_INCH / MM_PER_INCH
}

pub fn picas(value: f64) -> f64 {
    value * POINTS_PER_PICA
}

/// Convert pixels at the given resolution to points.
pub fn pixels(value: f64, dpi: f64) -> Result<f64> {
    if dpi <= 0.0 {
        return Err(LayoutError::InvalidDpi(dpi));
    }
    Ok(value * POINTS_PER_INCH / dpi)
}

/// Parse a dimension string into points.
///
/// A bare number is taken as points. `em` resolves against `font_size`,
/// `px` against `dpi`. Any other suffix is an error.
pub fn parse_dimension(input: &str, font_size: f64, dpi: f64) -> Result<f64> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let value: f64 = number
        .parse()
        .map_err(|_| LayoutError::MalformedDimension(input.to_string()))?;

    match unit.trim().to_ascii_lowercase().as_str() {
        "" | "pt" => Ok(value),
        "px" => pixels(value, dpi),
        "mm" => Ok(millimeters(value)),
        "pc" => Ok(picas(value)),
        "in" => Ok(inches(value)),
        "em" => Ok(value * font_size),
        other => Err(LayoutError::UnsupportedUnit {
            input: input.to_string(),
            unit: other.to_string(),
        }),
    }
}
