//! Turns a merged CSS property map into a [`ParagraphStyle`].

use crate::error::Result;
use crate::font::FontTable;
use crate::model::PageGeometry;
use crate::style::{Borders, Color, ParagraphStyle};
use crate::units::parse_dimension;

use super::css::PropertyMap;

/// Font size `em` values resolve against when the node sets none.
pub const DEFAULT_FONT_SIZE: f64 = 12.0;

/// What style construction needs besides the properties themselves.
#[derive(Debug, Clone, Copy)]
pub struct StyleContext<'a> {
    pub geometry: PageGeometry,
    pub fonts: &'a FontTable,
    pub dpi: f64,
}

pub fn style_from_properties(properties: &PropertyMap, ctx: &StyleContext<'_>) -> Result<ParagraphStyle> {
    let get = |name: &str| properties.get(name).map(String::as_str);
    let mut style = ParagraphStyle::new(ctx.geometry);

    if let Some(size) = get("font-size") {
        style.font_size = parse_dimension(size, DEFAULT_FONT_SIZE, ctx.dpi)?;
    }
    let font_size = style.font_size;
    let dimension = |value: &str| parse_dimension(value, font_size, ctx.dpi);

    style.font = ctx
        .fonts
        .resolve_css(get("font-family"), get("font-weight"), get("font-style"));
    if let Some(color) = get("color") {
        style.color = Color::parse_or_black(color);
    }

    let all = match get("border") {
        Some(value) => border_width(value, &dimension)?,
        None => 0.0,
    };
    let side = |name: &str| -> Result<f64> {
        let width_key = format!("{}-width", name);
        match get(name).or_else(|| get(&width_key)) {
            Some(value) => border_width(value, &dimension),
            None => Ok(all),
        }
    };
    style.border = Borders {
        top: side("border-top")?,
        right: side("border-right")?,
        bottom: side("border-bottom")?,
        left: side("border-left")?,
    };

    let [mut top, mut right, mut bottom, mut left] = match get("padding") {
        Some(value) => box_shorthand(value, &dimension)?,
        None => [0.0; 4],
    };
    for (name, slot) in [
        ("padding-top", &mut top),
        ("padding-right", &mut right),
        ("padding-bottom", &mut bottom),
        ("padding-left", &mut left),
    ] {
        if let Some(value) = get(name) {
            *slot = dimension(value)?;
        }
    }
    style.above_spacing = top;
    style.after_text_indent = right;
    style.below_spacing = bottom;
    style.before_text_indent = left;

    if let Some(indent) = get("text-indent") {
        style.first_line_indent = dimension(indent)?;
    }

    if let Some(width) = get("width").filter(|w| !w.eq_ignore_ascii_case("auto")) {
        let width = dimension(width)?;
        style.block_width = (width > 0.0).then_some(width);
    }

    if let Some(line_height) = get("line-height") {
        style.line_spacing = line_spacing(line_height, font_size, &dimension)?;
    }

    Ok(style)
}

/// The width token of a border shorthand such as `1px solid black`.
fn border_width(value: &str, dimension: &impl Fn(&str) -> Result<f64>) -> Result<f64> {
    for token in value.split_whitespace() {
        match token.to_ascii_lowercase().as_str() {
            "none" | "hidden" => return Ok(0.0),
            "thin" => return Ok(1.0),
            "medium" => return Ok(3.0),
            "thick" => return Ok(5.0),
            _ if token.starts_with(|c: char| c.is_ascii_digit() || c == '.') => {
                return dimension(token)
            }
            _ => {}
        }
    }
    Ok(0.0)
}

/// CSS one-to-four value box shorthand as [top, right, bottom, left].
fn box_shorthand(value: &str, dimension: &impl Fn(&str) -> Result<f64>) -> Result<[f64; 4]> {
    let values = value
        .split_whitespace()
        .map(dimension)
        .collect::<Result<Vec<f64>>>()?;
    Ok(match values.as_slice() {
        [] => [0.0; 4],
        [all] => [*all; 4],
        [vertical, horizontal] => [*vertical, *horizontal, *vertical, *horizontal],
        [top, horizontal, bottom] => [*top, *horizontal, *bottom, *horizontal],
        [top, right, bottom, left, ..] => [*top, *right, *bottom, *left],
    })
}

fn line_spacing(value: &str, font_size: f64, dimension: &impl Fn(&str) -> Result<f64>) -> Result<f64> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("normal") {
        return Ok(1.0);
    }
    if let Ok(multiplier) = value.parse::<f64>() {
        return Ok(multiplier);
    }
    if let Some(percent) = value.strip_suffix('%').and_then(|p| p.trim().parse::<f64>().ok()) {
        return Ok(percent / 100.0);
    }
    let height = dimension(value)?;
    Ok(if font_size > 0.0 { height / font_size } else { 1.0 })
}
