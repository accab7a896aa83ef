//! # Style System
//!
//! Paragraph-level styles and the list specialization built on them.
//!
//! A [`ParagraphStyle`] owns everything needed to place a block of text:
//! font, size, color, the four directional indents, above/below spacing and
//! the line-spacing multiplier. All horizontal geometry is derived from the
//! shared [`PageGeometry`] plus those indents, so a style is a small `Copy`
//! value that can be duplicated freely per block.

use serde::{Deserialize, Serialize};

use crate::font::StandardFont;
use crate::model::PageGeometry;
use crate::units;

/// An RGB color with components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }

    /// Parse `#rgb` or `#rrggbb`.
    pub fn hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => Some(Self::rgb8(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
            )),
            6 => Some(Self::rgb8(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
            _ => None,
        }
    }

    /// The CSS basic color keywords.
    pub fn named(name: &str) -> Option<Self> {
        let (r, g, b) = match name.trim().to_ascii_lowercase().as_str() {
            "black" => (0, 0, 0),
            "white" => (255, 255, 255),
            "red" => (255, 0, 0),
            "green" => (0, 128, 0),
            "lime" => (0, 255, 0),
            "blue" => (0, 0, 255),
            "navy" => (0, 0, 128),
            "yellow" => (255, 255, 0),
            "orange" => (255, 165, 0),
            "purple" => (128, 0, 128),
            "fuchsia" | "magenta" => (255, 0, 255),
            "aqua" | "cyan" => (0, 255, 255),
            "teal" => (0, 128, 128),
            "olive" => (128, 128, 0),
            "maroon" => (128, 0, 0),
            "silver" => (192, 192, 192),
            "gray" | "grey" => (128, 128, 128),
            _ => return None,
        };
        Some(Self::rgb8(r, g, b))
    }

    /// Parse a CSS color value: a keyword, `#hex`, or `rgb(r, g, b)`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.starts_with('#') {
            return Self::hex(value);
        }
        let lower = value.to_ascii_lowercase();
        if let Some(args) = lower.strip_prefix("rgb(").and_then(|rest| rest.strip_suffix(')')) {
            let parts: Vec<u8> = args
                .split(',')
                .map(|p| p.trim().parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0) as u8))
                .collect::<Option<_>>()?;
            return match parts.as_slice() {
                [r, g, b] => Some(Self::rgb8(*r, *g, *b)),
                _ => None,
            };
        }
        Self::named(&lower)
    }

    /// Like [`Color::parse`], but unknown tokens become black.
    pub fn parse_or_black(value: &str) -> Self {
        Self::parse(value).unwrap_or_else(|| {
            log::debug!("unknown color '{}', using black", value);
            Self::BLACK
        })
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Border widths for the four sides of a block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Borders {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Borders {
    pub fn uniform(width: f64) -> Self {
        Self {
            top: width,
            right: width,
            bottom: width,
            left: width,
        }
    }

    pub fn has_borders(&self) -> bool {
        self.top > 0.0 || self.right > 0.0 || self.bottom > 0.0 || self.left > 0.0
    }
}

/// Placement and typography for one logical block of text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParagraphStyle {
    pub geometry: PageGeometry,
    pub font: StandardFont,
    pub font_size: f64,
    pub color: Color,
    /// Indent from the left content bound, applied to every line.
    pub before_text_indent: f64,
    /// Indent from the right content bound.
    pub after_text_indent: f64,
    /// Added to `before_text_indent` on the first line only. Negative values
    /// produce a hanging indent.
    pub first_line_indent: f64,
    pub above_spacing: f64,
    pub below_spacing: f64,
    pub line_spacing: f64,
    pub border: Borders,
    /// Overrides the available width when set.
    pub block_width: Option<f64>,
}

impl ParagraphStyle {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            font: StandardFont::TimesRoman,
            font_size: 12.0,
            color: Color::BLACK,
            before_text_indent: 0.0,
            after_text_indent: 0.0,
            first_line_indent: 0.0,
            above_spacing: 0.0,
            below_spacing: 0.0,
            line_spacing: 1.0,
            border: Borders::default(),
            block_width: None,
        }
    }

    pub fn line_height(&self) -> f64 {
        self.font_size * self.line_spacing
    }

    pub fn left_x(&self, first_line: bool) -> f64 {
        let x = self.geometry.left_x() + self.before_text_indent;
        if first_line {
            x + self.first_line_indent
        } else {
            x
        }
    }

    pub fn right_x(&self) -> f64 {
        match self.block_width {
            Some(width) if width > 0.0 => self.left_x(false) + width,
            _ => self.geometry.right_x() - self.after_text_indent,
        }
    }

    /// Width of the text column (continuation lines).
    pub fn width(&self) -> f64 {
        self.line_width(false)
    }

    /// Width available to a line, accounting for the first-line indent.
    pub fn line_width(&self, first_line: bool) -> f64 {
        self.right_x() - self.left_x(first_line)
    }

    /// Y of the first baseline when this block starts at cursor `y`.
    pub fn upper_y(&self, y: f64) -> f64 {
        y - self.above_spacing
    }

    /// The baseline one line below `y`.
    pub fn next_y(&self, y: f64) -> f64 {
        y - self.line_height()
    }
}

/// Produces the label for each list item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LabelProvider {
    /// Auto-incrementing integers starting at 1.
    Sequence { last: u32 },
    /// The same symbol for every item.
    Static(String),
}

impl LabelProvider {
    pub fn sequence() -> Self {
        Self::Sequence { last: 0 }
    }

    pub fn bullet() -> Self {
        Self::Static("\u{2022}".to_string())
    }

    pub fn next_label(&mut self) -> String {
        match self {
            Self::Sequence { last } => {
                *last += 1;
                last.to_string()
            }
            Self::Static(symbol) => symbol.clone(),
        }
    }
}

/// A paragraph style plus list labelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListStyle {
    pub style: ParagraphStyle,
    pub labels: LabelProvider,
    /// Placed between the label and the item body.
    pub delimiter: String,
}

impl ListStyle {
    pub fn new(style: ParagraphStyle, labels: LabelProvider, delimiter: impl Into<String>) -> Self {
        Self {
            style,
            labels,
            delimiter: delimiter.into(),
        }
    }

    /// `1. `, `2. `, `3. ` ...
    pub fn numbered(geometry: PageGeometry) -> Self {
        Self::new(Self::default_list_style(geometry), LabelProvider::sequence(), ". ")
    }

    /// `• ` for every item.
    pub fn bulleted(geometry: PageGeometry) -> Self {
        Self::new(Self::default_list_style(geometry), LabelProvider::bullet(), " ")
    }

    fn default_list_style(geometry: PageGeometry) -> ParagraphStyle {
        ParagraphStyle {
            above_spacing: units::inches(0.3),
            first_line_indent: units::inches(-0.1),
            ..ParagraphStyle::new(geometry)
        }
    }

    /// Take spacing, horizontal indents, typography and border from an
    /// element's style. The list keeps its own first-line indent and width.
    pub fn adopt_style(&mut self, style: &ParagraphStyle) {
        self.style = ParagraphStyle {
            first_line_indent: self.style.first_line_indent,
            block_width: self.style.block_width,
            ..*style
        };
    }

    /// Next label with the delimiter attached.
    pub fn next_label(&mut self) -> String {
        let mut label = self.labels.next_label();
        label.push_str(&self.delimiter);
        label
    }

    /// Body style for an item: the list's typography with no vertical
    /// spacing of its own. Indents are set per item once the label is known.
    pub fn item_style(&self) -> ParagraphStyle {
        Self::item_style_from(&self.style)
    }

    /// Item body style taking typography and indents from `style`.
    pub fn item_style_from(style: &ParagraphStyle) -> ParagraphStyle {
        ParagraphStyle {
            font: style.font,
            font_size: style.font_size,
            color: style.color,
            line_spacing: style.line_spacing,
            after_text_indent: style.after_text_indent,
            before_text_indent: style.before_text_indent,
            block_width: style.block_width,
            ..ParagraphStyle::new(style.geometry)
        }
    }
}
