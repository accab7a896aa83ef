//! # Font Management
//!
//! The engine draws with the standard PDF fonts (Helvetica, Times, Courier),
//! which need no embedding. Measurement comes from the AFM width tables in
//! [`metrics`].
//!
//! CSS-style family names are mapped onto those fonts through a
//! [`FontTable`]: an immutable value built once per renderer and passed by
//! reference, so independent renderers can use different tables.

pub mod metrics;

pub use metrics::StandardFontMetrics;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The standard PDF fonts the engine can draw with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

/// A typeface family, independent of weight and slant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    Helvetica,
    Times,
    Courier,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    pub fn from_parts(family: FontFamily, bold: bool, italic: bool) -> Self {
        match (family, bold, italic) {
            (FontFamily::Helvetica, false, false) => Self::Helvetica,
            (FontFamily::Helvetica, true, false) => Self::HelveticaBold,
            (FontFamily::Helvetica, false, true) => Self::HelveticaOblique,
            (FontFamily::Helvetica, true, true) => Self::HelveticaBoldOblique,
            (FontFamily::Times, false, false) => Self::TimesRoman,
            (FontFamily::Times, true, false) => Self::TimesBold,
            (FontFamily::Times, false, true) => Self::TimesItalic,
            (FontFamily::Times, true, true) => Self::TimesBoldItalic,
            (FontFamily::Courier, false, false) => Self::Courier,
            (FontFamily::Courier, true, false) => Self::CourierBold,
            (FontFamily::Courier, false, true) => Self::CourierOblique,
            (FontFamily::Courier, true, true) => Self::CourierBoldOblique,
        }
    }

    pub fn family(&self) -> FontFamily {
        match self {
            Self::Helvetica | Self::HelveticaBold | Self::HelveticaOblique | Self::HelveticaBoldOblique => {
                FontFamily::Helvetica
            }
            Self::TimesRoman | Self::TimesBold | Self::TimesItalic | Self::TimesBoldItalic => FontFamily::Times,
            Self::Courier | Self::CourierBold | Self::CourierOblique | Self::CourierBoldOblique => {
                FontFamily::Courier
            }
        }
    }

    pub fn is_bold(&self) -> bool {
        matches!(
            self,
            Self::HelveticaBold
                | Self::HelveticaBoldOblique
                | Self::TimesBold
                | Self::TimesBoldItalic
                | Self::CourierBold
                | Self::CourierBoldOblique
        )
    }

    pub fn is_italic(&self) -> bool {
        matches!(
            self,
            Self::HelveticaOblique
                | Self::HelveticaBoldOblique
                | Self::TimesItalic
                | Self::TimesBoldItalic
                | Self::CourierOblique
                | Self::CourierBoldOblique
        )
    }
}

impl Default for StandardFont {
    fn default() -> Self {
        Self::TimesRoman
    }
}

/// Maps family names (case-insensitive) to standard font families.
///
/// Lookups that miss fall back to the table's default family while keeping
/// the requested weight and slant.
#[derive(Debug, Clone)]
pub struct FontTable {
    families: HashMap<String, FontFamily>,
    fallback: FontFamily,
}

impl Default for FontTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl FontTable {
    /// An empty table: every lookup resolves to `fallback`.
    pub fn new(fallback: FontFamily) -> Self {
        Self {
            families: HashMap::new(),
            fallback,
        }
    }

    /// The common web family names and generic families.
    pub fn standard() -> Self {
        let aliases = [
            ("helvetica", FontFamily::Helvetica),
            ("arial", FontFamily::Helvetica),
            ("verdana", FontFamily::Helvetica),
            ("sans-serif", FontFamily::Helvetica),
            ("times", FontFamily::Times),
            ("times new roman", FontFamily::Times),
            ("times-roman", FontFamily::Times),
            ("georgia", FontFamily::Times),
            ("serif", FontFamily::Times),
            ("courier", FontFamily::Courier),
            ("courier new", FontFamily::Courier),
            ("monospace", FontFamily::Courier),
        ];
        aliases
            .into_iter()
            .fold(Self::new(FontFamily::Times), |table, (name, family)| {
                table.with_alias(name, family)
            })
    }

    pub fn with_alias(mut self, name: &str, family: FontFamily) -> Self {
        self.families.insert(name.trim().to_ascii_lowercase(), family);
        self
    }

    /// Resolve a single family name.
    pub fn family(&self, name: &str) -> Option<FontFamily> {
        let key = name.trim().trim_matches(|c| c == '"' || c == '\'').trim();
        self.families.get(&key.to_ascii_lowercase()).copied()
    }

    /// Resolve a CSS `font-family` list (first known entry wins).
    pub fn lookup(&self, family_list: &str, bold: bool, italic: bool) -> StandardFont {
        let family = family_list
            .split(',')
            .find_map(|name| self.family(name))
            .unwrap_or(self.fallback);
        StandardFont::from_parts(family, bold, italic)
    }

    /// Resolve CSS `font-family`, `font-weight` and `font-style` values.
    pub fn resolve_css(&self, family: Option<&str>, weight: Option<&str>, style: Option<&str>) -> StandardFont {
        let bold = weight.map(is_bold_weight).unwrap_or(false);
        let italic = style
            .map(|s| {
                let s = s.trim().to_ascii_lowercase();
                s == "italic" || s == "oblique"
            })
            .unwrap_or(false);
        match family {
            Some(f) => self.lookup(f, bold, italic),
            None => StandardFont::from_parts(self.fallback, bold, italic),
        }
    }
}

fn is_bold_weight(weight: &str) -> bool {
    let w = weight.trim().to_ascii_lowercase();
    match w.as_str() {
        "bold" | "bolder" => true,
        _ => w.parse::<u32>().map(|n| n >= 600).unwrap_or(false),
    }
}

/// Measures text in the standard fonts.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontContext;

impl FontContext {
    pub fn new() -> Self {
        Self
    }

    pub fn char_width(&self, ch: char, font: StandardFont, font_size: f64) -> f64 {
        StandardFontMetrics::for_font(font).char_width(ch, font_size)
    }

    pub fn measure_string(&self, text: &str, font: StandardFont, font_size: f64) -> f64 {
        StandardFontMetrics::for_font(font).measure_string(text, font_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_context_helvetica() {
        let ctx = FontContext::new();
        let w = ctx.char_width(' ', StandardFont::Helvetica, 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_font_context_bold_wider() {
        let ctx = FontContext::new();
        let regular = ctx.char_width('A', StandardFont::Helvetica, 12.0);
        let bold = ctx.char_width('A', StandardFont::HelveticaBold, 12.0);
        assert!(bold > regular, "Bold A should be wider than regular A");
    }

    #[test]
    fn test_table_lookup_is_case_insensitive() {
        let table = FontTable::standard();
        assert_eq!(table.lookup("Arial", false, false), StandardFont::Helvetica);
        assert_eq!(table.lookup("'Courier New', monospace", true, false), StandardFont::CourierBold);
        assert_eq!(table.lookup("TIMES NEW ROMAN", false, true), StandardFont::TimesItalic);
    }

    #[test]
    fn test_table_fallback_keeps_weight_and_slant() {
        let table = FontTable::standard();
        assert_eq!(table.lookup("Comic Sans", true, true), StandardFont::TimesBoldItalic);
        assert_eq!(table.lookup("Unknown, Helvetica", false, false), StandardFont::Helvetica);
    }

    #[test]
    fn test_resolve_css_weights() {
        let table = FontTable::standard();
        assert_eq!(table.resolve_css(Some("helvetica"), Some("700"), None), StandardFont::HelveticaBold);
        assert_eq!(table.resolve_css(Some("helvetica"), Some("400"), None), StandardFont::Helvetica);
        assert_eq!(table.resolve_css(None, Some("bold"), Some("oblique")), StandardFont::TimesBoldItalic);
    }

    #[test]
    fn test_independent_tables() {
        let custom = FontTable::new(FontFamily::Courier).with_alias("Body", FontFamily::Helvetica);
        assert_eq!(custom.lookup("body", false, false), StandardFont::Helvetica);
        assert_eq!(custom.lookup("arial", false, false), StandardFont::Courier);
        assert_eq!(FontTable::standard().lookup("body", false, false), StandardFont::TimesRoman);
    }

    #[test]
    fn test_from_parts_round_trip() {
        for font in [StandardFont::HelveticaBoldOblique, StandardFont::TimesItalic, StandardFont::Courier] {
            assert_eq!(StandardFont::from_parts(font.family(), font.is_bold(), font.is_italic()), font);
        }
    }
}
