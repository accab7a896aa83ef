//! Advance widths for the standard PDF fonts.
//!
//! Values are the AFM widths in 1/1000 em for the printable ASCII range
//! (U+0020..=U+007E), plus the handful of typographic characters that show
//! up in list labels and body copy. Anything else measures as a lowercase `o`.

use super::StandardFont;

const FIRST: u32 = 0x20;
const LAST: u32 = 0x7E;

/// Width table for one standard font.
#[derive(Debug)]
pub struct StandardFontMetrics {
    ascii: [u16; 95],
    bullet: u16,
    en_dash: u16,
    quote_single: u16,
    quote_double: u16,
}

impl StandardFontMetrics {
    pub fn for_font(font: StandardFont) -> &'static StandardFontMetrics {
        use StandardFont::*;
        match font {
            Helvetica | HelveticaOblique => &HELVETICA,
            HelveticaBold | HelveticaBoldOblique => &HELVETICA_BOLD,
            TimesRoman => &TIMES_ROMAN,
            TimesBold => &TIMES_BOLD,
            TimesItalic => &TIMES_ITALIC,
            TimesBoldItalic => &TIMES_BOLD_ITALIC,
            Courier | CourierBold | CourierOblique | CourierBoldOblique => &COURIER,
        }
    }

    /// Advance width in 1/1000 em.
    pub fn glyph_width(&self, ch: char) -> u16 {
        let cp = ch as u32;
        if (FIRST..=LAST).contains(&cp) {
            return self.ascii[(cp - FIRST) as usize];
        }
        match ch {
            '\u{00A0}' => self.ascii[0],
            '\u{2022}' => self.bullet,
            '\u{2013}' => self.en_dash,
            '\u{2014}' | '\u{2026}' => 1000,
            '\u{2018}' | '\u{2019}' => self.quote_single,
            '\u{201C}' | '\u{201D}' => self.quote_double,
            _ => self.ascii[('o' as u32 - FIRST) as usize],
        }
    }

    /// Width of a character in points at the given size.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.glyph_width(ch) as f64 / 1000.0 * font_size
    }

    /// Width of a string in points at the given size.
    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        let units: u32 = text.chars().map(|ch| self.glyph_width(ch) as u32).sum();
        units as f64 / 1000.0 * font_size
    }
}

static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    ascii: [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // sp - /
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0 - 9
        278, 278, 584, 584, 584, 556, 1015, // : - @
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A - M
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N - Z
        278, 278, 278, 469, 556, 333, // [ - `
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a - m
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n - z
        334, 260, 334, 584, // { - ~
    ],
    bullet: 350,
    en_dash: 556,
    quote_single: 222,
    quote_double: 333,
};

static HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    ascii: [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        333, 333, 584, 584, 584, 611, 975,
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        333, 278, 333, 584, 556, 333,
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        389, 280, 389, 584,
    ],
    bullet: 350,
    en_dash: 556,
    quote_single: 278,
    quote_double: 500,
};

static TIMES_ROMAN: StandardFontMetrics = StandardFontMetrics {
    ascii: [
        250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        278, 278, 564, 564, 564, 444, 921,
        722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
        722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
        333, 278, 333, 469, 500, 333,
        444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
        500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
        480, 200, 480, 541,
    ],
    bullet: 350,
    en_dash: 500,
    quote_single: 333,
    quote_double: 444,
};

static TIMES_BOLD: StandardFontMetrics = StandardFontMetrics {
    ascii: [
        250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        333, 333, 570, 570, 570, 500, 930,
        722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944,
        722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667,
        333, 278, 333, 581, 500, 333,
        500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833,
        556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444,
        394, 220, 394, 520,
    ],
    bullet: 350,
    en_dash: 500,
    quote_single: 333,
    quote_double: 500,
};

static TIMES_ITALIC: StandardFontMetrics = StandardFontMetrics {
    ascii: [
        250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        333, 333, 675, 675, 675, 500, 920,
        611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833,
        667, 722, 611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556,
        389, 278, 389, 422, 500, 333,
        500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722,
        500, 500, 500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389,
        400, 275, 400, 541,
    ],
    bullet: 350,
    en_dash: 500,
    quote_single: 333,
    quote_double: 556,
};

static TIMES_BOLD_ITALIC: StandardFontMetrics = StandardFontMetrics {
    ascii: [
        250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333, 250, 278,
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        333, 333, 570, 570, 570, 500, 832,
        667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889,
        722, 722, 611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611,
        333, 278, 333, 570, 500, 333,
        500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778,
        556, 500, 500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389,
        348, 220, 348, 570,
    ],
    bullet: 350,
    en_dash: 500,
    quote_single: 333,
    quote_double: 500,
};

static COURIER: StandardFontMetrics = StandardFontMetrics {
    ascii: [600; 95],
    bullet: 600,
    en_dash: 600,
    quote_single: 600,
    quote_double: 600,
};
