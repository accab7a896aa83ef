//! # Text Wrapping
//!
//! Greedy line breaking against a measured width.
//!
//! The wrapper grows a candidate line one character at a time, measuring it
//! through the [`Canvas`], until it reaches the available width minus a
//! small tolerance (a quarter of the font size). It then backs up to the
//! last space so words stay whole. A line feed in the source is a hard
//! break and wins whenever it comes before the measured break point.
//!
//! Offsets are byte offsets into the source string and always fall on char
//! boundaries.

use crate::canvas::Canvas;
use crate::error::Result;
use crate::font::StandardFont;
use crate::style::ParagraphStyle;

/// Measures and wraps text in one font at one size.
pub struct LineWrapper<'a, C: Canvas + ?Sized> {
    canvas: &'a C,
    font: StandardFont,
    font_size: f64,
}

impl<'a, C: Canvas + ?Sized> LineWrapper<'a, C> {
    pub fn new(canvas: &'a C, font: StandardFont, font_size: f64) -> Self {
        Self {
            canvas,
            font,
            font_size,
        }
    }

    pub fn for_style(canvas: &'a C, style: &ParagraphStyle) -> Self {
        Self::new(canvas, style.font, style.font_size)
    }

    pub fn measure(&self, text: &str) -> Result<f64> {
        self.canvas.measure_width(self.font, self.font_size, text)
    }

    /// End offset of the line starting at `start`.
    ///
    /// `x_offset` is width already used on the current line. With no width
    /// used, at least one character is always taken so callers make
    /// progress; with some width used, `start` itself may come back, meaning
    /// "nothing fits here, continue on a fresh line".
    pub fn wrap_position(&self, text: &str, start: usize, available_width: f64, x_offset: f64) -> Result<usize> {
        let segment_end = text[start..].find('\n').map_or(text.len(), |i| start + i);
        if start >= segment_end {
            return Ok(segment_end);
        }

        let limit = available_width - x_offset - self.font_size / 4.0;
        let segment = &text[start..segment_end];
        let mut boundaries = segment
            .char_indices()
            .map(|(i, ch)| start + i + ch.len_utf8());

        let mut pos = start;
        let mut width = 0.0;
        while width < limit && pos < segment_end {
            match boundaries.next() {
                Some(next) => pos = next,
                None => break,
            }
            width = self.measure(&text[start..pos])?;
        }

        if pos == start {
            if x_offset > 0.0 {
                return Ok(start);
            }
            pos = boundaries.next().unwrap_or(segment_end);
        }

        if width >= limit {
            if let Some(space) = text[start..pos].rfind(' ').map(|i| start + i) {
                if space > start {
                    pos = space;
                }
            }
        }

        Ok(pos)
    }

    /// Wrap `text` into lines no wider than `width` (single-token overflow
    /// aside). Empty input yields no lines.
    pub fn wrap_lines(&self, text: &str, width: f64) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        let mut start = 0;
        while start < text.len() {
            let end = self.wrap_position(text, start, width, 0.0)?;
            lines.push(text[start..end].to_string());
            start = next_line_start(text, end);
        }
        Ok(lines)
    }
}

/// Where the next line begins after a line ending at `end`: past a hard
/// line feed, or past the spaces a soft break stopped on.
pub fn next_line_start(text: &str, end: usize) -> usize {
    let rest = &text[end..];
    if rest.starts_with('\n') {
        end + 1
    } else {
        end + (rest.len() - rest.trim_start_matches(' ').len())
    }
}
