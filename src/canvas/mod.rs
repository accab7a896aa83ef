//! # Canvas
//!
//! The drawing surface layout writes onto. Layout never touches PDF
//! operators directly: it measures strings, allocates pages and emits text
//! runs, rules and images through the [`Canvas`] trait.
//!
//! [`RecordingCanvas`] is the implementation the crate ships. It keeps a
//! display list per page which the PDF serializer (or a test) consumes
//! afterwards.

use serde::Serialize;

use crate::error::{LayoutError, Result};
use crate::font::{FontContext, StandardFont};
use crate::image_loader;
use crate::model::PageGeometry;
use crate::style::Color;

/// Identifies a page allocated by a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageHandle(pub usize);

/// Low-level page drawing and text measurement.
///
/// Every method either fully succeeds or returns an error that aborts the
/// render. Draw calls apply to the most recently allocated page; calling them
/// before [`Canvas::begin_page`] is an error.
pub trait Canvas {
    /// Rendered width of `text` in points.
    fn measure_width(&self, font: StandardFont, font_size: f64, text: &str) -> Result<f64>;

    /// Allocate a new page. Font and color state never carry over from the
    /// previous page; each draw call states its own.
    fn begin_page(&mut self, geometry: &PageGeometry) -> Result<PageHandle>;

    /// Draw `text` with its baseline starting at (x, y).
    fn draw_text(
        &mut self,
        x: f64,
        y: f64,
        font: StandardFont,
        font_size: f64,
        color: Color,
        text: &str,
    ) -> Result<()>;

    /// Stroke a straight line `width` points thick.
    fn draw_line(&mut self, width: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<()>;

    /// Place an image with its lower-left corner at (x, y).
    fn draw_image(&mut self, src: &str, x: f64, y: f64, width: f64, height: f64) -> Result<()>;

    /// Intrinsic size of an image, one point per pixel.
    fn image_size(&self, src: &str) -> Result<(f64, f64)>;
}

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    Text {
        x: f64,
        y: f64,
        font: StandardFont,
        font_size: f64,
        color: Color,
        text: String,
    },
    Line {
        width: f64,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Image {
        src: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// The display list of one page.
#[derive(Debug, Clone, Serialize)]
pub struct CanvasPage {
    pub geometry: PageGeometry,
    pub ops: Vec<DrawOp>,
}

impl CanvasPage {
    /// The text runs on this page, in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The rules on this page as (width, x1, y1, x2, y2).
    pub fn lines(&self) -> Vec<(f64, f64, f64, f64, f64)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Line { width, x1, y1, x2, y2 } => Some((*width, *x1, *y1, *x2, *y2)),
                _ => None,
            })
            .collect()
    }
}

/// A canvas that records every operation, measuring with the standard
/// font metrics.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    fonts: FontContext,
    pages: Vec<CanvasPage>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> &[CanvasPage] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<CanvasPage> {
        self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn current_page(&mut self) -> Result<&mut CanvasPage> {
        self.pages
            .last_mut()
            .ok_or_else(|| LayoutError::Canvas("draw call before any page was allocated".to_string()))
    }
}

impl Canvas for RecordingCanvas {
    fn measure_width(&self, font: StandardFont, font_size: f64, text: &str) -> Result<f64> {
        Ok(self.fonts.measure_string(text, font, font_size))
    }

    fn begin_page(&mut self, geometry: &PageGeometry) -> Result<PageHandle> {
        self.pages.push(CanvasPage {
            geometry: *geometry,
            ops: Vec::new(),
        });
        Ok(PageHandle(self.pages.len() - 1))
    }

    fn draw_text(
        &mut self,
        x: f64,
        y: f64,
        font: StandardFont,
        font_size: f64,
        color: Color,
        text: &str,
    ) -> Result<()> {
        self.current_page()?.ops.push(DrawOp::Text {
            x,
            y,
            font,
            font_size,
            color,
            text: text.to_string(),
        });
        Ok(())
    }

    fn draw_line(&mut self, width: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<()> {
        self.current_page()?.ops.push(DrawOp::Line { width, x1, y1, x2, y2 });
        Ok(())
    }

    fn draw_image(&mut self, src: &str, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        self.current_page()?.ops.push(DrawOp::Image {
            src: src.to_string(),
            x,
            y,
            width,
            height,
        });
        Ok(())
    }

    fn image_size(&self, src: &str) -> Result<(f64, f64)> {
        let (w, h) = image_loader::image_dimensions(src).map_err(|reason| LayoutError::Image {
            src: src.to_string(),
            reason,
        })?;
        Ok((w as f64, h as f64))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Every character has the same advance regardless of font or size.
    /// Optionally refuses to allocate more than `page_limit` pages.
    #[derive(Debug)]
    pub struct MonoCanvas {
        pub advance: f64,
        pub page_limit: Option<usize>,
        pub inner: RecordingCanvas,
    }

    impl MonoCanvas {
        pub fn new(advance: f64) -> Self {
            Self {
                advance,
                page_limit: None,
                inner: RecordingCanvas::new(),
            }
        }

        pub fn pages(&self) -> &[CanvasPage] {
            self.inner.pages()
        }
    }

    impl Canvas for MonoCanvas {
        fn measure_width(&self, _font: StandardFont, _font_size: f64, text: &str) -> Result<f64> {
            Ok(text.chars().count() as f64 * self.advance)
        }

        fn begin_page(&mut self, geometry: &PageGeometry) -> Result<PageHandle> {
            if self.page_limit.is_some_and(|limit| self.inner.page_count() >= limit) {
                return Err(LayoutError::Canvas("page limit reached".to_string()));
            }
            self.inner.begin_page(geometry)
        }

        fn draw_text(
            &mut self,
            x: f64,
            y: f64,
            font: StandardFont,
            font_size: f64,
            color: Color,
            text: &str,
        ) -> Result<()> {
            self.inner.draw_text(x, y, font, font_size, color, text)
        }

        fn draw_line(&mut self, width: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<()> {
            self.inner.draw_line(width, x1, y1, x2, y2)
        }

        fn draw_image(&mut self, src: &str, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
            self.inner.draw_image(src, x, y, width, height)
        }

        fn image_size(&self, _src: &str) -> Result<(f64, f64)> {
            Ok((40.0, 30.0))
        }
    }
}
