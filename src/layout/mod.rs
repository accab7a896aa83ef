//! # Flow Layout
//!
//! The write cursor and everything that advances it: paragraphs, lists and
//! images. Tables live in [`table`] and drive the same cursor.
//!
//! ## How the cursor moves
//!
//! There is exactly one vertical write position per document. It starts at
//! the top of the content area and every operation moves it down (PDF Y
//! decreases toward the bottom of the page). Before each line after the
//! first, the writer asks whether the cursor has reached the lower content
//! bound; if it has, a new page is allocated and the cursor jumps back to
//! the top. Font and color are passed with every draw call, so nothing
//! needs restoring on the new page.
//!
//! An explicit [`DocumentWriter::page_break`] parks the cursor: it sits on
//! the new page's top bound and the next block to start there skips its
//! above-spacing. Any movement or drawing clears the parked state.
//!
//! Pages are created lazily: the first draw allocates page one.

pub mod table;

use crate::canvas::{Canvas, PageHandle};
use crate::error::Result;
use crate::model::PageGeometry;
use crate::style::{ListStyle, ParagraphStyle};
use crate::text::{next_line_start, LineWrapper};

pub use table::{Column, Row, Table, TableHeader, TableLayout};

/// The vertical write position and the page it is on.
#[derive(Debug, Clone)]
pub struct PageCursor {
    y: f64,
    page: Option<PageHandle>,
    pages_started: usize,
    parked: bool,
}

impl PageCursor {
    fn new(geometry: &PageGeometry) -> Self {
        Self {
            y: geometry.upper_y(),
            page: None,
            pages_started: 0,
            parked: false,
        }
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn page(&self) -> Option<PageHandle> {
        self.page
    }

    pub fn pages_started(&self) -> usize {
        self.pages_started
    }

    /// Whether the cursor sits at the top of a page opened by an explicit
    /// break, with no block started there yet.
    pub fn is_parked(&self) -> bool {
        self.parked
    }
}

/// Owns the canvas and the cursor for one document render.
#[derive(Debug)]
pub struct DocumentWriter<C: Canvas> {
    geometry: PageGeometry,
    canvas: C,
    cursor: PageCursor,
}

impl<C: Canvas> DocumentWriter<C> {
    pub fn new(geometry: PageGeometry, canvas: C) -> Self {
        Self {
            cursor: PageCursor::new(&geometry),
            geometry,
            canvas,
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    pub fn into_canvas(self) -> C {
        self.canvas
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn y(&self) -> f64 {
        self.cursor.y
    }

    pub fn set_y(&mut self, y: f64) {
        self.cursor.y = y;
        self.cursor.parked = false;
    }

    /// A default paragraph style on this document's page geometry.
    pub fn paragraph_style(&self) -> ParagraphStyle {
        ParagraphStyle::new(self.geometry)
    }

    /// Whether the cursor has reached the lower content bound.
    pub fn is_at_end_of_page(&self) -> bool {
        self.cursor.y <= self.geometry.lower_y()
    }

    /// Start a new page and park the cursor so the next block begins at
    /// the top bound without its above-spacing.
    pub fn page_break(&mut self) -> Result<PageHandle> {
        let handle = self.new_page()?;
        self.cursor.parked = true;
        Ok(handle)
    }

    /// Move the cursor to the first baseline of a block in `style` and
    /// return it. A parked cursor stays on the top bound.
    pub fn start_block(&mut self, style: &ParagraphStyle) -> f64 {
        if !std::mem::take(&mut self.cursor.parked) {
            self.cursor.y = style.upper_y(self.cursor.y);
        }
        self.cursor.y
    }

    /// Whether content `height` points tall would cross the lower bound.
    pub fn causes_page_overflow(&self, height: f64) -> bool {
        self.cursor.y - height < self.geometry.lower_y()
    }

    pub fn advance_line(&mut self, style: &ParagraphStyle) {
        self.set_y(style.next_y(self.cursor.y));
    }

    /// Allocate a page and move the cursor to its top bound.
    pub fn new_page(&mut self) -> Result<PageHandle> {
        let handle = self.canvas.begin_page(&self.geometry)?;
        self.cursor.page = Some(handle);
        self.cursor.pages_started += 1;
        self.set_y(self.geometry.upper_y());
        log::debug!("started page {}", self.cursor.pages_started);
        Ok(handle)
    }

    /// The current page, allocating the first one if needed. The cursor is
    /// left where it is.
    pub fn ensure_page(&mut self) -> Result<PageHandle> {
        match self.cursor.page {
            Some(handle) => Ok(handle),
            None => {
                let handle = self.canvas.begin_page(&self.geometry)?;
                self.cursor.page = Some(handle);
                self.cursor.pages_started += 1;
                log::debug!("started page {}", self.cursor.pages_started);
                Ok(handle)
            }
        }
    }

    pub fn measure(&self, style: &ParagraphStyle, text: &str) -> Result<f64> {
        self.canvas.measure_width(style.font, style.font_size, text)
    }

    pub fn wrap_lines(&self, style: &ParagraphStyle, text: &str, width: f64) -> Result<Vec<String>> {
        LineWrapper::for_style(&self.canvas, style).wrap_lines(text, width)
    }

    pub fn draw_text(&mut self, style: &ParagraphStyle, x: f64, y: f64, text: &str) -> Result<()> {
        self.ensure_page()?;
        self.cursor.parked = false;
        self.canvas
            .draw_text(x, y, style.font, style.font_size, style.color, text)
    }

    pub fn draw_line(&mut self, width: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<()> {
        self.ensure_page()?;
        self.cursor.parked = false;
        self.canvas.draw_line(width, x1, y1, x2, y2)
    }

    /// Write `text` in the default paragraph style.
    pub fn write_text(&mut self, text: &str) -> Result<()> {
        let style = self.paragraph_style();
        self.write_paragraph(&style, text)
    }

    /// Wrap and emit a paragraph, breaking pages as needed.
    ///
    /// The cursor ends `line_spacing + below_spacing` under the last line's
    /// successor baseline.
    pub fn write_paragraph(&mut self, style: &ParagraphStyle, text: &str) -> Result<()> {
        if self.is_at_end_of_page() {
            self.new_page()?;
        }
        self.ensure_page()?;

        self.start_block(style);
        let mut start = 0;
        let mut first_line = true;
        loop {
            let end = LineWrapper::for_style(&self.canvas, style).wrap_position(
                text,
                start,
                style.line_width(first_line),
                0.0,
            )?;
            let line = &text[start..end];
            if !line.is_empty() {
                log::trace!("line at y={:.2}: {:?}", self.cursor.y, line);
                self.canvas.draw_text(
                    style.left_x(first_line),
                    self.cursor.y,
                    style.font,
                    style.font_size,
                    style.color,
                    line,
                )?;
            }
            self.advance_line(style);

            start = next_line_start(text, end);
            if start >= text.len() {
                break;
            }
            first_line = false;
            if self.is_at_end_of_page() {
                self.new_page()?;
            }
        }

        self.cursor.y -= style.line_spacing + style.below_spacing;
        Ok(())
    }

    /// Write every item of a list. The list's above/below spacing is applied
    /// once around the whole list.
    pub fn write_list<S: AsRef<str>>(&mut self, list: &mut ListStyle, items: &[S]) -> Result<()> {
        self.start_block(&list.style);
        let item_style = list.item_style();
        for item in items {
            self.write_list_item(list, &item_style, item.as_ref())?;
        }
        self.cursor.y -= list.style.below_spacing;
        Ok(())
    }

    /// Write one item: the next label hangs to the left of the body.
    pub fn write_list_item(&mut self, list: &mut ListStyle, item_style: &ParagraphStyle, body: &str) -> Result<()> {
        let label = list.next_label();
        let indent = self.measure(item_style, &label)?;
        let style = ParagraphStyle {
            before_text_indent: item_style.before_text_indent + indent,
            first_line_indent: -indent,
            ..*item_style
        };
        self.write_paragraph(&style, &format!("{}{}", label, body))
    }

    /// Draw an image at the style's left edge. Missing dimensions come from
    /// the image's intrinsic size.
    pub fn draw_image(
        &mut self,
        style: &ParagraphStyle,
        src: &str,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<()> {
        let width = width.filter(|w| *w > 0.0);
        let height = height.filter(|h| *h > 0.0);
        let (width, height) = match (width, height) {
            (Some(w), Some(h)) => (w, h),
            _ => {
                let (iw, ih) = self.canvas.image_size(src)?;
                (width.unwrap_or(iw), height.unwrap_or(ih))
            }
        };
        if width <= 0.0 || height <= 0.0 {
            log::warn!("image '{}' has no area ({}x{})", src, width, height);
        }

        self.ensure_page()?;
        let lower = self.geometry.lower_y();
        let mut y = self.cursor.y - height;
        if y <= lower {
            self.new_page()?;
            y = (self.cursor.y - height).max(lower);
        }
        self.canvas.draw_image(src, style.left_x(false), y, width, height)?;
        self.set_y(style.next_y(y));
        Ok(())
    }

    /// Lay out a whole table: size, header, rows, borders.
    pub fn write_table(&mut self, table: Table, rows: &[Row]) -> Result<Table> {
        let mut layout = TableLayout::new(table);
        layout.begin(self)?;
        if layout.table().header.is_blank() {
            layout.skip_header(self)?;
        } else {
            layout.write_header(self)?;
        }
        for row in rows {
            layout.write_row(self, row)?;
        }
        layout.finish(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::testing::MonoCanvas;
    use crate::canvas::DrawOp;
    use crate::error::LayoutError;
    use crate::model::{Edges, PageSize};

    fn writer() -> DocumentWriter<MonoCanvas> {
        DocumentWriter::new(PageGeometry::default(), MonoCanvas::new(6.0))
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_first_write_allocates_page() {
        let mut w = writer();
        assert!(w.cursor().page().is_none());
        w.write_text("hello").unwrap();
        assert_eq!(w.canvas().pages().len(), 1);
        assert_eq!(w.canvas().pages()[0].texts(), vec!["hello"]);
    }

    #[test]
    fn test_paragraph_cursor_arithmetic() {
        let mut w = writer();
        w.ensure_page().unwrap();
        w.set_y(600.0);
        let mut style = w.paragraph_style();
        style.above_spacing = 5.0;
        style.below_spacing = 7.0;
        style.line_spacing = 1.5;
        // 468pt at 6pt per char: fifteen words fit per line.
        let text = vec!["word"; 36].join(" ");
        w.write_paragraph(&style, &text).unwrap();
        let lines = w.canvas().pages()[0].texts().len();
        assert_eq!(lines, 3);
        let expected = 600.0 - 5.0 - 3.0 * 18.0 - (1.5 + 7.0);
        assert!(close(w.y(), expected), "cursor {} != {}", w.y(), expected);
    }

    #[test]
    fn test_first_line_indent_only_on_first_line() {
        let mut w = writer();
        let mut style = w.paragraph_style();
        style.first_line_indent = 20.0;
        let text = vec!["word"; 30].join(" ");
        w.write_paragraph(&style, &text).unwrap();
        let xs: Vec<f64> = w.canvas().pages()[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { x, .. } => Some(*x),
                _ => None,
            })
            .collect();
        assert_eq!(xs[0], 92.0);
        assert!(xs[1..].iter().all(|x| *x == 72.0));
    }

    #[test]
    fn test_page_break_exactly_at_lower_bound() {
        let mut w = writer();
        w.ensure_page().unwrap();
        let style = w.paragraph_style();
        // Second baseline lands exactly on the lower bound (72).
        w.set_y(84.0);
        w.write_paragraph(&style, "one\ntwo").unwrap();
        assert_eq!(w.canvas().pages().len(), 2);
        assert_eq!(w.canvas().pages()[0].texts(), vec!["one"]);
        assert_eq!(w.canvas().pages()[1].texts(), vec!["two"]);
    }

    #[test]
    fn test_no_page_break_when_room_remains() {
        let mut w = writer();
        w.ensure_page().unwrap();
        let style = w.paragraph_style();
        w.set_y(97.0);
        w.write_paragraph(&style, "one\ntwo").unwrap();
        assert_eq!(w.canvas().pages().len(), 1);
    }

    #[test]
    fn test_page_break_parks_cursor_at_top() {
        let mut w = writer();
        w.write_text("before").unwrap();
        let mut style = w.paragraph_style();
        style.above_spacing = 30.0;
        w.page_break().unwrap();
        assert!(w.cursor().is_parked());
        assert!(!w.is_at_end_of_page());
        w.write_paragraph(&style, "top").unwrap();
        assert!(!w.cursor().is_parked());
        match &w.canvas().pages()[1].ops[0] {
            DrawOp::Text { y, .. } => assert_eq!(*y, 720.0),
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn test_zero_bottom_margin_still_breaks_pages() {
        let margin = Edges {
            top: 72.0,
            right: 72.0,
            bottom: 0.0,
            left: 72.0,
        };
        let mut w = DocumentWriter::new(PageGeometry::new(PageSize::Letter, margin), MonoCanvas::new(6.0));
        let style = w.paragraph_style();
        let text = vec!["line"; 100].join("\n");
        w.write_paragraph(&style, &text).unwrap();
        let pages = w.canvas().pages();
        assert_eq!(pages.len(), 2);
        // 720 down to 12 in 12pt steps; the baseline at 0 breaks.
        assert_eq!(pages[0].texts().len(), 60);
        assert_eq!(pages[1].texts().len(), 40);
        let lowest = pages
            .iter()
            .flat_map(|page| page.ops.iter())
            .filter_map(|op| match op {
                DrawOp::Text { y, .. } => Some(*y),
                _ => None,
            })
            .fold(f64::INFINITY, f64::min);
        assert!(lowest >= 0.0, "text drawn below the page at {}", lowest);
    }

    #[test]
    fn test_cursor_below_page_starts_new_page() {
        let mut w = writer();
        w.ensure_page().unwrap();
        w.set_y(80.0);
        let mut spaced = w.paragraph_style();
        spaced.below_spacing = 80.0;
        w.write_paragraph(&spaced, "first").unwrap();
        assert!(close(w.y(), 80.0 - 12.0 - 1.0 - 80.0));
        assert!(!w.cursor().is_parked());

        let plain = w.paragraph_style();
        w.write_paragraph(&plain, "second").unwrap();
        let pages = w.canvas().pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].texts(), vec!["first"]);
        assert_eq!(pages[1].texts(), vec!["second"]);
    }

    #[test]
    fn test_canvas_failure_aborts() {
        let mut w = DocumentWriter::new(
            PageGeometry::default(),
            MonoCanvas {
                page_limit: Some(1),
                ..MonoCanvas::new(6.0)
            },
        );
        let style = w.paragraph_style();
        let text = vec!["line"; 80].join("\n");
        let err = w.write_paragraph(&style, &text).unwrap_err();
        assert!(matches!(err, LayoutError::Canvas(_)));
    }

    #[test]
    fn test_list_labels_hang() {
        let mut w = writer();
        let mut list = ListStyle::numbered(*w.geometry());
        w.write_list(&mut list, &["alpha", "beta", "gamma"]).unwrap();
        let page = &w.canvas().pages()[0];
        assert_eq!(page.texts(), vec!["1. alpha", "2. beta", "3. gamma"]);
        // "1. " is 18pt wide: body indent 18, first line pulled back to 0.
        match &page.ops[0] {
            DrawOp::Text { x, .. } => assert_eq!(*x, 72.0),
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn test_list_spacing_applied_once() {
        let mut w = writer();
        w.ensure_page().unwrap();
        w.set_y(500.0);
        let mut list = ListStyle::bulleted(*w.geometry());
        list.style.above_spacing = 10.0;
        list.style.below_spacing = 4.0;
        w.write_list(&mut list, &["a", "b"]).unwrap();
        // Each item: one 12pt line plus the 1.0 trailing line spacing.
        assert!(close(w.y(), 500.0 - 10.0 - 2.0 * 13.0 - 4.0));
        assert!(w.canvas().pages()[0].texts().iter().all(|t| t.starts_with("\u{2022} ")));
    }

    #[test]
    fn test_image_breaks_page_and_clamps() {
        let mut w = writer();
        w.ensure_page().unwrap();
        w.set_y(90.0);
        let style = w.paragraph_style();
        w.draw_image(&style, "pic.png", None, None).unwrap();
        let pages = w.canvas().pages();
        assert_eq!(pages.len(), 2);
        match &pages[1].ops[0] {
            DrawOp::Image { y, width, height, .. } => {
                assert_eq!(*y, 690.0);
                assert_eq!((*width, *height), (40.0, 30.0));
            }
            other => panic!("unexpected op {:?}", other),
        }
        assert_eq!(w.y(), 678.0);
    }

    #[test]
    fn test_image_explicit_size() {
        let mut w = writer();
        let style = w.paragraph_style();
        w.draw_image(&style, "pic.png", Some(100.0), Some(50.0)).unwrap();
        match &w.canvas().pages()[0].ops[0] {
            DrawOp::Image { y, width, .. } => {
                assert_eq!(*y, 670.0);
                assert_eq!(*width, 100.0);
            }
            other => panic!("unexpected op {:?}", other),
        }
    }
}
