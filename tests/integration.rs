//! Integration tests for the quire layout pipeline.
//!
//! These drive the public API end to end:
//! - wrapping and paragraph cursor arithmetic
//! - page breaks at the lower bound
//! - table pagination and border suppression
//! - list labels
//! - the HTML cascade, its eviction, and stylesheet/image loading
//! - JSON documents through to PDF bytes

use quire::canvas::{Canvas, CanvasPage, DrawOp, PageHandle, RecordingCanvas};
use quire::error::Result;
use quire::font::{FontTable, StandardFont};
use quire::html::cascade::StyleCascade;
use quire::html::dom::{DomTree, Walk};
use quire::html::{write_html, HtmlOptions};
use quire::layout::{DocumentWriter, Row, Table, TableHeader, TableLayout};
use quire::model::{Document, PageGeometry};
use quire::style::{Borders, Color, ListStyle, ParagraphStyle};
use quire::text::{next_line_start, LineWrapper};
use quire::{render_document, render_html, render_json, LayoutError, RenderConfig};

// ─── Helpers ────────────────────────────────────────────────────

/// Every character advances by the same width; optionally refuses pages
/// past a limit.
#[derive(Debug)]
struct MonoCanvas {
    advance: f64,
    page_limit: Option<usize>,
    inner: RecordingCanvas,
}

impl MonoCanvas {
    fn new(advance: f64) -> Self {
        Self {
            advance,
            page_limit: None,
            inner: RecordingCanvas::new(),
        }
    }

    fn pages(&self) -> &[CanvasPage] {
        self.inner.pages()
    }
}

impl Canvas for MonoCanvas {
    fn measure_width(&self, _font: StandardFont, _font_size: f64, text: &str) -> Result<f64> {
        Ok(text.chars().count() as f64 * self.advance)
    }

    fn begin_page(&mut self, geometry: &PageGeometry) -> Result<PageHandle> {
        if self.page_limit.is_some_and(|limit| self.inner.page_count() >= limit) {
            return Err(LayoutError::Canvas("out of pages".to_string()));
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

fn mono_writer() -> DocumentWriter<MonoCanvas> {
    DocumentWriter::new(PageGeometry::default(), MonoCanvas::new(6.0))
}

fn row(value: &str) -> Row {
    [("v".to_string(), value.to_string())].into_iter().collect()
}

fn text_colors(page: &CanvasPage) -> Vec<Color> {
    page.ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Text { color, .. } => Some(*color),
            _ => None,
        })
        .collect()
}

fn html_options(stylesheets: &[&str]) -> HtmlOptions {
    HtmlOptions {
        stylesheets: stylesheets.iter().map(|s| s.to_string()).collect(),
        ..HtmlOptions::default()
    }
}

fn render_mono(html: &str, options: &HtmlOptions) -> Result<DocumentWriter<MonoCanvas>> {
    let mut w = mono_writer();
    write_html(&mut w, html, options)?;
    Ok(w)
}

// ─── Text wrapping ──────────────────────────────────────────────

#[test]
fn test_wrap_idempotence() {
    let canvas = MonoCanvas::new(7.0);
    let wrapper = LineWrapper::new(&canvas, StandardFont::TimesRoman, 12.0);
    let text = "pack my box with five dozen liquor jugs and then some more";
    for width in [60.0, 100.0, 180.0] {
        for line in wrapper.wrap_lines(text, width).unwrap() {
            assert_eq!(wrapper.wrap_position(&line, 0, width, 0.0).unwrap(), line.len());
        }
    }
}

#[test]
fn test_wrap_word_safety() {
    let canvas = MonoCanvas::new(7.0);
    let wrapper = LineWrapper::new(&canvas, StandardFont::TimesRoman, 12.0);
    let text = "sphinx of black quartz judge my vow";
    let mut start = 0;
    while start < text.len() {
        let end = wrapper.wrap_position(text, start, 80.0, 0.0).unwrap();
        assert!(end == text.len() || text.as_bytes()[end] == b' ');
        start = next_line_start(text, end);
    }
}

// ─── Pagination ─────────────────────────────────────────────────

#[test]
fn test_paragraph_cursor_arithmetic() {
    let mut w = mono_writer();
    w.ensure_page().unwrap();
    w.set_y(600.0);
    let style = ParagraphStyle {
        above_spacing: 5.0,
        below_spacing: 8.0,
        ..w.paragraph_style()
    };
    w.write_paragraph(&style, "one\ntwo\nthree").unwrap();
    let expected = 600.0 - 5.0 - 3.0 * style.line_height() - (style.line_spacing + 8.0);
    assert!((w.y() - expected).abs() < 1e-9);
}

#[test]
fn test_page_overflow_boundary() {
    // The second line would sit exactly on the lower bound.
    let mut w = mono_writer();
    w.ensure_page().unwrap();
    w.set_y(84.0);
    w.write_text("one\ntwo").unwrap();
    assert_eq!(w.cursor().pages_started(), 2);
    assert_eq!(w.canvas().pages()[1].texts(), vec!["two"]);

    let mut w = mono_writer();
    w.ensure_page().unwrap();
    w.set_y(97.0);
    w.write_text("one\ntwo").unwrap();
    assert_eq!(w.cursor().pages_started(), 1);
}

#[test]
fn test_canvas_failure_aborts_render() {
    let mut canvas = MonoCanvas::new(6.0);
    canvas.page_limit = Some(1);
    let mut w = DocumentWriter::new(PageGeometry::default(), canvas);
    let long = vec!["line"; 80].join("\n");
    let err = w.write_text(&long).unwrap_err();
    assert!(matches!(err, LayoutError::Canvas(_)));
}

// ─── Tables ─────────────────────────────────────────────────────

#[test]
fn test_table_pagination_example() {
    let mut w = mono_writer();
    w.ensure_page().unwrap();
    let style = ParagraphStyle {
        font_size: 14.0,
        border: Borders::uniform(1.0),
        ..w.paragraph_style()
    };
    let mut table = Table::new(style, TableHeader::from_names(&["v"]));
    table.row_border = 1.0;
    let mut layout = TableLayout::new(table);
    layout.begin(&mut w).unwrap();
    layout.skip_header(&mut w).unwrap();
    w.set_y(w.geometry().lower_y() + 20.0);
    for i in 1..=5 {
        layout.write_row(&mut w, &row(&format!("row {}", i))).unwrap();
    }
    layout.finish(&mut w).unwrap();

    let pages = w.canvas().pages();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].texts(), vec!["row 1"]);
    assert_eq!(pages[1].texts(), vec!["row 2", "row 3", "row 4", "row 5"]);
    // Nothing horizontal below row 1's own separator on page one.
    let lowest = pages[0]
        .lines()
        .iter()
        .filter(|l| l.2 == l.4)
        .map(|l| l.2)
        .fold(f64::INFINITY, f64::min);
    assert_eq!(lowest, 92.0);
}

#[test]
fn test_table_header_is_written_first() {
    let mut w = mono_writer();
    let table = Table::new(w.paragraph_style(), TableHeader::from_names(&["name", "qty"]));
    let rows: Vec<Row> = vec![
        [("name".to_string(), "bolt".to_string()), ("qty".to_string(), "4".to_string())]
            .into_iter()
            .collect(),
    ];
    let table = w.write_table(table, &rows).unwrap();
    assert_eq!(w.canvas().pages()[0].texts(), vec!["name", "qty", "bolt", "4"]);
    assert!((table.content_width() - 468.0).abs() < 1e-9);
}

// ─── Lists ──────────────────────────────────────────────────────

#[test]
fn test_list_labeling() {
    let mut w = mono_writer();
    let mut numbered = ListStyle::numbered(PageGeometry::default());
    w.write_list(&mut numbered, &["a", "b", "c"]).unwrap();
    let mut bulleted = ListStyle::bulleted(PageGeometry::default());
    w.write_list(&mut bulleted, &["d", "e", "f"]).unwrap();

    let texts = w.canvas().pages()[0].texts();
    assert_eq!(&texts[..3], &["1. a", "2. b", "3. c"]);
    assert!(texts[3..].iter().all(|t| t.starts_with("\u{2022} ")));
}

// ─── HTML ───────────────────────────────────────────────────────

#[test]
fn test_cascade_precedence() {
    let sheet = "p { color: red } .note { color: blue }";
    let red = Color::rgb8(255, 0, 0);
    let blue = Color::rgb8(0, 0, 255);
    let green = Color::rgb8(0, 128, 0);

    let cases = [
        (r#"<p class="note" style="color: green">x</p>"#, green),
        (r#"<p class="note">x</p>"#, blue),
        ("<p>x</p>", red),
    ];
    for (html, expected) in cases {
        let w = render_mono(html, &html_options(&[sheet])).unwrap();
        assert_eq!(text_colors(&w.canvas().pages()[0]), vec![expected], "{}", html);
    }
}

#[test]
fn test_later_stylesheets_override_key_by_key() {
    let options = html_options(&["p { color: red; font-size: 20pt }", "p { color: blue }"]);
    let w = render_mono("<p>x</p>", &options).unwrap();
    match &w.canvas().pages()[0].ops[0] {
        DrawOp::Text { color, font_size, .. } => {
            assert_eq!(*color, Color::rgb8(0, 0, 255));
            assert_eq!(*font_size, 20.0);
        }
        other => panic!("unexpected op {:?}", other),
    }
}

#[test]
fn test_cache_eviction() {
    let fonts = FontTable::standard();
    let tree = DomTree::parse("<div><p>x</p><p>y</p></div>");
    let mut cascade = StyleCascade::new(tree.len(), PageGeometry::default(), 96.0, &fonts).unwrap();
    let div = tree.find_first("div").unwrap();
    let first_p = tree.find_first("p").unwrap();

    for step in tree.traverse() {
        match step {
            Walk::Enter(id) if tree.tag_name(id).is_some() => {
                cascade.resolve(&tree, id).unwrap();
            }
            Walk::Exit(id) if tree.tag_name(id).is_some() => {
                cascade.evict(id);
                if id == first_p {
                    assert!(cascade.entry(first_p).is_none());
                    assert!(cascade.entry(div).is_some());
                }
            }
            _ => {}
        }
    }
    assert!(cascade.entry(div).is_none());
    assert_eq!(cascade.live_entries(), 0);
}

#[test]
fn test_nested_structures_rejected() {
    let options = HtmlOptions::default();
    let err = render_mono("<ul><li><table><tr><td>x</td></tr></table></li></ul>", &options).unwrap_err();
    assert!(matches!(err, LayoutError::NestedStructure { .. }));
    let err = render_mono("<table><tr><td><ol><li>x</li></ol></td></tr></table>", &options).unwrap_err();
    assert!(matches!(err, LayoutError::NestedStructure { .. }));
}

#[test]
fn test_unsupported_unit_is_fatal() {
    let err = render_mono(r#"<p style="font-size: 3furlongs">x</p>"#, &HtmlOptions::default()).unwrap_err();
    match err {
        LayoutError::UnsupportedUnit { unit, .. } => assert_eq!(unit, "furlongs"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_unknown_color_falls_back_to_black() {
    let w = render_mono(r#"<p style="color: sparkly">x</p>"#, &html_options(&[])).unwrap();
    assert_eq!(text_colors(&w.canvas().pages()[0]), vec![Color::BLACK]);
}

#[test]
fn test_html_table_and_list_flow() {
    let html = r#"
        <h1>Parts</h1>
        <table border="1" cellpadding="2">
          <tr><th>Part</th><th>Count</th></tr>
          <tr><td>bolt</td><td>4</td></tr>
          <tr><td>nut</td><td>9</td></tr>
        </table>
        <ol><li>check</li><li>ship</li></ol>
    "#;
    let w = render_mono(html, &HtmlOptions::default()).unwrap();
    let page = &w.canvas().pages()[0];
    assert_eq!(
        page.texts(),
        vec!["Parts", "Part", "Count", "bolt", "4", "nut", "9", "1. check", "2. ship"]
    );
    assert!(!page.lines().is_empty());
}

#[test]
fn test_link_stylesheet_loaded_from_base_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("site.css"), "p { color: red }").unwrap();
    let options = HtmlOptions {
        base_dir: Some(dir.path().to_path_buf()),
        ..html_options(&[])
    };
    let w = render_mono(r#"<link rel="stylesheet" href="site.css"><p>x</p>"#, &options).unwrap();
    assert_eq!(text_colors(&w.canvas().pages()[0]), vec![Color::rgb8(255, 0, 0)]);
}

#[test]
fn test_missing_linked_stylesheet_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let options = HtmlOptions {
        base_dir: Some(dir.path().to_path_buf()),
        ..html_options(&[])
    };
    let err = render_mono(r#"<link rel="stylesheet" href="absent.css"><p>x</p>"#, &options).unwrap_err();
    assert!(matches!(err, LayoutError::Io(_)));
}

#[test]
fn test_image_uses_intrinsic_size_and_embeds() {
    let dir = tempfile::tempdir().unwrap();
    image::RgbImage::new(4, 2).save(dir.path().join("dot.png")).unwrap();
    let options = HtmlOptions {
        base_dir: Some(dir.path().to_path_buf()),
        ..html_options(&[])
    };

    let mut w = DocumentWriter::new(PageGeometry::default(), RecordingCanvas::new());
    write_html(&mut w, r#"<img src="dot.png">"#, &options).unwrap();
    match &w.canvas().pages()[0].ops[0] {
        DrawOp::Image { src, x, y, width, height } => {
            assert!(src.ends_with("dot.png"));
            assert_eq!((*x, *y, *width, *height), (72.0, 718.0, 4.0, 2.0));
        }
        other => panic!("unexpected op {:?}", other),
    }

    let config = RenderConfig {
        base_dir: Some(dir.path().to_path_buf()),
        ..RenderConfig::default()
    };
    let bytes = render_html(r#"<p>pic</p><img src="dot.png" width="8pt" height="4pt">"#, &config).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Subtype /Image"));
}

// ─── JSON documents ─────────────────────────────────────────────

#[test]
fn test_json_document_layout() {
    let json = r#"{
        "metadata": { "title": "Report" },
        "blocks": [
            { "type": "paragraph", "text": "Intro", "style": { "fontSize": 14, "bold": true } },
            { "type": "list", "items": ["x", "y"] },
            { "type": "table", "caption": "Totals", "columns": [{ "name": "qty", "label": "Qty" }],
              "rows": [{ "qty": 3 }], "rowBorder": 1, "sampleRows": 5 },
            { "type": "pageBreak" },
            { "type": "html", "source": "<p>after</p>" }
        ]
    }"#;
    let document: Document = serde_json::from_str(json).unwrap();
    let pages = render_document(&document).unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].texts(), vec!["Intro", "\u{2022} x", "\u{2022} y", "Totals", "Qty", "3"]);
    assert_eq!(pages[1].texts(), vec!["after"]);

    let bytes = render_json(json).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.starts_with("%PDF-1.7"));
    assert!(text.contains("/Title (Report)"));
    assert!(text.contains("/Count 2"));
}
