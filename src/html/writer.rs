//! The depth-first walk that dispatches each node to plain-text flow, an
//! image, or the active table or list scanner.
//!
//! The scan mode is a value threaded through the walk: every enter and exit
//! handler takes the current [`ScanMode`] and returns the next one. Only one
//! table or list can be open at a time; finding another table or list
//! inside one is an error.

use std::path::{Path, PathBuf};

use crate::canvas::Canvas;
use crate::error::{LayoutError, Result};
use crate::layout::DocumentWriter;
use crate::model::PageGeometry;
use crate::style::ParagraphStyle;
use crate::text::{next_line_start, LineWrapper};
use crate::units::parse_dimension;

use super::cascade::StyleCascade;
use super::dom::{collapse_whitespace, DomTree, NodeId, Walk};
use super::list::ListScanner;
use super::table::TableScanner;
use super::HtmlOptions;

/// Elements whose content is never laid out.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "title", "noscript", "template"];

#[derive(Debug)]
pub enum ScanMode {
    Normal,
    InTable(Box<TableScanner>),
    InList(ListScanner),
}

impl ScanMode {
    fn name(&self) -> &'static str {
        match self {
            ScanMode::Normal => "body",
            ScanMode::InTable(_) => "table",
            ScanMode::InList(_) => "list",
        }
    }
}

pub struct HtmlWriter<'t, 'o> {
    tree: &'t DomTree,
    cascade: StyleCascade<'o>,
    options: &'o HtmlOptions,
    /// X of the next inline run on the current line.
    x: f64,
    /// A word space is owed before the next run on this line.
    pending_space: bool,
}

impl<'t, 'o> HtmlWriter<'t, 'o> {
    pub fn new(tree: &'t DomTree, geometry: PageGeometry, options: &'o HtmlOptions) -> Result<Self> {
        let mut cascade = StyleCascade::new(tree.len(), geometry, options.dpi, &options.fonts)?;
        for sheet in &options.stylesheets {
            cascade.add_stylesheet(sheet);
        }
        Ok(Self {
            tree,
            cascade,
            options,
            x: geometry.left_x(),
            pending_space: false,
        })
    }

    pub fn cascade(&self) -> &StyleCascade<'o> {
        &self.cascade
    }

    pub fn write<C: Canvas>(&mut self, w: &mut DocumentWriter<C>) -> Result<()> {
        let tree = self.tree;
        let mut mode = ScanMode::Normal;
        let mut skipping: Option<NodeId> = None;
        for step in tree.traverse() {
            match step {
                Walk::Enter(id) => {
                    if skipping.is_some() {
                        continue;
                    }
                    if let Some(tag) = tree.tag_name(id) {
                        if SKIPPED_ELEMENTS.contains(&tag) {
                            if tag == "style" {
                                self.load_style_element(id);
                            }
                            skipping = Some(id);
                            continue;
                        }
                    }
                    mode = self.enter(w, id, mode)?;
                }
                Walk::Exit(id) => {
                    if let Some(skipped) = skipping {
                        if skipped == id {
                            skipping = None;
                        }
                        continue;
                    }
                    mode = self.exit(w, id, mode)?;
                }
            }
        }
        if !matches!(mode, ScanMode::Normal) {
            log::warn!("document ended inside an open {}", mode.name());
        }
        Ok(())
    }

    fn enter<C: Canvas>(&mut self, w: &mut DocumentWriter<C>, id: NodeId, mut mode: ScanMode) -> Result<ScanMode> {
        let tree = self.tree;
        if let Some(text) = tree.text(id) {
            let text = collapse_whitespace(text);
            let text = text.trim();
            let in_head = tree.parent(id).and_then(|p| tree.tag_name(p)) == Some("head");
            if text.is_empty() || in_head {
                return Ok(mode);
            }
            match &mut mode {
                ScanMode::Normal => {
                    let style = self.cascade.style_of(tree, id);
                    self.write_inline(w, &style, text)?;
                }
                ScanMode::InTable(scanner) => scanner.text(text),
                ScanMode::InList(scanner) => scanner.text(text),
            }
            return Ok(mode);
        }

        let Some(tag) = tree.tag_name(id) else {
            return Ok(mode);
        };
        if tag == "link" {
            self.load_link(id)?;
            return Ok(mode);
        }
        let style = self.cascade.resolve(tree, id)?;

        if matches!(tag, "table" | "ul" | "ol") && !matches!(mode, ScanMode::Normal) {
            return Err(LayoutError::NestedStructure {
                outer: mode.name().to_string(),
                inner: tag.to_string(),
            });
        }
        match &mut mode {
            ScanMode::InTable(scanner) => scanner.enter(tree, id, tag, &style),
            ScanMode::InList(scanner) => scanner.enter(tag, &style),
            ScanMode::Normal => {}
        }
        if !matches!(mode, ScanMode::Normal) {
            // Images still draw at the cursor; block moves belong to the
            // table or list layout.
            if tag == "img" {
                self.draw_image(w, id, &style)?;
            }
            return Ok(mode);
        }

        match tag {
            "table" => {
                self.x = style.left_x(false);
                let scanner = TableScanner::new(tree, id, &style, self.options.dpi)?;
                log::debug!("entering table (node {})", id.0);
                Ok(ScanMode::InTable(Box::new(scanner)))
            }
            "ul" | "ol" => {
                self.x = style.left_x(false);
                log::debug!("entering list (node {})", id.0);
                Ok(ScanMode::InList(ListScanner::begin(w, id, tag == "ol", &style)))
            }
            "img" => {
                self.draw_image(w, id, &style)?;
                Ok(mode)
            }
            _ => {
                if tree.is_block_level(id) {
                    w.start_block(&style);
                    self.x = style.left_x(true);
                    self.pending_space = false;
                }
                Ok(mode)
            }
        }
    }

    fn exit<C: Canvas>(&mut self, w: &mut DocumentWriter<C>, id: NodeId, mode: ScanMode) -> Result<ScanMode> {
        let tree = self.tree;
        let Some(tag) = tree.tag_name(id) else {
            return Ok(mode);
        };

        let mode = match mode {
            ScanMode::InTable(mut scanner) => {
                let done = scanner.exit(w, id, tag)?;
                self.cascade.evict(id);
                if !done {
                    return Ok(ScanMode::InTable(scanner));
                }
                log::debug!("leaving table (node {})", scanner.node().0);
                self.x = w.geometry().left_x();
                return Ok(ScanMode::Normal);
            }
            ScanMode::InList(mut scanner) => {
                let done = scanner.exit(w, id, tag)?;
                self.cascade.evict(id);
                if !done {
                    return Ok(ScanMode::InList(scanner));
                }
                log::debug!("leaving list (node {})", scanner.node().0);
                self.x = w.geometry().left_x();
                return Ok(ScanMode::Normal);
            }
            ScanMode::Normal => ScanMode::Normal,
        };

        if matches!(tag, "head" | "link" | "meta" | "img") {
            self.cascade.evict(id);
            return Ok(mode);
        }

        let style = self.cascade.style_for_close(tree, id)?;
        if tag == "br" {
            self.line_break(w, &style)?;
        } else if tree.is_block_level(id) {
            w.set_y(w.y() - (style.line_height() + style.below_spacing));
            self.x = style.left_x(false);
            self.pending_space = false;
        } else {
            self.pending_space = true;
        }
        self.cascade.evict(id);
        Ok(mode)
    }

    /// Write a run of text starting at the current X, wrapping onto new
    /// lines at the style's left edge.
    fn write_inline<C: Canvas>(&mut self, w: &mut DocumentWriter<C>, style: &ParagraphStyle, text: &str) -> Result<()> {
        if w.is_at_end_of_page() {
            w.new_page()?;
            self.x = style.left_x(false);
        }
        w.ensure_page()?;

        let space = w.measure(style, " ")?;
        let mut start = 0;
        loop {
            if std::mem::take(&mut self.pending_space) {
                self.x += space;
            }
            let used = (self.x - style.left_x(false)).max(0.0);
            let end = LineWrapper::for_style(w.canvas(), style).wrap_position(text, start, style.width(), used)?;
            if end > start {
                let run = &text[start..end];
                let y = w.y();
                w.draw_text(style, self.x, y, run)?;
                self.x += w.measure(style, run)?;
                self.pending_space = true;
            }
            let next = next_line_start(text, end);
            if next >= text.len() {
                break;
            }
            self.line_break(w, style)?;
            start = next;
        }
        if self.x >= style.right_x() {
            self.line_break(w, style)?;
        }
        Ok(())
    }

    fn line_break<C: Canvas>(&mut self, w: &mut DocumentWriter<C>, style: &ParagraphStyle) -> Result<()> {
        w.advance_line(style);
        self.x = style.left_x(false);
        self.pending_space = false;
        if w.is_at_end_of_page() {
            w.new_page()?;
        }
        Ok(())
    }

    fn draw_image<C: Canvas>(&mut self, w: &mut DocumentWriter<C>, id: NodeId, style: &ParagraphStyle) -> Result<()> {
        let tree = self.tree;
        let Some(src) = tree.attribute(id, "src").filter(|s| !s.trim().is_empty()) else {
            log::warn!("<img> without src (node {})", id.0);
            return Ok(());
        };
        let dimension = |name: &str| -> Result<Option<f64>> {
            tree.attribute(id, name)
                .filter(|v| !v.trim().is_empty())
                .map(|v| parse_dimension(v, style.font_size, self.options.dpi))
                .transpose()
        };
        let (width, height) = (dimension("width")?, dimension("height")?);
        let path = self.resolve_path(src);
        w.draw_image(style, &path, width, height)?;
        self.x = style.left_x(false);
        self.pending_space = false;
        Ok(())
    }

    fn resolve_path(&self, src: &str) -> String {
        if src.starts_with("data:") || Path::new(src).is_absolute() {
            return src.to_string();
        }
        match &self.options.base_dir {
            Some(dir) => dir.join(src).to_string_lossy().into_owned(),
            None => src.to_string(),
        }
    }

    fn load_link(&mut self, id: NodeId) -> Result<()> {
        let tree = self.tree;
        let is_stylesheet = tree
            .attribute(id, "rel")
            .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("stylesheet")))
            || tree.attribute(id, "type").is_some_and(|t| t.trim() == "text/css");
        let Some(href) = tree.attribute(id, "href").filter(|_| is_stylesheet) else {
            return Ok(());
        };
        let path = PathBuf::from(self.resolve_path(href));
        log::debug!("loading stylesheet {}", path.display());
        let source = std::fs::read_to_string(&path)?;
        self.cascade.add_stylesheet(&source);
        Ok(())
    }

    fn load_style_element(&mut self, id: NodeId) {
        let tree = self.tree;
        let source: String = tree.children(id).iter().filter_map(|child| tree.text(*child)).collect();
        self.cascade.add_stylesheet(&source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::testing::MonoCanvas;
    use crate::canvas::DrawOp;

    fn render(html: &str) -> Result<DocumentWriter<MonoCanvas>> {
        let mut w = DocumentWriter::new(PageGeometry::default(), MonoCanvas::new(6.0));
        let options = HtmlOptions {
            stylesheets: Vec::new(),
            ..HtmlOptions::default()
        };
        super::super::write_html(&mut w, html, &options)?;
        Ok(w)
    }

    fn text_positions(w: &DocumentWriter<MonoCanvas>, page: usize) -> Vec<(String, f64, f64)> {
        w.canvas().pages()[page]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, x, y, .. } => Some((text.clone(), *x, *y)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_paragraphs_stack() {
        let w = render("<p>one</p><p>two</p>").unwrap();
        assert_eq!(
            text_positions(&w, 0),
            vec![("one".into(), 72.0, 720.0), ("two".into(), 72.0, 708.0)]
        );
    }

    #[test]
    fn test_inline_runs_share_a_line() {
        let w = render("<p>Hello <b>bold</b> world</p>").unwrap();
        let runs = text_positions(&w, 0);
        assert_eq!(runs.len(), 3);
        // "Hello" is 30pt, then one 6pt space.
        assert_eq!(runs[1], ("bold".into(), 108.0, 720.0));
        assert!(runs.iter().all(|r| r.2 == 720.0));
    }

    #[test]
    fn test_inline_style_applies() {
        let w = render(r#"<p style="color: red; font-family: courier">x</p>"#).unwrap();
        match &w.canvas().pages()[0].ops[0] {
            DrawOp::Text { font, color, .. } => {
                assert_eq!(*font, crate::font::StandardFont::Courier);
                assert_eq!(*color, crate::style::Color::rgb8(255, 0, 0));
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn test_style_element_affects_following_nodes() {
        let w = render("<style>p { font-size: 20pt }</style><p>x</p>").unwrap();
        match &w.canvas().pages()[0].ops[0] {
            DrawOp::Text { font_size, .. } => assert_eq!(*font_size, 20.0),
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn test_list_inside_table_is_rejected() {
        let err = render("<table><tr><td><ul><li>x</li></ul></td></tr></table>").unwrap_err();
        assert!(matches!(err, LayoutError::NestedStructure { .. }));
    }

    #[test]
    fn test_table_inside_list_is_rejected() {
        let err = render("<ol><li><table></table></li></ol>").unwrap_err();
        match err {
            LayoutError::NestedStructure { outer, inner } => {
                assert_eq!(outer, "list");
                assert_eq!(inner, "table");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_list_items_written_with_labels() {
        let w = render("<ul><li>alpha</li><li>beta <i>gamma</i></li></ul>").unwrap();
        let texts = w.canvas().pages()[0].texts();
        assert_eq!(texts, vec!["\u{2022} alpha", "\u{2022} beta gamma"]);
    }

    #[test]
    fn test_ordered_list_numbers() {
        let w = render("<ol><li>a</li><li>b</li></ol>").unwrap();
        assert_eq!(w.canvas().pages()[0].texts(), vec!["1. a", "2. b"]);
    }

    #[test]
    fn test_table_header_from_th_row() {
        let w = render("<table><tr><th>Name</th><th>Qty</th></tr><tr><td>nut</td><td>3</td></tr></table>").unwrap();
        assert_eq!(w.canvas().pages()[0].texts(), vec!["Name", "Qty", "nut", "3"]);
    }

    #[test]
    fn test_table_thead_and_caption() {
        let html = "<table border=\"1\"><caption>Parts</caption><thead><tr><th>A</th></tr></thead>\
                    <tbody><tr><td>x</td></tr></tbody></table>";
        let w = render(html).unwrap();
        let page = &w.canvas().pages()[0];
        assert_eq!(page.texts(), vec!["Parts", "A", "x"]);
        assert!(!page.lines().is_empty());
    }

    #[test]
    fn test_br_breaks_line() {
        let w = render("<p>a<br>b</p>").unwrap();
        let runs = text_positions(&w, 0);
        assert_eq!(runs[0].2, 720.0);
        assert_eq!(runs[1], ("b".into(), 72.0, 708.0));
    }

    fn image_count(w: &DocumentWriter<MonoCanvas>) -> usize {
        w.canvas()
            .pages()
            .iter()
            .flat_map(|page| page.ops.iter())
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .count()
    }

    #[test]
    fn test_image_inside_list_item_is_drawn() {
        let w = render(r#"<ul><li>a <img src="x.png" width="10pt" height="10pt"></li></ul>"#).unwrap();
        assert_eq!(image_count(&w), 1);
        assert_eq!(w.canvas().pages()[0].texts(), vec!["\u{2022} a"]);
    }

    #[test]
    fn test_image_inside_table_cell_is_drawn() {
        let html = r#"<table><tr><th>A</th></tr><tr><td>x <img src="y.png" width="8pt" height="8pt"></td></tr></table>"#;
        let w = render(html).unwrap();
        assert_eq!(image_count(&w), 1);
        assert_eq!(w.canvas().pages()[0].texts(), vec!["A", "x"]);
    }

    #[test]
    fn test_unclosed_paragraphs_stack() {
        let w = render("<p>one<p>two").unwrap();
        assert_eq!(
            text_positions(&w, 0),
            vec![("one".into(), 72.0, 720.0), ("two".into(), 72.0, 708.0)]
        );
    }

    #[test]
    fn test_cascade_entries_released() {
        let tree = DomTree::parse("<div><p>a <b>b</b></p><ul><li>c</li></ul></div>");
        let options = HtmlOptions::default();
        let mut w = DocumentWriter::new(PageGeometry::default(), MonoCanvas::new(6.0));
        let mut html = HtmlWriter::new(&tree, PageGeometry::default(), &options).unwrap();
        html.write(&mut w).unwrap();
        assert_eq!(html.cascade().live_entries(), 0);
    }
}
