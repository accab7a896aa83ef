//! `<ul>` / `<ol>` handling. Item text is buffered until its `<li>` closes,
//! then written with a hanging label.

use crate::canvas::Canvas;
use crate::error::Result;
use crate::layout::DocumentWriter;
use crate::style::{ListStyle, ParagraphStyle};

use super::dom::NodeId;

#[derive(Debug)]
pub struct ListScanner {
    node: NodeId,
    list: ListStyle,
    item: Option<(ParagraphStyle, String)>,
}

impl ListScanner {
    /// Start a list at `node`, moving the cursor past its above-spacing.
    pub fn begin<C: Canvas>(
        w: &mut DocumentWriter<C>,
        node: NodeId,
        ordered: bool,
        style: &ParagraphStyle,
    ) -> Self {
        let mut list = if ordered {
            ListStyle::numbered(style.geometry)
        } else {
            ListStyle::bulleted(style.geometry)
        };
        list.adopt_style(style);
        w.start_block(&list.style);
        Self {
            node,
            list,
            item: None,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn list(&self) -> &ListStyle {
        &self.list
    }

    pub fn enter(&mut self, tag: &str, style: &ParagraphStyle) {
        if tag == "li" {
            self.item = Some((ListStyle::item_style_from(style), String::new()));
        }
    }

    pub fn text(&mut self, text: &str) {
        if let Some((_, buffer)) = &mut self.item {
            if !buffer.is_empty() {
                buffer.push(' ');
            }
            buffer.push_str(text);
        }
    }

    /// Returns true once the list element itself has closed.
    pub fn exit<C: Canvas>(&mut self, w: &mut DocumentWriter<C>, id: NodeId, tag: &str) -> Result<bool> {
        if tag == "li" {
            if let Some((style, body)) = self.item.take() {
                w.write_list_item(&mut self.list, &style, &body)?;
            }
        }
        if id == self.node {
            w.set_y(w.y() - self.list.style.below_spacing);
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::testing::MonoCanvas;
    use crate::model::PageGeometry;
    use crate::units;

    #[test]
    fn test_begin_keeps_list_first_line_indent() {
        let mut w = DocumentWriter::new(PageGeometry::default(), MonoCanvas::new(6.0));
        let mut style = ParagraphStyle::new(PageGeometry::default());
        style.above_spacing = 6.0;
        style.before_text_indent = 18.0;
        let scanner = ListScanner::begin(&mut w, NodeId(1), true, &style);
        assert_eq!(scanner.list().style.first_line_indent, units::inches(-0.1));
        assert_eq!(scanner.list().style.before_text_indent, 18.0);
        assert_eq!(w.y(), 720.0 - 6.0);
    }

    #[test]
    fn test_item_written_when_li_closes() {
        let mut w = DocumentWriter::new(PageGeometry::default(), MonoCanvas::new(6.0));
        let style = ParagraphStyle::new(PageGeometry::default());
        let mut scanner = ListScanner::begin(&mut w, NodeId(1), true, &style);
        scanner.enter("li", &style);
        scanner.text("first");
        scanner.text("item");
        assert!(w.canvas().pages().is_empty());
        assert!(!scanner.exit(&mut w, NodeId(2), "li").unwrap());
        assert_eq!(w.canvas().pages()[0].texts(), vec!["1. first item"]);
        assert!(scanner.exit(&mut w, NodeId(1), "ol").unwrap());
    }
}
