//! # Document Model
//!
//! Page geometry shared by every style on a document, plus the serde
//! description of a document that can be rendered straight from JSON.
//!
//! Coordinates follow PDF conventions: points, origin at the bottom-left
//! corner of the page, Y growing upward. The write cursor therefore moves
//! *down* the page by decreasing Y.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Document metadata embedded in the PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    A4,
    A5,
    #[default]
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Edge values (top, right, bottom, left) used for page margins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Page box plus margins. Derives the content-area bounds every layout
/// operation works inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    #[serde(default)]
    pub size: PageSize,
    #[serde(default = "default_margin")]
    pub margin: Edges,
}

fn default_margin() -> Edges {
    Edges::uniform(crate::units::inches(1.0))
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            size: PageSize::Letter,
            margin: default_margin(),
        }
    }
}

impl PageGeometry {
    pub fn new(size: PageSize, margin: Edges) -> Self {
        Self { size, margin }
    }

    pub fn width(&self) -> f64 {
        self.size.dimensions().0
    }

    pub fn height(&self) -> f64 {
        self.size.dimensions().1
    }

    /// Bottom of the content area.
    pub fn lower_y(&self) -> f64 {
        self.margin.bottom
    }

    /// Top of the content area.
    pub fn upper_y(&self) -> f64 {
        self.height() - self.margin.top
    }

    pub fn left_x(&self) -> f64 {
        self.margin.left
    }

    pub fn right_x(&self) -> f64 {
        self.width() - self.margin.right
    }

    pub fn content_width(&self) -> f64 {
        self.width() - self.margin.horizontal()
    }

    pub fn content_height(&self) -> f64 {
        self.height() - self.margin.vertical()
    }
}

/// A complete document ready for rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub page: PageGeometry,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// One top-level piece of content, written in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Paragraph {
        text: String,
        #[serde(default)]
        style: BlockStyle,
    },
    List {
        #[serde(default)]
        ordered: bool,
        items: Vec<String>,
        #[serde(default)]
        style: BlockStyle,
        #[serde(default)]
        delimiter: Option<String>,
    },
    Table(TableBlock),
    Image {
        src: String,
        #[serde(default)]
        width: Option<f64>,
        #[serde(default)]
        height: Option<f64>,
    },
    /// A fragment of markup rendered through the HTML writer.
    Html { source: String },
    PageBreak,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableBlock {
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub rows: Vec<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub style: BlockStyle,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub cell_padding: f64,
    #[serde(default)]
    pub cell_spacing: f64,
    #[serde(default)]
    pub row_border: f64,
    #[serde(default)]
    pub column_border: f64,
    /// When set, unsized columns are measured from this many data rows
    /// instead of sharing the leftover width equally.
    #[serde(default)]
    pub sample_rows: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
}

/// Optional paragraph settings for a block. Unset fields keep the default
/// paragraph style.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStyle {
    pub font_family: Option<String>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    pub font_size: Option<f64>,
    pub color: Option<String>,
    pub before_indent: Option<f64>,
    pub after_indent: Option<f64>,
    pub first_line_indent: Option<f64>,
    pub above_spacing: Option<f64>,
    pub below_spacing: Option<f64>,
    pub line_spacing: Option<f64>,
    pub width: Option<f64>,
    pub border: Option<f64>,
}

/// Convert a JSON cell value to the text shown in a table cell.
pub fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_bounds() {
        let page = PageGeometry::default();
        assert_eq!(page.lower_y(), 72.0);
        assert_eq!(page.upper_y(), 720.0);
        assert_eq!(page.left_x(), 72.0);
        assert_eq!(page.right_x(), 540.0);
        assert_eq!(page.content_width(), 468.0);
    }

    #[test]
    fn test_deserialize_blocks() {
        let json = r#"{
            "page": { "size": "A4", "margin": { "top": 36, "right": 36, "bottom": 36, "left": 36 } },
            "blocks": [
                { "type": "paragraph", "text": "Hello", "style": { "fontSize": 14, "bold": true } },
                { "type": "list", "ordered": true, "items": ["a", "b"] },
                { "type": "table", "columns": [{ "name": "qty" }], "rows": [{ "qty": 3 }], "rowBorder": 1 },
                { "type": "pageBreak" }
            ]
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.page.size, PageSize::A4);
        assert_eq!(doc.blocks.len(), 4);
        match &doc.blocks[2] {
            Block::Table(t) => {
                assert_eq!(t.row_border, 1.0);
                assert_eq!(cell_text(&t.rows[0]["qty"]), "3");
            }
            other => panic!("expected table, got {:?}", other),
        }
    }
}
