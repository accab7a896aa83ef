//! # HTML Rendering
//!
//! Lays out a small HTML/CSS subset through the same [`DocumentWriter`]
//! used for direct paragraphs, lists and tables.
//!
//! ```text
//! markup ──▶ [dom] arena tree ──▶ [writer] one depth-first walk
//!                                   │   ▲
//!                                   ▼   │ resolved styles
//!                          table/list   [cascade] ◀── [css] selector tables
//!                          scanners
//! ```
//!
//! Supported selectors are tag, `#id` and `.class`. Stylesheets come from
//! [`HtmlOptions::stylesheets`], `<style>` elements and
//! `<link rel="stylesheet">` files, in document order.

pub mod cascade;
pub mod css;
pub mod dom;
pub mod list;
pub mod style;
pub mod table;
pub mod writer;

use std::path::PathBuf;

use crate::canvas::Canvas;
use crate::error::Result;
use crate::font::FontTable;
use crate::layout::DocumentWriter;
use crate::units::DEFAULT_DPI;

pub use writer::HtmlWriter;

/// Rules applied before any document stylesheet.
pub const DEFAULT_STYLESHEET: &str = include_str!("../../assets/default.css");

#[derive(Debug, Clone)]
pub struct HtmlOptions {
    /// Resolution for `px` dimensions.
    pub dpi: f64,
    /// Directory relative `src` and `href` values resolve against.
    pub base_dir: Option<PathBuf>,
    /// Stylesheet sources loaded in order before the document's own.
    pub stylesheets: Vec<String>,
    pub fonts: FontTable,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            base_dir: None,
            stylesheets: vec![DEFAULT_STYLESHEET.to_string()],
            fonts: FontTable::standard(),
        }
    }
}

/// Parse `source` and write it at the writer's current position.
pub fn write_html<C: Canvas>(w: &mut DocumentWriter<C>, source: &str, options: &HtmlOptions) -> Result<()> {
    let tree = dom::DomTree::parse(source);
    HtmlWriter::new(&tree, *w.geometry(), options)?.write(w)
}
