//! # Quire
//!
//! A flow-and-pagination layout engine.
//!
//! Content is written top to bottom into fixed-size pages through a single
//! vertical cursor. Every paragraph line, table row and list item checks the
//! lower page bound before it is placed; nothing is laid out on an infinite
//! canvas and sliced afterwards.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON document / HTML + CSS)
//!       ↓
//!   [model] / [html]  — blocks, or a DOM tree with cascaded styles
//!       ↓
//!   [layout]          — cursor, paragraphs, lists, tables, images
//!       ↓
//!   [canvas]          — recorded display list per page
//!       ↓
//!   [pdf]             — Serialize to PDF bytes
//! ```
//!
//! Text is measured with the standard PDF font metrics, so the engine
//! needs no font files.

pub mod canvas;
pub mod error;
pub mod font;
pub mod html;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod style;
pub mod text;
pub mod units;

use std::path::PathBuf;

use serde::Deserialize;

use canvas::{Canvas, CanvasPage, RecordingCanvas};
use error::Result;
use font::FontTable;
use html::HtmlOptions;
use layout::{Column, DocumentWriter, Row, Table, TableHeader, TableLayout};
use model::{cell_text, Block, BlockStyle, Document, Metadata, PageGeometry, TableBlock};
use pdf::PdfWriter;
use style::{Borders, Color, ListStyle, ParagraphStyle};

pub use error::LayoutError;

/// Settings for [`render_html`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    pub page: PageGeometry,
    /// Resolution for `px` dimensions.
    pub dpi: f64,
    /// Directory `<link href>` and `<img src>` resolve against.
    pub base_dir: Option<PathBuf>,
    /// CSS merged after the bundled default sheet.
    pub stylesheets: Vec<String>,
    pub metadata: Metadata,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page: PageGeometry::default(),
            dpi: units::DEFAULT_DPI,
            base_dir: None,
            stylesheets: Vec::new(),
            metadata: Metadata::default(),
        }
    }
}

impl RenderConfig {
    pub fn html_options(&self) -> HtmlOptions {
        let mut stylesheets = vec![html::DEFAULT_STYLESHEET.to_string()];
        stylesheets.extend(self.stylesheets.iter().cloned());
        HtmlOptions {
            dpi: self.dpi,
            base_dir: self.base_dir.clone(),
            stylesheets,
            fonts: FontTable::standard(),
        }
    }
}

/// Lay out HTML and serialize it to PDF bytes.
pub fn render_html(source: &str, config: &RenderConfig) -> Result<Vec<u8>> {
    let mut writer = DocumentWriter::new(config.page, RecordingCanvas::new());
    html::write_html(&mut writer, source, &config.html_options())?;
    let pages = writer.into_canvas().into_pages();
    PdfWriter::new().write(&pages, &config.metadata)
}

/// Lay out a document onto recorded pages.
pub fn render_document(document: &Document) -> Result<Vec<CanvasPage>> {
    let mut writer = DocumentWriter::new(document.page, RecordingCanvas::new());
    write_document(&mut writer, document)?;
    Ok(writer.into_canvas().into_pages())
}

/// Render a document described as JSON to PDF bytes.
pub fn render_json(json: &str) -> Result<Vec<u8>> {
    let document: Document = serde_json::from_str(json)?;
    let pages = render_document(&document)?;
    PdfWriter::new().write(&pages, &document.metadata)
}

/// Write every block of `document` at the writer's cursor.
pub fn write_document<C: Canvas>(writer: &mut DocumentWriter<C>, document: &Document) -> Result<()> {
    let fonts = FontTable::standard();
    for block in &document.blocks {
        match block {
            Block::Paragraph { text, style } => {
                let style = paragraph_style(&document.page, &fonts, style);
                writer.write_paragraph(&style, text)?;
            }
            Block::List {
                ordered,
                items,
                style,
                delimiter,
            } => {
                let mut list = if *ordered {
                    ListStyle::numbered(document.page)
                } else {
                    ListStyle::bulleted(document.page)
                };
                list.style = list_style(&list.style, &fonts, style);
                if let Some(delimiter) = delimiter {
                    list.delimiter = delimiter.clone();
                }
                writer.write_list(&mut list, items.as_slice())?;
            }
            Block::Table(table) => write_table_block(writer, &fonts, table)?,
            Block::Image { src, width, height } => {
                let style = writer.paragraph_style();
                writer.draw_image(&style, src, *width, *height)?;
            }
            Block::Html { source } => {
                html::write_html(writer, source, &HtmlOptions::default())?;
            }
            Block::PageBreak => {
                writer.page_break()?;
            }
        }
    }
    Ok(())
}

fn write_table_block<C: Canvas>(writer: &mut DocumentWriter<C>, fonts: &FontTable, block: &TableBlock) -> Result<()> {
    let style = paragraph_style(writer.geometry(), fonts, &block.style);
    let columns = block
        .columns
        .iter()
        .map(|spec| Column {
            name: spec.name.clone(),
            label: spec.label.clone().unwrap_or_else(|| spec.name.clone()),
            width: spec.width,
        })
        .collect();
    let mut table = Table::new(style, TableHeader::new(columns));
    table.cell_padding = block.cell_padding;
    table.cell_spacing = block.cell_spacing;
    table.row_border = block.row_border;
    table.column_border = block.column_border;

    let rows: Vec<Row> = block
        .rows
        .iter()
        .map(|row| row.iter().map(|(key, value)| (key.clone(), cell_text(value))).collect())
        .collect();
    if let Some(sample) = block.sample_rows {
        table.size_columns_from_rows(writer.canvas(), &rows, sample)?;
    }

    let mut layout = TableLayout::new(table);
    if let Some(caption) = &block.caption {
        layout.write_caption(writer, caption)?;
    }
    layout.begin(writer)?;
    if layout.table().header.is_blank() {
        layout.skip_header(writer)?;
    } else {
        layout.write_header(writer)?;
    }
    for row in &rows {
        layout.write_row(writer, row)?;
    }
    layout.finish(writer)?;
    Ok(())
}

/// Apply the set fields of `block` over the default paragraph style.
fn paragraph_style(geometry: &PageGeometry, fonts: &FontTable, block: &BlockStyle) -> ParagraphStyle {
    apply_block_style(ParagraphStyle::new(*geometry), fonts, block)
}

fn list_style(base: &ParagraphStyle, fonts: &FontTable, block: &BlockStyle) -> ParagraphStyle {
    apply_block_style(*base, fonts, block)
}

fn apply_block_style(mut style: ParagraphStyle, fonts: &FontTable, block: &BlockStyle) -> ParagraphStyle {
    style.font = fonts.lookup(block.font_family.as_deref().unwrap_or(""), block.bold, block.italic);
    if let Some(size) = block.font_size {
        style.font_size = size;
    }
    if let Some(color) = &block.color {
        style.color = Color::parse_or_black(color);
    }
    if let Some(v) = block.before_indent {
        style.before_text_indent = v;
    }
    if let Some(v) = block.after_indent {
        style.after_text_indent = v;
    }
    if let Some(v) = block.first_line_indent {
        style.first_line_indent = v;
    }
    if let Some(v) = block.above_spacing {
        style.above_spacing = v;
    }
    if let Some(v) = block.below_spacing {
        style.below_spacing = v;
    }
    if let Some(v) = block.line_spacing {
        style.line_spacing = v;
    }
    if block.width.is_some() {
        style.block_width = block.width;
    }
    if let Some(border) = block.border {
        style.border = Borders::uniform(border);
    }
    style
}
