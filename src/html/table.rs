//! `<table>` handling.
//!
//! Columns come from `<thead>` cells when there is a head; otherwise a
//! first row made only of `<th>` cells becomes the header. Columns are named
//! `column-0`, `column-1`, ... in document order. Cell text is buffered and
//! each row is laid out when its `<tr>` closes.

use crate::canvas::Canvas;
use crate::error::Result;
use crate::layout::{Column, DocumentWriter, Row, Table, TableHeader, TableLayout};
use crate::style::{Borders, ParagraphStyle};
use crate::units::parse_dimension;

use super::dom::{collapse_whitespace, DomTree, NodeId};

#[derive(Debug, Default)]
struct PendingRow {
    cells: Vec<String>,
    widths: Vec<Option<f64>>,
    all_header_cells: bool,
}

#[derive(Debug)]
pub struct TableScanner {
    node: NodeId,
    layout: TableLayout,
    started: bool,
    in_head: bool,
    caption: Option<String>,
    caption_text: String,
    row: Option<PendingRow>,
    cell: Option<String>,
}

fn column_name(index: usize) -> String {
    format!("column-{}", index)
}

impl TableScanner {
    /// Build the table model from the `<table>` element's style and its
    /// `border`, `cellpadding` and `cellspacing` attributes.
    pub fn new(tree: &DomTree, node: NodeId, style: &ParagraphStyle, dpi: f64) -> Result<Self> {
        let mut table = Table::new(*style, TableHeader::new(Vec::new()));
        let dimension = |name: &str| -> Result<Option<f64>> {
            tree.attribute(node, name)
                .filter(|v| !v.trim().is_empty())
                .map(|v| parse_dimension(v, style.font_size, dpi))
                .transpose()
        };
        if let Some(border) = dimension("border")? {
            table.style.border = Borders::uniform(border);
            table.row_border = border;
            table.column_border = border;
        }
        if let Some(padding) = dimension("cellpadding")? {
            table.cell_padding = padding;
        }
        if let Some(spacing) = dimension("cellspacing")? {
            table.cell_spacing = spacing;
        }
        Ok(Self {
            node,
            layout: TableLayout::new(table),
            started: false,
            in_head: false,
            caption: None,
            caption_text: String::new(),
            row: None,
            cell: None,
        })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn enter(&mut self, tree: &DomTree, id: NodeId, tag: &str, style: &ParagraphStyle) {
        match tag {
            "caption" => self.caption = Some(String::new()),
            "thead" => self.in_head = true,
            "th" | "td" if self.in_head => {
                let header = &mut self.layout.table_mut().header;
                if header.columns.is_empty() {
                    header.font = style.font;
                    header.font_size = style.font_size;
                    header.color = style.color;
                }
                let mut column = Column::new(column_name(header.columns.len()), tree.text_content(id));
                column.width = style.block_width;
                header.columns.push(column);
            }
            "tr" if !self.in_head => {
                self.row = Some(PendingRow {
                    all_header_cells: true,
                    ..PendingRow::default()
                });
            }
            "th" | "td" => {
                if let Some(row) = &mut self.row {
                    row.all_header_cells &= tag == "th";
                    row.widths.push(style.block_width);
                    if tag == "th" && row.cells.is_empty() && !self.started {
                        let header = &mut self.layout.table_mut().header;
                        header.font = style.font;
                        header.font_size = style.font_size;
                        header.color = style.color;
                    }
                }
                self.cell = Some(String::new());
            }
            _ => {}
        }
    }

    pub fn text(&mut self, text: &str) {
        let target = match (&mut self.cell, &mut self.caption) {
            (Some(cell), _) => cell,
            (None, Some(caption)) => caption,
            (None, None) => return,
        };
        if !target.is_empty() {
            target.push(' ');
        }
        target.push_str(text);
    }

    /// Returns true once the table element itself has closed.
    pub fn exit<C: Canvas>(&mut self, w: &mut DocumentWriter<C>, id: NodeId, tag: &str) -> Result<bool> {
        match tag {
            "caption" => {
                if let Some(caption) = self.caption.take() {
                    self.caption_text = collapse_whitespace(&caption).trim().to_string();
                }
            }
            "thead" => {
                self.in_head = false;
                self.start(w)?;
            }
            "th" | "td" if self.cell.is_some() => {
                let text = self.cell.take().unwrap_or_default();
                if let Some(row) = &mut self.row {
                    row.cells.push(collapse_whitespace(&text).trim().to_string());
                }
            }
            "tr" => {
                if let Some(row) = self.row.take() {
                    self.finish_row(w, row)?;
                }
            }
            _ => {}
        }
        if id == self.node {
            self.finish(w)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn finish_row<C: Canvas>(&mut self, w: &mut DocumentWriter<C>, row: PendingRow) -> Result<()> {
        if !self.started {
            let header = &mut self.layout.table_mut().header;
            if header.columns.is_empty() {
                let is_header = row.all_header_cells && !row.cells.is_empty();
                for (index, width) in row.widths.iter().enumerate() {
                    let label = if is_header {
                        row.cells.get(index).cloned().unwrap_or_default()
                    } else {
                        String::new()
                    };
                    let mut column = Column::new(column_name(index), label);
                    column.width = *width;
                    header.columns.push(column);
                }
                if is_header {
                    return self.start(w);
                }
            }
            self.start(w)?;
        }

        let columns = self.layout.table().header.columns.len();
        if row.cells.len() > columns {
            log::debug!(
                "dropping {} cells beyond the table's {} columns",
                row.cells.len() - columns,
                columns
            );
        }
        let data: Row = row
            .cells
            .into_iter()
            .take(columns)
            .enumerate()
            .map(|(index, text)| (column_name(index), text))
            .collect();
        self.layout.write_row(w, &data)
    }

    /// Caption, sizing and header, once the columns are known.
    fn start<C: Canvas>(&mut self, w: &mut DocumentWriter<C>) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        let caption = std::mem::take(&mut self.caption_text);
        self.layout.write_caption(w, &caption)?;
        self.layout.begin(w)?;
        if self.layout.table().header.is_blank() {
            self.layout.skip_header(w)
        } else {
            self.layout.write_header(w)
        }
    }

    fn finish<C: Canvas>(&mut self, w: &mut DocumentWriter<C>) -> Result<()> {
        self.start(w)?;
        let placeholder = TableLayout::new(self.layout.table().clone());
        let table = std::mem::replace(&mut self.layout, placeholder).finish(w)?;
        // Leave a line under the bottom border before the next block.
        w.set_y(w.y() - table.line_height());
        Ok(())
    }
}
