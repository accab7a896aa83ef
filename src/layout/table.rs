//! # Table Layout
//!
//! Column sizing, per-cell wrapping, row pagination and border drawing.
//!
//! A table is laid out as a strip of column slots. Each slot is
//! `column_border + gap + width` wide, where `gap` is cell padding plus
//! cell spacing, and one trailing `gap` closes the last slot:
//!
//! ```text
//! |cb|gap| col 0 |cb|gap| col 1 |gap|
//! ^ left_x        ^ column border   ^ right_x
//! ```
//!
//! Rows are written top-down. A row is as tall as its tallest wrapped cell.
//! When a row would cross the lower page bound, the borders drawn so far
//! are closed off (without a bottom edge) and the table continues at the
//! top of a new page.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::DocumentWriter;
use crate::canvas::Canvas;
use crate::error::{LayoutError, Result};
use crate::font::StandardFont;
use crate::style::{Color, ParagraphStyle};

/// One data row: column name to cell text. Missing keys render empty.
pub type Row = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Key looked up in each [`Row`].
    pub name: String,
    pub label: String,
    /// Text width in points. Unset columns are sized when the table begins.
    pub width: Option<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            width: None,
        }
    }

    /// A column whose label is its name.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name)
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn has_width(&self) -> bool {
        self.width.is_some_and(|w| w > 0.0)
    }

    fn text_width(&self) -> f64 {
        self.width.unwrap_or(0.0).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableHeader {
    pub columns: Vec<Column>,
    pub font: StandardFont,
    pub font_size: f64,
    pub color: Color,
}

impl TableHeader {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            font: StandardFont::TimesBold,
            font_size: 12.0,
            color: Color::BLACK,
        }
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(names.iter().map(|n| Column::named(n.as_ref())).collect())
    }

    /// True when no column has a visible label.
    pub fn is_blank(&self) -> bool {
        self.columns.iter().all(|c| c.label.trim().is_empty())
    }

    fn label_style(&self, base: &ParagraphStyle) -> ParagraphStyle {
        ParagraphStyle {
            font: self.font,
            font_size: self.font_size,
            color: self.color,
            ..*base
        }
    }
}

/// Table geometry and border settings on top of a paragraph style.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub style: ParagraphStyle,
    pub header: TableHeader,
    pub cell_padding: f64,
    pub cell_spacing: f64,
    pub row_border: f64,
    pub column_border: f64,
    /// Y of the top border on the current page. Reset at every page split.
    pub top_y: f64,
}

impl Table {
    pub fn new(style: ParagraphStyle, header: TableHeader) -> Self {
        Self {
            style,
            header,
            cell_padding: 0.0,
            cell_spacing: 0.0,
            row_border: 0.0,
            column_border: 0.0,
            top_y: 0.0,
        }
    }

    pub fn gap(&self) -> f64 {
        self.cell_padding + self.cell_spacing
    }

    pub fn line_height(&self) -> f64 {
        self.style.line_height()
    }

    /// Distance from a row's text baseline up to the border above it.
    pub fn text_base_to_top_border(&self) -> f64 {
        self.line_height() + self.gap()
    }

    pub fn left_x(&self) -> f64 {
        self.style.left_x(false)
    }

    pub fn right_x(&self) -> f64 {
        self.left_x() + self.content_width()
    }

    /// Text X of the column following one whose text ends at `offset`.
    pub fn column_x(&self, offset: f64) -> f64 {
        offset + self.column_border + self.gap()
    }

    pub fn first_column_x(&self) -> f64 {
        self.column_x(self.left_x())
    }

    /// Text X of every column, left to right.
    pub fn column_positions(&self) -> Vec<f64> {
        let mut x = self.first_column_x();
        self.header
            .columns
            .iter()
            .map(|column| {
                let at = x;
                x = self.column_x(x + column.text_width());
                at
            })
            .collect()
    }

    pub fn next_border_position(&self, y: f64) -> f64 {
        y - self.gap()
    }

    /// Baseline of the next row when the current row's last line sits at `y`.
    pub fn next_row_y(&self, y: f64) -> f64 {
        y - self.line_height() - self.row_border - 2.0 * self.gap()
    }

    /// Total width of all column slots plus the closing gap.
    pub fn content_width(&self) -> f64 {
        let slots: f64 = self
            .header
            .columns
            .iter()
            .map(|c| self.column_border + self.gap() + c.text_width())
            .sum();
        slots + self.gap()
    }

    /// Split the width left over by sized columns equally among the rest.
    pub fn calculate_missing_column_widths(&mut self) {
        let unset = self.header.columns.iter().filter(|c| !c.has_width()).count();
        if unset == 0 {
            return;
        }
        let slot_overhead = self.column_border + self.gap();
        let used: f64 = self
            .header
            .columns
            .iter()
            .filter(|c| c.has_width())
            .map(|c| slot_overhead + c.text_width())
            .sum::<f64>()
            + self.gap();
        let share = (self.style.width() - used) / unset as f64 - slot_overhead;
        if share <= 0.0 {
            log::warn!(
                "table is {:.1}pt too narrow for {} unsized columns",
                -share,
                unset
            );
        }
        let share = share.max(0.0);
        for column in self.header.columns.iter_mut().filter(|c| !c.has_width()) {
            column.width = Some(share);
        }
    }

    /// Size unset columns from the data: the average width of the first
    /// `sample` values, or the label width if that is larger.
    pub fn size_columns_from_rows<C: Canvas + ?Sized>(
        &mut self,
        canvas: &C,
        rows: &[Row],
        sample: usize,
    ) -> Result<()> {
        let sampled = &rows[..sample.min(rows.len())];
        let style = self.style;
        let label_style = self.header.label_style(&style);
        for column in self.header.columns.iter_mut().filter(|c| !c.has_width()) {
            let mut total = 0.0;
            for row in sampled {
                let value = row.get(&column.name).map(String::as_str).unwrap_or("");
                total += canvas.measure_width(style.font, style.font_size, value)?;
            }
            let average = if sampled.is_empty() {
                0.0
            } else {
                total / sampled.len() as f64
            };
            let label =
                canvas.measure_width(label_style.font, label_style.font_size, &column.label)?;
            column.width = Some(average.max(label));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Ready,
    Header,
    Rows,
    Finished,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Phase::Ready => "ready",
            Phase::Header => "header",
            Phase::Rows => "rows",
            Phase::Finished => "finished",
        }
    }
}

/// Writes one table through a [`DocumentWriter`], one step at a time:
/// `begin`, then `write_header` or `skip_header`, then any number of
/// `write_row`, then `finish`. Calling a step out of order is an error.
#[derive(Debug, Clone)]
pub struct TableLayout {
    table: Table,
    phase: Phase,
    drew_row_border: bool,
    /// The cursor sits under the header line (or a fresh page top) rather
    /// than under a data row.
    after_header: bool,
}

impl TableLayout {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            phase: Phase::Ready,
            drew_row_border: false,
            after_header: false,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut Table {
        &mut self.table
    }

    pub fn drew_row_border(&self) -> bool {
        self.drew_row_border
    }

    fn expect(&self, expected: Phase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(LayoutError::TableState {
                expected: expected.as_str(),
                found: self.phase.as_str(),
            })
        }
    }

    /// Write a caption paragraph above the table.
    pub fn write_caption<C: Canvas>(&mut self, w: &mut DocumentWriter<C>, caption: &str) -> Result<()> {
        self.expect(Phase::Ready)?;
        if caption.trim().is_empty() {
            return Ok(());
        }
        let style = ParagraphStyle {
            below_spacing: 0.0,
            ..self.table.style
        };
        w.write_paragraph(&style, caption.trim())?;
        w.set_y(w.y() + self.table.line_height());
        Ok(())
    }

    /// Size missing columns and fix the top border position.
    pub fn begin<C: Canvas>(&mut self, w: &mut DocumentWriter<C>) -> Result<()> {
        self.expect(Phase::Ready)?;
        self.table.calculate_missing_column_widths();
        if w.is_at_end_of_page() {
            w.new_page()?;
        }
        w.ensure_page()?;
        self.table.top_y = w.start_block(&self.table.style);
        self.phase = Phase::Header;
        Ok(())
    }

    pub fn write_header<C: Canvas>(&mut self, w: &mut DocumentWriter<C>) -> Result<()> {
        self.expect(Phase::Header)?;
        let table = &self.table;
        let label_style = table.header.label_style(&table.style);
        let mut y = table.top_y - table.text_base_to_top_border();
        for (column, x) in table.header.columns.iter().zip(table.column_positions()) {
            if !column.label.is_empty() {
                w.draw_text(&label_style, x, y, &column.label)?;
            }
        }

        if table.row_border > 0.0 {
            let border_y = table.next_border_position(y);
            self.draw_row_border(w, border_y)?;
            y = border_y - self.table.text_base_to_top_border();
        } else {
            y -= self.table.text_base_to_top_border();
        }
        w.set_y(y);
        self.after_header = true;
        self.phase = Phase::Rows;
        Ok(())
    }

    /// Start the rows without drawing any labels.
    pub fn skip_header<C: Canvas>(&mut self, w: &mut DocumentWriter<C>) -> Result<()> {
        self.expect(Phase::Header)?;
        w.set_y(self.table.top_y - self.table.text_base_to_top_border());
        self.after_header = true;
        self.phase = Phase::Rows;
        Ok(())
    }

    pub fn write_row<C: Canvas>(&mut self, w: &mut DocumentWriter<C>, row: &Row) -> Result<()> {
        self.expect(Phase::Rows)?;
        self.drew_row_border = false;
        let after_header = std::mem::replace(&mut self.after_header, false);

        let mut cells = Vec::with_capacity(self.table.header.columns.len());
        for column in &self.table.header.columns {
            let lines = match row.get(&column.name) {
                Some(value) => w.wrap_lines(&self.table.style, value, column.text_width())?,
                None => Vec::new(),
            };
            cells.push(lines);
        }
        let max_lines = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let lh = self.table.line_height();

        if w.causes_page_overflow(lh * max_lines as f64) {
            log::debug!("table row of {} lines moves to a new page", max_lines);
            w.set_y(w.y() + self.separator_offset(after_header));
            self.handle_page_overflow(w)?;
        }

        let top = w.y();
        for (lines, x) in cells.iter().zip(self.table.column_positions()) {
            let mut y = top;
            for line in lines {
                if !line.is_empty() {
                    w.draw_text(&self.table.style, x, y, line)?;
                }
                y -= lh;
            }
        }
        let last_baseline = top - lh * (max_lines - 1) as f64;
        w.set_y(self.table.next_row_y(last_baseline));

        if w.is_at_end_of_page() {
            w.set_y(w.y() + self.separator_offset(false));
            self.handle_page_overflow(w)?;
        } else if self.table.row_border > 0.0 {
            let border_y = self.table.next_border_position(last_baseline);
            self.draw_row_border(w, border_y)?;
            self.drew_row_border = true;
        }
        Ok(())
    }

    /// Close the outer and column borders and apply the below-spacing.
    pub fn finish<C: Canvas>(mut self, w: &mut DocumentWriter<C>) -> Result<Table> {
        self.expect(Phase::Rows)?;
        if self.drew_row_border {
            w.set_y(w.y() + self.separator_offset(false));
        }
        self.draw_borders(w, self.drew_row_border)?;
        self.draw_column_borders(w)?;
        w.set_y(w.y() - self.table.style.below_spacing);
        self.phase = Phase::Finished;
        Ok(self.table)
    }

    /// Distance from the cursor back up to the separator under the previous
    /// line. Data rows also reserve the row border; the header line does not.
    fn separator_offset(&self, after_header: bool) -> f64 {
        let base = self.table.text_base_to_top_border();
        if after_header {
            base
        } else {
            base + self.table.row_border
        }
    }

    fn handle_page_overflow<C: Canvas>(&mut self, w: &mut DocumentWriter<C>) -> Result<()> {
        self.draw_borders(w, true)?;
        self.draw_column_borders(w)?;
        w.new_page()?;
        self.table.top_y = w.y();
        w.set_y(self.table.top_y - self.table.text_base_to_top_border());
        self.drew_row_border = false;
        self.after_header = true;
        Ok(())
    }

    fn draw_row_border<C: Canvas>(&self, w: &mut DocumentWriter<C>, y: f64) -> Result<()> {
        let table = &self.table;
        w.draw_line(table.row_border, table.left_x(), y, table.right_x(), y)
    }

    fn draw_borders<C: Canvas>(&self, w: &mut DocumentWriter<C>, suppress_bottom: bool) -> Result<()> {
        let border = self.table.style.border;
        if !border.has_borders() {
            return Ok(());
        }
        let (left, right) = (self.table.left_x(), self.table.right_x());
        let (top, bottom) = (self.table.top_y, w.y());
        if border.top > 0.0 {
            w.draw_line(border.top, left, top, right, top)?;
        }
        if border.right > 0.0 {
            w.draw_line(border.right, right, top, right, bottom)?;
        }
        if border.bottom > 0.0 && !suppress_bottom {
            w.draw_line(border.bottom, left, bottom, right, bottom)?;
        }
        if border.left > 0.0 {
            w.draw_line(border.left, left, top, left, bottom)?;
        }
        Ok(())
    }

    /// Vertical rules between columns, centered in the space before each
    /// column's text.
    fn draw_column_borders<C: Canvas>(&self, w: &mut DocumentWriter<C>) -> Result<()> {
        let table = &self.table;
        if table.column_border <= 0.0 {
            return Ok(());
        }
        let (top, bottom) = (table.top_y, w.y());
        let offset = (table.column_border + table.gap()) / 2.0;
        for x in table.column_positions().into_iter().skip(1) {
            w.draw_line(table.column_border, x - offset, top, x - offset, bottom)?;
        }
        Ok(())
    }
}
