//! Terminal grid widget
//!
//! Implements the virtualized grid contract on top of ratatui text lines:
//! only the rows inside the scroll window are materialized on each render.
//! Column widths are interpreted as character cells in this host.

use crate::error::{Error, Result};
use crate::model::row::{display_value, Row, Value};
use crate::surface::NodeId;
use crate::widget::{ColumnSpec, GridOptions, GridWidget};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

/// Minimum rendered column width.
const MIN_COLUMN_WIDTH: usize = 3;

/// Virtualized table widget rendering into terminal lines.
pub struct TermGrid {
    mount: NodeId,
    rows: Vec<Row>,
    columns: Vec<ColumnSpec>,
    options: GridOptions,
    scroll: usize,
    viewport_rows: usize,
    lines: Vec<Line<'static>>,
    destroyed: bool,
}

impl TermGrid {
    pub fn new(mount: NodeId, rows: Vec<Row>, columns: Vec<ColumnSpec>, options: GridOptions) -> Self {
        Self {
            mount,
            rows,
            columns,
            options,
            scroll: 0,
            viewport_rows: 20,
            lines: Vec::new(),
            destroyed: false,
        }
    }

    /// Lines materialized by the last `render` call.
    pub fn visual_lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let max_scroll = self.rows.len().saturating_sub(1);
        self.scroll = self
            .scroll
            .saturating_add_signed(delta)
            .min(max_scroll);
    }

    /// Tell the grid how many data rows fit in its panel.
    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.viewport_rows = rows.max(1);
    }

    fn live(&self) -> Result<()> {
        if self.destroyed {
            Err(Error::Widget("grid already destroyed".to_string()))
        } else {
            Ok(())
        }
    }

    fn column_widths(&self) -> Vec<usize> {
        let max = (self.options.max_column_width as usize).max(MIN_COLUMN_WIDTH);
        self.columns
            .iter()
            .map(|col| {
                if let Some(width) = col.width {
                    return (width as usize).clamp(MIN_COLUMN_WIDTH, max);
                }
                let mut width = col.name.width();
                for row in &self.rows {
                    if let Some(value) = row.get(&col.field) {
                        width = width.max(display_value(value).width());
                    }
                }
                width.clamp(MIN_COLUMN_WIDTH, max)
            })
            .collect()
    }

    fn cell_style(&self, col: &ColumnSpec, row: &Row) -> Style {
        // Changed preview cells carry a sidecar flag next to the pair.
        if let Some(base) = col.field.strip_suffix(" (proposed)") {
            if flag_set(row, base) {
                return Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD);
            }
        }
        if let Some(base) = col.field.strip_suffix(" (current)") {
            if flag_set(row, base) {
                return Style::default().fg(Color::DarkGray);
            }
        }
        Style::default().fg(Color::White)
    }

    fn build_lines(&self) -> Vec<Line<'static>> {
        if self.columns.is_empty() {
            return vec![Line::from("No results")];
        }

        let widths = self.column_widths();
        let mut lines = Vec::new();

        if self.options.show_header {
            let header_spans: Vec<Span> = self
                .columns
                .iter()
                .enumerate()
                .flat_map(|(i, col)| {
                    vec![
                        Span::styled(
                            pad(&col.name, widths[i]),
                            Style::default()
                                .fg(Color::Cyan)
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::raw(" │ "),
                    ]
                })
                .collect();
            lines.push(Line::from(header_spans));

            let separator: String = widths
                .iter()
                .map(|w| "─".repeat(*w))
                .collect::<Vec<_>>()
                .join("─┼─");
            lines.push(Line::from(Span::styled(
                separator,
                Style::default().fg(Color::DarkGray),
            )));
        }

        // Virtualization: only the scroll window is materialized.
        let end = (self.scroll + self.viewport_rows).min(self.rows.len());
        for row in &self.rows[self.scroll.min(end)..end] {
            let spans: Vec<Span> = self
                .columns
                .iter()
                .enumerate()
                .flat_map(|(i, col)| {
                    let text = row.get(&col.field).map(display_value).unwrap_or_default();
                    vec![
                        Span::styled(pad(&text, widths[i]), self.cell_style(col, row)),
                        Span::raw(" │ "),
                    ]
                })
                .collect();
            lines.push(Line::from(spans));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Total rows: {}", self.rows.len()),
            Style::default().fg(Color::Yellow),
        )));

        lines
    }
}

fn flag_set(row: &Row, base: &str) -> bool {
    matches!(
        row.get(&format!("_{}_changed", base)),
        Some(Value::Bool(true))
    )
}

/// Pad or truncate to a fixed display width.
fn pad(text: &str, width: usize) -> String {
    let text_width = text.width();
    if text_width > width {
        let truncated: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        format!("{}{}", text, " ".repeat(width - text_width))
    }
}

impl GridWidget for TermGrid {
    fn destroy(&mut self) -> Result<()> {
        self.live()?;
        self.destroyed = true;
        self.lines.clear();
        Ok(())
    }

    fn resize_canvas(&mut self) -> Result<()> {
        self.live()
    }

    fn invalidate(&mut self) -> Result<()> {
        self.live()?;
        self.lines.clear();
        Ok(())
    }

    fn invalidate_all_rows(&mut self) -> Result<()> {
        self.live()?;
        self.lines.clear();
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        self.live()?;
        self.lines = self.build_lines();
        Ok(())
    }

    fn set_data(&mut self, rows: &[Row]) -> Result<()> {
        self.live()?;
        self.rows = rows.to_vec();
        self.scroll = 0;
        Ok(())
    }

    fn update_row_count(&mut self) -> Result<()> {
        self.live()
    }

    fn set_columns(&mut self, columns: &[ColumnSpec]) -> Result<()> {
        self.live()?;
        self.columns = columns.to_vec();
        Ok(())
    }

    fn columns(&self) -> Vec<ColumnSpec> {
        self.columns.clone()
    }

    fn mount(&self) -> NodeId {
        self.mount
    }
}
