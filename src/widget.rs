//! External contract of the virtualized grid widget
//!
//! The grid widget is a third-party component: it materializes only the rows
//! currently visible, which is exactly why the engine has to babysit it when
//! the host's view virtualization hides and re-mounts surfaces. Everything
//! the engine needs from a widget implementation is captured by `GridWidget`.
//!
//! Widget events do not arrive through callbacks; the host forwards them into
//! the engine as explicit `GridEvent` values (see `event`).

use crate::error::Result;
use crate::model::row::Row;
use crate::surface::NodeId;
use serde::{Deserialize, Serialize};

/// One column definition handed to the widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Stable identifier, used as the width-cache key.
    pub id: String,
    /// Header text.
    pub name: String,
    /// Row field the column reads.
    pub field: String,
    /// Explicit pixel width, if the user has sized the column.
    #[serde(default)]
    pub width: Option<u16>,
    #[serde(default = "default_true")]
    pub resizable: bool,
}

fn default_true() -> bool {
    true
}

impl ColumnSpec {
    /// Column whose id, header, and field all share one name.
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            id: field.clone(),
            name: field.clone(),
            field,
            width: None,
            resizable: true,
        }
    }

    pub fn with_width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }
}

/// Rendering options fixed at widget construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridOptions {
    /// Fixed row height in pixels. Also used to recover a row index from a
    /// click's vertical offset when the widget cannot supply a logical index.
    #[serde(default = "GridOptions::default_row_height")]
    pub row_height: u16,
    /// Hard cap on rendered column width.
    #[serde(default = "GridOptions::default_max_column_width")]
    pub max_column_width: u16,
    #[serde(default = "default_true")]
    pub show_header: bool,
}

impl GridOptions {
    fn default_row_height() -> u16 {
        25
    }

    fn default_max_column_width() -> u16 {
        50
    }
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            row_height: Self::default_row_height(),
            max_column_width: Self::default_max_column_width(),
            show_header: true,
        }
    }
}

/// What the engine requires of a virtualized grid widget implementation.
///
/// Every method may fail: the widget lives on a surface the host can tear
/// down at any time. Failures from rendering calls route the instance through
/// the recreation path rather than surfacing to the user.
pub trait GridWidget {
    /// Tear the widget down and release its mount.
    fn destroy(&mut self) -> Result<()>;

    /// Recompute the canvas size from the mount's current geometry.
    fn resize_canvas(&mut self) -> Result<()>;

    /// Invalidate currently materialized rows.
    fn invalidate(&mut self) -> Result<()>;

    /// Invalidate every row, forcing the next render to rebuild all of them.
    fn invalidate_all_rows(&mut self) -> Result<()>;

    /// Redraw invalidated rows.
    fn render(&mut self) -> Result<()>;

    /// Replace the backing row data.
    fn set_data(&mut self, rows: &[Row]) -> Result<()>;

    /// Tell the widget the row count changed after `set_data`.
    fn update_row_count(&mut self) -> Result<()>;

    /// Replace the column definitions.
    fn set_columns(&mut self, columns: &[ColumnSpec]) -> Result<()>;

    /// Current column definitions, including any user-resized widths.
    fn columns(&self) -> Vec<ColumnSpec>;

    /// The surface node the widget is mounted into.
    fn mount(&self) -> NodeId;
}
