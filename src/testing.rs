//! Test doubles for the host and widget boundaries
//!
//! `MockGrid` records every call made against it and can be told to fail
//! specific operations; `MockHost` records everything the engine asks the
//! host to do. Both are only compiled for tests.

use crate::error::{Error, Result};
use crate::host::{ActionFeedback, Host};
use crate::model::row::Row;
use crate::preview::PreviewId;
use crate::surface::{NodeId, SurfaceArena};
use crate::widget::{ColumnSpec, GridOptions, GridWidget};

/// One recorded widget call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridCall {
    Destroy,
    ResizeCanvas,
    Invalidate,
    InvalidateAllRows,
    Render,
    SetData,
    UpdateRowCount,
    SetColumns,
}

/// Scriptable in-memory grid widget.
pub struct MockGrid {
    pub mount: NodeId,
    pub rows: Vec<Row>,
    pub columns: Vec<ColumnSpec>,
    pub calls: Vec<GridCall>,
    pub fail_render: bool,
    pub fail_destroy: bool,
    pub destroyed: bool,
}

impl MockGrid {
    pub fn new(mount: NodeId) -> Self {
        Self {
            mount,
            rows: Vec::new(),
            columns: Vec::new(),
            calls: Vec::new(),
            fail_render: false,
            fail_destroy: false,
            destroyed: false,
        }
    }

    /// Calls recorded since the last check, most recent last.
    pub fn calls_of(&self, call: GridCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    fn live(&self) -> Result<()> {
        if self.destroyed {
            Err(Error::Widget("widget already destroyed".to_string()))
        } else {
            Ok(())
        }
    }
}

impl GridWidget for MockGrid {
    fn destroy(&mut self) -> Result<()> {
        self.calls.push(GridCall::Destroy);
        if self.fail_destroy {
            return Err(Error::Widget("destroy failed".to_string()));
        }
        self.destroyed = true;
        Ok(())
    }

    fn resize_canvas(&mut self) -> Result<()> {
        self.calls.push(GridCall::ResizeCanvas);
        self.live()
    }

    fn invalidate(&mut self) -> Result<()> {
        self.calls.push(GridCall::Invalidate);
        self.live()
    }

    fn invalidate_all_rows(&mut self) -> Result<()> {
        self.calls.push(GridCall::InvalidateAllRows);
        self.live()
    }

    fn render(&mut self) -> Result<()> {
        self.calls.push(GridCall::Render);
        self.live()?;
        if self.fail_render {
            return Err(Error::Widget("render failed".to_string()));
        }
        Ok(())
    }

    fn set_data(&mut self, rows: &[Row]) -> Result<()> {
        self.calls.push(GridCall::SetData);
        self.live()?;
        self.rows = rows.to_vec();
        Ok(())
    }

    fn update_row_count(&mut self) -> Result<()> {
        self.calls.push(GridCall::UpdateRowCount);
        self.live()
    }

    fn set_columns(&mut self, columns: &[ColumnSpec]) -> Result<()> {
        self.calls.push(GridCall::SetColumns);
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

/// Recording host with a real surface arena.
pub struct MockHost {
    pub arena: SurfaceArena,
    pub constructed: usize,
    pub fail_construct: bool,
    pub errors: Vec<(NodeId, String)>,
    pub markdown: Vec<(NodeId, String)>,
    pub actions: Vec<(NodeId, PreviewId)>,
    pub feedback: Vec<(NodeId, ActionFeedback)>,
    pub panels: Vec<(NodeId, usize)>,
    pub removed: Vec<NodeId>,
    pub opened: Vec<String>,
    pub confirms: Vec<String>,
    pub confirm_response: bool,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            arena: SurfaceArena::new(),
            constructed: 0,
            fail_construct: false,
            errors: Vec::new(),
            markdown: Vec::new(),
            actions: Vec::new(),
            feedback: Vec::new(),
            panels: Vec::new(),
            removed: Vec::new(),
            opened: Vec::new(),
            confirms: Vec::new(),
            confirm_response: true,
        }
    }
}

impl Host for MockHost {
    type Widget = MockGrid;

    fn construct_grid(
        &mut self,
        mount: NodeId,
        rows: &[Row],
        columns: &[ColumnSpec],
        _options: &GridOptions,
    ) -> Result<Self::Widget> {
        if self.fail_construct {
            return Err(Error::Construction("scripted failure".to_string()));
        }
        self.constructed += 1;
        let mut widget = MockGrid::new(mount);
        widget.rows = rows.to_vec();
        widget.columns = columns.to_vec();
        Ok(widget)
    }

    fn is_attached(&self, node: NodeId) -> bool {
        self.arena.is_attached(node)
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.arena.contains(ancestor, node)
    }

    fn create_child(&mut self, parent: NodeId) -> NodeId {
        self.arena.create_child(parent)
    }

    fn create_panel_below_row(&mut self, grid_mount: NodeId, row: usize) -> NodeId {
        let node = self.arena.create_child(grid_mount);
        self.panels.push((node, row));
        node
    }

    fn remove_node(&mut self, node: NodeId) {
        self.removed.push(node);
        self.arena.remove(node);
    }

    fn render_markdown(
        &mut self,
        node: NodeId,
        markdown: &str,
        _source_path: Option<&str>,
    ) -> Result<()> {
        self.markdown.push((node, markdown.to_string()));
        Ok(())
    }

    fn show_error(&mut self, node: NodeId, message: &str) {
        self.errors.push((node, message.to_string()));
    }

    fn render_actions(&mut self, node: NodeId, preview: PreviewId) -> Result<()> {
        self.actions.push((node, preview));
        Ok(())
    }

    fn action_feedback(&mut self, node: NodeId, state: ActionFeedback) {
        self.feedback.push((node, state));
    }

    fn open_document(&mut self, path: &str) -> Result<()> {
        self.opened.push(path.to_string());
        Ok(())
    }

    fn confirm(&mut self, _title: &str, message: &str) -> bool {
        self.confirms.push(message.to_string());
        self.confirm_response
    }
}
