//! Host application boundary
//!
//! The engine is embedded inside a document-editing application. Everything
//! it needs from that application - building widgets, surface-tree queries,
//! markdown rendering, opening documents, the confirmation dialog - goes
//! through this trait. The dialog's own modal mechanics are the host's
//! business; the engine only consumes the boolean outcome.

use crate::error::Result;
use crate::model::row::Row;
use crate::preview::PreviewId;
use crate::surface::NodeId;
use crate::widget::{ColumnSpec, GridOptions, GridWidget};

/// Visual state of a preview's action controls.
///
/// An apply that fails shows `Failed` briefly and is then reverted to `Idle`
/// by a scheduled task; the surrounding render is never torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionFeedback {
    Idle,
    Busy,
    Failed,
}

/// Services the embedding application provides to the engine.
pub trait Host {
    /// Concrete grid widget implementation this host constructs.
    type Widget: GridWidget;

    /// Build a widget bound to `mount`. A failure here is a construction
    /// failure: the engine reports it inline in place of the grid.
    fn construct_grid(
        &mut self,
        mount: NodeId,
        rows: &[Row],
        columns: &[ColumnSpec],
        options: &GridOptions,
    ) -> Result<Self::Widget>;

    /// Whether the node is still part of the live surface tree.
    fn is_attached(&self, node: NodeId) -> bool;

    /// Whether `ancestor` contains `node` (inclusive).
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    /// Create a child node for a preview section.
    fn create_child(&mut self, parent: NodeId) -> NodeId;

    /// Create a panel node inserted immediately after the given row of a
    /// grid, for click-to-expand details.
    fn create_panel_below_row(&mut self, grid_mount: NodeId, row: usize) -> NodeId;

    /// Remove a node the engine created.
    fn remove_node(&mut self, node: NodeId);

    /// Render markdown into a node. `source_path` resolves relative links.
    fn render_markdown(
        &mut self,
        node: NodeId,
        markdown: &str,
        source_path: Option<&str>,
    ) -> Result<()>;

    /// Show an error message in place of a grid that could not be built.
    fn show_error(&mut self, node: NodeId, message: &str);

    /// Render apply/cancel controls for a preview into `node`. Activation
    /// calls back into `GridEngine::apply_preview` / `cancel_preview`.
    fn render_actions(&mut self, node: NodeId, preview: PreviewId) -> Result<()>;

    /// Update the visual state of a preview's action controls.
    fn action_feedback(&mut self, node: NodeId, state: ActionFeedback);

    /// Open a document by path, e.g. when a path cell is clicked.
    fn open_document(&mut self, path: &str) -> Result<()>;

    /// Ask the user to confirm a mutation. Blocking from the engine's point
    /// of view; returns the outcome.
    fn confirm(&mut self, title: &str, message: &str) -> bool;
}
