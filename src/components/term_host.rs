//! Terminal `Host` implementation
//!
//! Maps surface nodes onto panel regions via a `SurfaceArena`, renders
//! markdown and action bars as plain text blocks, and answers the
//! confirmation dialog with a blocking y/n popup.

use crate::components::confirm_dialog::ConfirmDialog;
use crate::components::term_grid::TermGrid;
use crate::error::{Error, Result};
use crate::host::{ActionFeedback, Host};
use crate::model::row::Row;
use crate::preview::PreviewId;
use crate::surface::{NodeId, SurfaceArena};
use crate::tui::Tui;
use crate::widget::{ColumnSpec, GridOptions};
use std::cell::RefCell;
use std::rc::Rc;

const ACTION_BAR_IDLE: &str = "[a] Apply   [c] Cancel";

/// Host adapter for a terminal surface.
pub struct TermHost {
    pub arena: SurfaceArena,
    /// Text blocks rendered into nodes, in insertion order.
    pub blocks: Vec<(NodeId, String)>,
    /// One-line status message for the caller's status bar.
    pub status: Option<String>,
    tui: Option<Rc<RefCell<Tui>>>,
}

impl Default for TermHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TermHost {
    pub fn new() -> Self {
        Self {
            arena: SurfaceArena::new(),
            blocks: Vec::new(),
            status: None,
            tui: None,
        }
    }

    /// Attach the terminal used for blocking confirmation dialogs. Without
    /// one, confirmations auto-accept.
    pub fn with_tui(tui: Rc<RefCell<Tui>>) -> Self {
        let mut host = Self::new();
        host.tui = Some(tui);
        host
    }

    /// Replace (or insert) the text block rendered into `node`.
    fn set_block(&mut self, node: NodeId, text: String) {
        if let Some(entry) = self.blocks.iter_mut().find(|(n, _)| *n == node) {
            entry.1 = text;
        } else {
            self.blocks.push((node, text));
        }
    }

    /// Text blocks rendered into nodes under `ancestor`, in order.
    pub fn blocks_within(&self, ancestor: NodeId) -> Vec<String> {
        self.blocks
            .iter()
            .filter(|(node, _)| self.arena.contains(ancestor, *node))
            .map(|(_, text)| text.clone())
            .collect()
    }
}

impl Host for TermHost {
    type Widget = TermGrid;

    fn construct_grid(
        &mut self,
        mount: NodeId,
        rows: &[Row],
        columns: &[ColumnSpec],
        options: &GridOptions,
    ) -> Result<Self::Widget> {
        if !self.arena.is_attached(mount) {
            return Err(Error::Construction(format!("{} is detached", mount)));
        }
        Ok(TermGrid::new(
            mount,
            rows.to_vec(),
            columns.to_vec(),
            options.clone(),
        ))
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

    fn create_panel_below_row(&mut self, grid_mount: NodeId, _row: usize) -> NodeId {
        // Terminal panels stack vertically; the panel simply follows the
        // summary grid inside the same region.
        self.arena.create_child(grid_mount)
    }

    fn remove_node(&mut self, node: NodeId) {
        self.blocks.retain(|(n, _)| *n != node);
        self.arena.remove(node);
    }

    fn render_markdown(
        &mut self,
        node: NodeId,
        markdown: &str,
        _source_path: Option<&str>,
    ) -> Result<()> {
        self.set_block(node, markdown.to_string());
        Ok(())
    }

    fn show_error(&mut self, node: NodeId, message: &str) {
        self.set_block(node, format!("⚠ {}", message));
    }

    fn render_actions(&mut self, node: NodeId, _preview: PreviewId) -> Result<()> {
        self.set_block(node, ACTION_BAR_IDLE.to_string());
        Ok(())
    }

    fn action_feedback(&mut self, node: NodeId, state: ActionFeedback) {
        let text = match state {
            ActionFeedback::Idle => ACTION_BAR_IDLE.to_string(),
            ActionFeedback::Busy => "Applying…".to_string(),
            ActionFeedback::Failed => "✗ Apply failed".to_string(),
        };
        self.set_block(node, text);
    }

    fn open_document(&mut self, path: &str) -> Result<()> {
        self.status = Some(format!("open {}", path));
        Ok(())
    }

    fn confirm(&mut self, title: &str, message: &str) -> bool {
        match &self.tui {
            Some(tui) => ConfirmDialog::new(title, message).run(&mut tui.borrow_mut()),
            None => true,
        }
    }
}
