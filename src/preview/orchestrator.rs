//! Preview orchestration
//!
//! Composes the preview row builder with the instance registry to render a
//! full mutation preview: the read-only statement, the preview grid, a
//! summary line, and apply/cancel controls that gate the mutation behind the
//! host's confirmation dialog. Multi-statement batches render one expandable
//! summary row per nested operation.

use crate::diff::count_changed_fields;
use crate::engine::{derive_display_columns, GridEngine, ACTION_RESET_DELAY};
use crate::grid::registry::{GridInstance, InstanceContext, InstanceId, InstanceState};
use crate::grid::widths::query_fingerprint;
use crate::host::{ActionFeedback, Host};
use crate::model::operation::{OperationDescriptor, OperationKind};
use crate::model::preview::{PreviewRow, PATH_COLUMN};
use crate::model::query::QueryDescriptor;
use crate::model::row::{Row, Value};
use crate::preview::builder::build_preview_rows;
use crate::preview::PreviewId;
use crate::scheduler::Task;
use crate::surface::NodeId;
use crate::widget::{GridOptions, GridWidget};
use std::time::Instant;
use tracing::{debug, warn};

/// Callback executing the pending mutation once the user confirms.
pub type ApplyFn = Box<dyn FnMut(&OperationDescriptor) -> crate::Result<()>>;

/// Context for rendering a mutation preview.
pub struct PreviewContext {
    /// Node the preview pane renders into.
    pub mount: NodeId,
    /// Columns the external relevance classifier kept.
    pub relevant_columns: Vec<String>,
    /// Path of the document the preview belongs to.
    pub source_path: Option<String>,
    pub on_apply: ApplyFn,
    pub on_cancel: Option<Box<dyn FnMut()>>,
}

/// A currently expanded detail panel inside a batch preview.
pub(crate) struct OpenDetail {
    pub row: usize,
    pub node: NodeId,
    pub grid: Option<InstanceId>,
}

/// One open preview pane and everything it rendered.
pub(crate) struct PreviewPane {
    pub op: OperationDescriptor,
    pub rows: Vec<PreviewRow>,
    pub grid: Option<InstanceId>,
    pub grid_node: Option<NodeId>,
    pub actions_node: Option<NodeId>,
    /// Every node this pane created, removed on close.
    pub created_nodes: Vec<NodeId>,
    pub relevant: Vec<String>,
    pub source_path: Option<String>,
    pub on_apply: ApplyFn,
    pub on_cancel: Option<Box<dyn FnMut()>>,
    pub open_detail: Option<OpenDetail>,
}

impl<H: Host> GridEngine<H> {
    /// Render a mutation preview pane into `ctx.mount`.
    ///
    /// Renders, in order: the statement display, the preview grid, a summary
    /// line, and apply/cancel controls. Controls are omitted entirely when
    /// there is nothing to apply (zero preview rows, which covers an update
    /// whose change set is empty).
    pub fn render_preview(
        &mut self,
        op: OperationDescriptor,
        ctx: PreviewContext,
    ) -> crate::Result<PreviewId> {
        let rows = build_preview_rows(&op, &ctx.relevant_columns);
        let changed_fields = match op.kind {
            OperationKind::Update => {
                count_changed_fields(&op.before, &op.after, &ctx.relevant_columns)
            }
            _ => 0,
        };

        self.next_preview_id += 1;
        let id = PreviewId(self.next_preview_id);
        let mut created_nodes = Vec::new();

        // Read-only statement display.
        let statement_node = self.host.create_child(ctx.mount);
        created_nodes.push(statement_node);
        self.host.render_markdown(
            statement_node,
            &statement_markdown(&op),
            ctx.source_path.as_deref(),
        )?;

        // Preview grid, when there is anything to show.
        let mut grid = None;
        let mut grid_node = None;
        if !rows.is_empty() {
            let node = self.host.create_child(ctx.mount);
            created_nodes.push(node);
            grid = self.mount_preview_grid(node, &op, &rows, ctx.source_path.as_deref());
            grid_node = Some(node);
        }

        // Summary line worded by kind and counts.
        let summary_node = self.host.create_child(ctx.mount);
        created_nodes.push(summary_node);
        self.host.render_markdown(
            summary_node,
            &summary_text(&op, rows.len(), changed_fields),
            ctx.source_path.as_deref(),
        )?;

        // Action controls only when there is something to apply.
        let mut actions_node = None;
        if !rows.is_empty() {
            let node = self.host.create_child(ctx.mount);
            created_nodes.push(node);
            self.host.render_actions(node, id)?;
            actions_node = Some(node);
        }

        self.previews.insert(
            id,
            PreviewPane {
                op,
                rows,
                grid,
                grid_node,
                actions_node,
                created_nodes,
                relevant: ctx.relevant_columns,
                source_path: ctx.source_path,
                on_apply: ctx.on_apply,
                on_cancel: ctx.on_cancel,
                open_detail: None,
            },
        );
        Ok(id)
    }

    /// Apply a previewed mutation after the host's confirmation dialog.
    /// Returns whether the mutation was applied. A failed apply shows a
    /// transient failure indication and leaves the pane open.
    pub fn apply_preview(&mut self, id: PreviewId) -> bool {
        let Some(pane) = self.previews.get_mut(&id) else {
            return false;
        };

        let message = confirm_message(&pane.op);
        if !self.host.confirm("Apply changes?", &message) {
            return false;
        }

        if let Some(node) = pane.actions_node {
            self.host.action_feedback(node, ActionFeedback::Busy);
        }

        match (pane.on_apply)(&pane.op) {
            Ok(()) => {
                if let Some(node) = pane.actions_node {
                    self.host.action_feedback(node, ActionFeedback::Idle);
                }
                self.close_preview(id);
                true
            }
            Err(err) => {
                warn!(preview = %id, %err, "apply failed");
                if let Some(node) = pane.actions_node {
                    self.host.action_feedback(node, ActionFeedback::Failed);
                    self.scheduler.schedule_after(
                        Instant::now(),
                        ACTION_RESET_DELAY,
                        Task::ResetActionFeedback { preview: id },
                    );
                }
                false
            }
        }
    }

    /// Dismiss a preview without applying.
    pub fn cancel_preview(&mut self, id: PreviewId) {
        if let Some(pane) = self.previews.get_mut(&id) {
            if let Some(on_cancel) = pane.on_cancel.as_mut() {
                on_cancel();
            }
        }
        self.close_preview(id);
    }

    /// Tear down a pane: detail panel, preview grids, and created nodes.
    pub(crate) fn close_preview(&mut self, id: PreviewId) {
        let Some(pane) = self.previews.remove(&id) else {
            return;
        };
        if let Some(detail) = pane.open_detail {
            if let Some(grid) = detail.grid {
                self.registry.destroy(grid);
            }
            self.host.remove_node(detail.node);
        }
        if let Some(grid) = pane.grid {
            self.registry.destroy(grid);
        }
        for node in pane.created_nodes {
            self.host.remove_node(node);
        }
    }

    /// Route a click on any grid. Batch preview grids expand their clicked
    /// summary row; regular grids open the document behind a path cell.
    pub(crate) fn handle_click(
        &mut self,
        instance: InstanceId,
        row: Option<usize>,
        column: Option<String>,
        y_offset: Option<u16>,
    ) {
        let row_height = self
            .registry
            .get(instance)
            .map(|inst| inst.options.row_height.max(1))
            .unwrap_or(1);
        // Logical index when the widget exposes one; otherwise recover it
        // from the click's pixel offset and the fixed row height.
        let Some(index) = row.or_else(|| y_offset.map(|y| (y / row_height) as usize)) else {
            return;
        };

        if let Some(preview) = self.find_batch_preview(instance) {
            self.toggle_detail(preview, index);
            return;
        }

        if column.as_deref() == Some(PATH_COLUMN) {
            let path = self.registry.get(instance).and_then(|inst| {
                match inst.rows.get(index).and_then(|r| r.get(PATH_COLUMN)) {
                    Some(Value::String(path)) => Some(path.clone()),
                    _ => None,
                }
            });
            if let Some(path) = path {
                if let Err(err) = self.host.open_document(&path) {
                    warn!(%path, %err, "failed to open document");
                }
            }
        }
    }

    fn find_batch_preview(&self, instance: InstanceId) -> Option<PreviewId> {
        self.previews.iter().find_map(|(id, pane)| {
            (pane.grid == Some(instance) && pane.op.kind == OperationKind::Multi).then_some(*id)
        })
    }

    /// Toggle the detail panel for one summary row of a batch preview,
    /// closing any other open panel first.
    fn toggle_detail(&mut self, id: PreviewId, row_index: usize) {
        let (grid_node, nested, relevant, source_path, open) = {
            let Some(pane) = self.previews.get_mut(&id) else {
                return;
            };
            let Some(grid_node) = pane.grid_node else {
                return;
            };
            let Some(nested) = pane.rows.get(row_index).and_then(|row| row.nested.clone())
            else {
                return;
            };
            (
                grid_node,
                *nested,
                pane.relevant.clone(),
                pane.source_path.clone(),
                pane.open_detail.take(),
            )
        };

        if let Some(open) = open {
            if let Some(grid) = open.grid {
                self.registry.destroy(grid);
            }
            self.host.remove_node(open.node);
            if open.row == row_index {
                return;
            }
        }

        let node = self.host.create_panel_below_row(grid_node, row_index);
        let detail_rows = build_preview_rows(&nested, &relevant);
        let grid = self.mount_preview_grid(node, &nested, &detail_rows, source_path.as_deref());

        if let Some(pane) = self.previews.get_mut(&id) {
            pane.open_detail = Some(OpenDetail {
                row: row_index,
                node,
                grid,
            });
        }
    }

    /// Build and register a grid for preview rows. Returns `None` (with the
    /// error shown inline) when the widget cannot be constructed, or when
    /// there is nothing to display.
    fn mount_preview_grid(
        &mut self,
        node: NodeId,
        op: &OperationDescriptor,
        rows: &[PreviewRow],
        source_path: Option<&str>,
    ) -> Option<InstanceId> {
        if rows.is_empty() {
            return None;
        }

        let data: Vec<Row> = rows.iter().map(|row| row.cells.clone()).collect();
        let mut columns = derive_display_columns(rows.iter().map(|row| &row.cells));
        let query = QueryDescriptor::new(preview_query_text(op));
        self.widths
            .apply(query_fingerprint(&query.text), &mut columns);
        let options = GridOptions::default();

        match self.host.construct_grid(node, &data, &columns, &options) {
            Ok(widget) => {
                let mut instance = GridInstance {
                    widget,
                    mount: node,
                    observed: false,
                    rows: data,
                    columns,
                    options,
                    context: InstanceContext {
                        query,
                        source_path: source_path.map(str::to_string),
                        on_refresh: None,
                    },
                    state: InstanceState::Mounted,
                    pending_resize: None,
                };
                let painted = instance
                    .widget
                    .resize_canvas()
                    .and_then(|_| instance.widget.render());
                if let Err(err) = painted {
                    debug!(%err, "preview grid initial paint failed");
                }
                Some(self.registry.insert(instance))
            }
            Err(err) => {
                warn!(%err, "preview grid construction failed");
                self.host
                    .show_error(node, &format!("Failed to render preview: {}", err));
                None
            }
        }
    }
}

/// Markdown code block showing the statements that will execute.
fn statement_markdown(op: &OperationDescriptor) -> String {
    let mut statements: Vec<&str> = op.statements.iter().map(|s| s.sql.as_str()).collect();
    if statements.is_empty() {
        for nested in &op.nested {
            statements.extend(nested.statements.iter().map(|s| s.sql.as_str()));
        }
    }
    format!("```sql\n{}\n```", statements.join("\n"))
}

/// Query text standing in for a preview grid in the width cache.
fn preview_query_text(op: &OperationDescriptor) -> String {
    if op.statements.is_empty() {
        format!("{} {}", op.kind.verb(), op.table)
    } else {
        op.statements
            .iter()
            .map(|s| s.sql.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Natural-language summary of what applying will do.
fn summary_text(op: &OperationDescriptor, preview_rows: usize, changed_fields: usize) -> String {
    if preview_rows == 0 {
        return "No changes to apply.".to_string();
    }
    match op.kind {
        OperationKind::Insert => {
            let n = op.after.len();
            format!("This will insert {} row{} into `{}`.", n, plural(n), op.table)
        }
        OperationKind::Delete => {
            let n = op.before.len();
            format!("This will delete {} row{} from `{}`.", n, plural(n), op.table)
        }
        OperationKind::Update => format!(
            "This will update {} field{} across {} row{} in `{}`.",
            changed_fields,
            plural(changed_fields),
            preview_rows,
            plural(preview_rows),
            op.table
        ),
        OperationKind::Multi => {
            let n = op.nested.len();
            format!("This will run {} operation{} as one batch.", n, plural(n))
        }
    }
}

/// Confirmation prompt shown before the mutation executes.
fn confirm_message(op: &OperationDescriptor) -> String {
    match op.kind {
        OperationKind::Insert => {
            let n = op.after.len();
            format!("Insert {} row{} into `{}`?", n, plural(n), op.table)
        }
        OperationKind::Delete => {
            let n = op.before.len();
            format!("Delete {} row{} from `{}`?", n, plural(n), op.table)
        }
        OperationKind::Update => {
            let n = op.row_count();
            format!("Update {} row{} in `{}`?", n, plural(n), op.table)
        }
        OperationKind::Multi => {
            let n = op.nested.len();
            format!("Run {} operation{} as one batch?", n, plural(n))
        }
    }
}
