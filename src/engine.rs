//! Root engine - coordinates every live grid instance
//!
//! `GridEngine` is the single owned context for everything the crate keeps
//! alive: the instance registry, the column width cache, the refresh
//! callback registry, the task scheduler, and any open preview panes. The
//! embedding host forwards events in and drives `tick` once per frame; all
//! state changes happen on that one thread.
//!
//! App-level coordination only - the diff and preview row logic lives in
//! `diff` and `preview`.

use crate::event::{GridEvent, SurfaceEvent};
use crate::grid::refresh::{RefreshFn, RefreshRegistry};
use crate::grid::registry::{
    GridInstance, InstanceContext, InstanceId, InstanceRegistry, InstanceState,
};
use crate::grid::widths::{query_fingerprint, ColumnWidthCache};
use crate::host::Host;
use crate::model::query::QueryDescriptor;
use crate::model::row::{Row, Value};
use crate::preview::orchestrator::PreviewPane;
use crate::preview::PreviewId;
use crate::scheduler::{FrameScheduler, RenderPass, Task, TaskId};
use crate::surface::NodeId;
use crate::widget::{ColumnSpec, GridOptions, GridWidget};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long to wait after recreating a widget before reasserting its column
/// definitions, so the host can settle the mount's geometry first.
pub(crate) const RECREATE_SETTLE_DELAY: Duration = Duration::from_millis(120);

/// How long a failed apply shows its failure indication before reverting.
pub(crate) const ACTION_RESET_DELAY: Duration = Duration::from_millis(1500);

/// One render request from the host.
pub struct RenderContext {
    /// Query result rows to display.
    pub rows: Vec<Row>,
    /// Parsed-query descriptor from the external parser.
    pub query: QueryDescriptor,
    /// Surface node to mount the grid into.
    pub mount: NodeId,
    /// Explicit column definitions; derived from the rows when absent.
    pub columns: Option<Vec<ColumnSpec>>,
    /// Rendering options; defaults apply when absent.
    pub options: Option<GridOptions>,
    /// Path of the document the query is embedded in.
    pub source_path: Option<String>,
    /// Re-runs the query and re-renders when underlying data changes.
    pub on_refresh: Option<RefreshFn>,
}

impl RenderContext {
    pub fn new(rows: Vec<Row>, query: QueryDescriptor, mount: NodeId) -> Self {
        Self {
            rows,
            query,
            mount,
            columns: None,
            options: None,
            source_path: None,
            on_refresh: None,
        }
    }
}

/// Owner of all live grid state. See module docs.
pub struct GridEngine<H: Host> {
    pub(crate) host: H,
    pub(crate) registry: InstanceRegistry<H::Widget>,
    pub(crate) widths: ColumnWidthCache,
    pub(crate) refresh: RefreshRegistry,
    pub(crate) scheduler: FrameScheduler,
    pub(crate) previews: HashMap<PreviewId, PreviewPane>,
    pub(crate) next_preview_id: u64,
    pending_resize_all: Option<TaskId>,
}

impl<H: Host> GridEngine<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            registry: InstanceRegistry::new(),
            widths: ColumnWidthCache::new(),
            refresh: RefreshRegistry::new(),
            scheduler: FrameScheduler::new(),
            previews: HashMap::new(),
            next_preview_id: 0,
            pending_resize_all: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    // ─────────────────────────────────────────────────────────────────────
    // Introspection
    // ─────────────────────────────────────────────────────────────────────

    pub fn count(&self) -> usize {
        self.registry.count()
    }

    pub fn is_active(&self, id: InstanceId) -> bool {
        self.registry.is_active(id)
    }

    pub fn widget(&self, id: InstanceId) -> Option<&H::Widget> {
        self.registry.get(id).map(|instance| &instance.widget)
    }

    pub fn widget_mut(&mut self, id: InstanceId) -> Option<&mut H::Widget> {
        self.registry.get_mut(id).map(|instance| &mut instance.widget)
    }

    /// Snapshot of all live instance ids.
    pub fn instance_ids(&self) -> Vec<InstanceId> {
        self.registry.ids()
    }

    /// The node an instance is mounted into.
    pub fn instance_mount(&self, id: InstanceId) -> Option<NodeId> {
        self.registry.get(id).map(|instance| instance.mount)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────

    /// Render a query result grid into `ctx.mount`.
    ///
    /// At most one instance lives per container: anything already mounted
    /// inside the target is torn down first. A widget construction failure
    /// is reported inline in place of the grid and yields `Ok(None)`.
    pub fn render(&mut self, ctx: RenderContext) -> crate::Result<Option<InstanceId>> {
        self.destroy_within(ctx.mount);

        let options = ctx.options.unwrap_or_default();
        let mut columns = ctx
            .columns
            .unwrap_or_else(|| derive_columns(ctx.rows.iter()));
        let fingerprint = query_fingerprint(&ctx.query.text);
        self.widths.apply(fingerprint, &mut columns);

        let widget = match self
            .host
            .construct_grid(ctx.mount, &ctx.rows, &columns, &options)
        {
            Ok(widget) => widget,
            Err(err) => {
                warn!(%err, "grid construction failed");
                self.host
                    .show_error(ctx.mount, &format!("Failed to render results: {}", err));
                return Ok(None);
            }
        };

        let instance = GridInstance {
            widget,
            mount: ctx.mount,
            observed: true,
            rows: ctx.rows,
            columns,
            options,
            context: InstanceContext {
                query: ctx.query,
                source_path: ctx.source_path,
                on_refresh: ctx.on_refresh,
            },
            state: InstanceState::Mounted,
            pending_resize: None,
        };
        let id = self.registry.insert(instance);

        // First paint. A failure here means the host already tore the mount
        // down; the next visibility transition routes through recreation.
        if let Some(instance) = self.registry.get_mut(id) {
            let painted = instance
                .widget
                .resize_canvas()
                .and_then(|_| instance.widget.render());
            if let Err(err) = painted {
                debug!(instance = %id, %err, "initial paint failed");
            }
        }

        Ok(Some(id))
    }

    /// Destroy a single instance. Safe to call with a stale id.
    pub fn destroy(&mut self, id: InstanceId) -> bool {
        self.registry.destroy(id)
    }

    /// Tear down every instance mounted at or inside `container`.
    fn destroy_within(&mut self, container: NodeId) {
        for id in self.registry.ids() {
            let Some(instance) = self.registry.get(id) else {
                continue;
            };
            if self.host.contains(container, instance.mount) {
                self.registry.destroy(id);
            }
        }
    }

    /// Drain every live instance, preview pane, cache, and pending task.
    pub fn cleanup(&mut self) {
        let preview_ids: Vec<PreviewId> = self.previews.keys().copied().collect();
        for id in preview_ids {
            self.close_preview(id);
        }
        for id in self.registry.ids() {
            self.registry.destroy(id);
        }
        self.widths.clear();
        self.refresh.clear();
        self.scheduler.clear();
        self.pending_resize_all = None;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────

    pub fn handle_surface_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::VisibilityChanged {
                instance,
                intersecting,
            } => self.handle_visibility(instance, intersecting),
            SurfaceEvent::ContainerDetached { node } => self.destroy_within(node),
        }
    }

    pub fn handle_grid_event(&mut self, id: InstanceId, event: GridEvent) {
        match event {
            GridEvent::ColumnsResized | GridEvent::BeforeDestroy => self.save_column_widths(id),
            GridEvent::Click {
                row,
                column,
                y_offset,
            } => self.handle_click(id, row, column, y_offset),
            GridEvent::Scroll => {}
        }
    }

    fn handle_visibility(&mut self, id: InstanceId, intersecting: bool) {
        let Some(instance) = self.registry.get_mut(id) else {
            return;
        };
        if !instance.observed {
            return;
        }

        if !intersecting {
            if instance.state == InstanceState::Mounted {
                instance.state = InstanceState::Hidden;
            }
            return;
        }

        if instance.state == InstanceState::Hidden {
            instance.state = InstanceState::Mounted;
            // Each transition schedules its own two-pass sequence;
            // overlapping sequences are idempotent, not debounced.
            self.scheduler.schedule_frame(Task::Rerender {
                instance: id,
                pass: RenderPass::Visible,
            });
        }
    }

    fn save_column_widths(&mut self, id: InstanceId) {
        let Some(instance) = self.registry.get(id) else {
            return;
        };
        let fingerprint = query_fingerprint(&instance.context.query.text);
        let columns = instance.widget.columns();
        self.widths.save(fingerprint, &columns);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Resize debouncing
    // ─────────────────────────────────────────────────────────────────────

    /// Request a canvas resize for one instance, or all of them. Repeated
    /// requests within a frame coalesce: the pending task is cancelled and
    /// replaced, so at most one resize executes per target per frame.
    pub fn resize(&mut self, target: Option<InstanceId>) {
        match target {
            Some(id) => {
                if !self.registry.is_active(id) {
                    return;
                }
                if let Some(pending) = self
                    .registry
                    .get_mut(id)
                    .and_then(|instance| instance.pending_resize.take())
                {
                    self.scheduler.cancel(pending);
                }
                let task = self.scheduler.schedule_frame(Task::Resize { target: Some(id) });
                if let Some(instance) = self.registry.get_mut(id) {
                    instance.pending_resize = Some(task);
                }
            }
            None => {
                if let Some(pending) = self.pending_resize_all.take() {
                    self.scheduler.cancel(pending);
                }
                self.pending_resize_all =
                    Some(self.scheduler.schedule_frame(Task::Resize { target: None }));
            }
        }
    }

    fn run_resize(&mut self, target: Option<InstanceId>) {
        match target {
            Some(id) => {
                let Some(instance) = self.registry.get_mut(id) else {
                    return;
                };
                instance.pending_resize = None;
                if let Err(err) = instance.widget.resize_canvas() {
                    warn!(instance = %id, %err, "resize failed");
                }
            }
            None => {
                self.pending_resize_all = None;
                for id in self.registry.ids() {
                    let Some(instance) = self.registry.get_mut(id) else {
                        continue;
                    };
                    // The all-instances pass supersedes individual requests.
                    if let Some(pending) = instance.pending_resize.take() {
                        self.scheduler.cancel(pending);
                    }
                    if let Err(err) = instance.widget.resize_canvas() {
                        warn!(instance = %id, %err, "resize failed");
                    }
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Refresh broadcasting
    // ─────────────────────────────────────────────────────────────────────

    /// Invoke every live instance's refresh callback plus every registered
    /// external callback. Individual failures are logged and isolated.
    ///
    /// With a `changed_paths` hint, instances whose query is scoped to the
    /// document they live in are skipped when that document is not in the
    /// hint set - re-running the query would produce identical results.
    pub fn refresh_all(&mut self, changed_paths: Option<&HashSet<String>>) {
        for id in self.registry.ids() {
            let Some(instance) = self.registry.get_mut(id) else {
                continue;
            };
            if let Some(paths) = changed_paths {
                if instance.context.query.scoped_to_current_document {
                    if let Some(path) = instance.context.source_path.as_deref() {
                        if !paths.contains(path) {
                            continue;
                        }
                    }
                }
            }
            if let Some(on_refresh) = instance.context.on_refresh.as_mut() {
                if let Err(err) = on_refresh() {
                    warn!(instance = %id, %err, "instance refresh failed");
                }
            }
        }

        for key in self.refresh.ids() {
            let Some(node) = self.refresh.get_mut(&key).map(|entry| entry.node) else {
                continue;
            };
            if !self.host.is_attached(node) {
                // Stale registration: the surface it belonged to is gone.
                self.refresh.remove(&key);
                continue;
            }
            if let Some(entry) = self.refresh.get_mut(&key) {
                if let Err(err) = (entry.callback)() {
                    warn!(callback = %key, %err, "registered refresh failed");
                }
            }
        }
    }

    /// Register an external refresh callback keyed by `id`, replacing any
    /// prior registration under the same key.
    pub fn register_refresh_callback(
        &mut self,
        id: impl Into<String>,
        node: NodeId,
        callback: RefreshFn,
    ) {
        self.refresh.register(id, node, callback);
    }

    pub fn unregister_refresh_callback(&mut self, id: &str) -> bool {
        self.refresh.unregister(id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scheduled work
    // ─────────────────────────────────────────────────────────────────────

    /// Run everything that has become due. The host calls this once per
    /// frame; tasks scheduled while running land in the next frame.
    pub fn tick(&mut self, now: Instant) {
        for task in self.scheduler.take_due(now) {
            self.run_task(task);
        }
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::Rerender { instance, pass } => self.run_rerender_pass(instance, pass),
            Task::Resize { target } => self.run_resize(target),
            Task::SettleRecreate { instance } => self.run_settle(instance),
            Task::ResetActionFeedback { preview } => self.reset_action_feedback(preview),
        }
    }

    fn run_rerender_pass(&mut self, id: InstanceId, pass: RenderPass) {
        let Some(instance) = self.registry.get_mut(id) else {
            return;
        };
        if instance.state == InstanceState::Recreating {
            return;
        }

        let result = match pass {
            RenderPass::Visible => instance
                .widget
                .invalidate()
                .and_then(|_| instance.widget.render()),
            RenderPass::All => instance
                .widget
                .invalidate_all_rows()
                .and_then(|_| instance.widget.render()),
        };

        match result {
            Ok(()) => {
                // The cheap pass catches most stale-virtualization cases;
                // the full pass covers under-rendering it missed.
                if pass == RenderPass::Visible {
                    self.scheduler.schedule_frame(Task::Rerender {
                        instance: id,
                        pass: RenderPass::All,
                    });
                }
            }
            Err(err) => {
                debug!(instance = %id, %err, "re-render failed, recreating");
                self.recreate(id);
            }
        }
    }

    /// Rebuild an instance's widget in place after the host tore the mount
    /// down underneath it. Idempotent: a recreation already in flight wins.
    pub(crate) fn recreate(&mut self, id: InstanceId) {
        {
            let Some(instance) = self.registry.get_mut(id) else {
                return;
            };
            if instance.state == InstanceState::Recreating {
                return;
            }
            instance.state = InstanceState::Recreating;
        }

        let Some(mut instance) = self.registry.take(id) else {
            return;
        };
        if let Err(err) = instance.widget.destroy() {
            warn!(instance = %id, %err, "stale widget teardown failed");
        }

        match self.host.construct_grid(
            instance.mount,
            &instance.rows,
            &instance.columns,
            &instance.options,
        ) {
            Ok(widget) => {
                instance.widget = widget;
                self.registry.restore(id, instance);
                if let Some(instance) = self.registry.get_mut(id) {
                    if let Err(err) = instance.widget.render() {
                        debug!(instance = %id, %err, "paint after recreation failed");
                    }
                }
                self.scheduler.schedule_after(
                    Instant::now(),
                    RECREATE_SETTLE_DELAY,
                    Task::SettleRecreate { instance: id },
                );
            }
            Err(err) => {
                warn!(instance = %id, %err, "recreation failed");
                self.host
                    .show_error(instance.mount, &format!("Failed to render results: {}", err));
            }
        }
    }

    fn run_settle(&mut self, id: InstanceId) {
        let Some(instance) = self.registry.get_mut(id) else {
            return;
        };
        if instance.state != InstanceState::Recreating {
            return;
        }

        let columns = instance.columns.clone();
        let result = instance
            .widget
            .set_columns(&columns)
            .and_then(|_| instance.widget.resize_canvas())
            .and_then(|_| instance.widget.invalidate_all_rows())
            .and_then(|_| instance.widget.render());
        instance.state = InstanceState::Mounted;

        if let Err(err) = result {
            // The next visibility transition retries through recreation.
            warn!(instance = %id, %err, "post-recreation settle failed");
        }
    }

    fn reset_action_feedback(&mut self, id: PreviewId) {
        let Some(node) = self
            .previews
            .get(&id)
            .and_then(|pane| pane.actions_node)
        else {
            return;
        };
        self.host
            .action_feedback(node, crate::host::ActionFeedback::Idle);
    }
}

/// Column definitions from the union of row keys, in first-seen order.
pub(crate) fn derive_columns<'a>(rows: impl Iterator<Item = &'a Row>) -> Vec<ColumnSpec> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut columns = Vec::new();
    for row in rows {
        for key in row.keys() {
            if seen.insert(key.as_str()) {
                columns.push(ColumnSpec::new(key.clone()));
            }
        }
    }
    columns
}

/// Same derivation for preview cells, hiding `_column_changed` sidecars.
pub(crate) fn derive_display_columns<'a>(
    cell_maps: impl Iterator<Item = &'a IndexMap<String, Value>>,
) -> Vec<ColumnSpec> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut columns = Vec::new();
    for cells in cell_maps {
        for key in cells.keys() {
            if key.starts_with('_') && key.ends_with("_changed") {
                continue;
            }
            if seen.insert(key.as_str()) {
                columns.push(ColumnSpec::new(key.clone()));
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{GridEvent, SurfaceEvent};
    use crate::testing::{GridCall, MockHost};
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn sample_rows() -> Vec<Row> {
        vec![
            row(&[("path", json!("/a.md")), ("status", json!("open"))]),
            row(&[("path", json!("/b.md")), ("status", json!("done"))]),
        ]
    }

    fn engine_with_root() -> (GridEngine<MockHost>, NodeId) {
        let mut host = MockHost::new();
        let root = host.arena.create_root();
        (GridEngine::new(host), root)
    }

    fn render_sample(engine: &mut GridEngine<MockHost>, mount: NodeId) -> InstanceId {
        let ctx = RenderContext::new(sample_rows(), QueryDescriptor::new("SELECT * FROM files"), mount);
        engine.render(ctx).unwrap().unwrap()
    }

    #[test]
    fn test_render_stores_rows_and_derives_columns() {
        let (mut engine, root) = engine_with_root();
        let id = render_sample(&mut engine, root);

        assert_eq!(engine.count(), 1);
        assert!(engine.is_active(id));
        let widget = engine.widget(id).unwrap();
        assert_eq!(widget.rows, sample_rows());
        let fields: Vec<&str> = widget.columns.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["path", "status"]);
    }

    #[test]
    fn test_render_into_same_container_replaces_instance() {
        let (mut engine, root) = engine_with_root();
        let first = render_sample(&mut engine, root);
        let second = render_sample(&mut engine, root);

        assert_ne!(first, second);
        assert_eq!(engine.count(), 1);
        assert!(!engine.is_active(first));
        assert!(engine.is_active(second));
    }

    #[test]
    fn test_construction_failure_is_reported_inline() {
        let (mut engine, root) = engine_with_root();
        engine.host_mut().fail_construct = true;

        let ctx = RenderContext::new(sample_rows(), QueryDescriptor::new("SELECT 1"), root);
        let result = engine.render(ctx).unwrap();

        assert!(result.is_none());
        assert_eq!(engine.count(), 0);
        assert_eq!(engine.host().errors.len(), 1);
        assert!(engine.host().errors[0].1.contains("Failed to render results"));
    }

    #[test]
    fn test_destroy_removes_instance_and_is_safe_twice() {
        let (mut engine, root) = engine_with_root();
        let id = render_sample(&mut engine, root);

        assert!(engine.destroy(id));
        assert!(!engine.is_active(id));
        assert!(engine.widget(id).is_none());
        assert_eq!(engine.count(), 0);
        assert!(!engine.destroy(id));
    }

    #[test]
    fn test_visibility_transition_schedules_two_pass_rerender() {
        let (mut engine, root) = engine_with_root();
        let id = render_sample(&mut engine, root);
        engine.widget_mut(id).unwrap().calls.clear();

        engine.handle_surface_event(SurfaceEvent::VisibilityChanged {
            instance: id,
            intersecting: false,
        });
        engine.handle_surface_event(SurfaceEvent::VisibilityChanged {
            instance: id,
            intersecting: true,
        });

        // First frame: cheap pass over materialized rows.
        engine.tick(Instant::now());
        let calls = &engine.widget(id).unwrap().calls;
        assert_eq!(calls, &[GridCall::Invalidate, GridCall::Render]);

        // Second frame: full invalidation.
        engine.tick(Instant::now());
        let calls = &engine.widget(id).unwrap().calls;
        assert_eq!(
            calls,
            &[
                GridCall::Invalidate,
                GridCall::Render,
                GridCall::InvalidateAllRows,
                GridCall::Render
            ]
        );
    }

    #[test]
    fn test_becoming_hidden_does_not_schedule_work() {
        let (mut engine, root) = engine_with_root();
        let id = render_sample(&mut engine, root);
        engine.widget_mut(id).unwrap().calls.clear();

        engine.handle_surface_event(SurfaceEvent::VisibilityChanged {
            instance: id,
            intersecting: false,
        });
        engine.tick(Instant::now());
        assert!(engine.widget(id).unwrap().calls.is_empty());
    }

    #[test]
    fn test_failed_rerender_recreates_with_same_data() {
        let (mut engine, root) = engine_with_root();
        let id = render_sample(&mut engine, root);
        let original_rows = engine.widget(id).unwrap().rows.clone();
        engine.widget_mut(id).unwrap().fail_render = true;

        engine.handle_surface_event(SurfaceEvent::VisibilityChanged {
            instance: id,
            intersecting: false,
        });
        engine.handle_surface_event(SurfaceEvent::VisibilityChanged {
            instance: id,
            intersecting: true,
        });
        engine.tick(Instant::now());

        // Same id, fresh widget, identical stored data.
        assert!(engine.is_active(id));
        assert_eq!(engine.host().constructed, 2);
        assert_eq!(engine.widget(id).unwrap().rows, original_rows);
        assert_eq!(
            engine.registry.get(id).unwrap().state,
            InstanceState::Recreating
        );

        // After the settling delay the widget geometry is reasserted.
        engine.tick(Instant::now() + RECREATE_SETTLE_DELAY + Duration::from_millis(10));
        let widget = engine.widget(id).unwrap();
        assert!(widget.calls_of(GridCall::SetColumns) >= 1);
        assert!(widget.calls_of(GridCall::InvalidateAllRows) >= 1);
        assert_eq!(
            engine.registry.get(id).unwrap().state,
            InstanceState::Mounted
        );
    }

    #[test]
    fn test_recreate_is_idempotent_while_in_flight() {
        let (mut engine, root) = engine_with_root();
        let id = render_sample(&mut engine, root);

        engine.recreate(id);
        assert_eq!(engine.host().constructed, 2);
        engine.recreate(id);
        assert_eq!(engine.host().constructed, 2);
    }

    #[test]
    fn test_container_detach_destroys_contained_instances() {
        let (mut engine, root) = engine_with_root();
        let container = engine.host_mut().arena.create_child(root);
        let mount = engine.host_mut().arena.create_child(container);
        let id = render_sample(&mut engine, mount);
        let other_root = engine.host_mut().arena.create_root();
        let other = render_sample(&mut engine, other_root);

        engine.handle_surface_event(SurfaceEvent::ContainerDetached { node: container });

        assert!(!engine.is_active(id));
        assert!(engine.is_active(other));
    }

    #[test]
    fn test_resize_debounces_to_one_execution_per_frame() {
        let (mut engine, root) = engine_with_root();
        let id = render_sample(&mut engine, root);
        engine.widget_mut(id).unwrap().calls.clear();

        engine.resize(Some(id));
        engine.resize(Some(id));
        engine.resize(Some(id));
        engine.tick(Instant::now());

        assert_eq!(engine.widget(id).unwrap().calls_of(GridCall::ResizeCanvas), 1);
    }

    #[test]
    fn test_resize_without_target_hits_every_instance() {
        let (mut engine, root) = engine_with_root();
        let a = render_sample(&mut engine, root);
        let other_root = engine.host_mut().arena.create_root();
        let b = render_sample(&mut engine, other_root);
        engine.widget_mut(a).unwrap().calls.clear();
        engine.widget_mut(b).unwrap().calls.clear();

        engine.resize(None);
        engine.resize(None);
        engine.tick(Instant::now());

        assert_eq!(engine.widget(a).unwrap().calls_of(GridCall::ResizeCanvas), 1);
        assert_eq!(engine.widget(b).unwrap().calls_of(GridCall::ResizeCanvas), 1);
    }

    #[test]
    fn test_stale_resize_task_skips_destroyed_instance() {
        let (mut engine, root) = engine_with_root();
        let id = render_sample(&mut engine, root);

        engine.resize(Some(id));
        engine.destroy(id);
        // The pending task finds no registry entry and does nothing.
        engine.tick(Instant::now());
        assert_eq!(engine.count(), 0);
    }

    #[test]
    fn test_refresh_skips_doc_scoped_instance_outside_hint_set() {
        let (mut engine, root) = engine_with_root();
        let other_root = engine.host_mut().arena.create_root();

        let skipped = Rc::new(Cell::new(0u32));
        let refreshed = Rc::new(Cell::new(0u32));

        let mut query = QueryDescriptor::new("SELECT * FROM tasks");
        query.scoped_to_current_document = true;

        let counter = skipped.clone();
        let mut ctx = RenderContext::new(sample_rows(), query.clone(), root);
        ctx.source_path = Some("/b.md".to_string());
        ctx.on_refresh = Some(Box::new(move || {
            counter.set(counter.get() + 1);
            Ok(())
        }));
        engine.render(ctx).unwrap().unwrap();

        let counter = refreshed.clone();
        let mut ctx = RenderContext::new(sample_rows(), query, other_root);
        ctx.source_path = Some("/a.md".to_string());
        ctx.on_refresh = Some(Box::new(move || {
            counter.set(counter.get() + 1);
            Ok(())
        }));
        engine.render(ctx).unwrap().unwrap();

        let hint: HashSet<String> = ["/a.md".to_string()].into_iter().collect();
        engine.refresh_all(Some(&hint));

        assert_eq!(skipped.get(), 0);
        assert_eq!(refreshed.get(), 1);

        // Without a hint everything refreshes.
        engine.refresh_all(None);
        assert_eq!(skipped.get(), 1);
        assert_eq!(refreshed.get(), 2);
    }

    #[test]
    fn test_refresh_failure_does_not_block_others() {
        let (mut engine, root) = engine_with_root();
        let other_root = engine.host_mut().arena.create_root();
        let refreshed = Rc::new(Cell::new(0u32));

        let mut ctx = RenderContext::new(
            sample_rows(),
            QueryDescriptor::new("SELECT * FROM a"),
            root,
        );
        ctx.on_refresh = Some(Box::new(|| {
            Err(crate::Error::Host("query backend offline".to_string()))
        }));
        engine.render(ctx).unwrap().unwrap();

        let counter = refreshed.clone();
        let mut ctx = RenderContext::new(
            sample_rows(),
            QueryDescriptor::new("SELECT * FROM b"),
            other_root,
        );
        ctx.on_refresh = Some(Box::new(move || {
            counter.set(counter.get() + 1);
            Ok(())
        }));
        engine.render(ctx).unwrap().unwrap();

        engine.refresh_all(None);
        assert_eq!(refreshed.get(), 1);
    }

    #[test]
    fn test_detached_refresh_registration_is_pruned_not_invoked() {
        let (mut engine, root) = engine_with_root();
        let node = engine.host_mut().arena.create_child(root);
        let invoked = Rc::new(Cell::new(0u32));

        let counter = invoked.clone();
        engine.register_refresh_callback(
            "charts",
            node,
            Box::new(move || {
                counter.set(counter.get() + 1);
                Ok(())
            }),
        );

        engine.refresh_all(None);
        assert_eq!(invoked.get(), 1);

        engine.host_mut().arena.detach(node);
        engine.refresh_all(None);
        assert_eq!(invoked.get(), 1);
        assert!(engine.refresh.is_empty());
    }

    #[test]
    fn test_columns_resized_persists_widths_for_reopened_query() {
        let (mut engine, root) = engine_with_root();
        let id = render_sample(&mut engine, root);

        // Simulate the user widening the first column.
        engine.widget_mut(id).unwrap().columns[0].width = Some(120);
        engine.handle_grid_event(id, GridEvent::ColumnsResized);
        engine.destroy(id);

        // Reopening the same logical query restores the sizing.
        let id = render_sample(&mut engine, root);
        assert_eq!(engine.widget(id).unwrap().columns[0].width, Some(120));
    }

    #[test]
    fn test_click_on_path_cell_opens_document() {
        let (mut engine, root) = engine_with_root();
        let id = render_sample(&mut engine, root);

        engine.handle_grid_event(
            id,
            GridEvent::Click {
                row: Some(1),
                column: Some("path".to_string()),
                y_offset: None,
            },
        );
        assert_eq!(engine.host().opened, vec!["/b.md".to_string()]);
    }

    #[test]
    fn test_cleanup_drains_everything() {
        let (mut engine, root) = engine_with_root();
        let id = render_sample(&mut engine, root);
        engine.resize(Some(id));
        engine.register_refresh_callback("charts", root, Box::new(|| Ok(())));

        engine.cleanup();

        assert_eq!(engine.count(), 0);
        assert!(engine.refresh.is_empty());
        assert!(engine.scheduler.is_empty());
    }
}
