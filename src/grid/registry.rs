//! Instance registry - the single owner of every live grid widget
//!
//! Each rendered query result is one `GridInstance`: the widget handle, the
//! node it is mounted into, and everything needed to rebuild the widget if
//! the host tears the mount down. Instances are keyed by a fresh identifier
//! and never duplicated; destruction always succeeds from the caller's
//! perspective.

use crate::grid::refresh::RefreshFn;
use crate::model::query::QueryDescriptor;
use crate::model::row::Row;
use crate::scheduler::TaskId;
use crate::surface::NodeId;
use crate::widget::{ColumnSpec, GridOptions, GridWidget};
use std::collections::HashMap;
use tracing::warn;

/// Identifier of one live grid instance. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "grid#{}", self.0)
    }
}

/// Lifecycle state of an instance. Destruction removes the registry entry,
/// so there is no `Destroyed` variant to observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Mounted and intersecting the viewport.
    Mounted,
    /// Mounted but scrolled out of the viewport.
    Hidden,
    /// Widget is being rebuilt after a detected virtualization failure.
    Recreating,
}

/// The render request context an instance originated from.
pub struct InstanceContext {
    pub query: QueryDescriptor,
    pub source_path: Option<String>,
    pub on_refresh: Option<RefreshFn>,
}

/// One live rendering of the grid widget.
pub struct GridInstance<W> {
    pub widget: W,
    /// Node the widget is mounted into.
    pub mount: NodeId,
    /// Whether the host observes this mount for viewport intersection.
    pub observed: bool,
    /// Row data last used to build the widget; recreation reuses it.
    pub rows: Vec<Row>,
    /// Column definitions last used to build the widget.
    pub columns: Vec<ColumnSpec>,
    pub options: GridOptions,
    pub context: InstanceContext,
    pub state: InstanceState,
    /// Pending debounced resize, cancelled when superseded.
    pub pending_resize: Option<TaskId>,
}

/// Owner of all live instances.
pub struct InstanceRegistry<W> {
    instances: HashMap<InstanceId, GridInstance<W>>,
    next_id: u64,
}

impl<W> Default for InstanceRegistry<W> {
    fn default() -> Self {
        Self {
            instances: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<W: GridWidget> InstanceRegistry<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an instance under a fresh identifier.
    pub fn insert(&mut self, instance: GridInstance<W>) -> InstanceId {
        self.next_id += 1;
        let id = InstanceId(self.next_id);
        self.instances.insert(id, instance);
        id
    }

    /// Tear down and remove an instance. Widget teardown errors are logged
    /// and swallowed; calling this twice is safe.
    pub fn destroy(&mut self, id: InstanceId) -> bool {
        let Some(mut instance) = self.instances.remove(&id) else {
            return false;
        };
        instance.observed = false;
        if let Err(err) = instance.widget.destroy() {
            warn!(instance = %id, %err, "grid widget teardown failed");
        }
        true
    }

    /// Remove an instance without destroying its widget. Used by the
    /// recreation path, which handles teardown itself.
    pub fn take(&mut self, id: InstanceId) -> Option<GridInstance<W>> {
        self.instances.remove(&id)
    }

    /// Re-insert an instance under its original identifier after recreation.
    pub fn restore(&mut self, id: InstanceId, instance: GridInstance<W>) {
        self.instances.insert(id, instance);
    }

    pub fn get(&self, id: InstanceId) -> Option<&GridInstance<W>> {
        self.instances.get(&id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut GridInstance<W>> {
        self.instances.get_mut(&id)
    }

    pub fn count(&self) -> usize {
        self.instances.len()
    }

    pub fn is_active(&self, id: InstanceId) -> bool {
        self.instances.contains_key(&id)
    }

    /// Snapshot of live ids. Always iterate over this when the loop body may
    /// destroy entries.
    pub fn ids(&self) -> Vec<InstanceId> {
        let mut ids: Vec<InstanceId> = self.instances.keys().copied().collect();
        ids.sort();
        ids
    }
}
