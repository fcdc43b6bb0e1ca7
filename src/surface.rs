//! Rendering-surface node handles
//!
//! The engine never touches the host's real widget tree; it holds opaque
//! `NodeId` handles and asks the host about attachment and containment. The
//! `SurfaceArena` here is a small parent-pointer bookkeeping structure hosts
//! can embed to answer those queries for their own surfaces.

use std::collections::HashMap;

/// Opaque handle to a node in the host's rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

#[derive(Debug)]
struct NodeEntry {
    parent: Option<NodeId>,
    root: bool,
}

/// Parent-pointer tree tracking which surface nodes exist and where.
///
/// A node is attached when walking its parent chain reaches a root. Detaching
/// a node severs it (and its subtree) from the tree without deleting entries,
/// mirroring a host that unmounts a surface it may later re-mount.
#[derive(Debug, Default)]
pub struct SurfaceArena {
    nodes: HashMap<NodeId, NodeEntry>,
    next: u64,
}

impl SurfaceArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, parent: Option<NodeId>, root: bool) -> NodeId {
        self.next += 1;
        let id = NodeId(self.next);
        self.nodes.insert(id, NodeEntry { parent, root });
        id
    }

    /// Create a new top-level attached node.
    pub fn create_root(&mut self) -> NodeId {
        self.alloc(None, true)
    }

    /// Create a child of an existing node.
    pub fn create_child(&mut self, parent: NodeId) -> NodeId {
        self.alloc(Some(parent), false)
    }

    /// Sever a node from its parent. The node and its subtree stop being
    /// attached but their entries remain.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.parent = None;
            entry.root = false;
        }
    }

    /// Delete a node entry entirely. Children become unattached orphans.
    pub fn remove(&mut self, node: NodeId) {
        self.nodes.remove(&node);
    }

    /// Whether the node can still reach an attached root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            match self.nodes.get(&current) {
                None => return false,
                Some(entry) if entry.root => return true,
                Some(entry) => match entry.parent {
                    Some(parent) => current = parent,
                    None => return false,
                },
            }
        }
    }

    /// Whether `ancestor` contains `node` (inclusive: a node contains itself).
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == ancestor {
                return true;
            }
            match self.nodes.get(&current).and_then(|e| e.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }
}
