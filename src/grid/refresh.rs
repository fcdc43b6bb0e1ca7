//! Externally registered refresh callbacks
//!
//! Besides the per-instance refresh callback carried by a render context,
//! other parts of the host (chart blocks, template blocks) can register
//! their own refresh callbacks keyed by id. Registrations whose target node
//! has left the surface tree are pruned during a broadcast instead of being
//! invoked.

use crate::error::Result;
use crate::surface::NodeId;
use std::collections::HashMap;

/// Callback invoked when underlying data may have changed.
pub type RefreshFn = Box<dyn FnMut() -> Result<()>>;

/// One external registration.
pub struct RefreshRegistration {
    pub node: NodeId,
    pub callback: RefreshFn,
}

/// Keyed store of external refresh callbacks.
#[derive(Default)]
pub struct RefreshRegistry {
    entries: HashMap<String, RefreshRegistration>,
}

impl RefreshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a callback under `id`.
    pub fn register(&mut self, id: impl Into<String>, node: NodeId, callback: RefreshFn) {
        self.entries
            .insert(id.into(), RefreshRegistration { node, callback });
    }

    pub fn unregister(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Snapshot of registration ids, safe to iterate while pruning.
    pub fn ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut RefreshRegistration> {
        self.entries.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<RefreshRegistration> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SurfaceArena;

    #[test]
    fn test_register_replace_unregister() {
        let mut arena = SurfaceArena::new();
        let node = arena.create_root();

        let mut registry = RefreshRegistry::new();
        registry.register("charts", node, Box::new(|| Ok(())));
        registry.register("charts", node, Box::new(|| Ok(())));
        assert_eq!(registry.len(), 1);

        assert!(registry.unregister("charts"));
        assert!(!registry.unregister("charts"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_callback_is_invocable_through_get_mut() {
        let mut arena = SurfaceArena::new();
        let node = arena.create_root();
        let counter = std::rc::Rc::new(std::cell::Cell::new(0));

        let mut registry = RefreshRegistry::new();
        let cb_counter = counter.clone();
        registry.register(
            "templates",
            node,
            Box::new(move || {
                cb_counter.set(cb_counter.get() + 1);
                Ok(())
            }),
        );

        let entry = registry.get_mut("templates").unwrap();
        (entry.callback)().unwrap();
        assert_eq!(counter.get(), 1);
    }
}
