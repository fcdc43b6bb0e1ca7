//! Grid instance lifecycle
//!
//! Everything that owns and maintains live widget instances:
//! - `registry` - the single owner of every `GridInstance`
//! - `widths` - per-query column width cache
//! - `refresh` - externally registered refresh callbacks

pub mod refresh;
pub mod registry;
pub mod widths;

pub use refresh::{RefreshFn, RefreshRegistry};
pub use registry::{GridInstance, InstanceContext, InstanceId, InstanceRegistry, InstanceState};
pub use widths::{query_fingerprint, ColumnWidthCache};
