//! Events flowing from the host into the engine
//!
//! The engine does not subscribe to widget or surface callbacks; the host
//! observes its own surfaces and forwards discrete events here. This keeps
//! control flow explicit and lets every handler re-check registry membership
//! before acting.

use crate::grid::registry::InstanceId;
use crate::surface::NodeId;

/// Events originating from a grid widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    /// A cell was clicked. `row` is the widget's logical row index when it
    /// exposes one; `y_offset` is the click's vertical pixel offset inside
    /// the grid body, used as a degraded-mode fallback to recover the row.
    Click {
        row: Option<usize>,
        column: Option<String>,
        y_offset: Option<u16>,
    },
    /// The grid body scrolled.
    Scroll,
    /// The user finished resizing one or more columns.
    ColumnsResized,
    /// The widget is about to be torn down by the host.
    BeforeDestroy,
}

/// Events originating from the host's rendering surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// An observed instance's mount transitioned in or out of the viewport.
    VisibilityChanged {
        instance: InstanceId,
        intersecting: bool,
    },
    /// A container node was detached from the surface tree. Instances
    /// mounted inside it are destroyed.
    ContainerDetached { node: NodeId },
}
