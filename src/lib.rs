//! sqlgrid - grid rendering lifecycle and mutation-preview engine
//!
//! Renders tabular query results inside a host document-editing application
//! and previews data mutations (insert/update/delete, including batches)
//! before they are committed.
//!
//! The embedding host owns a [`GridEngine`], forwards widget and surface
//! events into it, and drives [`GridEngine::tick`] once per frame. The host
//! side of the contract is the [`host::Host`] trait; the virtualized table
//! widget side is [`widget::GridWidget`].

pub mod diff;
pub mod engine;
pub mod error;
pub mod event;
pub mod grid;
pub mod host;
pub mod model;
pub mod preview;
pub mod scheduler;
pub mod surface;
pub mod widget;

pub mod components;
pub mod tui;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{GridEngine, RenderContext};
pub use error::{Error, Result};
pub use event::{GridEvent, SurfaceEvent};
pub use grid::registry::InstanceId;
pub use host::{ActionFeedback, Host};
pub use model::{OperationDescriptor, OperationKind, PreviewRow, QueryDescriptor, Row, Value};
pub use preview::{PreviewContext, PreviewId};
pub use surface::{NodeId, SurfaceArena};
pub use widget::{ColumnSpec, GridOptions, GridWidget};
