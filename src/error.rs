//! Errors used across the crate.
//!
//! The taxonomy mirrors how failures are handled: construction failures are
//! shown inline in place of the grid, widget call failures trigger the
//! recreation path, and host failures surface to the embedding application.

/// Errors that can occur while managing grid instances and previews.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The widget could not be built against the given rows/columns.
    #[error("failed to construct grid widget: {0}")]
    Construction(String),

    /// A call into a live widget failed, usually because the host tore the
    /// mount down underneath it.
    #[error("grid widget call failed: {0}")]
    Widget(String),

    /// An operation delegated to the host application failed.
    #[error("host operation failed: {0}")]
    Host(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
