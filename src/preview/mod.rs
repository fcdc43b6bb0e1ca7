//! Change preview: row building and orchestration
//!
//! `builder` turns an operation descriptor into display-ready rows;
//! `orchestrator` composes those rows with the instance registry into the
//! full preview pane (statement, grid, summary, actions, click-to-expand).

pub mod builder;
pub mod orchestrator;

pub use builder::build_preview_rows;
pub use orchestrator::PreviewContext;

/// Identifier of one open preview pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreviewId(pub(crate) u64);

impl std::fmt::Display for PreviewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "preview#{}", self.0)
    }
}
