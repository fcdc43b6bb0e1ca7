//! Terminal host adapter
//!
//! A reference `Host` implementation for terminals: `TermGrid` fulfils the
//! virtualized-widget contract with ratatui lines, `TermHost` maps surface
//! nodes onto panel regions, and `confirm_dialog` supplies the blocking
//! confirmation prompt. Used by the demo binary; the engine itself never
//! depends on any of this.

pub mod confirm_dialog;
pub mod term_grid;
pub mod term_host;

pub use confirm_dialog::ConfirmDialog;
pub use term_grid::TermGrid;
pub use term_host::TermHost;
