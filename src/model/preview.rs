//! Display rows for the change preview grid

use crate::model::operation::OperationDescriptor;
use crate::model::row::Value;
use indexmap::IndexMap;

/// Bookkeeping column used by array-backed tables. Suppressed in previews
/// when it is empty on both sides of a change pair.
pub const ARRAY_INDEX_COLUMN: &str = "array_index";

/// Identity column holding the source document path.
pub const PATH_COLUMN: &str = "path";

/// Free-text identity column shown alongside changes when it is itself
/// untouched.
pub const NAME_COLUMN: &str = "name";

/// Literal cell value marking a multi-operation summary row as expandable.
pub const EXPAND_PLACEHOLDER: &str = "click to expand";

/// Synthetic column name holding the pre-change value of `column`.
pub fn current_column(column: &str) -> String {
    format!("{} (current)", column)
}

/// Synthetic column name holding the post-change value of `column`.
pub fn proposed_column(column: &str) -> String {
    format!("{} (proposed)", column)
}

/// Sidecar flag column marking whether `column` differs in this row.
///
/// A column can be in the global change set while an individual row's value
/// is unchanged; the flag records the per-row comparison.
pub fn changed_flag_column(column: &str) -> String {
    format!("_{}_changed", column)
}

/// One display-ready row of the preview grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreviewRow {
    /// Column name to display value, in render order.
    pub cells: IndexMap<String, Value>,

    /// For multi-operation summary rows: the nested operation the row stands
    /// for. Private payload for click-to-expand, never displayed directly.
    pub nested: Option<Box<OperationDescriptor>>,
}

impl PreviewRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column names in render order, for deriving grid column definitions.
    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.cells.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_column_names() {
        assert_eq!(current_column("status"), "status (current)");
        assert_eq!(proposed_column("status"), "status (proposed)");
        assert_eq!(changed_flag_column("status"), "_status_changed");
    }
}
