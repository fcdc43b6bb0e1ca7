//! Preview row builder
//!
//! Projects an operation descriptor into the rows shown in the preview grid.
//! Pure: the same descriptor always yields the same rows.

use crate::diff::compute_change_set;
use crate::model::operation::{OperationDescriptor, OperationKind};
use crate::model::preview::{
    changed_flag_column, current_column, proposed_column, PreviewRow, ARRAY_INDEX_COLUMN,
    EXPAND_PLACEHOLDER, NAME_COLUMN, PATH_COLUMN,
};
use crate::model::row::{is_blank, Row, Value};
use indexmap::IndexMap;
use serde_json::json;

/// Build display rows for an operation.
///
/// For updates an empty change set produces zero rows, which signals
/// "nothing to preview" to the orchestrator.
pub fn build_preview_rows(op: &OperationDescriptor, relevant: &[String]) -> Vec<PreviewRow> {
    match op.kind {
        OperationKind::Insert => project(&op.after, relevant),
        OperationKind::Delete => project(&op.before, relevant),
        OperationKind::Update => build_update_rows(op, relevant),
        OperationKind::Multi => build_summary_rows(op),
    }
}

/// Project rows onto the relevant-column filter. Missing values render as
/// empty strings, not nulls.
fn project(rows: &[Row], relevant: &[String]) -> Vec<PreviewRow> {
    rows.iter()
        .map(|row| {
            let cells: IndexMap<String, Value> = relevant
                .iter()
                .map(|col| {
                    let value = row
                        .get(col)
                        .cloned()
                        .unwrap_or_else(|| Value::String(String::new()));
                    (col.clone(), value)
                })
                .collect();
            PreviewRow {
                cells,
                nested: None,
            }
        })
        .collect()
}

fn build_update_rows(op: &OperationDescriptor, relevant: &[String]) -> Vec<PreviewRow> {
    let change_set = compute_change_set(&op.before, &op.after, relevant);
    if change_set.is_empty() {
        return Vec::new();
    }

    let mut rows = Vec::new();
    let len = op.before.len().max(op.after.len());

    for i in 0..len {
        let (Some(before), Some(after)) = (op.before.get(i), op.after.get(i)) else {
            continue;
        };
        let mut cells: IndexMap<String, Value> = IndexMap::new();

        // Stable primary keys identify the row.
        for pk in &op.primary_keys {
            let b = before.get(pk);
            let a = after.get(pk);
            if pk.as_str() == ARRAY_INDEX_COLUMN && is_blank(b) && is_blank(a) {
                continue;
            }
            if b == a {
                if let Some(value) = b {
                    cells.insert(pk.clone(), value.clone());
                }
            }
        }

        // Path identity, unless a primary key already covers it.
        if !op.primary_keys.iter().any(|k| k.as_str() == PATH_COLUMN) {
            if let Some(value) = before.get(PATH_COLUMN).or_else(|| after.get(PATH_COLUMN)) {
                cells.insert(PATH_COLUMN.to_string(), value.clone());
            }
        }

        // Free-text identity, unless it is a primary key or itself changed.
        if !op.primary_keys.iter().any(|k| k.as_str() == NAME_COLUMN)
            && !change_set.contains(NAME_COLUMN)
        {
            if let Some(value) = before.get(NAME_COLUMN).or_else(|| after.get(NAME_COLUMN)) {
                cells.insert(NAME_COLUMN.to_string(), value.clone());
            }
        }

        // Current/proposed pairs for every column in the change set. The
        // per-row flag is this row's own comparison, independent of which
        // row put the column into the set.
        for col in &change_set {
            let b = before.get(col);
            let a = after.get(col);
            if col.as_str() == ARRAY_INDEX_COLUMN && is_blank(b) && is_blank(a) {
                continue;
            }
            cells.insert(current_column(col), b.cloned().unwrap_or(Value::Null));
            cells.insert(proposed_column(col), a.cloned().unwrap_or(Value::Null));
            cells.insert(changed_flag_column(col), Value::Bool(b != a));
        }

        rows.push(PreviewRow {
            cells,
            nested: None,
        });
    }

    rows
}

/// One summary row per nested operation of a batch, expandable on click.
fn build_summary_rows(op: &OperationDescriptor) -> Vec<PreviewRow> {
    op.nested
        .iter()
        .enumerate()
        .map(|(index, nested)| {
            let mut cells: IndexMap<String, Value> = IndexMap::new();
            cells.insert("#".to_string(), json!(index + 1));
            cells.insert(
                "operation".to_string(),
                json!(format!("{} {}", nested.kind.icon(), nested.kind.verb())),
            );
            cells.insert("table".to_string(), json!(nested.table));
            cells.insert("rows".to_string(), json!(nested.row_count()));
            cells.insert("details".to_string(), json!(EXPAND_PLACEHOLDER));
            PreviewRow {
                cells,
                nested: Some(Box::new(nested.clone())),
            }
        })
        .collect()
}
