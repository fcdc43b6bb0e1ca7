//! Pending mutation descriptors
//!
//! An `OperationDescriptor` is produced by the (external) planning step and
//! consumed read-only by the preview engine. It carries everything needed to
//! show the user what will change and to execute the mutation afterwards.

use crate::model::row::{Row, Value};
use serde::{Deserialize, Serialize};

/// What kind of mutation a descriptor represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
    /// An ordered batch of nested operations executed together.
    Multi,
}

impl OperationKind {
    /// Lowercase verb used in summary rows and confirmation prompts.
    pub fn verb(&self) -> &'static str {
        match self {
            OperationKind::Insert => "insert",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::Multi => "batch",
        }
    }

    /// Icon shown next to the verb in multi-operation summary rows.
    pub fn icon(&self) -> &'static str {
        match self {
            OperationKind::Insert => "➕",
            OperationKind::Update => "✏️",
            OperationKind::Delete => "🗑️",
            OperationKind::Multi => "📦",
        }
    }
}

/// One SQL statement with its bound parameters, ready to execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlStatement {
    pub sql: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

/// A pending mutation: before/after row snapshots plus the statements that
/// realize the change.
///
/// Immutable once produced. Before/after arrays are positionally aligned;
/// `nested` is populated only for `Multi`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    pub kind: OperationKind,
    pub table: String,
    #[serde(default)]
    pub primary_keys: Vec<String>,
    #[serde(default)]
    pub before: Vec<Row>,
    #[serde(default)]
    pub after: Vec<Row>,
    #[serde(default)]
    pub statements: Vec<SqlStatement>,
    #[serde(default)]
    pub nested: Vec<OperationDescriptor>,
}

impl OperationDescriptor {
    /// Number of rows this operation touches.
    pub fn row_count(&self) -> usize {
        self.before.len().max(self.after.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_row_count_uses_longer_side() {
        let op = OperationDescriptor {
            kind: OperationKind::Insert,
            table: "files".to_string(),
            primary_keys: vec![],
            before: vec![],
            after: vec![row(&[("a", json!(1))]), row(&[("a", json!(2))])],
            statements: vec![],
            nested: vec![],
        };
        assert_eq!(op.row_count(), 2);
    }

    #[test]
    fn test_kind_roundtrips_through_serde() {
        let json = serde_json::to_string(&OperationKind::Multi).unwrap();
        assert_eq!(json, "\"multi\"");
        let kind: OperationKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, OperationKind::Multi);
    }
}
