//! Row snapshots
//!
//! A row is an ordered mapping from column name to a scalar value. Before and
//! after snapshot arrays are aligned positionally: row `i` of the "before"
//! side corresponds to row `i` of the "after" side. Nothing in this crate
//! reconciles rows by primary key.

use indexmap::IndexMap;

/// Scalar cell value: string, number, boolean, or null.
///
/// Comparisons are strict `PartialEq` - `1` and `"1"` are different values.
pub type Value = serde_json::Value;

/// One row of a result set at a point in time.
pub type Row = IndexMap<String, Value>;

/// True when a cell is missing, null, or the empty string.
///
/// Used to suppress bookkeeping columns that carry no information on either
/// side of a change pair.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Render a cell value for display without surrounding quotes on strings.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_blank() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&Value::Null)));
        assert!(is_blank(Some(&json!(""))));
        assert!(!is_blank(Some(&json!("x"))));
        assert!(!is_blank(Some(&json!(0))));
        assert!(!is_blank(Some(&json!(false))));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("hello")), "hello");
        assert_eq!(display_value(&json!(42)), "42");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&Value::Null), "");
    }

    #[test]
    fn test_row_preserves_column_order() {
        let mut row = Row::new();
        row.insert("z".to_string(), json!(1));
        row.insert("a".to_string(), json!(2));
        let keys: Vec<&String> = row.keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
