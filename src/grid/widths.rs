//! Per-query column width cache
//!
//! When a user manually sizes columns, the widths are remembered for the
//! lifetime of the process keyed by a fingerprint of the query text, so
//! re-opening the same logical query restores the sizing. Nothing is written
//! to storage.

use crate::widget::ColumnSpec;
use regex::Regex;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Stable within-process hash of the query text, independent of result
/// contents. Whitespace differences do not change the fingerprint.
pub fn query_fingerprint(text: &str) -> u64 {
    let normalized = WHITESPACE_REGEX.replace_all(text.trim(), " ");
    let mut hasher = DefaultHasher::new();
    normalized.hash(&mut hasher);
    hasher.finish()
}

/// In-memory map from query fingerprint to per-column pixel widths.
#[derive(Debug, Default)]
pub struct ColumnWidthCache {
    widths: HashMap<u64, HashMap<String, u16>>,
}

impl ColumnWidthCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the width of every column that has an explicit width,
    /// replacing any prior mapping for this fingerprint.
    pub fn save(&mut self, fingerprint: u64, columns: &[ColumnSpec]) {
        let snapshot: HashMap<String, u16> = columns
            .iter()
            .filter_map(|col| col.width.map(|w| (col.id.clone(), w)))
            .collect();
        self.widths.insert(fingerprint, snapshot);
    }

    /// Persisted width for one column of a query, if any.
    pub fn restore(&self, fingerprint: u64, column_id: &str) -> Option<u16> {
        self.widths.get(&fingerprint)?.get(column_id).copied()
    }

    /// Apply persisted widths onto freshly built column definitions. Called
    /// before the widget is constructed.
    pub fn apply(&self, fingerprint: u64, columns: &mut [ColumnSpec]) {
        for col in columns.iter_mut() {
            if let Some(width) = self.restore(fingerprint, &col.id) {
                col.width = Some(width);
            }
        }
    }

    pub fn clear(&mut self) {
        self.widths.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_restore() {
        let fp = query_fingerprint("SELECT * FROM files");
        let mut cache = ColumnWidthCache::new();
        cache.save(fp, &[ColumnSpec::new("path").with_width(120)]);
        assert_eq!(cache.restore(fp, "path"), Some(120));
    }

    #[test]
    fn test_unknown_fingerprint_is_absent() {
        let cache = ColumnWidthCache::new();
        assert_eq!(cache.restore(query_fingerprint("SELECT 1"), "path"), None);
    }

    #[test]
    fn test_save_replaces_prior_mapping() {
        let fp = query_fingerprint("SELECT * FROM files");
        let mut cache = ColumnWidthCache::new();
        cache.save(fp, &[ColumnSpec::new("path").with_width(120)]);
        cache.save(fp, &[ColumnSpec::new("name").with_width(80)]);
        // The old column is gone entirely, not merged.
        assert_eq!(cache.restore(fp, "path"), None);
        assert_eq!(cache.restore(fp, "name"), Some(80));
    }

    #[test]
    fn test_columns_without_width_are_not_saved() {
        let fp = query_fingerprint("SELECT * FROM files");
        let mut cache = ColumnWidthCache::new();
        cache.save(
            fp,
            &[
                ColumnSpec::new("path"),
                ColumnSpec::new("name").with_width(90),
            ],
        );
        assert_eq!(cache.restore(fp, "path"), None);
        assert_eq!(cache.restore(fp, "name"), Some(90));
    }

    #[test]
    fn test_apply_overrides_built_widths() {
        let fp = query_fingerprint("SELECT * FROM files");
        let mut cache = ColumnWidthCache::new();
        cache.save(fp, &[ColumnSpec::new("path").with_width(200)]);

        let mut columns = vec![ColumnSpec::new("path"), ColumnSpec::new("name")];
        cache.apply(fp, &mut columns);
        assert_eq!(columns[0].width, Some(200));
        assert_eq!(columns[1].width, None);
    }

    #[test]
    fn test_fingerprint_ignores_whitespace_differences() {
        assert_eq!(
            query_fingerprint("SELECT *\n  FROM files"),
            query_fingerprint("SELECT * FROM files")
        );
        assert_ne!(
            query_fingerprint("SELECT * FROM files"),
            query_fingerprint("SELECT * FROM tags")
        );
    }
}
