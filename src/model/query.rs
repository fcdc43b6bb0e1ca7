//! Parsed-query descriptor
//!
//! The query parser lives outside this crate; what arrives here is a small
//! descriptor with the raw text plus the capabilities the engine needs.

use serde::{Deserialize, Serialize};

/// Boundary type handed in by the external query parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Raw query text. Used only for fingerprinting, never re-parsed here.
    pub text: String,

    /// Table the query primarily reads from, when the parser knows it.
    #[serde(default)]
    pub table: Option<String>,

    /// Set by the parser when the query implicitly filters by the document
    /// it is embedded in. Drives the refresh-skip optimization: a refresh
    /// hint that does not include the instance's source path means the
    /// results cannot have changed.
    #[serde(default)]
    pub scoped_to_current_document: bool,
}

impl QueryDescriptor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            table: None,
            scoped_to_current_document: false,
        }
    }
}
