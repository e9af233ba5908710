//! Shared result types of the resolvers.

use serde::{Deserialize, Serialize};

/// Provenance tag when every DOI source failed
pub const SOURCE_NONE: &str = "none";

/// Provenance tag when a repository record could not be fetched or located
pub const SOURCE_WEKO_FAIL: &str = "weko-json-fail";

/// Bibliographic fields of one item. Empty strings when unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMetadata {
    pub title: String,
    pub authors: String,
    pub year: String,
    pub journal: String,
}

/// Output of one resolver run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Which source produced `meta`
    pub source: String,
    pub meta: ResolvedMetadata,
    pub keywords: Vec<String>,
    /// Record belongs to the education collection
    pub edu: bool,
}

impl Resolution {
    /// Sentinel for a DOI no source could resolve.
    pub fn none() -> Self {
        Self {
            source: SOURCE_NONE.to_string(),
            ..Default::default()
        }
    }

    /// Sentinel for an unusable repository record reference.
    pub fn weko_fail() -> Self {
        Self {
            source: SOURCE_WEKO_FAIL.to_string(),
            ..Default::default()
        }
    }
}
