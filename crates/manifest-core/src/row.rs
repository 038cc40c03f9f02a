//! Normalized manifest rows

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// One release of one title, as read from a sheet row.
///
/// String fields are trimmed when the row is built, so comparisons
/// elsewhere work on canonical forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRow {
    /// Name of the sheet this row came from
    pub sheet: String,
    /// Release identifier, e.g. "Reach_39"
    pub slug: String,
    /// Display name (may be empty)
    pub name: String,
    pub app_id: u64,
    pub depot_id: u64,
    pub manifest_id: u64,
    /// Download size, absent when the cell was blank or unreadable
    pub total_size_bytes: Option<u64>,
    /// Release label, e.g. "March 1 2024"
    pub release_date_full: String,
    /// The base-sheet release this row corresponds to
    pub mcc_release: String,
}

impl ManifestRow {
    /// Create a row with the given sheet and slug, other fields defaulted
    pub fn new(sheet: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into().trim().to_string(),
            slug: slug.into().trim().to_string(),
            ..Self::default()
        }
    }

    /// Integer suffix of the slug, see [`slug_ordinal`]
    pub fn ordinal(&self) -> i64 {
        slug_ordinal(&self.slug)
    }
}

/// Extract the number after the last `_` in a slug.
///
/// Returns 0 when there is no underscore or the suffix is not an integer:
/// `"Reach_39"` is 39, `"Reach"`, `"Reach_"` and `"Reach_abc"` are 0.
pub fn slug_ordinal(slug: &str) -> i64 {
    slug.rfind('_')
        .and_then(|idx| slug[idx + 1..].parse::<i64>().ok())
        .unwrap_or(0)
}

/// Sort rows newest first by slug ordinal, keeping the order of ties
pub fn sort_newest_first(rows: &mut [ManifestRow]) {
    rows.sort_by_key(|r| Reverse(r.ordinal()));
}
