//! Release matching between the base sheet and another sheet
//!
//! A [`Matcher`] runs an ordered list of strategies and stops at the first
//! one that finds a row. The default order is:
//! 1. [`ReleaseKeyStrategy`]: candidate `mcc_release` equals the base
//!    row's `release_date_full`
//! 2. [`SlugOrdinalStrategy`]: candidate slug ordinal equals the base
//!    row's slug ordinal (`MCCBase_39` matches `Reach_39`)

use crate::row::ManifestRow;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Which strategy produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    ReleaseKey,
    SlugOrdinal,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKind::ReleaseKey => write!(f, "release key"),
            MatchKind::SlugOrdinal => write!(f, "slug number"),
        }
    }
}

/// A resolved row and the strategy that found it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
    pub row: &'a ManifestRow,
    pub kind: MatchKind,
}

/// One tier of the matching policy
pub trait MatchStrategy {
    fn kind(&self) -> MatchKind;

    /// First candidate this strategy accepts for `base`, in candidate order
    fn find<'a>(&self, base: &ManifestRow, candidates: &'a [ManifestRow]) -> Option<&'a ManifestRow>;
}

/// Normalize a release label for comparison: trim and turn non-breaking
/// spaces into plain spaces
pub fn normalize_release(s: &str) -> String {
    s.trim().replace('\u{00A0}', " ")
}

/// Match on `mcc_release == release_date_full`
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseKeyStrategy;

impl MatchStrategy for ReleaseKeyStrategy {
    fn kind(&self) -> MatchKind {
        MatchKind::ReleaseKey
    }

    fn find<'a>(&self, base: &ManifestRow, candidates: &'a [ManifestRow]) -> Option<&'a ManifestRow> {
        let base_key = normalize_release(&base.release_date_full);
        if base_key.trim().is_empty() {
            return None;
        }
        candidates
            .iter()
            .find(|r| normalize_release(&r.mcc_release) == base_key)
    }
}

/// Match on equal slug ordinals
#[derive(Debug, Clone, Copy, Default)]
pub struct SlugOrdinalStrategy;

impl MatchStrategy for SlugOrdinalStrategy {
    fn kind(&self) -> MatchKind {
        MatchKind::SlugOrdinal
    }

    fn find<'a>(&self, base: &ManifestRow, candidates: &'a [ManifestRow]) -> Option<&'a ManifestRow> {
        let ordinal = base.ordinal();
        if ordinal <= 0 {
            return None;
        }
        candidates.iter().find(|r| r.ordinal() == ordinal)
    }
}

/// Ordered list of match strategies
pub struct Matcher {
    strategies: Vec<Box<dyn MatchStrategy + Send + Sync>>,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::empty()
            .with_strategy(ReleaseKeyStrategy)
            .with_strategy(SlugOrdinalStrategy)
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|s| s.kind()))
            .finish()
    }
}

impl Matcher {
    /// A matcher with no strategies; it never matches
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append a strategy, tried after the existing ones
    pub fn with_strategy<S>(mut self, strategy: S) -> Self
    where
        S: MatchStrategy + Send + Sync + 'static,
    {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Strategy kinds in evaluation order
    pub fn kinds(&self) -> Vec<MatchKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Find the best row for `base` among `candidates`
    pub fn resolve<'a>(&self, base: &ManifestRow, candidates: &'a [ManifestRow]) -> Option<&'a ManifestRow> {
        self.resolve_detailed(base, candidates).map(|m| m.row)
    }

    /// Like [`Matcher::resolve`], also reporting which strategy matched
    pub fn resolve_detailed<'a>(
        &self,
        base: &ManifestRow,
        candidates: &'a [ManifestRow],
    ) -> Option<Match<'a>> {
        self.strategies.iter().find_map(|strategy| {
            let row = strategy.find(base, candidates)?;
            trace!(base = %base.slug, matched = %row.slug, kind = %strategy.kind(), "resolved");
            Some(Match {
                row,
                kind: strategy.kind(),
            })
        })
    }
}

/// Resolve with the default two-tier policy
pub fn resolve<'a>(base: &ManifestRow, candidates: &'a [ManifestRow]) -> Option<&'a ManifestRow> {
    Matcher::default().resolve(base, candidates)
}
