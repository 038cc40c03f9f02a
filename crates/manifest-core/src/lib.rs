//! manifest-core: Core library for MCC patch manifest workbooks
//!
//! This library provides functionality to:
//! - Read decoded workbook sheets into normalized manifest rows
//! - Separate the "MCC Base" sheet from the per-title sheets
//! - Resolve, for a base release, the matching release of another title

pub mod cell;
pub mod config;
pub mod error;
pub mod loader;
pub mod matcher;
pub mod row;
pub mod source;

pub use cell::CellValue;
pub use config::{ColumnNames, LoaderConfig, DEFAULT_BASE_SHEET};
pub use error::{Error, Result};
pub use loader::{fold_key, load, load_with_config, GroupMatch, HeaderIndex, WorkbookData};
pub use matcher::{
    normalize_release, resolve, Match, MatchKind, MatchStrategy, Matcher, ReleaseKeyStrategy,
    SlugOrdinalStrategy,
};
pub use row::{slug_ordinal, sort_newest_first, ManifestRow};
pub use source::{MemorySource, RawSheet, SheetSource};
