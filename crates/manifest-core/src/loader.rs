//! Workbook loader: turns decoded sheets into sorted manifest rows
//!
//! Each sheet's header row is indexed by folded label, every data row with a
//! slug becomes a [`ManifestRow`], and rows are sorted newest first. The base
//! sheet is kept apart from the others and must yield at least one row.

use crate::cell::{CellValue, OutOfRange};
use crate::config::{ColumnNames, LoaderConfig};
use crate::error::{Error, Result};
use crate::matcher::{Match, Matcher};
use crate::row::{sort_newest_first, ManifestRow};
use crate::source::SheetSource;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

/// Everything loaded from one workbook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkbookData {
    /// Self-named rows of the base sheet, newest first
    pub base_rows: Vec<ManifestRow>,
    /// Rows of every other sheet, keyed by folded sheet name
    pub groups: BTreeMap<String, Vec<ManifestRow>>,
    /// Every non-blank sheet name in source order, base included
    pub group_names: Vec<String>,
}

impl WorkbookData {
    /// Rows of a non-base sheet, looked up case-insensitively
    pub fn group(&self, name: &str) -> Option<&[ManifestRow]> {
        self.groups.get(&fold_key(name)).map(Vec::as_slice)
    }

    /// First base row whose slug matches, case-insensitively
    pub fn find_base(&self, slug: &str) -> Option<&ManifestRow> {
        let key = fold_key(slug);
        self.base_rows.iter().find(|r| fold_key(&r.slug) == key)
    }

    /// The newest base row
    pub fn latest_base(&self) -> Option<&ManifestRow> {
        self.base_rows.first()
    }

    /// Names of the loaded non-base sheets in source order, without repeats
    pub fn sheet_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.group_names
            .iter()
            .filter(|name| self.groups.contains_key(&fold_key(name)))
            .filter(|name| seen.insert(fold_key(name)))
            .map(String::as_str)
            .collect()
    }

    /// Resolve `base` against every non-base sheet
    pub fn resolve_all<'a>(&'a self, base: &ManifestRow, matcher: &Matcher) -> Vec<GroupMatch<'a>> {
        self.sheet_names()
            .into_iter()
            .map(|sheet| {
                let candidates = self.group(sheet).unwrap_or(&[]);
                GroupMatch {
                    sheet,
                    matched: matcher.resolve_detailed(base, candidates),
                }
            })
            .collect()
    }
}

/// Result of resolving a base row against one sheet
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMatch<'a> {
    pub sheet: &'a str,
    pub matched: Option<Match<'a>>,
}

/// Fold text into a lookup key for sheet names and header labels
pub fn fold_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Maps folded header labels to column positions; the first occurrence wins
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new(header: &[CellValue]) -> Self {
        let mut columns = HashMap::new();
        for (i, cell) in header.iter().enumerate() {
            let label = cell.to_string_value();
            if label.trim().is_empty() {
                continue;
            }
            columns.entry(fold_key(&label)).or_insert(i);
        }
        Self { columns }
    }

    /// Column position of a header label, case-insensitive
    pub fn get(&self, label: &str) -> Option<usize> {
        self.columns.get(&fold_key(label)).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

static EMPTY: CellValue = CellValue::Empty;

/// Reads named fields out of one data row
struct RowReader<'a> {
    sheet: &'a str,
    index: &'a HeaderIndex,
    cells: &'a [CellValue],
}

impl<'a> RowReader<'a> {
    fn cell(&self, label: &str) -> &'a CellValue {
        self.index
            .get(label)
            .and_then(|i| self.cells.get(i))
            .unwrap_or(&EMPTY)
    }

    fn string(&self, label: &str) -> String {
        self.cell(label).to_string_value().trim().to_string()
    }

    fn optional_u64(&self, label: &str) -> Result<Option<u64>> {
        self.cell(label)
            .as_u64()
            .map_err(|OutOfRange(value)| Error::IntegerOverflow {
                sheet: self.sheet.to_string(),
                column: label.to_string(),
                value,
            })
    }

    fn u64_or_zero(&self, label: &str) -> Result<u64> {
        Ok(self.optional_u64(label)?.unwrap_or(0))
    }

    /// Build a row, or `None` when the slug is blank
    fn read(&self, columns: &ColumnNames) -> Result<Option<ManifestRow>> {
        let slug = self.string(&columns.slug);
        if slug.is_empty() {
            return Ok(None);
        }

        Ok(Some(ManifestRow {
            sheet: self.sheet.to_string(),
            slug,
            name: self.string(&columns.name),
            app_id: self.u64_or_zero(&columns.app_id)?,
            depot_id: self.u64_or_zero(&columns.depot_id)?,
            manifest_id: self.u64_or_zero(&columns.manifest_id)?,
            total_size_bytes: self.optional_u64(&columns.total_size_bytes)?,
            release_date_full: self.string(&columns.release_date_full),
            mcc_release: self.string(&columns.mcc_release),
        }))
    }
}

/// Load a workbook using the default sheet and column names
pub fn load<S: SheetSource + ?Sized>(source: &mut S) -> Result<WorkbookData> {
    load_with_config(source, &LoaderConfig::default())
}

/// Load a workbook, consuming every sheet the source yields
pub fn load_with_config<S: SheetSource + ?Sized>(
    source: &mut S,
    config: &LoaderConfig,
) -> Result<WorkbookData> {
    let base_key = fold_key(&config.base_sheet);

    let mut base_rows = Vec::new();
    let mut groups = BTreeMap::new();
    let mut group_names = Vec::new();

    while let Some(sheet) = source.next_sheet()? {
        let sheet_name = sheet.name.trim();
        if sheet_name.is_empty() {
            debug!("skipping sheet with blank name");
            continue;
        }

        group_names.push(sheet_name.to_string());

        let Some(header) = sheet.header() else {
            debug!(sheet = sheet_name, "skipping sheet without header row");
            continue;
        };
        let index = HeaderIndex::new(header);

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for cells in sheet.data_rows() {
            let reader = RowReader {
                sheet: sheet_name,
                index: &index,
                cells,
            };
            match reader.read(&config.columns)? {
                Some(row) => rows.push(row),
                None => skipped += 1,
            }
        }

        sort_newest_first(&mut rows);
        debug!(
            sheet = sheet_name,
            rows = rows.len(),
            skipped,
            "read sheet"
        );

        if fold_key(sheet_name) == base_key {
            base_rows = rows
                .into_iter()
                .filter(|r| fold_key(&r.name) == base_key)
                .collect();
            sort_newest_first(&mut base_rows);
        } else {
            groups.insert(fold_key(sheet_name), rows);
        }
    }

    if base_rows.is_empty() {
        return Err(Error::MissingBaseData {
            sheet: config.base_sheet.clone(),
        });
    }

    info!(
        sheets = group_names.len(),
        base_rows = base_rows.len(),
        "loaded workbook"
    );

    Ok(WorkbookData {
        base_rows,
        groups,
        group_names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::MatchKind;
    use crate::source::{MemorySource, RawSheet};

    const HEADER: &str =
        "Slug,Name,AppID,DepotID,ManifestID,TotalSizeBytes,ReleaseDateFull,MCC Release\n";

    fn sheet(name: &str, body: &str) -> RawSheet {
        RawSheet::from_csv_str(name, &format!("{}{}", HEADER, body)).unwrap()
    }

    fn base_sheet() -> RawSheet {
        sheet(
            "MCC Base",
            "MCCBase_38,MCC Base,976730,976731,111,1000,Feb 2024,\n\
             MCCBase_40,MCC Base,976730,976731,333,3000,April 2024,\n\
             MCCBase_39,MCC Base,976730,976731,222,,March 1 2024,\n",
        )
    }

    fn slugs(rows: &[ManifestRow]) -> Vec<&str> {
        rows.iter().map(|r| r.slug.as_str()).collect()
    }

    fn load_sheets(sheets: Vec<RawSheet>) -> Result<WorkbookData> {
        load(&mut MemorySource::new(sheets))
    }

    #[test]
    fn test_load_basic_workbook() {
        let reach = sheet(
            "Reach",
            "Reach_1,Halo Reach,1064220,1064221,9,500,Dec 2019,Feb 2024\n\
             Reach_10,Halo Reach,1064220,1064221,10,,Jan 2024,March 1 2024\n\
             Reach_2,Halo Reach,1064220,1064221,11,,Nov 2023,\n",
        );
        let data = load_sheets(vec![base_sheet(), reach]).unwrap();

        assert_eq!(slugs(&data.base_rows), vec!["MCCBase_40", "MCCBase_39", "MCCBase_38"]);
        assert_eq!(data.group_names, vec!["MCC Base", "Reach"]);
        assert!(data.group("MCC Base").is_none());

        let reach = data.group("reach").unwrap();
        assert_eq!(slugs(reach), vec!["Reach_10", "Reach_2", "Reach_1"]);
        assert_eq!(reach[0].sheet, "Reach");
        assert_eq!(reach[0].app_id, 1064220);
        assert_eq!(reach[0].total_size_bytes, None);
        assert_eq!(reach[2].total_size_bytes, Some(500));
        assert_eq!(reach[0].mcc_release, "March 1 2024");
    }

    #[test]
    fn test_load_is_deterministic() {
        let build = || vec![base_sheet(), sheet("Reach", "Reach_1,R,1,2,3,,x,y\n")];
        assert_eq!(load_sheets(build()).unwrap(), load_sheets(build()).unwrap());
    }

    #[test]
    fn test_blank_slug_rows_dropped() {
        let reach = sheet("Reach", ",Halo Reach,1,2,3,,,\n   ,Halo Reach,1,2,3,,,\nReach_1,,,,,,,\n");
        let data = load_sheets(vec![base_sheet(), reach]).unwrap();
        assert_eq!(slugs(data.group("Reach").unwrap()), vec!["Reach_1"]);
    }

    #[test]
    fn test_base_rows_require_self_name() {
        let base = sheet(
            "MCC Base",
            "MCCBase_1,MCC Base,,,,,,\n\
             Other_2,Something Else,,,,,,\n\
             MCCBase_3,  mcc base ,,,,,,\n",
        );
        let data = load_sheets(vec![base]).unwrap();
        assert_eq!(slugs(&data.base_rows), vec!["MCCBase_3", "MCCBase_1"]);
    }

    #[test]
    fn test_missing_base_sheet_fails() {
        let err = load_sheets(vec![sheet("Reach", "Reach_1,R,,,,,,\n")]).unwrap_err();
        assert!(matches!(err, Error::MissingBaseData { .. }));
    }

    #[test]
    fn test_base_sheet_without_self_rows_fails() {
        let base = sheet("MCC Base", "MCCBase_1,Not Base,,,,,,\n");
        let err = load_sheets(vec![base]).unwrap_err();
        assert!(matches!(err, Error::MissingBaseData { .. }));
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let base = RawSheet::from_csv_str(
            "mcc base",
            " slug ,NAME,appid,Slug\nMCCBase_5,MCC Base,42,ignored\n",
        )
        .unwrap();
        let data = load_sheets(vec![base]).unwrap();

        let row = &data.base_rows[0];
        assert_eq!(row.slug, "MCCBase_5");
        assert_eq!(row.app_id, 42);
        assert_eq!(row.depot_id, 0);
        assert_eq!(row.release_date_full, "");
    }

    #[test]
    fn test_blank_and_headerless_sheets() {
        let data = load_sheets(vec![
            RawSheet::new("   ", vec![]),
            RawSheet::new(" Empty ", vec![]),
            base_sheet(),
        ])
        .unwrap();

        assert_eq!(data.group_names, vec!["Empty", "MCC Base"]);
        assert!(data.group("Empty").is_none());
        assert!(data.sheet_names().is_empty());
    }

    #[test]
    fn test_numeric_cells() {
        let base = RawSheet::new(
            "MCC Base",
            vec![
                vec!["Slug".into(), "Name".into(), "ManifestID".into(), "TotalSizeBytes".into()],
                vec![
                    "MCCBase_1".into(),
                    "MCC Base".into(),
                    CellValue::Float(12345.75),
                    CellValue::Integer(987),
                ],
                vec![
                    "MCCBase_2".into(),
                    "MCC Base".into(),
                    "_555_".into(),
                    "unknown".into(),
                ],
            ],
        );
        let data = load_sheets(vec![base]).unwrap();

        let newest = &data.base_rows[0];
        assert_eq!(newest.manifest_id, 555);
        assert_eq!(newest.total_size_bytes, None);

        let older = &data.base_rows[1];
        assert_eq!(older.manifest_id, 12345);
        assert_eq!(older.total_size_bytes, Some(987));
    }

    #[test]
    fn test_unparseable_required_integer_defaults_to_zero() {
        let base = sheet("MCC Base", "MCCBase_1,MCC Base,abc,?,,,,\n");
        let row = &load_sheets(vec![base]).unwrap().base_rows[0];
        assert_eq!(row.app_id, 0);
        assert_eq!(row.depot_id, 0);
        assert_eq!(row.manifest_id, 0);
    }

    #[test]
    fn test_negative_placeholders_load_softly() {
        let base = RawSheet::from_csv_str(
            "MCC Base",
            "Slug,Name,AppID,TotalSizeBytes\nMCCBase_1,MCC Base,-1,-1\nMCCBase_2,MCC Base,\"-1\",\n",
        )
        .unwrap();
        assert_eq!(base.data_rows()[0][2], CellValue::Integer(-1));

        let data = load_sheets(vec![base]).unwrap();
        for row in &data.base_rows {
            assert_eq!(row.app_id, 0);
            assert_eq!(row.total_size_bytes, None);
        }
    }

    #[test]
    fn test_numeric_overflow_fails_load() {
        let base = RawSheet::new(
            "MCC Base",
            vec![
                vec!["Slug".into(), "Name".into(), "TotalSizeBytes".into()],
                vec!["MCCBase_1".into(), "MCC Base".into(), CellValue::Float(1e300)],
            ],
        );
        let err = load_sheets(vec![base]).unwrap_err();
        match err {
            Error::IntegerOverflow { sheet, column, .. } => {
                assert_eq!(sheet, "MCC Base");
                assert_eq!(column, "TotalSizeBytes");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_sheet_names_replace() {
        let first = sheet("Reach", "Reach_1,R,,,,,,\n");
        let second = sheet("REACH", "Reach_2,R,,,,,,\n");
        let data = load_sheets(vec![base_sheet(), first, second]).unwrap();

        assert_eq!(data.group_names, vec!["MCC Base", "Reach", "REACH"]);
        assert_eq!(slugs(data.group("reach").unwrap()), vec!["Reach_2"]);
        assert_eq!(data.sheet_names(), vec!["Reach"]);
    }

    #[test]
    fn test_custom_config() {
        let mut config = LoaderConfig::default();
        config.base_sheet = "Base".to_string();
        config.columns.slug = "Id".to_string();

        let base = RawSheet::from_csv_str("Base", "Id,Name\nB_1,Base\n").unwrap();
        let data = load_with_config(&mut MemorySource::new(vec![base]), &config).unwrap();
        assert_eq!(slugs(&data.base_rows), vec!["B_1"]);
    }

    #[test]
    fn test_find_base_and_resolve_all() {
        let reach = sheet("Reach", "Reach_39,R,,,,,,\nReach_40,R,,,,,,\n");
        let h3 = sheet("Halo 3", "H3_7,H3,,,,,,March 1 2024\n");
        let odst = sheet("ODST", "ODST_1,O,,,,,,\n");
        let data = load_sheets(vec![base_sheet(), reach, h3, odst]).unwrap();

        assert!(data.find_base("mccbase_99").is_none());
        let base = data.find_base("mccbase_39").unwrap();
        assert_eq!(data.latest_base().unwrap().slug, "MCCBase_40");

        let results = data.resolve_all(base, &Matcher::default());
        assert_eq!(results.len(), 3);

        assert_eq!(results[0].sheet, "Reach");
        let reach_match = results[0].matched.as_ref().unwrap();
        assert_eq!(reach_match.row.slug, "Reach_39");
        assert_eq!(reach_match.kind, MatchKind::SlugOrdinal);

        assert_eq!(results[1].sheet, "Halo 3");
        let h3_match = results[1].matched.as_ref().unwrap();
        assert_eq!(h3_match.row.slug, "H3_7");
        assert_eq!(h3_match.kind, MatchKind::ReleaseKey);

        assert!(results[2].matched.is_none());
    }

    #[test]
    fn test_header_index() {
        let header: Vec<CellValue> = vec!["A".into(), CellValue::Empty, "  ".into(), "a".into()];
        let index = HeaderIndex::new(&header);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(" A "), Some(0));
        assert_eq!(index.get("b"), None);
    }
}
