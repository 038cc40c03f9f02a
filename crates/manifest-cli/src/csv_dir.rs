//! CSV exports as a workbook: one file per sheet, named by file stem

use manifest_core::{Error, RawSheet, Result, SheetSource};
use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Yields one sheet per CSV file, in path order
#[derive(Debug, Clone)]
pub struct CsvSource {
    pending: VecDeque<PathBuf>,
}

impl CsvSource {
    /// A single CSV file
    pub fn file(path: &Path) -> Self {
        Self {
            pending: VecDeque::from(vec![path.to_path_buf()]),
        }
    }

    /// Every `*.csv` file under `root`, sorted by path
    pub fn scan(root: &Path) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|e| Error::Decode {
                source_name: root.display().to_string(),
                message: e.to_string(),
            })?;
            let path = entry.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if entry.file_type().is_file() && is_csv {
                paths.push(path.to_path_buf());
            }
        }
        paths.sort();

        Ok(Self {
            pending: paths.into(),
        })
    }
}

impl SheetSource for CsvSource {
    fn next_sheet(&mut self) -> Result<Option<RawSheet>> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };

        let file = File::open(&path).map_err(|e| Error::FileRead {
            path: path.clone(),
            source: e,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        RawSheet::from_csv_reader(name, BufReader::new(file)).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_directory_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Reach.CSV"), "Slug\nReach_1\n").unwrap();
        fs::write(dir.path().join("MCC Base.csv"), "Slug,Name\nMCCBase_1,MCC Base\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = CsvSource::scan(dir.path()).unwrap();
        assert_eq!(source.pending.len(), 2);

        let first = source.next_sheet().unwrap().unwrap();
        assert_eq!(first.name, "MCC Base");
        assert_eq!(first.data_rows().len(), 1);

        let second = source.next_sheet().unwrap().unwrap();
        assert_eq!(second.name, "Reach");
        assert!(source.next_sheet().unwrap().is_none());
    }

    #[test]
    fn test_directory_loads_as_workbook() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("MCC Base.csv"),
            "Slug,Name,ReleaseDateFull\nMCCBase_39,MCC Base,March 1 2024\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("Reach.csv"),
            "Slug,Name,MCC Release\nReach_12,Halo Reach,March 1 2024\n",
        )
        .unwrap();

        let data = manifest_core::load(&mut CsvSource::scan(dir.path()).unwrap()).unwrap();
        let base = data.latest_base().unwrap();
        let matched = manifest_core::resolve(base, data.group("Reach").unwrap()).unwrap();
        assert_eq!(matched.slug, "Reach_12");
    }

    #[test]
    fn test_missing_file() {
        let mut source = CsvSource::file(Path::new("/nonexistent/Reach.csv"));
        assert!(matches!(source.next_sheet(), Err(Error::FileRead { .. })));
    }
}
