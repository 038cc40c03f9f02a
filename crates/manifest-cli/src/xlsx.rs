//! Spreadsheet workbooks (xlsx, xls, xlsb, ods) read through calamine

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use manifest_core::{CellValue, Error, RawSheet, Result, SheetSource};
use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Yields the sheets of a workbook file in workbook order
pub struct WorkbookSource {
    workbook: Sheets<BufReader<File>>,
    pending: VecDeque<String>,
    source_name: String,
}

impl WorkbookSource {
    pub fn open(path: &Path) -> Result<Self> {
        let source_name = path.display().to_string();
        let workbook = open_workbook_auto(path).map_err(|e| Error::Decode {
            source_name: source_name.clone(),
            message: e.to_string(),
        })?;
        let pending = VecDeque::from(workbook.sheet_names().to_vec());

        Ok(Self {
            workbook,
            pending,
            source_name,
        })
    }
}

impl SheetSource for WorkbookSource {
    fn next_sheet(&mut self) -> Result<Option<RawSheet>> {
        let Some(name) = self.pending.pop_front() else {
            return Ok(None);
        };

        let range = self
            .workbook
            .worksheet_range(&name)
            .map_err(|e| Error::Decode {
                source_name: self.source_name.clone(),
                message: format!("sheet '{}': {}", name, e),
            })?;

        let rows = pad_to_origin(
            range.start(),
            range.rows().map(|r| r.iter().map(convert_cell).collect()),
        );

        debug!(sheet = %name, rows = rows.len(), "decoded sheet");
        Ok(Some(RawSheet::new(name, rows)))
    }
}

/// calamine ranges start at the first used cell; pad back to A1 so the
/// first row read is the sheet's first row
fn pad_to_origin<I>(start: Option<(u32, u32)>, rows: I) -> Vec<Vec<CellValue>>
where
    I: IntoIterator<Item = Vec<CellValue>>,
{
    let (first_row, first_col) = start.unwrap_or((0, 0));
    let mut padded: Vec<Vec<CellValue>> = vec![Vec::new(); first_row as usize];
    for row in rows {
        let mut cells = vec![CellValue::Empty; first_col as usize];
        cells.extend(row);
        padded.push(cells);
    }
    padded
}

/// Map a calamine cell onto the loader's cell model
fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Float(f) => CellValue::Float(*f),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        // Date cells keep their serial number
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(format!("#{:?}", e)),
    }
}
