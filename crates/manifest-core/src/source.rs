//! Decoded workbook input
//!
//! The loader never touches files itself. It consumes [`RawSheet`]s from a
//! [`SheetSource`], which may be a real spreadsheet decoder or an in-memory
//! grid built in tests.

use crate::cell::CellValue;
use crate::error::{Error, Result};
use std::collections::VecDeque;

/// One decoded sheet: a name and its rows, header row first
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSheet {
    /// Sheet name as the decoder reported it (untrimmed)
    pub name: String,
    /// Rows of cells addressed by zero-based column position
    pub rows: Vec<Vec<CellValue>>,
}

impl RawSheet {
    /// Create a sheet from a name and rows
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// The header row, if the sheet has any rows at all
    pub fn header(&self) -> Option<&[CellValue]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Rows after the header
    pub fn data_rows(&self) -> &[Vec<CellValue>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// Parse CSV text into a sheet. The first record becomes the header row.
    pub fn from_csv_str(name: impl Into<String>, content: &str) -> Result<Self> {
        Self::from_csv_reader(name, content.as_bytes())
    }

    /// Parse CSV from any reader into a sheet
    pub fn from_csv_reader<R: std::io::Read>(name: impl Into<String>, reader: R) -> Result<Self> {
        let name = name.into();
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // Allow varying number of fields
            .from_reader(reader);

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result.map_err(|e| Error::Csv {
                source_name: name.clone(),
                source: e,
            })?;
            rows.push(record.iter().map(CellValue::parse).collect());
        }

        Ok(Self { name, rows })
    }
}

/// A decoder that yields sheets one at a time.
///
/// `Ok(None)` signals that no more sheets remain.
pub trait SheetSource {
    fn next_sheet(&mut self) -> Result<Option<RawSheet>>;
}

/// In-memory sheet source
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sheets: VecDeque<RawSheet>,
}

impl MemorySource {
    pub fn new(sheets: Vec<RawSheet>) -> Self {
        Self {
            sheets: sheets.into(),
        }
    }

    /// Append a sheet to the end of the source
    pub fn push(&mut self, sheet: RawSheet) {
        self.sheets.push_back(sheet);
    }
}

impl From<Vec<RawSheet>> for MemorySource {
    fn from(sheets: Vec<RawSheet>) -> Self {
        Self::new(sheets)
    }
}

impl SheetSource for MemorySource {
    fn next_sheet(&mut self) -> Result<Option<RawSheet>> {
        Ok(self.sheets.pop_front())
    }
}
