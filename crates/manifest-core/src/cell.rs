//! Untyped cell values as produced by a workbook decoder

use serde::{Deserialize, Serialize};

/// A cell value with type detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Integer value
    Integer(i64),
    /// Floating-point value (spreadsheet numbers, including decimals)
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// String value
    String(String),
    /// Empty/null cell
    Empty,
}

/// A numeric cell whose value has no unsigned integer representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutOfRange(pub f64);

impl CellValue {
    /// Parse a string into a CellValue, detecting the type
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        // Try parsing as integer first
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Integer(i);
        }

        // Manifest IDs use the full u64 range; a float would lose digits
        if trimmed.parse::<u64>().is_ok() {
            return CellValue::String(trimmed.to_string());
        }

        if let Ok(f) = trimmed.parse::<f64>() {
            return CellValue::Float(f);
        }

        CellValue::String(trimmed.to_string())
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Convert to a display string
    pub fn to_string_value(&self) -> String {
        match self {
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => format_float(*f),
            CellValue::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::Empty => String::new(),
        }
    }

    /// Read the cell as an unsigned integer.
    ///
    /// Numeric cells are truncated toward zero; only non-finite values and
    /// values past `u64::MAX` are an error. Anything else goes through its
    /// string form with surrounding whitespace and underscores stripped.
    /// `Ok(None)` means the cell was blank, negative, or not an integer.
    pub fn as_u64(&self) -> Result<Option<u64>, OutOfRange> {
        match self {
            CellValue::Integer(i) => Ok(u64::try_from(*i).ok()),
            CellValue::Float(f) => truncate_float(*f),
            CellValue::Empty => Ok(None),
            other => Ok(parse_integer_text(&other.to_string_value())),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_value())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::String(s.to_string())
        }
    }
}

/// Parse integer text the way spreadsheet exports write it, e.g. `_1234_`
pub fn parse_integer_text(s: &str) -> Option<u64> {
    s.trim().trim_matches('_').trim().parse::<u64>().ok()
}

// 2^64, the first float past u64::MAX
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

fn truncate_float(f: f64) -> Result<Option<u64>, OutOfRange> {
    let t = f.trunc();
    if !t.is_finite() || t >= U64_LIMIT {
        return Err(OutOfRange(f));
    }
    // Negative numbers take the same soft path as negative text
    // (-0.5 truncates to -0.0, which is not below zero)
    if t < 0.0 {
        return Ok(None);
    }
    Ok(Some(t as u64))
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}
