//! Domain types for templates and tabular data sources.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rendering used for date-typed values in merged output.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// The container format of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerFormat {
    /// Slide deck (Office Open XML presentation).
    Pptx,
    /// Spreadsheet (Office Open XML workbook).
    Xlsx,
}

impl ContainerFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }

    /// Check whether the leading bytes look like a ZIP container.
    ///
    /// Both supported formats are ZIP packages (PK\x03\x04), so this only
    /// rules out files that cannot possibly be either.
    pub fn is_zip_magic(bytes: &[u8]) -> bool {
        bytes.len() >= 4 && bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04])
    }

    /// The canonical file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pptx => "pptx",
            Self::Xlsx => "xlsx",
        }
    }
}

/// A scalar value from a data source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    /// Plain text. Blank cells are empty text.
    Text(String),
    /// A numeric value.
    Number(f64),
    /// A calendar date (time of day is ignored when rendering).
    Date(NaiveDateTime),
}

impl CellValue {
    /// A blank cell.
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }

    /// Whether this value renders as an empty string.
    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(text) => f.write_str(text),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Date(dt) => write!(f, "{}", dt.format(DATE_FORMAT)),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// One record of a data source: column name to value, in column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    /// Create a row from (column, value) pairs.
    pub fn new(cells: Vec<(String, CellValue)>) -> Self {
        Self { cells }
    }

    /// Iterate (column, value) pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Look up a value by column name.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v)
    }

    /// Number of cells in this row.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether this row has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether every cell in this row is blank.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_blank())
    }
}

/// Tabular input: fixed named columns and ordered rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSource {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl DataSource {
    /// Build a data source from column names and positional records.
    ///
    /// Records shorter than the column list are padded with blank cells;
    /// extra trailing values are dropped.
    pub fn from_records(columns: Vec<String>, records: Vec<Vec<CellValue>>) -> Self {
        let rows = records
            .into_iter()
            .map(|record| {
                let mut values = record.into_iter();
                let cells = columns
                    .iter()
                    .map(|c| (c.clone(), values.next().unwrap_or_else(CellValue::empty)))
                    .collect();
                Row::new(cells)
            })
            .collect();

        Self { columns, rows }
    }

    /// Column names in source order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Rows in source order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}
