//! XLSX (Office Open XML) data source backend for slide-deck mail merge.
//!
//! Reads the first worksheet of a .xlsx workbook into a `DataSource`,
//! typing date-formatted numbers as dates.

pub mod reader;
pub mod sheet;
pub mod styles;
pub mod workbook;

pub use reader::XlsxReader;
