//! Core domain types, placeholder scanning, schema validation, and the
//! merge engine for generating one slide deck per data row.

pub mod document;
pub mod error;
pub mod merge;
pub mod package;
pub mod scanner;
pub mod session;
pub mod status;
#[cfg(test)]
mod testing;
pub mod types;
pub mod validate;

pub use document::{TemplateDocument, TextUnit};
pub use error::{Error, ErrorKind, Result};
pub use merge::{substitute, MergeEngine, DEFAULT_FILE_PREFIX, DEFAULT_OUTPUT_DIR};
pub use scanner::{scan, scan_text, TagSet};
pub use session::{LoadedTemplate, Session};
pub use status::{Severity, StatusLine};
pub use types::{CellValue, ContainerFormat, DataSource, Row, DATE_FORMAT};
pub use validate::{validate, ValidationReport, ValidationStatus};
