//! Error types for slide-deck mail merge.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading inputs or generating documents.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read an input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// ZIP container error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error inside a container part.
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// The spreadsheet could not be turned into a data source.
    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(String),

    /// Generation was requested before both inputs were loaded.
    #[error("{0}")]
    MissingInput(String),

    /// The output directory could not be created.
    #[error("Failed to create output directory '{}': {source}", path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The template could not be parsed or the output could not be written
    /// for a given row (1-based).
    #[error("Failed to generate '{}' for row {row}: {source}", path.display())]
    Document {
        row: usize,
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

/// Coarse classification of [`Error`] values as seen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required input has not been loaded yet.
    MissingInput,
    /// The output directory is unusable; nothing was generated.
    IoFailure,
    /// A row's document failed; the batch stopped at that row.
    DocumentFailure,
    /// An input file could not be read or understood.
    InvalidInput,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingInput(_) => ErrorKind::MissingInput,
            Error::OutputDirectory { .. } => ErrorKind::IoFailure,
            Error::Document { .. } => ErrorKind::DocumentFailure,
            _ => ErrorKind::InvalidInput,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let missing = Error::MissingInput("load a template".to_string());
        assert_eq!(missing.kind(), ErrorKind::MissingInput);

        let dir = Error::OutputDirectory {
            path: PathBuf::from("out"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(dir.kind(), ErrorKind::IoFailure);

        let doc = Error::Document {
            row: 3,
            path: PathBuf::from("out/output_3.pptx"),
            source: Box::new(Error::ZipError("truncated".to_string())),
        };
        assert_eq!(doc.kind(), ErrorKind::DocumentFailure);
        assert!(doc.to_string().contains("row 3"));

        assert_eq!(
            Error::XmlError("bad".to_string()).kind(),
            ErrorKind::InvalidInput
        );
    }
}
