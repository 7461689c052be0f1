//! User-facing status line.

use crate::{Error, ValidationReport, ValidationStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// How a status message should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Error,
    Success,
}

/// A single status message with its severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLine {
    pub severity: Severity,
    pub message: String,
}

impl StatusLine {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    /// Status after a successful generation run.
    pub fn generated(count: usize, output_dir: &Path) -> Self {
        Self::new(
            Severity::Normal,
            format!(
                "Generated {} files successfully in folder '{}'.",
                count,
                output_dir.display()
            ),
        )
    }
}

impl From<&ValidationReport> for StatusLine {
    fn from(report: &ValidationReport) -> Self {
        let severity = match report.status {
            ValidationStatus::Ok => Severity::Success,
            ValidationStatus::Mismatch => Severity::Error,
        };
        Self::new(severity, report.message.clone())
    }
}

impl From<&Error> for StatusLine {
    fn from(error: &Error) -> Self {
        Self::new(Severity::Error, error.to_string())
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate;

    #[test]
    fn test_validation_severity() {
        assert_eq!(StatusLine::from(&validate(2, 2)).severity, Severity::Success);
        assert_eq!(StatusLine::from(&validate(3, 2)).severity, Severity::Error);
    }

    #[test]
    fn test_generated_message_names_folder() {
        let status = StatusLine::generated(4, Path::new("output"));
        assert_eq!(status.severity, Severity::Normal);
        assert!(status.to_string().contains("'output'"));
        assert!(status.message.contains('4'));
    }

    #[test]
    fn test_error_status() {
        let error = Error::MissingInput("Please load a template first.".to_string());
        let status = StatusLine::from(&error);
        assert_eq!(status.severity, Severity::Error);
        assert_eq!(status.message, "Please load a template first.");
    }
}
