//! Tag count versus column count validation.
//!
//! The check is purely numeric: equal counts pass even when the tag names
//! and column names do not correspond.

use serde::{Deserialize, Serialize};

/// Outcome of comparing tag count to column count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// Counts are equal.
    Ok,
    /// Counts differ. Advisory only; generation is not blocked.
    Mismatch,
}

/// Validation verdict with a user-facing message naming both counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    pub tag_count: usize,
    pub column_count: usize,
    pub message: String,
}

impl ValidationReport {
    /// Whether the counts matched.
    pub fn is_ok(&self) -> bool {
        self.status == ValidationStatus::Ok
    }
}

/// Compare the number of template tags with the number of data columns.
pub fn validate(tag_count: usize, column_count: usize) -> ValidationReport {
    let (status, message) = if tag_count == column_count {
        (
            ValidationStatus::Ok,
            format!(
                "Validation passed: {} columns in the data source match {} placeholders in the template.",
                column_count, tag_count
            ),
        )
    } else {
        (
            ValidationStatus::Mismatch,
            format!(
                "Error: the number of columns in the data source ({}) does not match the number of placeholders in the template ({}).",
                column_count, tag_count
            ),
        )
    };

    ValidationReport {
        status,
        tag_count,
        column_count,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_counts_pass() {
        let report = validate(2, 2);
        assert_eq!(report.status, ValidationStatus::Ok);
        assert!(report.is_ok());
        assert!(report.message.contains('2'));
    }

    #[test]
    fn test_mismatch_names_both_counts() {
        let report = validate(3, 2);
        assert_eq!(report.status, ValidationStatus::Mismatch);
        assert!(report.message.contains("(3)"));
        assert!(report.message.contains("(2)"));
    }

    #[test]
    fn test_count_only_rule() {
        // Any tag set with as many entries as there are columns passes.
        for n in 0..5 {
            assert!(validate(n, n).is_ok());
            assert!(!validate(n, n + 1).is_ok());
        }
    }

    #[test]
    fn test_ok_message_names_both_counts() {
        let report = validate(0, 0);
        assert_eq!(
            report.message,
            "Validation passed: 0 columns in the data source match 0 placeholders in the template."
        );
    }
}
