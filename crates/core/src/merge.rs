//! Per-row document generation.
//!
//! Every row produces one output document. The template is re-opened for
//! each row so nothing written for one row can leak into the next.

use crate::scanner::{CLOSE_DELIMITER, OPEN_DELIMITER};
use crate::{ContainerFormat, Error, Result, Row, TemplateDocument};
use std::path::{Path, PathBuf};

/// Default output directory name, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Default stem for generated files (`output_1.pptx`, `output_2.pptx`, ...).
pub const DEFAULT_FILE_PREFIX: &str = "output";

/// Literal `{{key}}` pattern and its rendered replacement for one row.
#[derive(Debug, Clone)]
struct Replacement {
    pattern: String,
    value: String,
}

fn replacements_for(row: &Row) -> Vec<Replacement> {
    row.iter()
        .map(|(key, value)| Replacement {
            pattern: format!("{}{}{}", OPEN_DELIMITER, key, CLOSE_DELIMITER),
            value: value.to_string(),
        })
        .collect()
}

fn apply(text: &str, replacements: &[Replacement]) -> Option<String> {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    let mut replaced = false;

    while let Some(pos) = rest.find(OPEN_DELIMITER) {
        output.push_str(&rest[..pos]);
        let candidate = &rest[pos..];

        match replacements
            .iter()
            .find(|r| candidate.starts_with(r.pattern.as_str()))
        {
            Some(r) => {
                output.push_str(&r.value);
                rest = &candidate[r.pattern.len()..];
                replaced = true;
            }
            None => {
                // Not one of our keys; keep the brace and look again one byte on.
                output.push('{');
                rest = &candidate[1..];
            }
        }
    }
    output.push_str(rest);

    replaced.then_some(output)
}

/// Replace every literal `{{key}}` in `text` with the row's value for `key`.
///
/// Returns `None` when nothing was replaced. Replacement is a single pass:
/// a substituted value that itself contains `{{other}}` is left as is.
/// Placeholders for keys the row does not have are left untouched.
pub fn substitute(text: &str, row: &Row) -> Option<String> {
    apply(text, &replacements_for(row))
}

/// Generates one document per data row.
#[derive(Debug, Clone)]
pub struct MergeEngine {
    /// Stem of each generated file name.
    file_prefix: String,
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self {
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }
}

impl MergeEngine {
    /// Create an engine writing `output_<n>.<ext>` files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom file stem instead of `output`.
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !prefix.is_empty() {
            self.file_prefix = prefix;
        }
        self
    }

    /// Path of the document generated for the 0-based `row_index`.
    pub fn output_path(&self, output_dir: &Path, row_index: usize, extension: &str) -> PathBuf {
        output_dir.join(format!(
            "{}_{}.{}",
            self.file_prefix,
            row_index + 1,
            extension
        ))
    }

    /// Substitute one row into every text unit of `document`.
    ///
    /// Only units that contained at least one of the row's placeholders are
    /// rewritten. Returns the number of rewritten units.
    pub fn merge_row<D: TemplateDocument>(&self, document: &mut D, row: &Row) -> usize {
        let replacements = replacements_for(row);
        let mut rewritten = 0;

        for unit in document.units_mut() {
            if let Some(text) = apply(unit.text(), &replacements) {
                unit.set_text(text);
                rewritten += 1;
            }
        }

        rewritten
    }

    /// Generate one document per row from the template at `template`.
    ///
    /// Creates `output_dir` if needed. Stops at the first row that fails;
    /// documents already written for earlier rows stay on disk.
    pub fn generate<D: TemplateDocument>(
        &self,
        template: &Path,
        rows: &[Row],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(output_dir).map_err(|source| Error::OutputDirectory {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let extension = template
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(ContainerFormat::Pptx.extension());

        let mut written = Vec::with_capacity(rows.len());

        for (idx, row) in rows.iter().enumerate() {
            let path = self.output_path(output_dir, idx, extension);

            let result = D::open(template).and_then(|mut document| {
                let rewritten = self.merge_row(&mut document, row);
                log::debug!(
                    "Row {}: rewrote {} text units -> {}",
                    idx + 1,
                    rewritten,
                    path.display()
                );
                document.save(&path)
            });

            if let Err(e) = result {
                return Err(Error::Document {
                    row: idx + 1,
                    path,
                    source: Box::new(e),
                });
            }

            written.push(path);
        }

        log::info!(
            "Generated {} documents in {}",
            written.len(),
            output_dir.display()
        );

        Ok(written)
    }
}
