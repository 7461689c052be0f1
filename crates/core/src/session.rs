//! Loaded inputs and derived state for one interactive session.
//!
//! Template and data source may be loaded or reloaded in either order.
//! Tags are recomputed on every template load and the validation verdict
//! on every load of either input.

use crate::{
    scan, validate, DataSource, Error, MergeEngine, Result, StatusLine, TagSet,
    TemplateDocument, ValidationReport,
};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Message shown when generation is requested too early.
pub const MISSING_INPUT_MESSAGE: &str = "Please load a template and a data source first.";

/// A template that has been opened once and scanned.
#[derive(Debug, Clone)]
pub struct LoadedTemplate {
    pub path: PathBuf,
    pub tags: TagSet,
}

/// Validation is only meaningful once both inputs are present.
fn verdict(tag_count: Option<usize>, column_count: Option<usize>) -> Option<ValidationReport> {
    let report = validate(tag_count?, column_count?);
    if !report.is_ok() {
        log::warn!("{}", report.message);
    }
    Some(report)
}

/// Explicit state shared across user actions.
#[derive(Debug)]
pub struct Session<D: TemplateDocument> {
    template: Option<LoadedTemplate>,
    data_source: Option<DataSource>,
    validation: Option<ValidationReport>,
    _document: PhantomData<D>,
}

impl<D: TemplateDocument> Default for Session<D> {
    fn default() -> Self {
        Self {
            template: None,
            data_source: None,
            validation: None,
            _document: PhantomData,
        }
    }
}

impl<D: TemplateDocument> Session<D> {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open and scan a template, replacing any previous one.
    ///
    /// On failure the previously loaded template is kept.
    pub fn load_template(&mut self, path: impl AsRef<Path>) -> Result<&TagSet> {
        let path = path.as_ref();
        let document = D::open(path)?;
        let tags = scan(&document);
        log::info!("Loaded template {} ({} tags)", path.display(), tags.len());

        self.validation = verdict(
            Some(tags.len()),
            self.data_source.as_ref().map(DataSource::column_count),
        );
        let loaded = self.template.insert(LoadedTemplate {
            path: path.to_path_buf(),
            tags,
        });

        Ok(&loaded.tags)
    }

    /// Install a data source, replacing any previous one.
    pub fn load_data_source(&mut self, data_source: DataSource) -> &[String] {
        log::info!(
            "Loaded data source ({} columns, {} rows)",
            data_source.column_count(),
            data_source.rows().len()
        );
        self.validation = verdict(
            self.template.as_ref().map(|t| t.tags.len()),
            Some(data_source.column_count()),
        );
        self.data_source.insert(data_source).columns()
    }

    /// The loaded template, if any.
    pub fn template(&self) -> Option<&LoadedTemplate> {
        self.template.as_ref()
    }

    /// Tags of the loaded template.
    pub fn tags(&self) -> Option<&TagSet> {
        self.template.as_ref().map(|t| &t.tags)
    }

    /// The loaded data source, if any.
    pub fn data_source(&self) -> Option<&DataSource> {
        self.data_source.as_ref()
    }

    /// Column names of the loaded data source.
    pub fn columns(&self) -> Option<&[String]> {
        self.data_source.as_ref().map(|d| d.columns())
    }

    /// Current validation verdict; present only once both inputs are loaded.
    pub fn validation(&self) -> Option<&ValidationReport> {
        self.validation.as_ref()
    }

    /// Generate one document per row.
    ///
    /// A schema mismatch does not block generation.
    pub fn generate(&self, engine: &MergeEngine, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let (template, data) = match (&self.template, &self.data_source) {
            (Some(template), Some(data)) => (template, data),
            _ => return Err(Error::MissingInput(MISSING_INPUT_MESSAGE.to_string())),
        };

        engine.generate::<D>(&template.path, data.rows(), output_dir)
    }

    /// Run [`generate`](Self::generate) and describe the outcome.
    pub fn generate_with_status(
        &self,
        engine: &MergeEngine,
        output_dir: &Path,
    ) -> (Result<Vec<PathBuf>>, StatusLine) {
        let result = self.generate(engine, output_dir);
        let status = match &result {
            Ok(paths) => StatusLine::generated(paths.len(), output_dir),
            Err(e) => StatusLine::from(e),
        };
        (result, status)
    }
}
