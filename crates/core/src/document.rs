//! Abstraction over template documents.
//!
//! The merge engine only needs a document to expose its text-bearing units
//! in order, let their plain text be replaced, and round-trip through a file.

use crate::Result;
use std::path::Path;

/// A text-bearing element of a template (a shape's text body, for decks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    text: String,
    modified: bool,
}

impl TextUnit {
    /// Create an unmodified unit holding `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            modified: false,
        }
    }

    /// The unit's plain text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the unit's text as a whole.
    ///
    /// Backends rewrite a modified unit from its plain text, so any
    /// per-run styling inside the unit collapses to a single run.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.modified = true;
    }

    /// Whether [`set_text`](Self::set_text) has been called.
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

/// A template document that can be scanned and merged.
pub trait TemplateDocument: Sized {
    /// Parse the document at `path`.
    fn open(path: &Path) -> Result<Self>;

    /// Text-bearing units in document order.
    fn units(&self) -> &[TextUnit];

    /// Mutable access to the text-bearing units.
    fn units_mut(&mut self) -> &mut [TextUnit];

    /// Write the document, including any rewritten units, to `path`.
    fn save(&self, path: &Path) -> Result<()>;
}
