//! Plain-text template document used by unit tests.

use crate::{Error, Result, TemplateDocument, TextUnit};
use std::path::Path;

/// Marker text that makes [`LineDocument::save`] fail.
pub const FAIL_ON_SAVE: &str = "!fail!";

/// One text unit per line of a plain text file.
pub struct LineDocument {
    pub units: Vec<TextUnit>,
}

impl LineDocument {
    pub fn from_texts(texts: &[&str]) -> Self {
        Self {
            units: texts.iter().map(|t| TextUnit::new(*t)).collect(),
        }
    }
}

impl TemplateDocument for LineDocument {
    fn open(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self {
            units: content.lines().map(TextUnit::new).collect(),
        })
    }

    fn units(&self) -> &[TextUnit] {
        &self.units
    }

    fn units_mut(&mut self) -> &mut [TextUnit] {
        &mut self.units
    }

    fn save(&self, path: &Path) -> Result<()> {
        if self.units.iter().any(|u| u.text().contains(FAIL_ON_SAVE)) {
            return Err(Error::XmlError("refusing to save".to_string()));
        }
        let lines: Vec<&str> = self.units.iter().map(|u| u.text()).collect();
        std::fs::write(path, lines.join("\n"))?;
        Ok(())
    }
}
