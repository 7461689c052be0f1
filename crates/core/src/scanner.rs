//! Placeholder detection.
//!
//! A placeholder is a whitespace-delimited token that starts with `{{` and
//! ends with `}}`. Because tokens are split on whitespace, a name containing
//! spaces, or two placeholders written back to back, is not isolated.

use crate::TemplateDocument;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Opening placeholder delimiter.
pub const OPEN_DELIMITER: &str = "{{";

/// Closing placeholder delimiter.
pub const CLOSE_DELIMITER: &str = "}}";

/// Deduplicated tag names, listed in the order first discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    /// Create an empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag. Returns false if it was already present.
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Whether `tag` has been seen.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Number of distinct tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether no tags were found.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterate tags in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Tags that are not among `columns`, in discovery order.
    pub fn missing_from<'a>(&'a self, columns: &[String]) -> Vec<&'a str> {
        let columns: HashSet<&str> = columns.iter().map(String::as_str).collect();
        self.iter().filter(|t| !columns.contains(t)).collect()
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

/// Extract the tag name from a single token, if it is a placeholder.
///
/// Exactly one delimiter is removed from each end, so `{{{X}}}` names `{X}`
/// and the empty placeholder `{{}}` names the empty tag.
pub fn tag_from_token(token: &str) -> Option<&str> {
    token
        .strip_prefix(OPEN_DELIMITER)?
        .strip_suffix(CLOSE_DELIMITER)
}

/// Collect the tags found in `text` into `tags`.
pub fn scan_text(text: &str, tags: &mut TagSet) {
    for token in text.split_whitespace() {
        if let Some(name) = tag_from_token(token) {
            tags.insert(name);
        }
    }
}

/// Collect the distinct tags of every text-bearing unit in `document`.
pub fn scan<D: TemplateDocument>(document: &D) -> TagSet {
    let mut tags = TagSet::new();
    for unit in document.units() {
        scan_text(unit.text(), &mut tags);
    }
    log::debug!(
        "Scanned {} text units, found {} tags",
        document.units().len(),
        tags.len()
    );
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::LineDocument;

    fn doc(texts: &[&str]) -> LineDocument {
        LineDocument::from_texts(texts)
    }

    #[test]
    fn test_tag_from_token() {
        assert_eq!(tag_from_token("{{NAME}}"), Some("NAME"));
        assert_eq!(tag_from_token("{{{X}}}"), Some("{X}"));
        assert_eq!(tag_from_token("{{}}"), Some(""));
        assert_eq!(tag_from_token("{{}"), None);
        assert_eq!(tag_from_token("{NAME}"), None);
        assert_eq!(tag_from_token("{{NAME}},"), None);
        assert_eq!(tag_from_token("NAME"), None);
    }

    #[test]
    fn test_scan_scenario() {
        let tags = scan(&doc(&["{{NAME}} born {{CITY}}"]));
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["NAME", "CITY"]);
    }

    #[test]
    fn test_scan_deduplicates_across_units() {
        let tags = scan(&doc(&[
            "{{NAME}} and {{NAME}}",
            "Dear {{NAME}}",
            "{{DATE}}\n{{NAME}}",
        ]));
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["NAME", "DATE"]);
    }

    #[test]
    fn test_scan_splits_on_any_whitespace() {
        let tags = scan(&doc(&["{{A}}\t{{B}}\u{b}{{C}}\n{{D}}"]));
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_scan_known_token_limitations() {
        // Names with spaces and adjacent placeholders are not isolated.
        let tags = scan(&doc(&["{{FIRST NAME}}", "{{A}}{{B}}", "({{C}})"]));
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["A}}{{B"]);
    }

    #[test]
    fn test_empty_placeholder_counts_as_a_tag() {
        let tags = scan(&doc(&["{{}} {{A}}", "{{}}"]));
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["", "A"]);
    }

    #[test]
    fn test_scan_empty_document() {
        assert!(scan(&doc(&[])).is_empty());
    }

    #[test]
    fn test_missing_from() {
        let tags = scan(&doc(&["{{NAME}} {{CITY}} {{AGE}}"]));
        let columns = vec!["NAME".to_string(), "AGE".to_string()];
        assert_eq!(tags.missing_from(&columns), vec!["CITY"]);
    }
}
