//! Workbook-level parts: sheet list, relationships, shared strings.

use deckmerge_core::package::{is_relationship_id, local_name, resolve_target};
use deckmerge_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Directory that workbook relationship targets are relative to.
const WORKBOOK_DIR: &str = "xl";

/// What the reader needs from `xl/workbook.xml`.
#[derive(Debug, Default, Clone)]
pub struct WorkbookInfo {
    /// Relationship id of the first sheet in workbook order.
    pub first_sheet_rel: Option<String>,
    /// Name of the first sheet, for messages.
    pub first_sheet_name: Option<String>,
    /// Whether dates count from 1904 instead of 1900.
    pub date1904: bool,
}

/// Parse `xl/workbook.xml`.
pub fn parse_workbook(xml: &str) -> Result<WorkbookInfo> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut info = WorkbookInfo::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"workbookPr" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"date1904" {
                                let value = String::from_utf8_lossy(&attr.value).to_lowercase();
                                info.date1904 = value == "1" || value == "true";
                            }
                        }
                    }
                    b"sheet" if info.first_sheet_rel.is_none() => {
                        for attr in e.attributes().flatten() {
                            let key = attr.key.as_ref();
                            if is_relationship_id(key) {
                                info.first_sheet_rel =
                                    Some(String::from_utf8_lossy(&attr.value).to_string());
                            } else if key == b"name" {
                                info.first_sheet_name = attr.unescape_value().ok().map(|v| v.to_string());
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing workbook: {}", e)));
            }
            _ => {}
        }
    }

    Ok(info)
}

/// Find the part path of relationship `id` in `xl/_rels/workbook.xml.rels`.
pub fn resolve_sheet_path(rels_xml: &str, id: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(rels_xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel_id = String::new();
                let mut target = String::new();
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => rel_id = String::from_utf8_lossy(&attr.value).to_string(),
                        b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                        _ => {}
                    }
                }
                if rel_id == id {
                    return Ok(Some(resolve_target(WORKBOOK_DIR, &target)));
                }
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }
}

/// Parse `xl/sharedStrings.xml` into the shared string table.
///
/// Rich-text runs are concatenated; phonetic hints are skipped.
pub fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"si" => current = Some(String::new()),
                b"rPh" => in_phonetic = true,
                b"t" => in_text = current.is_some() && !in_phonetic,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if local_name(e.name().as_ref()) == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::Text(ref e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::XmlError(format!("Bad shared string: {}", e)))?;
                if let Some(current) = current.as_mut() {
                    current.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"si" => {
                    if let Some(done) = current.take() {
                        strings.push(done);
                    }
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing shared strings: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(strings)
}
