//! PPTX package reading and slide segmentation.
//!
//! A slide's XML is split into raw byte ranges that are copied through
//! untouched and the text bodies of its shapes, which become text units.

use deckmerge_core::package::{is_relationship_id, local_name, prefix_of, resolve_target};
use deckmerge_core::{Error, Result, TextUnit};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::{CompressionMethod, DateTime, ZipArchive};

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";

/// Directory that relationship targets in presentation.xml.rels are relative to.
const PRESENTATION_DIR: &str = "ppt";

/// Character used for a line break inside a paragraph.
pub(crate) const LINE_BREAK: char = '\u{b}';

/// A file stored in the package, kept verbatim until save.
#[derive(Debug, Clone)]
pub(crate) struct PackagePart {
    pub name: String,
    pub data: Vec<u8>,
    pub is_dir: bool,
    pub compression: CompressionMethod,
    pub last_modified: DateTime,
}

/// A piece of slide XML.
#[derive(Debug, Clone)]
pub(crate) enum Segment {
    /// Copied through unchanged.
    Raw(String),
    /// A shape text body backed by a text unit.
    Body(TextBody),
}

/// The pieces of a `txBody` element needed to rewrite it.
#[derive(Debug, Clone)]
pub(crate) struct TextBody {
    /// Index into the document's text units.
    pub unit: usize,
    /// The start tag, attributes included.
    pub open: String,
    /// Everything between the start tag and the first paragraph.
    pub prefix: String,
    /// The end tag.
    pub close: String,
    /// The whole element as found in the template.
    pub original: String,
    /// Namespace prefix used by the paragraphs (usually `a`).
    pub ns: String,
}

/// A relationship entry from a `.rels` part.
#[derive(Debug, Default)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

/// Read every entry of the ZIP package in archive order.
pub(crate) fn read_parts<R: Read + Seek>(reader: R) -> Result<Vec<PackagePart>> {
    let mut archive = ZipArchive::new(reader)
        .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

    let mut parts = Vec::with_capacity(archive.len());
    for idx in 0..archive.len() {
        let mut file = archive
            .by_index(idx)
            .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", idx, e)))?;
        let name = file.name().to_string();

        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;

        parts.push(PackagePart {
            is_dir: file.is_dir(),
            compression: file.compression(),
            last_modified: file.last_modified(),
            name,
            data,
        });
    }

    Ok(parts)
}

/// Look up a part by name and decode it as UTF-8.
pub(crate) fn part_text<'a>(parts: &'a [PackagePart], path: &str) -> Result<&'a str> {
    let part = parts
        .iter()
        .find(|p| p.name == path)
        .ok_or_else(|| Error::ZipError(format!("File not found in archive '{}'", path)))?;

    std::str::from_utf8(&part.data)
        .map_err(|e| Error::XmlError(format!("'{}' is not valid UTF-8: {}", path, e)))
}

/// Get the ordered list of slide part names.
///
/// Order comes from the `sldIdLst` of presentation.xml. When that list is
/// missing, slide relationships are ordered by their numeric suffix.
pub(crate) fn slide_order(parts: &[PackagePart]) -> Result<Vec<String>> {
    let rels_content = part_text(parts, PRESENTATION_RELS_PATH).map_err(|_| {
        Error::UnsupportedFormat(format!(
            "Not a presentation: '{}' is missing",
            PRESENTATION_RELS_PATH
        ))
    })?;

    let slide_rels: Vec<Relationship> = parse_relationships(rels_content)?
        .into_iter()
        .filter(|r| r.rel_type.ends_with("/slide"))
        .collect();

    let listed = match part_text(parts, PRESENTATION_PATH) {
        Ok(content) => parse_slide_id_list(content)?,
        Err(_) => Vec::new(),
    };

    if !listed.is_empty() {
        let by_id: HashMap<&str, &Relationship> =
            slide_rels.iter().map(|r| (r.id.as_str(), r)).collect();

        let mut paths = Vec::with_capacity(listed.len());
        for id in &listed {
            match by_id.get(id.as_str()) {
                Some(rel) => paths.push(resolve_target(PRESENTATION_DIR, &rel.target)),
                None => log::warn!("Slide list references unknown relationship {}", id),
            }
        }
        return Ok(paths);
    }

    let mut slides: Vec<(String, Option<usize>)> = slide_rels
        .iter()
        .map(|r| {
            let order_num = extract_slide_number(&r.id).or_else(|| extract_slide_number(&r.target));
            (resolve_target(PRESENTATION_DIR, &r.target), order_num)
        })
        .collect();

    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });

    Ok(slides.into_iter().map(|(path, _)| path).collect())
}

fn parse_relationships(content: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);
    let mut rels = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel = Relationship::default();
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        b"Id" => rel.id = value,
                        _ => {}
                    }
                }
                rels.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(rels)
}

/// Relationship ids of `sldId` entries, in presentation order.
fn parse_slide_id_list(content: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                // `id` is the numeric slide id; the namespaced `r:id` is the relationship.
                for attr in e.attributes().flatten() {
                    if is_relationship_id(attr.key.as_ref()) {
                        ids.push(String::from_utf8_lossy(&attr.value).to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Text body being collected while its element is open.
struct BodyState {
    open_start: usize,
    open_end: usize,
    first_paragraph: Option<usize>,
    ns: Option<String>,
    paragraphs: Vec<String>,
    current: Option<String>,
    in_text: bool,
}

impl BodyState {
    fn new(open_start: usize, open_end: usize) -> Self {
        Self {
            open_start,
            open_end,
            first_paragraph: None,
            ns: None,
            paragraphs: Vec::new(),
            current: None,
            in_text: false,
        }
    }

    fn begin_paragraph(&mut self, start: usize, qname: &[u8]) {
        if self.first_paragraph.is_none() {
            self.first_paragraph = Some(start);
            self.ns = prefix_of(qname).map(|p| String::from_utf8_lossy(p).to_string());
        }
        self.current = Some(String::new());
    }

    fn end_paragraph(&mut self) {
        if let Some(text) = self.current.take() {
            self.paragraphs.push(text);
        }
        self.in_text = false;
    }

    fn push_text(&mut self, text: &str) {
        if self.in_text {
            if let Some(current) = self.current.as_mut() {
                current.push_str(text);
            }
        }
    }

    fn push_line_break(&mut self) {
        if let Some(current) = self.current.as_mut() {
            current.push(LINE_BREAK);
        }
    }
}

/// Split slide XML into raw segments and shape text bodies.
///
/// Every `txBody` belonging to an `sp` shape (grouped shapes included)
/// becomes a text unit appended to `units`. Text bodies of table cells and
/// other graphic frames are left raw.
pub(crate) fn segment_slide(xml: &str, units: &mut Vec<TextUnit>) -> Result<Vec<Segment>> {
    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut copied = 0usize;
    let mut shape_depth = 0usize;
    let mut body: Option<BodyState> = None;

    loop {
        let start = reader.buffer_position();
        let event = reader.read_event().map_err(|e| {
            Error::XmlError(format!("Error parsing slide at byte {}: {}", start, e))
        })?;
        let end = reader.buffer_position();

        match event {
            Event::Start(ref e) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"sp" => shape_depth += 1,
                    b"txBody" if shape_depth > 0 && body.is_none() => {
                        body = Some(BodyState::new(start, end));
                    }
                    b"p" => {
                        if let Some(state) = body.as_mut() {
                            state.begin_paragraph(start, name.as_ref());
                        }
                    }
                    b"t" => {
                        if let Some(state) = body.as_mut() {
                            state.in_text = state.current.is_some();
                        }
                    }
                    _ => {}
                }
            }
            Event::Empty(ref e) => {
                let name = e.name();
                if let Some(state) = body.as_mut() {
                    match local_name(name.as_ref()) {
                        b"br" => state.push_line_break(),
                        b"p" => {
                            state.begin_paragraph(start, name.as_ref());
                            state.end_paragraph();
                        }
                        _ => {}
                    }
                }
            }
            Event::Text(ref e) => {
                if let Some(state) = body.as_mut() {
                    if state.in_text {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::XmlError(format!("Bad text in slide: {}", e)))?;
                        state.push_text(&text);
                    }
                }
            }
            Event::CData(ref e) => {
                if let Some(state) = body.as_mut() {
                    state.push_text(&String::from_utf8_lossy(e));
                }
            }
            Event::End(ref e) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"t" => {
                        if let Some(state) = body.as_mut() {
                            state.in_text = false;
                        }
                    }
                    b"p" => {
                        if let Some(state) = body.as_mut() {
                            state.end_paragraph();
                        }
                    }
                    b"txBody" => {
                        if let Some(state) = body.take() {
                            let first_paragraph = state.first_paragraph.unwrap_or(start);
                            let unit = units.len();
                            units.push(TextUnit::new(state.paragraphs.join("\n")));

                            if copied < state.open_start {
                                segments.push(Segment::Raw(xml[copied..state.open_start].to_string()));
                            }
                            segments.push(Segment::Body(TextBody {
                                unit,
                                open: xml[state.open_start..state.open_end].to_string(),
                                prefix: xml[state.open_end..first_paragraph].to_string(),
                                close: xml[start..end].to_string(),
                                original: xml[state.open_start..end].to_string(),
                                ns: state.ns.unwrap_or_else(|| "a".to_string()),
                            }));
                            copied = end;
                        }
                    }
                    b"sp" => shape_depth = shape_depth.saturating_sub(1),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if copied < xml.len() {
        segments.push(Segment::Raw(xml[copied..].to_string()));
    }

    Ok(segments)
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
