//! PPTX template document.

use crate::parser::{self, PackagePart, Segment, TextBody, LINE_BREAK};
use deckmerge_core::{ContainerFormat, Error, Result, TemplateDocument, TextUnit};
use quick_xml::escape::escape;
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A slide part split into segments.
#[derive(Debug, Clone)]
struct SlidePart {
    /// Index into the package parts.
    part: usize,
    segments: Vec<Segment>,
}

/// An opened presentation whose shape texts can be rewritten.
#[derive(Debug, Clone)]
pub struct PptxDocument {
    parts: Vec<PackagePart>,
    slides: Vec<SlidePart>,
    units: Vec<TextUnit>,
}

impl PptxDocument {
    /// Parse a PPTX package from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let parts = parser::read_parts(reader)?;
        let order = parser::slide_order(&parts)?;

        let mut units = Vec::new();
        let mut slides = Vec::with_capacity(order.len());

        for slide_path in &order {
            let part = parts
                .iter()
                .position(|p| &p.name == slide_path)
                .ok_or_else(|| {
                    Error::ZipError(format!("File not found in archive '{}'", slide_path))
                })?;
            let xml = parser::part_text(&parts, slide_path)?;
            let segments = parser::segment_slide(xml, &mut units)?;
            log::debug!("Parsed {} ({} text units so far)", slide_path, units.len());
            slides.push(SlidePart { part, segments });
        }

        Ok(Self {
            parts,
            slides,
            units,
        })
    }

    /// Number of slides in presentation order.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// The current XML of a slide (0-based), with rewritten units applied.
    pub fn slide_xml(&self, index: usize) -> Option<String> {
        self.slides.get(index).map(|slide| self.render_slide(slide))
    }

    fn render_slide(&self, slide: &SlidePart) -> String {
        let mut out = String::new();
        for segment in &slide.segments {
            match segment {
                Segment::Raw(raw) => out.push_str(raw),
                Segment::Body(body) => render_body(body, &self.units[body.unit], &mut out),
            }
        }
        out
    }

    /// Write the package to `writer`.
    ///
    /// Entries keep their order, timestamps, and compression; only slides
    /// with rewritten units get new content.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);

        for (idx, part) in self.parts.iter().enumerate() {
            let compression = match part.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = FileOptions::default()
                .compression_method(compression)
                .last_modified_time(part.last_modified);

            if part.is_dir {
                zip.add_directory(part.name.clone(), options)
                    .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", part.name, e)))?;
                continue;
            }

            zip.start_file(part.name.clone(), options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", part.name, e)))?;

            match self.slides.iter().find(|s| s.part == idx) {
                Some(slide) if self.slide_modified(slide) => {
                    zip.write_all(self.render_slide(slide).as_bytes())?;
                }
                _ => zip.write_all(&part.data)?,
            }
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))?;
        Ok(())
    }

    fn slide_modified(&self, slide: &SlidePart) -> bool {
        slide.segments.iter().any(|s| match s {
            Segment::Body(body) => self.units[body.unit].is_modified(),
            Segment::Raw(_) => false,
        })
    }
}

impl TemplateDocument for PptxDocument {
    fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        if !ContainerFormat::is_zip_magic(&bytes) {
            return Err(Error::UnsupportedFormat(format!(
                "{} is not a PPTX package",
                path.display()
            )));
        }
        Self::from_reader(Cursor::new(bytes))
    }

    fn units(&self) -> &[TextUnit] {
        &self.units
    }

    fn units_mut(&mut self) -> &mut [TextUnit] {
        &mut self.units
    }

    fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

fn render_body(body: &TextBody, unit: &TextUnit, out: &mut String) {
    if !unit.is_modified() {
        out.push_str(&body.original);
        return;
    }

    out.push_str(&body.open);
    out.push_str(&body.prefix);
    render_paragraphs(unit.text(), &body.ns, out);
    out.push_str(&body.close);
}

/// Render plain text as DrawingML paragraphs.
///
/// Each line becomes a paragraph with at most one unstyled run; the
/// vertical tab becomes a line break.
pub(crate) fn render_paragraphs(text: &str, ns: &str, out: &mut String) {
    for line in text.split('\n') {
        if line.is_empty() {
            out.push_str(&format!("<{ns}:p/>"));
            continue;
        }

        out.push_str(&format!("<{ns}:p>"));
        for (idx, piece) in line.split(LINE_BREAK).enumerate() {
            if idx > 0 {
                out.push_str(&format!("<{ns}:br/>"));
            }
            // Control characters are not allowed in XML 1.0.
            let clean: String = piece
                .chars()
                .filter(|c| !c.is_control() || *c == '\t')
                .collect();
            if !clean.is_empty() {
                out.push_str(&format!("<{ns}:r><{ns}:t>{}</{ns}:t></{ns}:r>", escape(&clean)));
            }
        }
        out.push_str(&format!("</{ns}:p>"));
    }
}
