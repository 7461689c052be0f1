//! Fixture packages for end-to-end tests.

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

const PRESENTATION_NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;
const SHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const PACKAGE_RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const OFFICE_RELS_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

fn zip_package(entries: &[(String, String)]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        for (name, content) in entries {
            zip.start_file(name.as_str(), FileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    cursor.into_inner()
}

/// A presentation with one text box per entry of `slides`.
pub fn write_template(dir: &Path, slides: &[&str]) -> PathBuf {
    let mut entries = Vec::new();
    let mut ids = String::new();
    let mut rels = String::new();

    for (idx, text) in slides.iter().enumerate() {
        let n = idx + 1;
        ids.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{n}"/>"#, 255 + n));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="{OFFICE_RELS_NS}/slide" Target="slides/slide{n}.xml"/>"#
        ));
        entries.push((
            format!("ppt/slides/slide{n}.xml"),
            format!(
                r#"<p:sld {PRESENTATION_NS}><p:cSld><p:spTree><p:sp><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
            ),
        ));
    }

    entries.push((
        "ppt/presentation.xml".to_string(),
        format!(r#"<p:presentation {PRESENTATION_NS}><p:sldIdLst>{ids}</p:sldIdLst></p:presentation>"#),
    ));
    entries.push((
        "ppt/_rels/presentation.xml.rels".to_string(),
        format!(r#"<Relationships xmlns="{PACKAGE_RELS_NS}">{rels}</Relationships>"#),
    ));

    let path = dir.join("template.pptx");
    std::fs::write(&path, zip_package(&entries)).unwrap();
    path
}

/// A workbook whose first sheet holds `rows` as inline strings.
pub fn write_data(dir: &Path, rows: &[&[&str]]) -> PathBuf {
    let sheet_rows: String = rows
        .iter()
        .enumerate()
        .map(|(r, cells)| {
            let cells: String = cells
                .iter()
                .enumerate()
                .map(|(c, value)| {
                    let col = (b'A' + c as u8) as char;
                    format!(r#"<c r="{col}{}" t="inlineStr"><is><t>{value}</t></is></c>"#, r + 1)
                })
                .collect();
            format!(r#"<row r="{}">{cells}</row>"#, r + 1)
        })
        .collect();

    let entries = vec![
        (
            "xl/workbook.xml".to_string(),
            format!(
                r#"<workbook xmlns="{SHEET_NS}" xmlns:r="{OFFICE_RELS_NS}"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#
            ),
        ),
        (
            "xl/_rels/workbook.xml.rels".to_string(),
            format!(
                r#"<Relationships xmlns="{PACKAGE_RELS_NS}"><Relationship Id="rId1" Type="{OFFICE_RELS_NS}/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#
            ),
        ),
        (
            "xl/worksheets/sheet1.xml".to_string(),
            format!(r#"<worksheet xmlns="{SHEET_NS}"><sheetData>{sheet_rows}</sheetData></worksheet>"#),
        ),
    ];

    let path = dir.join("data.xlsx");
    std::fs::write(&path, zip_package(&entries)).unwrap();
    path
}

/// Raw XML of one slide of a generated presentation.
pub fn slide_xml(path: &Path, slide: usize) -> String {
    let mut archive = ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    let mut file = archive
        .by_name(&format!("ppt/slides/slide{slide}.xml"))
        .unwrap();
    let mut xml = String::new();
    file.read_to_string(&mut xml).unwrap();
    xml
}
