//! XLSX workbook reader producing a data source.

use crate::sheet::{parse_sheet, CellContext, CellGrid};
use crate::styles::CellStyles;
use crate::workbook::{parse_shared_strings, parse_workbook, resolve_sheet_path};
use deckmerge_core::{CellValue, ContainerFormat, DataSource, Error, Result};
use std::collections::{BTreeSet, HashMap};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

const WORKBOOK_PATH: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PATH: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PATH: &str = "xl/sharedStrings.xml";
const STYLES_PATH: &str = "xl/styles.xml";

/// Reader for XLSX (Office Open XML) workbooks.
///
/// The first worksheet becomes the data source: its first non-empty row
/// names the columns and every later row up to the last non-empty one is
/// a record.
pub struct XlsxReader;

impl XlsxReader {
    /// Create a new XLSX reader.
    pub fn new() -> Self {
        Self
    }

    /// Read the workbook at `path`.
    pub fn open(&self, path: &Path) -> Result<DataSource> {
        let bytes = std::fs::read(path)?;
        if !ContainerFormat::is_zip_magic(&bytes) {
            return Err(Error::UnsupportedFormat(format!(
                "{} is not an XLSX workbook",
                path.display()
            )));
        }
        self.read(Cursor::new(bytes))
    }

    /// Read a workbook from a reader.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<DataSource> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let workbook_xml = self
            .read_file_from_archive(&mut archive, WORKBOOK_PATH)?
            .ok_or_else(|| {
                Error::UnsupportedFormat(format!("Not a workbook: '{}' is missing", WORKBOOK_PATH))
            })?;
        let workbook = parse_workbook(&workbook_xml)?;

        let sheet_path = self.first_sheet_path(&mut archive, workbook.first_sheet_rel.as_deref())?;
        log::debug!(
            "Reading sheet {} ({})",
            workbook.first_sheet_name.as_deref().unwrap_or("?"),
            sheet_path
        );

        let shared_strings = match self.read_file_from_archive(&mut archive, SHARED_STRINGS_PATH)? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        };
        let styles = match self.read_file_from_archive(&mut archive, STYLES_PATH)? {
            Some(xml) => CellStyles::parse(&xml)?,
            None => CellStyles::default(),
        };

        let sheet_xml = self
            .read_file_from_archive(&mut archive, &sheet_path)?
            .ok_or_else(|| {
                Error::SpreadsheetError(format!("Worksheet '{}' is missing", sheet_path))
            })?;

        let ctx = CellContext {
            shared_strings: &shared_strings,
            styles: &styles,
            date1904: workbook.date1904,
        };
        let grid = parse_sheet(&sheet_xml, &ctx)?;

        let data_source = build_data_source(&grid);
        log::debug!(
            "Read {} columns and {} rows",
            data_source.column_count(),
            data_source.rows().len()
        );
        Ok(data_source)
    }

    fn first_sheet_path<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        rel_id: Option<&str>,
    ) -> Result<String> {
        let rel_id = rel_id
            .ok_or_else(|| Error::SpreadsheetError("Workbook has no worksheets".to_string()))?;

        let rels_xml = self
            .read_file_from_archive(archive, WORKBOOK_RELS_PATH)?
            .ok_or_else(|| {
                Error::SpreadsheetError(format!("'{}' is missing", WORKBOOK_RELS_PATH))
            })?;

        resolve_sheet_path(&rels_xml, rel_id)?.ok_or_else(|| {
            Error::SpreadsheetError(format!("No relationship for sheet '{}'", rel_id))
        })
    }

    /// Read a file from the ZIP archive, or `None` if it is absent.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<Option<String>> {
        let mut file = match archive.by_name(path) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(Error::ZipError(format!(
                    "Failed to open '{}' in archive: {}",
                    path, e
                )))
            }
        };

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(Some(content))
    }
}

impl Default for XlsxReader {
    fn default() -> Self {
        Self::new()
    }
}

fn row_has_values(cells: &std::collections::BTreeMap<usize, CellValue>) -> bool {
    cells.values().any(|v| !v.is_blank())
}

/// Turn a cell grid into columns and positional records.
fn build_data_source(grid: &CellGrid) -> DataSource {
    let filled: Vec<usize> = grid
        .iter()
        .filter(|(_, cells)| row_has_values(cells))
        .map(|(row, _)| *row)
        .collect();

    let (header_row, last_row) = match (filled.first(), filled.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return DataSource::default(),
    };

    let used_columns: BTreeSet<usize> = grid
        .range(header_row..=last_row)
        .flat_map(|(_, cells)| {
            cells
                .iter()
                .filter(|(_, v)| !v.is_blank())
                .map(|(col, _)| *col)
        })
        .collect();

    let (first_col, last_col) = match (used_columns.first(), used_columns.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return DataSource::default(),
    };

    let header = grid.get(&header_row);
    let names: Vec<Option<String>> = (first_col..=last_col)
        .map(|col| {
            header
                .and_then(|cells| cells.get(&col))
                .filter(|v| !v.is_blank())
                .map(|v| v.to_string())
        })
        .collect();
    let columns = column_names(names);

    let records = (header_row + 1..=last_row)
        .map(|row| {
            (first_col..=last_col)
                .map(|col| {
                    grid.get(&row)
                        .and_then(|cells| cells.get(&col))
                        .cloned()
                        .unwrap_or_else(CellValue::empty)
                })
                .collect()
        })
        .collect();

    DataSource::from_records(columns, records)
}

/// Name blank headers `Unnamed: <position>` and suffix repeats with `.1`, `.2`, ...
fn column_names(headers: Vec<Option<String>>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    headers
        .into_iter()
        .enumerate()
        .map(|(idx, header)| {
            let base = header.unwrap_or_else(|| format!("Unnamed: {}", idx));
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
    const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    fn build_xlsx(shared: &[&str], sheet_data: &str) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut cursor);
            let options = FileOptions::default();
            let mut add = |name: &str, content: String| {
                zip.start_file(name, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            };

            add(
                WORKBOOK_PATH,
                format!(
                    r#"<workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheets><sheet name="Hoja1" sheetId="1" r:id="rId1"/></sheets></workbook>"#
                ),
            );
            add(
                WORKBOOK_RELS_PATH,
                format!(
                    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_NS}/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#
                ),
            );
            let items: String = shared.iter().map(|s| format!("<si><t>{s}</t></si>")).collect();
            add(SHARED_STRINGS_PATH, format!(r#"<sst xmlns="{MAIN_NS}">{items}</sst>"#));
            add(
                STYLES_PATH,
                format!(
                    r#"<styleSheet xmlns="{MAIN_NS}"><numFmts><numFmt numFmtId="164" formatCode="dd/mm/yyyy"/></numFmts><cellXfs><xf numFmtId="0"/><xf numFmtId="164"/></cellXfs></styleSheet>"#
                ),
            );
            add(
                "xl/worksheets/sheet1.xml",
                format!(r#"<worksheet xmlns="{MAIN_NS}"><sheetData>{sheet_data}</sheetData></worksheet>"#),
            );

            zip.finish().unwrap();
        }
        cursor.set_position(0);
        cursor.into_inner()
    }

    fn read(shared: &[&str], sheet_data: &str) -> DataSource {
        XlsxReader::new()
            .read(Cursor::new(build_xlsx(shared, sheet_data)))
            .unwrap()
    }

    #[test]
    fn test_reads_header_and_rows() {
        let source = read(
            &["NAME", "CITY", "BORN", "Ana", "Lima"],
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>2</v></c></row>
<row r="2"><c r="A2" t="s"><v>3</v></c><c r="B2" t="s"><v>4</v></c><c r="C2" s="1"><v>33208</v></c></row>"#,
        );

        assert_eq!(source.columns(), &["NAME", "CITY", "BORN"]);
        assert_eq!(source.rows().len(), 1);

        let row = &source.rows()[0];
        assert_eq!(row.get("NAME"), Some(&CellValue::from("Ana")));
        assert_eq!(row.get("CITY"), Some(&CellValue::from("Lima")));
        assert_eq!(row.get("BORN").map(|v| v.to_string()).as_deref(), Some("01-12-1990"));
    }

    #[test]
    fn test_keeps_interior_blank_rows_and_drops_trailing() {
        let source = read(
            &["NAME"],
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>
<row r="2"><c r="A2"><v>1</v></c></row>
<row r="4"><c r="A4"><v>3</v></c></row>
<row r="6"><c r="A6" t="inlineStr"><is><t></t></is></c></row>"#,
        );

        assert_eq!(source.rows().len(), 3);
        assert_eq!(source.rows()[0].get("NAME"), Some(&CellValue::Number(1.0)));
        assert!(source.rows()[1].is_blank());
        assert_eq!(source.rows()[2].get("NAME"), Some(&CellValue::Number(3.0)));
    }

    #[test]
    fn test_header_starts_at_first_filled_cell() {
        let source = read(
            &["A", "B"],
            r#"<row r="3"><c r="C3" t="s"><v>0</v></c><c r="D3" t="s"><v>1</v></c></row>
<row r="4"><c r="C4"><v>1</v></c><c r="D4"><v>2.5</v></c></row>"#,
        );

        assert_eq!(source.columns(), &["A", "B"]);
        assert_eq!(source.rows()[0].get("B"), Some(&CellValue::Number(2.5)));
    }

    #[test]
    fn test_unnamed_and_duplicate_columns() {
        let source = read(
            &["X"],
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="C1" t="s"><v>0</v></c><c r="D1"><v>2024</v></c></row>
<row r="2"><c r="A2"><v>1</v></c><c r="B2"><v>2</v></c><c r="C2"><v>3</v></c><c r="D2"><v>4</v></c><c r="E2"><v>5</v></c></row>"#,
        );

        assert_eq!(source.columns(), &["X", "Unnamed: 1", "X.1", "2024", "Unnamed: 4"]);
        assert_eq!(source.rows()[0].get("X.1"), Some(&CellValue::Number(3.0)));
    }

    #[test]
    fn test_empty_sheet() {
        let source = read(&[], "");
        assert_eq!(source.column_count(), 0);
        assert!(source.rows().is_empty());
    }

    #[test]
    fn test_header_only() {
        let source = read(&["NAME"], r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>"#);
        assert_eq!(source.columns(), &["NAME"]);
        assert!(source.rows().is_empty());
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.xlsx");
        std::fs::write(&path, "NAME,CITY\nAna,Lima\n").unwrap();

        assert!(matches!(
            XlsxReader::new().open(&path),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_huge_row_number_does_not_allocate_blank_rows() {
        let source = read(
            &["NAME"],
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>
<row r="4000000000"><c r="A4000000000"><v>7</v></c></row>"#,
        );

        assert_eq!(source.rows().len(), 1);
        assert_eq!(source.rows()[0].get("NAME"), Some(&CellValue::Number(7.0)));
    }

    #[test]
    fn test_open_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.xlsx");
        std::fs::write(&path, build_xlsx(&["NAME"], r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>Ana</t></is></c></row>"#)).unwrap();

        let source = XlsxReader::new().open(&path).unwrap();
        assert_eq!(source.rows()[0].get("NAME"), Some(&CellValue::from("Ana")));
    }
}
