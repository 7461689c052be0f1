//! Worksheet cell parsing.

use crate::styles::{serial_to_datetime, CellStyles};
use chrono::{NaiveDate, NaiveDateTime};
use deckmerge_core::package::local_name;
use deckmerge_core::{CellValue, Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;

/// Rows in a worksheet.
pub const MAX_ROWS: usize = 1_048_576;

/// Columns in a worksheet (`XFD`).
pub const MAX_COLUMNS: usize = 16_384;

/// Typed cells keyed by 0-based row, then 0-based column.
pub type CellGrid = BTreeMap<usize, BTreeMap<usize, CellValue>>;

/// Lookup tables needed to type a cell.
pub struct CellContext<'a> {
    pub shared_strings: &'a [String],
    pub styles: &'a CellStyles,
    pub date1904: bool,
}

/// A `c` element being read.
#[derive(Debug, Default)]
struct PendingCell {
    row: usize,
    col: usize,
    kind: String,
    style: usize,
    value: Option<String>,
    inline: Option<String>,
}

/// Parse a cell reference like `B3` into 0-based (row, column).
///
/// References beyond `XFD1048576` are rejected.
pub fn parse_cell_ref(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() {
        return None;
    }

    let mut col = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = c.to_ascii_uppercase() as usize - 'A' as usize + 1;
        col = col.checked_mul(26)?.checked_add(digit)?;
        if col > MAX_COLUMNS {
            return None;
        }
    }

    let row: usize = digits.parse().ok()?;
    if row == 0 || row > MAX_ROWS {
        return None;
    }

    Some((row - 1, col - 1))
}

/// Parse a worksheet part into a grid of typed cells.
///
/// Cells without a value are absent from the grid.
pub fn parse_sheet(xml: &str, ctx: &CellContext<'_>) -> Result<CellGrid> {
    let mut reader = Reader::from_str(xml);
    let mut grid = CellGrid::new();

    let mut next_row = 0usize;
    let mut current_row = 0usize;
    let mut next_col = 0usize;
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_inline_text = false;
    let mut in_phonetic = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::XmlError(format!("Error parsing worksheet: {}", e)))?;

        match event {
            Event::Start(ref e) => match local_name(e.name().as_ref()) {
                b"row" => {
                    current_row = row_index(e).unwrap_or(next_row);
                    next_row = current_row + 1;
                    next_col = 0;
                }
                b"c" => {
                    let pending = start_cell(e, current_row, next_col);
                    next_col = pending.col + 1;
                    cell = Some(pending);
                }
                b"v" => in_value = cell.is_some(),
                b"is" => {
                    if let Some(pending) = cell.as_mut() {
                        pending.inline.get_or_insert_with(String::new);
                    }
                }
                b"rPh" => in_phonetic = true,
                b"t" => {
                    in_inline_text = cell.as_ref().is_some_and(|c| c.inline.is_some()) && !in_phonetic;
                }
                _ => {}
            },
            Event::Empty(ref e) => match local_name(e.name().as_ref()) {
                b"row" => {
                    current_row = row_index(e).unwrap_or(next_row);
                    next_row = current_row + 1;
                }
                b"c" => {
                    next_col = start_cell(e, current_row, next_col).col + 1;
                }
                _ => {}
            },
            Event::Text(ref e) if in_value || in_inline_text => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::XmlError(format!("Bad cell text: {}", e)))?;
                if let Some(pending) = cell.as_mut() {
                    let target = if in_value {
                        pending.value.get_or_insert_with(String::new)
                    } else {
                        pending.inline.get_or_insert_with(String::new)
                    };
                    target.push_str(&text);
                }
            }
            Event::End(ref e) => match local_name(e.name().as_ref()) {
                b"v" => in_value = false,
                b"t" => in_inline_text = false,
                b"rPh" => in_phonetic = false,
                b"c" => {
                    if let Some(pending) = cell.take() {
                        if let Some(value) = resolve(&pending, ctx) {
                            grid.entry(pending.row).or_default().insert(pending.col, value);
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(grid)
}

fn row_index(e: &BytesStart<'_>) -> Option<usize> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == b"r")
        .and_then(|a| String::from_utf8_lossy(&a.value).parse::<usize>().ok())
        .filter(|r| (1..=MAX_ROWS).contains(r))
        .map(|r| r - 1)
}

fn start_cell(e: &BytesStart<'_>, row: usize, next_col: usize) -> PendingCell {
    let mut cell = PendingCell {
        row,
        col: next_col,
        ..PendingCell::default()
    };

    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.as_ref() {
            b"r" => match parse_cell_ref(&value) {
                Some((r, c)) => {
                    cell.row = r;
                    cell.col = c;
                }
                None => log::warn!("Invalid cell reference '{}', using position", value),
            },
            b"t" => cell.kind = value.to_string(),
            b"s" => cell.style = value.parse().unwrap_or(0),
            _ => {}
        }
    }

    cell
}

fn parse_iso_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Type a cell's raw content. Unparseable content falls back to text.
fn resolve(cell: &PendingCell, ctx: &CellContext<'_>) -> Option<CellValue> {
    if cell.kind == "inlineStr" {
        return cell.inline.clone().map(CellValue::Text);
    }

    let raw = cell.value.as_deref()?;

    let value = match cell.kind.as_str() {
        "s" => match raw.trim().parse::<usize>().ok().and_then(|i| ctx.shared_strings.get(i)) {
            Some(s) => CellValue::Text(s.clone()),
            None => {
                log::warn!("Shared string index '{}' out of range", raw);
                CellValue::Text(raw.to_string())
            }
        },
        "str" | "e" => CellValue::Text(raw.to_string()),
        "b" => CellValue::Text(if raw.trim() == "1" { "True" } else { "False" }.to_string()),
        "d" => match parse_iso_date(raw) {
            Some(dt) => CellValue::Date(dt),
            None => CellValue::Text(raw.to_string()),
        },
        _ => match raw.trim().parse::<f64>() {
            Ok(n) if ctx.styles.is_date(cell.style) => match serial_to_datetime(n, ctx.date1904) {
                Some(dt) => CellValue::Date(dt),
                None => CellValue::Number(n),
            },
            Ok(n) => CellValue::Number(n),
            Err(_) => {
                log::warn!("Non-numeric value '{}' in numeric cell, keeping as text", raw);
                CellValue::Text(raw.to_string())
            }
        },
    };

    Some(value)
}
