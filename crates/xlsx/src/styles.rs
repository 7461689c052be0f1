//! Cell number formats and spreadsheet date serials.
//!
//! Workbooks store dates as day counts; only the cell's number format says
//! whether a number is a date.

use chrono::{Days, Duration, NaiveDate, NaiveDateTime};
use deckmerge_core::package::local_name;
use deckmerge_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Parts of a format code that never denote date tokens: quoted literals,
/// bracketed sections (colors, locales, elapsed time), escapes, and
/// padding/fill directives.
static FORMAT_LITERAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]*"|\[[^\]]*\]|\\.|_.|\*."#).unwrap());

/// Elapsed-time sections such as `[h]` or `[mm]`.
static ELAPSED_TIME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[(h+|m+|s+)\]").unwrap());

/// Largest serial Excel can display (31-12-9999).
const MAX_DATE_SERIAL: f64 = 2_958_465.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Built-in number format ids that render a calendar date.
///
/// Pure time formats (18-21, 45-47) are left numeric.
pub fn is_builtin_date_format(id: u32) -> bool {
    matches!(id, 14..=17 | 22 | 27..=36 | 50..=58)
}

/// Whether a custom format code renders a calendar date.
pub fn is_date_format_code(code: &str) -> bool {
    if ELAPSED_TIME_REGEX.is_match(code) {
        return false;
    }

    let stripped = FORMAT_LITERAL_REGEX.replace_all(code, "").to_lowercase();
    if stripped == "general" {
        return false;
    }

    let has_day_or_year = stripped.contains('d') || stripped.contains('y');
    let has_month = stripped.contains('m');
    let has_time = stripped.contains('h') || stripped.contains('s');

    // A lone `m` next to hours or seconds means minutes.
    has_day_or_year || (has_month && !has_time)
}

/// Convert a date serial to a date and time.
///
/// The 1900 system counts from 31-12-1899 and includes the fictitious
/// 29-02-1900, so serials from 60 on are shifted by one day.
pub fn serial_to_datetime(serial: f64, date1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial > MAX_DATE_SERIAL {
        return None;
    }

    let base = if date1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };

    let days = serial.trunc();
    let seconds = ((serial - days) * SECONDS_PER_DAY).round() as i64;

    base.and_hms_opt(0, 0, 0)?
        .checked_add_days(Days::new(days as u64))?
        .checked_add_signed(Duration::seconds(seconds))
}

/// Which cell style indices (`s` attribute) carry a date format.
#[derive(Debug, Clone, Default)]
pub struct CellStyles {
    date_styles: Vec<bool>,
}

impl CellStyles {
    /// Parse `xl/styles.xml`.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut custom_formats: HashMap<u32, String> = HashMap::new();
        let mut format_ids: Vec<u32> = Vec::new();
        let mut in_cell_xfs = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"cellXfs" => {
                    in_cell_xfs = true;
                }
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"numFmt" => {
                            let mut id = None;
                            let mut code = String::new();
                            for attr in e.attributes().flatten() {
                                match attr.key.as_ref() {
                                    b"numFmtId" => {
                                        id = String::from_utf8_lossy(&attr.value).parse().ok();
                                    }
                                    b"formatCode" => {
                                        code = attr
                                            .unescape_value()
                                            .map(|v| v.to_string())
                                            .unwrap_or_default();
                                    }
                                    _ => {}
                                }
                            }
                            if let Some(id) = id {
                                custom_formats.insert(id, code);
                            }
                        }
                        b"xf" if in_cell_xfs => {
                            let id = e
                                .attributes()
                                .flatten()
                                .find(|a| a.key.as_ref() == b"numFmtId")
                                .and_then(|a| String::from_utf8_lossy(&a.value).parse().ok())
                                .unwrap_or(0);
                            format_ids.push(id);
                        }
                        _ => {}
                    }
                }
                Ok(Event::End(ref e)) if local_name(e.name().as_ref()) == b"cellXfs" => {
                    in_cell_xfs = false;
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!("Error parsing styles: {}", e)));
                }
                _ => {}
            }
        }

        let date_styles = format_ids
            .into_iter()
            .map(|id| match custom_formats.get(&id) {
                Some(code) => is_date_format_code(code),
                None => is_builtin_date_format(id),
            })
            .collect();

        Ok(Self { date_styles })
    }

    /// Whether cells with style index `style` hold dates.
    pub fn is_date(&self, style: usize) -> bool {
        self.date_styles.get(style).copied().unwrap_or(false)
    }
}
