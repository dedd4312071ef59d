//! XLSX number formats and serial date conversion.

use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;

/// How a number format presents its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateKind {
    /// Calendar date, with or without a time part
    DateTime,
    /// Time of day only
    Time,
}

/// Epoch used by the workbook for serial dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateSystem {
    /// Serial 1 = 1900-01-01, with the Lotus 1-2-3 leap-year quirk
    #[default]
    Excel1900,
    /// Serial 0 = 1904-01-01 (`<workbookPr date1904="1"/>`)
    Excel1904,
}

impl DateSystem {
    /// Convert a serial number to a date-time, rounded to whole seconds.
    ///
    /// Returns `None` for negative or out-of-range serials.
    pub fn to_datetime(self, serial: f64) -> Option<NaiveDateTime> {
        if !serial.is_finite() || serial < 0.0 {
            return None;
        }
        let base = match self {
            // Serials below 60 predate the phantom 1900-02-29.
            DateSystem::Excel1900 if serial < 60.0 => NaiveDate::from_ymd_opt(1899, 12, 31)?,
            DateSystem::Excel1900 => NaiveDate::from_ymd_opt(1899, 12, 30)?,
            DateSystem::Excel1904 => NaiveDate::from_ymd_opt(1904, 1, 1)?,
        };
        let seconds = (serial * 86_400.0).round();
        if seconds > i64::MAX as f64 {
            return None;
        }
        base.and_hms_opt(0, 0, 0)?
            .checked_add_signed(TimeDelta::try_seconds(seconds as i64)?)
    }

    /// Convert the fractional part of a serial number to a time of day.
    pub fn to_time(serial: f64) -> Option<NaiveTime> {
        if !serial.is_finite() || serial < 0.0 {
            return None;
        }
        let seconds = ((serial.fract() * 86_400.0).round() as u32) % 86_400;
        NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
    }
}

/// Cell formats parsed from xl/styles.xml.
#[derive(Debug, Default)]
pub struct Styles {
    /// Custom number formats: numFmtId -> formatCode
    num_fmts: HashMap<u32, String>,
    /// Cell formats: style index -> numFmtId
    cell_xfs: Vec<u32>,
}

impl Styles {
    /// Parse styles from xl/styles.xml content.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut styles = Self::default();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut in_num_fmts = false;
        let mut in_cell_xfs = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"numFmts" => in_num_fmts = true,
                    b"cellXfs" => in_cell_xfs = true,
                    b"xf" if in_cell_xfs => styles.cell_xfs.push(num_fmt_id(&e)?.unwrap_or(0)),
                    b"numFmt" if in_num_fmts => styles.add_num_fmt(&e)?,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"xf" if in_cell_xfs => styles.cell_xfs.push(num_fmt_id(&e)?.unwrap_or(0)),
                    b"numFmt" if in_num_fmts => styles.add_num_fmt(&e)?,
                    _ => {}
                },
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"numFmts" => in_num_fmts = false,
                    b"cellXfs" => in_cell_xfs = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(styles)
    }

    fn add_num_fmt(&mut self, e: &BytesStart<'_>) -> Result<()> {
        let mut code = None;
        for attr in e.attributes().flatten() {
            if attr.key.as_ref() == b"formatCode" {
                code = Some(attr.unescape_value()?.into_owned());
            }
        }
        if let (Some(id), Some(code)) = (num_fmt_id(e)?, code) {
            self.num_fmts.insert(id, code);
        }
        Ok(())
    }

    /// Number of cell formats (`cellXfs` entries).
    pub fn len(&self) -> usize {
        self.cell_xfs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_xfs.is_empty()
    }

    /// Get the numFmtId for a cell style index.
    pub fn num_fmt_id(&self, style_index: usize) -> Option<u32> {
        self.cell_xfs.get(style_index).copied()
    }

    /// Date classification of the number format behind a cell style.
    pub fn date_kind(&self, style_index: usize) -> Option<DateKind> {
        let id = self.num_fmt_id(style_index)?;
        if let Some(code) = self.num_fmts.get(&id) {
            return classify_format_code(code);
        }
        builtin_date_kind(id)
    }
}

fn num_fmt_id(e: &BytesStart<'_>) -> Result<Option<u32>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"numFmtId" {
            return Ok(attr.unescape_value()?.trim().parse().ok());
        }
    }
    Ok(None)
}

/// Built-in formats: 14-17 dates, 22 date-time, 18-21 and 45, 47 times.
/// 46 (`[h]:mm:ss`) is a duration and stays numeric.
fn builtin_date_kind(id: u32) -> Option<DateKind> {
    match id {
        14..=17 | 22 => Some(DateKind::DateTime),
        18..=21 | 45 | 47 => Some(DateKind::Time),
        _ => None,
    }
}

/// Classify a custom format code.
///
/// Only the first section (before `;`) is inspected. Text inside `[...]`,
/// `"..."`, characters escaped with `\`, and `AM/PM` markers are ignored.
/// `d`, `y`, or an `m` not adjacent to `h`/`s` mark a date; `h` or `s` alone
/// mark a time.
/// Bracketed elapsed-time codes like `[h]:mm` have no date letters outside
/// brackets and are not dates.
pub fn classify_format_code(code: &str) -> Option<DateKind> {
    let mut tokens = Vec::new();
    let mut chars = code.chars();
    let mut elapsed = false;

    while let Some(c) = chars.next() {
        match c {
            ';' => break,
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                }
            }
            '\\' | '_' | '*' => {
                chars.next();
            }
            'a' | 'A' if starts_with_ignore_case(chars.as_str(), "m/pm") => {
                chars.nth(3);
            }
            'a' | 'A' if starts_with_ignore_case(chars.as_str(), "/p") => {
                chars.nth(1);
            }
            '[' => {
                let mut inner = String::new();
                for b in chars.by_ref() {
                    if b == ']' {
                        break;
                    }
                    inner.push(b);
                }
                let inner = inner.to_ascii_lowercase();
                if !inner.is_empty() && inner.chars().all(|c| matches!(c, 'h' | 'm' | 's')) {
                    elapsed = true;
                }
            }
            c => tokens.push(c.to_ascii_lowercase()),
        }
    }

    if elapsed {
        return None;
    }

    let mut has_date = false;
    let mut has_time = false;
    for (i, &c) in tokens.iter().enumerate() {
        match c {
            'd' | 'y' => has_date = true,
            'h' | 's' => has_time = true,
            'm' => {
                let prev = tokens[..i].iter().rev().find(|c| c.is_ascii_alphabetic() && **c != 'm');
                let next = tokens[i + 1..].iter().find(|c| c.is_ascii_alphabetic() && **c != 'm');
                if prev == Some(&'h') || next == Some(&'s') {
                    has_time = true;
                } else {
                    has_date = true;
                }
            }
            _ => {}
        }
    }

    match (has_date, has_time) {
        (true, _) => Some(DateKind::DateTime),
        (false, true) => Some(DateKind::Time),
        _ => None,
    }
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
