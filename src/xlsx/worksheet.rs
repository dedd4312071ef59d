//! Worksheet part parsing (xl/worksheets/sheetN.xml).

use super::formula::translate_formula;
use super::shared_strings::SharedStrings;
use super::styles::{DateKind, DateSystem, Styles};
use crate::error::{Error, Result};
use crate::model::{CellValue, Worksheet};
use crate::reference::{CellRef, MAX_COLS, MAX_ROWS};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;

/// Workbook-level tables a worksheet's cells refer to.
#[derive(Debug, Clone, Copy)]
pub struct CellContext<'a> {
    pub shared_strings: &'a SharedStrings,
    pub styles: &'a Styles,
    pub date_system: DateSystem,
}

/// The `<f>` element of a cell.
#[derive(Debug, Default)]
struct RawFormula {
    kind: Option<String>,
    range: Option<String>,
    shared_index: Option<String>,
    text: String,
}

/// Everything collected between `<c>` and `</c>`.
#[derive(Debug, Default)]
struct RawCell {
    at: Option<CellRef>,
    cell_type: Option<String>,
    style: Option<usize>,
    value: Option<String>,
    inline: Option<String>,
    formula: Option<RawFormula>,
}

/// Where the text of the current element goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    None,
    Value,
    Formula,
    Inline,
}

/// Parse a worksheet part into the cells it stores.
///
/// Formulas are returned as written: array formulas as
/// [`CellValue::ArrayFormula`], everything else as [`CellValue::Formula`]
/// with a leading `=`. Dependent cells of a shared formula get the anchor's
/// text moved to their own position.
pub fn parse_worksheet(xml: &str, name: &str, ctx: CellContext<'_>) -> Result<Worksheet> {
    let mut sheet = Worksheet::new(name);
    let mut reader = quick_xml::Reader::from_str(xml);

    let mut buf = Vec::new();
    let mut shared_formulas: HashMap<String, (CellRef, String)> = HashMap::new();
    let mut row: Option<u32> = None;
    let mut next_col: u32 = 0;
    let mut cell: Option<RawCell> = None;
    let mut target = TextTarget::None;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    row = Some(row_index(&e, row)?);
                    next_col = 0;
                }
                b"c" => {
                    let raw = open_cell(&e, row, &mut next_col)?;
                    cell = Some(raw);
                }
                b"v" if cell.is_some() => {
                    target = TextTarget::Value;
                }
                b"f" => {
                    if let Some(raw) = cell.as_mut() {
                        raw.formula = Some(open_formula(&e)?);
                        target = TextTarget::Formula;
                    }
                }
                b"is" => {
                    if let Some(raw) = cell.as_mut() {
                        raw.inline = Some(String::new());
                    }
                }
                b"rPh" => phonetic_depth += 1,
                b"t" if phonetic_depth == 0 && cell.as_ref().is_some_and(|c| c.inline.is_some()) => {
                    target = TextTarget::Inline;
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => {
                    row = Some(row_index(&e, row)?);
                    next_col = 0;
                }
                b"c" => {
                    // A self-closing cell carries no value; only the column
                    // counter advances.
                    open_cell(&e, row, &mut next_col)?;
                }
                b"f" => {
                    if let Some(raw) = cell.as_mut() {
                        raw.formula = Some(open_formula(&e)?);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) if target != TextTarget::None => {
                let text = e.unescape()?;
                append_text(cell.as_mut(), target, &text);
            }
            Ok(Event::CData(e)) if target != TextTarget::None => {
                let text = String::from_utf8_lossy(&e);
                append_text(cell.as_mut(), target, &text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"c" => {
                    if let Some(raw) = cell.take() {
                        if let Some(at) = raw.at {
                            let value = resolve_cell(raw, at, &ctx, &mut shared_formulas)?;
                            if !value.is_empty() {
                                sheet.set(at, value);
                            }
                        }
                    }
                    target = TextTarget::None;
                }
                b"v" | b"f" | b"t" => target = TextTarget::None,
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    tracing::debug!(sheet = name, cells = sheet.len(), "parsed worksheet");
    Ok(sheet)
}

fn append_text(cell: Option<&mut RawCell>, target: TextTarget, text: &str) {
    let Some(cell) = cell else {
        return;
    };
    match target {
        TextTarget::Value => cell.value.get_or_insert_with(String::new).push_str(text),
        TextTarget::Formula => {
            if let Some(f) = cell.formula.as_mut() {
                f.text.push_str(text);
            }
        }
        TextTarget::Inline => cell.inline.get_or_insert_with(String::new).push_str(text),
        TextTarget::None => {}
    }
}

/// 0-based index of a `<row>`; rows without `r` follow the previous one.
fn row_index(e: &BytesStart<'_>, previous: Option<u32>) -> Result<u32> {
    if let Some(r) = attr_value(e, b"r")? {
        let r: u32 = r
            .trim()
            .parse()
            .map_err(|_| Error::InvalidData(format!("invalid row number '{}'", r)))?;
        if r == 0 || r > MAX_ROWS {
            return Err(Error::InvalidData(format!("row number {} out of range", r)));
        }
        return Ok(r - 1);
    }
    let next = previous.map_or(0, |p| p + 1);
    if next >= MAX_ROWS {
        return Err(Error::InvalidData("implicit row past the last sheet row".to_string()));
    }
    Ok(next)
}

fn open_cell(e: &BytesStart<'_>, row: Option<u32>, next_col: &mut u32) -> Result<RawCell> {
    let mut raw = RawCell::default();
    let mut coordinate = None;

    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"r" => coordinate = Some(attr.unescape_value()?.into_owned()),
            b"t" => raw.cell_type = Some(attr.unescape_value()?.into_owned()),
            b"s" => raw.style = attr.unescape_value()?.trim().parse().ok(),
            _ => {}
        }
    }

    raw.at = match coordinate {
        Some(r) => match CellRef::parse(&r) {
            Ok(at) => Some(at),
            Err(_) => {
                tracing::warn!(coordinate = %r, "skipping cell with malformed coordinate");
                None
            }
        },
        None if *next_col >= MAX_COLS => {
            return Err(Error::InvalidData(
                "implicit cell past the last sheet column".to_string(),
            ));
        }
        None => Some(CellRef::new(row.unwrap_or(0), *next_col)),
    };
    if let Some(at) = raw.at {
        *next_col = at.col + 1;
    }
    Ok(raw)
}

fn open_formula(e: &BytesStart<'_>) -> Result<RawFormula> {
    let mut formula = RawFormula::default();
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"t" => formula.kind = Some(attr.unescape_value()?.into_owned()),
            b"ref" => formula.range = Some(attr.unescape_value()?.into_owned()),
            b"si" => formula.shared_index = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }
    Ok(formula)
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Turn the collected parts of one `<c>` into its literal value.
fn resolve_cell(
    raw: RawCell,
    at: CellRef,
    ctx: &CellContext<'_>,
    shared_formulas: &mut HashMap<String, (CellRef, String)>,
) -> Result<CellValue> {
    let RawCell {
        cell_type,
        style,
        value,
        inline,
        formula,
        ..
    } = raw;

    if let Some(formula) = formula {
        match formula.kind.as_deref() {
            Some("array") => {
                return Ok(CellValue::ArrayFormula {
                    range: formula.range.unwrap_or_else(|| at.to_string()),
                    text: formula.text,
                });
            }
            Some("shared") => {
                let index = formula.shared_index.unwrap_or_default();
                if !formula.text.is_empty() {
                    let value = CellValue::Formula(format!("={}", formula.text));
                    shared_formulas.insert(index, (at, formula.text));
                    return Ok(value);
                }
                if let Some((anchor, text)) = shared_formulas.get(&index) {
                    return Ok(CellValue::Formula(format!(
                        "={}",
                        translate_formula(text, *anchor, at)
                    )));
                }
                tracing::warn!(
                    cell = %at,
                    shared_index = %index,
                    "shared formula has no anchor; using the stored value"
                );
            }
            Some("dataTable") => {
                tracing::debug!(cell = %at, "data table formula; using the stored value");
            }
            _ => return Ok(CellValue::Formula(format!("={}", formula.text))),
        }
    }

    let literal = match cell_type.as_deref() {
        Some("inlineStr") => {
            return Ok(inline.map_or(CellValue::Empty, CellValue::Text));
        }
        _ => match value {
            Some(v) => v,
            None => return Ok(CellValue::Empty),
        },
    };

    match cell_type.as_deref() {
        Some("s") => {
            let index: usize = literal.trim().parse().map_err(|_| {
                Error::InvalidData(format!("cell {}: invalid shared string index '{}'", at, literal))
            })?;
            let text = ctx.shared_strings.get(index).ok_or_else(|| {
                Error::InvalidData(format!(
                    "cell {}: shared string index {} out of bounds",
                    at, index
                ))
            })?;
            Ok(CellValue::Text(text.to_string()))
        }
        Some("str") => Ok(CellValue::Text(literal)),
        Some("b") => Ok(CellValue::Bool(
            literal.trim() == "1" || literal.trim().eq_ignore_ascii_case("true"),
        )),
        Some("e") => Ok(CellValue::Error(literal)),
        Some("d") => Ok(parse_iso_date(&literal)
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Text(literal))),
        _ => {
            let Some(number) = CellValue::from_number_literal(&literal) else {
                tracing::warn!(cell = %at, value = %literal, "non-numeric value in numeric cell");
                return Ok(CellValue::Text(literal));
            };
            Ok(apply_date_format(number, style, ctx))
        }
    }
}

/// Numbers styled with a date or time format become date values.
fn apply_date_format(number: CellValue, style: Option<usize>, ctx: &CellContext<'_>) -> CellValue {
    let Some(kind) = style.and_then(|s| ctx.styles.date_kind(s)) else {
        return number;
    };
    let Some(serial) = number.as_f64() else {
        return number;
    };

    let converted = match kind {
        DateKind::Time if serial < 1.0 => DateSystem::to_time(serial).map(CellValue::Time),
        _ => ctx
            .date_system
            .to_datetime(serial)
            .map(CellValue::DateTime),
    };
    converted.unwrap_or(number)
}

/// ISO 8601 values of `t="d"` cells.
fn parse_iso_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_end_matches('Z');
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .ok()
        .and_then(|t| NaiveDate::from_ymd_opt(1899, 12, 30).map(|d| d.and_time(t)))
}
