//! End-to-end export tests against workbooks built in memory.

mod common;

use common::{price_list, WorkbookBuilder};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sheetrange::{
    CellRange, Error, ExportConfig, ExportReport, RangeExporter, Result, WorkbookReader,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write `book` into `dir` and export `range` of `sheet` to `dir/out.json`.
fn export_in(
    dir: &Path,
    book: &WorkbookBuilder,
    sheet: &str,
    range: &str,
) -> (Result<ExportReport>, PathBuf) {
    let input = dir.join("book.xlsx");
    let output = dir.join("out.json");
    book.write_to(&input);
    let config = ExportConfig::new(&input, sheet, range, &output);
    (RangeExporter::new(config).export(), output)
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_basic_range() {
    let dir = TempDir::new().unwrap();
    let book = WorkbookBuilder::new()
        .shared_strings(&["Item", "Qty"])
        .sheet(
            "Sheet1",
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
<row r="2"><c r="A2"><v>5</v></c></row>"#,
        );

    let (result, output) = export_in(dir.path(), &book, "Sheet1", "A1:B2");
    let report = result.unwrap();

    assert_eq!(report.cells, 4);
    assert_eq!(report.range, "A1:B2");
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "{\n  \"A1\": \"Item\",\n  \"B1\": \"Qty\",\n  \"A2\": 5,\n  \"B2\": null\n}"
    );
}

#[test]
fn test_plain_formula_is_text() {
    let dir = TempDir::new().unwrap();
    let book = WorkbookBuilder::new().sheet(
        "Sheet1",
        r#"<row r="1"><c r="C1"><f>SUM(A1:A10)</f><v>55</v></c></row>"#,
    );

    let (result, output) = export_in(dir.path(), &book, "Sheet1", "C1");
    result.unwrap();
    assert_eq!(read_json(&output), json!({"C1": "=SUM(A1:A10)"}));
}

#[test]
fn test_array_formula_gets_equals_prefix() {
    let dir = TempDir::new().unwrap();
    let book = WorkbookBuilder::new().sheet(
        "Sheet1",
        r#"<row r="1"><c r="D1"><f t="array" ref="D1">SUM(A1:A10)</f><v>55</v></c></row>"#,
    );

    let (result, output) = export_in(dir.path(), &book, "Sheet1", "D1:D1");
    result.unwrap();
    assert_eq!(read_json(&output), json!({"D1": "=SUM(A1:A10)"}));
}

#[test]
fn test_missing_sheet_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let (result, output) = export_in(dir.path(), &price_list(), "NoSuchSheet", "A1:B2");

    let err = result.unwrap_err();
    assert!(matches!(err, Error::SheetNotFound { ref name } if name == "NoSuchSheet"));
    assert_eq!(err.to_string(), "Worksheet 'NoSuchSheet' does not exist");
    assert!(!output.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_single_cell_sheet() {
    let dir = TempDir::new().unwrap();
    let book = WorkbookBuilder::new().sheet("Only", r#"<row r="1"><c r="A1"><v>42</v></c></row>"#);

    let (result, output) = export_in(dir.path(), &book, "Only", "A1:A1");
    result.unwrap();
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "{\n  \"A1\": 42\n}");
}

#[test]
fn test_one_entry_per_coordinate() {
    let dir = TempDir::new().unwrap();
    let (result, output) = export_in(dir.path(), &price_list(), "Sheet1", "A1:E6");
    assert_eq!(result.unwrap().cells, 30);

    let json = read_json(&output);
    let map = json.as_object().unwrap();
    assert_eq!(map.len(), 30);

    let range = CellRange::parse("A1:E6").unwrap();
    let expected: Vec<String> = range.cells().map(|c| c.to_string()).collect();
    let got: Vec<String> = map.keys().cloned().collect();
    assert_eq!(got, expected);
}

#[test]
fn test_literal_values_and_formulas() {
    let dir = TempDir::new().unwrap();
    let (result, output) = export_in(dir.path(), &price_list(), "Sheet1", "A1:C4");
    result.unwrap();

    assert_eq!(
        read_json(&output),
        json!({
            "A1": "Item", "B1": "Qty", "C1": null,
            "A2": "Apple", "B2": 5, "C2": "=B2*2",
            "A3": "Pear", "B3": 2.5, "C3": "=SUM(B2:B3)",
            "A4": null, "B4": null, "C4": null
        })
    );
}

#[test]
fn test_repeat_export_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let (first, output) = export_in(dir.path(), &price_list(), "Sheet1", "A1:C3");
    first.unwrap();
    let before = std::fs::read(&output).unwrap();

    let config = ExportConfig::new(dir.path().join("book.xlsx"), "Sheet1", "A1:C3", &output);
    RangeExporter::new(config).export().unwrap();
    assert_eq!(std::fs::read(&output).unwrap(), before);
}

#[test]
fn test_shared_formula_dependents() {
    let dir = TempDir::new().unwrap();
    let book = WorkbookBuilder::new().sheet(
        "Calc",
        r#"<row r="1"><c r="A1"><v>1</v></c><c r="B1"><f t="shared" ref="B1:B3" si="0">A1*$D$1</f><v>2</v></c></row>
<row r="2"><c r="A2"><v>2</v></c><c r="B2"><f t="shared" si="0"/><v>4</v></c></row>
<row r="3"><c r="A3"><v>3</v></c><c r="B3"><f t="shared" si="0"/><v>6</v></c></row>"#,
    );

    let (result, output) = export_in(dir.path(), &book, "Calc", "B1:B3");
    result.unwrap();
    assert_eq!(
        read_json(&output),
        json!({"B1": "=A1*$D$1", "B2": "=A2*$D$1", "B3": "=A3*$D$1"})
    );
}

#[test]
fn test_failed_run_keeps_previous_output() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");
    std::fs::write(&output, "previous").unwrap();

    let input = dir.path().join("book.xlsx");
    price_list().write_to(&input);

    for (sheet, range) in [("Missing", "A1:B2"), ("Sheet1", "A1:B"), ("Sheet1", "Sheet1!A1")] {
        let config = ExportConfig::new(&input, sheet, range, &output);
        assert!(RangeExporter::new(config).export().is_err());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous");
    }
}

const DATE_STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd\ hh:mm"/></numFmts>
<cellXfs count="3"><xf numFmtId="0"/><xf numFmtId="14" applyNumberFormat="1"/><xf numFmtId="164" applyNumberFormat="1"/></cellXfs>
</styleSheet>"#;

#[test]
fn test_dates_export_as_iso_strings() {
    let dir = TempDir::new().unwrap();
    let book = WorkbookBuilder::new().styles(DATE_STYLES).sheet(
        "Dates",
        r#"<row r="1"><c r="A1" s="1"><v>45366</v></c><c r="B1" s="2"><v>45366.5</v></c><c r="C1"><v>45366</v></c></row>"#,
    );

    let (result, output) = export_in(dir.path(), &book, "Dates", "A1:C1");
    result.unwrap();
    assert_eq!(
        read_json(&output),
        json!({"A1": "2024-03-15T00:00:00", "B1": "2024-03-15T12:00:00", "C1": 45366})
    );
}

#[test]
fn test_1904_date_system() {
    let dir = TempDir::new().unwrap();
    let book = WorkbookBuilder::new()
        .date1904()
        .styles(DATE_STYLES)
        .sheet("Dates", r#"<row r="1"><c r="A1" s="1"><v>0</v></c><c r="B1" s="1"><v>43904</v></c></row>"#);

    let (result, output) = export_in(dir.path(), &book, "Dates", "A1:B1");
    result.unwrap();
    assert_eq!(
        read_json(&output),
        json!({"A1": "1904-01-01T00:00:00", "B1": "2024-03-15T00:00:00"})
    );
}

#[test]
fn test_range_forms() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("book.xlsx");
    price_list().write_to(&input);

    let collect = |range: &str| {
        let config = ExportConfig::new(&input, "Sheet1", range, dir.path().join("unused.json"));
        RangeExporter::new(config).collect()
    };

    let reversed = collect("B2:A1").unwrap();
    let absolute = collect("$a$1:$b$2").unwrap();
    let keys: Vec<&String> = reversed.keys().collect();
    assert_eq!(keys, vec!["A1", "B1", "A2", "B2"]);
    assert_eq!(reversed, absolute);

    for bad in ["", "A:B", "A0:B2", "XFE1", "A1:B2:C3", "Sheet1!A1:B2"] {
        assert!(
            matches!(collect(bad), Err(Error::InvalidRange(_))),
            "expected '{}' to be rejected",
            bad
        );
    }
    assert!(!dir.path().join("unused.json").exists());
}

#[test]
fn test_chartsheet_and_missing_workbook() {
    let dir = TempDir::new().unwrap();
    let book = price_list().chartsheet("Chart1");
    let (result, _) = export_in(dir.path(), &book, "Chart1", "A1");
    assert!(matches!(result, Err(Error::NotAWorksheet(_))));

    let config = ExportConfig::new(
        dir.path().join("absent.xlsx"),
        "Sheet1",
        "A1",
        dir.path().join("o.json"),
    );
    assert!(matches!(
        RangeExporter::new(config).export(),
        Err(Error::Open { .. })
    ));
}

#[test]
fn test_reader_lists_sheets() {
    let book = price_list().sheet("Second", "").chartsheet("Chart1");
    let reader = WorkbookReader::from_bytes(book.build()).unwrap();
    assert_eq!(reader.sheet_names(), vec!["Sheet1", "Second", "Chart1"]);
    assert!(reader.worksheet("Second").unwrap().is_empty());
}

#[test]
fn test_non_ascii_written_as_utf8() {
    let dir = TempDir::new().unwrap();
    let book = WorkbookBuilder::new()
        .shared_strings(&["Größe", "東京"])
        .sheet("Sheet1", r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>"#);

    let (result, output) = export_in(dir.path(), &book, "Sheet1", "A1:B1");
    result.unwrap();
    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.contains("\"Größe\""));
    assert!(text.contains("\"東京\""));
}
