//! In-memory workbook fixtures.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Builds a minimal .xlsx package. Sheet bodies are given as the inner XML
/// of `<sheetData>`.
#[derive(Debug, Default)]
pub struct WorkbookBuilder {
    sheets: Vec<(String, String)>,
    chartsheets: Vec<String>,
    shared_strings: Vec<String>,
    styles: Option<String>,
    date1904: bool,
}

impl WorkbookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(mut self, name: &str, sheet_data: &str) -> Self {
        self.sheets.push((name.to_string(), sheet_data.to_string()));
        self
    }

    pub fn chartsheet(mut self, name: &str) -> Self {
        self.chartsheets.push(name.to_string());
        self
    }

    pub fn shared_strings(mut self, strings: &[&str]) -> Self {
        self.shared_strings = strings.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Full `xl/styles.xml` content.
    pub fn styles(mut self, xml: &str) -> Self {
        self.styles = Some(xml.to_string());
        self
    }

    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options = SimpleFileOptions::default();
            let mut add = |name: &str, content: &str| {
                zip.start_file(name, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            };

            add("[Content_Types].xml", &self.content_types());
            add(
                "_rels/.rels",
                &format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#,
                    REL_NS
                ),
            );
            add("xl/workbook.xml", &self.workbook_xml());
            add("xl/_rels/workbook.xml.rels", &self.workbook_rels());

            for (i, (_, body)) in self.sheets.iter().enumerate() {
                add(
                    &format!("xl/worksheets/sheet{}.xml", i + 1),
                    &format!(
                        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{}" xmlns:r="{}"><sheetData>{}</sheetData></worksheet>"#,
                        MAIN_NS, REL_NS, body
                    ),
                );
            }
            for i in 0..self.chartsheets.len() {
                add(
                    &format!("xl/chartsheets/sheet{}.xml", i + 1),
                    &format!(r#"<chartsheet xmlns="{}"/>"#, MAIN_NS),
                );
            }
            if !self.shared_strings.is_empty() {
                add("xl/sharedStrings.xml", &self.shared_strings_xml());
            }
            if let Some(styles) = &self.styles {
                add("xl/styles.xml", styles);
            }

            zip.finish().unwrap();
        }
        buffer
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.build()).unwrap();
    }

    fn content_types(&self) -> String {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
</Types>"#
            .to_string()
    }

    fn workbook_xml(&self) -> String {
        let mut sheets = String::new();
        let names = self
            .sheets
            .iter()
            .map(|(name, _)| name)
            .chain(self.chartsheets.iter());
        for (i, name) in names.enumerate() {
            sheets.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape(name),
                i + 1,
                i + 1
            ));
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="{}"><workbookPr{}/><sheets>{}</sheets></workbook>"#,
            MAIN_NS,
            REL_NS,
            if self.date1904 { r#" date1904="1""# } else { "" },
            sheets
        )
    }

    fn workbook_rels(&self) -> String {
        let mut rels = String::new();
        let mut id = 0;
        for i in 0..self.sheets.len() {
            id += 1;
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                id,
                REL_NS,
                i + 1
            ));
        }
        for i in 0..self.chartsheets.len() {
            id += 1;
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{}/chartsheet" Target="chartsheets/sheet{}.xml"/>"#,
                id,
                REL_NS,
                i + 1
            ));
        }
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}/sharedStrings" Target="sharedStrings.xml"/>"#,
            id + 1,
            REL_NS
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}/styles" Target="styles.xml"/>"#,
            id + 2,
            REL_NS
        ));
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
            rels
        )
    }

    fn shared_strings_xml(&self) -> String {
        let items: String = self
            .shared_strings
            .iter()
            .map(|s| format!(r#"<si><t xml:space="preserve">{}</t></si>"#, escape(s)))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="{}" count="{n}" uniqueCount="{n}">{}</sst>"#,
            MAIN_NS,
            items,
            n = self.shared_strings.len()
        )
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// The workbook used by most scenarios: a small price list on "Sheet1".
///
/// ```text
///     A        B     C
/// 1   Item     Qty   (empty)
/// 2   Apple    5     =B2*2
/// 3   Pear     2.5   {=SUM(B2:B3)} over C3:C4
/// ```
pub fn price_list() -> WorkbookBuilder {
    WorkbookBuilder::new()
        .shared_strings(&["Item", "Qty", "Apple", "Pear"])
        .sheet(
            "Sheet1",
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
<row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>5</v></c><c r="C2"><f>B2*2</f><v>10</v></c></row>
<row r="3"><c r="A3" t="s"><v>3</v></c><c r="B3"><v>2.5</v></c><c r="C3"><f t="array" ref="C3:C4">SUM(B2:B3)</f><v>7.5</v></c></row>"#,
        )
}
