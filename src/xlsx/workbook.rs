//! Workbook reader: the entry point for reading worksheets out of a package.

use super::shared_strings::SharedStrings;
use super::styles::{DateSystem, Styles};
use super::worksheet::{parse_worksheet, CellContext};
use crate::container::{Package, Relationships, REL_OFFICE_DOCUMENT};
use crate::detect::{check_magic, detect_format, WorkbookFormat};
use crate::error::{Error, Result};
use crate::model::Worksheet;
use quick_xml::events::Event;
use std::path::Path;

const REL_WORKSHEET: &str = "worksheet";
const REL_SHARED_STRINGS: &str = "sharedStrings";
const REL_STYLES: &str = "styles";

const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

/// Sheet entry from workbook.xml.
#[derive(Debug, Clone)]
struct SheetInfo {
    name: String,
    rel_id: String,
}

/// Reader for Excel workbooks.
///
/// Opening a workbook loads the sheet list, shared strings and styles.
/// Worksheets are parsed on request, one at a time.
///
/// # Example
///
/// ```no_run
/// use sheetrange::WorkbookReader;
///
/// let reader = WorkbookReader::open("book.xlsx")?;
/// for name in reader.sheet_names() {
///     println!("{}", name);
/// }
/// let sheet = reader.worksheet("Summary")?;
/// println!("{} cells", sheet.len());
/// # Ok::<(), sheetrange::Error>(())
/// ```
#[derive(Debug)]
pub struct WorkbookReader {
    package: Package,
    format: WorkbookFormat,
    workbook_part: String,
    relationships: Relationships,
    sheets: Vec<SheetInfo>,
    shared_strings: SharedStrings,
    styles: Styles,
    date_system: DateSystem,
}

impl WorkbookReader {
    /// Open a workbook file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(data)
    }

    /// Read a workbook held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        check_magic(&data)?;
        let package = Package::from_bytes(data)?;
        let format = detect_format(&package)?;
        Self::from_package(package, format)
    }

    fn from_package(package: Package, format: WorkbookFormat) -> Result<Self> {
        let workbook_part = package
            .relationships("")?
            .first_of_kind(REL_OFFICE_DOCUMENT)
            .map(|rel| Package::resolve_path("", &rel.target))
            .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string());

        let workbook_xml = package.read_xml(&workbook_part)?;
        let (sheets, date_system) = parse_workbook(&workbook_xml)?;
        let relationships = package.relationships(&workbook_part)?;

        let shared_strings = match read_workbook_part(
            &package,
            &workbook_part,
            &relationships,
            REL_SHARED_STRINGS,
            "sharedStrings.xml",
        )? {
            Some(xml) => SharedStrings::parse(&xml)?,
            None => SharedStrings::default(),
        };
        let styles = match read_workbook_part(
            &package,
            &workbook_part,
            &relationships,
            REL_STYLES,
            "styles.xml",
        )? {
            Some(xml) => Styles::parse(&xml)?,
            None => Styles::default(),
        };

        tracing::debug!(
            part = %workbook_part,
            format = %format,
            sheets = sheets.len(),
            shared_strings = shared_strings.len(),
            cell_formats = styles.len(),
            ?date_system,
            "opened workbook"
        );

        Ok(Self {
            package,
            format,
            workbook_part,
            relationships,
            sheets,
            shared_strings,
            styles,
            date_system,
        })
    }

    /// The detected workbook flavour.
    pub fn format(&self) -> WorkbookFormat {
        self.format
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn date_system(&self) -> DateSystem {
        self.date_system
    }

    /// Parse the worksheet with exactly this name (case-sensitive).
    pub fn worksheet(&self, name: &str) -> Result<Worksheet> {
        let info = self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::SheetNotFound {
                name: name.to_string(),
            })?;

        let rel = self
            .relationships
            .get(&info.rel_id)
            .ok_or_else(|| Error::MissingComponent(format!("sheet part for '{}'", name)))?;
        if !rel.is_kind(REL_WORKSHEET) {
            return Err(Error::NotAWorksheet(name.to_string()));
        }

        let path = Package::resolve_path(&self.workbook_part, &rel.target);
        tracing::debug!(sheet = name, part = %path, "reading worksheet");
        let xml = self.package.read_xml(&path)?;

        let ctx = CellContext {
            shared_strings: &self.shared_strings,
            styles: &self.styles,
            date_system: self.date_system,
        };
        parse_worksheet(&xml, name, ctx)
    }
}

/// Locate a workbook-level part through the relationships, falling back to
/// the conventional name beside the workbook part.
fn read_workbook_part(
    package: &Package,
    workbook_part: &str,
    relationships: &Relationships,
    kind: &str,
    default_name: &str,
) -> Result<Option<String>> {
    let path = match relationships.first_of_kind(kind) {
        Some(rel) => Package::resolve_path(workbook_part, &rel.target),
        None => Package::resolve_path(workbook_part, default_name),
    };
    package.read_optional_xml(&path)
}

/// Sheets in workbook order, and the date system.
fn parse_workbook(xml: &str) -> Result<(Vec<SheetInfo>, DateSystem)> {
    let mut sheets = Vec::new();
    let mut date_system = DateSystem::Excel1900;

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"sheet" => {
                    let mut name = String::new();
                    let mut rel_id = String::new();

                    for attr in e.attributes().flatten() {
                        let key = attr.key;
                        if key.as_ref() == b"name" {
                            name = attr.unescape_value()?.into_owned();
                        } else if key.local_name().as_ref() == b"id" && key.prefix().is_some() {
                            // r:id, whatever the relationships namespace is bound to
                            rel_id = attr.unescape_value()?.into_owned();
                        }
                    }

                    if !name.is_empty() {
                        sheets.push(SheetInfo { name, rel_id });
                    }
                }
                b"workbookPr" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"date1904" {
                            let value = attr.unescape_value()?;
                            if value == "1" || value.eq_ignore_ascii_case("true") {
                                date_system = DateSystem::Excel1904;
                            }
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok((sheets, date_system))
}
