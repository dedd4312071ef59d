//! Workbook format detection.

use crate::container::Package;
use crate::error::{Error, Result};
use std::path::Path;

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// OLE compound file magic, used by legacy .xls workbooks.
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const XLTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.template.main+xml";
const XLSM_CONTENT_TYPE: &str = "application/vnd.ms-excel.sheet.macroEnabled.main+xml";
const XLTM_CONTENT_TYPE: &str = "application/vnd.ms-excel.template.macroEnabled.main+xml";

const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const PPTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";

/// Spreadsheet package flavours that share the SpreadsheetML layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    /// Excel workbook (.xlsx)
    Xlsx,
    /// Macro-enabled workbook (.xlsm)
    Xlsm,
    /// Workbook template (.xltx)
    Xltx,
    /// Macro-enabled template (.xltm)
    Xltm,
}

impl WorkbookFormat {
    /// Returns a human-readable name for this format.
    pub fn name(&self) -> &'static str {
        match self {
            WorkbookFormat::Xlsx => "Excel Workbook",
            WorkbookFormat::Xlsm => "Excel Macro-Enabled Workbook",
            WorkbookFormat::Xltx => "Excel Template",
            WorkbookFormat::Xltm => "Excel Macro-Enabled Template",
        }
    }
}

impl std::fmt::Display for WorkbookFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect the workbook format of a file.
///
/// # Example
///
/// ```no_run
/// use sheetrange::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("book.xlsx")?;
/// println!("Detected format: {}", format);
/// # Ok::<(), sheetrange::Error>(())
/// ```
pub fn detect_format_from_path(path: impl AsRef<Path>) -> Result<WorkbookFormat> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    detect_format_from_bytes(&data)
}

/// Detect the workbook format of an in-memory file.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<WorkbookFormat> {
    check_magic(data)?;
    let package = Package::from_bytes(data.to_vec())?;
    detect_format(&package)
}

/// Reject inputs that are not ZIP packages before handing them to the
/// archive reader, so legacy binary workbooks get a clear message.
pub(crate) fn check_magic(data: &[u8]) -> Result<()> {
    if data.starts_with(&OLE_MAGIC) {
        return Err(Error::UnsupportedFormat(
            "legacy .xls (BIFF) workbooks are not supported; save as .xlsx".to_string(),
        ));
    }
    if !is_zip_file(data) {
        return Err(Error::UnknownFormat);
    }
    Ok(())
}

/// Detect the workbook format of an opened package from `[Content_Types].xml`.
pub fn detect_format(package: &Package) -> Result<WorkbookFormat> {
    let content_types = package
        .read_optional_xml("[Content_Types].xml")?
        .ok_or_else(|| Error::MissingComponent("[Content_Types].xml".to_string()))?;

    if content_types.contains(XLSX_CONTENT_TYPE) {
        Ok(WorkbookFormat::Xlsx)
    } else if content_types.contains(XLSM_CONTENT_TYPE) {
        Ok(WorkbookFormat::Xlsm)
    } else if content_types.contains(XLTX_CONTENT_TYPE) {
        Ok(WorkbookFormat::Xltx)
    } else if content_types.contains(XLTM_CONTENT_TYPE) {
        Ok(WorkbookFormat::Xltm)
    } else if content_types.contains(DOCX_CONTENT_TYPE) {
        Err(Error::UnsupportedFormat("Word document".to_string()))
    } else if content_types.contains(PPTX_CONTENT_TYPE) {
        Err(Error::UnsupportedFormat("PowerPoint presentation".to_string()))
    } else if package.part_names().iter().any(|n| n.starts_with("xl/")) {
        Ok(WorkbookFormat::Xlsx)
    } else {
        Err(Error::UnknownFormat)
    }
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.starts_with(&ZIP_MAGIC)
}
