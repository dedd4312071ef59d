//! Error types for the sheetrange library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sheetrange operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a workbook or exporting a range.
#[derive(Error, Debug)]
pub enum Error {
    /// The workbook file could not be opened or read.
    #[error("cannot open workbook '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The requested sheet does not exist in the workbook.
    #[error("Worksheet '{name}' does not exist")]
    SheetNotFound { name: String },

    /// The sheet exists but holds no cell grid (e.g. a chartsheet).
    #[error("Sheet '{0}' is not a worksheet")]
    NotAWorksheet(String),

    /// The range expression is malformed or outside the sheet limits.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// The output file could not be written.
    #[error("cannot write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format could not be determined.
    #[error("Unknown file format")]
    UnknownFormat,

    /// The file format is recognized but not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Error reading ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Invalid or malformed data in the workbook.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A required package part is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}
