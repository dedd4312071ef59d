//! Range export: one worksheet range to a JSON object keyed by coordinate.

use crate::error::{Error, Result};
use crate::model::{CellValue, Worksheet};
use crate::reference::CellRange;
use crate::xlsx::WorkbookReader;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Largest range, in cells, one export may cover. Every coordinate gets an
/// entry, so the output grows with the range rather than the data.
pub const MAX_EXPORT_CELLS: u64 = 10_000_000;

/// Coordinate string to exported value, in row-major traversal order.
pub type OutputMap = serde_json::Map<String, Value>;

/// What to export and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Workbook to read
    pub input: PathBuf,
    /// Exact (case-sensitive) sheet name
    pub sheet: String,
    /// Range expression such as "A1:U182"
    pub range: String,
    /// JSON file to create or replace
    pub output: PathBuf,
}

impl ExportConfig {
    pub fn new(
        input: impl Into<PathBuf>,
        sheet: impl Into<String>,
        range: impl Into<String>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.into(),
            sheet: sheet.into(),
            range: range.into(),
            output: output.into(),
        }
    }
}

/// Summary of a completed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// Number of entries written
    pub cells: usize,
    pub sheet: String,
    /// The normalized range, e.g. "A1:B2"
    pub range: String,
    pub output: PathBuf,
}

/// Exports one range of one worksheet as JSON.
///
/// # Example
///
/// ```no_run
/// use sheetrange::{ExportConfig, RangeExporter};
///
/// let config = ExportConfig::new("book.xlsx", "Summary", "A1:U182", "summary.json");
/// let report = RangeExporter::new(config).export()?;
/// println!("wrote {} cells", report.cells);
/// # Ok::<(), sheetrange::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct RangeExporter {
    config: ExportConfig,
}

impl RangeExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Read the configured range into an ordered map without writing anything.
    pub fn collect(&self) -> Result<OutputMap> {
        let (map, _) = self.read()?;
        Ok(map)
    }

    /// Read the configured range and write it to the output path.
    ///
    /// The output is replaced only once the new content is completely
    /// written; on any error an existing output file is left as it was.
    pub fn export(&self) -> Result<ExportReport> {
        let (map, range) = self.read()?;
        let json = to_json(&map)?;
        write_atomic(&self.config.output, json.as_bytes())?;

        tracing::debug!(
            output = %self.config.output.display(),
            cells = map.len(),
            bytes = json.len(),
            "wrote range"
        );

        Ok(ExportReport {
            cells: map.len(),
            sheet: self.config.sheet.clone(),
            range: range.to_string(),
            output: self.config.output.clone(),
        })
    }

    fn read(&self) -> Result<(OutputMap, CellRange)> {
        // The range is checked first so a bad expression fails before any I/O.
        let range = CellRange::parse(&self.config.range)?;
        if range.cell_count() > MAX_EXPORT_CELLS {
            return Err(Error::InvalidRange(format!(
                "'{}' covers {} cells; at most {} can be exported",
                range,
                range.cell_count(),
                MAX_EXPORT_CELLS
            )));
        }
        let reader = WorkbookReader::open(&self.config.input)?;
        let sheet = reader.worksheet(&self.config.sheet)?;

        tracing::debug!(
            sheet = %sheet.name,
            range = %range,
            cells = range.cell_count(),
            "exporting range"
        );
        Ok((range_to_map(&sheet, &range), range))
    }
}

/// Build the output map for `range`, one entry per coordinate.
///
/// Rows are visited top to bottom and cells left to right; the map keeps
/// that order.
pub fn range_to_map(sheet: &Worksheet, range: &CellRange) -> OutputMap {
    let mut map = OutputMap::new();
    for (at, value) in sheet.range_cells(range) {
        map.insert(at.to_string(), export_value(value));
    }
    map
}

/// The JSON value for one cell. Array formulas become `"=" + text`.
pub fn export_value(value: &CellValue) -> Value {
    value.to_json()
}

/// Serialize with 2-space indentation.
pub fn to_json(map: &OutputMap) -> Result<String> {
    Ok(serde_json::to_string_pretty(map)?)
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let write_err = |source: std::io::Error| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    file.write_all(contents).map_err(write_err)?;
    file.flush().map_err(write_err)?;
    if let Some(permissions) = output_permissions(path) {
        file.as_file()
            .set_permissions(permissions)
            .map_err(write_err)?;
    }
    file.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Mode for the replacement file: the existing output's, or 0644 for a new
/// one. The temporary file alone would be created 0600.
fn output_permissions(path: &Path) -> Option<std::fs::Permissions> {
    if let Ok(metadata) = std::fs::metadata(path) {
        return Some(metadata.permissions());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Some(std::fs::Permissions::from_mode(0o644))
    }
    #[cfg(not(unix))]
    {
        None
    }
}
