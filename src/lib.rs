//! # sheetrange
//!
//! Export a rectangular cell range of an Excel worksheet to JSON.
//!
//! Cells are read as written: formulas stay formula text (never
//! evaluated), empty cells become `null`, and the output object is keyed by
//! coordinate in row-major order.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sheetrange::{ExportConfig, RangeExporter};
//!
//! let config = ExportConfig::new("model.xlsx", "Summary", "A1:U182", "summary.json");
//! let report = RangeExporter::new(config).export()?;
//! println!("{} cells written to {}", report.cells, report.output.display());
//! # Ok::<(), sheetrange::Error>(())
//! ```
//!
//! ## Reading Without Writing
//!
//! ```no_run
//! use sheetrange::{range_to_map, to_json, CellRange, WorkbookReader};
//!
//! let reader = WorkbookReader::open("model.xlsx")?;
//! let sheet = reader.worksheet("Summary")?;
//! let map = range_to_map(&sheet, &CellRange::parse("A1:C10")?);
//! println!("{}", to_json(&map)?);
//! # Ok::<(), sheetrange::Error>(())
//! ```

pub mod container;
pub mod detect;
pub mod error;
pub mod export;
pub mod model;
pub mod reference;
pub mod xlsx;

// Re-exports
pub use container::{Package, Relationship, Relationships};
pub use detect::{detect_format_from_bytes, detect_format_from_path, WorkbookFormat};
pub use error::{Error, Result};
pub use export::{
    export_value, range_to_map, to_json, ExportConfig, ExportReport, OutputMap, RangeExporter,
    MAX_EXPORT_CELLS,
};
pub use model::{CellValue, Worksheet};
pub use reference::{CellRange, CellRef};
pub use xlsx::WorkbookReader;

/// Export one range in a single call.
///
/// # Example
///
/// ```no_run
/// use sheetrange::{export, ExportConfig};
///
/// export(ExportConfig::new("model.xlsx", "Summary", "A1:B2", "out.json"))?;
/// # Ok::<(), sheetrange::Error>(())
/// ```
pub fn export(config: ExportConfig) -> Result<ExportReport> {
    RangeExporter::new(config).export()
}
