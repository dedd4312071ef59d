//! Workbook data model.
//!
//! The reader turns SpreadsheetML parts into these structures; the exporter
//! maps them to JSON.

mod cell;
mod sheet;

pub use cell::*;
pub use sheet::*;
