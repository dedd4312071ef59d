//! XLSX (Excel) workbook reader.
//!
//! Reads SpreadsheetML packages with formulas kept as written. Nothing is
//! evaluated: a formula cell yields its formula text, not its cached result.
//!
//! # Example
//!
//! ```no_run
//! use sheetrange::xlsx::WorkbookReader;
//! use sheetrange::CellRange;
//!
//! let reader = WorkbookReader::open("book.xlsx")?;
//! let sheet = reader.worksheet("Sheet1")?;
//! for (at, value) in sheet.range_cells(&CellRange::parse("A1:C3")?) {
//!     println!("{} = {:?}", at, value);
//! }
//! # Ok::<(), sheetrange::Error>(())
//! ```

mod formula;
mod shared_strings;
mod styles;
mod workbook;
mod worksheet;

pub use formula::translate_formula;
pub use shared_strings::SharedStrings;
pub use styles::{classify_format_code, DateKind, DateSystem, Styles};
pub use workbook::WorkbookReader;
pub use worksheet::{parse_worksheet, CellContext};
