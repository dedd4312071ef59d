//! Worksheet model.

use super::CellValue;
use crate::reference::{CellRange, CellRef};
use std::collections::BTreeMap;

static EMPTY: CellValue = CellValue::Empty;

/// A parsed worksheet: the cells the sheet stores, keyed by coordinate.
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    /// Sheet name as listed in the workbook
    pub name: String,
    cells: BTreeMap<CellRef, CellValue>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    /// Store a value; a later write to the same coordinate replaces it.
    pub fn set(&mut self, at: CellRef, value: CellValue) {
        self.cells.insert(at, value);
    }

    /// The value at a coordinate; cells the sheet does not store are empty.
    pub fn get(&self, at: CellRef) -> &CellValue {
        self.cells.get(&at).unwrap_or(&EMPTY)
    }

    /// Number of stored cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Every coordinate of `range` in traversal order, paired with its value.
    ///
    /// Coordinates the sheet does not store are yielded as empty.
    pub fn range_cells<'a>(
        &'a self,
        range: &CellRange,
    ) -> impl Iterator<Item = (CellRef, &'a CellValue)> + 'a {
        range.cells().map(move |at| (at, self.get(at)))
    }
}
