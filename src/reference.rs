//! A1-style cell coordinates and rectangular range expressions.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Number of rows in a worksheet (1..=1048576).
pub const MAX_ROWS: u32 = 1_048_576;

/// Number of columns in a worksheet (A..=XFD).
pub const MAX_COLS: u32 = 16_384;

/// A cell coordinate such as "A1".
///
/// Row and column are 0-based internally. Ordering is row-major, which is
/// the traversal order of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    /// Row index (0-based, displayed 1-based)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., XFD=16383)
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse an A1-style coordinate. `$` markers are accepted and dropped,
    /// column letters are case-insensitive.
    ///
    /// # Examples
    /// ```
    /// use sheetrange::CellRef;
    ///
    /// let cell = CellRef::parse("$U$182").unwrap();
    /// assert_eq!(cell.row, 181);
    /// assert_eq!(cell.col, 20);
    /// assert_eq!(cell.to_string(), "U182");
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        parse_coordinate(s.trim()).map_err(Error::InvalidRange)
    }

    /// Convert column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
    pub fn column_to_letters(col: u32) -> String {
        let mut letters = Vec::with_capacity(3);
        let mut n = col + 1;
        while n > 0 {
            n -= 1;
            letters.push(b'A' + (n % 26) as u8);
            n /= 26;
        }
        letters.iter().rev().map(|&b| b as char).collect()
    }

    /// Convert column letters to index (A = 0, Z = 25, AA = 26, etc.)
    ///
    /// Returns `None` for empty input, non-letters, or columns past XFD.
    pub fn letters_to_column(letters: &str) -> Option<u32> {
        if letters.is_empty() || letters.len() > 3 {
            return None;
        }
        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return None;
            }
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        }
        let col = col - 1;
        (col < MAX_COLS).then_some(col)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::column_to_letters(self.col), self.row + 1)
    }
}

impl FromStr for CellRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_coordinate(s: &str) -> std::result::Result<CellRef, String> {
    if s.is_empty() {
        return Err("empty cell coordinate".to_string());
    }

    let body = s.strip_prefix('$').unwrap_or(s);
    let split = body
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(body.len());
    let (letters, rest) = body.split_at(split);
    let digits = rest.strip_prefix('$').unwrap_or(rest);

    if letters.is_empty() {
        return Err(format!("no column letters in '{}'", s));
    }
    let col = CellRef::letters_to_column(letters)
        .ok_or_else(|| format!("column '{}' is beyond XFD", letters))?;

    if digits.is_empty() {
        return Err(format!("no row number in '{}'", s));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{}' is not a cell coordinate", s));
    }
    let row: u32 = digits
        .parse()
        .map_err(|_| format!("row number in '{}' is out of range", s))?;
    if row == 0 {
        return Err(format!("row number must be >= 1 in '{}'", s));
    }
    if row > MAX_ROWS {
        return Err(format!("row {} is beyond the last row {}", row, MAX_ROWS));
    }

    Ok(CellRef::new(row - 1, col))
}

/// An inclusive rectangular range such as "A1:U182".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// Top-left corner
    pub start: CellRef,
    /// Bottom-right corner
    pub end: CellRef,
}

impl CellRange {
    /// Build a range from any two opposite corners.
    pub fn new(a: CellRef, b: CellRef) -> Self {
        Self {
            start: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Parse a range expression.
    ///
    /// A lone coordinate is a one-cell range; corners given in reverse order
    /// are normalized.
    ///
    /// ```
    /// use sheetrange::CellRange;
    ///
    /// let range = CellRange::parse("B2:A1").unwrap();
    /// assert_eq!(range.to_string(), "A1:B2");
    /// assert_eq!(range.cell_count(), 4);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidRange("empty range expression".to_string()));
        }
        if s.contains('!') {
            return Err(Error::InvalidRange(format!(
                "'{}' names a sheet; pass the sheet separately",
                s
            )));
        }

        let mut parts = s.split(':');
        let first = parts.next().unwrap_or_default();
        let second = parts.next();
        if parts.next().is_some() {
            return Err(Error::InvalidRange(format!("'{}' has more than two corners", s)));
        }

        let start = CellRef::parse(first)?;
        let end = match second {
            Some(corner) => CellRef::parse(corner)?,
            None => start,
        };
        Ok(Self::new(start, end))
    }

    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn col_count(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    pub fn cell_count(&self) -> u64 {
        u64::from(self.row_count()) * u64::from(self.col_count())
    }

    /// Rows top-to-bottom, each yielding its coordinates left-to-right.
    pub fn rows(&self) -> impl Iterator<Item = impl Iterator<Item = CellRef>> {
        let (start, end) = (self.start, self.end);
        (start.row..=end.row)
            .map(move |row| (start.col..=end.col).map(move |col| CellRef::new(row, col)))
    }

    /// All coordinates in traversal order.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> {
        self.rows().flatten()
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
