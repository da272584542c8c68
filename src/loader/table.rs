//! Untyped tables as read from a workbook sheet or CSV file.

use crate::error::LoadError;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Cell {
    /// Builds a cell from CSV text. Blank fields become `Empty`.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    /// Returns the cell as a non-empty string.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) if f.is_nan() => None,
            Cell::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some((*f as i64).to_string()),
            Cell::Float(f) => Some(f.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }

    /// Returns the cell as a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Cell::Int(i) => *i as f64,
            Cell::Float(f) => *f,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Empty | Cell::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Returns the cell as a whole number; `2019.0` and `"2019"` both qualify.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Cell::Int(i) => Some(*i),
            _ => {
                let value = self.as_f64()?;
                (value.fract() == 0.0 && value.abs() <= i64::MAX as f64).then(|| value as i64)
            }
        }
    }

    /// Returns the cell as a calendar year.
    pub fn as_year(&self) -> Option<i32> {
        self.as_integer().and_then(|v| i32::try_from(v).ok())
    }

    /// Returns the cell as a calendar year, truncating any fraction.
    pub fn as_year_lossy(&self) -> Option<i32> {
        match self {
            Cell::Int(i) => i32::try_from(*i).ok(),
            _ => {
                let value = self.as_f64()?.trunc();
                (value >= i32::MIN as f64 && value <= i32::MAX as f64).then(|| value as i32)
            }
        }
    }

    /// Returns the cell as a 0/1 participation flag.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Cell::Bool(b) => Some(*b),
            Cell::Text(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
            Cell::Text(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
            _ => match self.as_integer()? {
                0 => Some(false),
                1 => Some(true),
                _ => None,
            },
        }
    }
}

/// A named table with a header row.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Builds a table from its rows, taking the first row as the header.
    pub fn from_rows(name: &str, mut rows: Vec<Vec<Cell>>) -> Result<Self, LoadError> {
        if rows.is_empty() {
            return Err(LoadError::EmptyTable {
                table: name.to_string(),
            });
        }

        let headers = rows
            .remove(0)
            .iter()
            .map(|cell| cell.as_text().unwrap_or_default())
            .collect();

        Ok(Self {
            name: name.to_string(),
            headers,
            rows,
        })
    }

    /// Index of a required column. Header names are case-sensitive.
    pub fn column(&self, column: &'static str) -> Result<usize, LoadError> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| LoadError::MissingColumn {
                table: self.name.clone(),
                column,
            })
    }

    /// Iterates data rows with their sheet row number (header is row 1).
    pub fn records(&self) -> impl Iterator<Item = (usize, Record<'_>)> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, cells)| cells.iter().any(|c| *c != Cell::Empty))
            .map(|(i, cells)| (i + 2, Record { cells }))
    }
}

/// Borrowed view of one data row.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    cells: &'a [Cell],
}

impl<'a> Record<'a> {
    /// Cell at `index`; short rows read as empty.
    pub fn get(&self, index: usize) -> &'a Cell {
        const EMPTY: &Cell = &Cell::Empty;
        self.cells.get(index).unwrap_or(EMPTY)
    }
}
