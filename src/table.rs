use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde::Deserialize;

use crate::error::Error;

/// Format used whenever a calendar date is shown as text.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// A single value read from a tabular source.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Empty cells and whitespace-only text both count as blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) | Cell::Date(_) => false,
        }
    }

    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => format!("{}", n),
            Cell::Date(d) => d.format(DATE_FORMAT).to_string(),
        }
    }

    /// Integer value of the cell, truncating any fractional part.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            Cell::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|n| n.is_finite()).map(|n| n.trunc() as i64))
            }
            _ => None,
        }
    }

    /// Currency value of the cell. Text may carry a `$` sign and thousands separators.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Cell::Number(n) => Decimal::from_f64(*n),
            Cell::Text(s) => {
                let cleaned: String = s.trim().chars().filter(|c| *c != '$' && *c != ',').collect();
                Decimal::from_str(&cleaned).ok()
            }
            _ => None,
        }
    }
}

/// Read-only access to one logical sheet of rows and columns.
pub trait Table {
    fn height(&self) -> usize;

    /// Cells outside the populated area read as [`Cell::Empty`].
    fn cell(&self, row: usize, col: usize) -> &Cell;
}

/// A fully materialized sheet.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemoryTable {
    rows: Vec<Vec<Cell>>,
}

impl MemoryTable {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Build a sheet from CSV text. Every non-empty field is kept as text,
    /// so long card numbers survive untouched.
    pub fn from_csv<R>(rdr: csv::Reader<R>) -> Result<Self, Error>
    where
        R: std::io::Read,
    {
        let mut rows = Vec::new();
        for record in rdr.into_records() {
            let record = record.map_err(|e| Error::Workbook(e.to_string()))?;
            rows.push(
                record
                    .iter()
                    .map(|field| {
                        if field.is_empty() {
                            Cell::Empty
                        } else {
                            Cell::Text(field.to_string())
                        }
                    })
                    .collect(),
            );
        }
        Ok(Self { rows })
    }
}

impl Table for MemoryTable {
    fn height(&self) -> usize {
        self.rows.len()
    }

    fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

/// Column positions of the fields a summary sheet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Columns {
    pub customer_name: usize,
    pub card_number: usize,
    pub trans_date: usize,
    pub trans_time: usize,
    pub cleared_date: usize,
    pub merchant: usize,
    pub amount: usize,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            customer_name: 2,
            card_number: 3,
            trans_date: 4,
            trans_time: 5,
            cleared_date: 6,
            merchant: 7,
            amount: 21,
        }
    }
}

/// Where everything lives in an input workbook. Resolved once and handed to
/// the scanner, so nothing downstream deals in raw offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    /// Zero-based index of the sheet holding the transactions.
    pub data_sheet: usize,
    /// `(row, col)` of the cell ending in the statement date.
    pub period_cell: (usize, usize),
    pub first_data_row: usize,
    pub columns: Columns,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            data_sheet: 1,
            period_cell: (1, 2),
            first_data_row: 3,
            columns: Columns::default(),
        }
    }
}
