use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Days, NaiveDate};
use itertools::Itertools;

use crate::{
    error::Error,
    table::{Cell, MemoryTable},
};

/// Marker every summary file name carries.
pub const FILE_PREFIX: &str = "MCSUMM";

/// List the files in `dir` whose name contains `prefix`, sorted by name so
/// repeated runs see the same order.
pub fn discover(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().contains(prefix) {
            files.push(entry.path());
        }
    }
    Ok(files.into_iter().sorted().collect())
}

/// Load sheet `index` of a workbook (xlsx, xls, xlsb or ods). The workbook
/// is closed again before this returns.
pub fn open_data_sheet(path: &Path, index: usize) -> Result<MemoryTable, Error> {
    let mut workbook = open_workbook_auto(path).map_err(|e| Error::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(index)
        .ok_or(Error::MissingSheet(index))?
        .map_err(|e| Error::Workbook(e.to_string()))?;

    // calamine ranges begin at the first used cell; pad back to A1.
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; col_offset];
        cells.extend(row.iter().map(to_cell));
        rows.push(cells);
    }
    Ok(MemoryTable::new(rows))
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            serial_to_date(serial)
                .map(Cell::Date)
                .unwrap_or(Cell::Number(serial))
        }
        Data::DateTimeIso(s) => NaiveDate::parse_from_str(s.get(..10).unwrap_or(s.as_str()), "%Y-%m-%d")
            .map(Cell::Date)
            .unwrap_or_else(|_| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// Excel serial day number (1900 date system) to a calendar date.
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}
