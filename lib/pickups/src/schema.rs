//! Sheet and column validation.  Column aliases are resolved here, so nothing past
//! [`RideTables::from_workbook`] needs to know the alternative spellings.
use tracing::*;

use crate::{Error, Result};
use crate::parsers::common::{count_cell, time_cell, Cell};
use crate::raw::{Sheet, Workbook};
use crate::raw::rides::*;

pub const STUDENTS_SHEET: &str = "students";
pub const DRIVERS_SHEET: &str = "drivers";
pub const TRAVEL_SHEET: &str = "campus_distance";

pub const STUDENT_NAME_COL: &str = "student_name";
pub const LOCATION_COL: &str = "location";
pub const DRIVER_NAME_COL: &str = "driver_name";
pub const CAPACITY_COL: &str = "capacity";

/// Accepted spellings of the driver capacity column, in order of preference.
pub const CAPACITY_ALIASES: [&str; 2] = [CAPACITY_COL, "num_students"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetNames {
  pub students: String,
  pub drivers: String,
  pub travel: String,
}

impl Default for SheetNames {
  fn default() -> Self {
    SheetNames {
      students: STUDENTS_SHEET.to_string(),
      drivers: DRIVERS_SHEET.to_string(),
      travel: TRAVEL_SHEET.to_string(),
    }
  }
}

impl SheetNames {
  fn required(&self) -> [&str; 3] {
    [&self.students, &self.drivers, &self.travel]
  }
}

/// First column whose header matches one of `aliases`, trying aliases in order.
pub fn resolve_column(sheet: &Sheet, aliases: &[&str]) -> Option<usize> {
  aliases.iter().find_map(|a| sheet.column(a))
}

fn require_column(sheet: &Sheet, sheet_name: &str, aliases: &[&str]) -> Result<usize> {
  resolve_column(sheet, aliases).ok_or_else(|| Error::MissingColumn {
    sheet: sheet_name.to_string(),
    column: aliases.join("' or '"),
  }.into())
}

fn invalid_cell(sheet: &Sheet, sheet_name: &str, row: usize, col: usize) -> anyhow::Error {
  Error::InvalidCell {
    sheet: sheet_name.to_string(),
    row: row + 1,
    column: sheet.headers.get(col).cloned().unwrap_or_default(),
    value: sheet.rows[row].get(col).cloned().unwrap_or_default(),
  }.into()
}

#[instrument(level="debug", skip(sheet))]
fn students(sheet: &Sheet, sheet_name: &str) -> Result<Vec<StudentRow>> {
  let loc_col = require_column(sheet, sheet_name, &[LOCATION_COL])?;
  let name_col = sheet.column(STUDENT_NAME_COL);
  let mut rows = Vec::with_capacity(sheet.len());
  for r in 0..sheet.len() {
    let student_name = name_col.and_then(|c| sheet.cell(r, c)).map(str::to_string);
    match sheet.cell(r, loc_col) {
      Some(location) => rows.push(StudentRow { student_name, location: location.to_string() }),
      None => warn!(row=r+1, student=?student_name, "student has no location and is ignored"),
    }
  }
  Ok(rows)
}

#[instrument(level="debug", skip(sheet))]
fn drivers(sheet: &Sheet, sheet_name: &str) -> Result<Vec<DriverRow>> {
  let cap_col = require_column(sheet, sheet_name, &CAPACITY_ALIASES)?;
  // Without an explicit name column the first column holds the names.
  let name_col = sheet.column(DRIVER_NAME_COL).unwrap_or(0);
  let mut rows = Vec::with_capacity(sheet.len());
  for r in 0..sheet.len() {
    let capacity = match count_cell(sheet.cell(r, cap_col)) {
      Cell::Value(c) => c,
      Cell::Missing | Cell::Invalid => return Err(invalid_cell(sheet, sheet_name, r, cap_col)),
    };
    let driver_name = sheet.cell(r, name_col).unwrap_or_default().to_string();
    rows.push(DriverRow { driver_name, capacity });
  }
  Ok(rows)
}

/// The first column holds row labels; the remaining headers are column labels.
#[instrument(level="debug", skip(sheet))]
fn travel(sheet: &Sheet, sheet_name: &str) -> Result<TravelMatrix> {
  let col_labels: Vec<String> = sheet.headers.iter().skip(1).map(|h| h.trim().to_string()).collect();
  let mut row_labels = Vec::with_capacity(sheet.len());
  let mut cells = Vec::with_capacity(sheet.len());
  for r in 0..sheet.len() {
    let label = match sheet.cell(r, 0) {
      Some(l) => l.to_string(),
      None => {
        trace!(row=r+1, "unlabelled travel row skipped");
        continue;
      }
    };
    let mut row = Vec::with_capacity(col_labels.len());
    for c in 1..=col_labels.len() {
      match time_cell(sheet.cell(r, c)) {
        Cell::Value(t) => row.push(Some(t)),
        Cell::Missing => row.push(None),
        Cell::Invalid => return Err(invalid_cell(sheet, sheet_name, r, c)),
      }
    }
    row_labels.push(label);
    cells.push(row);
  }
  Ok(TravelMatrix::new(row_labels, col_labels, cells))
}

impl RideTables {
  /// Validate the workbook against the expected sheets and columns and read the typed rows.
  pub fn from_workbook(workbook: &Workbook, names: &SheetNames) -> Result<RideTables> {
    let missing = || Error::MissingSheets(names.required().iter().map(|n| n.to_string()).collect());
    if names.required().iter().any(|n| !workbook.contains(n)) {
      return Err(missing().into());
    }
    let sheet = |name: &str| workbook.get(name).ok_or_else(missing);
    let students = students(sheet(&names.students)?, &names.students)?;
    let drivers = drivers(sheet(&names.drivers)?, &names.drivers)?;
    let travel = travel(sheet(&names.travel)?, &names.travel)?;
    debug!(students=students.len(), drivers=drivers.len(), travel_rows=travel.row_labels.len(), "workbook validated");
    Ok(RideTables { students, drivers, travel })
  }
}
