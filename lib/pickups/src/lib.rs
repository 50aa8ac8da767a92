pub use anyhow::Result;

use std::fmt;
use fnv::FnvHashMap as Map;

/// Schema and cell validation failures.  These are fatal: nothing downstream runs on a workbook
/// that fails validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
  MissingSheets(Vec<String>),
  MissingColumn { sheet: String, column: String },
  InvalidCell { sheet: String, row: usize, column: String, value: String },
}


impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Error::MissingSheets(names) =>
        write!(f, "workbook must contain sheets named: {}", names.join(", ")),
      Error::MissingColumn { sheet, column } =>
        write!(f, "{} sheet must have a '{}' column", sheet, column),
      Error::InvalidCell { sheet, row, column, value } =>
        write!(f, "{} sheet, row {}, column '{}': invalid value {:?}", sheet, row, column, value),
    }
  }
}

impl std::error::Error for Error {}


pub mod instance;
pub mod parsers;
pub mod raw;
pub mod schema;

pub use instance::{PickupInstance, Driver, Loc, Vehicle, Demand, Time, UNREACHABLE_TIME};
pub use raw::{Sheet, Workbook, FromRaw};
pub use schema::SheetNames;
