use std::path::Path;
use anyhow::{Context, Result};
use tracing::*;

pub use pickups::{
  PickupInstance,
  Driver,
  Loc,
  Vehicle,
  Demand,
  Time,
  SheetNames,
  Sheet,
  Workbook,
};

/// Load and normalize the workbook directory at `dir`.  Schema problems are fatal and carry the
/// offending sheet or column in the error.
#[instrument(level="info", skip(names))]
pub fn load_instance(dir: &Path, names: &SheetNames) -> Result<(PickupInstance, Workbook)> {
  let (data, workbook) = PickupInstance::load(dir, names)
    .with_context(|| format!("failed to load workbook {:?}", dir))?;
  info!(
    locations=data.locations.len(),
    students=data.total_demand(),
    drivers=data.drivers.len(),
    seats=data.total_capacity(),
    isolated=data.isolated.len(),
    "instance loaded"
  );
  Ok((data, workbook))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fixtures;

  #[test]
  fn fail_load_missing_workbook() {
    assert!(load_instance(Path::new("non-existent"), &SheetNames::default()).is_err());
  }

  #[test]
  fn load_written_workbook() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let wb = fixtures::workbook(&[("a", 2), ("b", 1)], &[("d", 3)], &[("a", "b", 4.0)]);
    pickups::parsers::write_csv_dir(&wb, dir.path())?;
    let (data, echoed) = load_instance(dir.path(), &SheetNames::default())?;
    assert_eq!(data.demand, vec![2, 1]);
    assert_eq!(data.travel_time(1, 0), Some(4.0));
    assert_eq!(echoed.len(), 3);
    Ok(())
  }
}
