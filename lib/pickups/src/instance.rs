use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ops::Range;
use itertools::Itertools;
use tracing::*;

use crate::{Map, Result};
use crate::parsers::{ParseInstance, CsvDirFmt};
use crate::raw::{FromRaw, Workbook};
use crate::raw::rides::RideTables;
use crate::schema::SheetNames;

pub type Time = f64;
pub type Loc = usize;
pub type Vehicle = usize;
pub type Demand = u32;

/// Stand-in travel time for a lookup that cannot be resolved.  Only produced at the boundary by
/// [`PickupInstance::travel_time_or_unreachable`]; resolved times live in
/// [`PickupInstance::travel_time`] and absence is the real representation.
pub const UNREACHABLE_TIME: Time = 1_000_000.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Driver {
  pub name: String,
  pub capacity: Demand,
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct PickupInstance {
  pub id: String,
  /// Locations with at least one student, sorted by name.
  pub locations: Vec<String>,
  /// Number of students at each location, indexed by [`Loc`].
  pub demand: Vec<Demand>,
  /// One entry per driver row; repeated names are distinct drivers.
  pub drivers: Vec<Driver>,
  /// Resolved travel times between distinct locations.  Lookup `(i, j)` uses row `i`, column `j`
  /// of the matrix, falling back to row `j`, column `i`.
  pub travel_time: Map<(Loc, Loc), Time>,
  /// Locations missing from the matrix row or column labels.  These are never paired.
  pub isolated: Vec<Loc>,
}

impl FromRaw<RideTables> for PickupInstance {
  fn from_raw(raw: RideTables, id: Cow<str>) -> PickupInstance {
    let span = debug_span!("normalize", id=%id);
    let _g = span.enter();

    let counts = raw.students.iter()
      .fold(BTreeMap::<&str, Demand>::new(), |mut acc, s| {
        *acc.entry(s.location.as_str()).or_insert(0) += 1;
        acc
      });
    let locations: Vec<String> = counts.keys().map(|l| l.to_string()).collect();
    let demand: Vec<Demand> = counts.values().copied().collect();

    let matrix = &raw.travel;
    let isolated: Vec<Loc> = locations.iter()
      .enumerate()
      .filter(|(_, l)| !matrix.has_row(l) || !matrix.has_col(l))
      .map(|(i, _)| i)
      .collect();
    if !isolated.is_empty() {
      let names = isolated.iter().map(|&i| locations[i].as_str()).collect_vec();
      warn!(?names, "locations missing from the travel-time sheet are isolated (no pairing allowed)");
    }

    let mut travel_time = Map::default();
    for ((i, li), (j, lj)) in locations.iter().enumerate().tuple_combinations() {
      if let Some(t) = matrix.get(li, lj).or_else(|| matrix.get(lj, li)) {
        travel_time.insert((i, j), t);
      }
      if let Some(t) = matrix.get(lj, li).or_else(|| matrix.get(li, lj)) {
        travel_time.insert((j, i), t);
      }
    }

    let drivers = raw.drivers.into_iter()
      .map(|d| Driver { name: d.driver_name, capacity: d.capacity })
      .collect_vec();

    debug!(locations=locations.len(), drivers=drivers.len(), resolved=travel_time.len(), "normalized");

    PickupInstance {
      id: id.into_owned(),
      locations,
      demand,
      drivers,
      travel_time,
      isolated,
    }
  }
}

impl PickupInstance {
  /// Read, validate and normalize a CSV workbook directory.  Returns the raw workbook too, since
  /// the result workbook echoes the inputs.
  pub fn load(dir: impl AsRef<std::path::Path>, names: &SheetNames) -> Result<(PickupInstance, Workbook)> {
    let dir = dir.as_ref();
    let workbook = Workbook::parse(CsvDirFmt(dir))?;
    let tables = RideTables::from_workbook(&workbook, names)?;
    let id = dir.file_name().map(|s| s.to_string_lossy()).unwrap_or(Cow::Borrowed("workbook"));
    Ok((PickupInstance::from_raw(tables, id), workbook))
  }

  #[inline]
  pub fn locs(&self) -> Range<Loc> { 0..self.locations.len() }

  #[inline]
  pub fn vehicles(&self) -> Range<Vehicle> { 0..self.drivers.len() }

  pub fn location_index(&self, name: &str) -> Option<Loc> {
    self.locations.binary_search_by(|l| l.as_str().cmp(name)).ok()
  }

  #[inline]
  pub fn travel_time(&self, i: Loc, j: Loc) -> Option<Time> {
    self.travel_time.get(&(i, j)).copied()
  }

  #[inline]
  pub fn travel_time_or_unreachable(&self, i: Loc, j: Loc) -> Time {
    self.travel_time(i, j).unwrap_or(UNREACHABLE_TIME)
  }

  #[inline]
  pub fn is_isolated(&self, i: Loc) -> bool {
    self.isolated.binary_search(&i).is_ok()
  }

  /// Widened, since single counts may already use the whole `Demand` range.
  pub fn total_demand(&self) -> u64 { self.demand.iter().map(|&d| d as u64).sum() }

  pub fn total_capacity(&self) -> u64 { self.drivers.iter().map(|d| d.capacity as u64).sum() }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::raw::rides::*;

  fn tables(students: &[&str], drivers: &[(&str, u32)], rows: &[&str], cols: &[&str], cells: Vec<Vec<Option<f64>>>) -> RideTables {
    RideTables {
      students: students.iter()
        .enumerate()
        .map(|(k, l)| StudentRow { student_name: Some(format!("s{}", k)), location: l.to_string() })
        .collect(),
      drivers: drivers.iter()
        .map(|&(n, c)| DriverRow { driver_name: n.to_string(), capacity: c })
        .collect(),
      travel: TravelMatrix::new(
        rows.iter().map(|s| s.to_string()).collect(),
        cols.iter().map(|s| s.to_string()).collect(),
        cells,
      ),
    }
  }

  #[test]
  fn aggregates_demand_by_location() {
    let raw = tables(&["b", "a", "b", "c", "b"], &[("d", 2)], &[], &[], vec![]);
    let data = PickupInstance::from_raw(raw, "t".into());
    assert_eq!(data.locations, vec!["a", "b", "c"]);
    assert_eq!(data.demand, vec![1, 3, 1]);
    assert_eq!(data.total_demand(), 5);
    assert_eq!(data.location_index("c"), Some(2));
    assert_eq!(data.location_index("z"), None);
  }

  #[test]
  fn duplicate_drivers_are_kept() {
    let raw = tables(&["a"], &[("d", 2), ("d", 3)], &[], &[], vec![]);
    let data = PickupInstance::from_raw(raw, "t".into());
    assert_eq!(data.drivers.len(), 2);
    assert_eq!(data.total_capacity(), 5);
  }

  #[test]
  fn large_capacities_do_not_overflow() {
    let raw = tables(&["a"], &[("d1", 3_000_000_000), ("d2", 3_000_000_000)], &[], &[], vec![]);
    let data = PickupInstance::from_raw(raw, "t".into());
    assert_eq!(data.total_capacity(), 6_000_000_000);
    assert_eq!(data.total_demand(), 1);
  }

  #[test]
  fn reverse_lookup_fills_missing_direction() {
    let raw = tables(
      &["a", "b", "c"], &[],
      &["a", "b", "c"], &["a", "b", "c"],
      vec![
        vec![Some(0.0), None, Some(4.0)],
        vec![Some(6.0), Some(0.0), None],
        vec![Some(5.0), None, Some(0.0)],
      ],
    );
    let data = PickupInstance::from_raw(raw, "t".into());
    assert_eq!(data.travel_time(0, 1), Some(6.0));
    assert_eq!(data.travel_time(1, 0), Some(6.0));
    assert_eq!(data.travel_time(0, 2), Some(4.0));
    assert_eq!(data.travel_time(2, 0), Some(5.0));
    assert_eq!(data.travel_time(1, 2), None);
    assert_eq!(data.travel_time_or_unreachable(1, 2), UNREACHABLE_TIME);
    assert!(data.isolated.is_empty());
  }

  #[test]
  fn isolated_locations() {
    let raw = tables(
      &["a", "b", "x", "y"], &[],
      &["a", "b", "y"], &["a", "b"],
      vec![
        vec![None, Some(3.0)],
        vec![Some(3.0), None],
        vec![Some(1.0), Some(2.0)],
      ],
    );
    let data = PickupInstance::from_raw(raw, "t".into());
    // x is on neither axis, y is only a row label
    assert_eq!(data.isolated, vec![2, 3]);
    assert!(data.is_isolated(2) && data.is_isolated(3) && !data.is_isolated(0));
    assert_eq!(data.travel_time(0, 1), Some(3.0));
    assert_eq!(data.travel_time(0, 2), None);
  }
}
