//! Turn raw variable values into per-driver records.  Everything here is a pure function of the
//! instance, the pair list and the values, so extracting twice gives the same records.
use std::fmt;
use itertools::Itertools;
use tracing::*;

use crate::data::*;
use crate::model::{Pair, SolvedValues};
use crate::solve::Solved;

#[derive(Debug, Clone, PartialEq)]
pub struct DriverSummary {
    pub vehicle: Vehicle,
    pub driver: String,
    pub used: bool,
    /// Visited locations, in location order.
    pub stops: Vec<String>,
    pub students_picked_total: Demand,
    pub estimated_travel_time: Time,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRecord {
    pub vehicle: Vehicle,
    pub driver: String,
    pub location: String,
    pub students_picked: Demand,
    pub stop_flag: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UberRecord {
    pub location: String,
    pub students_to_uber: Demand,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub drivers: Vec<DriverSummary>,
    pub assignments: Vec<AssignmentRecord>,
    pub uber: Vec<UberRecord>,
}

impl Extraction {
    pub fn drivers_used(&self) -> usize {
        self.drivers.iter().filter(|d| d.used).count()
    }

    pub fn students_to_uber(&self) -> Demand {
        self.uber.iter().map(|u| u.students_to_uber).sum()
    }

    pub fn total_travel_time(&self) -> Time {
        self.drivers.iter().fold(0.0, |acc, d| acc + d.estimated_travel_time)
    }
}

#[inline]
fn count(v: f64) -> Demand {
    v.round().max(0.0) as Demand
}

#[inline]
fn flag(v: f64) -> bool {
    v.round() >= 1.0
}

#[instrument(level="debug", skip_all, fields(id=%data.id))]
pub fn extract(data: &PickupInstance, pairs: &[Pair], values: &SolvedValues) -> Extraction {
    let mut drivers = Vec::with_capacity(data.drivers.len());
    let mut assignments = Vec::new();

    for (j, driver) in data.drivers.iter().enumerate() {
        let stops = data.locs()
            .filter(|&i| flag(values.visit[j][i]))
            .map(|i| data.locations[i].clone())
            .collect_vec();

        let mut students_picked_total = 0;
        for i in data.locs() {
            let picked = count(values.pickup[j][i]);
            if picked > 0 {
                students_picked_total += picked;
                assignments.push(AssignmentRecord {
                    vehicle: j,
                    driver: driver.name.clone(),
                    location: data.locations[i].clone(),
                    students_picked: picked,
                    stop_flag: flag(values.visit[j][i]),
                });
            }
        }

        let estimated_travel_time = pairs.iter()
            .zip(&values.pair[j])
            .filter(|(_, w)| flag(**w))
            .fold(0.0, |acc, (p, _)| acc + p.travel_time);

        drivers.push(DriverSummary {
            vehicle: j,
            driver: driver.name.clone(),
            used: flag(values.used[j]),
            stops,
            students_picked_total,
            estimated_travel_time,
        });
    }

    let uber = data.locs()
        .filter_map(|i| {
            let n = count(values.uber[i]);
            if n > 0 { Some(UberRecord { location: data.locations[i].clone(), students_to_uber: n }) } else { None }
        })
        .collect_vec();

    let extraction = Extraction { drivers, assignments, uber };
    debug!(drivers_used=extraction.drivers_used(), uber=extraction.students_to_uber(), travel=extraction.total_travel_time(), "extracted");
    extraction
}

#[inline]
pub fn extract_solved(data: &PickupInstance, solved: &Solved) -> Extraction {
    extract(data, &solved.pairs, &solved.values)
}

/// A record set that breaks one of the model's invariants.  Only best-effort values from a solve
/// that did not reach optimality should ever produce these.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    Coverage { location: String, covered: Demand, demand: Demand },
    Capacity { driver: String, load: Demand, capacity: Demand },
    TooManyStops { driver: String, stops: usize },
    PickupWithoutStop { driver: String, location: String },
    Usage { driver: String, used: bool, stops: usize },
    Travel { driver: String, expected: Time, reported: Time },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Coverage { location, covered, demand } =>
                write!(f, "location {} has {} students covered but demand {}", location, covered, demand),
            Violation::Capacity { driver, load, capacity } =>
                write!(f, "driver {} picks up {} students with capacity {}", driver, load, capacity),
            Violation::TooManyStops { driver, stops } =>
                write!(f, "driver {} makes {} stops", driver, stops),
            Violation::PickupWithoutStop { driver, location } =>
                write!(f, "driver {} picks up at {} without stopping there", driver, location),
            Violation::Usage { driver, used, stops } =>
                write!(f, "driver {} has used={} with {} stops", driver, used, stops),
            Violation::Travel { driver, expected, reported } =>
                write!(f, "driver {} reports travel {} but its stops imply {}", driver, reported, expected),
        }
    }
}

/// Check the extracted records against coverage, capacity, stop-count, usage and pair travel.
pub fn verify(data: &PickupInstance, extraction: &Extraction) -> Vec<Violation> {
    let mut violations = Vec::new();

    let mut covered = vec![0; data.locations.len()];
    for u in &extraction.uber {
        if let Some(i) = data.location_index(&u.location) {
            covered[i] += u.students_to_uber;
        }
    }
    let mut load = vec![0; data.drivers.len()];
    for a in &extraction.assignments {
        if let Some(i) = data.location_index(&a.location) {
            covered[i] += a.students_picked;
        }
        load[a.vehicle] += a.students_picked;
        if !a.stop_flag {
            violations.push(Violation::PickupWithoutStop { driver: a.driver.clone(), location: a.location.clone() });
        }
    }

    for i in data.locs() {
        if covered[i] != data.demand[i] {
            violations.push(Violation::Coverage { location: data.locations[i].clone(), covered: covered[i], demand: data.demand[i] });
        }
    }

    for d in &extraction.drivers {
        let capacity = data.drivers[d.vehicle].capacity;
        if load[d.vehicle] > capacity {
            violations.push(Violation::Capacity { driver: d.driver.clone(), load: load[d.vehicle], capacity });
        } else if !d.used && load[d.vehicle] > 0 {
            // an unused driver has no seats
            violations.push(Violation::Capacity { driver: d.driver.clone(), load: load[d.vehicle], capacity: 0 });
        }
        if d.stops.len() > crate::config::MAX_STOPS {
            violations.push(Violation::TooManyStops { driver: d.driver.clone(), stops: d.stops.len() });
        }
        if d.used == d.stops.is_empty() {
            violations.push(Violation::Usage { driver: d.driver.clone(), used: d.used, stops: d.stops.len() });
        }

        let locs = d.stops.iter().filter_map(|s| data.location_index(s)).collect_vec();
        let expected = match locs.as_slice() {
            &[i, k] if !data.is_isolated(i) && !data.is_isolated(k) => {
                let (i, k) = if i < k { (i, k) } else { (k, i) };
                data.travel_time(i, k).unwrap_or(0.0)
            }
            _ => 0.0,
        };
        if (expected - d.estimated_travel_time).abs() > 1e-6 {
            violations.push(Violation::Travel { driver: d.driver.clone(), expected, reported: d.estimated_travel_time });
        }
    }

    violations
}
