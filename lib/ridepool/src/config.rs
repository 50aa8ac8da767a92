//! Compile-time defaults.  The binary exposes each of these as a flag.

pub use pickups::schema::{STUDENTS_SHEET, DRIVERS_SHEET, TRAVEL_SHEET};
pub use pickups::UNREACHABLE_TIME;

pub const INPUT_WORKBOOK: &str = "./rides";
pub const OUTPUT_WORKBOOK: &str = "ride_assignment_output";

/// Penalty per student sent to the ride service.
pub const BIG_UBER: f64 = 1e8;
/// Penalty per driver used.
pub const BIG_DRIVER: f64 = 1e5;
/// Penalty per unit of travel time between the two stops of a driver.
pub const SMALL_TRIP: f64 = 1e4;

pub const SOLVER_VERBOSE: bool = false;
/// Wall-clock budget for one solver call, in seconds.
pub const SOLVER_TIME_LIMIT: f64 = 300.0;

/// Each driver makes at most this many stops.
pub const MAX_STOPS: usize = 2;
