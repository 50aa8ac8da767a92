use std::io::Write;
use anyhow::Result;
use itertools::Itertools;
use json::JsonValue;

use pickups::schema::{resolve_column, CAPACITY_ALIASES, CAPACITY_COL};
use crate::data::*;
use crate::extract::*;
use crate::solve::{ObjectiveMode, SolveStatus};

pub const DRIVER_SUMMARY_SHEET: &str = "driver_summary";
pub const ASSIGNMENTS_SHEET: &str = "detailed_assignments";
pub const UBER_SHEET: &str = "uber_assignments";
pub const INPUT_STUDENTS_SHEET: &str = "input_students";
pub const INPUT_DRIVERS_SHEET: &str = "input_drivers";
pub const INPUT_TRAVEL_SHEET: &str = "input_distance";

pub const NO_RIDE_SERVICE_MSG: &str = "No ride-service needed: all students assigned to drivers.";

fn stop_list(d: &DriverSummary) -> String {
    d.stops.iter().join(", ")
}

pub fn write_text(mut buf: impl Write, extraction: &Extraction) -> Result<()> {
    writeln!(buf, "=== DRIVER SUMMARY ===")?;
    for d in &extraction.drivers {
        writeln!(buf, "{}: used={}, stops=[{}], students_picked={}, est_travel_time={:.1}",
                 d.driver, d.used as u8, stop_list(d), d.students_picked_total, d.estimated_travel_time)?;
    }

    writeln!(buf, "\n=== DETAILED ASSIGNMENTS (driver, location, students_picked) ===")?;
    for a in &extraction.assignments {
        writeln!(buf, "{}\t{}\t{}", a.driver, a.location, a.students_picked)?;
    }

    writeln!(buf, "\n=== RIDE-SERVICE ASSIGNMENTS (leftover students by location) ===")?;
    if extraction.uber.is_empty() {
        writeln!(buf, "{}", NO_RIDE_SERVICE_MSG)?;
    } else {
        for u in &extraction.uber {
            writeln!(buf, "{}: {}", u.location, u.students_to_uber)?;
        }
    }
    return Ok(())
}

pub fn to_json(status: SolveStatus, mode: ObjectiveMode, extraction: &Extraction) -> JsonValue {
    let drivers: Vec<JsonValue> = extraction.drivers.iter()
        .map(|d| json::object! {
            driver: d.driver.as_str(),
            used: d.used,
            stops: d.stops.clone(),
            students_picked_total: d.students_picked_total,
            estimated_travel_time: d.estimated_travel_time,
        })
        .collect();

    let assignments: Vec<JsonValue> = extraction.assignments.iter()
        .map(|a| json::object! {
            driver: a.driver.as_str(),
            location: a.location.as_str(),
            students_picked: a.students_picked,
            stop_flag: a.stop_flag,
        })
        .collect();

    let uber: Vec<JsonValue> = extraction.uber.iter()
        .map(|u| json::object! {
            location: u.location.as_str(),
            students_to_uber: u.students_to_uber,
        })
        .collect();

    let objective = match mode {
        ObjectiveMode::Weighted => "weighted",
        ObjectiveMode::Staged => "staged",
    };

    return json::object! {
        status: status.as_str(),
        objective: objective,
        drivers_used: extraction.drivers_used(),
        students_to_uber: extraction.students_to_uber(),
        total_travel_time: extraction.total_travel_time(),
        drivers: drivers,
        assignments: assignments,
        uber: uber,
    }
}

pub fn write_json(mut buf: impl Write, status: SolveStatus, mode: ObjectiveMode, extraction: &Extraction) -> Result<()> {
    to_json(status, mode, extraction).write_pretty(&mut buf, 2)?;
    writeln!(buf)?;
    return Ok(())
}

/// The drivers sheet as the model saw it: whichever capacity column was read is renamed to
/// `capacity`.
fn normalized_drivers(sheet: &Sheet) -> Sheet {
    let mut sheet = sheet.clone();
    if let Some(c) = resolve_column(&sheet, &CAPACITY_ALIASES) {
        sheet.headers[c] = CAPACITY_COL.to_string();
    }
    sheet
}

/// Result tables plus an echo of the three input sheets.  Tables are written with their headers
/// even when they have no rows.
pub fn result_workbook(extraction: &Extraction, inputs: &Workbook, names: &SheetNames) -> Workbook {
    let mut summary = Sheet::new(vec!["driver", "used", "stops", "students_picked_total", "estimated_travel_time"]);
    for d in &extraction.drivers {
        summary.push_row(vec![
            d.driver.clone(),
            (d.used as u8).to_string(),
            stop_list(d),
            d.students_picked_total.to_string(),
            d.estimated_travel_time.to_string(),
        ]);
    }

    let mut assignments = Sheet::new(vec!["driver", "location", "students_picked", "stop_flag"]);
    for a in &extraction.assignments {
        assignments.push_row(vec![
            a.driver.clone(),
            a.location.clone(),
            a.students_picked.to_string(),
            (a.stop_flag as u8).to_string(),
        ]);
    }

    let mut uber = Sheet::new(vec!["location", "students_to_uber"]);
    for u in &extraction.uber {
        uber.push_row(vec![u.location.clone(), u.students_to_uber.to_string()]);
    }

    let mut wb = Workbook::new()
        .with_sheet(DRIVER_SUMMARY_SHEET, summary)
        .with_sheet(ASSIGNMENTS_SHEET, assignments)
        .with_sheet(UBER_SHEET, uber);

    if let Some(s) = inputs.get(&names.students) {
        wb.insert(INPUT_STUDENTS_SHEET, s.clone());
    }
    if let Some(s) = inputs.get(&names.drivers) {
        wb.insert(INPUT_DRIVERS_SHEET, normalized_drivers(s));
    }
    if let Some(s) = inputs.get(&names.travel) {
        wb.insert(INPUT_TRAVEL_SHEET, s.clone());
    }
    wb
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::solve::{optimize, SolverOptions};
    use pickups::schema::DRIVERS_SHEET;

    fn text(x: &Extraction) -> String {
        let mut buf = Vec::new();
        write_text(&mut buf, x).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn solve(students: &[(&str, usize)], drivers: &[(&str, u32)], travel: &[(&str, &str, f64)]) -> (Extraction, Workbook) {
        let data = fixtures::instance(students, drivers, travel);
        let x = extract_solved(&data, &optimize(&data, &SolverOptions::default()));
        (x, fixtures::workbook(students, drivers, travel))
    }

    #[test]
    fn text_report_pair() {
        let (x, _) = solve(&[("A", 3), ("B", 2)], &[("d", 5)], &[("A", "B", 10.0)]);
        let out = text(&x);
        assert!(out.starts_with("=== DRIVER SUMMARY ===\nd: used=1, stops=[A, B], students_picked=5, est_travel_time=10.0\n"));
        assert!(out.contains("d\tA\t3\nd\tB\t2\n"));
        assert!(out.ends_with(&format!("===\n{}\n", NO_RIDE_SERVICE_MSG)));
    }

    #[test]
    fn text_report_ride_service() {
        let (x, _) = solve(&[("C", 4)], &[("d", 3)], &[]);
        let out = text(&x);
        assert!(out.contains("(leftover students by location) ===\nC: 1\n"));
        assert!(!out.contains(NO_RIDE_SERVICE_MSG));
    }

    #[test]
    fn json_report() {
        let (x, _) = solve(&[("C", 4)], &[("d", 3)], &[]);
        let j = to_json(SolveStatus::Optimal, ObjectiveMode::Weighted, &x);
        assert_eq!(j["status"], "Optimal");
        assert_eq!(j["objective"], "weighted");
        assert_eq!(j["students_to_uber"], 1);
        assert_eq!(j["drivers"][0]["students_picked_total"], 3);
        assert_eq!(j["uber"][0]["location"], "C");
        assert_eq!(j["assignments"].len(), 1);
    }

    #[test]
    fn workbook_sheets() {
        let (x, inputs) = solve(&[("C", 4)], &[("d", 4)], &[]);
        let wb = result_workbook(&x, &inputs, &SheetNames::default());
        assert_eq!(wb.sheet_names().collect_vec(), vec![
            DRIVER_SUMMARY_SHEET, ASSIGNMENTS_SHEET, UBER_SHEET,
            INPUT_STUDENTS_SHEET, INPUT_DRIVERS_SHEET, INPUT_TRAVEL_SHEET,
        ]);
        let uber = wb.get(UBER_SHEET).unwrap();
        assert_eq!(uber.headers, vec!["location", "students_to_uber"]);
        assert!(uber.is_empty());
        let summary = wb.get(DRIVER_SUMMARY_SHEET).unwrap();
        assert_eq!(summary.rows, vec![vec!["d", "1", "C", "4", "0"]]);
    }

    #[test]
    fn echoed_drivers_use_canonical_capacity() {
        let (x, mut inputs) = solve(&[("C", 1)], &[("d", 2)], &[]);
        inputs.insert(DRIVERS_SHEET, Sheet::new(vec!["name", "num_students"]).with_row(vec!["d", "2"]));
        let wb = result_workbook(&x, &inputs, &SheetNames::default());
        assert_eq!(wb.get(INPUT_DRIVERS_SHEET).unwrap().headers, vec!["name", CAPACITY_COL]);
    }
}
