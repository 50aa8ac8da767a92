use std::io::Write;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use tracing::*;

use ridepool::*;
use ridepool::config::*;
use ridepool::data::{load_instance, PickupInstance, SheetNames, Workbook};
use ridepool::extract::{extract_solved, verify, Extraction};
use ridepool::report;
use ridepool::solve::{optimize, ObjectiveMode, SolveStatus, SolverOptions, OBJECTIVE_MODE_STRINGS};
use pickups::parsers::write_csv_dir;

mod common;
use common::*;

use structopt::StructOpt;

/// Assign students to drivers, sending whoever does not fit to the ride service.
#[derive(Debug, StructOpt)]
struct ClArgs {
    /// Workbook directory holding one CSV file per sheet.
    #[structopt(default_value=INPUT_WORKBOOK, parse(from_os_str))]
    input: PathBuf,
    #[structopt(long, default_value=STUDENTS_SHEET)]
    students_sheet: String,
    #[structopt(long, default_value=DRIVERS_SHEET)]
    drivers_sheet: String,
    #[structopt(long, default_value=TRAVEL_SHEET)]
    travel_sheet: String,
    /// Seconds per solver call [default: 300]
    #[structopt(long, short="t", validator=clap_range_validator(Some(0.0f64), None))]
    time_limit: Option<f64>,
    /// Show the solver's own log.
    #[structopt(long, short="v")]
    verbose: bool,
    #[structopt(long, parse(try_from_str), default_value="weighted", possible_values=&OBJECTIVE_MODE_STRINGS)]
    objective: ObjectiveMode,
    #[structopt(flatten)]
    output: OutputOptions,
}

impl ClArgs {
    fn sheet_names(&self) -> SheetNames {
        SheetNames {
            students: self.students_sheet.clone(),
            drivers: self.drivers_sheet.clone(),
            travel: self.travel_sheet.clone(),
        }
    }

    fn solver_options(&self) -> SolverOptions {
        SolverOptions {
            time_limit: self.time_limit.unwrap_or(SOLVER_TIME_LIMIT),
            verbose: self.verbose || SOLVER_VERBOSE,
            mode: self.objective,
            ..SolverOptions::default()
        }
    }
}

struct Assignment {
    status: SolveStatus,
    mode: ObjectiveMode,
    extraction: Extraction,
}

impl AssignmentReport for Assignment {
    fn write_text(&self, mut buf: impl Write) -> Result<()> {
        writeln!(buf, "Solver status: {}\n", self.status)?;
        report::write_text(buf, &self.extraction)
    }

    fn write_json(&self, buf: impl Write) -> Result<()> {
        report::write_json(buf, self.status, self.mode, &self.extraction)
    }
}

#[instrument(level="info", skip_all)]
fn assign(data: &PickupInstance, options: &SolverOptions) -> Assignment {
    let solved = optimize(data, options);
    let extraction = extract_solved(data, &solved);
    for v in verify(data, &extraction) {
        warn!(violation=%v, "assignment breaks an invariant");
    }
    Assignment { status: solved.status, mode: options.mode, extraction }
}

fn write_workbook(assignment: &Assignment, inputs: &Workbook, names: &SheetNames, dir: &Path) -> Result<()> {
    let wb = report::result_workbook(&assignment.extraction, inputs, names);
    write_csv_dir(&wb, dir)
        .with_context(|| format!("failed to write result workbook {:?}", dir))?;
    info!(?dir, sheets=wb.len(), "result workbook written");
    Ok(())
}

fn main() -> Result<()> {
    let args: ClArgs = StructOpt::from_args();
    let _g = init_logging(args.output.log.clone())?;
    debug!(?args);

    let names = args.sheet_names();
    let (data, inputs) = load_instance(&args.input, &names)?;
    let assignment = assign(&data, &args.solver_options());

    output_report(&args.output, &assignment)?;
    write_workbook(&assignment, &inputs, &names, &args.output.dir)?;
    eprintln!("\nOutput saved to {}", args.output.dir.display());
    Ok(())
}
