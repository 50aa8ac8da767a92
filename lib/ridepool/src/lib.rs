use std::path::Path;

pub mod config;
pub mod data;
pub mod extract;
pub mod model;
pub mod report;
pub mod solve;


mod logging_setup {
    use super::*;
    use anyhow::Context;
    use tracing_subscriber::{EnvFilter, fmt, registry, prelude::*};
    use tracing_appender::{non_blocking, non_blocking::WorkerGuard};
    use std::fs::OpenOptions;

    fn build_and_set_global_subscriber<P>(logfile: Option<P>, is_test : bool) -> anyhow::Result<Option<WorkerGuard>> where
        P : AsRef<Path>
    {
        let stderr_log = fmt::layer().with_writer(std::io::stderr);
        let env_filter = EnvFilter::from_default_env();
        let r = registry().with(stderr_log).with(env_filter);

        let flush_guard = match logfile {
            Some(p) => {
                let p = p.as_ref();
                let logfile = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(p)
                    .with_context(|| format!("failed to open log file {:?}", p))?;
                let (writer, _guard) = non_blocking::NonBlockingBuilder::default()
                    .lossy(false)
                    .finish(logfile);
                let json = fmt::layer()
                    .json()
                    .with_span_list(true)
                    .with_current_span(false)
                    .with_writer(writer);

                let r = r.with(json);
                if is_test { r.try_init().ok(); }
                else { r.try_init().context("a global logger is already installed")?; }
                Some(_guard)
            },
            None => {
                if is_test { r.try_init().ok(); }
                else { r.try_init().context("a global logger is already installed")?; }
                None
            }
        };
        return Ok(flush_guard)
    }

    /// Install the global subscriber: stderr output filtered by `RUST_LOG`, plus newline-delimited
    /// JSON to `logfile` if given.  Keep the returned guard alive until exit so the file is flushed.
    pub fn init_logging(logfile: Option<impl AsRef<Path>>) -> anyhow::Result<Option<WorkerGuard>> {
        return build_and_set_global_subscriber(logfile, false);
    }

    #[allow(dead_code)]
    pub(crate) fn init_test_logging(logfile: Option<impl AsRef<Path>>) -> Option<WorkerGuard> {
        return build_and_set_global_subscriber(logfile, true).ok().flatten();
    }
}
pub use logging_setup::*;


#[cfg(test)]
pub(crate) mod fixtures {
    use pickups::{FromRaw, PickupInstance, Sheet, Workbook, SheetNames};
    use pickups::raw::rides::RideTables;
    use pickups::schema::*;

    /// Build an instance the way the binary does: workbook sheets -> validation -> normalization.
    /// `travel` lists `(from, to, minutes)` cells; every location named in `travel` becomes a row
    /// and column label of the matrix.
    pub fn instance(students: &[(&str, usize)], drivers: &[(&str, u32)], travel: &[(&str, &str, f64)]) -> PickupInstance {
        let wb = workbook(students, drivers, travel);
        let tables = RideTables::from_workbook(&wb, &SheetNames::default()).unwrap();
        PickupInstance::from_raw(tables, "fixture".into())
    }

    pub fn workbook(students: &[(&str, usize)], drivers: &[(&str, u32)], travel: &[(&str, &str, f64)]) -> Workbook {
        let mut s = Sheet::new(vec![STUDENT_NAME_COL, LOCATION_COL]);
        for &(loc, n) in students {
            for k in 0..n {
                s.push_row(vec![format!("{}-{}", loc, k), loc.to_string()]);
            }
        }

        let mut d = Sheet::new(vec![DRIVER_NAME_COL, CAPACITY_COL]);
        for &(name, cap) in drivers {
            d.push_row(vec![name.to_string(), cap.to_string()]);
        }

        let mut labels: Vec<&str> = travel.iter().flat_map(|&(a, b, _)| vec![a, b]).collect();
        labels.sort();
        labels.dedup();
        let mut headers = vec![String::new()];
        headers.extend(labels.iter().map(|l| l.to_string()));
        let mut t = Sheet::new(headers);
        for &row in &labels {
            let mut cells = vec![row.to_string()];
            for &col in &labels {
                let v = travel.iter()
                    .find(|&&(a, b, _)| a == row && b == col)
                    .map(|&(_, _, v)| v.to_string())
                    .unwrap_or_default();
                cells.push(v);
            }
            t.push_row(cells);
        }

        Workbook::new()
            .with_sheet(STUDENTS_SHEET, s)
            .with_sheet(DRIVERS_SHEET, d)
            .with_sheet(TRAVEL_SHEET, t)
    }
}
