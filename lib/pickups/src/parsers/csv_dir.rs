use std::fs;
use std::path::Path;
use anyhow::Context;
use tracing::*;

use crate::Result;
use crate::raw::{Sheet, Workbook};
use super::ParseInstance;

/// A workbook stored as a directory of CSV files, one `NAME.csv` per sheet.
#[derive(Debug, Copy, Clone)]
pub struct CsvDirFmt<P>(pub P);

fn read_sheet(path: &Path) -> Result<Sheet> {
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(true)
    .flexible(true)
    .from_path(path)?;

  let headers = reader.headers()?.iter().map(|h| h.trim_start_matches('\u{feff}').to_string()).collect::<Vec<_>>();
  let mut sheet = Sheet::new(headers);
  for record in reader.records() {
    sheet.push_row(record?.iter());
  }
  Ok(sheet)
}

impl<P: AsRef<Path>> ParseInstance<CsvDirFmt<P>> for Workbook {
  fn parse(input: CsvDirFmt<P>) -> Result<Workbook> {
    let dir = input.0.as_ref();
    let ctx = format!("try read workbook directory {:?}", dir);
    let dir = dir.canonicalize().context(ctx)?;

    let mut p = dir.to_string_lossy().into_owned();
    p.push_str("/*.csv");

    let mut paths = glob::glob(&p)?.collect::<std::result::Result<Vec<_>, _>>()?;
    paths.sort();

    let mut workbook = Workbook::new();
    for path in paths {
      let name = path.file_stem()
        .ok_or_else(|| anyhow::anyhow!("missing file stem: {:?}", path))?
        .to_string_lossy()
        .into_owned();
      let sheet = read_sheet(&path).context(format!("failed to load {:?}", path))?;
      debug!(sheet=%name, rows=sheet.len(), "read sheet");
      workbook.insert(name, sheet);
    }
    Ok(workbook)
  }
}

/// Write every sheet of `workbook` to `dir/NAME.csv`, creating `dir` if needed.
pub fn write_csv_dir(workbook: &Workbook, dir: impl AsRef<Path>) -> Result<()> {
  let dir = dir.as_ref();
  fs::create_dir_all(dir).context(format!("failed to create {:?}", dir))?;
  for (name, sheet) in workbook.iter() {
    let path = dir.join(format!("{}.csv", name));
    let mut writer = csv::WriterBuilder::new()
      .flexible(true)
      .from_path(&path)
      .context(format!("failed to create {:?}", path))?;
    writer.write_record(&sheet.headers)?;
    for row in &sheet.rows {
      writer.write_record(row)?;
    }
    writer.flush()?;
    debug!(sheet=%name, rows=sheet.len(), ?path, "wrote sheet");
  }
  Ok(())
}
