use std::fmt::Display;
use std::str::FromStr;
use std::path::PathBuf;
use std::io;
use anyhow::Result;
use structopt::StructOpt;

use ridepool::config::OUTPUT_WORKBOOK;

#[derive(Clone, Debug, StructOpt)]
pub struct OutputOptions {
  #[structopt(long="format", short="f", parse(try_from_str), default_value="text", possible_values=&OUTPUT_FORMAT_STRINGS)]
  pub fmt: OutputFormat,
  /// Directory the result workbook is written to.
  #[structopt(long="output", short="o", default_value=OUTPUT_WORKBOOK)]
  pub dir: PathBuf,
  /// Also write newline-delimited JSON logs to this file.
  #[structopt(long)]
  pub log: Option<PathBuf>,
}

pub fn clap_range_validator<T>(minval: Option<T>, maxval: Option<T>) -> impl Fn(String) -> Result<(), String>
    where
        T: FromStr + PartialOrd + Display + Copy,
        T::Err: Display
{
    return move |val| {
        let x: T = val.parse().map_err(|e: T::Err| e.to_string())?;
        if let Some(y) = minval {
            if x < y { return Err(format!("must be at least {}", y)); }
        }
        if let Some(y) = maxval {
            if x > y { return Err(format!("must be at most {}", y)); }
        }
        return Ok(());
    };
}

pub const OUTPUT_FORMAT_STRINGS: [&str; 2] = ["text", "json"];

#[derive(Debug, Copy, Clone)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("invalid string: {}", s))
        };
    }
}


impl Default for OutputFormat {
  fn default() -> Self { OutputFormat::Text }
}


pub trait AssignmentReport {
    fn write_text(&self, buf : impl io::Write) -> Result<()>;
    fn write_json(&self, buf : impl io::Write) -> Result<()>;

    fn write(&self, buf : impl io::Write, output : OutputFormat) -> Result<()> {
        match output {
            OutputFormat::Text => self.write_text(buf)?,
            OutputFormat::Json => self.write_json(buf)?,
        };
        Ok(())
    }
}

pub fn output_report(options: &OutputOptions, report: &impl AssignmentReport) -> Result<()> {
  let stdout = io::stdout();
  report.write(stdout.lock(), options.fmt)?;
  Ok(())
}
