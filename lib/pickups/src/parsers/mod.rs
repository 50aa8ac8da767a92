mod csv_dir;
pub use csv_dir::{CsvDirFmt, write_csv_dir};

pub(crate) mod common;

pub trait ParseInstance<Fmt>: Sized {
  fn parse(inputs: Fmt) -> crate::Result<Self>;
}
