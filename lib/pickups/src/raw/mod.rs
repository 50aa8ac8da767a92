pub mod rides;

use std::borrow::Cow;

pub trait FromRaw<T> where Self: Sized {
  fn from_raw(raw: T, id: Cow<str>) -> Self;
}


/// One sheet of a workbook: a header row followed by data rows.  Cells are kept as text;
/// interpretation happens in [`crate::schema`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
  pub headers: Vec<String>,
  pub rows: Vec<Vec<String>>,
}

impl Sheet {
  pub fn new<S: Into<String>>(headers: impl IntoIterator<Item=S>) -> Self {
    Sheet {
      headers: headers.into_iter().map(Into::into).collect(),
      rows: Vec::new(),
    }
  }

  pub fn push_row<S: Into<String>>(&mut self, row: impl IntoIterator<Item=S>) {
    self.rows.push(row.into_iter().map(Into::into).collect());
  }

  /// Builder-style [`Sheet::push_row`].
  pub fn with_row<S: Into<String>>(mut self, row: impl IntoIterator<Item=S>) -> Self {
    self.push_row(row);
    self
  }

  /// Index of the first header equal to `name` (surrounding whitespace ignored).
  pub fn column(&self, name: &str) -> Option<usize> {
    self.headers.iter().position(|h| h.trim() == name)
  }

  /// Cell text, or `None` if the row is short or the cell is blank.
  pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
    self.rows.get(row)
      .and_then(|r| r.get(col))
      .map(|c| c.trim())
      .filter(|c| !c.is_empty())
  }

  #[inline]
  pub fn len(&self) -> usize { self.rows.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.rows.is_empty() }
}


/// An ordered collection of named sheets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
  sheets: Vec<(String, Sheet)>,
}

impl Workbook {
  pub fn new() -> Self { Self::default() }

  /// Add a sheet, replacing any existing sheet with the same name (keeping its position).
  pub fn insert(&mut self, name: impl Into<String>, sheet: Sheet) {
    let name = name.into();
    match self.sheets.iter_mut().find(|(n, _)| *n == name) {
      Some(slot) => slot.1 = sheet,
      None => self.sheets.push((name, sheet)),
    }
  }

  pub fn with_sheet(mut self, name: impl Into<String>, sheet: Sheet) -> Self {
    self.insert(name, sheet);
    self
  }

  pub fn get(&self, name: &str) -> Option<&Sheet> {
    self.sheets.iter().find(|(n, _)| n == name).map(|(_, s)| s)
  }

  pub fn contains(&self, name: &str) -> bool { self.get(name).is_some() }

  pub fn sheet_names(&self) -> impl Iterator<Item=&str> + '_ {
    self.sheets.iter().map(|(n, _)| n.as_str())
  }

  pub fn iter(&self) -> impl Iterator<Item=(&str, &Sheet)> + '_ {
    self.sheets.iter().map(|(n, s)| (n.as_str(), s))
  }

  #[inline]
  pub fn len(&self) -> usize { self.sheets.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.sheets.is_empty() }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_cells_are_none() {
    let sheet = Sheet::new(vec!["a", " b "])
      .with_row(vec!["x", "  "])
      .with_row(vec!["y"]);
    assert_eq!(sheet.column("b"), Some(1));
    assert_eq!(sheet.cell(0, 0), Some("x"));
    assert_eq!(sheet.cell(0, 1), None);
    assert_eq!(sheet.cell(1, 1), None);
    assert_eq!(sheet.cell(7, 0), None);
  }

  #[test]
  fn insert_replaces_in_place() {
    let mut wb = Workbook::new()
      .with_sheet("one", Sheet::new(vec!["a"]))
      .with_sheet("two", Sheet::new(vec!["b"]));
    wb.insert("one", Sheet::new(vec!["c"]));
    assert_eq!(wb.sheet_names().collect::<Vec<_>>(), vec!["one", "two"]);
    assert_eq!(wb.get("one").unwrap().headers, vec!["c".to_string()]);
  }
}
