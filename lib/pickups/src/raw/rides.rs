use crate::Map;

pub type Capacity = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRow {
  pub student_name: Option<String>,
  pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverRow {
  pub driver_name: String,
  pub capacity: Capacity,
}

/// Location x location travel-time matrix, keyed by label on both axes.  Missing cells are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TravelMatrix {
  pub row_labels: Vec<String>,
  pub col_labels: Vec<String>,
  pub cells: Vec<Vec<Option<f64>>>,
  row_index: Map<String, usize>,
  col_index: Map<String, usize>,
}

impl TravelMatrix {
  pub fn new(row_labels: Vec<String>, col_labels: Vec<String>, cells: Vec<Vec<Option<f64>>>) -> Self {
    debug_assert_eq!(row_labels.len(), cells.len());
    // first occurrence wins for duplicated labels
    let mut row_index = Map::default();
    for (k, l) in row_labels.iter().enumerate() {
      row_index.entry(l.clone()).or_insert(k);
    }
    let mut col_index = Map::default();
    for (k, l) in col_labels.iter().enumerate() {
      col_index.entry(l.clone()).or_insert(k);
    }
    TravelMatrix { row_labels, col_labels, cells, row_index, col_index }
  }

  #[inline]
  pub fn has_row(&self, label: &str) -> bool { self.row_index.contains_key(label) }

  #[inline]
  pub fn has_col(&self, label: &str) -> bool { self.col_index.contains_key(label) }

  /// The cell at (`from` row, `to` column), if both labels exist and the cell holds a number.
  pub fn get(&self, from: &str, to: &str) -> Option<f64> {
    let r = *self.row_index.get(from)?;
    let c = *self.col_index.get(to)?;
    self.cells.get(r)?.get(c).copied().flatten()
  }
}

/// Validated, typed contents of the three input sheets.
#[derive(Debug, Clone, PartialEq)]
pub struct RideTables {
  pub students: Vec<StudentRow>,
  pub drivers: Vec<DriverRow>,
  pub travel: TravelMatrix,
}
