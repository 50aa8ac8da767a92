/// Outcome of reading a numeric cell.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Cell<T> {
  Missing,
  Value(T),
  Invalid,
}

fn is_nan_text(s: &str) -> bool {
  s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("n/a")
}

/// Non-negative whole number.  Spreadsheet exports frequently write integers as `4.0`, which is
/// accepted; `4.5` is not.
pub fn count_cell(s: Option<&str>) -> Cell<u32> {
  let s = match s {
    None => return Cell::Missing,
    Some(s) if is_nan_text(s) => return Cell::Missing,
    Some(s) => s,
  };
  if let Ok(v) = s.parse::<u32>() {
    return Cell::Value(v);
  }
  match s.parse::<f64>() {
    Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Cell::Value(v as u32),
    _ => Cell::Invalid,
  }
}

/// Non-negative finite time.  Blank and `NaN` cells are missing.
pub fn time_cell(s: Option<&str>) -> Cell<f64> {
  let s = match s {
    None => return Cell::Missing,
    Some(s) if is_nan_text(s) => return Cell::Missing,
    Some(s) => s,
  };
  match s.parse::<f64>() {
    Ok(v) if v.is_nan() => Cell::Missing,
    Ok(v) if v.is_finite() && v >= 0.0 => Cell::Value(v),
    _ => Cell::Invalid,
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn counts() {
    assert_eq!(count_cell(Some("4")), Cell::Value(4));
    assert_eq!(count_cell(Some("4.0")), Cell::Value(4));
    assert_eq!(count_cell(Some("4.5")), Cell::Invalid);
    assert_eq!(count_cell(Some("-1")), Cell::Invalid);
    assert_eq!(count_cell(Some("four")), Cell::Invalid);
    assert_eq!(count_cell(Some("NaN")), Cell::Missing);
    assert_eq!(count_cell(None), Cell::Missing);
  }

  #[test]
  fn times() {
    assert_eq!(time_cell(Some("12.5")), Cell::Value(12.5));
    assert_eq!(time_cell(Some("0")), Cell::Value(0.0));
    assert_eq!(time_cell(Some("nan")), Cell::Missing);
    assert_eq!(time_cell(None), Cell::Missing);
    assert_eq!(time_cell(Some("-3")), Cell::Invalid);
    assert_eq!(time_cell(Some("inf")), Cell::Invalid);
    assert_eq!(time_cell(Some("far")), Cell::Invalid);
  }
}
