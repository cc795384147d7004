//! Single-row table shared by the input record and the encoder

use serde::Serialize;

/// One cell of a row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Numeric view of the cell; text cells have none
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            Cell::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Named, ordered columns holding a single observation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataRow {
    columns: Vec<String>,
    values: Vec<Cell>,
}

impl DataRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column at the end of the row
    pub fn push(&mut self, column: impl Into<String>, value: Cell) {
        self.columns.push(column.into());
        self.values.push(value);
    }

    /// Builder form of `push`
    pub fn with(mut self, column: impl Into<String>, value: Cell) -> Self {
        self.push(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.position(column).map(|i| &self.values[i])
    }

    /// Overwrite a column in place, keeping its position
    pub fn set(&mut self, column: &str, value: Cell) -> bool {
        match self.position(column) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    /// Drop a column, returning its value
    pub fn remove(&mut self, column: &str) -> Option<Cell> {
        let i = self.position(column)?;
        self.columns.remove(i);
        Some(self.values.remove(i))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_position_and_remove_shifts() {
        let mut row = DataRow::new()
            .with("a", Cell::Int(1))
            .with("b", Cell::Text("x".into()))
            .with("c", Cell::Float(2.5));

        assert!(row.set("b", Cell::Int(7)));
        assert!(!row.set("missing", Cell::Int(0)));
        assert_eq!(row.columns(), &["a", "b", "c"]);
        assert_eq!(row.get("b"), Some(&Cell::Int(7)));

        assert_eq!(row.remove("a"), Some(Cell::Int(1)));
        assert_eq!(row.columns(), &["b", "c"]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("c").and_then(Cell::as_f64), Some(2.5));
    }
}
