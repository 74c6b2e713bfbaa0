use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    /// Key values such as a year or week; never summed.
    Int(i64),
    Number(f64),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Cell {
        Cell::Text(s.into())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) | Self::Int(_) => None,
        }
    }

    /// Display form; numbers use one decimal like the rendered reports.
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Number(n) => crate::fmt::hours(*n),
        }
    }
}

/// Rectangular report table. The optional trailing total row is synthetic
/// and flagged so chart extraction can drop it without guessing by label.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SummaryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub has_total_row: bool,
}

impl SummaryTable {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> SummaryTable {
        SummaryTable {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            has_total_row: false,
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Rows excluding a synthetic total row.
    pub fn data_rows(&self) -> &[Vec<Cell>] {
        if self.has_total_row && !self.rows.is_empty() {
            &self.rows[..self.rows.len() - 1]
        } else {
            &self.rows
        }
    }

    pub fn total_row(&self) -> Option<&[Cell]> {
        if self.has_total_row {
            self.rows.last().map(|r| r.as_slice())
        } else {
            None
        }
    }

    /// Numeric values of a column over the data rows (text cells read as 0).
    pub fn numbers(&self, column: usize) -> Vec<f64> {
        self.data_rows()
            .iter()
            .map(|r| r.get(column).and_then(Cell::as_f64).unwrap_or(0.0))
            .collect()
    }

    /// Display strings of a column over the data rows.
    pub fn labels(&self, column: usize) -> Vec<String> {
        self.data_rows()
            .iter()
            .map(|r| r.get(column).map(Cell::display).unwrap_or_default())
            .collect()
    }

    /// Append a row labelled `Total` in the first column that sums every
    /// numeric column of the existing rows.
    pub fn append_total_row(&mut self) {
        if self.has_total_row || self.columns.is_empty() {
            return;
        }
        let mut total = vec![Cell::text("Total")];
        for col in 1..self.columns.len() {
            let numeric = self
                .rows
                .iter()
                .any(|r| matches!(r.get(col), Some(Cell::Number(_))));
            if numeric {
                total.push(Cell::Number(self.numbers(col).iter().sum()));
            } else {
                total.push(Cell::text(""));
            }
        }
        self.rows.push(total);
        self.has_total_row = true;
    }
}
