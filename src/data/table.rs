use std::fs;
use std::path::Path;

/// Tabular result of a calculation node: a header row and one row of numbers
/// per frame (or per mesh node), plus soft warnings gathered during the run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub warnings: Vec<String>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<f64>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let j = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[j]).collect())
    }

    /// Renders the table, numbers with six decimals.
    pub fn to_csv(&self, separator: char) -> String {
        let sep = separator.to_string();
        let mut out = self.columns.join(&sep);
        out.push('\n');
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(|v| format!("{v:.6}")).collect();
            out.push_str(&line.join(&sep));
            out.push('\n');
        }
        out
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P, separator: char) -> std::io::Result<()> {
        fs::write(path, self.to_csv(separator))
    }
}
