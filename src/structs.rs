use crate::error::{PipelineError, Result};
use log::{Level, Log, Metadata, Record as LogRecord};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, path::Path};

/// Console logger: echoes this crate's records, plus anything at `Info` or above from dependencies.
pub struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
            || metadata.target().starts_with("lib")
            || metadata.target().starts_with("table_etl")
    }

    fn log(&self, record: &LogRecord) {
        if self.enabled(record.metadata()) {
            println!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// A single cell value. `Null` only comes back from SQL queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    Null,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            // Debug keeps the trailing ".0" on whole numbers
            Value::Number(n) => write!(f, "{:?}", n),
            Value::Null => f.write_str("None"),
        }
    }
}

/// One table row, values in the owning set's column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub values: Vec<Value>,
}

/// Ordered rows sharing one ordered column list.
///
/// Rows keep source order. Columns can be appended or renamed; the row count
/// never changes once extraction is done.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl RecordSet {
    pub fn new(columns: &[String]) -> Self {
        Self {
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PipelineError::Parse(format!("Column not found: {}", name)))
    }

    /// Appends a row. The value count must match the column count.
    pub fn push(&mut self, values: Vec<Value>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(PipelineError::Parse(format!(
                "row has {} values, expected {} ({})",
                values.len(),
                self.columns.len(),
                self.columns.join(", ")
            )));
        }
        self.rows.push(Record { values });
        Ok(())
    }

    pub fn value(&self, row: usize, column: &str) -> Result<&Value> {
        let idx = self.column_index(column)?;
        self.rows
            .get(row)
            .map(|r| &r.values[idx])
            .ok_or_else(|| PipelineError::Parse(format!("Row out of range: {}", row)))
    }

    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |r| &r.values[idx]))
    }

    /// Appends a new column; `values` must hold one entry per row.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<()> {
        let name = name.into();
        if values.len() != self.rows.len() {
            return Err(PipelineError::Parse(format!(
                "column {} has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.values.push(value);
        }
        self.columns.push(name);
        Ok(())
    }

    /// Rewrites every value of one column in place.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> Result<()>
    where
        F: FnMut(&Value) -> Result<Value>,
    {
        let idx = self.column_index(name)?;
        for row in &mut self.rows {
            row.values[idx] = f(&row.values[idx])?;
        }
        Ok(())
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        let idx = self.column_index(from)?;
        self.columns[idx] = to.to_string();
        Ok(())
    }
}

impl fmt::Display for RecordSet {
    /// Right-aligned text table with a leading row index.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.values.iter().map(|v| v.to_string()).collect())
            .collect();
        let index_width = self.rows.len().saturating_sub(1).to_string().len();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(c.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:>index_width$}", "")?;
        for (c, &w) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>w$}", c)?;
        }
        for (i, row) in cells.iter().enumerate() {
            write!(f, "\n{:>index_width$}", i)?;
            for (v, &w) in row.iter().zip(&widths) {
                write!(f, "  {:>w$}", v)?;
            }
        }
        if self.rows.is_empty() {
            write!(f, "\n[0 rows x {} columns]", self.columns.len())?;
        }
        Ok(())
    }
}

/// One line of the exchange-rate side file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRow {
    #[serde(rename = "Currency")]
    pub currency: String,
    #[serde(rename = "Rate")]
    pub rate: f64,
}

/// Currency code to USD multiplier.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    /// Reads a `Currency,Rate` CSV file.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;
        let mut rates = HashMap::new();
        for row in reader.deserialize() {
            let row: RateRow = row?;
            rates.insert(row.currency, row.rate);
        }
        Ok(Self { rates })
    }

    pub fn rate(&self, code: &str) -> Result<f64> {
        self.rates
            .get(code)
            .copied()
            .ok_or_else(|| PipelineError::MissingRate(code.to_string()))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn banks() -> RecordSet {
        let mut rs = RecordSet::new(&["Name".to_string(), "MC_USD_Billion".to_string()]);
        rs.push(vec![Value::Text("Bank A".into()), Value::Number(100.0)])
            .unwrap();
        rs.push(vec![Value::Text("Bank B".into()), Value::Number(42.5)])
            .unwrap();
        rs
    }

    #[test]
    fn push_rejects_wrong_arity() {
        let mut rs = banks();
        assert!(rs.push(vec![Value::Text("Bank C".into())]).is_err());
        assert_eq!(rs.len(), 2);
    }

    #[test]
    fn add_and_rename_columns_keep_row_order() {
        let mut rs = banks();
        rs.add_column("Rank", vec![Value::Number(1.0), Value::Number(2.0)])
            .unwrap();
        rs.rename_column("MC_USD_Billion", "Cap").unwrap();
        assert_eq!(rs.columns(), ["Name", "Cap", "Rank"]);
        assert_eq!(rs.value(1, "Name").unwrap().as_str(), Some("Bank B"));
        assert_eq!(rs.value(1, "Rank").unwrap().as_f64(), Some(2.0));
        assert!(rs.add_column("Short", vec![Value::Null]).is_err());
    }

    #[test]
    fn display_renders_index_and_headers() {
        let text = banks().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("MC_USD_Billion"));
        assert!(lines[1].starts_with('0'));
        assert!(lines[1].ends_with("100.0"));
        assert!(lines[2].contains("Bank B"));
    }

    #[test]
    fn rate_table_loads_csv_and_reports_missing_codes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Currency,Rate\nEUR,0.93\nGBP, 0.8\nINR,82.95").unwrap();
        let rates = RateTable::load(file.path()).unwrap();
        assert_eq!(rates.len(), 3);
        assert_eq!(rates.rate("GBP").unwrap(), 0.8);
        assert!(matches!(
            rates.rate("JPY"),
            Err(PipelineError::MissingRate(code)) if code == "JPY"
        ));
    }
}
