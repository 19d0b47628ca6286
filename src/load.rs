use crate::error::Result;
use crate::structs::{RecordSet, Value};
use csv::Writer;
use log::debug;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, ToSql};
use std::{fs::File, path::Path};

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Number(n) => ToSqlOutput::Borrowed(ValueRef::Real(*n)),
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
        })
    }
}

/// Writes the record set as CSV: a header row, then one line per record.
///
/// # Arguments
/// * `records` - Final record set
/// * `output_path` - Destination file, truncated if it exists
///
/// # Errors
/// Returns error if the file cannot be created or written to.
pub fn write_csv(records: &RecordSet, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(records.columns())?;
    for record in records.rows() {
        writer.write_record(record.values.iter().map(|v| v.to_string()))?;
    }

    writer.flush()?;
    debug!("Wrote {} rows to {}", records.len(), output_path.display());
    Ok(())
}

/// Writes the record set as a pretty JSON array of objects keyed by column name.
///
/// # Errors
/// Returns error if the file cannot be created or serialization fails.
pub fn write_json(records: &RecordSet, output_path: &Path) -> Result<()> {
    let rows: Vec<serde_json::Map<String, serde_json::Value>> = records
        .rows()
        .iter()
        .map(|record| {
            records
                .columns()
                .iter()
                .cloned()
                .zip(record.values.iter().map(serde_json::to_value))
                .map(|(column, value)| value.map(|v| (column, v)))
                .collect::<std::result::Result<serde_json::Map<_, _>, _>>()
        })
        .collect::<std::result::Result<_, serde_json::Error>>()?;

    let file = File::create(output_path)?;
    serde_json::to_writer_pretty(file, &rows)?;
    Ok(())
}

/// SQLite column type for a column: `REAL` when every value is numeric.
fn column_type(records: &RecordSet, index: usize) -> &'static str {
    let numeric = records
        .rows()
        .iter()
        .all(|r| matches!(r.values[index], Value::Number(_)));
    if numeric && !records.is_empty() {
        "REAL"
    } else {
        "TEXT"
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Replaces `table` wholesale with the record set's contents.
///
/// Drop, create and inserts run in one transaction, so loading the same set
/// twice still leaves exactly one copy of each row. Returns the inserted row count.
///
/// # Errors
/// Returns `PipelineError::Store` on any SQLite failure.
pub fn load_to_db(conn: &mut Connection, records: &RecordSet, table: &str) -> Result<usize> {
    let table_ident = quote_ident(table);
    let definitions: Vec<String> = records
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} {}", quote_ident(c), column_type(records, i)))
        .collect();
    let placeholders: Vec<String> = (1..=records.columns().len())
        .map(|i| format!("?{}", i))
        .collect();

    let tx = conn.transaction()?;
    tx.execute(&format!("DROP TABLE IF EXISTS {}", table_ident), [])?;
    tx.execute(
        &format!("CREATE TABLE {} ({})", table_ident, definitions.join(", ")),
        [],
    )?;

    let mut inserted = 0;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} VALUES ({})",
            table_ident,
            placeholders.join(", ")
        ))?;
        for record in records.rows() {
            inserted += stmt.execute(rusqlite::params_from_iter(record.values.iter()))?;
        }
    }
    tx.commit()?;

    debug!("Loaded {} rows into {}", inserted, table);
    Ok(inserted)
}
