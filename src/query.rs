use crate::error::Result;
use crate::structs::{RecordSet, Value};
use rusqlite::Connection;
use rusqlite::types::ValueRef;

/// Runs a literal SQL statement and collects the full result set.
///
/// Queries are fixed strings from the run configuration, never user input,
/// so nothing is parameterised.
pub fn run_query(conn: &Connection, sql: &str) -> Result<RecordSet> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let width = columns.len();

    let mut records = RecordSet::new(&columns);
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(match row.get_ref(i)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(n) => Value::Number(n as f64),
                ValueRef::Real(n) => Value::Number(n),
                ValueRef::Text(t) | ValueRef::Blob(t) => {
                    Value::Text(String::from_utf8_lossy(t).into_owned())
                }
            });
        }
        records.push(values)?;
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE Countries_by_GDP (Country TEXT, GDP_USD_billions REAL);
             INSERT INTO Countries_by_GDP VALUES ('United States', 26854.6);
             INSERT INTO Countries_by_GDP VALUES ('Tuvalu', 0.06);
             INSERT INTO Countries_by_GDP VALUES ('Kenya', 100.0);
             INSERT INTO Countries_by_GDP VALUES ('Nepal', 99.99);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn threshold_query_returns_only_matching_rows() {
        let result = run_query(
            &seeded(),
            "SELECT * FROM Countries_by_GDP WHERE GDP_USD_billions >= 100",
        )
        .unwrap();
        assert_eq!(result.columns(), ["Country", "GDP_USD_billions"]);
        assert_eq!(result.len(), 2);
        assert!(
            result
                .column("GDP_USD_billions")
                .unwrap()
                .all(|v| v.as_f64().is_some_and(|n| n >= 100.0))
        );
    }

    #[test]
    fn aggregate_and_limit_queries() {
        let conn = seeded();
        let avg = run_query(&conn, "SELECT AVG(GDP_USD_billions) FROM Countries_by_GDP").unwrap();
        assert_eq!(avg.columns(), ["AVG(GDP_USD_billions)"]);
        assert_eq!(avg.len(), 1);

        let names = run_query(&conn, "SELECT Country from Countries_by_GDP LIMIT 3").unwrap();
        assert_eq!(names.len(), 3);
        assert_eq!(names.value(0, "Country").unwrap().as_str(), Some("United States"));
    }

    #[test]
    fn nulls_and_integers_map_to_values() {
        let conn = Connection::open_in_memory().unwrap();
        let result = run_query(&conn, "SELECT NULL AS a, 7 AS b").unwrap();
        assert_eq!(result.rows()[0].values, vec![Value::Null, Value::Number(7.0)]);
    }

    #[test]
    fn invalid_sql_is_a_store_error() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(matches!(
            run_query(&conn, "SELECT * FROM missing_table"),
            Err(crate::error::PipelineError::Store(_))
        ));
    }
}
