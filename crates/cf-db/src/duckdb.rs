//! DuckDB warehouse backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::Warehouse;
use async_trait::async_trait;
use cf_core::frame::{Column, Frame, Value};
use duckdb::Connection;
use std::path::Path;
use std::sync::Mutex;

/// Rows per INSERT statement when uploading a frame.
const INSERT_BATCH: usize = 500;

/// DuckDB warehouse backend
pub struct DuckDbWarehouse {
    conn: Mutex<Connection>,
}

impl DuckDbWarehouse {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn upload_sync(&self, table: &str, frame: &Frame, overwrite: bool) -> DbResult<usize> {
        let conn = self.lock()?;
        let quoted = quote_ident(table);

        if overwrite {
            conn.execute(&format!("DROP TABLE IF EXISTS {}", quoted), [])
                .map_err(DbError::from)?;
        }

        let column_defs: Vec<String> = frame
            .columns()
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), sql_type_for(c)))
            .collect();
        conn.execute(
            &format!("CREATE TABLE {} ({})", quoted, column_defs.join(", ")),
            [],
        )
        .map_err(DbError::from)?;

        let n = frame.n_rows();
        let mut start = 0;
        while start < n {
            let end = (start + INSERT_BATCH).min(n);
            let mut tuples = Vec::with_capacity(end - start);
            for i in start..end {
                let literals: Vec<String> =
                    frame.row(i).into_iter().map(sql_literal).collect();
                tuples.push(format!("({})", literals.join(", ")));
            }
            conn.execute(
                &format!("INSERT INTO {} VALUES {}", quoted, tuples.join(", ")),
                [],
            )
            .map_err(DbError::from)?;
            start = end;
        }

        log::info!("uploaded {} rows to warehouse table {}", n, table);
        Ok(n)
    }

    fn query_sync(&self, sql: &str) -> DbResult<Frame> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql).map_err(DbError::from)?;

        // DuckDB panics on column metadata before execution, so collect all
        // rows via query_map first, then read column names.
        let raw_rows: Vec<Vec<Value>> = stmt
            .query_map([], |row| {
                let col_count = row.as_ref().column_count();
                Ok((0..col_count).map(|i| get_column_value(row, i)).collect())
            })
            .map_err(DbError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::from)?;

        let column_count = stmt.column_count();
        let names: Vec<String> = (0..column_count)
            .map(|i| {
                stmt.column_name(i)
                    .map_or_else(|_| format!("col_{}", i), |v| v.to_string())
            })
            .collect();

        let name_refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let mut frame = Frame::with_columns(&name_refs);
        for row in raw_rows {
            frame
                .push_row(row)
                .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        }
        Ok(frame)
    }

    fn relation_exists_sync(&self, table: &str) -> DbResult<bool> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
                [table],
                |row| row.get(0),
            )
            .map_err(DbError::from)?;
        Ok(count > 0)
    }
}

#[async_trait]
impl Warehouse for DuckDbWarehouse {
    async fn upload(&self, table: &str, frame: &Frame, overwrite: bool) -> DbResult<usize> {
        self.upload_sync(table, frame, overwrite)
    }

    async fn query(&self, sql: &str) -> DbResult<Frame> {
        self.query_sync(sql)
    }

    async fn relation_exists(&self, table: &str) -> DbResult<bool> {
        self.relation_exists_sync(table)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

/// Read a column value, trying multiple DuckDB types.
///
/// DuckDB integer columns return `None` for `Option<String>`, so we try
/// String -> i64 -> f64 -> bool, and fall back to null.
fn get_column_value(row: &duckdb::Row<'_>, idx: usize) -> Value {
    if let Ok(Some(s)) = row.get::<_, Option<String>>(idx) {
        return Value::Str(s);
    }
    if let Ok(Some(n)) = row.get::<_, Option<i64>>(idx) {
        return Value::Int(n);
    }
    if let Ok(Some(f)) = row.get::<_, Option<f64>>(idx) {
        return Value::Float(f);
    }
    if let Ok(Some(b)) = row.get::<_, Option<bool>>(idx) {
        return Value::Int(i64::from(b));
    }
    Value::Null
}

/// Pick a SQL column type for a frame column.
fn sql_type_for(column: &Column) -> &'static str {
    match column.type_label() {
        "integer" => "BIGINT",
        "float" => "DOUBLE",
        _ => "VARCHAR",
    }
}

/// Render a value as a SQL literal.
fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) if f.is_finite() => format!("{}", f),
        Value::Float(_) => "NULL".to_string(),
        Value::Str(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

/// Quote an identifier, escaping embedded quotes.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
