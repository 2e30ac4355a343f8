use super::LogStore;
use super::schema::{Dialect, LogRow, LogTable, Statement, select_all_sql};
use crate::error::{DatabaseError, Error, Result};
use crate::sink::util::ensure_parent_dir;
use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::{Connection, params_from_iter};
use std::path::Path;
use std::time::Duration;

/// 两条连接同时写同一个文件时，等待锁释放的上限
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite 后端：与 PostgreSQL 后端相同的双连接布局
#[derive(Debug)]
pub struct SqliteStore {
    primary: Connection,
    schema: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let connect_failed = |reason: String| {
            Error::Database(DatabaseError::ConnectFailed {
                backend: "SQLite".to_string(),
                target: path.display().to_string(),
                reason,
            })
        };

        ensure_parent_dir(path).map_err(|e| connect_failed(e.to_string()))?;

        let open = || -> rusqlite::Result<Connection> {
            let conn = Connection::open(path)?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            Ok(conn)
        };

        debug!("Opening SQLite database: {}", path.display());
        let primary = open().map_err(|e| connect_failed(e.to_string()))?;
        info!("Connected to database");
        let schema = open().map_err(|e| connect_failed(e.to_string()))?;

        Ok(Self { primary, schema })
    }
}

fn write_failed(table: LogTable, e: &rusqlite::Error) -> Error {
    Error::Database(DatabaseError::WriteFailed {
        table_name: table.name().to_string(),
        reason: e.to_string(),
    })
}

fn execute_on(conn: &Connection, statement: &Statement<'_>) -> Result<()> {
    conn.execute(&statement.sql, params_from_iter(statement.params.iter()))
        .map(|_| ())
        .map_err(|e| write_failed(statement.table, &e))
}

impl LogStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "SQLite"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute_schema_batch(&mut self, statements: &[String]) -> Result<()> {
        let schema_failed = |e: rusqlite::Error| {
            Error::Database(DatabaseError::SchemaFailed {
                reason: e.to_string(),
            })
        };

        // Transaction 在未 commit 时 drop 即回滚
        let tx = self.schema.transaction().map_err(schema_failed)?;
        for sql in statements {
            tx.execute_batch(sql).map_err(schema_failed)?;
            debug!("Table statement executed");
        }
        tx.commit().map_err(schema_failed)
    }

    fn execute_in_transaction(&mut self, statements: &[&Statement<'_>]) -> Result<()> {
        let first_table = statements.first().map_or(LogTable::Dump, |s| s.table);
        let tx = self
            .primary
            .transaction()
            .map_err(|e| write_failed(first_table, &e))?;
        for statement in statements {
            execute_on(&tx, statement)?;
        }
        tx.commit().map_err(|e| write_failed(first_table, &e))
    }

    fn execute(&mut self, statement: &Statement<'_>) -> Result<()> {
        execute_on(&self.primary, statement)
    }

    fn fetch_rows(&mut self, table: LogTable) -> Result<Vec<LogRow>> {
        let query_failed = |reason: String| {
            Error::Database(DatabaseError::QueryFailed {
                table_name: table.name().to_string(),
                reason,
            })
        };

        let mut stmt = self
            .primary
            .prepare(&select_all_sql(table))
            .map_err(|e| query_failed(e.to_string()))?;

        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| query_failed(e.to_string()))?;

        raw.into_iter()
            .map(|(id, level, message, ts)| {
                let timestamp = DateTime::parse_from_rfc3339(&ts)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| query_failed(format!("row {id} has bad timestamp '{ts}': {e}")))?;
                LogRow::from_parts(table, id, level, message, timestamp)
            })
            .collect()
    }

    fn existing_tables(&mut self) -> Result<Vec<String>> {
        let query_failed = |e: rusqlite::Error| {
            Error::Database(DatabaseError::QueryFailed {
                table_name: "sqlite_master".to_string(),
                reason: e.to_string(),
            })
        };

        let mut stmt = self
            .primary
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")
            .map_err(query_failed)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(query_failed)?;
        Ok(names)
    }

    fn is_connected(&self) -> bool {
        true
    }
}
