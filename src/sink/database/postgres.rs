use super::LogStore;
use super::descriptor::PgDescriptor;
use super::schema::{Dialect, LogRow, LogTable, Statement, select_all_sql};
use crate::error::{DatabaseError, Error, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};
use postgres::types::ToSql;
use postgres::{Client, Config, NoTls};

/// PostgreSQL 后端：主连接负责写入/读回，独立的 schema 连接负责建表事务
pub struct PgStore {
    target: String,
    primary: Client,
    schema: Client,
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore")
            .field("target", &self.target)
            .field("closed", &self.primary.is_closed())
            .finish_non_exhaustive()
    }
}

impl PgStore {
    /// 建立两条连接；任一失败即返回连接错误
    pub fn connect(descriptor: &PgDescriptor) -> Result<Self> {
        let target = format!(
            "{}@{}:{}/{}",
            descriptor.user, descriptor.host, descriptor.port, descriptor.database
        );

        let mut config = Config::new();
        config
            .user(&descriptor.user)
            .password(&descriptor.password)
            .host(&descriptor.host)
            .port(descriptor.port)
            .dbname(&descriptor.database);

        debug!("Connecting to PostgreSQL: {target}");
        let primary = config.connect(NoTls).map_err(|e| connect_failed(&target, &e))?;
        info!("Connected to database");

        let schema = config.connect(NoTls).map_err(|e| connect_failed(&target, &e))?;
        debug!("Schema connection established");

        Ok(Self {
            target,
            primary,
            schema,
        })
    }
}

fn connect_failed(target: &str, e: &postgres::Error) -> Error {
    Error::Database(DatabaseError::ConnectFailed {
        backend: "PostgreSQL".to_string(),
        target: target.to_string(),
        reason: e.to_string(),
    })
}

fn write_failed(table: LogTable, e: &postgres::Error) -> Error {
    Error::Database(DatabaseError::WriteFailed {
        table_name: table.name().to_string(),
        reason: e.to_string(),
    })
}

fn bind<'s>(statement: &'s Statement<'_>) -> Vec<&'s (dyn ToSql + Sync)> {
    statement
        .params
        .iter()
        .map(|p| p as &(dyn ToSql + Sync))
        .collect()
}

impl LogStore for PgStore {
    fn backend(&self) -> &'static str {
        "PostgreSQL"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn execute_schema_batch(&mut self, statements: &[String]) -> Result<()> {
        let mut tx = self.schema.transaction().map_err(|e| {
            Error::Database(DatabaseError::SchemaFailed {
                reason: format!("BEGIN failed: {e}"),
            })
        })?;

        for sql in statements {
            if let Err(e) = tx.batch_execute(sql) {
                // 整批回滚；回滚本身失败时连接会被服务端丢弃，同样没有半成品
                if let Err(rollback_err) = tx.rollback() {
                    debug!("ROLLBACK failed: {rollback_err}");
                }
                return Err(Error::Database(DatabaseError::SchemaFailed {
                    reason: e.to_string(),
                }));
            }
            debug!("Table statement executed");
        }

        tx.commit().map_err(|e| {
            Error::Database(DatabaseError::SchemaFailed {
                reason: format!("COMMIT failed: {e}"),
            })
        })
    }

    fn execute_in_transaction(&mut self, statements: &[&Statement<'_>]) -> Result<()> {
        let first_table = statements.first().map_or(LogTable::Dump, |s| s.table);
        let mut tx = self
            .primary
            .transaction()
            .map_err(|e| write_failed(first_table, &e))?;

        for statement in statements {
            tx.execute(statement.sql.as_str(), &bind(statement))
                .map_err(|e| write_failed(statement.table, &e))?;
        }

        tx.commit().map_err(|e| write_failed(first_table, &e))
    }

    fn execute(&mut self, statement: &Statement<'_>) -> Result<()> {
        self.primary
            .execute(statement.sql.as_str(), &bind(statement))
            .map(|_| ())
            .map_err(|e| write_failed(statement.table, &e))
    }

    fn fetch_rows(&mut self, table: LogTable) -> Result<Vec<LogRow>> {
        let query_failed = |e: postgres::Error| {
            Error::Database(DatabaseError::QueryFailed {
                table_name: table.name().to_string(),
                reason: e.to_string(),
            })
        };

        let rows = self
            .primary
            .query(select_all_sql(table).as_str(), &[])
            .map_err(query_failed)?;

        rows.iter()
            .map(|row| {
                let id: i32 = row.try_get(0).map_err(query_failed)?;
                let level: Option<String> = row.try_get(1).map_err(query_failed)?;
                let message: String = row.try_get(2).map_err(query_failed)?;
                let timestamp: DateTime<Utc> = row.try_get(3).map_err(query_failed)?;
                LogRow::from_parts(table, i64::from(id), level, message, timestamp)
            })
            .collect()
    }

    fn existing_tables(&mut self) -> Result<Vec<String>> {
        let query_failed = |e: postgres::Error| {
            Error::Database(DatabaseError::QueryFailed {
                table_name: "information_schema.tables".to_string(),
                reason: e.to_string(),
            })
        };

        let rows = self
            .primary
            .query(
                "SELECT table_name::text FROM information_schema.tables \
                 WHERE table_schema = current_schema()",
                &[],
            )
            .map_err(query_failed)?;

        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(query_failed))
            .collect()
    }

    fn is_connected(&self) -> bool {
        !self.primary.is_closed()
    }
}
