/// 数据库表结构与 SQL 生成
///
/// 表名只来自封闭的 `LogTable` 枚举，从不拼接调用方传入的字符串。
use crate::constants::DUMP_TABLE;
use crate::error::{ConfigError, DatabaseError, Error, Result};
use crate::severity::Severity;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// 日志表：dump 表或某个级别表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTable {
    Dump,
    Level(Severity),
}

impl LogTable {
    /// 全部五张表，级别表在前、dump 表在后（即建表顺序）
    pub const ALL: [LogTable; 5] = [
        LogTable::Level(Severity::Debug),
        LogTable::Level(Severity::Info),
        LogTable::Level(Severity::Warn),
        LogTable::Level(Severity::Error),
        LogTable::Dump,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            LogTable::Dump => DUMP_TABLE,
            LogTable::Level(severity) => severity.table_name(),
        }
    }

    pub const fn has_level_column(self) -> bool {
        matches!(self, LogTable::Dump)
    }
}

impl fmt::Display for LogTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogTable {
    type Err = Error;

    /// 接受 `mylogs` / `dump`，以及级别名或完整表名（`warn` / `warn_logs`）
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        if lower == DUMP_TABLE || lower == "dump" {
            return Ok(LogTable::Dump);
        }
        let level = lower.strip_suffix("_logs").unwrap_or(lower.as_str());
        level.parse::<Severity>().map(LogTable::Level).map_err(|_| {
            Error::Config(ConfigError::InvalidValue {
                field: "table".to_string(),
                value: s.to_string(),
                reason: format!(
                    "expected one of: {}",
                    LogTable::ALL.map(LogTable::name).join(", ")
                ),
            })
        })
    }
}

/// 读回的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub id: i64,
    /// 仅 dump 表有值
    pub level: Option<Severity>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LogRow {
    pub(crate) fn from_parts(
        table: LogTable,
        id: i64,
        level: Option<String>,
        message: String,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        let level = level
            .map(|l| {
                l.parse::<Severity>().map_err(|_| {
                    Error::Database(DatabaseError::QueryFailed {
                        table_name: table.name().to_string(),
                        reason: format!("row {id} has unknown level '{l}'"),
                    })
                })
            })
            .transpose()?;
        Ok(Self {
            id,
            level,
            message,
            timestamp,
        })
    }
}

/// SQL 方言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// 第 n 个参数占位符（从 1 开始）
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${n}"),
            Dialect::Sqlite => format!("?{n}"),
        }
    }

    fn id_column(self) -> &'static str {
        match self {
            Dialect::Postgres => "id SERIAL PRIMARY KEY",
            Dialect::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
        }
    }

    /// SQLite 不检查 VARCHAR 长度，用 CHECK 约束与 PostgreSQL 保持一致
    fn level_column(self) -> &'static str {
        match self {
            Dialect::Postgres => "level VARCHAR(10) NOT NULL",
            Dialect::Sqlite => "level VARCHAR(10) NOT NULL CHECK (length(level) <= 10)",
        }
    }

    fn message_column(self) -> &'static str {
        match self {
            Dialect::Postgres => "message VARCHAR(255) NOT NULL",
            Dialect::Sqlite => "message VARCHAR(255) NOT NULL CHECK (length(message) <= 255)",
        }
    }

    fn timestamp_column(self) -> &'static str {
        match self {
            Dialect::Postgres => "timestamp TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP",
            Dialect::Sqlite => {
                "timestamp TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))"
            }
        }
    }
}

/// 生成 CREATE TABLE SQL 语句（幂等）
pub fn create_table_sql(dialect: Dialect, table: LogTable) -> String {
    let level_column = if table.has_level_column() {
        format!("\n    {},", dialect.level_column())
    } else {
        String::new()
    };
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {},{}\n    {},\n    {}\n)",
        table.name(),
        dialect.id_column(),
        level_column,
        dialect.message_column(),
        dialect.timestamp_column()
    )
}

/// 五张表的建表语句，按 `LogTable::ALL` 顺序
pub fn create_all_sql(dialect: Dialect) -> Vec<String> {
    LogTable::ALL
        .iter()
        .map(|table| create_table_sql(dialect, *table))
        .collect()
}

/// 生成 INSERT SQL 语句；时间戳由数据库默认值填充
pub fn insert_sql(dialect: Dialect, table: LogTable) -> String {
    if table.has_level_column() {
        format!(
            "INSERT INTO {} (level, message) VALUES ({}, {})",
            table.name(),
            dialect.placeholder(1),
            dialect.placeholder(2)
        )
    } else {
        format!(
            "INSERT INTO {} (message) VALUES ({})",
            table.name(),
            dialect.placeholder(1)
        )
    }
}

/// 按主键升序读取整张表；级别表的 level 列以 NULL 补齐
pub fn select_all_sql(table: LogTable) -> String {
    let level = if table.has_level_column() {
        "level"
    } else {
        "CAST(NULL AS VARCHAR(10)) AS level"
    };
    format!(
        "SELECT id, {}, message, timestamp FROM {} ORDER BY id ASC",
        level,
        table.name()
    )
}

/// 一条待执行的参数化语句
#[derive(Debug, Clone)]
pub struct Statement<'a> {
    pub table: LogTable,
    pub sql: String,
    pub params: Vec<&'a str>,
}

impl<'a> Statement<'a> {
    /// dump 表插入：(level, message)
    pub fn dump_insert(dialect: Dialect, severity: Severity, message: &'a str) -> Self {
        Self {
            table: LogTable::Dump,
            sql: insert_sql(dialect, LogTable::Dump),
            params: vec![severity.as_str(), message],
        }
    }

    /// 级别表插入：(message)
    pub fn level_insert(dialect: Dialect, severity: Severity, message: &'a str) -> Self {
        let table = LogTable::Level(severity);
        Self {
            table,
            sql: insert_sql(dialect, table),
            params: vec![message],
        }
    }
}
