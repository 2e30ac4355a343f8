/// 数据库 sink 实现
///
/// 每个级别一张表 + 一张汇总 dump 表（`mylogs`）。
/// 支持的后端:
/// - PostgreSQL (网络型关系数据库，`postgres` 特性)
/// - SQLite (文件型嵌入式数据库，`sqlite` 特性)
///
/// 状态机：Uninitialized -> Connecting -> SchemaEnsuring -> Ready，
/// Connecting / SchemaEnsuring 阶段任何失败都进入终态 Failed。
mod descriptor;
#[cfg(feature = "postgres")]
mod postgres;
mod schema;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use descriptor::{Descriptor, PgDescriptor};
pub use schema::{
    Dialect, LogRow, LogTable, Statement, create_all_sql, create_table_sql, insert_sql,
    select_all_sql,
};

use super::{Sink, SinkStats};
use crate::error::{DatabaseError, Error, Result};
use crate::format::FormattedRecord;
use crate::severity::Severity;
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::fmt;
use std::thread;
use std::time::Duration;

/// 后端抽象：两条连接（写入/读回 与 建表）上的基本操作
pub trait LogStore: Send + fmt::Debug {
    fn backend(&self) -> &'static str;

    fn dialect(&self) -> Dialect;

    /// 在 schema 连接上以单个事务执行全部语句，任何失败整体回滚
    fn execute_schema_batch(&mut self, statements: &[String]) -> Result<()>;

    /// 在主连接上以单个事务执行多条插入
    fn execute_in_transaction(&mut self, statements: &[&Statement<'_>]) -> Result<()>;

    /// 在主连接上单独执行一条语句（自动提交）
    fn execute(&mut self, statement: &Statement<'_>) -> Result<()>;

    /// 按 id 升序读取整张表
    fn fetch_rows(&mut self, table: LogTable) -> Result<Vec<LogRow>>;

    /// 当前 schema 中存在的表名
    fn existing_tables(&mut self) -> Result<Vec<String>>;

    /// 主连接是否仍然可用
    fn is_connected(&self) -> bool;
}

/// 数据库 sink 生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    Uninitialized,
    Connecting,
    SchemaEnsuring,
    Ready,
    Failed,
}

impl fmt::Display for SinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SinkState::Uninitialized => "uninitialized",
            SinkState::Connecting => "connecting",
            SinkState::SchemaEnsuring => "schema-ensuring",
            SinkState::Ready => "ready",
            SinkState::Failed => "failed",
        })
    }
}

/// dump 表与级别表两次插入的提交方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DualWriteMode {
    /// 两次插入在同一事务中，要么都可见要么都不可见
    #[default]
    Transactional,
    /// 两次插入各自提交，可能只成功一半
    Independent,
}

fn default_max_attempts() -> u32 {
    1
}

fn default_backoff_ms() -> u64 {
    100
}

/// 写入失败后的重试策略；默认不重试（尽力而为）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryPolicy {
    /// 总尝试次数（含第一次），至少为 1
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// 第一次重试前的等待时间，之后每次翻倍
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl RetryPolicy {
    /// 不重试
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(max_attempts: u32, backoff_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_ms,
        }
    }

    /// 第 attempt 次失败后的等待时间（attempt 从 1 开始）
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u64
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }
}

/// 带重试地执行一次写操作
fn run_with_retry<F>(
    store: &mut dyn LogStore,
    retry: RetryPolicy,
    stats: &mut SinkStats,
    mut op: F,
) -> Result<()>
where
    F: FnMut(&mut dyn LogStore) -> Result<()>,
{
    let mut attempt = 1;
    loop {
        match op(&mut *store) {
            Ok(()) => return Ok(()),
            Err(e) if attempt < retry.max_attempts && store.is_connected() => {
                let delay = retry.delay(attempt);
                warn!(
                    "{} write attempt {attempt}/{} failed, retrying in {delay:?}: {e}",
                    store.backend(),
                    retry.max_attempts
                );
                thread::sleep(delay);
                stats.retried += 1;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// 数据库 sink
#[derive(Debug)]
pub struct DatabaseSink {
    descriptor: Descriptor,
    dual_write: DualWriteMode,
    retry: RetryPolicy,
    state: SinkState,
    store: Option<Box<dyn LogStore>>,
    stats: SinkStats,
}

impl DatabaseSink {
    /// 校验连接串并创建未连接的 sink；连接串非法时立即失败，不会尝试连接
    pub fn new(connection_string: &str, dual_write: DualWriteMode, retry: RetryPolicy) -> Result<Self> {
        let descriptor = Descriptor::parse(connection_string)?;
        debug!("Database sink configured for {descriptor}");
        Ok(Self {
            descriptor,
            dual_write,
            retry: RetryPolicy::new(retry.max_attempts, retry.backoff_ms),
            state: SinkState::Uninitialized,
            store: None,
            stats: SinkStats::new(),
        })
    }

    pub fn state(&self) -> SinkState {
        self.state
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn dual_write(&self) -> DualWriteMode {
        self.dual_write
    }

    /// 连接并建表；Ready 时为空操作，Failed 时拒绝
    pub fn connect(&mut self) -> Result<()> {
        match self.state {
            SinkState::Ready => return Ok(()),
            SinkState::Failed => return Err(self.unusable()),
            _ => {}
        }

        info!("Initializing database sink: {}", self.descriptor);

        self.state = SinkState::Connecting;
        let store = match open_store(&self.descriptor) {
            Ok(store) => store,
            Err(e) => return Err(self.fail(e)),
        };
        self.store = Some(store);

        self.state = SinkState::SchemaEnsuring;
        if let Err(e) = self.create_tables() {
            return Err(self.fail(e));
        }

        self.state = SinkState::Ready;
        info!("Initialization complete!");
        Ok(())
    }

    /// 再次确保五张表存在（幂等）；失败时 sink 进入 Failed
    pub fn ensure_schema(&mut self) -> Result<()> {
        self.require_ready()?;
        self.create_tables().map_err(|e| self.fail(e))
    }

    /// 写入一条日志：dump 表 + 级别表
    pub fn log_event(&mut self, severity: Severity, message: &str) -> Result<()> {
        self.require_ready()?;
        let result = self.insert_pair(severity, message);

        match &result {
            Ok(()) => self.stats.record_success(),
            Err(_) => {
                self.stats.record_failure();
                if !self.store.as_ref().is_some_and(|s| s.is_connected()) {
                    let lost = Error::Database(DatabaseError::ConnectFailed {
                        backend: self.descriptor.backend().to_string(),
                        target: self.descriptor.to_string(),
                        reason: "connection lost".to_string(),
                    });
                    self.fail(lost);
                }
            }
        }
        result
    }

    /// 读回整张表（诊断 / 校验用，不在写入热路径上）
    pub fn fetch_all(&mut self, table: LogTable) -> Result<Vec<LogRow>> {
        self.require_ready()?;
        self.store_mut()?.fetch_rows(table)
    }

    /// 五张日志表中已存在的表，按 `LogTable::ALL` 顺序
    pub fn table_names(&mut self) -> Result<Vec<String>> {
        self.require_ready()?;
        let existing = self.store_mut()?.existing_tables()?;
        Ok(LogTable::ALL
            .iter()
            .map(|t| t.name())
            .filter(|name| existing.iter().any(|e| e.eq_ignore_ascii_case(name)))
            .map(str::to_string)
            .collect())
    }

    fn insert_pair(&mut self, severity: Severity, message: &str) -> Result<()> {
        let retry = self.retry;
        let mode = self.dual_write;
        let stats = &mut self.stats;
        let store = self.store.as_deref_mut().ok_or_else(|| {
            Error::Database(DatabaseError::Unusable {
                state: SinkState::Uninitialized.to_string(),
            })
        })?;

        let dialect = store.dialect();
        let dump = Statement::dump_insert(dialect, severity, message);
        let level = Statement::level_insert(dialect, severity, message);

        match mode {
            DualWriteMode::Transactional => run_with_retry(store, retry, stats, |s| {
                s.execute_in_transaction(&[&dump, &level])
            }),
            DualWriteMode::Independent => {
                // 第一条失败时仍然尝试第二条
                let dump_result = run_with_retry(store, retry, stats, |s| s.execute(&dump));
                let level_result = run_with_retry(store, retry, stats, |s| s.execute(&level));
                match (dump_result, level_result) {
                    (Ok(()), Ok(())) => Ok(()),
                    (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
                    (Err(first), Err(second)) => {
                        warn!("Both inserts failed; second error: {second}");
                        Err(first)
                    }
                }
            }
        }
    }

    fn create_tables(&mut self) -> Result<()> {
        let store = self.store_mut()?;
        let statements = create_all_sql(store.dialect());
        store.execute_schema_batch(&statements)?;
        info!("Tables created successfully.");
        Ok(())
    }

    fn store_mut(&mut self) -> Result<&mut (dyn LogStore + 'static)> {
        let state = self.state;
        self.store.as_deref_mut().ok_or_else(|| {
            Error::Database(DatabaseError::Unusable {
                state: state.to_string(),
            })
        })
    }

    fn require_ready(&self) -> Result<()> {
        if self.state == SinkState::Ready {
            Ok(())
        } else {
            Err(self.unusable())
        }
    }

    fn unusable(&self) -> Error {
        Error::Database(DatabaseError::Unusable {
            state: self.state.to_string(),
        })
    }

    /// 进入终态 Failed，释放连接，返回原错误以便继续传播
    fn fail(&mut self, e: Error) -> Error {
        error!(
            "Database sink {} failed while {}: {e}",
            self.descriptor, self.state
        );
        self.state = SinkState::Failed;
        self.store = None;
        e
    }
}

/// 按连接串选择后端
fn open_store(descriptor: &Descriptor) -> Result<Box<dyn LogStore>> {
    match descriptor {
        #[cfg(feature = "postgres")]
        Descriptor::Postgres(pg) => Ok(Box::new(postgres::PgStore::connect(pg)?)),
        #[cfg(feature = "sqlite")]
        Descriptor::Sqlite(path) => Ok(Box::new(sqlite::SqliteStore::open(path)?)),
        #[allow(unreachable_patterns)]
        other => Err(Error::Database(DatabaseError::UnsupportedBackend {
            backend: other.backend().to_string(),
        })),
    }
}

impl Sink for DatabaseSink {
    fn initialize(&mut self) -> Result<()> {
        self.connect()
    }

    fn write(&mut self, record: &FormattedRecord) -> Result<()> {
        self.log_event(record.severity(), record.message())
    }

    fn name(&self) -> &str {
        self.descriptor.backend()
    }

    fn stats_snapshot(&self) -> Option<SinkStats> {
        Some(self.stats)
    }

    fn as_database_mut(&mut self) -> Option<&mut DatabaseSink> {
        Some(self)
    }
}
