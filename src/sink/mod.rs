/// Sink 模块 - 负责把格式化后的日志记录送到各个目标
///
/// 支持的目标:
/// - 控制台 (stdout，可选 ANSI 着色)
/// - 文件 (追加写入)
/// - 关系数据库 (PostgreSQL / SQLite，按级别分表)
use crate::config::SinkConfig;
use crate::error::Result;
use crate::format::FormattedRecord;
use log::debug;

mod console;
pub mod database;
mod file;
pub(crate) mod util;

pub use console::ConsoleSink;
pub use database::{DatabaseSink, DualWriteMode, LogRow, LogTable, RetryPolicy, SinkState};
pub use file::FileSink;

/// Sink 基础 trait - 所有输出目标必须实现此接口
pub trait Sink: Send {
    /// 初始化 (例如:连接数据库、创建表等)，默认无操作
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// 写入单条记录；错误由调用方在 sink 边界处理
    fn write(&mut self, record: &FormattedRecord) -> Result<()>;

    /// 获取 sink 名称 (用于诊断日志)
    fn name(&self) -> &str;

    /// 获取写入统计信息的快照
    /// 默认返回 None；具体 sink 可覆盖此方法以提供统计信息
    fn stats_snapshot(&self) -> Option<SinkStats> {
        None
    }

    /// 数据库 sink 覆盖此方法以支持读回
    fn as_database_mut(&mut self) -> Option<&mut DatabaseSink> {
        None
    }
}

/// 写入统计信息
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SinkStats {
    /// 成功写入的记录数
    pub written: usize,
    /// 失败（被丢弃）的记录数
    pub failed: usize,
    /// 重试次数
    pub retried: usize,
}

impl SinkStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self) {
        self.written += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> usize {
        self.written + self.failed
    }
}

/// 根据配置构建 sink；禁用的控制台返回 None
pub fn build_sink(config: &SinkConfig) -> Result<Option<Box<dyn Sink>>> {
    match config {
        SinkConfig::Console { enabled, colored } => {
            if !*enabled {
                debug!("Console sink disabled, skipping");
                return Ok(None);
            }
            Ok(Some(Box::new(ConsoleSink::stdout(*colored))))
        }
        SinkConfig::File { path } => Ok(Some(Box::new(FileSink::new(path)))),
        SinkConfig::Database {
            connection_string,
            dual_write,
            retry,
        } => {
            let sink = DatabaseSink::new(connection_string, *dual_write, *retry)?;
            Ok(Some(Box::new(sink)))
        }
    }
}
