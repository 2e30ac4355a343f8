//! 日志级别模型：有序的四个级别与过滤规则

use crate::constants::{LEVEL_TABLES, LOG_LEVELS};
use crate::error::{ConfigError, Error};
use std::fmt;
use std::str::FromStr;

/// 日志级别，严格有序：Debug < Info < Warn < Error
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl Severity {
    /// 所有级别，按 rank 升序
    pub const ALL: [Severity; 4] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
    ];

    /// 固定 rank：debug=0 .. error=3
    pub const fn rank(self) -> u8 {
        match self {
            Severity::Debug => 0,
            Severity::Info => 1,
            Severity::Warn => 2,
            Severity::Error => 3,
        }
    }

    /// 小写名称（写入 dump 表 level 列的值）
    pub const fn as_str(self) -> &'static str {
        LOG_LEVELS[self.rank() as usize]
    }

    /// 大写标签，用于文本行 `[INFO]`
    pub const fn label(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }

    /// 对应的级别表名
    pub const fn table_name(self) -> &'static str {
        LEVEL_TABLES[self.rank() as usize]
    }
}

/// candidate 的 rank 不低于 threshold 时才输出
pub fn should_emit(candidate: Severity, threshold: Severity) -> bool {
    candidate.rank() >= threshold.rank()
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = Error;

    /// 大小写不敏感；带空白或未知的级别一律拒绝，不做兜底
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::Config(ConfigError::InvalidLogLevel {
                    level: s.to_string(),
                    valid_levels: LOG_LEVELS.iter().map(|l| (*l).to_string()).collect(),
                })
            })
    }
}
