//! 公共常量
//! 提供：
//! - 合法日志级别常量 LOG_LEVELS / DIAGNOSTIC_LEVELS
//! - 数据库表名（dump 表与各级别表）
//! - 配置默认值

/// 合法的日志级别（统一来源，按严重程度递增）
pub const LOG_LEVELS: &[&str] = &["debug", "info", "warn", "error"];

/// 诊断通道（本库自身的 log 输出）可用级别
pub const DIAGNOSTIC_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// 汇总所有级别日志的 dump 表
pub const DUMP_TABLE: &str = "mylogs";

/// 各级别日志表（与 `Severity` 的顺序一致）
pub const LEVEL_TABLES: [&str; 4] = ["debug_logs", "info_logs", "warn_logs", "error_logs"];

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 默认文件 sink 路径
pub const DEFAULT_LOG_FILE: &str = "logs/app.log";
