use crate::constants::{DEFAULT_LOG_FILE, DIAGNOSTIC_LEVELS};
use crate::error::{ConfigError, Error, Result};
use crate::severity::Severity;
use crate::sink::database::{Descriptor, DualWriteMode, RetryPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            sinks: vec![
                SinkConfig::Console {
                    enabled: true,
                    colored: true,
                },
                SinkConfig::File {
                    path: DEFAULT_LOG_FILE.to_string(),
                },
            ],
        }
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| Error::Config(ConfigError::NotFound(path.to_path_buf())))?;
        Self::from_str(&content, path.to_path_buf())
    }

    /// 从字符串解析配置
    pub fn from_str(content: &str, path: PathBuf) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| {
            Error::Config(ConfigError::ParseFailed {
                path,
                reason: e.to_string(),
            })
        })?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        self.logging.validate()?;
        self.diagnostics.validate()?;

        if self.sinks.is_empty() {
            return Err(Error::Config(ConfigError::NoSinks));
        }
        for (idx, sink) in self.sinks.iter().enumerate() {
            sink.validate(idx)?;
        }

        Ok(())
    }

    /// 是否配置了数据库 sink
    pub fn has_database_sink(&self) -> bool {
        self.sinks
            .iter()
            .any(|s| matches!(s, SinkConfig::Database { .. }))
    }
}

/// 日志器本身的配置
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// 输出阈值：debug / info / warn / error
    pub threshold: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            threshold: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// 获取阈值字符串
    pub fn threshold_str(&self) -> &str {
        &self.threshold
    }

    /// 解析阈值
    pub fn threshold(&self) -> Result<Severity> {
        self.threshold.parse()
    }

    /// 验证阈值是否有效
    pub fn validate(&self) -> Result<()> {
        self.threshold().map(|_| ())
    }
}

/// 诊断通道（本库自身的运行信息与 sink 失败报告）
#[derive(Debug, Deserialize, Clone)]
pub struct DiagnosticsConfig {
    /// off / error / warn / info / debug / trace
    #[serde(default = "default_diagnostics_level")]
    pub level: String,
    /// 可选：同时追加写入到文件
    #[serde(default)]
    pub file: Option<String>,
}

fn default_diagnostics_level() -> String {
    "warn".to_string()
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            level: default_diagnostics_level(),
            file: None,
        }
    }
}

impl DiagnosticsConfig {
    /// 获取诊断级别
    pub fn level(&self) -> &str {
        &self.level
    }

    /// 获取诊断文件路径
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// 验证诊断级别是否有效
    pub fn validate(&self) -> Result<()> {
        if !DIAGNOSTIC_LEVELS
            .iter()
            .any(|&l| l.eq_ignore_ascii_case(self.level.as_str()))
        {
            return Err(Error::Config(ConfigError::InvalidLogLevel {
                level: self.level.clone(),
                valid_levels: DIAGNOSTIC_LEVELS.iter().map(|s| (*s).to_string()).collect(),
            }));
        }

        if let Some(file) = &self.file
            && file.trim().is_empty()
        {
            return Err(Error::Config(ConfigError::InvalidValue {
                field: "diagnostics.file".to_string(),
                value: file.clone(),
                reason: "Diagnostics file path cannot be empty".to_string(),
            }));
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

/// 单个输出目标的配置
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    Console {
        #[serde(default = "default_true")]
        enabled: bool,
        #[serde(default = "default_true")]
        colored: bool,
    },
    File {
        path: String,
    },
    Database {
        connection_string: String,
        #[serde(default)]
        dual_write: DualWriteMode,
        #[serde(default)]
        retry: RetryPolicy,
    },
}

impl SinkConfig {
    /// 控制台 sink
    pub fn console(enabled: bool) -> Self {
        SinkConfig::Console {
            enabled,
            colored: true,
        }
    }

    /// 文件 sink
    pub fn file(path: impl Into<String>) -> Self {
        SinkConfig::File { path: path.into() }
    }

    /// 数据库 sink，使用默认写入方式与重试策略
    pub fn database(connection_string: impl Into<String>) -> Self {
        SinkConfig::Database {
            connection_string: connection_string.into(),
            dual_write: DualWriteMode::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// 配置类型名
    pub fn kind(&self) -> &'static str {
        match self {
            SinkConfig::Console { .. } => "console",
            SinkConfig::File { .. } => "file",
            SinkConfig::Database { .. } => "database",
        }
    }

    /// 验证单个 sink 配置；idx 仅用于错误信息
    pub fn validate(&self, idx: usize) -> Result<()> {
        match self {
            SinkConfig::Console { .. } => Ok(()),
            SinkConfig::File { path } => {
                if path.trim().is_empty() {
                    return Err(Error::Config(ConfigError::InvalidValue {
                        field: format!("sinks[{idx}].path"),
                        value: path.clone(),
                        reason: "File path cannot be empty".to_string(),
                    }));
                }
                Ok(())
            }
            SinkConfig::Database {
                connection_string,
                retry,
                ..
            } => {
                Descriptor::parse(connection_string)?;
                if retry.max_attempts == 0 {
                    return Err(Error::Config(ConfigError::InvalidValue {
                        field: format!("sinks[{idx}].retry.max_attempts"),
                        value: retry.max_attempts.to_string(),
                        reason: "At least one attempt is required".to_string(),
                    }));
                }
                Ok(())
            }
        }
    }
}
