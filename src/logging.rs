//! 诊断通道：本库自身的运行信息与 sink 失败报告走 `log` 门面，
//! 这里提供一个写到 stderr（可选同时追加到文件）的实现。

use crate::config::DiagnosticsConfig;
use crate::constants::DIAGNOSTIC_LEVELS;
use crate::error::{ConfigError, Error, FileError, Result};
use crate::sink::util::ensure_parent_dir;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// 写到 stderr 与可选文件的诊断 logger
#[derive(Debug)]
struct DiagnosticLogger {
    level: LevelFilter,
    file: Option<Arc<Mutex<File>>>,
}

impl Log for DiagnosticLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let msg = format!(
            "[{}] {} - {}\n",
            record.level(),
            record.target(),
            record.args()
        );

        let _ = std::io::stderr().write_all(msg.as_bytes());

        if let Some(file) = &self.file
            && let Ok(mut f) = file.lock()
        {
            let _ = f.write_all(msg.as_bytes());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
        if let Some(file) = &self.file
            && let Ok(mut f) = file.lock()
        {
            let _ = f.flush();
        }
    }
}

/// 初始化诊断通道（全局，只能成功一次）
pub fn init_diagnostics(config: &DiagnosticsConfig) -> Result<()> {
    let level = parse_diagnostic_level(config.level())?;

    let file = match config.file() {
        Some(path) => Some(Arc::new(Mutex::new(open_append(Path::new(path))?))),
        None => None,
    };

    let logger = DiagnosticLogger { level, file };

    log::set_max_level(level);
    log::set_boxed_logger(Box::new(logger)).map_err(|e: SetLoggerError| {
        Error::Config(ConfigError::InvalidValue {
            field: "diagnostics".to_string(),
            value: config.level().to_string(),
            reason: format!("failed to install diagnostic logger: {e}"),
        })
    })?;

    log::debug!(
        "Diagnostics initialized - level: {:?}, file: {}",
        level,
        config.file().unwrap_or("-")
    );

    Ok(())
}

/// 解析诊断级别字符串
pub fn parse_diagnostic_level(level_str: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(level_str).map_err(|_| {
        Error::Config(ConfigError::InvalidLogLevel {
            level: level_str.to_string(),
            valid_levels: DIAGNOSTIC_LEVELS.iter().map(|s| (*s).to_string()).collect(),
        })
    })
}

fn open_append(path: &Path) -> Result<File> {
    ensure_parent_dir(path).map_err(|e| {
        Error::File(FileError::CreateDirectoryFailed {
            path: path.parent().unwrap_or(path).to_path_buf(),
            reason: e.to_string(),
        })
    })?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            Error::File(FileError::WriteFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        })
}
