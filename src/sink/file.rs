use super::util::ensure_parent_dir;
use super::{Sink, SinkStats};
use crate::error::{Error, FileError, Result};
use crate::format::{FormattedRecord, Formatter};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// 文件 sink - 每次写入都是 打开(追加) -> 写入 -> 关闭，不持有文件句柄
///
/// 始终写入纯文本，不带 ANSI 转义码。
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    stats: SinkStats,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            stats: SinkStats::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_line(&self, line: &str) -> Result<()> {
        ensure_parent_dir(&self.path).map_err(|e| {
            Error::File(FileError::CreateDirectoryFailed {
                path: self.path.parent().unwrap_or(&self.path).to_path_buf(),
                reason: e.to_string(),
            })
        })?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                Error::File(FileError::WriteFailed {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })
            })?;

        // 单次 write_all，依赖操作系统对 O_APPEND 的原子性
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        file.write_all(buf.as_bytes()).map_err(|e| {
            Error::File(FileError::WriteFailed {
                path: self.path.clone(),
                reason: e.to_string(),
            })
        })
    }
}

impl Sink for FileSink {
    fn write(&mut self, record: &FormattedRecord) -> Result<()> {
        let line = Formatter::Plain.render(record);
        match self.append_line(&line) {
            Ok(()) => {
                self.stats.record_success();
                Ok(())
            }
            Err(e) => {
                self.stats.record_failure();
                Err(e)
            }
        }
    }

    fn name(&self) -> &str {
        "file"
    }

    fn stats_snapshot(&self) -> Option<SinkStats> {
        Some(self.stats)
    }
}
