//! Logger：阈值过滤 + 一次格式化 + 依次分发到所有 sink
//!
//! 每次调用在所有 sink 写完后才返回，因此同一个 Logger 上的调用顺序
//! 就是每个 sink 看到的顺序。单个 sink 的写入失败只会在诊断通道上报告，
//! 不会传播给调用方，也不会影响其余 sink。

use crate::config::{Config, SinkConfig};
use crate::error::{ConfigError, Error, Result};
use crate::format::{FormattedRecord, LogEvent};
use crate::severity::{Severity, should_emit};
use crate::sink::{LogRow, LogTable, Sink, SinkStats, build_sink};
use log::{debug, info, warn};

pub struct Logger {
    threshold: Severity,
    sinks: Vec<Box<dyn Sink>>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("threshold", &self.threshold)
            .field("sinks", &self.sink_names())
            .finish()
    }
}

impl Logger {
    /// 按配置构建并初始化所有 sink；任何构造期错误都会中止创建
    pub fn new(sinks: &[SinkConfig], threshold: Severity) -> Result<Self> {
        if sinks.is_empty() {
            return Err(Error::Config(ConfigError::NoSinks));
        }

        let mut built: Vec<Box<dyn Sink>> = Vec::with_capacity(sinks.len());
        for config in sinks {
            let Some(mut sink) = build_sink(config)? else {
                continue;
            };
            sink.initialize()?;
            debug!("Sink ready: {}", sink.name());
            built.push(sink);
        }

        info!(
            "Logger initialized - threshold: {threshold}, sinks: {}",
            built.len()
        );
        Ok(Self::with_sinks(threshold, built))
    }

    /// 从配置文件结构创建
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Self::new(&config.sinks, config.logging.threshold()?)
    }

    /// 使用已构建好的 sink（不会再调用 initialize）
    pub fn with_sinks(threshold: Severity, sinks: Vec<Box<dyn Sink>>) -> Self {
        Self { threshold, sinks }
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: Severity) {
        self.threshold = threshold;
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// 过滤、格式化并分发；从不返回错误
    pub fn log(&mut self, severity: Severity, message: &str) {
        if !should_emit(severity, self.threshold) {
            return;
        }

        let record = FormattedRecord::from_event(LogEvent::new(severity, message));
        self.dispatch(&record);
    }

    /// 级别以字符串给出时在此处校验，未知级别直接拒绝
    pub fn log_str(&mut self, level: &str, message: &str) -> Result<()> {
        let severity: Severity = level.parse()?;
        self.log(severity, message);
        Ok(())
    }

    pub fn debug(&mut self, message: &str) {
        self.log(Severity::Debug, message);
    }

    pub fn info(&mut self, message: &str) {
        self.log(Severity::Info, message);
    }

    pub fn warn(&mut self, message: &str) {
        self.log(Severity::Warn, message);
    }

    pub fn error(&mut self, message: &str) {
        self.log(Severity::Error, message);
    }

    /// 从第一个数据库 sink 读回整张表
    pub fn fetch_table(&mut self, table: LogTable) -> Result<Vec<LogRow>> {
        let database = self
            .sinks
            .iter_mut()
            .find_map(|s| s.as_database_mut())
            .ok_or(Error::Config(ConfigError::NoDatabaseSink))?;
        database.fetch_all(table)
    }

    /// 各 sink 的统计信息
    pub fn sink_stats(&self) -> Vec<(String, SinkStats)> {
        self.sinks
            .iter()
            .filter_map(|s| s.stats_snapshot().map(|st| (s.name().to_string(), st)))
            .collect()
    }

    /// 记录各 sink 的统计信息到诊断通道
    pub fn log_stats(&self) {
        for (name, s) in self.sink_stats() {
            info!(
                "Sink stats: {} => written: {}, failed: {}, retried: {} (total: {})",
                name,
                s.written,
                s.failed,
                s.retried,
                s.total()
            );
        }
    }

    fn dispatch(&mut self, record: &FormattedRecord) {
        for sink in &mut self.sinks {
            if let Err(e) = sink.write(record) {
                warn!(
                    "{} sink dropped {} event: {e}",
                    sink.name(),
                    record.severity()
                );
            }
        }
    }
}
