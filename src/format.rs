//! 格式化：LogEvent -> 文本行；控制台可选 ANSI 着色
//!
//! 文本行格式：`<ISO-8601 时间戳> [<级别大写>]: <消息>`。
//! 着色只在控制台 sink 中进行，文件 sink 始终写入纯文本。

use crate::severity::Severity;
use chrono::{DateTime, SecondsFormat, Utc};
use std::borrow::Cow;

/// 一次日志调用产生的不可变事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEvent {
    /// 以当前时间创建事件
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self::at(severity, message, Utc::now())
    }

    /// 以指定时间创建事件（测试与重放使用）
    pub fn at(severity: Severity, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            severity,
            message: message.into(),
            timestamp,
        }
    }
}

/// 单次分发范围内的格式化结果：事件本身 + 纯文本行
#[derive(Debug, Clone)]
pub struct FormattedRecord {
    pub event: LogEvent,
    pub line: String,
}

impl FormattedRecord {
    pub fn from_event(event: LogEvent) -> Self {
        let line = format_line(event.severity, &event.message, event.timestamp);
        Self { event, line }
    }

    pub fn severity(&self) -> Severity {
        self.event.severity
    }

    pub fn message(&self) -> &str {
        &self.event.message
    }
}

/// ISO-8601（UTC，毫秒精度，`Z` 后缀）
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 纯函数，无 I/O
pub fn format_line(severity: Severity, message: &str, timestamp: DateTime<Utc>) -> String {
    format!(
        "{} [{}]: {}",
        format_timestamp(timestamp),
        severity.label(),
        message
    )
}

/// 各级别的 SGR 颜色码
pub const fn ansi_color(severity: Severity) -> u8 {
    match severity {
        Severity::Debug => 34,
        Severity::Info => 32,
        Severity::Warn => 33,
        Severity::Error => 31,
    }
}

/// 用终端转义码包裹文本，结尾复位
pub fn colorize(severity: Severity, text: &str) -> String {
    format!("\x1b[{}m{}\x1b[0m", ansi_color(severity), text)
}

/// 按 sink 能力选择的格式化变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Formatter {
    /// 纯文本（文件 sink）
    #[default]
    Plain,
    /// ANSI 着色（支持转义码的控制台）
    Ansi,
}

impl Formatter {
    pub fn render<'a>(&self, record: &'a FormattedRecord) -> Cow<'a, str> {
        match self {
            Formatter::Plain => Cow::Borrowed(record.line.as_str()),
            Formatter::Ansi => Cow::Owned(colorize(record.severity(), &record.line)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 15).unwrap()
    }

    #[test]
    fn test_format_timestamp_millis() {
        assert_eq!(format_timestamp(fixed_time()), "2024-03-01T08:30:15.000Z");
    }

    #[test]
    fn test_plain_render_borrows_line() {
        let record = FormattedRecord::from_event(LogEvent::at(Severity::Info, "hi", fixed_time()));
        let rendered = Formatter::Plain.render(&record);
        assert!(matches!(rendered, Cow::Borrowed(_)));
        assert_eq!(rendered, "2024-03-01T08:30:15.000Z [INFO]: hi");
    }

    #[test]
    fn test_ansi_render_wraps_and_resets() {
        let record = FormattedRecord::from_event(LogEvent::at(Severity::Error, "boom", fixed_time()));
        let rendered = Formatter::Ansi.render(&record);
        assert!(rendered.starts_with("\x1b[31m"));
        assert!(rendered.ends_with("\x1b[0m"));
        assert!(rendered.contains("[ERROR]: boom"));
    }
}
