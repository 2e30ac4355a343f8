// Library entry point
pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod logger;
pub mod logging;
pub mod severity;
pub mod sink;

pub use error::{Error, Result};
pub use format::{FormattedRecord, Formatter, LogEvent};
pub use logger::Logger;
pub use severity::{Severity, should_emit};
pub use sink::{DatabaseSink, DualWriteMode, LogRow, LogTable, RetryPolicy, Sink, SinkState};
