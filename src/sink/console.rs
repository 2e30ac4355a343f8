use super::{Sink, SinkStats};
use crate::error::Result;
use crate::format::{FormattedRecord, Formatter};
use std::io::{self, Stdout, Write};

/// 控制台 sink - 尽力而为，写入失败只计数、不向上传播
#[derive(Debug)]
pub struct ConsoleSink<W: Write + Send = Stdout> {
    out: W,
    formatter: Formatter,
    stats: SinkStats,
}

impl ConsoleSink<Stdout> {
    /// 写到标准输出
    pub fn stdout(colored: bool) -> Self {
        Self::with_writer(io::stdout(), colored)
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn with_writer(out: W, colored: bool) -> Self {
        let formatter = if colored {
            Formatter::Ansi
        } else {
            Formatter::Plain
        };
        Self {
            out,
            formatter,
            stats: SinkStats::new(),
        }
    }

    pub fn formatter(&self) -> Formatter {
        self.formatter
    }

    /// 取回底层 writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Sink for ConsoleSink<W> {
    fn write(&mut self, record: &FormattedRecord) -> Result<()> {
        let rendered = self.formatter.render(record);
        match writeln!(self.out, "{rendered}").and_then(|()| self.out.flush()) {
            Ok(()) => self.stats.record_success(),
            Err(_) => self.stats.record_failure(),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }

    fn stats_snapshot(&self) -> Option<SinkStats> {
        Some(self.stats)
    }
}
