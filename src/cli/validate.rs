use log::info;

use leveled_logger::config::{Config, SinkConfig};
use leveled_logger::error::Result;
use leveled_logger::sink::database::Descriptor;

/// 打印已通过校验的配置摘要（不建立任何连接）
pub fn handle_validate(cfg: &Config) -> Result<()> {
    info!("Threshold: {}", cfg.logging.threshold()?);
    info!("Diagnostics level: {}", cfg.diagnostics.level());
    if let Some(file) = cfg.diagnostics.file() {
        info!("Diagnostics file: {file}");
    }

    for (idx, sink) in cfg.sinks.iter().enumerate() {
        match sink {
            SinkConfig::Console { enabled, colored } => info!(
                "Sink #{idx}: console (enabled: {}, colored: {})",
                if *enabled { "yes" } else { "no" },
                if *colored { "yes" } else { "no" }
            ),
            SinkConfig::File { path } => info!("Sink #{idx}: file -> {path}"),
            SinkConfig::Database {
                connection_string,
                dual_write,
                retry,
            } => {
                // 已在 Config::validate 中校验；这里只用于隐藏密码后展示
                let descriptor = Descriptor::parse(connection_string)?;
                info!(
                    "Sink #{idx}: database -> {descriptor} (dual write: {dual_write:?}, attempts: {}, backoff: {}ms)",
                    retry.max_attempts, retry.backoff_ms
                );
            }
        }
    }

    eprintln!("Configuration is valid ({} sink(s))", cfg.sinks.len());
    Ok(())
}
