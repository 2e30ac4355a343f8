use log::info;

use leveled_logger::Logger;
use leveled_logger::config::Config;
use leveled_logger::error::Result;

/// 通过配置的所有 sink 输出一条消息
pub fn handle_emit(cfg: &Config, level: &str, message: &str) -> Result<()> {
    let mut logger = Logger::from_config(cfg)?;
    info!("Using sinks: {}", logger.sink_names().join(", "));

    // 级别在这里校验：未知级别直接报错，不会被当成其它级别写出
    logger.log_str(level, message)?;

    logger.log_stats();
    Ok(())
}
