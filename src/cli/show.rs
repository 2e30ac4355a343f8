use leveled_logger::config::{Config, SinkConfig};
use leveled_logger::error::{ConfigError, Error, Result};
use leveled_logger::format::format_timestamp;
use leveled_logger::{LogTable, Logger};

/// 打印数据库 sink 中某张表的全部内容
pub fn handle_show(cfg: &Config, table: &str) -> Result<()> {
    let table: LogTable = table.parse()?;

    // 只连接数据库 sink，避免在控制台/文件上产生副作用
    let database: Vec<SinkConfig> = cfg
        .sinks
        .iter()
        .filter(|s| matches!(s, SinkConfig::Database { .. }))
        .take(1)
        .cloned()
        .collect();
    if database.is_empty() {
        return Err(Error::Config(ConfigError::NoDatabaseSink));
    }

    let mut logger = Logger::new(&database, cfg.logging.threshold()?)?;
    let rows = logger.fetch_table(table)?;

    println!("{table} ({} rows)", rows.len());
    for row in rows {
        match row.level {
            Some(level) => println!(
                "{:>6}  {}  {:<5}  {}",
                row.id,
                format_timestamp(row.timestamp),
                level,
                row.message
            ),
            None => println!(
                "{:>6}  {}  {}",
                row.id,
                format_timestamp(row.timestamp),
                row.message
            ),
        }
    }
    Ok(())
}
