//! 数据库 sink 测试（SQLite 后端）
#![cfg(feature = "sqlite")]

use chrono::{Duration, Utc};
use leveled_logger::config::SinkConfig;
use leveled_logger::error::{DatabaseError, Error};
use leveled_logger::sink::database::Descriptor;
use leveled_logger::{
    DatabaseSink, DualWriteMode, LogTable, Logger, RetryPolicy, Severity, SinkState,
};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

fn db_path(name: &str) -> PathBuf {
    let dir = Path::new("target/test_outputs/database");
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(format!("{name}.db"));
    let _ = fs::remove_file(&path);
    path
}

fn connection_string(path: &Path) -> String {
    format!("sqlite://{}", path.to_string_lossy().replace('\\', "/"))
}

fn ready_sink(path: &Path, mode: DualWriteMode, retry: RetryPolicy) -> DatabaseSink {
    let mut sink = DatabaseSink::new(&connection_string(path), mode, retry).unwrap();
    assert_eq!(sink.dual_write(), mode);
    let expected = connection_string(path).replacen("sqlite://", "", 1);
    assert_eq!(sink.descriptor(), &Descriptor::Sqlite(PathBuf::from(expected)));
    sink.connect().unwrap();
    assert_eq!(sink.state(), SinkState::Ready);
    sink
}

/// 旁路连接：模拟外部对 schema 的破坏
fn drop_table(path: &Path, table: &str) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(&format!("DROP TABLE {table}")).unwrap();
}

#[test]
fn test_connect_creates_five_empty_tables() {
    let path = db_path("five_tables");
    let mut sink = ready_sink(&path, DualWriteMode::default(), RetryPolicy::none());

    assert_eq!(
        sink.table_names().unwrap(),
        vec!["debug_logs", "info_logs", "warn_logs", "error_logs", "mylogs"]
    );
    for table in LogTable::ALL {
        assert!(sink.fetch_all(table).unwrap().is_empty(), "{table} not empty");
    }
}

#[test]
fn test_ensure_schema_is_idempotent() {
    let path = db_path("idempotent");
    let mut sink = ready_sink(&path, DualWriteMode::default(), RetryPolicy::none());
    sink.log_event(Severity::Info, "kept").unwrap();

    sink.ensure_schema().unwrap();
    sink.ensure_schema().unwrap();

    assert_eq!(sink.table_names().unwrap().len(), 5);
    // 重复建表不会清空已有数据
    assert_eq!(sink.fetch_all(LogTable::Dump).unwrap().len(), 1);

    // 重新连接同一个文件同样幂等
    let mut again = ready_sink(&path, DualWriteMode::default(), RetryPolicy::none());
    assert_eq!(again.fetch_all(LogTable::Dump).unwrap().len(), 1);
}

#[test]
fn test_log_event_writes_dump_and_level_table() {
    let path = db_path("dual_insert");
    let mut sink = ready_sink(&path, DualWriteMode::Transactional, RetryPolicy::none());

    let before = Utc::now() - Duration::seconds(1);
    sink.log_event(Severity::Warn, "x").unwrap();
    let after = Utc::now() + Duration::seconds(1);

    let dump = sink.fetch_all(LogTable::Dump).unwrap();
    assert_eq!(dump.len(), 1);
    assert_eq!(dump[0].level, Some(Severity::Warn));
    assert_eq!(dump[0].message, "x");
    assert!(dump[0].timestamp >= before && dump[0].timestamp <= after);

    let warn = sink.fetch_all(LogTable::Level(Severity::Warn)).unwrap();
    assert_eq!(warn.len(), 1);
    assert_eq!(warn[0].level, None);
    assert_eq!(warn[0].message, "x");

    for severity in [Severity::Debug, Severity::Info, Severity::Error] {
        assert!(sink.fetch_all(LogTable::Level(severity)).unwrap().is_empty());
    }
}

#[test]
fn test_ids_increase_in_write_order() {
    let path = db_path("ids");
    let mut sink = ready_sink(&path, DualWriteMode::default(), RetryPolicy::none());

    sink.log_event(Severity::Info, "first").unwrap();
    sink.log_event(Severity::Error, "second").unwrap();
    sink.log_event(Severity::Info, "third").unwrap();

    let dump = sink.fetch_all(LogTable::Dump).unwrap();
    let messages: Vec<&str> = dump.iter().map(|r| r.message.as_str()).collect();
    assert_eq!(messages, vec!["first", "second", "third"]);
    assert!(dump.windows(2).all(|w| w[0].id < w[1].id));

    let info = sink.fetch_all(LogTable::Level(Severity::Info)).unwrap();
    assert_eq!(info.len(), 2);
    assert!(info[0].id < info[1].id);
}

#[test]
fn test_message_with_quotes_is_stored_verbatim() {
    let path = db_path("quotes");
    let mut sink = ready_sink(&path, DualWriteMode::default(), RetryPolicy::none());

    let message = "it's a \"test\"; DROP TABLE mylogs; --";
    sink.log_event(Severity::Error, message).unwrap();

    let rows = sink.fetch_all(LogTable::Level(Severity::Error)).unwrap();
    assert_eq!(rows[0].message, message);
    assert_eq!(sink.table_names().unwrap().len(), 5);
}

#[test]
fn test_message_longer_than_column_is_rejected() {
    let path = db_path("long_message");
    let mut sink = ready_sink(&path, DualWriteMode::Transactional, RetryPolicy::none());

    let fits = "a".repeat(255);
    sink.log_event(Severity::Info, &fits).unwrap();

    let too_long = "b".repeat(1000);
    let err = sink.log_event(Severity::Info, &too_long).unwrap_err();
    assert!(matches!(
        err,
        Error::Database(DatabaseError::WriteFailed { .. })
    ));

    let dump = sink.fetch_all(LogTable::Dump).unwrap();
    assert_eq!(dump.len(), 1);
    assert_eq!(dump[0].message.len(), 255);
    assert_eq!(sink.fetch_all(LogTable::Level(Severity::Info)).unwrap().len(), 1);
}

#[test]
fn test_transactional_write_is_all_or_nothing() {
    let path = db_path("transactional");
    let mut sink = ready_sink(&path, DualWriteMode::Transactional, RetryPolicy::none());
    drop_table(&path, "warn_logs");

    let err = sink.log_event(Severity::Warn, "lost").unwrap_err();
    assert!(matches!(
        err,
        Error::Database(DatabaseError::WriteFailed { .. })
    ));
    // dump 表的插入随事务一起回滚
    assert!(sink.fetch_all(LogTable::Dump).unwrap().is_empty());
    // 写入失败不会让 sink 进入 Failed
    assert_eq!(sink.state(), SinkState::Ready);
}

#[test]
fn test_independent_write_keeps_partial_result() {
    let path = db_path("independent");
    let mut sink = ready_sink(&path, DualWriteMode::Independent, RetryPolicy::none());
    drop_table(&path, "warn_logs");

    let err = sink.log_event(Severity::Warn, "half").unwrap_err();
    match err {
        Error::Database(DatabaseError::WriteFailed { table_name, .. }) => {
            assert_eq!(table_name, "warn_logs");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let dump = sink.fetch_all(LogTable::Dump).unwrap();
    assert_eq!(dump.len(), 1);
    assert_eq!(dump[0].message, "half");
}

#[test]
fn test_independent_write_attempts_level_table_after_dump_failure() {
    let path = db_path("independent_dump_missing");
    let mut sink = ready_sink(&path, DualWriteMode::Independent, RetryPolicy::none());
    drop_table(&path, "mylogs");

    assert!(sink.log_event(Severity::Info, "still here").is_err());
    let info = sink.fetch_all(LogTable::Level(Severity::Info)).unwrap();
    assert_eq!(info.len(), 1);
}

#[test]
fn test_retry_counts_attempts() {
    let path = db_path("retry");
    let mut sink = ready_sink(&path, DualWriteMode::Transactional, RetryPolicy::new(3, 1));
    drop_table(&path, "error_logs");

    assert!(sink.log_event(Severity::Error, "boom").is_err());

    let stats = leveled_logger::Sink::stats_snapshot(&sink).unwrap();
    assert_eq!(stats.retried, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.written, 0);
}

#[test]
fn test_operations_refused_before_connect() {
    let path = db_path("not_connected");
    let mut sink = DatabaseSink::new(
        &connection_string(&path),
        DualWriteMode::default(),
        RetryPolicy::none(),
    )
    .unwrap();

    assert_eq!(sink.state(), SinkState::Uninitialized);
    let err = sink.log_event(Severity::Info, "x").unwrap_err();
    assert!(matches!(err, Error::Database(DatabaseError::Unusable { .. })));
    // 构造时不会创建数据库文件
    assert!(!path.exists());
}

#[test]
fn test_failed_sink_refuses_writes() {
    // 目录不能作为 SQLite 数据库打开
    let dir = Path::new("target/test_outputs/database/not_a_file.db");
    fs::create_dir_all(dir).unwrap();

    let mut sink = DatabaseSink::new(
        &connection_string(dir),
        DualWriteMode::default(),
        RetryPolicy::none(),
    )
    .unwrap();

    assert!(sink.connect().is_err());
    assert_eq!(sink.state(), SinkState::Failed);

    let err = sink.log_event(Severity::Error, "x").unwrap_err();
    assert!(matches!(err, Error::Database(DatabaseError::Unusable { .. })));
    // Failed 是终态，再次 connect 也不会恢复
    assert!(sink.connect().is_err());
    assert_eq!(sink.state(), SinkState::Failed);
}

#[test]
fn test_malformed_descriptors_fail_before_connecting() {
    for bad in [
        "",
        "mysql://root:pw@localhost:3306/db",
        "postgresql://user@localhost:5432/db",
        "postgresql://user:pw@localhost/db",
        "postgresql://user:pw@localhost:5432/",
        "postgresql://user:pw@localhost:99999/db",
        "sqlite://",
        " postgresql://user:pw@localhost:5432/db",
        "postgresql://user:pw@localhost:5432/db\n",
        " sqlite://logs.db",
    ] {
        let err = DatabaseSink::new(bad, DualWriteMode::default(), RetryPolicy::none())
            .unwrap_err();
        assert!(err.is_config(), "{bad:?} should be a configuration error");
    }
}

#[test]
fn test_logger_fans_out_to_database() {
    let path = db_path("logger");
    let sinks = vec![SinkConfig::database(connection_string(&path))];
    let mut logger = Logger::new(&sinks, Severity::Info).unwrap();

    logger.debug("filtered");
    logger.info("hello");
    logger.error("bye");

    let dump = logger.fetch_table(LogTable::Dump).unwrap();
    let levels: Vec<Option<Severity>> = dump.iter().map(|r| r.level).collect();
    assert_eq!(levels, vec![Some(Severity::Info), Some(Severity::Error)]);
    assert!(logger
        .fetch_table(LogTable::Level(Severity::Debug))
        .unwrap()
        .is_empty());
    assert_eq!(
        logger.fetch_table(LogTable::Level(Severity::Error)).unwrap()[0].message,
        "bye"
    );
}

#[test]
fn test_logger_survives_database_write_failure() {
    let path = db_path("logger_failure");
    let log_file = Path::new("target/test_outputs/database/logger_failure.log");
    let _ = fs::remove_file(log_file);

    let sinks = vec![
        SinkConfig::database(connection_string(&path)),
        SinkConfig::file(log_file.to_string_lossy()),
    ];
    let mut logger = Logger::new(&sinks, Severity::Debug).unwrap();
    drop_table(&path, "debug_logs");

    logger.debug("file still gets this");

    let content = fs::read_to_string(log_file).unwrap();
    assert!(content.contains("[DEBUG]: file still gets this"));
}

#[test]
fn test_table_name_parsing() {
    assert_eq!("mylogs".parse::<LogTable>().unwrap(), LogTable::Dump);
    assert_eq!("warn".parse::<LogTable>().unwrap(), LogTable::Level(Severity::Warn));
    assert_eq!(
        "ERROR_LOGS".parse::<LogTable>().unwrap(),
        LogTable::Level(Severity::Error)
    );
    assert!("users".parse::<LogTable>().is_err());
}
