/// 文件与控制台 sink 测试
use chrono::{TimeZone, Utc};
use leveled_logger::error::{Error, FileError};
use leveled_logger::sink::{ConsoleSink, FileSink};
use leveled_logger::{FormattedRecord, Formatter, LogEvent, Severity, Sink};
use std::fs;
use std::path::{Path, PathBuf};

fn output_dir(name: &str) -> PathBuf {
    let dir = Path::new("target/test_outputs/file_sink").join(name);
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn record(severity: Severity, message: &str) -> FormattedRecord {
    let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    FormattedRecord::from_event(LogEvent::at(severity, message, ts))
}

#[test]
fn test_file_sink_creates_missing_directories() {
    let dir = output_dir("nested");
    let path = dir.join("a/b/c/app.log");
    let mut sink = FileSink::new(&path);
    assert_eq!(sink.path(), path.as_path());

    sink.write(&record(Severity::Info, "first")).unwrap();

    assert!(path.exists());
    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "2024-01-02T03:04:05.000Z [INFO]: first\n");
}

#[test]
fn test_file_sink_appends_in_order() {
    let dir = output_dir("order");
    let path = dir.join("app.log");
    let mut sink = FileSink::new(&path);

    sink.write(&record(Severity::Warn, "one")).unwrap();
    sink.write(&record(Severity::Error, "two")).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("[WARN]: one"));
    assert!(lines[1].ends_with("[ERROR]: two"));

    let stats = sink.stats_snapshot().unwrap();
    assert_eq!(stats.written, 2);
    assert_eq!(stats.failed, 0);
}

#[test]
fn test_file_sink_never_writes_escape_codes() {
    let dir = output_dir("plain");
    let path = dir.join("app.log");
    let mut sink = FileSink::new(&path);

    for severity in Severity::ALL {
        sink.write(&record(severity, "msg")).unwrap();
    }

    let content = fs::read_to_string(&path).unwrap();
    assert!(!content.contains('\x1b'));
    assert_eq!(content.lines().count(), 4);
}

#[test]
fn test_file_sink_keeps_existing_content() {
    let dir = output_dir("existing");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("app.log");
    fs::write(&path, "previous line\n").unwrap();

    let mut sink = FileSink::new(&path);
    sink.write(&record(Severity::Debug, "next")).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("previous line\n"));
    assert!(content.ends_with("[DEBUG]: next\n"));
}

#[test]
fn test_file_sink_reports_write_failure() {
    // 目标路径是一个目录，打开失败
    let dir = output_dir("is_dir");
    fs::create_dir_all(dir.join("app.log")).unwrap();

    let mut sink = FileSink::new(dir.join("app.log"));
    let err = sink.write(&record(Severity::Info, "lost")).unwrap_err();
    assert!(matches!(err, Error::File(FileError::WriteFailed { .. })));
    assert_eq!(sink.stats_snapshot().unwrap().failed, 1);
}

#[test]
fn test_console_sink_colored_output() {
    let mut sink = ConsoleSink::with_writer(Vec::new(), true);
    assert_eq!(sink.formatter(), Formatter::Ansi);
    sink.write(&record(Severity::Warn, "careful")).unwrap();

    let out = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(
        out,
        "\x1b[33m2024-01-02T03:04:05.000Z [WARN]: careful\x1b[0m\n"
    );
}

#[test]
fn test_console_sink_plain_output() {
    let mut sink = ConsoleSink::with_writer(Vec::new(), false);
    assert_eq!(sink.formatter(), Formatter::Plain);
    sink.write(&record(Severity::Info, "hello")).unwrap();

    let out = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(out, "2024-01-02T03:04:05.000Z [INFO]: hello\n");
}
