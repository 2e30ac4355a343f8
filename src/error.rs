use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration related error (malformed descriptor, invalid level, bad config file)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File operation error
    #[error("File error: {0}")]
    File(#[from] FileError),

    /// Database operation error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// 是否属于配置类错误（构造期即失败，不可重试）
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// Configuration file parse failed
    #[error("Failed to parse configuration file {path}: {reason}")]
    ParseFailed { path: PathBuf, reason: String },

    /// Invalid log level
    #[error("Invalid log level '{level}', valid values: {}", valid_levels.join(", "))]
    InvalidLogLevel {
        level: String,
        valid_levels: Vec<String>,
    },

    /// Connection descriptor does not match the accepted pattern
    #[error("Invalid connection string '{descriptor}': {reason}")]
    InvalidConnectionString { descriptor: String, reason: String },

    /// Invalid configuration value
    #[error("Invalid configuration value {field} = '{value}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// No sinks configured
    #[error("At least one sink must be configured (console/file/database)")]
    NoSinks,

    /// Read-back requested on a logger without a database sink
    #[error("No database sink configured")]
    NoDatabaseSink,
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// File already exists
    #[error("File already exists: {path} (use --force to replace)")]
    AlreadyExists { path: PathBuf },

    /// File write failed
    #[error("Failed to write file {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    /// Create directory failed
    #[error("Failed to create directory {path}: {reason}")]
    CreateDirectoryFailed { path: PathBuf, reason: String },
}

/// 数据库错误
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Could not establish a connection
    #[error("Failed to connect to {backend} ({target}): {reason}")]
    ConnectFailed {
        backend: String,
        target: String,
        reason: String,
    },

    /// Table creation transaction failed and was rolled back
    #[error("Schema creation failed and was rolled back: {reason}")]
    SchemaFailed { reason: String },

    /// A single insert failed
    #[error("Insert into {table_name} failed: {reason}")]
    WriteFailed { table_name: String, reason: String },

    /// A read-back query failed
    #[error("Query on {table_name} failed: {reason}")]
    QueryFailed { table_name: String, reason: String },

    /// The sink is in the Failed state and must be rebuilt
    #[error("Database sink is unusable (state: {state}); rebuild it to continue")]
    Unusable { state: String },

    /// Descriptor names a backend that is not compiled in
    #[error("Backend '{backend}' is not enabled in this build")]
    UnsupportedBackend { backend: String },
}

/// 应用程序 Result 类型别名
pub type Result<T> = std::result::Result<T, Error>;
