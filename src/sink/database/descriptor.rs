//! 连接串校验：在任何连接尝试之前完成
//!
//! 接受两种形式：
//! - `postgresql://<user>:<password>@<host>:<port>/<dbname>`
//! - `sqlite://<path>`

use crate::error::{ConfigError, Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

const POSTGRES_SCHEME: &str = "postgresql://";
const SQLITE_SCHEME: &str = "sqlite://";

static POSTGRES_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^postgresql://([a-zA-Z0-9_]+):([a-zA-Z0-9_!@#$%^&*()\-+=]+)@([a-zA-Z0-9.\-]+):([0-9]+)/([a-zA-Z0-9_]+)$",
    )
    .expect("postgres connection string pattern is valid")
});

/// 已校验的 PostgreSQL 连接参数
#[derive(Clone, PartialEq, Eq)]
pub struct PgDescriptor {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

// 手写 Debug，避免密码出现在诊断输出中
impl fmt::Debug for PgDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgDescriptor")
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}

/// 已校验的连接描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    Postgres(PgDescriptor),
    Sqlite(PathBuf),
}

impl Descriptor {
    /// 按原样匹配，不裁剪首尾空白
    pub fn parse(input: &str) -> Result<Self> {
        if let Some(path) = input.strip_prefix(SQLITE_SCHEME) {
            if path.is_empty() {
                return Err(invalid(input, "missing database file path"));
            }
            return Ok(Descriptor::Sqlite(PathBuf::from(path)));
        }

        if !input.starts_with(POSTGRES_SCHEME) {
            return Err(invalid(
                input,
                "unsupported scheme, expected postgresql:// or sqlite://",
            ));
        }

        let caps = POSTGRES_PATTERN.captures(input).ok_or_else(|| {
            invalid(
                input,
                "expected postgresql://<user>:<password>@<host>:<port>/<dbname>",
            )
        })?;

        let port = caps[4]
            .parse::<u16>()
            .map_err(|_| invalid(input, "port must be between 0 and 65535"))?;

        Ok(Descriptor::Postgres(PgDescriptor {
            user: caps[1].to_string(),
            password: caps[2].to_string(),
            host: caps[3].to_string(),
            port,
            database: caps[5].to_string(),
        }))
    }

    /// 后端名称（用于诊断日志）
    pub fn backend(&self) -> &'static str {
        match self {
            Descriptor::Postgres(_) => "PostgreSQL",
            Descriptor::Sqlite(_) => "SQLite",
        }
    }
}

impl FromStr for Descriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// 显示时隐藏密码
impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Postgres(pg) => write!(
                f,
                "{POSTGRES_SCHEME}{}:***@{}:{}/{}",
                pg.user, pg.host, pg.port, pg.database
            ),
            Descriptor::Sqlite(path) => write!(f, "{SQLITE_SCHEME}{}", path.display()),
        }
    }
}

fn invalid(descriptor: &str, reason: &str) -> Error {
    Error::Config(ConfigError::InvalidConnectionString {
        descriptor: mask_password(descriptor),
        reason: reason.to_string(),
    })
}

/// 错误信息中的原始串同样隐藏密码
fn mask_password(descriptor: &str) -> String {
    let Some(rest) = descriptor.strip_prefix(POSTGRES_SCHEME) else {
        return descriptor.to_string();
    };
    match (rest.find(':'), rest.rfind('@')) {
        (Some(colon), Some(at)) if colon < at => {
            format!("{POSTGRES_SCHEME}{}:***{}", &rest[..colon], &rest[at..])
        }
        _ => descriptor.to_string(),
    }
}
