use std::env;
use std::net::{Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// 設定値の読み込みエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value {value:?}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// ログの出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 構造化ログ（JSON）
    #[default]
    Json,
    /// ローカル開発向けの読みやすい形式
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("expected `json` or `pretty`, got `{other}`")),
        }
    }
}

/// サービス全体の設定
///
/// 環境変数が無い場合は従来の固定値（localhost:27017 / demo_todo / todo / :9000）を使う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_uri: String,
    pub db_name: String,
    pub collection_name: String,
    pub db_connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub idle_timeout: Duration,
    pub shutdown_grace: Duration,
    pub template_path: PathBuf,
    /// 500 系レスポンスの `error` にドライバのエラー文言をそのまま載せるか
    pub expose_error_details: bool,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv6Addr::UNSPECIFIED, 9000)),
            db_uri: "mongodb://localhost:27017".to_string(),
            db_name: "demo_todo".to_string(),
            collection_name: "todo".to_string(),
            db_connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(60),
            shutdown_grace: Duration::from_secs(5),
            template_path: PathBuf::from("static/home.tpl"),
            expose_error_details: false,
            log_format: LogFormat::Json,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意のキー検索関数から設定を組み立てる（テストでは HashMap を渡す）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Config {
            listen_addr: parse_or(&lookup, "TODO_LISTEN_ADDR", defaults.listen_addr)?,
            db_uri: lookup("TODO_DB_URI").unwrap_or(defaults.db_uri),
            db_name: lookup("TODO_DB_NAME").unwrap_or(defaults.db_name),
            collection_name: lookup("TODO_COLLECTION_NAME").unwrap_or(defaults.collection_name),
            db_connect_timeout: secs_or(
                &lookup,
                "TODO_DB_CONNECT_TIMEOUT_SECS",
                defaults.db_connect_timeout,
            )?,
            read_timeout: secs_or(&lookup, "TODO_READ_TIMEOUT_SECS", defaults.read_timeout)?,
            write_timeout: secs_or(&lookup, "TODO_WRITE_TIMEOUT_SECS", defaults.write_timeout)?,
            idle_timeout: secs_or(&lookup, "TODO_IDLE_TIMEOUT_SECS", defaults.idle_timeout)?,
            shutdown_grace: secs_or(&lookup, "TODO_SHUTDOWN_GRACE_SECS", defaults.shutdown_grace)?,
            template_path: lookup("TODO_TEMPLATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.template_path),
            expose_error_details: parse_or(
                &lookup,
                "TODO_EXPOSE_ERROR_DETAILS",
                defaults.expose_error_details,
            )?,
            log_format: parse_or(&lookup, "TODO_LOG_FORMAT", defaults.log_format)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: ToString,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key,
                reason: e.to_string(),
                value,
            }),
        None => Ok(default),
    }
}

fn secs_or<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let default_secs = default.as_secs();
    parse_or(lookup, key, default_secs).map(Duration::from_secs)
}
