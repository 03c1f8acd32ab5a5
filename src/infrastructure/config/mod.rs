use serde::Deserialize;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    /// Directory where per-request staging files are written.
    pub local_working_path: String,
    pub remote: RemoteSettings,
    pub store: StoreSettings,
}

/// Connection settings for the remote synthesis host (SSH).
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Private key path. When set, key auth takes precedence over the password.
    pub key_file: Option<String>,
    pub working_path: String,
}

/// Connection settings for the S3-compatible object store.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    /// host:port, without scheme. The scheme is derived from `secure`.
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub secure: bool,
    pub bucket: String,
    /// Key prefix under which audio objects are stored.
    pub working_path: String,
    /// Base URL under which published objects are reachable anonymously.
    pub public_url: String,
    pub bucket_expiration_days: i32,
    pub bucket_anonymous: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
            local_working_path: env::var("LOCAL_WORKING_PATH")
                .unwrap_or_else(|_| "/tmp".to_string()),
            remote: RemoteSettings {
                host: env::var("REMOTE_HOST").unwrap_or_else(|_| "192.168.1.100".to_string()),
                port: env::var("REMOTE_PORT")
                    .unwrap_or_else(|_| "22".to_string())
                    .parse()?,
                user: env::var("REMOTE_USER").unwrap_or_else(|_| "user".to_string()),
                password: env::var("REMOTE_PASSWORD").unwrap_or_else(|_| "password".to_string()),
                key_file: env::var("REMOTE_KEY_FILE").ok().filter(|s| !s.is_empty()),
                working_path: env::var("REMOTE_WORKING_PATH")
                    .unwrap_or_else(|_| "/tmp".to_string()),
            },
            store: StoreSettings {
                endpoint: env::var("STORE_ENDPOINT")
                    .unwrap_or_else(|_| "localhost:9000".to_string()),
                access_key: env::var("STORE_ACCESS_KEY")
                    .unwrap_or_else(|_| "access_key".to_string()),
                secret_key: env::var("STORE_SECRET_KEY")
                    .unwrap_or_else(|_| "secret_key".to_string()),
                region: env::var("STORE_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                secure: parse_bool(env::var("STORE_SECURE").ok().as_deref(), false),
                bucket: env::var("STORE_BUCKET").unwrap_or_else(|_| "speech".to_string()),
                working_path: env::var("STORE_WORKING_PATH").unwrap_or_else(|_| "tmp".to_string()),
                public_url: env::var("STORE_PUBLIC_URL")
                    .unwrap_or_else(|_| "http://localhost:9000".to_string()),
                bucket_expiration_days: env::var("STORE_BUCKET_EXPIRATION_DAYS")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()?,
                bucket_anonymous: parse_bool(
                    env::var("STORE_BUCKET_ANONYMOUS").ok().as_deref(),
                    true,
                ),
            },
        };

        Ok(config)
    }
}

fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value {
        Some(s) => matches!(s.to_lowercase().as_str(), "true" | "1" | "t"),
        None => default,
    }
}

pub fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "speechrelay=debug,tower_http=debug".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
