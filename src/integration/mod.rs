use std::env;
use std::str::FromStr;
use std::{fs::File, net::SocketAddr};

use axum::http::HeaderValue;
use chrono::{FixedOffset, Offset, Utc};
use dotenv::dotenv;
use log::{LevelFilter, warn};
use simplelog::{ColorChoice, CombinedLogger, TermLogger, TerminalMode, WriteLogger};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin};

pub mod cache;
pub mod db;
pub mod pubsub;

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    _Env(#[from] env::VarError),
    #[error(transparent)]
    _ParseInt(#[from] std::num::ParseIntError),
    #[error(transparent)]
    _Redis(#[from] redis::RedisError),
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Nats(#[from] async_nats::ConnectError),
}

#[derive(Clone)]
pub enum Env {
    Local,
    Dev,
    Stage,
    Production,
}

impl FromStr for Env {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "local" => Ok(Env::Local),
            "dev" => Ok(Env::Dev),
            "stg" => Ok(Env::Stage),
            "prod" => Ok(Env::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

impl Env {
    pub fn addr(&self) -> SocketAddr {
        match self {
            Env::Local => SocketAddr::from(([127, 0, 0, 1], 8000)),
            Env::Dev | Env::Stage | Env::Production => SocketAddr::from(([0, 0, 0, 0], 8000)),
        }
    }

    pub fn allow_origin(&self) -> AllowOrigin {
        match self {
            Env::Local | Env::Dev => AllowOrigin::any(),
            Env::Stage | Env::Production => {
                let origins = env::var("ALLOW_ORIGIN")
                    .unwrap_or_default()
                    .split(',')
                    .filter_map(|o| HeaderValue::from_str(o.trim()).ok())
                    .collect::<Vec<HeaderValue>>();
                AllowOrigin::list(origins)
            }
        }
    }

    pub fn allow_methods(&self) -> AllowMethods {
        AllowMethods::any()
    }

    pub fn allow_headers(&self) -> AllowHeaders {
        AllowHeaders::any()
    }
}

/// Knobs of the view-state layer itself, independent of any backend.
#[derive(Clone)]
pub struct AppConfig {
    pub feed_page_size: usize,
    pub suggestion_limit: usize,
    pub local_offset: FixedOffset,
    /// Sessions not seen for this long are closed.
    pub session_idle: chrono::Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed_page_size: 10,
            suggestion_limit: 5,
            local_offset: Utc.fix(),
            session_idle: chrono::Duration::minutes(30),
        }
    }
}

impl AppConfig {
    pub fn env() -> Self {
        let default = Self::default();

        let feed_page_size = parse_var("FEED_PAGE_SIZE")
            .filter(|size| *size > 0)
            .unwrap_or(default.feed_page_size);
        let suggestion_limit =
            parse_var("SUGGESTION_LIMIT").unwrap_or(default.suggestion_limit);
        let local_offset = parse_var::<i32>("LOCAL_UTC_OFFSET_MINUTES")
            .and_then(|minutes| FixedOffset::east_opt(minutes * 60))
            .unwrap_or(default.local_offset);
        let session_idle = parse_var::<i64>("SESSION_IDLE_MINUTES")
            .filter(|minutes| *minutes > 0)
            .map(chrono::Duration::minutes)
            .unwrap_or(default.session_idle);

        Self {
            feed_page_size,
            suggestion_limit,
            local_offset,
            session_idle,
        }
    }
}

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring invalid {key}: {raw}");
            None
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub env: Env,
    pub app: AppConfig,

    pub pg: db::Config,
    pub redis: cache::Config,
    pub pubsub: pubsub::Config,
}

impl Default for Config {
    fn default() -> Self {
        dotenv().ok();

        init_logger();

        let env = parse_var::<Env>("ENV").unwrap_or(Env::Local);

        Self {
            env,
            app: AppConfig::env(),
            pg: db::Config::env().unwrap_or_default(),
            redis: cache::Config::env().unwrap_or_default(),
            pubsub: pubsub::Config::env().unwrap_or_default(),
        }
    }
}

fn init_logger() {
    let rust_log = env::var("RUST_LOG").unwrap_or("info".into());
    let level = LevelFilter::from_str(&rust_log).unwrap_or(LevelFilter::Info);
    let log_file = env::var("SERVICE_NAME")
        .map(|pkg| format!("{pkg}.log"))
        .unwrap_or("service.log".into());

    CombinedLogger::init(vec![
        TermLogger::new(
            level,
            simplelog::Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(
            level,
            simplelog::Config::default(),
            File::create(log_file).expect("Failed to create log file"),
        ),
    ])
    .expect("Failed to initialize logger");
}
