use std::env;
use std::fmt;

use log::error;
use redis::AsyncCommands;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::integration;
use crate::user;

const PROFILE_TTL_SECS: u64 = 3600;

#[derive(Clone)]
pub struct Config {
    host: String,
    port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 6379,
        }
    }
}

impl Config {
    pub fn env() -> integration::Result<Self> {
        let host = env::var("REDIS_HOST")?;
        let port = env::var("REDIS_PORT")?.parse()?;
        Ok(Self { host, port })
    }

    pub async fn connect(&self) -> integration::Result<Redis> {
        let con = redis::Client::open(format!("redis://{}:{}", self.host, self.port))?
            .get_connection_manager()
            .await?;
        Ok(Redis { con })
    }
}

#[derive(Clone)]
pub enum Key {
    Profile(user::Id),
}

impl Key {
    const fn ttl(&self) -> u64 {
        match self {
            Key::Profile(_) => PROFILE_TTL_SECS,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Profile(id) => write!(f, "profile:{id}"),
        }
    }
}

/// Best-effort JSON cache. Failures are logged and reported as misses.
#[derive(Clone)]
pub struct Redis {
    con: redis::aio::ConnectionManager,
}

impl Redis {
    pub async fn json_get<T: DeserializeOwned>(&self, key: Key) -> Option<T> {
        let mut con = self.con.clone();
        let raw: Option<String> = match con.get(key.to_string()).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("failed to read {key} from cache: {e:?}");
                return None;
            }
        };

        raw.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                error!("failed to decode cached {key}: {e:?}");
                None
            }
        })
    }

    pub async fn json_set_ex<T: Serialize>(&self, key: Key, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                error!("failed to encode {key} for cache: {e:?}");
                return;
            }
        };

        let mut con = self.con.clone();
        let res: redis::RedisResult<()> = con.set_ex(key.to_string(), raw, key.ttl()).await;
        if let Err(e) = res {
            error!("failed to write {key} to cache: {e:?}");
        }
    }
}
