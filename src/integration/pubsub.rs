use std::env;

use log::warn;

use crate::{event, integration};

#[derive(Clone)]
pub struct Config {
    host: String,
    port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 4222,
        }
    }
}

impl Config {
    pub fn env() -> Option<Self> {
        let host = env::var("NATS_HOST").ok();
        let port = env::var("NATS_PORT")
            .unwrap_or_else(|_| "4222".to_string())
            .parse()
            .ok();

        if let (Some(host), Some(port)) = (host, port) {
            Some(Self { host, port })
        } else {
            warn!("NATS env is not configured");
            None
        }
    }

    pub async fn connect(&self) -> integration::Result<async_nats::Client> {
        let con = async_nats::connect(format!("{}:{}", self.host, self.port)).await?;
        Ok(con)
    }
}

impl async_nats::subject::ToSubject for &event::Subject<'_> {
    fn to_subject(&self) -> async_nats::Subject {
        self.to_string().into()
    }
}
