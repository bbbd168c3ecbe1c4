use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{conversation, state::AppState};

pub mod composer;
mod handler;
pub mod model;
pub mod repository;
pub mod store;

pub type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn repository::MessageRepository + Send + Sync>;

/// Longest accepted message body, in characters, after trimming.
pub const MAX_CONTENT_LENGTH: usize = 4000;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route(
            "/conversations/{key}/messages",
            get(handler::api::open).post(handler::api::send),
        )
        .route("/conversations/{key}/hide", post(handler::api::hide_before))
        .route("/messages/{id}", delete(handler::api::delete))
        .with_state(s)
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, Hash, PartialEq, Eq)]
#[serde(transparent)]
pub struct Id(Uuid);

impl Id {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn get(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for Id {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("message not found: {0}")]
    NotFound(Id),
    #[error("message is empty")]
    Empty,
    #[error("message is too long: {0} characters")]
    TooLong(usize),
    #[error("no conversation is open")]
    NoActiveConversation,

    #[error(transparent)]
    _Conversation(#[from] conversation::Error),
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
    #[error(transparent)]
    _Join(#[from] tokio::task::JoinError),
}
