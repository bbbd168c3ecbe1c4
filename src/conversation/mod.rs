use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{message, state::AppState, user};

mod handler;
pub mod model;
pub mod overlay;
pub mod repository;
pub mod store;

pub type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn repository::ConversationRepository + Send + Sync>;

/// Prefix that keeps group thread keys apart from direct counterpart ids.
pub const GROUP_PREFIX: &str = "group_";

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/conversations", get(handler::api::find_all))
        .route("/conversations/refetch", post(handler::api::refetch))
        .route(
            "/conversations/direct/{user_id}",
            post(handler::api::start_direct),
        )
        .route("/conversations/{key}/read", put(handler::api::mark_as_read))
        .route("/threads/{id}/name", put(handler::api::rename))
        .with_state(s)
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, Hash, PartialEq, Eq)]
#[serde(transparent)]
pub struct ThreadId(Uuid);

impl ThreadId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn get(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for ThreadId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a conversation: the counterpart of a direct chat or a group thread.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Key {
    Direct(user::Id),
    Group(ThreadId),
}

impl Key {
    pub const fn is_group(&self) -> bool {
        matches!(self, Key::Group(_))
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Direct(id) => write!(f, "{id}"),
            Key::Group(id) => write!(f, "{GROUP_PREFIX}{id}"),
        }
    }
}

impl FromStr for Key {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = |_| Error::InvalidKey(s.to_owned());
        match s.strip_prefix(GROUP_PREFIX) {
            Some(thread) => Uuid::parse_str(thread)
                .map(|id| Key::Group(id.into()))
                .map_err(invalid),
            None => Uuid::parse_str(s)
                .map(|id| Key::Direct(id.into()))
                .map_err(invalid),
        }
    }
}

impl Serialize for Key {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Key, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid conversation key: {0}")]
    InvalidKey(String),
    #[error("thread not found: {0}")]
    ThreadNotFound(ThreadId),
    #[error("group name must not be empty")]
    MissingName,
    #[error("no signed-in user")]
    NoViewer,
    #[error("cannot start a conversation with oneself")]
    SelfConversation,

    #[error(transparent)]
    _User(#[from] user::Error),
    #[error(transparent)]
    _Message(#[from] Box<message::Error>),
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
    #[error(transparent)]
    _Join(#[from] tokio::task::JoinError),
}

impl From<message::Error> for Error {
    fn from(e: message::Error) -> Self {
        Self::_Message(Box::new(e))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_round_trip_group_key_through_prefix() {
        let thread = ThreadId::random();
        let key = Key::Group(thread);

        let text = key.to_string();

        assert!(text.starts_with(GROUP_PREFIX));
        assert_eq!(text.parse::<Key>().unwrap(), key);
    }

    #[test]
    fn should_parse_bare_uuid_as_direct() {
        let user = user::Id::random();

        let key: Key = user.to_string().parse().unwrap();

        assert_eq!(key, Key::Direct(user));
        assert!(!key.is_group());
    }

    #[test]
    fn should_reject_garbage() {
        assert!(matches!(
            "group_nope".parse::<Key>(),
            Err(Error::InvalidKey(_))
        ));
        assert!(matches!("nope".parse::<Key>(), Err(Error::InvalidKey(_))));
    }
}
