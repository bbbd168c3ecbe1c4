use std::fmt::Display;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::message::{self, model::Message};
use crate::{post, user};

pub mod service;

pub type Result<T> = std::result::Result<T, Error>;
pub type Service = Arc<dyn service::EventService + Send + Sync>;
pub type EventStream = Pin<Box<dyn tokio_stream::Stream<Item = Event> + Send>>;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    NewMessage { message: Message },
    MessageDeleted { id: message::Id },
    PostChanged { id: post::Id },
}

pub enum Subject<'a> {
    /// Everything addressed to one user's conversations.
    Messages(&'a user::Id),
    Posts,
}

impl Display for Subject<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subject::Messages(id) => write!(f, "messages.{id}"),
            Subject::Posts => write!(f, "posts"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    _Subscribe(#[from] async_nats::SubscribeError),
    #[error(transparent)]
    _Publish(#[from] async_nats::PublishError),
    #[error(transparent)]
    _ParseJson(#[from] serde_json::Error),
}
