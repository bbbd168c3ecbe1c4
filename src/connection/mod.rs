use std::fmt::Display;
use std::sync::Arc;

use axum::{
    Router,
    routing::{post, put},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{state::AppState, user};

mod handler;
pub mod model;
pub mod repository;
pub mod service;

pub type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn repository::ConnectionRepository + Send + Sync>;
pub type Service = Arc<dyn service::ConnectionService + Send + Sync>;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/connections", post(handler::api::request))
        .route("/connections/{id}/accept", put(handler::api::accept))
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

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Accepted,
}

impl Status {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Accepted => "accepted",
        }
    }
}

impl TryFrom<&str> for Status {
    type Error = Error;

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s {
            "pending" => Ok(Status::Pending),
            "accepted" => Ok(Status::Accepted),
            other => Err(Error::UnknownStatus(other.to_owned())),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("connection not found: {0}")]
    NotFound(Id),
    #[error("connection between {0} and {1} already exists")]
    AlreadyExists(user::Id, user::Id),
    #[error("cannot connect with oneself")]
    SelfReference,
    #[error("only the addressee can accept a connection")]
    NotAddressee,
    #[error("unknown connection status: {0}")]
    UnknownStatus(String),

    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
    #[error(transparent)]
    _Join(#[from] tokio::task::JoinError),
}
