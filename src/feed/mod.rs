use std::fmt::Display;
use std::str::FromStr;

use axum::{
    Router,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{connection, post as posts, state::AppState, user};

mod handler;
pub mod model;
pub mod paginator;

pub type Result<T> = std::result::Result<T, Error>;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/feed", get(handler::api::reset))
        .route("/feed/more", post(handler::api::load_more))
        .with_state(s)
}

/// Mutually exclusive feed selections.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Hash, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Filter {
    #[default]
    All,
    Connections,
    MyPosts,
}

impl Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::All => write!(f, "all"),
            Filter::Connections => write!(f, "connections"),
            Filter::MyPosts => write!(f, "my-posts"),
        }
    }
}

impl FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all" => Ok(Filter::All),
            "connections" => Ok(Filter::Connections),
            "my-posts" => Ok(Filter::MyPosts),
            other => Err(Error::UnknownFilter(other.to_owned())),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unknown feed filter: {0}")]
    UnknownFilter(String),

    #[error(transparent)]
    _Post(#[from] posts::Error),
    #[error(transparent)]
    _Connection(#[from] connection::Error),
    #[error(transparent)]
    _User(#[from] user::Error),
}
