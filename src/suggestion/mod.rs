use std::sync::Arc;

use axum::{Router, routing::get};
use serde::{Deserialize, Serialize};

use crate::{connection, state::AppState, user};

mod handler;
pub mod scorer;
pub mod service;

pub type Result<T> = std::result::Result<T, Error>;
pub type Service = Arc<dyn service::SuggestionService + Send + Sync>;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/suggestions", get(handler::api::find_all))
        .with_state(s)
}

/// Where suggestions are shown. The hub view also rewards successful referrers.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Widget,
    Hub,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    _User(#[from] user::Error),
    #[error(transparent)]
    _Connection(#[from] connection::Error),
}
