use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};

use crate::state::AppState;

pub mod connection;
pub mod conversation;
pub mod error;
pub mod event;
pub mod feed;
pub mod integration;
pub mod loader;
pub mod message;
pub mod post;
pub mod schema;
pub mod session;
pub mod state;
pub mod suggestion;
pub mod user;

pub type Result<T> = std::result::Result<T, error::Error>;

/// Source of "now". Swapped out in tests to move time forward.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Every route of the service, all behind the identity middleware.
pub fn api<S>(state: AppState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .merge(user::api(state.clone()))
        .merge(connection::api(state.clone()))
        .merge(conversation::api(state.clone()))
        .merge(message::api(state.clone()))
        .merge(feed::api(state.clone()))
        .merge(suggestion::api(state.clone()))
        .layer(axum::middleware::from_fn_with_state(
            state.sessions.clone(),
            session::middleware::resolve,
        ))
}
