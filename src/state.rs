use std::sync::Arc;

use axum::extract::FromRef;

use crate::connection::{repository::PgConnectionRepository, service::ConnectionServiceImpl};
use crate::conversation::repository::PgConversationRepository;
use crate::event::service::NatsEventService;
use crate::integration::{self, cache, db};
use crate::message::repository::PgMessageRepository;
use crate::post::repository::PgPostRepository;
use crate::session::{self, registry::SessionRegistry};
use crate::suggestion::service::SuggestionServiceImpl;
use crate::user::{repository::PgUserRepository, service::UserServiceImpl};
use crate::{connection, conversation, event, message, post, suggestion, system_clock, user};

const SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

#[derive(Clone, FromRef)]
pub struct AppState {
    pub user_service: user::Service,
    pub connection_service: connection::Service,
    pub suggestion_service: suggestion::Service,
    pub sessions: session::Registry,
}

impl AppState {
    pub async fn init(config: &integration::Config) -> integration::Result<Self> {
        let pool: db::Pool = config.pg.connect()?;
        let redis: cache::Redis = config.redis.connect().await?;
        let pubsub = config.pubsub.connect().await?;

        let user_repo: user::Repository = Arc::new(PgUserRepository::new(pool.clone()));
        let connection_repo: connection::Repository =
            Arc::new(PgConnectionRepository::new(pool.clone()));
        let conversation_repo: conversation::Repository =
            Arc::new(PgConversationRepository::new(pool.clone()));
        let message_repo: message::Repository = Arc::new(PgMessageRepository::new(pool.clone()));
        let post_repo: post::Repository = Arc::new(PgPostRepository::new(pool));
        let events: event::Service = Arc::new(NatsEventService::new(pubsub));

        let user_service: user::Service =
            Arc::new(UserServiceImpl::new(user_repo.clone(), redis));
        let connection_service: connection::Service =
            Arc::new(ConnectionServiceImpl::new(connection_repo.clone()));
        let suggestion_service: suggestion::Service = Arc::new(SuggestionServiceImpl::new(
            user_service.clone(),
            user_repo.clone(),
            connection_repo.clone(),
            config.app.suggestion_limit,
        ));

        let sessions: session::Registry = Arc::new(SessionRegistry::new(session::Context {
            user_service: user_service.clone(),
            user_repo,
            connection_repo,
            conversation_repo,
            message_repo,
            post_repo,
            events,
            app: config.app.clone(),
            clock: system_clock(),
        }));

        sessions.spawn_sweeper(SWEEP_INTERVAL, config.app.session_idle);

        Ok(Self {
            user_service,
            connection_service,
            suggestion_service,
            sessions,
        })
    }
}
