use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use log::{debug, warn};

use crate::conversation::{Key, store::ConversationStore};
use crate::event::{Event, Subject};
use crate::feed::paginator::FeedPaginator;
use crate::integration::AppConfig;
use crate::loader::{BadgeLoader, RoleLoader};
use crate::message::composer::Composer;
use crate::message::model::{Draft, SendOutcome, TimelineItem};
use crate::message::store::MessageStore;
use crate::{Clock, connection, conversation, event, message, post, user};

pub mod middleware;
mod realtime;
pub mod registry;

pub type Handle = Arc<Session>;
pub type Registry = Arc<registry::SessionRegistry>;

/// Header carrying the caller's user id, asserted by the upstream auth gateway.
pub const IDENTITY_HEADER: &str = "x-user-id";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("missing {IDENTITY_HEADER} header")]
    MissingIdentity,
    #[error("invalid user id: {0}")]
    InvalidIdentity(String),
}

/// Collaborators shared by every session.
#[derive(Clone)]
pub struct Context {
    pub user_service: user::Service,
    pub user_repo: user::Repository,
    pub connection_repo: connection::Repository,
    pub conversation_repo: conversation::Repository,
    pub message_repo: message::Repository,
    pub post_repo: post::Repository,
    pub events: event::Service,
    pub app: AppConfig,
    pub clock: Clock,
}

/// View state of one signed-in user: conversation list, the open
/// conversation with its composer, and the feed.
pub struct Session {
    viewer: user::Id,
    conversations: ConversationStore,
    messages: MessageStore,
    composer: Composer,
    feed: FeedPaginator,
    events: event::Service,
}

impl Session {
    pub fn new(viewer: user::Id, ctx: &Context) -> Self {
        Self {
            viewer,
            conversations: ConversationStore::new(
                Some(viewer),
                ctx.conversation_repo.clone(),
                ctx.message_repo.clone(),
                ctx.user_service.clone(),
                ctx.clock.clone(),
            ),
            messages: MessageStore::new(
                viewer,
                ctx.message_repo.clone(),
                ctx.conversation_repo.clone(),
                ctx.app.local_offset,
                ctx.clock.clone(),
            ),
            composer: Composer::default(),
            feed: FeedPaginator::new(
                viewer,
                ctx.post_repo.clone(),
                ctx.connection_repo.clone(),
                Arc::new(RoleLoader::new(ctx.user_repo.clone())),
                Arc::new(BadgeLoader::new(ctx.user_repo.clone())),
                ctx.app.feed_page_size,
                ctx.clock.clone(),
            ),
            events: ctx.events.clone(),
        }
    }

    pub fn viewer(&self) -> &user::Id {
        &self.viewer
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub fn messages(&self) -> &MessageStore {
        &self.messages
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn feed(&self) -> &FeedPaginator {
        &self.feed
    }
}

impl Session {
    pub async fn open(&self, key: Key) -> message::Result<Vec<TimelineItem>> {
        self.messages.open(key).await?;
        Ok(self.messages.timeline().await)
    }

    /// Sends through the composer. On success the composer is cleared, the
    /// other participants are notified and the conversation list is refreshed.
    /// On failure the draft stays in the composer.
    pub async fn send(&self, key: Key, draft: Draft) -> SendOutcome {
        self.composer.stage(draft.clone()).await;

        if let Err(e) = self.ensure_open(key).await {
            return self.composer.settle(Err(e)).await;
        }

        let sent = self.messages.send(draft).await;
        if let Ok(message) = &sent {
            self.announce(
                &key,
                &Event::NewMessage {
                    message: message.clone(),
                },
            )
            .await;
            self.refetch_conversations().await;
        }

        self.composer.settle(sent).await
    }

    pub async fn delete_message(&self, id: &message::Id) -> message::Result<()> {
        self.messages.delete(id).await?;

        if let Some(key) = self.messages.active().await {
            self.announce(&key, &Event::MessageDeleted { id: *id }).await;
        }
        self.refetch_conversations().await;
        Ok(())
    }

    pub async fn hide_before(&self, key: Key, cutoff: NaiveDate) -> message::Result<usize> {
        self.ensure_open(key).await?;
        let hidden = self.messages.hide_before(cutoff).await?;
        self.refetch_conversations().await;
        Ok(hidden)
    }

    pub async fn mark_as_read(&self, key: &Key) -> message::Result<()> {
        self.conversations.mark_conversation_as_read_locally(key).await;
        self.messages.mark_conversation_as_read(key).await
    }

    /// Merges a realtime event into the session state.
    pub async fn apply(&self, event: Event) {
        debug!("{} received {event:?}", self.viewer);
        match event {
            Event::NewMessage { message } => {
                self.messages.apply_incoming(message).await;
                self.refetch_conversations().await;
            }
            Event::MessageDeleted { id } => {
                self.messages.remove(&id).await;
                self.refetch_conversations().await;
            }
            Event::PostChanged { .. } => {
                if let Err(e) = self.feed.refresh().await {
                    warn!("feed reset after post change failed: {e:?}");
                }
            }
        }
    }
}

impl Session {
    async fn ensure_open(&self, key: Key) -> message::Result<()> {
        if self.messages.active().await == Some(key) {
            return Ok(());
        }
        self.messages.open(key).await
    }

    async fn refetch_conversations(&self) {
        if let Err(e) = self.conversations.refetch().await {
            warn!("conversation refetch for {} failed: {e:?}", self.viewer);
        }
    }

    async fn recipients(&self, key: &Key) -> Vec<user::Id> {
        match key {
            Key::Direct(counterpart) => vec![*counterpart],
            Key::Group(_) => {
                if self.conversations.find(key).await.is_none() {
                    self.refetch_conversations().await;
                }
                self.conversations
                    .find(key)
                    .await
                    .map(|c| c.participants)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|p| *p != self.viewer)
                    .collect()
            }
        }
    }

    async fn announce(&self, key: &Key, event: &Event) {
        let recipients = self.recipients(key).await;
        let subjects = recipients.iter().map(Subject::Messages).collect::<Vec<_>>();
        join_all(subjects.iter().map(|s| self.events.publish(s, event))).await;
    }
}
