use chrono::{FixedOffset, NaiveDate};
use log::debug;
use tokio::sync::RwLock;

use crate::conversation::{self, Key};
use crate::{Clock, user};

use super::model::{self, Draft, Message, TimelineItem};
use super::{Id, Repository};

#[derive(Default)]
struct Active {
    key: Option<Key>,
    messages: Vec<Message>,
}

/// Messages of the one conversation currently open in a session.
pub struct MessageStore {
    viewer: user::Id,
    repo: Repository,
    conversation_repo: conversation::Repository,
    offset: FixedOffset,
    clock: Clock,
    state: RwLock<Active>,
}

impl MessageStore {
    pub fn new(
        viewer: user::Id,
        repo: Repository,
        conversation_repo: conversation::Repository,
        offset: FixedOffset,
        clock: Clock,
    ) -> Self {
        Self {
            viewer,
            repo,
            conversation_repo,
            offset,
            clock,
            state: RwLock::new(Active::default()),
        }
    }

    /// Switches to `key` and loads its messages.
    pub async fn open(&self, key: Key) -> super::Result<()> {
        let messages = self.repo.find_by_key(&self.viewer, &key).await?;
        let mut state = self.state.write().await;
        state.key = Some(key);
        state.messages = messages;
        Ok(())
    }

    pub async fn reload(&self) -> super::Result<()> {
        let key = self.active().await.ok_or(super::Error::NoActiveConversation)?;
        self.open(key).await
    }

    pub async fn active(&self) -> Option<Key> {
        self.state.read().await.key
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.state.read().await.messages.clone()
    }

    pub async fn timeline(&self) -> Vec<TimelineItem> {
        model::timeline(&self.state.read().await.messages, &self.offset)
    }

    /// Validates and stores a new message in the open conversation.
    pub async fn send(&self, draft: Draft) -> super::Result<Message> {
        let key = self.active().await.ok_or(super::Error::NoActiveConversation)?;
        let draft = draft.validate()?;

        let message = Message::compose(self.viewer, &key, draft, (self.clock)());
        self.repo.insert(&message).await?;

        self.apply_incoming(message.clone()).await;
        Ok(message)
    }

    pub async fn delete(&self, id: &Id) -> super::Result<()> {
        if !self.repo.delete(&self.viewer, id).await? {
            return Err(super::Error::NotFound(*id));
        }

        self.remove(id).await;
        Ok(())
    }

    pub async fn mark_conversation_as_read(&self, key: &Key) -> super::Result<()> {
        self.conversation_repo
            .upsert_read_marker(&self.viewer, key, (self.clock)())
            .await?;
        Ok(())
    }

    /// Hides, for the viewer only, every loaded message whose local day is
    /// strictly before `cutoff`, then reloads the conversation.
    ///
    /// Returns the number of messages newly hidden.
    pub async fn hide_before(&self, cutoff: NaiveDate) -> super::Result<usize> {
        let ids = {
            let state = self.state.read().await;
            if state.key.is_none() {
                return Err(super::Error::NoActiveConversation);
            }
            state
                .messages
                .iter()
                .filter(|m| m.local_date(&self.offset) < cutoff)
                .map(|m| m.id)
                .collect::<Vec<_>>()
        };

        let hidden = if ids.is_empty() {
            0
        } else {
            self.repo.hide(&self.viewer, &ids).await?
        };
        debug!("{} hid {hidden} messages before {cutoff}", self.viewer);

        self.reload().await?;
        Ok(hidden)
    }

    /// Merges a message pushed from elsewhere (or just sent) into the open
    /// conversation, keeping chronological order. Returns `false` when it
    /// belongs to another conversation or is already present.
    pub async fn apply_incoming(&self, message: Message) -> bool {
        let mut state = self.state.write().await;
        if state.key.is_none() || message.key_for(&self.viewer) != state.key {
            return false;
        }

        if state.messages.iter().any(|m| m.id == message.id) {
            return false;
        }

        let pos = state
            .messages
            .partition_point(|m| m.created_at <= message.created_at);
        state.messages.insert(pos, message);
        true
    }

    pub async fn remove(&self, id: &Id) -> bool {
        let mut state = self.state.write().await;
        let before = state.messages.len();
        state.messages.retain(|m| m.id != *id);
        state.messages.len() != before
    }
}
