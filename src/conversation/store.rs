use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use tokio::sync::RwLock;

use crate::message::model::Message;
use crate::user::model::Profile;
use crate::{Clock, message, user};

use super::model::{Conversation, Thread, UNKNOWN_NAME};
use super::overlay::ReadOverlay;
use super::{Key, Repository, ThreadId};

#[derive(Default)]
struct State {
    fetched: Vec<Conversation>,
    drafts: Vec<Conversation>,
    overlay: ReadOverlay,
    query: String,
    loading: bool,
}

/// Conversation list of one signed-in user.
pub struct ConversationStore {
    viewer: Option<user::Id>,
    repo: Repository,
    message_repo: message::Repository,
    user_service: user::Service,
    clock: Clock,
    state: RwLock<State>,
}

impl ConversationStore {
    pub fn new(
        viewer: Option<user::Id>,
        repo: Repository,
        message_repo: message::Repository,
        user_service: user::Service,
        clock: Clock,
    ) -> Self {
        Self {
            viewer,
            repo,
            message_repo,
            user_service,
            clock,
            state: RwLock::new(State::default()),
        }
    }

    /// Reloads the list from the backend.
    ///
    /// On failure the list degrades to empty and the error is handed back
    /// so the caller can surface it. There is no retry.
    pub async fn refetch(&self) -> super::Result<()> {
        let Some(viewer) = self.viewer else {
            self.state.write().await.fetched.clear();
            return Ok(());
        };

        self.state.write().await.loading = true;
        let fetched = self.fetch(&viewer).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match fetched {
            Ok(mut list) => {
                let State {
                    overlay, drafts, ..
                } = &mut *state;
                overlay.reconcile(&mut list);
                drafts.retain(|d| !list.iter().any(|c| c.key == d.key));
                debug!("fetched {} conversations for {viewer}", list.len());
                state.fetched = list;
                Ok(())
            }
            Err(e) => {
                error!("could not fetch conversations for {viewer}: {e:?}");
                state.fetched.clear();
                Err(e)
            }
        }
    }

    /// Full list: synthesized drafts first, then fetched entries by recency.
    pub async fn conversations(&self) -> Vec<Conversation> {
        let state = self.state.read().await;
        state
            .drafts
            .iter()
            .chain(state.fetched.iter())
            .cloned()
            .collect()
    }

    /// The list narrowed by the current search query. Drafts always survive.
    pub async fn filtered_conversations(&self) -> Vec<Conversation> {
        let state = self.state.read().await;
        let query = state.query.as_str();
        state
            .drafts
            .iter()
            .cloned()
            .chain(
                state
                    .fetched
                    .iter()
                    .filter(|c| query.is_empty() || c.matches(query))
                    .cloned(),
            )
            .collect()
    }

    pub async fn search(&self, query: &str) {
        self.state.write().await.query = query.trim().to_lowercase();
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn is_searching(&self) -> bool {
        !self.state.read().await.query.is_empty()
    }

    pub async fn find(&self, key: &Key) -> Option<Conversation> {
        let state = self.state.read().await;
        state
            .drafts
            .iter()
            .chain(state.fetched.iter())
            .find(|c| c.key == *key)
            .cloned()
    }

    pub async fn rename_group_chat(&self, id: &ThreadId, name: &str) -> super::Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(super::Error::MissingName);
        }

        if !self.repo.rename_thread(id, name).await? {
            return Err(super::Error::ThreadNotFound(*id));
        }

        let key = Key::Group(*id);
        let mut state = self.state.write().await;
        if let Some(c) = state.fetched.iter_mut().find(|c| c.key == key) {
            c.name = name.to_owned();
        }
        Ok(())
    }

    /// Optimistically clears the unread flag ahead of the persisted marker.
    pub async fn mark_conversation_as_read_locally(&self, key: &Key) {
        let now = (self.clock)();
        let mut state = self.state.write().await;
        state.overlay.mark(*key, now);
        if let Some(c) = state.fetched.iter_mut().find(|c| c.key == *key) {
            c.unread = false;
        }
    }

    /// Makes a direct conversation with `counterpart` available before any
    /// message exists, so it can be opened and written to.
    pub async fn start_direct(&self, counterpart: &user::Id) -> super::Result<Conversation> {
        let viewer = self.viewer.ok_or(super::Error::NoViewer)?;
        if viewer == *counterpart {
            return Err(super::Error::SelfConversation);
        }

        let key = Key::Direct(*counterpart);
        {
            let mut state = self.state.write().await;
            let existing = state
                .drafts
                .iter()
                .chain(state.fetched.iter())
                .find(|c| c.key == key)
                .cloned();
            if let Some(existing) = existing {
                return Ok(existing);
            }
            state
                .drafts
                .insert(0, Conversation::placeholder(&viewer, counterpart));
        }

        match self.user_service.find_profile(counterpart).await {
            Ok(profile) => {
                let mut state = self.state.write().await;
                if let Some(d) = state.drafts.iter_mut().find(|d| d.key == key) {
                    d.name.clone_from(&profile.full_name);
                    d.avatar.clone_from(&profile.avatar_url);
                    return Ok(d.clone());
                }

                // a refetch landed the real entry meanwhile
                let found = state.fetched.iter().find(|c| c.key == key).cloned();
                Ok(found.unwrap_or_else(|| Conversation::direct(&viewer, &profile)))
            }
            Err(e) => {
                warn!("could not resolve counterpart {counterpart}: {e:?}");
                self.state.write().await.drafts.retain(|d| d.key != key);
                Err(e.into())
            }
        }
    }
}

impl ConversationStore {
    async fn fetch(&self, viewer: &user::Id) -> super::Result<Vec<Conversation>> {
        let threads = self.repo.find_threads_by_member(viewer).await?;
        let thread_ids = threads.iter().map(|t| t.id).collect::<Vec<_>>();

        let messages = self
            .message_repo
            .find_for_viewer(viewer, &thread_ids)
            .await?;

        let counterparts = messages
            .iter()
            .filter_map(|m| match m.key_for(viewer) {
                Some(Key::Direct(id)) => Some(id),
                _ => None,
            })
            .collect::<HashSet<_>>();
        let profiles = if counterparts.is_empty() {
            HashMap::new()
        } else {
            self.user_service.find_profiles(&counterparts).await?
        };

        let markers = self.repo.find_read_markers(viewer).await?;

        Ok(assemble(viewer, &messages, &threads, &profiles, &markers))
    }
}

/// Groups messages by conversation, keeps the latest one per group as the
/// preview and orders the result by that message, most recent first.
pub fn assemble(
    viewer: &user::Id,
    messages: &[Message],
    threads: &[Thread],
    profiles: &HashMap<user::Id, Profile>,
    markers: &HashMap<Key, DateTime<Utc>>,
) -> Vec<Conversation> {
    let mut latest: HashMap<Key, &Message> = HashMap::new();
    for m in messages {
        let Some(key) = m.key_for(viewer) else {
            continue;
        };
        match latest.entry(key) {
            Entry::Occupied(mut e) => {
                if m.created_at > e.get().created_at {
                    e.insert(m);
                }
            }
            Entry::Vacant(e) => {
                e.insert(m);
            }
        }
    }

    let mut conversations = threads
        .iter()
        .map(|t| (Key::Group(t.id), Conversation::group(t)))
        .collect::<HashMap<_, _>>();

    for (key, m) in latest {
        let c = match key {
            Key::Group(_) => match conversations.get_mut(&key) {
                Some(c) => c,
                None => continue,
            },
            Key::Direct(counterpart) => {
                conversations
                    .entry(key)
                    .or_insert_with(|| match profiles.get(&counterpart) {
                        Some(p) => Conversation::direct(viewer, p),
                        None => {
                            Conversation::direct(viewer, &Profile::new(counterpart, UNKNOWN_NAME))
                        }
                    })
            }
        };

        c.last_message = Some(m.preview());
        c.last_activity = Some(m.created_at);
        c.unread = m.sender != *viewer
            && markers
                .get(&key)
                .is_none_or(|read_at| m.created_at > *read_at);
    }

    let mut list = conversations.into_values().collect::<Vec<_>>();
    list.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
    list
}
