#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use tokio::sync::mpsc;

use athlete_hub::Clock;
use athlete_hub::connection::{self, repository::ConnectionRepository, model::Connection};
use athlete_hub::conversation::{
    self, Key, ThreadId, model::Thread, repository::ConversationRepository,
};
use athlete_hub::event::{self, Event, EventStream, Subject, service::EventService};
use athlete_hub::integration::AppConfig;
use athlete_hub::message::{self, model::Message, repository::MessageRepository};
use athlete_hub::post::{self, model::PageQuery, model::Post, repository::PostRepository};
use athlete_hub::session::{Context, Session, registry::SessionRegistry};
use athlete_hub::user::{
    self, model::Profile, repository::UserRepository, service::UserService,
};

#[derive(Default)]
pub struct Users {
    pub profiles: Mutex<HashMap<user::Id, Profile>>,
}

impl Users {
    pub fn add(&self, name: &str) -> user::Id {
        let id = user::Id::random();
        self.profiles
            .lock()
            .unwrap()
            .insert(id, Profile::new(id, name));
        id
    }
}

#[async_trait]
impl UserService for Users {
    async fn find_profile(&self, id: &user::Id) -> user::Result<Profile> {
        self.profiles
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or(user::Error::NotFound(*id))
    }

    async fn find_profiles(
        &self,
        ids: &HashSet<user::Id>,
    ) -> user::Result<HashMap<user::Id, Profile>> {
        let profiles = self.profiles.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| profiles.get(id).map(|p| (*id, p.clone())))
            .collect())
    }

    async fn find_candidates(&self, exclude: &[user::Id]) -> user::Result<Vec<Profile>> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .values()
            .filter(|p| !exclude.contains(&p.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserRepository for Users {
    async fn find_by_id(&self, id: &user::Id) -> user::Result<Profile> {
        self.find_profile(id).await
    }

    async fn find_by_ids(&self, ids: &[user::Id]) -> user::Result<Vec<Profile>> {
        let profiles = self.profiles.lock().unwrap();
        Ok(ids.iter().filter_map(|id| profiles.get(id).cloned()).collect())
    }

    async fn find_candidates(&self, exclude: &[user::Id]) -> user::Result<Vec<Profile>> {
        UserService::find_candidates(self, exclude).await
    }

    async fn find_roles(&self, _: &[user::Id]) -> user::Result<HashMap<user::Id, Vec<String>>> {
        Ok(HashMap::new())
    }

    async fn find_badges(&self, _: &[user::Id]) -> user::Result<HashMap<user::Id, Vec<String>>> {
        Ok(HashMap::new())
    }

    async fn find_referrers(&self, _: &[user::Id]) -> user::Result<HashSet<user::Id>> {
        Ok(HashSet::new())
    }
}

#[derive(Default)]
pub struct Connections {
    pub accepted: Mutex<Vec<(user::Id, user::Id)>>,
}

#[async_trait]
impl ConnectionRepository for Connections {
    async fn find_by_id(&self, _: &connection::Id) -> connection::Result<Option<Connection>> {
        Ok(None)
    }

    async fn find_connected_ids(&self, user: &user::Id) -> connection::Result<Vec<user::Id>> {
        Ok(self
            .accepted
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(a, b)| match (a == user, b == user) {
                (true, _) => Some(*b),
                (_, true) => Some(*a),
                _ => None,
            })
            .collect())
    }

    async fn add(&self, _: &Connection) -> connection::Result<()> {
        Ok(())
    }

    async fn update_status(&self, _: &connection::Id, _: &connection::Status) -> connection::Result<bool> {
        Ok(false)
    }
}

#[derive(Default)]
pub struct Conversations {
    pub threads: Mutex<Vec<Thread>>,
    pub markers: Mutex<HashMap<(user::Id, Key), DateTime<Utc>>>,
}

#[async_trait]
impl ConversationRepository for Conversations {
    async fn find_threads_by_member(&self, user: &user::Id) -> conversation::Result<Vec<Thread>> {
        Ok(self
            .threads
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.members.contains(user))
            .cloned()
            .collect())
    }

    async fn rename_thread(&self, id: &ThreadId, name: &str) -> conversation::Result<bool> {
        let mut threads = self.threads.lock().unwrap();
        match threads.iter_mut().find(|t| t.id == *id) {
            Some(t) => {
                t.name = name.to_owned();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_read_markers(
        &self,
        user: &user::Id,
    ) -> conversation::Result<HashMap<Key, DateTime<Utc>>> {
        Ok(self
            .markers
            .lock()
            .unwrap()
            .iter()
            .filter(|((u, _), _)| u == user)
            .map(|((_, k), at)| (*k, *at))
            .collect())
    }

    async fn upsert_read_marker(
        &self,
        user: &user::Id,
        key: &Key,
        at: DateTime<Utc>,
    ) -> conversation::Result<()> {
        self.markers.lock().unwrap().insert((*user, *key), at);
        Ok(())
    }
}

#[derive(Default)]
pub struct Messages {
    pub rows: Mutex<Vec<Message>>,
    pub hidden: Mutex<HashSet<(user::Id, message::Id)>>,
}

impl Messages {
    fn visible_to(&self, viewer: &user::Id) -> Vec<Message> {
        let hidden = self.hidden.lock().unwrap();
        let mut rows = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|m| !hidden.contains(&(*viewer, m.id)))
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by_key(|m| m.created_at);
        rows
    }
}

#[async_trait]
impl MessageRepository for Messages {
    async fn find_for_viewer(
        &self,
        viewer: &user::Id,
        threads: &[ThreadId],
    ) -> message::Result<Vec<Message>> {
        Ok(self
            .visible_to(viewer)
            .into_iter()
            .filter(|m| match m.thread {
                Some(t) => threads.contains(&t),
                None => m.sender == *viewer || m.recipient == Some(*viewer),
            })
            .collect())
    }

    async fn find_by_key(&self, viewer: &user::Id, key: &Key) -> message::Result<Vec<Message>> {
        Ok(self
            .visible_to(viewer)
            .into_iter()
            .filter(|m| match key {
                Key::Group(t) => m.thread == Some(*t),
                Key::Direct(c) => {
                    m.thread.is_none()
                        && ((m.sender == *viewer && m.recipient == Some(*c))
                            || (m.sender == *c && m.recipient == Some(*viewer)))
                }
            })
            .collect())
    }

    async fn insert(&self, message: &Message) -> message::Result<()> {
        self.rows.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn delete(&self, owner: &user::Id, id: &message::Id) -> message::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|m| !(m.id == *id && m.sender == *owner));
        Ok(rows.len() != before)
    }

    async fn hide(&self, user: &user::Id, ids: &[message::Id]) -> message::Result<usize> {
        let mut hidden = self.hidden.lock().unwrap();
        Ok(ids.iter().filter(|id| hidden.insert((*user, **id))).count())
    }
}

#[derive(Default)]
pub struct Posts {
    pub rows: Mutex<Vec<Post>>,
    pub queries: AtomicUsize,
}

#[async_trait]
impl PostRepository for Posts {
    async fn find_page(&self, query: &PageQuery) -> post::Result<Vec<Post>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let mut visible = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.is_visible_at(query.now))
            .filter(|p| {
                query
                    .authors
                    .as_ref()
                    .is_none_or(|authors| authors.contains(&p.author))
            })
            .cloned()
            .collect::<Vec<_>>();
        visible.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(visible
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }
}

/// In-memory event bus. Published events reach every open subscription of
/// the same subject and are also recorded.
#[derive(Default)]
pub struct Bus {
    pub published: Mutex<Vec<(String, Event)>>,
    subscribers: Mutex<Vec<(String, mpsc::UnboundedSender<Event>)>>,
}

impl Bus {
    /// Subscriptions whose stream is still held by someone.
    pub fn open_subscriptions(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, tx)| !tx.is_closed())
            .count()
    }
}

#[async_trait]
impl EventService for Bus {
    async fn subscribe(&self, subject: &Subject<'_>) -> event::Result<EventStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap()
            .push((subject.to_string(), tx));
        Ok(Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })))
    }

    async fn publish(&self, subject: &Subject<'_>, event: &Event) {
        let subject = subject.to_string();
        self.subscribers
            .lock()
            .unwrap()
            .retain(|(s, tx)| *s != subject || tx.send(event.clone()).is_ok());
        self.published.lock().unwrap().push((subject, event.clone()));
    }
}

/// A clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

impl ManualClock {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Utc::now())))
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }

    pub fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }

    pub fn clock(&self) -> Clock {
        let inner = self.0.clone();
        Arc::new(move || *inner.lock().unwrap())
    }
}

pub struct Backend {
    pub users: Arc<Users>,
    pub connections: Arc<Connections>,
    pub conversations: Arc<Conversations>,
    pub messages: Arc<Messages>,
    pub posts: Arc<Posts>,
    pub bus: Arc<Bus>,
    pub clock: ManualClock,
    pub page_size: usize,
}

impl Backend {
    pub fn new() -> Self {
        Self {
            users: Arc::default(),
            connections: Arc::default(),
            conversations: Arc::default(),
            messages: Arc::default(),
            posts: Arc::default(),
            bus: Arc::default(),
            clock: ManualClock::new(),
            page_size: 10,
        }
    }

    pub fn context(&self) -> Context {
        Context {
            user_service: self.users.clone(),
            user_repo: self.users.clone(),
            connection_repo: self.connections.clone(),
            conversation_repo: self.conversations.clone(),
            message_repo: self.messages.clone(),
            post_repo: self.posts.clone(),
            events: self.bus.clone(),
            app: AppConfig {
                feed_page_size: self.page_size,
                suggestion_limit: 5,
                local_offset: FixedOffset::east_opt(0).unwrap(),
                ..AppConfig::default()
            },
            clock: self.clock.clock(),
        }
    }

    pub fn session(&self, viewer: user::Id) -> Session {
        Session::new(viewer, &self.context())
    }

    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::new(SessionRegistry::new(self.context()))
    }
}

/// Polls `check` until it holds, failing the test after a second.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(std::time::Duration::from_secs(1), async {
        while !check().await {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
