use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::user;

use super::{Context, Handle, Session, realtime};

struct Entry {
    session: Handle,
    realtime: JoinHandle<()>,
    last_seen: DateTime<Utc>,
}

impl Entry {
    /// Stops the realtime task and waits for it to drop its session handle
    /// and subscriptions.
    async fn shutdown(self) {
        self.realtime.abort();
        match self.realtime.await {
            Err(e) if !e.is_cancelled() => {
                warn!("realtime task of {} failed: {e:?}", self.session.viewer());
            }
            _ => {}
        }
    }
}

/// Live sessions, one per signed-in user, created on first request and
/// released on close or after staying idle.
pub struct SessionRegistry {
    ctx: Context,
    sessions: RwLock<HashMap<user::Id, Entry>>,
}

impl SessionRegistry {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn find(&self, viewer: &user::Id) -> Option<Handle> {
        self.sessions
            .read()
            .await
            .get(viewer)
            .map(|e| e.session.clone())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Returns the viewer's session, opening it if needed, and records the
    /// access for idle eviction.
    pub async fn get_or_open(&self, viewer: user::Id) -> Handle {
        let now = (self.ctx.clock)();

        let session = {
            let mut sessions = self.sessions.write().await;
            if let Some(entry) = sessions.get_mut(&viewer) {
                entry.last_seen = now;
                return entry.session.clone();
            }

            let session = Arc::new(Session::new(viewer, &self.ctx));
            let realtime = realtime::spawn(session.clone(), self.ctx.events.clone());
            sessions.insert(
                viewer,
                Entry {
                    session: session.clone(),
                    realtime,
                    last_seen: now,
                },
            );
            session
        };
        debug!("opened session for {viewer}");

        if let Err(e) = session.conversations().refetch().await {
            warn!("initial conversation fetch for {viewer} failed: {e:?}");
        }
        session
    }

    pub async fn close(&self, viewer: &user::Id) -> bool {
        let removed = self.sessions.write().await.remove(viewer);
        match removed {
            Some(entry) => {
                entry.shutdown().await;
                debug!("closed session for {viewer}");
                true
            }
            None => false,
        }
    }

    /// Closes every session not seen for longer than `max_idle`.
    /// Returns how many were closed.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = (self.ctx.clock)();

        let stale = {
            let mut sessions = self.sessions.write().await;
            let ids = sessions
                .iter()
                .filter(|(_, e)| now - e.last_seen > max_idle)
                .map(|(id, _)| *id)
                .collect::<Vec<_>>();
            ids.iter()
                .filter_map(|id| sessions.remove(id))
                .collect::<Vec<_>>()
        };

        let evicted = stale.len();
        for entry in stale {
            entry.shutdown().await;
        }
        if evicted > 0 {
            info!("evicted {evicted} idle sessions");
        }
        evicted
    }

    /// Runs [`Self::evict_idle`] every `every` until the registry is dropped.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        every: std::time::Duration,
        max_idle: Duration,
    ) -> JoinHandle<()> {
        let registry = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(every);
            ticks.tick().await;
            loop {
                ticks.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                registry.evict_idle(max_idle).await;
            }
        })
    }
}
