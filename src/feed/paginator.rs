use std::sync::Arc;

use log::{debug, error};
use tokio::sync::RwLock;

use crate::loader::{self, BatchLoader};
use crate::post::model::PageQuery;
use crate::{Clock, connection, post, user};

use super::Filter;
use super::model::{FeedItem, Page, Phase};

pub type AuthorLoader = Arc<dyn BatchLoader<Key = user::Id, Value = Vec<String>>>;

#[derive(Default)]
struct State {
    filter: Filter,
    items: Vec<FeedItem>,
    has_more: bool,
    phase: Phase,
    /// Bumped by every reset. Results fetched under an older value are stale.
    generation: u64,
}

/// Offset-paginated feed of one signed-in user.
pub struct FeedPaginator {
    viewer: user::Id,
    posts: post::Repository,
    connections: connection::Repository,
    roles: AuthorLoader,
    badges: AuthorLoader,
    page_size: usize,
    clock: Clock,
    state: RwLock<State>,
}

impl FeedPaginator {
    pub fn new(
        viewer: user::Id,
        posts: post::Repository,
        connections: connection::Repository,
        roles: AuthorLoader,
        badges: AuthorLoader,
        page_size: usize,
        clock: Clock,
    ) -> Self {
        Self {
            viewer,
            posts,
            connections,
            roles,
            badges,
            page_size,
            clock,
            state: RwLock::new(State::default()),
        }
    }

    pub async fn set_filter(&self, filter: Filter) -> super::Result<()> {
        self.state.write().await.filter = filter;
        self.refresh().await
    }

    /// Reloads the first page for the current filter.
    ///
    /// A reset may overlap a load-more and always wins. Among overlapping
    /// resets only the latest issued one is applied.
    pub async fn refresh(&self) -> super::Result<()> {
        let (generation, filter) = {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.phase = Phase::Loading;
            (state.generation, state.filter)
        };

        let fetched = self.fetch(filter, 0).await;

        let mut state = self.state.write().await;
        if state.generation != generation {
            debug!("discarding superseded feed reset #{generation}");
            return Ok(());
        }

        state.phase = Phase::Idle;
        match fetched {
            Ok(page) => {
                state.has_more = page.len() == self.page_size;
                state.items = page;
                Ok(())
            }
            Err(e) => {
                error!("could not load feed for {}: {e:?}", self.viewer);
                state.items.clear();
                state.has_more = false;
                Err(e)
            }
        }
    }

    /// Appends the next page. Returns `false` if nothing was appended because
    /// another fetch was running, the end was reached, or a reset overtook it.
    pub async fn load_more(&self) -> super::Result<bool> {
        let (generation, filter, offset) = {
            let mut state = self.state.write().await;
            if state.phase != Phase::Idle || !state.has_more {
                return Ok(false);
            }
            state.phase = Phase::LoadingMore;
            (state.generation, state.filter, state.items.len())
        };

        let fetched = self.fetch(filter, offset).await;

        let mut state = self.state.write().await;
        if state.generation != generation {
            debug!("discarding page at offset {offset}: feed was reset meanwhile");
            return Ok(false);
        }

        state.phase = Phase::Idle;
        match fetched {
            Ok(page) => {
                state.has_more = page.len() == self.page_size;
                state.items.extend(page);
                Ok(true)
            }
            Err(e) => {
                error!("could not load more feed for {}: {e:?}", self.viewer);
                Err(e)
            }
        }
    }

    pub async fn page(&self) -> Page {
        let state = self.state.read().await;
        Page {
            filter: state.filter,
            items: state.items.clone(),
            has_more: state.has_more,
            phase: state.phase,
        }
    }

    pub async fn posts(&self) -> Vec<FeedItem> {
        self.state.read().await.items.clone()
    }

    pub async fn has_more(&self) -> bool {
        self.state.read().await.has_more
    }

    pub async fn filter(&self) -> Filter {
        self.state.read().await.filter
    }

    pub async fn phase(&self) -> Phase {
        self.state.read().await.phase
    }
}

impl FeedPaginator {
    async fn fetch(&self, filter: Filter, offset: usize) -> super::Result<Vec<FeedItem>> {
        let authors = match filter {
            Filter::All => None,
            Filter::MyPosts => Some(vec![self.viewer]),
            Filter::Connections => {
                let connected = self.connections.find_connected_ids(&self.viewer).await?;
                if connected.is_empty() {
                    return Ok(vec![]);
                }
                Some(connected)
            }
        };

        let query = PageQuery {
            authors,
            offset,
            limit: self.page_size,
            now: (self.clock)(),
        };
        let posts = self.posts.find_page(&query).await?;

        let authors = posts.iter().map(|p| p.author).collect::<Vec<_>>();
        let roles = loader::load(self.roles.as_ref(), authors.iter().copied()).await?;
        let badges = loader::load(self.badges.as_ref(), authors).await?;

        let items = posts
            .into_iter()
            .map(|post| FeedItem {
                author_roles: roles.get(&post.author).cloned().unwrap_or_default(),
                author_badges: badges.get(&post.author).cloned().unwrap_or_default(),
                post,
            })
            .collect();
        Ok(items)
    }
}
