use std::collections::HashSet;

use async_trait::async_trait;
use log::debug;

use crate::{connection, user};

use super::View;
use super::scorer::{self, Suggestion};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SuggestionService {
    /// People `viewer` may know, best first. `limit` falls back to the configured default.
    async fn suggest(
        &self,
        viewer: &user::Id,
        view: View,
        limit: Option<usize>,
    ) -> super::Result<Vec<Suggestion>>;
}

#[derive(Clone)]
pub struct SuggestionServiceImpl {
    user_service: user::Service,
    user_repo: user::Repository,
    connection_repo: connection::Repository,
    default_limit: usize,
}

impl SuggestionServiceImpl {
    pub fn new(
        user_service: user::Service,
        user_repo: user::Repository,
        connection_repo: connection::Repository,
        default_limit: usize,
    ) -> Self {
        Self {
            user_service,
            user_repo,
            connection_repo,
            default_limit,
        }
    }
}

#[async_trait]
impl SuggestionService for SuggestionServiceImpl {
    async fn suggest(
        &self,
        viewer: &user::Id,
        view: View,
        limit: Option<usize>,
    ) -> super::Result<Vec<Suggestion>> {
        let me = self.user_service.find_profile(viewer).await?;
        let connected = self.connection_repo.find_connected_ids(viewer).await?;

        let exclude = std::iter::once(*viewer)
            .chain(connected.iter().copied())
            .collect::<Vec<_>>();
        let candidates = self.user_service.find_candidates(&exclude).await?;
        let connected = connected.into_iter().collect::<HashSet<_>>();

        let referrers = match view {
            View::Widget => HashSet::new(),
            View::Hub => {
                let ids = candidates.iter().map(|c| c.id).collect::<Vec<_>>();
                if ids.is_empty() {
                    HashSet::new()
                } else {
                    self.user_repo.find_referrers(&ids).await?
                }
            }
        };

        let limit = limit.unwrap_or(self.default_limit);
        debug!(
            "ranking {} candidates for {viewer} ({view:?}, limit {limit})",
            candidates.len()
        );
        Ok(scorer::rank(&me, candidates, &connected, &referrers, limit))
    }
}
