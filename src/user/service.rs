use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use log::debug;

use crate::integration::cache;

use super::model::Profile;
use super::{Id, Repository};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserService {
    async fn find_profile(&self, id: &Id) -> super::Result<Profile>;

    async fn find_profiles(&self, ids: &HashSet<Id>) -> super::Result<HashMap<Id, Profile>>;

    async fn find_candidates(&self, exclude: &[Id]) -> super::Result<Vec<Profile>>;
}

#[derive(Clone)]
pub struct UserServiceImpl {
    repo: Repository,
    redis: cache::Redis,
}

impl UserServiceImpl {
    pub fn new(repo: Repository, redis: cache::Redis) -> Self {
        Self { repo, redis }
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn find_profile(&self, id: &Id) -> super::Result<Profile> {
        if let Some(profile) = self.find_cached_profile(id).await {
            return Ok(profile);
        }

        let profile = self.repo.find_by_id(id).await?;
        self.cache_profile(&profile).await;
        Ok(profile)
    }

    async fn find_profiles(&self, ids: &HashSet<Id>) -> super::Result<HashMap<Id, Profile>> {
        let mut found = HashMap::with_capacity(ids.len());
        let mut missing = Vec::new();

        for id in ids {
            match self.find_cached_profile(id).await {
                Some(p) => {
                    found.insert(*id, p);
                }
                None => missing.push(*id),
            }
        }

        if !missing.is_empty() {
            debug!("{} of {} profiles not cached", missing.len(), ids.len());
            for p in self.repo.find_by_ids(&missing).await? {
                self.cache_profile(&p).await;
                found.insert(p.id, p);
            }
        }

        Ok(found)
    }

    async fn find_candidates(&self, exclude: &[Id]) -> super::Result<Vec<Profile>> {
        self.repo.find_candidates(exclude).await
    }
}

// cache operations
impl UserServiceImpl {
    async fn cache_profile(&self, profile: &Profile) {
        self.redis
            .json_set_ex(cache::Key::Profile(profile.id), profile)
            .await;
    }

    async fn find_cached_profile(&self, id: &Id) -> Option<Profile> {
        self.redis.json_get(cache::Key::Profile(*id)).await
    }
}
