use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use async_trait::async_trait;

use crate::user;

/// Resolves a whole set of keys with a single backend round-trip.
#[async_trait]
pub trait BatchLoader: Send + Sync {
    type Key: Clone + Eq + Hash + Send + Sync;
    type Value: Send;

    async fn fetch(&self, keys: &[Self::Key]) -> user::Result<HashMap<Self::Key, Self::Value>>;
}

/// Deduplicates `keys` and resolves them in one batch. No query is issued for
/// an empty key set.
pub async fn load<L, I>(loader: &L, keys: I) -> user::Result<HashMap<L::Key, L::Value>>
where
    L: BatchLoader + ?Sized,
    I: IntoIterator<Item = L::Key>,
{
    let keys = keys
        .into_iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();

    if keys.is_empty() {
        return Ok(HashMap::new());
    }

    loader.fetch(&keys).await
}

pub struct RoleLoader {
    repo: user::Repository,
}

impl RoleLoader {
    pub fn new(repo: user::Repository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl BatchLoader for RoleLoader {
    type Key = user::Id;
    type Value = Vec<String>;

    async fn fetch(&self, keys: &[user::Id]) -> user::Result<HashMap<user::Id, Vec<String>>> {
        self.repo.find_roles(keys).await
    }
}

pub struct BadgeLoader {
    repo: user::Repository,
}

impl BadgeLoader {
    pub fn new(repo: user::Repository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl BatchLoader for BadgeLoader {
    type Key = user::Id;
    type Value = Vec<String>;

    async fn fetch(&self, keys: &[user::Id]) -> user::Result<HashMap<user::Id, Vec<String>>> {
        self.repo.find_badges(keys).await
    }
}
