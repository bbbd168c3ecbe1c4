use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl, SelectableHelper};
use uuid::Uuid;

use crate::integration::db::{self, Pool};
use crate::schema::{profiles, referrals, user_badges, user_roles};

use super::Id;
use super::model::{Profile, ProfileRow};

const CANDIDATE_POOL_SIZE: i64 = 200;
const ACCEPTED: &str = "accepted";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Id) -> super::Result<Profile>;

    async fn find_by_ids(&self, ids: &[Id]) -> super::Result<Vec<Profile>>;

    /// Most recent profiles not listed in `exclude`, capped to a fixed pool size.
    /// The cap applies after exclusion.
    async fn find_candidates(&self, exclude: &[Id]) -> super::Result<Vec<Profile>>;

    async fn find_roles(&self, ids: &[Id]) -> super::Result<HashMap<Id, Vec<String>>>;

    async fn find_badges(&self, ids: &[Id]) -> super::Result<HashMap<Id, Vec<String>>>;

    /// Users among `ids` that referred at least one person successfully.
    async fn find_referrers(&self, ids: &[Id]) -> super::Result<HashSet<Id>>;
}

pub struct PgUserRepository {
    pool: Pool,
}

impl PgUserRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn uuids(ids: &[Id]) -> Vec<Uuid> {
    ids.iter().map(|id| *id.get()).collect()
}

fn group(pairs: Vec<(Uuid, String)>) -> HashMap<Id, Vec<String>> {
    pairs
        .into_iter()
        .fold(HashMap::new(), |mut acc, (id, value)| {
            acc.entry(Id::from(id)).or_insert_with(Vec::new).push(value);
            acc
        })
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: &Id) -> super::Result<Profile> {
        let id = *id;
        db::interact(&self.pool, move |conn| {
            profiles::table
                .find(*id.get())
                .select(ProfileRow::as_select())
                .first(conn)
                .map(Profile::from)
                .map_err(|e| match e {
                    diesel::result::Error::NotFound => super::Error::NotFound(id),
                    e => e.into(),
                })
        })
        .await
    }

    async fn find_by_ids(&self, ids: &[Id]) -> super::Result<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let ids = uuids(ids);
        db::interact(&self.pool, move |conn| {
            let rows = profiles::table
                .filter(profiles::id.eq_any(ids))
                .select(ProfileRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(Profile::from).collect())
        })
        .await
    }

    async fn find_candidates(&self, exclude: &[Id]) -> super::Result<Vec<Profile>> {
        let exclude = uuids(exclude);
        db::interact(&self.pool, move |conn| {
            let rows = profiles::table
                .filter(profiles::id.ne_all(exclude))
                .order(profiles::created_at.desc())
                .limit(CANDIDATE_POOL_SIZE)
                .select(ProfileRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(Profile::from).collect())
        })
        .await
    }

    async fn find_roles(&self, ids: &[Id]) -> super::Result<HashMap<Id, Vec<String>>> {
        let ids = uuids(ids);
        db::interact(&self.pool, move |conn| {
            let pairs = user_roles::table
                .filter(user_roles::user_id.eq_any(ids))
                .select((user_roles::user_id, user_roles::role))
                .load::<(Uuid, String)>(conn)?;
            Ok(group(pairs))
        })
        .await
    }

    async fn find_badges(&self, ids: &[Id]) -> super::Result<HashMap<Id, Vec<String>>> {
        let ids = uuids(ids);
        db::interact(&self.pool, move |conn| {
            let pairs = user_badges::table
                .filter(user_badges::user_id.eq_any(ids))
                .select((user_badges::user_id, user_badges::badge))
                .load::<(Uuid, String)>(conn)?;
            Ok(group(pairs))
        })
        .await
    }

    async fn find_referrers(&self, ids: &[Id]) -> super::Result<HashSet<Id>> {
        let ids = uuids(ids);
        db::interact(&self.pool, move |conn| {
            let referrers = referrals::table
                .filter(referrals::referrer_id.eq_any(ids))
                .filter(referrals::status.eq(ACCEPTED))
                .select(referrals::referrer_id)
                .distinct()
                .load::<Uuid>(conn)?;
            Ok(referrers.into_iter().map(Id::from).collect())
        })
        .await
    }
}
