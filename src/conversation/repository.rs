use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::upsert::excluded;
use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl, SelectableHelper};
use log::warn;
use uuid::Uuid;

use crate::integration::db::{self, Pool};
use crate::schema::{conversation_reads, message_threads, thread_members};
use crate::user;

use super::model::{ReadMarkerRow, Thread, ThreadRow};
use super::{Key, ThreadId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationRepository {
    /// Every thread `user` belongs to, with its full member list.
    async fn find_threads_by_member(&self, user: &user::Id) -> super::Result<Vec<Thread>>;

    async fn rename_thread(&self, id: &ThreadId, name: &str) -> super::Result<bool>;

    async fn find_read_markers(
        &self,
        user: &user::Id,
    ) -> super::Result<HashMap<Key, DateTime<Utc>>>;

    async fn upsert_read_marker(
        &self,
        user: &user::Id,
        key: &Key,
        at: DateTime<Utc>,
    ) -> super::Result<()>;
}

pub struct PgConversationRepository {
    pool: Pool,
}

impl PgConversationRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn find_threads_by_member(&self, user: &user::Id) -> super::Result<Vec<Thread>> {
        let user = *user.get();
        db::interact(&self.pool, move |conn| {
            let thread_ids = thread_members::table
                .filter(thread_members::user_id.eq(user))
                .select(thread_members::thread_id)
                .load::<Uuid>(conn)?;

            if thread_ids.is_empty() {
                return Ok(vec![]);
            }

            let rows = message_threads::table
                .filter(message_threads::id.eq_any(&thread_ids))
                .select(ThreadRow::as_select())
                .load(conn)?;

            let members = thread_members::table
                .filter(thread_members::thread_id.eq_any(&thread_ids))
                .order(thread_members::joined_at.asc())
                .select((thread_members::thread_id, thread_members::user_id))
                .load::<(Uuid, Uuid)>(conn)?
                .into_iter()
                .fold(HashMap::<Uuid, Vec<user::Id>>::new(), |mut acc, (t, u)| {
                    acc.entry(t).or_default().push(u.into());
                    acc
                });

            let threads = rows
                .into_iter()
                .map(|row| Thread {
                    id: row.id.into(),
                    members: members.get(&row.id).cloned().unwrap_or_default(),
                    name: row.name,
                    created_at: row.created_at,
                })
                .collect();
            Ok(threads)
        })
        .await
    }

    async fn rename_thread(&self, id: &ThreadId, name: &str) -> super::Result<bool> {
        let (id, name) = (*id.get(), name.to_owned());
        db::interact(&self.pool, move |conn| {
            let updated = diesel::update(message_threads::table.find(id))
                .set(message_threads::name.eq(name))
                .execute(conn)?;
            Ok(updated > 0)
        })
        .await
    }

    async fn find_read_markers(
        &self,
        user: &user::Id,
    ) -> super::Result<HashMap<Key, DateTime<Utc>>> {
        let user = *user.get();
        db::interact(&self.pool, move |conn| {
            let rows = conversation_reads::table
                .filter(conversation_reads::user_id.eq(user))
                .select(ReadMarkerRow::as_select())
                .load(conn)?;

            let markers = rows
                .into_iter()
                .filter_map(|row| match row.conversation_key.parse::<Key>() {
                    Ok(key) => Some((key, row.last_read_at)),
                    Err(e) => {
                        warn!("skipping read marker: {e}");
                        None
                    }
                })
                .collect();
            Ok(markers)
        })
        .await
    }

    async fn upsert_read_marker(
        &self,
        user: &user::Id,
        key: &Key,
        at: DateTime<Utc>,
    ) -> super::Result<()> {
        let row = ReadMarkerRow {
            user_id: *user.get(),
            conversation_key: key.to_string(),
            last_read_at: at,
        };
        db::interact(&self.pool, move |conn| {
            diesel::insert_into(conversation_reads::table)
                .values(&row)
                .on_conflict((
                    conversation_reads::user_id,
                    conversation_reads::conversation_key,
                ))
                .do_update()
                .set(conversation_reads::last_read_at.eq(excluded(conversation_reads::last_read_at)))
                .execute(conn)?;
            Ok(())
        })
        .await
    }
}
