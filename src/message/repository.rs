use async_trait::async_trait;
use diesel::dsl::not;
use diesel::{
    BoolExpressionMethods, ExpressionMethods, NullableExpressionMethods, QueryDsl, RunQueryDsl,
    SelectableHelper,
};

use crate::conversation::{Key, ThreadId};
use crate::integration::db::{self, Pool};
use crate::schema::{hidden_messages, messages};
use crate::user;

use super::Id;
use super::model::{Message, MessageRow};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository {
    /// Direct messages involving `viewer` plus everything posted to `threads`,
    /// without the ones `viewer` has hidden.
    async fn find_for_viewer(
        &self,
        viewer: &user::Id,
        threads: &[ThreadId],
    ) -> super::Result<Vec<Message>>;

    /// Messages of one conversation in chronological order, without the ones
    /// `viewer` has hidden.
    async fn find_by_key(&self, viewer: &user::Id, key: &Key) -> super::Result<Vec<Message>>;

    async fn insert(&self, message: &Message) -> super::Result<()>;

    /// Removes a message authored by `owner`. Returns `false` if there was none.
    async fn delete(&self, owner: &user::Id, id: &Id) -> super::Result<bool>;

    /// Adds `ids` to the hidden set of `user`; already hidden ids are skipped.
    /// Returns the number of newly hidden messages.
    async fn hide(&self, user: &user::Id, ids: &[Id]) -> super::Result<usize>;
}

pub struct PgMessageRepository {
    pool: Pool,
}

impl PgMessageRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn find_for_viewer(
        &self,
        viewer: &user::Id,
        threads: &[ThreadId],
    ) -> super::Result<Vec<Message>> {
        let viewer = *viewer.get();
        let threads = threads.iter().map(|t| *t.get()).collect::<Vec<_>>();
        db::interact(&self.pool, move |conn| {
            let hidden = hidden_messages::table
                .filter(hidden_messages::user_id.eq(viewer))
                .select(hidden_messages::message_id);

            let mut rows = messages::table
                .filter(messages::thread_id.is_null())
                .filter(
                    messages::sender_id
                        .eq(viewer)
                        .or(messages::recipient_id.assume_not_null().eq(viewer)),
                )
                .filter(not(messages::id.eq_any(hidden)))
                .select(MessageRow::as_select())
                .load(conn)?;

            if !threads.is_empty() {
                let hidden = hidden_messages::table
                    .filter(hidden_messages::user_id.eq(viewer))
                    .select(hidden_messages::message_id);
                let in_threads = messages::table
                    .filter(messages::thread_id.assume_not_null().eq_any(threads))
                    .filter(not(messages::id.eq_any(hidden)))
                    .select(MessageRow::as_select())
                    .load(conn)?;
                rows.extend(in_threads);
            }

            Ok(rows.into_iter().map(Message::from).collect())
        })
        .await
    }

    async fn find_by_key(&self, viewer: &user::Id, key: &Key) -> super::Result<Vec<Message>> {
        let viewer = *viewer.get();
        let key = *key;
        db::interact(&self.pool, move |conn| {
            let hidden = hidden_messages::table
                .filter(hidden_messages::user_id.eq(viewer))
                .select(hidden_messages::message_id);

            let mut query = messages::table
                .filter(not(messages::id.eq_any(hidden)))
                .into_boxed();

            query = match key {
                Key::Direct(counterpart) => {
                    let counterpart = *counterpart.get();
                    query.filter(messages::thread_id.is_null()).filter(
                        messages::sender_id
                            .eq(viewer)
                            .and(messages::recipient_id.assume_not_null().eq(counterpart))
                            .or(messages::sender_id
                                .eq(counterpart)
                                .and(messages::recipient_id.assume_not_null().eq(viewer))),
                    )
                }
                Key::Group(thread) => {
                    query.filter(messages::thread_id.assume_not_null().eq(*thread.get()))
                }
            };

            let rows = query
                .order((messages::created_at.asc(), messages::id.asc()))
                .select(MessageRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(Message::from).collect())
        })
        .await
    }

    async fn insert(&self, message: &Message) -> super::Result<()> {
        let row = MessageRow::from(message);
        db::interact(&self.pool, move |conn| {
            diesel::insert_into(messages::table)
                .values(&row)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, owner: &user::Id, id: &Id) -> super::Result<bool> {
        let (owner, id) = (*owner.get(), *id.get());
        db::interact(&self.pool, move |conn| {
            let deleted = diesel::delete(
                messages::table
                    .filter(messages::id.eq(id))
                    .filter(messages::sender_id.eq(owner)),
            )
            .execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn hide(&self, user: &user::Id, ids: &[Id]) -> super::Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let user = *user.get();
        let values = ids
            .iter()
            .map(|id| {
                (
                    hidden_messages::user_id.eq(user),
                    hidden_messages::message_id.eq(*id.get()),
                )
            })
            .collect::<Vec<_>>();
        db::interact(&self.pool, move |conn| {
            let inserted = diesel::insert_into(hidden_messages::table)
                .values(&values)
                .on_conflict_do_nothing()
                .execute(conn)?;
            Ok(inserted)
        })
        .await
    }
}
