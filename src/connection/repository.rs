use async_trait::async_trait;
use diesel::result::DatabaseErrorKind;
use diesel::{BoolExpressionMethods, ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl};
use diesel::SelectableHelper;
use uuid::Uuid;

use crate::integration::db::{self, Pool};
use crate::schema::connections;
use crate::user;

use super::model::{Connection, ConnectionRow};
use super::{Id, Status};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRepository {
    async fn find_by_id(&self, id: &Id) -> super::Result<Option<Connection>>;

    /// Counterparts of every accepted connection `user` takes part in, on either side.
    async fn find_connected_ids(&self, user: &user::Id) -> super::Result<Vec<user::Id>>;

    /// Fails with [`super::Error::AlreadyExists`] when the pair is already linked in any direction.
    async fn add(&self, c: &Connection) -> super::Result<()>;

    async fn update_status(&self, id: &Id, status: &Status) -> super::Result<bool>;
}

pub struct PgConnectionRepository {
    pool: Pool,
}

impl PgConnectionRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectionRepository for PgConnectionRepository {
    async fn find_by_id(&self, id: &Id) -> super::Result<Option<Connection>> {
        let id = *id.get();
        db::interact(&self.pool, move |conn| {
            connections::table
                .find(id)
                .select(ConnectionRow::as_select())
                .first(conn)
                .optional()?
                .map(Connection::try_from)
                .transpose()
        })
        .await
    }

    async fn find_connected_ids(&self, user: &user::Id) -> super::Result<Vec<user::Id>> {
        let user = *user.get();
        db::interact(&self.pool, move |conn| {
            let pairs = connections::table
                .filter(connections::status.eq(Status::Accepted.as_str()))
                .filter(
                    connections::requester_id
                        .eq(user)
                        .or(connections::addressee_id.eq(user)),
                )
                .select((connections::requester_id, connections::addressee_id))
                .load::<(Uuid, Uuid)>(conn)?;

            let ids = pairs
                .into_iter()
                .map(|(requester, addressee)| {
                    if requester == user { addressee } else { requester }
                })
                .map(user::Id::from)
                .collect();
            Ok(ids)
        })
        .await
    }

    async fn add(&self, c: &Connection) -> super::Result<()> {
        if c.requester().eq(c.addressee()) {
            return Err(super::Error::SelfReference);
        }

        let row = ConnectionRow::from(c);
        let (requester, addressee) = (*c.requester(), *c.addressee());
        db::interact(&self.pool, move |conn| {
            match diesel::insert_into(connections::table)
                .values(&row)
                .execute(conn)
            {
                Ok(_) => Ok(()),
                Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                    Err(super::Error::AlreadyExists(requester, addressee))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn update_status(&self, id: &Id, status: &Status) -> super::Result<bool> {
        let (id, status) = (*id.get(), status.as_str());
        db::interact(&self.pool, move |conn| {
            let updated = diesel::update(connections::table.find(id))
                .set(connections::status.eq(status))
                .execute(conn)?;
            Ok(updated > 0)
        })
        .await
    }
}
