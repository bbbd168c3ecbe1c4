use chrono::{DateTime, Utc};
use diesel::prelude::{Insertable, Queryable, Selectable};
use serde::Serialize;
use uuid::Uuid;

use crate::user;

use super::{Id, Status};

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Connection {
    id: Id,
    requester: user::Id,
    addressee: user::Id,
    status: Status,
    created_at: DateTime<Utc>,
}

impl Connection {
    pub fn new(requester: &user::Id, addressee: &user::Id) -> Self {
        Self {
            id: Id::random(),
            requester: *requester,
            addressee: *addressee,
            status: Status::Pending,
            created_at: Utc::now(),
        }
    }

    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub const fn requester(&self) -> &user::Id {
        &self.requester
    }

    pub const fn addressee(&self) -> &user::Id {
        &self.addressee
    }

    pub const fn status(&self) -> &Status {
        &self.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    /// The other side of the connection as seen by `viewer`.
    pub fn counterpart(&self, viewer: &user::Id) -> &user::Id {
        if self.requester.eq(viewer) {
            &self.addressee
        } else {
            &self.requester
        }
    }
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::connections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ConnectionRow {
    id: Uuid,
    requester_id: Uuid,
    addressee_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<&Connection> for ConnectionRow {
    fn from(c: &Connection) -> Self {
        Self {
            id: *c.id.get(),
            requester_id: *c.requester.get(),
            addressee_id: *c.addressee.get(),
            status: c.status.as_str().to_owned(),
            created_at: c.created_at,
        }
    }
}

impl TryFrom<ConnectionRow> for Connection {
    type Error = super::Error;

    fn try_from(row: ConnectionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            requester: row.requester_id.into(),
            addressee: row.addressee_id.into(),
            status: Status::try_from(row.status.as_str())?,
            created_at: row.created_at,
        })
    }
}

#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RequestOutcome {
    Created { connection: Connection },
    AlreadyExists,
}
