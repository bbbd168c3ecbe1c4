use chrono::{DateTime, Utc};
use diesel::prelude::{Insertable, Queryable, Selectable};
use serde::Serialize;
use uuid::Uuid;

use crate::user::{self, model::Profile};

use super::{Key, ThreadId};

pub const PLACEHOLDER_NAME: &str = "Loading…";
pub const UNKNOWN_NAME: &str = "Unknown user";

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Conversation {
    pub key: Key,
    pub name: String,
    pub avatar: Option<String>,
    pub last_message: Option<String>,
    pub last_activity: Option<DateTime<Utc>>,
    pub unread: bool,
    pub is_group: bool,
    pub participants: Vec<user::Id>,
    /// Synthesized locally and not yet backed by any stored message.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub draft: bool,
}

impl Conversation {
    pub fn direct(viewer: &user::Id, counterpart: &Profile) -> Self {
        Self {
            key: Key::Direct(counterpart.id),
            name: counterpart.full_name.clone(),
            avatar: counterpart.avatar_url.clone(),
            last_message: None,
            last_activity: None,
            unread: false,
            is_group: false,
            participants: vec![*viewer, counterpart.id],
            draft: false,
        }
    }

    pub fn group(thread: &Thread) -> Self {
        Self {
            key: Key::Group(thread.id),
            name: thread.name.clone(),
            avatar: None,
            last_message: None,
            last_activity: Some(thread.created_at),
            unread: false,
            is_group: true,
            participants: thread.members.clone(),
            draft: false,
        }
    }

    /// Stand-in shown while a brand-new counterpart's profile is being fetched.
    pub fn placeholder(viewer: &user::Id, counterpart: &user::Id) -> Self {
        Self {
            key: Key::Direct(*counterpart),
            name: PLACEHOLDER_NAME.to_owned(),
            avatar: None,
            last_message: None,
            last_activity: None,
            unread: false,
            is_group: false,
            participants: vec![*viewer, *counterpart],
            draft: true,
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Thread {
    pub id: ThreadId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub members: Vec<user::Id>,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = crate::schema::message_threads)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ThreadRow {
    pub id: Uuid,
    pub name: String,
    #[allow(dead_code)]
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::conversation_reads)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReadMarkerRow {
    pub user_id: Uuid,
    pub conversation_key: String,
    pub last_read_at: DateTime<Utc>,
}
