use chrono::{DateTime, Utc};
use diesel::prelude::{Queryable, Selectable};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user;

use super::Id;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Media {
    pub url: String,
    pub media_type: String,
}

/// Interaction totals, counted from the child tables on every read.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Counts {
    pub likes: i64,
    pub comments: i64,
    pub bookmarks: i64,
    pub shares: i64,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum State {
    Draft,
    Scheduled { at: DateTime<Utc> },
    Published { at: DateTime<Utc> },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: Id,
    pub author: user::Id,
    pub content: String,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub counts: Counts,
}

impl Post {
    pub fn published(author: user::Id, content: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: Id::random(),
            author,
            content: content.into(),
            is_published: true,
            published_at: Some(at),
            scheduled_at: None,
            created_at: at,
            media: vec![],
            counts: Counts::default(),
        }
    }

    /// Published, but held back until `at`.
    pub fn scheduled(author: user::Id, content: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            scheduled_at: Some(at),
            created_at: Utc::now().min(at),
            ..Self::published(author, content, at)
        }
    }

    pub fn draft(author: user::Id, content: impl Into<String>) -> Self {
        Self {
            is_published: false,
            published_at: None,
            ..Self::published(author, content, Utc::now())
        }
    }

    /// There is no promotion job: a scheduled post simply starts passing this
    /// check once its publish time is behind `now`.
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.is_published && self.published_at.is_some_and(|at| at <= now)
    }

    pub fn state(&self, now: DateTime<Utc>) -> State {
        match self.published_at {
            Some(at) if self.is_published && at <= now => State::Published { at },
            Some(at) if self.is_published => State::Scheduled { at },
            _ => State::Draft,
        }
    }
}

/// One offset page of visible posts, newest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageQuery {
    /// `None` means every author.
    pub authors: Option<Vec<user::Id>>,
    pub offset: usize,
    pub limit: usize,
    pub now: DateTime<Utc>,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id.into(),
            author: row.author_id.into(),
            content: row.content,
            is_published: row.is_published,
            published_at: row.published_at,
            scheduled_at: row.scheduled_at,
            created_at: row.created_at,
            media: vec![],
            counts: Counts::default(),
        }
    }
}
