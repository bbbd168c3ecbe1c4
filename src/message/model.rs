use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use diesel::prelude::{Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversation::{Key, ThreadId};
use crate::user;

use super::{Id, MAX_CONTENT_LENGTH};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRef {
    pub url: String,
    pub name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: Id,
    pub sender: user::Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<user::Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<ThreadId>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileRef>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_system: bool,
}

impl Message {
    pub fn direct(sender: user::Id, recipient: user::Id, content: impl Into<String>) -> Self {
        Self {
            id: Id::random(),
            sender,
            recipient: Some(recipient),
            thread: None,
            content: content.into(),
            image_url: None,
            file: None,
            created_at: Utc::now(),
            is_system: false,
        }
    }

    pub fn in_thread(sender: user::Id, thread: ThreadId, content: impl Into<String>) -> Self {
        Self {
            recipient: None,
            thread: Some(thread),
            ..Self::direct(sender, sender, content)
        }
    }

    pub fn compose(sender: user::Id, key: &Key, draft: Draft, at: DateTime<Utc>) -> Self {
        let base = match key {
            Key::Direct(recipient) => Self::direct(sender, *recipient, draft.content),
            Key::Group(thread) => Self::in_thread(sender, *thread, draft.content),
        };
        Self {
            image_url: draft.image_url,
            file: draft.file_url.map(|url| FileRef {
                url,
                name: draft.file_name,
            }),
            created_at: at,
            ..base
        }
    }

    /// Conversation this message belongs to from `viewer`'s point of view.
    pub fn key_for(&self, viewer: &user::Id) -> Option<Key> {
        if let Some(thread) = self.thread {
            return Some(Key::Group(thread));
        }

        if self.sender == *viewer {
            self.recipient.map(Key::Direct)
        } else {
            Some(Key::Direct(self.sender))
        }
    }

    /// Calendar day of the message in the viewer's local time.
    pub fn local_date(&self, offset: &FixedOffset) -> NaiveDate {
        self.created_at.with_timezone(offset).date_naive()
    }

    pub fn preview(&self) -> String {
        if !self.content.is_empty() {
            return self.content.clone();
        }

        match (&self.image_url, &self.file) {
            (Some(_), _) => "Image".to_owned(),
            (None, Some(FileRef { name: Some(name), .. })) => name.clone(),
            (None, Some(_)) => "File".to_owned(),
            (None, None) => String::new(),
        }
    }

    pub fn has_attachment(&self) -> bool {
        self.image_url.is_some() || self.file.is_some()
    }
}

/// Composer content submitted for sending.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Draft {
    #[serde(default)]
    pub content: String,
    pub image_url: Option<String>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
}

impl Draft {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty() && self.image_url.is_none() && self.file_url.is_none()
    }

    /// Trims the content and rejects drafts that cannot be sent.
    pub fn validate(self) -> super::Result<Self> {
        if self.is_blank() {
            return Err(super::Error::Empty);
        }

        let content = self.content.trim().to_owned();
        let len = content.chars().count();
        if len > MAX_CONTENT_LENGTH {
            return Err(super::Error::TooLong(len));
        }

        Ok(Self { content, ..self })
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct SendOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

impl SendOutcome {
    pub fn sent(message: Message) -> Self {
        Self {
            success: true,
            error: None,
            message: Some(message),
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            message: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineItem {
    DayDivider { date: NaiveDate },
    Message { message: Message },
}

/// Interleaves day dividers wherever the local day changes between
/// consecutive messages. Expects `messages` in chronological order.
pub fn timeline(messages: &[Message], offset: &FixedOffset) -> Vec<TimelineItem> {
    let mut items = Vec::with_capacity(messages.len() + 1);
    let mut current = None;

    for m in messages {
        let date = m.local_date(offset);
        if current != Some(date) {
            items.push(TimelineItem::DayDivider { date });
            current = Some(date);
        }
        items.push(TimelineItem::Message { message: m.clone() });
    }

    items
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MessageRow {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Option<Uuid>,
    pub thread_id: Option<Uuid>,
    pub content: String,
    pub image_url: Option<String>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id.into(),
            sender: row.sender_id.into(),
            recipient: row.recipient_id.map(user::Id::from),
            thread: row.thread_id.map(ThreadId::from),
            content: row.content,
            image_url: row.image_url,
            file: row.file_url.map(|url| FileRef {
                url,
                name: row.file_name,
            }),
            created_at: row.created_at,
            is_system: row.is_system,
        }
    }
}

impl From<&Message> for MessageRow {
    fn from(m: &Message) -> Self {
        Self {
            id: *m.id.get(),
            sender_id: *m.sender.get(),
            recipient_id: m.recipient.map(|r| *r.get()),
            thread_id: m.thread.map(|t| *t.get()),
            content: m.content.clone(),
            image_url: m.image_url.clone(),
            file_url: m.file.as_ref().map(|f| f.url.clone()),
            file_name: m.file.as_ref().and_then(|f| f.name.clone()),
            is_system: m.is_system,
            created_at: m.created_at,
        }
    }
}
