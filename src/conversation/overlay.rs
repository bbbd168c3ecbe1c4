use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::Key;
use super::model::Conversation;

/// Read marks applied locally before the backend has confirmed them.
#[derive(Default, Debug)]
pub struct ReadOverlay {
    marks: HashMap<Key, DateTime<Utc>>,
}

impl ReadOverlay {
    pub fn mark(&mut self, key: Key, at: DateTime<Utc>) {
        self.marks
            .entry(key)
            .and_modify(|prev| *prev = (*prev).max(at))
            .or_insert(at);
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.marks.contains_key(key)
    }

    /// Merges the overlay into a freshly fetched list.
    ///
    /// A mark is kept only while the authoritative entry still reports unread
    /// and nothing newer than the mark has arrived. Otherwise the backend is
    /// either in agreement or has superseded it, and the mark is dropped.
    pub fn reconcile(&mut self, conversations: &mut [Conversation]) {
        self.marks.retain(|key, at| {
            let Some(c) = conversations.iter_mut().find(|c| c.key == *key) else {
                return false;
            };

            if c.unread && c.last_activity.is_none_or(|t| t <= *at) {
                c.unread = false;
                true
            } else {
                false
            }
        });
    }
}

#[cfg(test)]
mod test {
    use chrono::Duration;

    use crate::user;

    use super::*;

    fn unread(key: Key, at: DateTime<Utc>) -> Conversation {
        let mut c = Conversation::placeholder(&user::Id::random(), &user::Id::random());
        c.key = key;
        c.draft = false;
        c.unread = true;
        c.last_activity = Some(at);
        c
    }

    #[test]
    fn should_keep_mark_while_backend_lags() {
        let now = Utc::now();
        let key = Key::Direct(user::Id::random());
        let mut overlay = ReadOverlay::default();
        overlay.mark(key, now);

        let mut list = vec![unread(key, now - Duration::seconds(5))];
        overlay.reconcile(&mut list);

        assert!(!list[0].unread);
        assert!(overlay.contains(&key));
    }

    #[test]
    fn should_drop_mark_when_newer_message_arrives() {
        let now = Utc::now();
        let key = Key::Direct(user::Id::random());
        let mut overlay = ReadOverlay::default();
        overlay.mark(key, now);

        let mut list = vec![unread(key, now + Duration::seconds(5))];
        overlay.reconcile(&mut list);

        assert!(list[0].unread);
        assert!(!overlay.contains(&key));
    }

    #[test]
    fn should_drop_mark_once_backend_agrees() {
        let now = Utc::now();
        let key = Key::Direct(user::Id::random());
        let mut overlay = ReadOverlay::default();
        overlay.mark(key, now);

        let mut list = vec![unread(key, now - Duration::seconds(5))];
        list[0].unread = false;
        overlay.reconcile(&mut list);

        assert!(!overlay.contains(&key));
    }
}
