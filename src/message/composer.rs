use tokio::sync::RwLock;

use super::model::{Draft, Message, SendOutcome};

/// Pending composer content of a session.
///
/// A draft is staged before sending and cleared only after the message was
/// stored, so a failed send leaves it intact for a manual retry.
#[derive(Default)]
pub struct Composer {
    draft: RwLock<Draft>,
}

impl Composer {
    pub async fn stage(&self, draft: Draft) {
        *self.draft.write().await = draft;
    }

    pub async fn draft(&self) -> Draft {
        self.draft.read().await.clone()
    }

    pub async fn settle(&self, sent: super::Result<Message>) -> SendOutcome {
        match sent {
            Ok(message) => {
                *self.draft.write().await = Draft::default();
                SendOutcome::sent(message)
            }
            Err(e) => SendOutcome::failed(e),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::user;

    use super::*;

    #[tokio::test]
    async fn should_clear_only_after_successful_send() {
        let composer = Composer::default();
        composer.stage(Draft::text("hello")).await;

        let failed = composer.settle(Err(super::super::Error::Empty)).await;
        assert!(!failed.success);
        assert!(failed.error.is_some());
        assert_eq!(composer.draft().await.content, "hello");

        let sent = Message::direct(user::Id::random(), user::Id::random(), "hello");
        let ok = composer.settle(Ok(sent)).await;
        assert!(ok.success);
        assert!(composer.draft().await.is_blank());
    }
}
