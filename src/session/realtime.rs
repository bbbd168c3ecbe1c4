use log::{debug, error};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;

use crate::event::{self, Subject};

use super::Handle;

/// Feeds the session with events addressed to its user and with post changes.
/// Aborting the returned task drops the subscriptions and the session handle.
pub(super) fn spawn(session: Handle, events: event::Service) -> JoinHandle<()> {
    tokio::spawn(async move {
        let viewer = *session.viewer();

        let messages = match events.subscribe(&Subject::Messages(&viewer)).await {
            Ok(s) => s,
            Err(e) => {
                error!("failed to subscribe to messages of {viewer}: {e:?}");
                return;
            }
        };
        let posts = match events.subscribe(&Subject::Posts).await {
            Ok(s) => s,
            Err(e) => {
                error!("failed to subscribe to post changes for {viewer}: {e:?}");
                return;
            }
        };

        let mut stream = messages.merge(posts);
        while let Some(event) = stream.next().await {
            session.apply(event).await;
        }
        debug!("realtime stream of {viewer} closed");
    })
}
