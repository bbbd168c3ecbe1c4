use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, error};
use tokio_stream::StreamExt;

use super::{Event, EventStream, Subject};

#[async_trait]
pub trait EventService {
    async fn subscribe(&self, subject: &Subject<'_>) -> super::Result<EventStream>;

    /// Fire-and-forget: a failed publish is logged, never surfaced.
    async fn publish(&self, subject: &Subject<'_>, event: &Event);
}

#[derive(Clone)]
pub struct NatsEventService {
    pubsub: async_nats::Client,
}

impl NatsEventService {
    pub fn new(pubsub: async_nats::Client) -> Self {
        Self { pubsub }
    }
}

#[async_trait]
impl EventService for NatsEventService {
    async fn subscribe(&self, subject: &Subject<'_>) -> super::Result<EventStream> {
        let subscriber = self.pubsub.subscribe(subject).await?;

        let stream = subscriber.filter_map(|msg| {
            match serde_json::from_slice::<Event>(&msg.payload) {
                Ok(event) => Some(event),
                Err(e) => {
                    error!("failed to deserialize event: {e:?}");
                    None
                }
            }
        });

        Ok(Box::pin(stream))
    }

    async fn publish(&self, subject: &Subject<'_>, event: &Event) {
        if let Err(e) = self.try_publish(subject, event).await {
            error!("failed to publish event to {subject}: {e:?}");
        } else {
            debug!("published event to {subject}");
        }
    }
}

impl NatsEventService {
    async fn try_publish(&self, subject: &Subject<'_>, event: &Event) -> super::Result<()> {
        let payload = Bytes::from(serde_json::to_vec(event)?);
        self.pubsub.publish(subject, payload).await?;
        Ok(())
    }
}
