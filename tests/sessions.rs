mod common;

use std::sync::Arc;

use chrono::Duration;

use athlete_hub::conversation::Key;
use athlete_hub::message::model::Draft;
use athlete_hub::user;

use common::{Backend, eventually};

#[tokio::test]
async fn should_release_session_and_subscriptions_on_close() {
    let backend = Backend::new();
    let jora = backend.users.add("Jora");
    let registry = backend.registry();

    let session = registry.get_or_open(jora).await;
    let bus = &backend.bus;
    eventually(|| async move { bus.open_subscriptions() == 2 }).await;

    let weak = Arc::downgrade(&session);
    drop(session);

    assert!(registry.close(&jora).await);
    assert!(registry.find(&jora).await.is_none());
    assert!(weak.upgrade().is_none());
    assert_eq!(backend.bus.open_subscriptions(), 0);

    assert!(!registry.close(&jora).await);
}

#[tokio::test]
async fn should_reuse_open_session() {
    let backend = Backend::new();
    let jora = backend.users.add("Jora");
    let registry = backend.registry();

    let first = registry.get_or_open(jora).await;
    let second = registry.get_or_open(jora).await;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn should_evict_only_idle_sessions() {
    let backend = Backend::new();
    let jora = backend.users.add("Jora");
    let valera = backend.users.add("Valera");
    let registry = backend.registry();

    registry.get_or_open(jora).await;
    registry.get_or_open(valera).await;

    backend.clock.advance(Duration::minutes(20));
    registry.get_or_open(jora).await;
    backend.clock.advance(Duration::minutes(15));

    assert_eq!(registry.evict_idle(Duration::minutes(30)).await, 1);
    assert!(registry.find(&jora).await.is_some());
    assert!(registry.find(&valera).await.is_none());
}

#[tokio::test]
async fn should_not_grow_with_distinct_callers_once_idle() {
    let backend = Backend::new();
    let registry = backend.registry();

    for _ in 0..200 {
        registry.get_or_open(user::Id::random()).await;
    }
    assert_eq!(registry.len().await, 200);

    backend.clock.advance(Duration::hours(1));

    assert_eq!(registry.evict_idle(Duration::minutes(30)).await, 200);
    assert!(registry.is_empty().await);
    assert_eq!(backend.bus.open_subscriptions(), 0);
}

#[tokio::test]
async fn should_push_sent_message_into_recipient_session() {
    let backend = Backend::new();
    let jora = backend.users.add("Jora");
    let valera = backend.users.add("Valera");
    let registry = backend.registry();

    let receiver = registry.get_or_open(valera).await;
    receiver.open(Key::Direct(jora)).await.unwrap();
    let bus = &backend.bus;
    eventually(|| async move { bus.open_subscriptions() == 2 }).await;

    let outcome = backend
        .session(jora)
        .send(Key::Direct(valera), Draft::text("pushed"))
        .await;
    assert!(outcome.success);

    let receiver = &receiver;
    eventually(|| async move { receiver.messages().messages().await.len() == 1 }).await;
    assert_eq!(receiver.messages().messages().await[0].content, "pushed");

    eventually(|| async move {
        receiver
            .conversations()
            .conversations()
            .await
            .first()
            .and_then(|c| c.last_message.clone())
            .as_deref()
            == Some("pushed")
    })
    .await;
}
