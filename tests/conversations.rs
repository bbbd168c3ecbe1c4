mod common;

use chrono::Duration;

use athlete_hub::conversation::{self, Key, ThreadId, model::Thread};
use athlete_hub::event::Event;
use athlete_hub::message::{self, model::{Draft, Message}};

use common::Backend;

#[tokio::test]
async fn should_replace_draft_with_stored_conversation_after_first_message() {
    let backend = Backend::new();
    let jora = backend.users.add("Jora");
    let valera = backend.users.add("Valera");
    let session = backend.session(jora);

    let draft = session
        .conversations()
        .start_direct(&valera)
        .await
        .unwrap();
    assert!(draft.draft);
    assert_eq!(draft.name, "Valera");

    let outcome = session
        .send(Key::Direct(valera), Draft::text("hello"))
        .await;
    assert!(outcome.success, "{:?}", outcome.error);

    let list = session.conversations().conversations().await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].key, Key::Direct(valera));
    assert_eq!(list[0].last_message.as_deref(), Some("hello"));
    assert!(!list[0].draft);
    assert!(!list[0].unread);

    assert!(session.composer().draft().await.is_blank());
}

#[tokio::test]
async fn should_notify_recipient_and_show_unread() {
    let backend = Backend::new();
    let jora = backend.users.add("Jora");
    let valera = backend.users.add("Valera");

    let outcome = backend
        .session(jora)
        .send(Key::Direct(valera), Draft::text("salut"))
        .await;
    assert!(outcome.success);

    let published = backend.bus.published.lock().unwrap().clone();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, format!("messages.{valera}"));
    assert!(matches!(&published[0].1, Event::NewMessage { message } if message.content == "salut"));

    let other = backend.session(valera);
    other.conversations().refetch().await.unwrap();
    let list = other.conversations().conversations().await;
    assert_eq!(list.len(), 1);
    assert!(list[0].unread);

    other.mark_as_read(&Key::Direct(jora)).await.unwrap();
    assert!(!other.conversations().conversations().await[0].unread);

    other.conversations().refetch().await.unwrap();
    assert!(!other.conversations().conversations().await[0].unread);
}

#[tokio::test]
async fn should_keep_draft_in_composer_when_send_fails() {
    let backend = Backend::new();
    let jora = backend.users.add("Jora");
    let valera = backend.users.add("Valera");
    let session = backend.session(jora);

    let outcome = session
        .send(Key::Direct(valera), Draft::text("x".repeat(5000)))
        .await;

    assert!(!outcome.success);
    assert!(outcome.error.is_some());
    assert_eq!(session.composer().draft().await.content.len(), 5000);
    assert!(backend.messages.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_hide_history_only_for_requester() {
    let backend = Backend::new();
    let jora = backend.users.add("Jora");
    let valera = backend.users.add("Valera");

    let old = backend.clock.now() - Duration::days(3);
    {
        let mut rows = backend.messages.rows.lock().unwrap();
        for (i, content) in ["one", "two"].into_iter().enumerate() {
            let mut m = Message::direct(valera, jora, content);
            m.created_at = old + Duration::minutes(i as i64);
            rows.push(m);
        }
    }

    let session = backend.session(jora);
    let today = backend.clock.now().date_naive();

    let hidden = session.hide_before(Key::Direct(valera), today).await.unwrap();
    assert_eq!(hidden, 2);
    assert!(session.messages().messages().await.is_empty());

    let again = session.hide_before(Key::Direct(valera), today).await.unwrap();
    assert_eq!(again, 0);

    let other = backend.session(valera);
    other.open(Key::Direct(jora)).await.unwrap();
    assert_eq!(other.messages().messages().await.len(), 2);
}

#[tokio::test]
async fn should_merge_incoming_message_once_into_open_conversation() {
    let backend = Backend::new();
    let jora = backend.users.add("Jora");
    let valera = backend.users.add("Valera");

    let session = backend.session(valera);
    session.open(Key::Direct(jora)).await.unwrap();

    let incoming = Message::direct(jora, valera, "ce faci?");
    backend.messages.rows.lock().unwrap().push(incoming.clone());

    session
        .apply(Event::NewMessage {
            message: incoming.clone(),
        })
        .await;
    session
        .apply(Event::NewMessage { message: incoming })
        .await;

    let messages = session.messages().messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "ce faci?");

    let list = session.conversations().conversations().await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].key, Key::Direct(jora));
    assert_eq!(list[0].last_message.as_deref(), Some("ce faci?"));
}

#[tokio::test]
async fn should_ignore_incoming_message_for_another_conversation() {
    let backend = Backend::new();
    let jora = backend.users.add("Jora");
    let valera = backend.users.add("Valera");
    let radu = backend.users.add("Radu");

    let session = backend.session(valera);
    session.open(Key::Direct(radu)).await.unwrap();

    let incoming = Message::direct(jora, valera, "hei");
    backend.messages.rows.lock().unwrap().push(incoming.clone());
    session.apply(Event::NewMessage { message: incoming }).await;

    assert!(session.messages().messages().await.is_empty());
    let list = session.conversations().conversations().await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].key, Key::Direct(jora));
    assert!(list[0].unread);
}

#[tokio::test]
async fn should_delete_own_message_and_notify_counterpart() {
    let backend = Backend::new();
    let jora = backend.users.add("Jora");
    let valera = backend.users.add("Valera");

    let sender = backend.session(jora);
    let outcome = sender
        .send(Key::Direct(valera), Draft::text("oops"))
        .await;
    let sent = outcome.message.unwrap();

    let receiver = backend.session(valera);
    receiver.open(Key::Direct(jora)).await.unwrap();
    assert_eq!(receiver.messages().messages().await.len(), 1);

    sender.delete_message(&sent.id).await.unwrap();

    assert!(sender.messages().messages().await.is_empty());
    assert!(backend.messages.rows.lock().unwrap().is_empty());

    let published = backend.bus.published.lock().unwrap().clone();
    assert_eq!(published.len(), 2);
    assert_eq!(published[1].0, format!("messages.{valera}"));
    assert!(matches!(&published[1].1, Event::MessageDeleted { id } if *id == sent.id));

    receiver.apply(published[1].1.clone()).await;
    assert!(receiver.messages().messages().await.is_empty());
    assert!(receiver.conversations().conversations().await.is_empty());
}

#[tokio::test]
async fn should_refuse_to_delete_someone_elses_message() {
    let backend = Backend::new();
    let jora = backend.users.add("Jora");
    let valera = backend.users.add("Valera");

    let outcome = backend
        .session(jora)
        .send(Key::Direct(valera), Draft::text("mine"))
        .await;
    let sent = outcome.message.unwrap();

    let other = backend.session(valera);
    other.open(Key::Direct(jora)).await.unwrap();

    let result = other.delete_message(&sent.id).await;

    assert!(matches!(result, Err(message::Error::NotFound(id)) if id == sent.id));
    assert_eq!(other.messages().messages().await.len(), 1);
    assert_eq!(backend.messages.rows.lock().unwrap().len(), 1);
    assert_eq!(backend.bus.published.lock().unwrap().len(), 1);
}

fn group(backend: &Backend, name: &str, members: Vec<athlete_hub::user::Id>) -> ThreadId {
    let thread = Thread {
        id: ThreadId::random(),
        name: name.to_owned(),
        created_at: backend.clock.now(),
        members,
    };
    let id = thread.id;
    backend.conversations.threads.lock().unwrap().push(thread);
    id
}

#[tokio::test]
async fn should_rename_group_chat_with_trimmed_name() {
    let backend = Backend::new();
    let jora = backend.users.add("Jora");
    let valera = backend.users.add("Valera");
    let thread = group(&backend, "Alergare", vec![jora, valera]);

    let session = backend.session(jora);
    session.conversations().refetch().await.unwrap();

    session
        .conversations()
        .rename_group_chat(&thread, "  Maraton 2026  ")
        .await
        .unwrap();

    let list = session.conversations().conversations().await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].name, "Maraton 2026");
    assert_eq!(
        backend.conversations.threads.lock().unwrap()[0].name,
        "Maraton 2026"
    );

    let missing = ThreadId::random();
    let result = session
        .conversations()
        .rename_group_chat(&missing, "Ciclism")
        .await;
    assert!(matches!(result, Err(conversation::Error::ThreadNotFound(id)) if id == missing));
}

#[tokio::test]
async fn should_announce_group_message_to_every_member_but_sender() {
    let backend = Backend::new();
    let jora = backend.users.add("Jora");
    let valera = backend.users.add("Valera");
    let radu = backend.users.add("Radu");
    let thread = group(&backend, "Alergare", vec![jora, valera, radu]);

    let outcome = backend
        .session(jora)
        .send(Key::Group(thread), Draft::text("antrenament la 7"))
        .await;
    assert!(outcome.success, "{:?}", outcome.error);

    let published = backend.bus.published.lock().unwrap().clone();
    let mut subjects = published.iter().map(|(s, _)| s.clone()).collect::<Vec<_>>();
    subjects.sort();
    let mut expected = vec![format!("messages.{valera}"), format!("messages.{radu}")];
    expected.sort();
    assert_eq!(subjects, expected);
    assert!(published.iter().all(
        |(_, e)| matches!(e, Event::NewMessage { message } if message.thread == Some(thread))
    ));

    let member = backend.session(radu);
    member.open(Key::Group(thread)).await.unwrap();
    assert_eq!(member.messages().messages().await[0].content, "antrenament la 7");
}
