//! End-to-end session flows over the public API: authenticate,
//! browse the directory, switch conversations, compose and send.

use saidus::models::{Identity, MessageDirection};
use saidus::session::{Session, SessionError};

fn authenticated_session() -> Session {
    Session::new(Identity {
        display_name: "ivan".to_string(),
        user_id: 42,
    })
}

#[test]
fn fresh_session_shows_the_seed_conversation() {
    let session = authenticated_session();

    assert_eq!(session.identity().display_name, "ivan");
    assert_eq!(session.current().name, "Анна Смирнова");

    let thread = session.messages();
    assert_eq!(thread.len(), 5);
    let ids: Vec<u32> = thread.iter().map(|m| m.id).collect();
    assert_eq!(ids, [1, 2, 3, 4, 5]);
    assert_eq!(thread[0].direction, MessageDirection::Incoming);
    assert_eq!(thread[1].direction, MessageDirection::Outgoing);
}

#[test]
fn composing_and_sending_extends_the_active_conversation() {
    let mut session = authenticated_session();

    session.set_draft("До встречи в 15:00!");
    let sent = session.submit().expect("draft must send");

    assert_eq!(sent.id, 6);
    assert_eq!(sent.text, "До встречи в 15:00!");
    assert!(sent.is_outgoing());
    assert_eq!(session.draft(), "");
    assert_eq!(session.messages().last(), Some(&sent));
}

#[test]
fn switching_contacts_switches_the_thread_the_composer_feeds() {
    let mut session = authenticated_session();

    session.select(5).expect("id 5 is in the directory");
    assert_eq!(session.current().name, "Мария Соколова");
    assert!(session.messages().is_empty());

    session.set_draft("Привет, Мария!");
    let sent = session.submit().unwrap();
    assert_eq!(sent.id, 1);

    // The first conversation is untouched by traffic in the second.
    session.select(1).unwrap();
    assert_eq!(session.messages().len(), 5);
}

#[test]
fn a_draft_survives_a_failed_selection() {
    let mut session = authenticated_session();

    session.set_draft("черновик");
    assert_eq!(session.select(1000), Err(SessionError::ContactNotFound(1000)));
    assert_eq!(session.current().id, 1);
    assert_eq!(session.draft(), "черновик");
}

#[test]
fn soft_newlines_stay_inside_one_message() {
    let mut session = authenticated_session();

    // Shift+Enter inserts a newline instead of submitting; by the
    // time submit runs, the buffer holds the whole multi-line text.
    session.set_draft("первая строка\nвторая строка");
    let sent = session.submit().unwrap();

    assert_eq!(sent.text, "первая строка\nвторая строка");
    assert_eq!(session.messages().len(), 6);
}

#[test]
fn unread_counters_come_from_the_directory_seed() {
    let session = authenticated_session();
    let unread: Vec<Option<u32>> = session.directory().list().iter().map(|c| c.unread).collect();
    assert_eq!(unread, [Some(2), None, Some(1), None, None]);
}
