//! Session state manager: the authenticated identity, the contact
//! directory, the active selection, per-contact message threads and
//! the composer buffer, plus every transition between them.
//!
//! Everything here is synchronous and owned by one session; the UI
//! layer only reads snapshots and calls the transition methods.

use std::collections::HashMap;

use chrono::Local;
use log::debug;
use thiserror::Error;

use crate::models::{Contact, Identity, Message, MessageDirection};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Selection of an id that is not in the directory. The UI only
    /// ever offers ids it got from the directory, so hitting this is
    /// a programming error; callers log it and keep the old selection.
    #[error("contact {0} is not in the directory")]
    ContactNotFound(u32),
}

/// Fixed, ordered list of known contacts. Read-only for the lifetime
/// of the session; ordering is by recency of the last message.
#[derive(Debug, Clone)]
pub struct ContactDirectory {
    contacts: Vec<Contact>,
}

impl ContactDirectory {
    pub fn new(contacts: Vec<Contact>) -> Self {
        ContactDirectory { contacts }
    }

    /// The directory every session starts with.
    pub fn seed() -> Self {
        let contact = |id, name: &str, status: &str, last: &str, time: &str, unread, avatar: &str| Contact {
            id,
            name: name.to_string(),
            status: status.to_string(),
            last_message: last.to_string(),
            last_message_time: time.to_string(),
            unread,
            avatar: avatar.to_string(),
        };
        ContactDirectory::new(vec![
            contact(1, "Анна Смирнова", "онлайн", "Увидимся завтра!", "14:32", Some(2), "АС"),
            contact(2, "Дмитрий Петров", "был(а) 5 мин назад", "Отправил файлы", "13:15", None, "ДП"),
            contact(3, "Екатерина Волкова", "онлайн", "Спасибо большое!", "12:48", Some(1), "ЕВ"),
            contact(4, "Алексей Иванов", "был(а) 1 час назад", "Созвонимся позже", "11:22", None, "АИ"),
            contact(5, "Мария Соколова", "онлайн", "Договорились 👍", "10:05", None, "МС"),
        ])
    }

    pub fn list(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn find(&self, id: u32) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

/// Ordered, append-only log of messages for one contact.
#[derive(Debug, Clone, Default)]
pub struct MessageThread {
    messages: Vec<Message>,
}

impl MessageThread {
    pub fn new() -> Self {
        MessageThread::default()
    }

    /// The conversation the first seed contact starts with.
    pub fn seed() -> Self {
        let msg = |id, text: &str, direction, time: &str| Message {
            id,
            text: text.to_string(),
            direction,
            time: time.to_string(),
        };
        use MessageDirection::{Incoming, Outgoing};
        MessageThread {
            messages: vec![
                msg(1, "Привет! Как дела?", Incoming, "14:25"),
                msg(2, "Здорово! Всё отлично, спасибо 😊", Outgoing, "14:26"),
                msg(3, "Завтра встречаемся?", Incoming, "14:30"),
                msg(4, "Да, конечно! В 15:00 устроит?", Outgoing, "14:31"),
                msg(5, "Увидимся завтра!", Incoming, "14:32"),
            ],
        }
    }

    /// Appends a message stamped with the current local time.
    ///
    /// Empty or whitespace-only text is rejected and nothing is
    /// appended. The new id is one past the largest id in the thread
    /// (1 for an empty thread), so ids stay unique and strictly
    /// increasing even though seeded threads start above zero.
    pub fn append(&mut self, text: &str, direction: MessageDirection) -> Option<&Message> {
        if text.trim().is_empty() {
            return None;
        }
        let id = self.messages.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        self.messages.push(Message {
            id,
            text: text.to_string(),
            direction,
            time: format_wall_clock(),
        });
        self.messages.last()
    }

    /// All messages in append order, oldest first.
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Zero-padded 24-hour "HH:MM" from the local wall clock.
fn format_wall_clock() -> String {
    Local::now().format("%H:%M").to_string()
}

/// One authenticated user's client state.
///
/// A `Session` can only be built from an `Identity`, which is how the
/// messenger screen stays unreachable before authentication. Threads
/// are keyed by contact id; the seed conversation belongs to the
/// first contact and the others start empty.
#[derive(Debug)]
pub struct Session {
    identity: Identity,
    directory: ContactDirectory,
    selected: u32,
    threads: HashMap<u32, MessageThread>,
    draft: String,
}

impl Session {
    pub fn new(identity: Identity) -> Self {
        Session::with_directory(identity, ContactDirectory::seed())
    }

    pub fn with_directory(identity: Identity, directory: ContactDirectory) -> Self {
        assert!(!directory.is_empty(), "a session needs at least one contact");
        let selected = directory.list()[0].id;
        let mut threads = HashMap::new();
        threads.insert(selected, MessageThread::seed());
        Session {
            identity,
            directory,
            selected,
            threads,
            draft: String::new(),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn directory(&self) -> &ContactDirectory {
        &self.directory
    }

    /// The active contact. Always valid: the selection can only move
    /// to ids the directory contains.
    pub fn current(&self) -> &Contact {
        self.directory
            .find(self.selected)
            .expect("selection always refers to a directory contact")
    }

    /// Switches the visible conversation. Re-selecting the active
    /// contact succeeds and changes nothing.
    pub fn select(&mut self, id: u32) -> Result<(), SessionError> {
        if self.directory.find(id).is_none() {
            return Err(SessionError::ContactNotFound(id));
        }
        if id != self.selected {
            debug!("switching conversation {} -> {}", self.selected, id);
            self.selected = id;
        }
        Ok(())
    }

    /// Messages of the active conversation, oldest first.
    pub fn messages(&self) -> &[Message] {
        self.threads.get(&self.selected).map(MessageThread::all).unwrap_or(&[])
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Replaces the composer buffer verbatim.
    pub fn set_draft(&mut self, text: &str) {
        self.draft = text.to_string();
    }

    /// Sends the composer buffer into the active thread.
    ///
    /// A buffer that trims to nothing is a deliberate no-op: nothing
    /// is appended and the buffer keeps its value. Otherwise the
    /// buffer is appended verbatim (untrimmed, as the original client
    /// sends it) as an outgoing message and the buffer is cleared.
    pub fn submit(&mut self) -> Option<Message> {
        if self.draft.trim().is_empty() {
            return None;
        }
        let thread = self.threads.entry(self.selected).or_default();
        let sent = thread
            .append(&self.draft, MessageDirection::Outgoing)
            .cloned()
            .expect("non-blank draft always appends");
        self.draft.clear();
        debug!("sent message {} to contact {}", sent.id, self.selected);
        Some(sent)
    }
}
