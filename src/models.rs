use serde::Deserialize;

/// The authenticated user for the lifetime of the session.
///
/// Constructed once from a successful login/register response and
/// never mutated; discarding it ends the session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    #[serde(rename = "username")]
    pub display_name: String,
    pub user_id: i64,
}

/// One entry of the contact directory.
///
/// The directory is seed data for this client: presence text, preview
/// and preview time are pre-formatted display strings, not live state.
#[derive(Debug, Clone)]
pub struct Contact {
    pub id: u32,
    pub name: String,
    pub status: String,
    pub last_message: String,
    pub last_message_time: String,
    pub unread: Option<u32>,
    pub avatar: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDirection {
    Outgoing,
    Incoming,
}

/// A single message inside one conversation thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: u32,
    pub text: String,
    pub direction: MessageDirection,
    /// Local wall-clock time, zero-padded 24-hour "HH:MM".
    pub time: String,
}

impl Message {
    pub fn is_outgoing(&self) -> bool {
        self.direction == MessageDirection::Outgoing
    }
}
