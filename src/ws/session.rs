use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::models::{ActiveUser, SendMessage};

pub type ConnectionId = String;

/// Outbound queue of one connection; drained by its socket writer
pub type Outbound = mpsc::UnboundedSender<SendMessage>;

/// Last known cursor of a session, never persisted
#[derive(Clone, Debug, PartialEq)]
pub struct CursorState {
    pub position: Option<Value>,
    pub selection: Option<Value>,
    pub updated_at: DateTime<Utc>,
}

/// One participant's membership in a room
#[derive(Debug)]
pub struct Session {
    pub connection_id: ConnectionId,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
    pub cursor: Option<CursorState>,
    outbound: Outbound,
}

impl Session {
    pub fn new(connection_id: ConnectionId, display_name: Option<String>, outbound: Outbound) -> Self {
        let display_name = display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| default_display_name(&connection_id));
        Self {
            connection_id,
            display_name,
            joined_at: Utc::now(),
            cursor: None,
            outbound,
        }
    }

    /// Best effort; a closed connection just drops the message
    pub fn send(&self, msg: SendMessage) -> bool {
        self.outbound.send(msg).is_ok()
    }

    pub fn presence(&self) -> ActiveUser {
        ActiveUser {
            connection_id: self.connection_id.clone(),
            display_name: self.display_name.clone(),
            joined_at: self.joined_at,
        }
    }
}

pub fn default_display_name(connection_id: &str) -> String {
    let prefix: String = connection_id.chars().take(6).collect();
    format!("User-{}", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_fall_back_to_connection_prefix() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = Session::new("abcdef123456".to_string(), Some("   ".to_string()), tx);
        assert_eq!(session.display_name, "User-abcdef");
    }

    #[test]
    fn supplied_names_are_trimmed() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = Session::new("c1".to_string(), Some(" Ada ".to_string()), tx);
        assert_eq!(session.display_name, "Ada");
        assert_eq!(session.presence().connection_id, "c1");
    }

    #[test]
    fn send_to_closed_connection_is_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let session = Session::new("c1".to_string(), None, tx);
        assert!(!session.send(SendMessage::error("gone")));
    }
}
