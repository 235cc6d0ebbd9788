//! UI-agnostic message types
//!
//! These are shared between the session store, the transport and any UI
//! rendering the conversation. Nothing here depends on a UI framework.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Message identifier: creation time in milliseconds, a process-wide
/// sequence number and the role, e.g. `1729240000123-7-user`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn generate(role: Role) -> Self {
        let millis = Utc::now().timestamp_millis();
        let seq = NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("{}-{}-{}", millis, seq, role.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A chat message in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    role: Role,
    text: String,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(role),
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique_within_a_burst() {
        let ids: HashSet<MessageId> = (0..1_000).map(|_| MessageId::generate(Role::User)).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn test_id_carries_role_suffix() {
        let msg = Message::assistant("hi");
        assert!(msg.id().as_str().ends_with("-assistant"));
        assert_eq!(msg.role(), Role::Assistant);
    }

    #[test]
    fn test_serializes_as_id_role_text() {
        let msg = Message::user("Hello");
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["role"], "user");
        assert_eq!(value["text"], "Hello");
        assert_eq!(value["id"], msg.id().as_str());
        assert_eq!(value.as_object().unwrap().len(), 3);
    }
}
