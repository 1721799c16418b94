use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title every conversation starts with until one is derived or supplied.
pub const DEFAULT_TITLE: &str = "New Conversation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A user's chat thread, stored as one JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Empty conversation with a fresh id; `title` falls back to [`DEFAULT_TITLE`].
    pub fn new(user_id: impl Into<String>, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append `message` and refresh `updated_at`, never moving it backwards.
    pub fn add_message(&mut self, message: Message) {
        let now = Utc::now().max(message.timestamp);
        self.updated_at = self.updated_at.max(now);
        self.messages.push(message);
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_TITLE
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            message_count: self.messages.len(),
        }
    }
}

/// Listing entry without the message bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_conversation_defaults() {
        let conv = Conversation::new("auth0|u1", None);
        assert_eq!(conv.title, DEFAULT_TITLE);
        assert!(conv.messages.is_empty());
        assert_eq!(conv.created_at, conv.updated_at);

        // Supplied titles are stored as given, even blank ones.
        let blank = Conversation::new("auth0|u1", Some("   ".into()));
        assert_eq!(blank.title, "   ");
        assert!(!blank.has_default_title());

        let custom = Conversation::new("auth0|u1", Some("Salary talk".into()));
        assert_eq!(custom.title, "Salary talk");
    }

    #[test]
    fn test_add_message_keeps_updated_at_monotonic() {
        let mut conv = Conversation::new("auth0|u1", None);
        conv.updated_at = Utc::now() + Duration::hours(1);
        let before = conv.updated_at;

        conv.add_message(Message::user("hello"));
        assert!(conv.updated_at >= before);
        assert_eq!(conv.messages.len(), 1);
    }

    #[test]
    fn test_storage_round_trip() {
        let mut conv = Conversation::new("auth0|u1", Some("Feedback".into()));
        conv.add_message(Message::user("How do I push back?"));
        conv.add_message(Message::assistant("Start with the shared goal."));

        let doc = serde_json::to_value(&conv).unwrap();
        assert_eq!(doc["messages"][0]["role"], "user");
        assert_eq!(doc["messages"][1]["role"], "assistant");
        assert!(doc["created_at"].is_string());

        let back: Conversation = serde_json::from_value(doc).unwrap();
        assert_eq!(back, conv);
    }

    #[test]
    fn test_summary_counts_messages() {
        let mut conv = Conversation::new("auth0|u1", None);
        conv.add_message(Message::user("a"));
        let summary = conv.summary();
        assert_eq!(summary.id, conv.id);
        assert_eq!(summary.message_count, 1);
    }
}
