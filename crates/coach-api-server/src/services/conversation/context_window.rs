//! Bounded prompt window and title derivation for a conversation.
//!
//! None of these operations can fail.

use crate::models::conversation::{Conversation, Message, Role, DEFAULT_TITLE};

const TITLE_MAX_CHARS: usize = 50;
const TITLE_KEEP_CHARS: usize = 47;

/// At most `max_messages` messages for the prompt.
///
/// Keeps everything when it fits. Otherwise the first message stays pinned,
/// since it usually frames the situation, followed by the most recent
/// `max_messages - 1`.
pub fn windowed(messages: &[Message], max_messages: usize) -> Vec<Message> {
    if max_messages == 0 {
        return Vec::new();
    }
    if messages.len() <= max_messages {
        return messages.to_vec();
    }

    let tail_start = messages.len() - (max_messages - 1);
    let mut window = Vec::with_capacity(max_messages);
    window.push(messages[0].clone());
    window.extend_from_slice(&messages[tail_start..]);
    window
}

/// Title from the first user message, truncated to 50 characters.
pub fn derive_title(messages: &[Message]) -> String {
    let Some(first) = messages.iter().find(|m| m.role == Role::User) else {
        return DEFAULT_TITLE.to_string();
    };

    let text = &first.content;
    if text.chars().count() > TITLE_MAX_CHARS {
        let mut title: String = text.chars().take(TITLE_KEEP_CHARS).collect();
        title.push_str("...");
        title
    } else {
        text.clone()
    }
}

/// Replace a default title once the conversation has at least one exchange.
/// Returns whether the title changed.
pub fn maybe_retitle(conversation: &mut Conversation) -> bool {
    if !conversation.has_default_title() || conversation.messages.len() < 2 {
        return false;
    }

    let title = derive_title(&conversation.messages);
    if title == conversation.title {
        return false;
    }
    conversation.title = title;
    true
}
