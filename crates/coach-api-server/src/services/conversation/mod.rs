//! Conversation handling: the bounded prompt window and the chat service.

pub mod context_window;
pub mod manager;

pub use context_window::{derive_title, maybe_retitle, windowed};
pub use manager::{ConversationService, LlmProvider};
