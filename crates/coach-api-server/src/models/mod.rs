pub mod chat;
pub mod conversation;
pub mod user;

pub use chat::ChatMessage;
pub use conversation::{Conversation, ConversationSummary, Message, Role, DEFAULT_TITLE};
pub use user::{OnboardingProfile, User};
