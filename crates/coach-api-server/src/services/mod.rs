pub mod conversation;
pub mod gemini;
pub mod user_service;

pub use conversation::{ConversationService, LlmProvider};
pub use gemini::GeminiService;
pub use user_service::UserService;
