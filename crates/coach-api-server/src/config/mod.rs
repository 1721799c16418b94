pub mod settings;

pub use settings::{
    AuthConfig, ConversationConfig, CorsConfig, DatabaseConfig, GeminiConfig, LimitsConfig,
    PromptsConfig, ServerConfig, Settings,
};
