use anyhow::{bail, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    /// Identity provider tenant, e.g. `tenant.eu.auth0.com`.
    pub domain: String,
    /// Expected audience of ID tokens.
    pub client_id: String,
    /// Overrides `https://<domain>/.well-known/jwks.json`.
    #[serde(default)]
    pub jwks_url: Option<String>,
    #[serde(default = "default_jwks_timeout")]
    pub jwks_timeout_seconds: u64,
    /// Refuse tokens that could not be signature-checked.
    #[serde(default)]
    pub reject_unverified: bool,
}

fn default_jwks_timeout() -> u64 {
    10
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            client_id: String::new(),
            jwks_url: None,
            jwks_timeout_seconds: default_jwks_timeout(),
            reject_unverified: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL URL; without one the in-memory store is used.
    pub url: Option<String>,
    pub pool_max_size: u32,
    pub pool_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_max_size: 10,
            pool_timeout_seconds: 5,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: String,
    /// OpenAI-compatible endpoint root, without `/chat/completions`.
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            model: "gemini-2.0-flash".to_string(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LimitsConfig {
    pub llm_concurrency: usize,
    pub acquire_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            llm_concurrency: 8,
            acquire_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ConversationConfig {
    /// Upper bound on history messages sent with each prompt.
    pub max_context_messages: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_context_messages: 20,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PromptsConfig {
    pub coach_system_prompt: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            coach_system_prompt: DEFAULT_COACH_PROMPT.to_string(),
        }
    }
}

const DEFAULT_COACH_PROMPT: &str = "You are a workplace communication coach. \
Help the user prepare for conversations with their manager: suggest concrete \
wording, anticipate the manager's reaction, and keep advice short and practical.";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a TOML document, without environment overrides.
    pub fn from_toml(source: &str) -> Result<Self> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.domain.trim().is_empty() {
            bail!("auth.domain must be set");
        }
        if self.auth.client_id.trim().is_empty() {
            bail!("auth.client_id must be set");
        }
        if self.auth.jwks_timeout_seconds == 0 {
            bail!("auth.jwks_timeout_seconds must be positive");
        }
        Ok(())
    }

    pub fn jwks_url(&self) -> String {
        self.auth
            .jwks_url
            .clone()
            .unwrap_or_else(|| crate::auth::KeyCache::well_known_url(&self.auth.domain))
    }
}
