use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::GeminiConfig;
use crate::models::ChatMessage;
use crate::services::conversation::LlmProvider;
use crate::utils::error::ApiError;
use crate::utils::limiters::Limiters;

/// Gemini through its OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct GeminiService {
    client: Client,
    config: GeminiConfig,
    limiters: Arc<Limiters>,
}

#[derive(Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl GeminiService {
    pub fn new(config: GeminiConfig, limiters: Arc<Limiters>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
                .build()
                .unwrap_or_else(|_| Client::new()),
            config,
            limiters,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// One non-streaming chat completion. No retry.
    pub async fn generate_chat(&self, messages: &[ChatMessage]) -> Result<String, ApiError> {
        let (_permit, waited) = Limiters::acquire_timed(
            self.limiters.llm_generate.clone(),
            self.limiters.acquire_timeout,
            "gemini_generate",
        )
        .await
        .map_err(|e| ApiError::LlmError(e.to_string()))?;

        debug!(
            "Calling Gemini {} with {} messages (waited {:?} for permit)",
            self.config.model,
            messages.len(),
            waited
        );

        let request = OpenAiChatRequest {
            model: &self.config.model,
            messages,
            stream: false,
        };

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::LlmError(format!("Gemini Network Error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!("Gemini returned {}: {}", status, text);
            return Err(ApiError::LlmError(format!("Gemini API Error ({}): {}", status, text)));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ApiError::LlmError(format!("Failed to parse Gemini response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ApiError::LlmError("Gemini returned no content".to_string()))
    }
}

#[async_trait]
impl LlmProvider for GeminiService {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, ApiError> {
        self.generate_chat(messages).await
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }
}
