//! OpenAI chat-completion translation.

use super::chat::{build_translation_prompt, extract_content, ChatRequest, TRANSLATION_TEMPERATURE};
use super::{send, ProviderKind, ProviderResult, TranslationProvider, TranslationRequest};
use crate::config::DEFAULT_OPENAI_BASE_URL;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

pub struct OpenAiTranslator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiTranslator {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: "gpt-4o-mini".to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point at another OpenAI-compatible server (no trailing slash).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TranslationProvider for OpenAiTranslator {
    async fn translate(&self, request: &TranslationRequest) -> ProviderResult {
        debug!("OpenAI {}: translating to {}", self.model, request.target_language);

        let body = ChatRequest::new(
            self.model.clone(),
            request.system_prompt.as_deref(),
            build_translation_prompt(&request.text, &request.target_language),
        )
        .with_temperature(TRANSLATION_TEMPERATURE);

        let response = send(
            self.client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&body),
        )
        .await?;

        extract_content(&response)
    }

    async fn verify_key(&self) -> bool {
        if self.api_key.is_empty() {
            return false;
        }
        let result = send(
            self.client
                .get(format!("{}/models", self.base_url))
                .bearer_auth(&self.api_key),
        )
        .await;
        result.is_ok()
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn name(&self) -> &'static str {
        "OpenAI"
    }
}
