//! DeepSeek chat-completion translation.

use super::chat::{build_translation_prompt, extract_content, ChatRequest};
use super::{send, ProviderKind, ProviderResult, TranslationProvider, TranslationRequest};
use crate::config::DEFAULT_DEEPSEEK_BASE_URL;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

const DEEPSEEK_MODEL: &str = "deepseek-chat";

/// Keys shorter than this are rejected without a network call.
const MIN_KEY_LEN: usize = 11;

pub struct DeepSeekTranslator {
    client: Client,
    api_key: String,
    base_url: String,
}

impl DeepSeekTranslator {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_DEEPSEEK_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl TranslationProvider for DeepSeekTranslator {
    async fn translate(&self, request: &TranslationRequest) -> ProviderResult {
        debug!("DeepSeek: translating to {}", request.target_language);

        let body = ChatRequest::new(
            DEEPSEEK_MODEL,
            request.system_prompt.as_deref(),
            build_translation_prompt(&request.text, &request.target_language),
        )
        .with_stream(false);

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
        self.api_key.len() >= MIN_KEY_LEN
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::DeepSeek
    }

    fn name(&self) -> &'static str {
        "DeepSeek"
    }
}
