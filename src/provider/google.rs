//! Google Cloud Translation v2 (basic) over REST.

use super::{parse_json, send, ProviderFailure, ProviderKind, ProviderResult, TranslationProvider, TranslationRequest};
use crate::config::DEFAULT_GOOGLE_BASE_URL;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Prefix every Google Cloud API key carries.
const KEY_PREFIX: &str = "AIza";

pub struct GoogleTranslator {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GoogleTranslator {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_GOOGLE_BASE_URL.to_string(),
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

#[derive(Serialize)]
struct TranslateV2Request<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Deserialize, Debug)]
struct TranslateV2Response {
    data: Option<TranslateV2Data>,
}

#[derive(Deserialize, Debug)]
struct TranslateV2Data {
    translations: Option<Vec<TranslateV2Translation>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TranslateV2Translation {
    translated_text: Option<String>,
}

#[async_trait]
impl TranslationProvider for GoogleTranslator {
    async fn translate(&self, request: &TranslationRequest) -> ProviderResult {
        debug!(
            "Google: translating {} -> {}",
            request.source_language, request.target_language
        );

        let body = TranslateV2Request {
            q: &request.text,
            source: &request.source_language,
            target: &request.target_language,
            format: "text",
        };

        let response = send(
            self.client
                .post(format!("{}/language/translate/v2", self.base_url))
                .query(&[("key", self.api_key.as_str())])
                .json(&body),
        )
        .await?;

        let parsed: TranslateV2Response = parse_json(&response)?;
        parsed
            .data
            .and_then(|d| d.translations)
            .and_then(|t| t.into_iter().next())
            .and_then(|t| t.translated_text)
            .ok_or_else(|| ProviderFailure::malformed(&response))
    }

    async fn verify_key(&self) -> bool {
        self.api_key.starts_with(KEY_PREFIX)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn name(&self) -> &'static str {
        "Google Translate"
    }
}
