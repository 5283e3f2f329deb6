//! Aliyun DashScope (Qwen) translation, routed through the local proxy.
//!
//! The proxy answers 200 for every upstream outcome and reports the real
//! result in a [`ProxyEnvelope`].

use super::chat::build_translation_prompt;
use super::{parse_json, send, FailureReason, ProviderFailure, ProviderKind, ProviderResult, TranslationProvider, TranslationRequest};
use crate::config::DEFAULT_ALIYUN_PROXY_URL;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

const MIN_KEY_LEN: usize = 11;

/// Body accepted by `POST /api/aliyun-proxy`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AliyunProxyRequest {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub user_prompt: Option<String>,
}

/// Body returned by `POST /api/aliyun-proxy`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProxyEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    /// Upstream HTTP status, when the upstream answered at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ProxyEnvelope {
    pub fn ok(text: String) -> Self {
        Self {
            success: true,
            text: Some(text),
            reason: None,
            status: None,
            error: None,
            details: None,
        }
    }

    pub fn failure(reason: FailureReason, error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: None,
            reason: Some(reason),
            status: None,
            error: Some(error.into()),
            details: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }

    /// Turn an envelope back into an adapter result.
    pub fn into_result(self, raw: &str) -> ProviderResult {
        if self.success {
            return self
                .text
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .ok_or_else(|| ProviderFailure::malformed(raw));
        }

        let reason = self.reason.unwrap_or_else(|| {
            self.status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .map(FailureReason::from_status)
                .unwrap_or(FailureReason::Unknown)
        });
        let detail = match (self.error, self.details) {
            (Some(error), Some(details)) => format!("{}: {}", error, details),
            (Some(error), None) => error,
            (None, Some(details)) => details,
            (None, None) => String::new(),
        };
        Err(ProviderFailure::new(reason, detail))
    }
}

pub struct AliyunTranslator {
    client: Client,
    api_key: String,
    model: String,
    proxy_url: String,
}

impl AliyunTranslator {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: "qwen-turbo".to_string(),
            proxy_url: DEFAULT_ALIYUN_PROXY_URL.to_string(),
        }
    }

    /// DashScope model name, e.g. `qwen-plus`.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_proxy_url(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = proxy_url.into();
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
impl TranslationProvider for AliyunTranslator {
    async fn translate(&self, request: &TranslationRequest) -> ProviderResult {
        debug!("Aliyun {}: translating to {} via proxy", self.model, request.target_language);

        let body = AliyunProxyRequest {
            api_key: Some(self.api_key.clone()),
            model: Some(self.model.clone()),
            system_prompt: request.system_prompt.clone(),
            user_prompt: Some(build_translation_prompt(&request.text, &request.target_language)),
        };

        let response = send(self.client.post(&self.proxy_url).json(&body)).await?;
        let envelope: ProxyEnvelope = parse_json(&response)?;
        envelope.into_result(&response)
    }

    async fn verify_key(&self) -> bool {
        self.api_key.len() >= MIN_KEY_LEN
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Aliyun
    }

    fn name(&self) -> &'static str {
        "Aliyun Qwen"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success() {
        let envelope = ProxyEnvelope::ok(" 你好 ".to_string());
        assert_eq!(envelope.into_result("").unwrap(), "你好");
    }

    #[test]
    fn test_envelope_failure_uses_reason() {
        let envelope = ProxyEnvelope::failure(FailureReason::RateLimited, "slow down").with_status(429);
        let failure = envelope.into_result("").unwrap_err();
        assert_eq!(failure.reason, FailureReason::RateLimited);
        assert_eq!(failure.detail, "slow down");
    }

    #[test]
    fn test_envelope_failure_falls_back_to_status() {
        let envelope: ProxyEnvelope =
            serde_json::from_str(r#"{"success":false,"status":401,"error":"bad key"}"#).unwrap();
        assert_eq!(envelope.into_result("").unwrap_err().reason, FailureReason::InvalidKey);

        let envelope: ProxyEnvelope = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert_eq!(envelope.into_result("").unwrap_err().reason, FailureReason::Unknown);
    }

    #[test]
    fn test_envelope_success_without_text_is_malformed() {
        let envelope: ProxyEnvelope = serde_json::from_str(r#"{"success":true}"#).unwrap();
        let failure = envelope.into_result(r#"{"success":true}"#).unwrap_err();
        assert_eq!(failure.reason, FailureReason::MalformedResponse);
    }

    #[test]
    fn test_proxy_request_field_names() {
        let request = AliyunProxyRequest {
            api_key: Some("k".to_string()),
            model: Some("qwen-max".to_string()),
            system_prompt: None,
            user_prompt: Some("hi".to_string()),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["apiKey"], "k");
        assert_eq!(json["userPrompt"], "hi");
    }
}
