//! Translation backends and the model lookup table that routes to them.

pub mod aliyun;
pub mod chat;
pub mod deepseek;
pub mod google;
pub mod mock;
pub mod openai;
pub mod router;

pub use aliyun::AliyunTranslator;
pub use deepseek::DeepSeekTranslator;
pub use google::GoogleTranslator;
pub use mock::MockTranslator;
pub use openai::OpenAiTranslator;
pub use router::ProviderRouter;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Longest raw-body excerpt carried in a failure.
pub const BODY_EXCERPT_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Google,
    DeepSeek,
    Aliyun,
    Mock,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::OpenAi,
        ProviderKind::Google,
        ProviderKind::DeepSeek,
        ProviderKind::Aliyun,
        ProviderKind::Mock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Google => "google",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Aliyun => "aliyun",
            ProviderKind::Mock => "mock",
        }
    }

    pub fn requires_key(&self) -> bool {
        !matches!(self, ProviderKind::Mock)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "google" => Ok(ProviderKind::Google),
            "deepseek" => Ok(ProviderKind::DeepSeek),
            "aliyun" | "ali" => Ok(ProviderKind::Aliyun),
            "mock" => Ok(ProviderKind::Mock),
            _ => Err(format!(
                "Unknown provider: {}. Use 'openai', 'google', 'deepseek', 'aliyun' or 'mock'",
                s
            )),
        }
    }
}

/// One selectable model identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub provider: ProviderKind,
    /// Model name sent to the vendor, where the vendor takes one.
    pub vendor_model: &'static str,
}

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub const MODELS: &[ModelSpec] = &[
    ModelSpec { id: "gpt-4o-mini", label: "GPT-4o Mini", provider: ProviderKind::OpenAi, vendor_model: "gpt-4o-mini" },
    ModelSpec { id: "gpt-4o", label: "GPT-4o", provider: ProviderKind::OpenAi, vendor_model: "gpt-4o" },
    ModelSpec { id: "google-api", label: "Google API", provider: ProviderKind::Google, vendor_model: "" },
    ModelSpec { id: "deepseek", label: "DeepSeek", provider: ProviderKind::DeepSeek, vendor_model: "deepseek-chat" },
    ModelSpec { id: "ali-qwen-turbo", label: "Qwen Turbo", provider: ProviderKind::Aliyun, vendor_model: "qwen-turbo" },
    ModelSpec { id: "ali-qwen-plus", label: "Qwen Plus", provider: ProviderKind::Aliyun, vendor_model: "qwen-plus" },
    ModelSpec { id: "ali-qwen-max", label: "Qwen Max", provider: ProviderKind::Aliyun, vendor_model: "qwen-max" },
    ModelSpec { id: "google-translate", label: "Google Translate (local mock)", provider: ProviderKind::Mock, vendor_model: "" },
];

pub fn lookup_model(id: &str) -> Option<&'static ModelSpec> {
    MODELS.iter().find(|m| m.id == id)
}

/// Normalized input handed to every adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    pub system_prompt: Option<String>,
}

/// Why a provider call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    InvalidKey,
    RateLimited,
    InsufficientBalance,
    MalformedResponse,
    NetworkError,
    Unknown,
}

impl FailureReason {
    /// Map a non-success vendor status onto the failure taxonomy.
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            401 | 403 => FailureReason::InvalidKey,
            402 => FailureReason::InsufficientBalance,
            429 => FailureReason::RateLimited,
            _ => FailureReason::Unknown,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            FailureReason::InvalidKey => "API key is invalid or lacks permission",
            FailureReason::RateLimited => "Too many requests, please try again later",
            FailureReason::InsufficientBalance => "Insufficient account balance",
            FailureReason::MalformedResponse => "Malformed response",
            FailureReason::NetworkError => "Request failed",
            FailureReason::Unknown => "Service error, please try again later",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub reason: FailureReason,
    pub detail: String,
}

impl ProviderFailure {
    pub fn new(reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        Self::new(
            FailureReason::from_status(status),
            format!("HTTP {}: {}", status.as_u16(), excerpt(body)),
        )
    }

    pub fn network(error: impl std::fmt::Display) -> Self {
        Self::new(FailureReason::NetworkError, error.to_string())
    }

    pub fn malformed(body: &str) -> Self {
        Self::new(FailureReason::MalformedResponse, excerpt(body))
    }
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason {
            FailureReason::MalformedResponse => write!(f, "{}: {}", self.reason, self.detail),
            _ => write!(f, "{}", self.reason),
        }
    }
}

/// Either the translated text or a classified failure. Adapters report
/// every problem through this type and never panic or error past it.
pub type ProviderResult = std::result::Result<String, ProviderFailure>;

#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(&self, request: &TranslationRequest) -> ProviderResult;
    /// Cheap check that the configured key looks usable.
    async fn verify_key(&self) -> bool;
    fn kind(&self) -> ProviderKind;
    fn name(&self) -> &'static str;
}

/// First `BODY_EXCERPT_CHARS` characters of a body, for diagnostics.
pub fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

/// Send a request and return the body of a 2xx response. Transport errors
/// and non-2xx statuses come back classified.
pub(crate) async fn send(request: reqwest::RequestBuilder) -> std::result::Result<String, ProviderFailure> {
    let response = request.send().await.map_err(ProviderFailure::network)?;
    let status = response.status();
    debug!("Provider response status: {}", status);

    let body = response.text().await.map_err(ProviderFailure::network)?;

    if !status.is_success() {
        return Err(ProviderFailure::from_status(status, &body));
    }
    Ok(body)
}

pub(crate) fn parse_json<T: DeserializeOwned>(body: &str) -> std::result::Result<T, ProviderFailure> {
    serde_json::from_str(body).map_err(|_| ProviderFailure::malformed(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(FailureReason::from_status(StatusCode::UNAUTHORIZED), FailureReason::InvalidKey);
        assert_eq!(FailureReason::from_status(StatusCode::FORBIDDEN), FailureReason::InvalidKey);
        assert_eq!(
            FailureReason::from_status(StatusCode::PAYMENT_REQUIRED),
            FailureReason::InsufficientBalance
        );
        assert_eq!(
            FailureReason::from_status(StatusCode::TOO_MANY_REQUESTS),
            FailureReason::RateLimited
        );
        assert_eq!(
            FailureReason::from_status(StatusCode::INTERNAL_SERVER_ERROR),
            FailureReason::Unknown
        );
        assert_eq!(FailureReason::from_status(StatusCode::NOT_FOUND), FailureReason::Unknown);
    }

    #[test]
    fn test_reason_serializes_kebab_case() {
        let json = serde_json::to_string(&FailureReason::InsufficientBalance).unwrap();
        assert_eq!(json, "\"insufficient-balance\"");
        let parsed: FailureReason = serde_json::from_str("\"rate-limited\"").unwrap();
        assert_eq!(parsed, FailureReason::RateLimited);
    }

    #[test]
    fn test_excerpt_is_char_bounded() {
        let body = "翻".repeat(BODY_EXCERPT_CHARS + 10);
        assert_eq!(excerpt(&body).chars().count(), BODY_EXCERPT_CHARS);
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_malformed_display_includes_excerpt() {
        let failure = ProviderFailure::malformed("<html>oops</html>");
        assert_eq!(failure.to_string(), "Malformed response: <html>oops</html>");
    }

    #[test]
    fn test_model_lookup() {
        assert_eq!(lookup_model("gpt-4o").unwrap().provider, ProviderKind::OpenAi);
        assert_eq!(lookup_model("ali-qwen-max").unwrap().vendor_model, "qwen-max");
        assert_eq!(lookup_model("google-translate").unwrap().provider, ProviderKind::Mock);
        assert!(lookup_model("gpt-5").is_none());
        assert!(lookup_model(DEFAULT_MODEL).is_some());
    }

    #[test]
    fn test_model_ids_unique() {
        let ids: std::collections::HashSet<_> = MODELS.iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), MODELS.len());
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("ALI".parse::<ProviderKind>().unwrap(), ProviderKind::Aliyun);
        assert!("bing".parse::<ProviderKind>().is_err());
    }
}
