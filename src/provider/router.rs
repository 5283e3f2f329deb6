use super::{
    lookup_model, AliyunTranslator, DeepSeekTranslator, GoogleTranslator, MockTranslator, ModelSpec,
    OpenAiTranslator, ProviderKind, TranslationProvider, DEFAULT_MODEL,
};
use crate::config::Config;
use crate::error::{QuicktransError, Result};
use reqwest::Client;
use tracing::debug;

/// Builds the adapter for a model identifier. All adapters share one HTTP
/// client and take their endpoints from [`Config`].
#[derive(Clone)]
pub struct ProviderRouter {
    client: Client,
    config: Config,
}

impl ProviderRouter {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            config: config.clone(),
        }
    }

    /// Resolve `model_id` through the model table and build its adapter.
    /// Fails before any network activity if the model is unknown or its
    /// provider needs a key that isn't set.
    pub fn route(&self, model_id: &str, api_key: Option<&str>) -> Result<Box<dyn TranslationProvider>> {
        let spec = lookup_model(model_id)
            .ok_or_else(|| QuicktransError::validation(format!("Unknown model: {}", model_id)))?;
        debug!("Routing model {} to {}", spec.id, spec.provider);
        self.build(spec, api_key)
    }

    /// Adapter for a provider using its first listed model, for key checks.
    pub fn for_provider(&self, kind: ProviderKind, api_key: Option<&str>) -> Result<Box<dyn TranslationProvider>> {
        let spec = super::MODELS
            .iter()
            .find(|m| m.provider == kind)
            .or_else(|| lookup_model(DEFAULT_MODEL))
            .ok_or_else(|| QuicktransError::validation(format!("No model for provider {}", kind)))?;
        self.build(spec, api_key)
    }

    fn build(&self, spec: &ModelSpec, api_key: Option<&str>) -> Result<Box<dyn TranslationProvider>> {
        let key = match api_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => key.to_string(),
            None if spec.provider.requires_key() => {
                return Err(QuicktransError::validation(format!(
                    "No API key configured for {}. Set one with: quicktrans key set {} <KEY>",
                    spec.provider, spec.provider
                )));
            }
            None => String::new(),
        };

        let client = self.client.clone();
        let provider: Box<dyn TranslationProvider> = match spec.provider {
            ProviderKind::OpenAi => Box::new(
                OpenAiTranslator::new(key)
                    .with_model(spec.vendor_model)
                    .with_base_url(self.config.openai_base_url.trim_end_matches('/'))
                    .with_client(client),
            ),
            ProviderKind::Google => Box::new(
                GoogleTranslator::new(key)
                    .with_base_url(self.config.google_base_url.trim_end_matches('/'))
                    .with_client(client),
            ),
            ProviderKind::DeepSeek => Box::new(
                DeepSeekTranslator::new(key)
                    .with_base_url(self.config.deepseek_base_url.trim_end_matches('/'))
                    .with_client(client),
            ),
            ProviderKind::Aliyun => Box::new(
                AliyunTranslator::new(key)
                    .with_model(spec.vendor_model)
                    .with_proxy_url(self.config.aliyun_proxy_url.clone())
                    .with_client(client),
            ),
            ProviderKind::Mock => Box::new(MockTranslator),
        };
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> ProviderRouter {
        ProviderRouter::new(&Config::default())
    }

    #[test]
    fn test_route_each_model() {
        let router = router();
        for spec in super::super::MODELS {
            let provider = router.route(spec.id, Some("test-key-123456")).unwrap();
            assert_eq!(provider.kind(), spec.provider, "model {}", spec.id);
        }
    }

    #[test]
    fn test_route_unknown_model() {
        let result = router().route("gpt-9", Some("key"));
        assert!(matches!(result, Err(QuicktransError::Validation(_))));
    }

    #[test]
    fn test_route_missing_key() {
        let result = router().route("deepseek", None);
        assert!(matches!(result, Err(QuicktransError::Validation(_))));

        let result = router().route("gpt-4o", Some("   "));
        assert!(matches!(result, Err(QuicktransError::Validation(_))));
    }

    #[test]
    fn test_mock_needs_no_key() {
        let provider = router().route("google-translate", None).unwrap();
        assert_eq!(provider.kind(), ProviderKind::Mock);
    }

    #[test]
    fn test_for_provider() {
        let provider = router().for_provider(ProviderKind::Aliyun, Some("sk-aliyun-key")).unwrap();
        assert_eq!(provider.name(), "Aliyun Qwen");
    }
}
