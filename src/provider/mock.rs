use super::{ProviderKind, ProviderResult, TranslationProvider, TranslationRequest};
use async_trait::async_trait;

/// Placeholder text produced by the mock backend and the Google proxy stub.
pub fn mock_translation(text: &str) -> String {
    format!("[Translated: {}]", text)
}

/// Offline stand-in used when no network backend is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockTranslator;

#[async_trait]
impl TranslationProvider for MockTranslator {
    async fn translate(&self, request: &TranslationRequest) -> ProviderResult {
        Ok(mock_translation(&request.text))
    }

    async fn verify_key(&self) -> bool {
        true
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Mock
    }

    fn name(&self) -> &'static str {
        "Local mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_is_deterministic() {
        let request = TranslationRequest {
            text: "hello".to_string(),
            source_language: "en".to_string(),
            target_language: "zh".to_string(),
            system_prompt: None,
        };
        let first = tokio_test::block_on(MockTranslator.translate(&request)).unwrap();
        let second = tokio_test::block_on(MockTranslator.translate(&request)).unwrap();
        assert_eq!(first, "[Translated: hello]");
        assert_eq!(first, second);
    }
}
