//! Shared pieces for OpenAI-compatible chat-completion backends.

use super::{parse_json, ProviderFailure};
use crate::language::language_name;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a high-quality multilingual translation assistant.";

/// Fixed sampling temperature for translation calls.
pub const TRANSLATION_TEMPERATURE: f32 = 0.2;

/// The user message asking for a translation into `target_lang`.
pub fn build_translation_prompt(text: &str, target_lang: &str) -> String {
    let lang_name = language_name(target_lang);
    format!(
        "Translate the following text into {lang_name}. Output only the translation, without any explanation:\n{text}"
    )
}

#[derive(Serialize, Debug)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Serialize, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, system_prompt: Option<&str>, user_prompt: String) -> Self {
        Self {
            model: model.into(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt
                        .filter(|p| !p.trim().is_empty())
                        .unwrap_or(DEFAULT_SYSTEM_PROMPT)
                        .to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: None,
            stream: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Deserialize, Debug)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Pull the first choice's content out of a chat-completion body.
pub fn extract_content(body: &str) -> Result<String, ProviderFailure> {
    let response: ChatResponse = parse_json(body)?;

    response
        .choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| ProviderFailure::malformed(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::FailureReason;

    #[test]
    fn test_prompt_names_target_language() {
        let prompt = build_translation_prompt("你好", "en");
        assert!(prompt.contains("English"));
        assert!(prompt.ends_with("你好"));
    }

    #[test]
    fn test_request_defaults_system_prompt() {
        let request = ChatRequest::new("gpt-4o-mini", None, "hi".to_string());
        assert_eq!(request.messages[0].content, DEFAULT_SYSTEM_PROMPT);

        let request = ChatRequest::new("gpt-4o-mini", Some("  "), "hi".to_string());
        assert_eq!(request.messages[0].content, DEFAULT_SYSTEM_PROMPT);

        let request = ChatRequest::new("gpt-4o-mini", Some("Be terse."), "hi".to_string());
        assert_eq!(request.messages[0].content, "Be terse.");
    }

    #[test]
    fn test_request_omits_unset_fields() {
        let request = ChatRequest::new("deepseek-chat", None, "hi".to_string()).with_stream(false);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[test]
    fn test_extract_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Hello  "}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "Hello");
    }

    #[test]
    fn test_extract_content_missing_choice() {
        let failure = extract_content(r#"{"choices":[]}"#).unwrap_err();
        assert_eq!(failure.reason, FailureReason::MalformedResponse);
    }

    #[test]
    fn test_extract_content_not_json() {
        let failure = extract_content("<html>bad gateway</html>").unwrap_err();
        assert_eq!(failure.reason, FailureReason::MalformedResponse);
        assert!(failure.detail.contains("bad gateway"));
    }
}
