//! Persisted user preferences, saved prompts and translation history.
//!
//! [`PreferenceStore`] is the only place these values change. Every setter
//! writes through to [`Storage`] before updating memory, so a failed write
//! leaves both sides agreeing on the old value.

pub mod history;
pub mod prompts;
pub mod secret;
pub mod storage;

pub use history::{History, HistoryEntry, NewHistoryEntry, HISTORY_LIMIT};
pub use prompts::PromptTemplate;
pub use storage::{FileStorage, MemoryStorage, Storage};

use crate::error::{QuicktransError, Result};
use crate::language::is_supported;
use crate::provider::{lookup_model, ProviderKind, DEFAULT_MODEL};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const MIN_FONT_SIZE: u32 = 14;
pub const MAX_FONT_SIZE: u32 = 36;
pub const DEFAULT_FONT_SIZE: u32 = 18;

/// Storage keys.
mod keys {
    pub const HISTORY: &str = "translate_history";
    pub const SAVED_PROMPTS: &str = "saved_prompts";
    pub const API_STATUS: &str = "api_status";
    pub const SOURCE_LANG: &str = "my_lang";
    pub const TARGET_LANG: &str = "to_lang";
    pub const RESULT_LANG_MODE: &str = "result_lang_mode";
    pub const FONT_SIZE: &str = "font_size";
    pub const MODEL: &str = "openai_model";
    pub const SHOW_HISTORY: &str = "show_history";
}

fn api_key_storage_key(kind: ProviderKind) -> Option<&'static str> {
    match kind {
        ProviderKind::OpenAi => Some("openai_api_key"),
        ProviderKind::Google => Some("google_api_key"),
        ProviderKind::DeepSeek => Some("deepseek_api_key"),
        ProviderKind::Aliyun => Some("ali_api_key"),
        ProviderKind::Mock => None,
    }
}

pub fn clamp_font_size(size: i64) -> u32 {
    size.clamp(MIN_FONT_SIZE as i64, MAX_FONT_SIZE as i64) as u32
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Which language translations are produced in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultLanguageMode {
    /// Pick a direction from the configured pair and the detected language.
    #[default]
    Auto,
    Explicit(String),
}

impl std::fmt::Display for ResultLanguageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultLanguageMode::Auto => write!(f, "auto"),
            ResultLanguageMode::Explicit(code) => write!(f, "{}", code),
        }
    }
}

impl std::str::FromStr for ResultLanguageMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            Ok(ResultLanguageMode::Auto)
        } else if is_supported(s) {
            Ok(ResultLanguageMode::Explicit(s.to_string()))
        } else {
            Err(format!("Unknown result language: {}. Use 'auto' or a language code", s))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub source_language: String,
    pub target_language: String,
    pub result_language_mode: ResultLanguageMode,
    pub selected_model: String,
    pub font_size: u32,
    pub api_keys: BTreeMap<ProviderKind, String>,
    pub enabled: BTreeMap<ProviderKind, bool>,
    /// Newest first.
    pub prompt_templates: Vec<PromptTemplate>,
    pub show_history: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            source_language: "zh".to_string(),
            target_language: "en".to_string(),
            result_language_mode: ResultLanguageMode::Auto,
            selected_model: DEFAULT_MODEL.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            api_keys: BTreeMap::new(),
            enabled: ProviderKind::ALL.iter().map(|k| (*k, true)).collect(),
            prompt_templates: Vec::new(),
            show_history: false,
        }
    }
}

impl Preferences {
    pub fn api_key(&self, kind: ProviderKind) -> Option<&str> {
        self.api_keys.get(&kind).map(String::as_str)
    }

    /// Providers missing from the status map count as enabled.
    pub fn is_enabled(&self, kind: ProviderKind) -> bool {
        self.enabled.get(&kind).copied().unwrap_or(true)
    }
}

pub struct PreferenceStore {
    storage: Box<dyn Storage>,
    prefs: Preferences,
    history: History,
}

impl PreferenceStore {
    /// Read every persisted value once. Missing or malformed values fall
    /// back to defaults.
    pub fn open(storage: Box<dyn Storage>) -> Self {
        let defaults = Preferences::default();

        let language = |key: &str, default: String| {
            storage
                .get(key)
                .filter(|code| is_supported(code))
                .unwrap_or(default)
        };
        let source_language = language(keys::SOURCE_LANG, defaults.source_language);
        let target_language = language(keys::TARGET_LANG, defaults.target_language);

        let result_language_mode = storage
            .get(keys::RESULT_LANG_MODE)
            .and_then(|mode| mode.parse::<ResultLanguageMode>().ok())
            .unwrap_or_default();

        let selected_model = storage
            .get(keys::MODEL)
            .filter(|model| lookup_model(model).is_some())
            .unwrap_or(defaults.selected_model);

        let font_size = storage
            .get(keys::FONT_SIZE)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(clamp_font_size)
            .unwrap_or(DEFAULT_FONT_SIZE);

        let api_keys = ProviderKind::ALL
            .iter()
            .filter_map(|kind| {
                let stored = storage.get(api_key_storage_key(*kind)?)?;
                secret::reveal(&stored).map(|key| (*kind, key))
            })
            .collect();

        let mut enabled = defaults.enabled;
        if let Some(saved) = read_json::<BTreeMap<ProviderKind, bool>>(storage.as_ref(), keys::API_STATUS) {
            enabled.extend(saved);
        }

        let prompt_templates = read_json(storage.as_ref(), keys::SAVED_PROMPTS).unwrap_or_default();
        let history = History::from_entries(read_json(storage.as_ref(), keys::HISTORY).unwrap_or_default());
        let show_history = storage.get(keys::SHOW_HISTORY).as_deref() == Some("true");

        let prefs = Preferences {
            source_language,
            target_language,
            result_language_mode,
            selected_model,
            font_size,
            api_keys,
            enabled,
            prompt_templates,
            show_history,
        };

        debug!(
            "Loaded preferences: {} -> {}, model {}, {} history entries",
            prefs.source_language,
            prefs.target_language,
            prefs.selected_model,
            history.len()
        );

        Self {
            storage,
            prefs,
            history,
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.history.entries()
    }

    pub fn set_source_language(&mut self, code: &str) -> Result<()> {
        let target = self.prefs.target_language.clone();
        self.set_language_pair(code, &target)
    }

    pub fn set_target_language(&mut self, code: &str) -> Result<()> {
        let source = self.prefs.source_language.clone();
        self.set_language_pair(&source, code)
    }

    pub fn set_language_pair(&mut self, source: &str, target: &str) -> Result<()> {
        for code in [source, target] {
            if !is_supported(code) {
                return Err(QuicktransError::validation(format!("Unsupported language: {}", code)));
            }
        }
        self.storage
            .set_many(&[(keys::SOURCE_LANG, source), (keys::TARGET_LANG, target)])?;
        self.prefs.source_language = source.to_string();
        self.prefs.target_language = target.to_string();
        Ok(())
    }

    pub fn set_result_language_mode(&mut self, mode: ResultLanguageMode) -> Result<()> {
        if let ResultLanguageMode::Explicit(code) = &mode {
            if !is_supported(code) {
                return Err(QuicktransError::validation(format!("Unsupported language: {}", code)));
            }
        }
        self.storage.set(keys::RESULT_LANG_MODE, &mode.to_string())?;
        self.prefs.result_language_mode = mode;
        Ok(())
    }

    pub fn set_model(&mut self, model_id: &str) -> Result<()> {
        if lookup_model(model_id).is_none() {
            return Err(QuicktransError::validation(format!("Unknown model: {}", model_id)));
        }
        self.storage.set(keys::MODEL, model_id)?;
        self.prefs.selected_model = model_id.to_string();
        Ok(())
    }

    /// Store `size` clamped to the allowed range and return what was stored.
    pub fn set_font_size(&mut self, size: i64) -> Result<u32> {
        let size = clamp_font_size(size);
        self.storage.set(keys::FONT_SIZE, &size.to_string())?;
        self.prefs.font_size = size;
        Ok(size)
    }

    pub fn set_api_key(&mut self, kind: ProviderKind, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(QuicktransError::validation("API key cannot be empty"));
        }
        let storage_key = api_key_storage_key(kind)
            .ok_or_else(|| QuicktransError::validation(format!("{} does not use an API key", kind)))?;

        self.storage.set(storage_key, &secret::obfuscate(key))?;
        self.prefs.api_keys.insert(kind, key.to_string());
        debug!("Stored {} API key ({}***)", kind, key.chars().take(4).collect::<String>());
        Ok(())
    }

    pub fn clear_api_key(&mut self, kind: ProviderKind) -> Result<()> {
        if let Some(storage_key) = api_key_storage_key(kind) {
            self.storage.remove(storage_key)?;
        }
        self.prefs.api_keys.remove(&kind);
        Ok(())
    }

    pub fn set_provider_enabled(&mut self, kind: ProviderKind, enabled: bool) -> Result<()> {
        let mut status = self.prefs.enabled.clone();
        status.insert(kind, enabled);
        self.storage.set(keys::API_STATUS, &serde_json::to_string(&status)?)?;
        self.prefs.enabled = status;
        Ok(())
    }

    /// Save a prompt template at the front of the list.
    pub fn add_prompt_template(&mut self, name: &str, content: &str) -> Result<&PromptTemplate> {
        let name = name.trim();
        if name.is_empty() {
            return Err(QuicktransError::validation("Prompt name cannot be empty"));
        }
        if content.trim().is_empty() {
            return Err(QuicktransError::validation("Prompt content cannot be empty"));
        }

        let mut templates = self.prefs.prompt_templates.clone();
        templates.insert(0, PromptTemplate::new(name, content, now_millis()));
        self.storage.set(keys::SAVED_PROMPTS, &serde_json::to_string(&templates)?)?;
        self.prefs.prompt_templates = templates;
        Ok(&self.prefs.prompt_templates[0])
    }

    /// Returns whether a template was removed.
    pub fn remove_prompt_template(&mut self, id: &str) -> Result<bool> {
        let mut templates = self.prefs.prompt_templates.clone();
        let before = templates.len();
        templates.retain(|t| t.id != id);
        if templates.len() == before {
            return Ok(false);
        }
        self.storage.set(keys::SAVED_PROMPTS, &serde_json::to_string(&templates)?)?;
        self.prefs.prompt_templates = templates;
        Ok(true)
    }

    pub fn find_prompt_template(&self, id_or_name: &str) -> Option<&PromptTemplate> {
        prompts::find(&self.prefs.prompt_templates, id_or_name)
    }

    /// Flip history visibility and return the new value.
    pub fn toggle_show_history(&mut self) -> Result<bool> {
        let show = !self.prefs.show_history;
        self.storage.set(keys::SHOW_HISTORY, if show { "true" } else { "false" })?;
        self.prefs.show_history = show;
        Ok(show)
    }

    /// Prepend a record, keeping at most [`HISTORY_LIMIT`].
    pub fn add_history(&mut self, entry: NewHistoryEntry) -> Result<&HistoryEntry> {
        let mut history = self.history.clone();
        history.push(entry, now_millis());
        self.write_history(&history)?;
        self.history = history;
        Ok(&self.history.entries()[0])
    }

    /// Returns whether an entry was removed.
    pub fn remove_history(&mut self, id: &str) -> Result<bool> {
        let mut history = self.history.clone();
        if !history.remove(id) {
            return Ok(false);
        }
        self.write_history(&history)?;
        self.history = history;
        Ok(true)
    }

    pub fn clear_history(&mut self) -> Result<()> {
        self.write_history(&History::default())?;
        self.history.clear();
        Ok(())
    }

    fn write_history(&mut self, history: &History) -> Result<()> {
        let json = serde_json::to_string(history.entries())?;
        self.storage.set(keys::HISTORY, &json)
    }
}

fn read_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring malformed stored value for {}: {}", key, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_memory() -> (PreferenceStore, MemoryStorage) {
        let storage = MemoryStorage::new();
        (PreferenceStore::open(Box::new(storage.clone())), storage)
    }

    fn entry(text: &str) -> NewHistoryEntry {
        NewHistoryEntry {
            source_language: "zh".to_string(),
            target_language: "en".to_string(),
            source_text: text.to_string(),
            translated_text: text.to_uppercase(),
            model: Some("gpt-4o-mini".to_string()),
        }
    }

    #[test]
    fn test_defaults() {
        let (store, _) = open_memory();
        let prefs = store.preferences();
        assert_eq!(prefs.source_language, "zh");
        assert_eq!(prefs.target_language, "en");
        assert_eq!(prefs.result_language_mode, ResultLanguageMode::Auto);
        assert_eq!(prefs.selected_model, "gpt-4o-mini");
        assert_eq!(prefs.font_size, DEFAULT_FONT_SIZE);
        assert!(ProviderKind::ALL.iter().all(|k| prefs.is_enabled(*k)));
        assert!(!prefs.show_history);
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_font_size_clamped() {
        let (mut store, _) = open_memory();
        assert_eq!(store.set_font_size(1000).unwrap(), 36);
        assert_eq!(store.preferences().font_size, 36);
        assert_eq!(store.set_font_size(-5).unwrap(), 14);
        assert_eq!(store.preferences().font_size, 14);
        assert_eq!(store.set_font_size(20).unwrap(), 20);
    }

    #[test]
    fn test_stored_font_size_clamped_on_load() {
        let mut storage = MemoryStorage::new();
        storage.set("font_size", "99").unwrap();
        let store = PreferenceStore::open(Box::new(storage));
        assert_eq!(store.preferences().font_size, 36);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let mut storage = MemoryStorage::new();
        storage.set("font_size", "large").unwrap();
        storage.set("translate_history", "[{broken").unwrap();
        storage.set("saved_prompts", "nope").unwrap();
        storage.set("openai_model", "gpt-9").unwrap();
        storage.set("my_lang", "klingon").unwrap();
        storage.set("openai_api_key", "!!!").unwrap();

        let store = PreferenceStore::open(Box::new(storage));
        let prefs = store.preferences();
        assert_eq!(prefs.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(prefs.selected_model, DEFAULT_MODEL);
        assert_eq!(prefs.source_language, "zh");
        assert!(prefs.api_key(ProviderKind::OpenAi).is_none());
        assert!(prefs.prompt_templates.is_empty());
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_reopen_restores_everything() {
        let storage = MemoryStorage::new();
        {
            let mut store = PreferenceStore::open(Box::new(storage.clone()));
            store.set_language_pair("en", "ja").unwrap();
            store.set_result_language_mode(ResultLanguageMode::Explicit("fr".into())).unwrap();
            store.set_model("deepseek").unwrap();
            store.set_api_key(ProviderKind::DeepSeek, "sk-deepseek-123").unwrap();
            store.set_provider_enabled(ProviderKind::Google, false).unwrap();
            store.add_prompt_template("formal", "Translate formally.").unwrap();
            store.add_history(entry("hello")).unwrap();
            store.toggle_show_history().unwrap();
        }

        let store = PreferenceStore::open(Box::new(storage));
        let prefs = store.preferences();
        assert_eq!(prefs.source_language, "en");
        assert_eq!(prefs.target_language, "ja");
        assert_eq!(prefs.result_language_mode, ResultLanguageMode::Explicit("fr".into()));
        assert_eq!(prefs.selected_model, "deepseek");
        assert_eq!(prefs.api_key(ProviderKind::DeepSeek), Some("sk-deepseek-123"));
        assert!(!prefs.is_enabled(ProviderKind::Google));
        assert!(prefs.is_enabled(ProviderKind::OpenAi));
        assert_eq!(prefs.prompt_templates[0].name, "formal");
        assert!(prefs.show_history);
        assert_eq!(store.history()[0].source_text, "hello");
    }

    #[test]
    fn test_api_key_not_stored_in_plaintext() {
        let (mut store, storage) = open_memory();
        store.set_api_key(ProviderKind::OpenAi, "  sk-secret  ").unwrap();

        let raw = storage.get("openai_api_key").unwrap();
        assert!(!raw.contains("sk-secret"));
        assert_eq!(store.preferences().api_key(ProviderKind::OpenAi), Some("sk-secret"));

        store.clear_api_key(ProviderKind::OpenAi).unwrap();
        assert!(storage.get("openai_api_key").is_none());
        assert!(store.preferences().api_key(ProviderKind::OpenAi).is_none());
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let (mut store, storage) = open_memory();
        assert!(store.set_api_key(ProviderKind::Google, "   ").is_err());
        assert!(store.set_api_key(ProviderKind::Mock, "key").is_err());
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn test_language_validation() {
        let (mut store, storage) = open_memory();
        assert!(store.set_target_language("it").is_err());
        assert!(store.set_source_language("xx").is_err());
        assert!(store.set_result_language_mode(ResultLanguageMode::Explicit("xx".into())).is_err());
        assert!(store.set_model("gpt-9").is_err());
        assert_eq!(storage.write_count(), 0);

        store.set_target_language("ko").unwrap();
        assert_eq!(store.preferences().target_language, "ko");
    }

    #[test]
    fn test_empty_prompt_name_rejected_before_write() {
        let (mut store, storage) = open_memory();
        let result = store.add_prompt_template("", "Translate formally.");
        assert!(matches!(result, Err(QuicktransError::Validation(_))));
        let result = store.add_prompt_template("   ", "Translate formally.");
        assert!(result.is_err());

        assert_eq!(storage.write_count(), 0);
        assert!(storage.get("saved_prompts").is_none());
        assert!(store.preferences().prompt_templates.is_empty());
    }

    #[test]
    fn test_prompt_templates_newest_first() {
        let (mut store, _) = open_memory();
        store.add_prompt_template("a", "first").unwrap();
        let id = store.add_prompt_template("b", "second").unwrap().id.clone();

        assert_eq!(store.preferences().prompt_templates[0].name, "b");
        assert_eq!(store.find_prompt_template("a").unwrap().content, "first");

        assert!(store.remove_prompt_template(&id).unwrap());
        assert!(!store.remove_prompt_template(&id).unwrap());
        assert_eq!(store.preferences().prompt_templates.len(), 1);
    }

    #[test]
    fn test_history_capped_newest_first() {
        let (mut store, _) = open_memory();
        for i in 0..130 {
            let id = store.add_history(entry(&format!("t{}", i))).unwrap().id.clone();
            assert_eq!(store.history()[0].id, id);
            assert!(store.history().len() <= HISTORY_LIMIT);
        }
        assert_eq!(store.history().len(), HISTORY_LIMIT);
    }

    #[test]
    fn test_remove_history_preserves_order() {
        let (mut store, _) = open_memory();
        for text in ["a", "b", "c", "d"] {
            store.add_history(entry(text)).unwrap();
        }
        let id = store.history()[1].id.clone();

        assert!(store.remove_history(&id).unwrap());
        let texts: Vec<_> = store.history().iter().map(|e| e.source_text.as_str()).collect();
        assert_eq!(texts, vec!["d", "b", "a"]);
        assert!(!store.remove_history("missing").unwrap());
    }

    #[test]
    fn test_clear_history_persists() {
        let (mut store, storage) = open_memory();
        store.add_history(entry("a")).unwrap();
        store.clear_history().unwrap();

        assert!(store.history().is_empty());
        assert_eq!(storage.get("translate_history").as_deref(), Some("[]"));
    }

    #[test]
    fn test_failed_write_is_not_persisted_later() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let open_file = || PreferenceStore::open(Box::new(FileStorage::open(&path).unwrap()));

        let mut store = open_file();
        store.set_font_size(20).unwrap();

        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        assert!(store.set_model("deepseek").is_err());
        assert!(store.set_language_pair("ja", "fr").is_err());
        assert_eq!(store.preferences().selected_model, "gpt-4o-mini");
        assert_eq!(store.preferences().source_language, "zh");
        assert_eq!(store.preferences().target_language, "en");

        std::fs::remove_dir(&path).unwrap();
        store.set_font_size(22).unwrap();

        let reopened = open_file();
        let prefs = reopened.preferences();
        assert_eq!(prefs.selected_model, "gpt-4o-mini");
        assert_eq!(prefs.source_language, "zh");
        assert_eq!(prefs.target_language, "en");
        assert_eq!(prefs.font_size, 22);
    }

    #[test]
    fn test_result_mode_parsing() {
        assert_eq!("auto".parse::<ResultLanguageMode>().unwrap(), ResultLanguageMode::Auto);
        assert_eq!(
            "ja".parse::<ResultLanguageMode>().unwrap(),
            ResultLanguageMode::Explicit("ja".to_string())
        );
        assert!("xx".parse::<ResultLanguageMode>().is_err());
    }
}
