//! Translation dispatch: detect, resolve the target, call the provider,
//! record history.

use crate::error::{QuicktransError, Result};
use crate::language::{detect_language, is_supported};
use crate::provider::{lookup_model, ProviderFailure, ProviderRouter, TranslationRequest};
use crate::store::{NewHistoryEntry, PreferenceStore, Preferences, ResultLanguageMode};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Detecting,
    AwaitingProvider,
    Done,
    Failed,
}

/// What started a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Manual,
    Paste,
    LanguageChange,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Skip detection and treat the input as this language.
    pub source_language: Option<String>,
    /// Translate into this language, ignoring the result-language mode.
    pub target_language: Option<String>,
    pub system_prompt: Option<String>,
    /// Use this model for the call without changing the stored selection.
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Translated {
        source_language: String,
        target_language: String,
        text: String,
        history_id: String,
    },
    /// Input was already in the resolved target language.
    Unchanged { language: String, text: String },
    Failed {
        source_language: String,
        target_language: String,
        failure: ProviderFailure,
    },
}

/// A change to the language configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageChange {
    Source(String),
    Target(String),
    Pair { source: String, target: String },
    Mode(ResultLanguageMode),
}

/// Output language for text detected as `detected`.
///
/// In auto mode text in one language of the pair goes to the other one,
/// and anything else goes to the configured target.
pub fn resolve_target(detected: &str, prefs: &Preferences) -> String {
    match &prefs.result_language_mode {
        ResultLanguageMode::Explicit(code) => code.clone(),
        ResultLanguageMode::Auto => {
            if detected == prefs.source_language {
                prefs.target_language.clone()
            } else if detected == prefs.target_language {
                prefs.source_language.clone()
            } else {
                prefs.target_language.clone()
            }
        }
    }
}

pub struct Dispatcher {
    router: ProviderRouter,
    state: DispatchState,
    last_input: Option<(String, DispatchOptions)>,
}

impl Dispatcher {
    pub fn new(router: ProviderRouter) -> Self {
        Self {
            router,
            state: DispatchState::Idle,
            last_input: None,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Text of the most recent submission.
    pub fn last_input(&self) -> Option<&str> {
        self.last_input.as_ref().map(|(text, _)| text.as_str())
    }

    fn transition(&mut self, next: DispatchState) {
        debug!("Dispatch state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Translate `input` with the current preferences.
    ///
    /// Validation problems (blank input, unknown or disabled model, missing
    /// key) return an error before any network call. Provider failures are
    /// reported as [`DispatchOutcome::Failed`] and leave history untouched.
    pub async fn submit(
        &mut self,
        store: &mut PreferenceStore,
        input: &str,
        trigger: Trigger,
        options: &DispatchOptions,
    ) -> Result<DispatchOutcome> {
        if input.trim().is_empty() {
            self.last_input = None;
            self.transition(DispatchState::Idle);
            return Err(QuicktransError::validation("Please enter text to translate"));
        }
        debug!("Dispatch triggered by {:?}", trigger);
        self.last_input = Some((input.to_string(), options.clone()));

        self.transition(DispatchState::Detecting);
        let detected = match options.source_language.as_deref() {
            Some(code) if code != "auto" => {
                if !is_supported(code) {
                    self.transition(DispatchState::Idle);
                    return Err(QuicktransError::validation(format!("Unsupported language: {}", code)));
                }
                code.to_string()
            }
            _ => detect_language(input).to_string(),
        };

        let prefs = store.preferences();
        let target = match options.target_language.as_deref() {
            Some(code) => {
                if !is_supported(code) {
                    self.transition(DispatchState::Idle);
                    return Err(QuicktransError::validation(format!("Unsupported language: {}", code)));
                }
                code.to_string()
            }
            None => resolve_target(&detected, prefs),
        };
        debug!("Detected {}, resolved target {}", detected, target);

        let auto = options.target_language.is_none()
            && prefs.result_language_mode == ResultLanguageMode::Auto;
        if auto && detected == target {
            info!("Input is already {}, nothing to translate", target);
            self.transition(DispatchState::Done);
            return Ok(DispatchOutcome::Unchanged {
                language: target,
                text: input.to_string(),
            });
        }

        let model_id = options
            .model
            .clone()
            .unwrap_or_else(|| prefs.selected_model.clone());
        let provider = match self.select_provider(prefs, &model_id) {
            Ok(provider) => provider,
            Err(e) => {
                self.transition(DispatchState::Idle);
                return Err(e);
            }
        };

        let request = TranslationRequest {
            text: input.to_string(),
            source_language: detected.clone(),
            target_language: target.clone(),
            system_prompt: options.system_prompt.clone(),
        };

        self.transition(DispatchState::AwaitingProvider);
        info!("Translating {} -> {} with {}", detected, target, provider.name());

        match provider.translate(&request).await {
            Ok(text) => {
                let entry = store.add_history(NewHistoryEntry {
                    source_language: detected.clone(),
                    target_language: target.clone(),
                    source_text: input.to_string(),
                    translated_text: text.clone(),
                    model: Some(model_id),
                })?;
                let history_id = entry.id.clone();
                self.transition(DispatchState::Done);
                Ok(DispatchOutcome::Translated {
                    source_language: detected,
                    target_language: target,
                    text,
                    history_id,
                })
            }
            Err(failure) => {
                warn!("{} failed: {} ({})", provider.name(), failure.reason, failure.detail);
                self.transition(DispatchState::Failed);
                Ok(DispatchOutcome::Failed {
                    source_language: detected,
                    target_language: target,
                    failure,
                })
            }
        }
    }

    /// Apply a language setting and, if there is text on hand, translate it
    /// again under the new setting.
    pub async fn apply_language_change(
        &mut self,
        store: &mut PreferenceStore,
        change: LanguageChange,
    ) -> Result<Option<DispatchOutcome>> {
        match change {
            LanguageChange::Source(code) => store.set_source_language(&code)?,
            LanguageChange::Target(code) => store.set_target_language(&code)?,
            LanguageChange::Pair { source, target } => store.set_language_pair(&source, &target)?,
            LanguageChange::Mode(mode) => store.set_result_language_mode(mode)?,
        }

        let Some((text, options)) = self.last_input.clone() else {
            return Ok(None);
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        self.submit(store, &text, Trigger::LanguageChange, &options)
            .await
            .map(Some)
    }

    fn select_provider(
        &self,
        prefs: &Preferences,
        model_id: &str,
    ) -> Result<Box<dyn crate::provider::TranslationProvider>> {
        let spec = lookup_model(model_id)
            .ok_or_else(|| QuicktransError::validation(format!("Unknown model: {}", model_id)))?;
        if !prefs.is_enabled(spec.provider) {
            return Err(QuicktransError::validation(format!(
                "{} is disabled. Enable it with: quicktrans key enable {}",
                spec.provider, spec.provider
            )));
        }
        self.router.route(model_id, prefs.api_key(spec.provider))
    }
}
