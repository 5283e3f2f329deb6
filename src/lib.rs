pub mod config;
pub mod dispatch;
pub mod error;
pub mod interactive;
pub mod language;
pub mod provider;
pub mod proxy;
pub mod store;

pub use config::Config;
pub use dispatch::{DispatchOptions, DispatchOutcome, DispatchState, Dispatcher, LanguageChange, Trigger};
pub use error::{QuicktransError, Result};
pub use provider::{FailureReason, ProviderFailure, ProviderKind, ProviderRouter, TranslationProvider, TranslationRequest};
pub use store::{PreferenceStore, ResultLanguageMode};
