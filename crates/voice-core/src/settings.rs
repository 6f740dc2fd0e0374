//! Engine settings loaded from TOML.
//!
//! - `Settings::default()` parses the embedded `default_settings.toml`
//! - `parse_settings_toml(toml_content)` parses and validates a custom file
//! - Settings are passed to the session explicitly; there is no global instance

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::language::LanguageId;
use crate::message_history::HistoryLimits;
use crate::reconcile::ReconcileOptions;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("unknown AI config: {0}")]
    UnknownAiConfig(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub scheduler: SchedulerSettings,
    pub reconcile: ReconcileSettings,
    pub history: HistorySettings,
    pub suggestions: SuggestionSettings,
    pub ai: AiSettings,
    pub speech: SpeechSettings,
    /// Keyed by language code (`en`, `ja`, `zh`).
    #[serde(default)]
    pub languages: BTreeMap<String, LanguageSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    pub debounce_step_ms: u64,
    pub debounce_cap_ms: u64,
    pub debounce_window_ms: u64,
    pub context_threshold_chars: usize,
}

impl SchedulerSettings {
    pub fn debounce_step(&self) -> Duration {
        Duration::from_millis(self.debounce_step_ms)
    }

    pub fn debounce_cap(&self) -> Duration {
        Duration::from_millis(self.debounce_cap_ms)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileSettings {
    pub max_ops: usize,
    pub stability_margin: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySettings {
    pub input_capacity: usize,
    pub message_capacity: usize,
    pub continuation_window: usize,
    pub min_search_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionSettings {
    pub max_sentence_suggestions: usize,
    pub max_word_suggestions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSettings {
    pub default_config: String,
    #[serde(default)]
    pub persona: String,
    pub temperature: f64,
    pub configs: BTreeMap<String, AiConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub model_id: String,
}

/// Forwarded to the speech layer untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechSettings {
    pub voice_rate: f64,
    pub voice_pitch: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageSettings {
    pub sentence_macro_id: String,
    pub word_macro_id: String,
    #[serde(default)]
    pub initial_phrases: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        // build.rs checks the embedded file; validation failures are a bug.
        parse_settings_toml(DEFAULT_SETTINGS_TOML).expect("default settings TOML must be valid")
    }
}

impl Settings {
    pub fn from_toml(toml_str: &str) -> Result<Self, SettingsError> {
        parse_settings_toml(toml_str)
    }

    pub fn to_toml(&self) -> Result<String, SettingsError> {
        toml::to_string_pretty(self).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    pub fn history_limits(&self) -> HistoryLimits {
        HistoryLimits {
            capacity: self.history.message_capacity,
            continuation_window: self.history.continuation_window,
            min_search_length: self.history.min_search_length,
        }
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            max_ops: self.reconcile.max_ops,
            stability_margin: self.reconcile.stability_margin,
        }
    }

    pub fn language(&self, id: LanguageId) -> Option<&LanguageSettings> {
        self.languages.get(id.code())
    }

    pub fn initial_phrases(&self, id: LanguageId) -> &[String] {
        self.language(id)
            .map(|l| l.initial_phrases.as_slice())
            .unwrap_or(&[])
    }

    /// Model id for the named AI config, or the default config when `None`.
    pub fn model_id(&self, config: Option<&str>) -> Result<&str, SettingsError> {
        let name = config.unwrap_or(&self.ai.default_config);
        self.ai
            .configs
            .get(name)
            .map(|c| c.model_id.as_str())
            .ok_or_else(|| SettingsError::UnknownAiConfig(name.to_string()))
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_positive {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }
    macro_rules! check_range {
        ($section:ident . $field:ident, $range:expr) => {
            if !($range).contains(&s.$section.$field) {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: format!("must be within {:?}", $range),
                });
            }
        };
    }

    check_positive!(scheduler.debounce_window_ms);
    check_positive!(scheduler.context_threshold_chars);
    if s.scheduler.debounce_step_ms > s.scheduler.debounce_cap_ms {
        return Err(SettingsError::InvalidValue {
            field: "scheduler.debounce_step_ms".to_string(),
            reason: "must not exceed scheduler.debounce_cap_ms".to_string(),
        });
    }

    check_positive!(reconcile.max_ops);

    check_positive!(history.input_capacity);
    check_positive!(history.message_capacity);

    check_positive!(suggestions.max_sentence_suggestions);
    check_positive!(suggestions.max_word_suggestions);

    check_range!(ai.temperature, 0.0..=2.0);
    if !s.ai.configs.contains_key(&s.ai.default_config) {
        return Err(SettingsError::UnknownAiConfig(s.ai.default_config.clone()));
    }
    for (name, config) in &s.ai.configs {
        if config.model_id.is_empty() {
            return Err(SettingsError::InvalidValue {
                field: format!("ai.configs.{name}.model_id"),
                reason: "must not be empty".to_string(),
            });
        }
    }

    check_range!(speech.voice_rate, 0.1..=10.0);
    check_range!(speech.voice_pitch, -20.0..=20.0);

    for (code, lang) in &s.languages {
        if LanguageId::from_code(code).is_none() {
            return Err(SettingsError::InvalidValue {
                field: format!("languages.{code}"),
                reason: "unsupported language code".to_string(),
            });
        }
        if lang.sentence_macro_id.is_empty() || lang.word_macro_id.is_empty() {
            return Err(SettingsError::InvalidValue {
                field: format!("languages.{code}"),
                reason: "macro ids must not be empty".to_string(),
            });
        }
    }

    Ok(())
}
