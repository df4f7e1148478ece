//! Prompt configuration
//!
//! [`PromptOptions`] holds everything a prompt session needs at construction
//! time. [`DemoConfig`] reads the console binary's settings from the
//! environment.

use crate::nlu::{FanOut, TableClientConfig};
use crate::recognizer::PatternTable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_PREFIX: &str = "I didn't understand. Say something in reply.";
pub const DEFAULT_TOO_MANY_ATTEMPTS: &str = "Too many attempts.";

/// Which recognizer gets the first look at a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precedence {
    /// Ask the NLU services first; fall back to patterns, then retry
    #[default]
    NluFirst,
    /// Try patterns first; an unmatched NLU answer ends the session
    PatternFirst,
}

impl From<bool> for Precedence {
    /// `true` selects [`Precedence::NluFirst`]
    fn from(is_luis_used_first: bool) -> Self {
        if is_luis_used_first {
            Precedence::NluFirst
        } else {
            Precedence::PatternFirst
        }
    }
}

/// Construction-time options of one prompt session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptOptions {
    /// Shown once when the session starts
    pub prompt: String,
    /// Retries allowed after an unrecognized reply
    pub attempts: u32,
    /// Shown before asking again
    pub retry: String,
    /// Shown once when the retry budget is exhausted
    pub too_many_attempts: String,
    /// Intents accepted as a match; `None` accepts any named intent
    pub luis_intents: Option<Vec<String>>,
    pub patterns: PatternTable,
    pub precedence: Precedence,
}

impl PromptOptions {
    pub fn new(prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        Self {
            retry: default_retry(&prompt),
            prompt,
            attempts: DEFAULT_ATTEMPTS,
            too_many_attempts: DEFAULT_TOO_MANY_ATTEMPTS.to_string(),
            luis_intents: None,
            patterns: PatternTable::default(),
            precedence: Precedence::default(),
        }
    }

    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: impl Into<String>) -> Self {
        self.retry = retry.into();
        self
    }

    #[must_use]
    pub fn with_too_many_attempts(mut self, text: impl Into<String>) -> Self {
        self.too_many_attempts = text.into();
        self
    }

    #[must_use]
    pub fn with_intents<I>(mut self, intents: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.luis_intents = Some(intents.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_patterns(mut self, patterns: PatternTable) -> Self {
        self.patterns = patterns;
        self
    }

    #[must_use]
    pub fn with_precedence(mut self, precedence: Precedence) -> Self {
        self.precedence = precedence;
        self
    }

    #[must_use]
    pub fn luis_used_first(self, is_luis_used_first: bool) -> Self {
        self.with_precedence(is_luis_used_first.into())
    }

    /// Whether `intent` passes the allow-list
    pub fn allows_intent(&self, intent: &str) -> bool {
        self.luis_intents
            .as_ref()
            .map_or(true, |allowed| allowed.iter().any(|name| name == intent))
    }
}

fn default_retry(prompt: &str) -> String {
    format!("{DEFAULT_RETRY_PREFIX}\n{prompt}")
}

/// Errors raised while loading demo configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("utterance file {0} defines no clients")]
    NoClients(PathBuf),
}

/// Shape of the file named by `NLU_PROMPT_UTTERANCES`
#[derive(Debug, Deserialize)]
struct UtteranceFile {
    clients: Vec<TableClientConfig>,
}

/// Settings of the console binary
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub options: PromptOptions,
    pub fan_out: FanOut,
    pub clients: Vec<TableClientConfig>,
}

impl DemoConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let prompt = lookup("NLU_PROMPT_TEXT").unwrap_or_else(|| "What would you do now?".to_string());
        let mut options = PromptOptions::new(prompt);

        if let Some(value) = lookup("NLU_PROMPT_ATTEMPTS") {
            let attempts = value.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    var: "NLU_PROMPT_ATTEMPTS",
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
            options = options.with_attempts(attempts);
        }

        let intents = lookup("NLU_PROMPT_INTENTS").unwrap_or_else(|| "Everything".to_string());
        let intents: Vec<String> = intents
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();
        if !intents.is_empty() {
            options = options.with_intents(intents);
        }

        if let Some(value) = lookup("NLU_PROMPT_PATTERN_FIRST") {
            let pattern_first = matches!(value.trim(), "1" | "true" | "yes");
            options = options.luis_used_first(!pattern_first);
        }

        let fan_out = match lookup("NLU_PROMPT_FAN_OUT") {
            Some(value) => value.parse().map_err(|reason| ConfigError::InvalidValue {
                var: "NLU_PROMPT_FAN_OUT",
                value: value.clone(),
                reason,
            })?,
            None => FanOut::default(),
        };

        let clients = match lookup("NLU_PROMPT_UTTERANCES") {
            Some(path) => load_utterance_file(PathBuf::from(path))?,
            None => vec![demo_client()],
        };

        Ok(Self {
            options,
            fan_out,
            clients,
        })
    }
}

fn load_utterance_file(path: PathBuf) -> Result<Vec<TableClientConfig>, ConfigError> {
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(source) => return Err(ConfigError::Io { path, source }),
    };
    let file: UtteranceFile = match serde_json::from_str(&raw) {
        Ok(file) => file,
        Err(source) => return Err(ConfigError::Parse { path, source }),
    };
    if file.clients.is_empty() {
        return Err(ConfigError::NoClients(path));
    }
    Ok(file.clients)
}

fn demo_client() -> TableClientConfig {
    TableClientConfig {
        name: "demo".to_string(),
        intents: [
            (
                "None".to_string(),
                vec!["No".to_string(), "Yes".to_string(), "I don't know".to_string()],
            ),
            ("Everything".to_string(), vec!["Everything".to_string()]),
        ]
        .into_iter()
        .collect(),
        score: 1.0,
        lenient: true,
    }
}
