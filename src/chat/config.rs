//! Configuration for the chat application.
//!
//! termline takes no command-line arguments; everything configurable comes
//! from the environment, which `main` first populates from a local `.env`
//! file if one exists.

use std::env;

use crate::chat::conversation::DEFAULT_SYSTEM_PROMPT;
use crate::types::Model;

/// Environment variable naming the model.
pub const MODEL_ENV: &str = "OPENAI_MODEL";
/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
/// Environment variable overriding the system prompt.
pub const SYSTEM_PROMPT_ENV: &str = "TERMLINE_SYSTEM_PROMPT";
/// Environment variable that disables ANSI styling when set to anything.
pub const NO_COLOR_ENV: &str = "NO_COLOR";

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after reading the
/// environment with appropriate defaults. The API key is not part of it;
/// the client reads that itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: Model,

    /// System prompt that opens every conversation.
    pub system_prompt: String,

    /// API base URL, or `None` for the client default.
    pub base_url: Option<String>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gpt-4.5-preview
    /// - System prompt: a terse terminal assistant
    /// - Base URL: client default
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: Model::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            base_url: None,
            use_color: true,
        }
    }

    /// Reads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads configuration through `lookup`, treating empty values as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::new();
        ChatConfig {
            model: get(MODEL_ENV).map(Model::from).unwrap_or(defaults.model),
            system_prompt: get(SYSTEM_PROMPT_ENV).unwrap_or(defaults.system_prompt),
            base_url: get(BASE_URL_ENV),
            use_color: get(NO_COLOR_ENV).is_none(),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}
