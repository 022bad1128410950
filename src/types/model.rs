use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Represents a chat completion model identifier.
///
/// This can be a well-known model or a custom string value for models
/// that are newer than this crate, fine-tuned, or served by a compatible
/// third-party endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Model {
    /// Known model versions
    Known(KnownModel),

    /// Custom model identifier
    Custom(String),
}

/// Well-known chat completion models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownModel {
    /// GPT-4.5 preview
    #[serde(rename = "gpt-4.5-preview")]
    Gpt45Preview,

    /// GPT-4o
    #[serde(rename = "gpt-4o")]
    Gpt4o,

    /// GPT-4o mini
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,

    /// GPT-4.1
    #[serde(rename = "gpt-4.1")]
    Gpt41,

    /// GPT-5
    #[serde(rename = "gpt-5")]
    Gpt5,
}

impl KnownModel {
    const ALL: [KnownModel; 5] = [
        KnownModel::Gpt45Preview,
        KnownModel::Gpt4o,
        KnownModel::Gpt4oMini,
        KnownModel::Gpt41,
        KnownModel::Gpt5,
    ];

    /// The identifier sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownModel::Gpt45Preview => "gpt-4.5-preview",
            KnownModel::Gpt4o => "gpt-4o",
            KnownModel::Gpt4oMini => "gpt-4o-mini",
            KnownModel::Gpt41 => "gpt-4.1",
            KnownModel::Gpt5 => "gpt-5",
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Known(KnownModel::Gpt45Preview)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Known(known_model) => write!(f, "{}", known_model),
            Model::Custom(custom) => write!(f, "{}", custom),
        }
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Model {
    /// Resolve an identifier, preferring a known model when one matches.
    fn resolve(id: &str) -> Self {
        let id = id.trim();
        KnownModel::ALL
            .into_iter()
            .find(|known| known.as_str() == id)
            .map(Model::Known)
            .unwrap_or_else(|| Model::Custom(id.to_string()))
    }
}

impl FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Model::resolve(s))
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        Model::resolve(&model)
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        Model::resolve(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_serialization() {
        let model = Model::Known(KnownModel::Gpt45Preview);
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#""gpt-4.5-preview""#);
    }

    #[test]
    fn custom_model_serialization() {
        let model = Model::Custom("my-finetune".to_string());
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#""my-finetune""#);
    }

    #[test]
    fn model_deserialization() {
        let model: Model = serde_json::from_str(r#""gpt-4o""#).unwrap();
        assert_eq!(model, Model::Known(KnownModel::Gpt4o));

        let model: Model = serde_json::from_str(r#""llama3""#).unwrap();
        assert_eq!(model, Model::Custom("llama3".to_string()));
    }

    #[test]
    fn parse_prefers_known_models() {
        let model: Model = " gpt-5 ".parse().unwrap();
        assert_eq!(model, Model::Known(KnownModel::Gpt5));

        let model: Model = "mistral-large".parse().unwrap();
        assert_eq!(model, Model::Custom("mistral-large".to_string()));
    }

    #[test]
    fn from_and_parse_agree() {
        let parsed: Model = "gpt-4o".parse().unwrap();
        assert_eq!(Model::from("gpt-4o"), parsed);
        assert_eq!(Model::from("gpt-4o".to_string()), parsed);
        assert_eq!(parsed, Model::Known(KnownModel::Gpt4o));
        assert_eq!(
            Model::from("local-llm"),
            Model::Custom("local-llm".to_string())
        );
    }

    #[test]
    fn default_is_gpt_45_preview() {
        assert_eq!(Model::default().to_string(), "gpt-4.5-preview");
    }
}
