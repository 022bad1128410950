use serde::{Deserialize, Serialize};

use crate::types::{Message, Model};

/// Request body for `POST chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionParams {
    /// The model that will complete the conversation.
    pub model: Model,

    /// The full conversation, oldest message first.
    pub messages: Vec<Message>,

    /// Whether to receive the reply incrementally as server-sent events.
    #[serde(default)]
    pub stream: bool,
}

impl ChatCompletionParams {
    /// Create non-streaming parameters.
    pub fn new(model: Model, messages: Vec<Message>) -> Self {
        Self {
            model,
            messages,
            stream: false,
        }
    }

    /// Create parameters that request a streamed reply.
    pub fn new_streaming(model: Model, messages: Vec<Message>) -> Self {
        Self {
            stream: true,
            ..Self::new(model, messages)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;
    use serde_json::json;

    #[test]
    fn streaming_params_serialization() {
        let params = ChatCompletionParams::new_streaming(
            Model::Known(KnownModel::Gpt4o),
            vec![Message::system("be brief"), Message::user("hello")],
        );
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "gpt-4o",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hello"}
                ],
                "stream": true
            })
        );
    }
}
