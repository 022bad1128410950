use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Fragment, Role};

/// One `chat.completion.chunk` object from a streamed reply.
///
/// Fields the client does not use are ignored during deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionChunk {
    /// Identifier shared by every chunk of one completion.
    #[serde(default)]
    pub id: String,

    /// Object type, always `chat.completion.chunk`.
    #[serde(default)]
    pub object: String,

    /// Unix timestamp of when the completion was created.
    #[serde(default)]
    pub created: u64,

    /// The model that produced the chunk.
    #[serde(default)]
    pub model: String,

    /// Incremental choices. Chunks that only carry usage have none.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// A single incremental choice within a chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkChoice {
    /// Index of the choice this delta belongs to.
    #[serde(default)]
    pub index: u32,

    /// What changed since the previous chunk.
    #[serde(default)]
    pub delta: ChunkDelta,

    /// Set on the final chunk of a choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

/// The incremental part of a choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkDelta {
    /// Announced once at the start of a reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// Next piece of reply text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Why the model stopped producing tokens.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of the reply or a stop sequence.
    Stop,

    /// The token limit was reached.
    Length,

    /// Content was omitted by a moderation filter.
    ContentFilter,

    /// The model wants to call tools.
    ToolCalls,

    /// The model wants to call a function (legacy).
    FunctionCall,

    /// A reason this client does not know about.
    #[serde(other)]
    Other,
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "stop"),
            FinishReason::Length => write!(f, "length"),
            FinishReason::ContentFilter => write!(f, "content_filter"),
            FinishReason::ToolCalls => write!(f, "tool_calls"),
            FinishReason::FunctionCall => write!(f, "function_call"),
            FinishReason::Other => write!(f, "other"),
        }
    }
}

impl ChatCompletionChunk {
    /// The first choice, which is the only one a single-reply request gets.
    pub fn first_choice(&self) -> Option<&ChunkChoice> {
        self.choices.first()
    }

    /// Classify this chunk as text-bearing or metadata-only.
    pub fn into_fragment(self) -> Fragment {
        let Some(choice) = self.choices.into_iter().next() else {
            return Fragment::Other {
                finish_reason: None,
            };
        };
        match choice.delta.content {
            Some(text) if !text.is_empty() => Fragment::TextDelta(text),
            _ => Fragment::Other {
                finish_reason: choice.finish_reason,
            },
        }
    }
}

impl From<ChatCompletionChunk> for Fragment {
    fn from(chunk: ChatCompletionChunk) -> Self {
        chunk.into_fragment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_value, json};

    #[test]
    fn role_announcement_is_metadata() {
        let chunk: ChatCompletionChunk = from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "created": 1700000000,
            "model": "gpt-4o",
            "choices": [{"index": 0, "delta": {"role": "assistant", "content": ""}, "finish_reason": null}]
        }))
        .unwrap();
        assert_eq!(chunk.first_choice().unwrap().delta.role, Some(Role::Assistant));
        assert_eq!(
            chunk.into_fragment(),
            Fragment::Other {
                finish_reason: None
            }
        );
    }

    #[test]
    fn content_delta_is_text() {
        let chunk: ChatCompletionChunk = from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "delta": {"content": "Hel"}}]
        }))
        .unwrap();
        assert_eq!(chunk.into_fragment(), Fragment::TextDelta("Hel".to_string()));
    }

    #[test]
    fn final_chunk_carries_finish_reason() {
        let chunk: ChatCompletionChunk = from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]
        }))
        .unwrap();
        assert_eq!(
            chunk.into_fragment(),
            Fragment::Other {
                finish_reason: Some(FinishReason::Stop)
            }
        );
    }

    #[test]
    fn usage_only_chunk_has_no_choices() {
        let chunk: ChatCompletionChunk = from_value(json!({
            "id": "chatcmpl-1",
            "choices": [],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
        }))
        .unwrap();
        assert!(chunk.first_choice().is_none());
        assert!(!chunk.into_fragment().is_text());
    }

    #[test]
    fn unknown_finish_reason() {
        let chunk: ChatCompletionChunk = from_value(json!({
            "choices": [{"index": 0, "delta": {}, "finish_reason": "something_new"}]
        }))
        .unwrap();
        assert_eq!(
            chunk.first_choice().unwrap().finish_reason,
            Some(FinishReason::Other)
        );
    }
}
