// Public modules
pub mod chat_completion_chunk;
pub mod chat_completion_params;
pub mod fragment;
pub mod message;
pub mod model;

// Re-exports
pub use chat_completion_chunk::{ChatCompletionChunk, ChunkChoice, ChunkDelta, FinishReason};
pub use chat_completion_params::ChatCompletionParams;
pub use fragment::Fragment;
pub use message::{Message, Role};
pub use model::{KnownModel, Model};
