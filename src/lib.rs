//! A streaming terminal chat client for OpenAI-compatible chat completion
//! APIs.
//!
//! The library holds everything the `termline` binary is made of, so each
//! piece can be driven on its own: the [`OpenAi`] client and its
//! [`CompletionBackend`] seam, the SSE decoder, typed [`Fragment`] streams,
//! the [`Renderer`], and the [`chat`] loop.

// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod fragments;
pub mod render;
pub mod sse;
pub mod types;

mod observability;

// Re-exports
pub use chat::{ChatConfig, ChatSession, Conversation, LineSource, SessionState};
pub use client::{ChunkStream, CompletionBackend, OpenAi};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{Renderer, TerminalRenderer, render_transcript};
pub use types::*;
