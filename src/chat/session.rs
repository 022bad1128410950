//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which manages conversation
//! state and handles streaming API interactions.

use std::time::Instant;

use crate::Renderer;
use crate::chat::config::ChatConfig;
use crate::chat::conversation::Conversation;
use crate::client::CompletionBackend;
use crate::error::{Error, Result};
use crate::fragments::accumulate_text;
use crate::observability::{CHAT_TURN_ERRORS, CHAT_TURNS, STREAM_DURATION};
use crate::types::{Message, Model};

/// Where the chat loop is between two lines of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Waiting for the user to type a line.
    AwaitingInput,

    /// A reply is being streamed from the completion service.
    StreamingResponse,

    /// The user asked to leave; no further turns are accepted.
    Exited,
}

/// A chat session that manages conversation state and API interactions.
///
/// The session maintains message history and handles streaming responses
/// from the completion service.
pub struct ChatSession<B: CompletionBackend> {
    backend: B,
    model: Model,
    conversation: Conversation,
    state: SessionState,
}

impl<B: CompletionBackend> ChatSession<B> {
    /// Creates a new chat session with the given backend and configuration.
    pub fn new(backend: B, config: &ChatConfig) -> Self {
        Self {
            backend,
            model: config.model.clone(),
            conversation: Conversation::new(config.system_prompt.clone()),
            state: SessionState::AwaitingInput,
        }
    }

    /// Sends a user message and streams the response.
    ///
    /// This method:
    /// 1. Adds the user message to history
    /// 2. Sends a streaming request with the whole history
    /// 3. Prints response text as it arrives
    /// 4. Adds the complete assistant response to history
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the stream fails. The user message
    /// stays in the history without a reply, and the session accepts no
    /// further turns.
    pub async fn send_streaming<R: Renderer + ?Sized>(
        &mut self,
        user_input: &str,
        renderer: &mut R,
    ) -> Result<&Message> {
        if self.state != SessionState::AwaitingInput {
            return Err(Error::validation(
                format!("cannot send a message while {:?}", self.state),
                None,
            ));
        }
        self.conversation.push_user(user_input)?;
        self.state = SessionState::StreamingResponse;
        CHAT_TURNS.click();

        let reply = self.stream_reply(renderer).await;
        self.state = SessionState::AwaitingInput;

        match reply {
            Ok(reply) => {
                renderer.finish_response();
                self.conversation.push_assistant(reply)?;
                Ok(self.conversation.last())
            }
            Err(err) => {
                CHAT_TURN_ERRORS.click();
                tracing::warn!(error = %err, "turn failed");
                Err(err)
            }
        }
    }

    async fn stream_reply<R: Renderer + ?Sized>(&self, renderer: &mut R) -> Result<String> {
        let params = self.conversation.to_params(&self.model);
        let start = Instant::now();
        let chunks = self.backend.stream(params).await?;
        let reply = accumulate_text(chunks, |text| renderer.print_text(text)).await?;
        STREAM_DURATION.add(start.elapsed().as_secs_f64());
        tracing::debug!(chars = reply.len(), "reply complete");
        Ok(reply)
    }

    /// Ends the session. Only valid while awaiting input.
    pub fn exit(&mut self) -> Result<()> {
        match self.state {
            SessionState::AwaitingInput | SessionState::Exited => {
                self.state = SessionState::Exited;
                Ok(())
            }
            SessionState::StreamingResponse => Err(Error::validation(
                "cannot exit while a response is streaming",
                None,
            )),
        }
    }

    /// Returns the conversation so far.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }

    /// Returns the current model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Returns where the session is in its input/stream cycle.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the backend serving completions.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}
