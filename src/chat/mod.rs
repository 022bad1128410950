//! The interactive chat loop.
//!
//! This module provides a streaming REPL chat interface built on top of the
//! completion client. Each turn:
//!
//! - reads a line at the `> ` prompt, leaving on `exit` or `:q`
//! - streams the reply to the terminal token by token
//! - clears the screen and re-renders the whole conversation as markdown
//!
//! # Architecture
//!
//! - [`conversation`]: the message history and its ordering rules
//! - [`config`]: configuration from the environment
//! - [`commands`]: exit-token recognition
//! - [`session`]: one turn against the completion service

mod commands;
mod config;
mod conversation;
mod session;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

pub use commands::{EXIT_TOKENS, Input, is_exit_token, parse_input};
pub use config::{BASE_URL_ENV, ChatConfig, MODEL_ENV, NO_COLOR_ENV, SYSTEM_PROMPT_ENV};
pub use conversation::{Conversation, DEFAULT_SYSTEM_PROMPT};
pub use session::{ChatSession, SessionState};

use crate::Renderer;
use crate::client::CompletionBackend;
use crate::error::Result;

/// The prompt shown before each line of input.
pub const PROMPT: &str = "> ";

/// A source of input lines.
pub trait LineSource {
    /// Show `prompt` and read one line without its trailing newline.
    ///
    /// Returns `Ok(None)` when there is no more input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

impl LineSource for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            // Ctrl+D and Ctrl+C at the prompt both leave the chat.
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Run the chat loop until an exit token or the end of input.
///
/// Any error from the completion service ends the loop and is returned.
pub async fn run<B, L, R>(
    session: &mut ChatSession<B>,
    input: &mut L,
    renderer: &mut R,
) -> Result<()>
where
    B: CompletionBackend,
    L: LineSource + ?Sized,
    R: Renderer + ?Sized,
{
    loop {
        let Some(line) = input.read_line(PROMPT)? else {
            tracing::debug!("end of input");
            return session.exit();
        };
        match parse_input(&line) {
            Input::Exit => return session.exit(),
            Input::Message(text) => {
                session.send_streaming(&text, renderer).await?;
                renderer.render_conversation(session.conversation());
            }
        }
    }
}
