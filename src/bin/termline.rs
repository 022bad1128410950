//! Interactive terminal chat over an OpenAI-compatible API.
//!
//! # Usage
//!
//! ```bash
//! # The key may also live in a .env file in the working directory
//! OPENAI_API_KEY=sk-... termline
//!
//! # Pick another model or endpoint
//! OPENAI_MODEL=gpt-4o OPENAI_BASE_URL=http://localhost:11434/v1 termline
//!
//! # Show request logs on stderr
//! TERMLINE_LOG=debug termline
//! ```
//!
//! Type a message at the `> ` prompt. Type `exit` or `:q` to quit.

use std::process::ExitCode;

use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use termline::chat::{self, ChatConfig, ChatSession};
use termline::{OpenAi, Renderer, Result, TerminalRenderer};

const LOG_ENV: &str = "TERMLINE_LOG";

/// Main entry point for the termline application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = ChatConfig::from_env();
    let mut renderer = TerminalRenderer::with_color(config.use_color);

    match chat_until_exit(&config, &mut renderer).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            renderer.print_error(&err.diagnostic());
            ExitCode::FAILURE
        }
    }
}

async fn chat_until_exit(config: &ChatConfig, renderer: &mut TerminalRenderer) -> Result<()> {
    let client = OpenAi::with_options(None, config.base_url.clone(), None)?;
    let mut session = ChatSession::new(client, config);
    let mut editor = DefaultEditor::new()?;

    renderer.print_info(&format!("termline (model: {})", session.model()));
    renderer.print_info("Type 'exit' or ':q' to quit\n");

    chat::run(&mut session, &mut editor, renderer).await
}
