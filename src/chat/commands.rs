//! Classification of lines typed at the prompt.
//!
//! A line is either an exit token, which ends the session, or a message to
//! send. Exit tokens are matched after trimming surrounding whitespace;
//! messages are kept exactly as typed.

/// Lines that end the session.
pub const EXIT_TOKENS: [&str; 2] = ["exit", ":q"];

/// A parsed line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Leave the chat.
    Exit,

    /// Send this text as the next user message.
    Message(String),
}

/// Classify one line of input.
pub fn parse_input(line: &str) -> Input {
    if is_exit_token(line) {
        Input::Exit
    } else {
        Input::Message(line.to_string())
    }
}

/// Returns true if `line` is one of [`EXIT_TOKENS`], ignoring surrounding
/// whitespace.
pub fn is_exit_token(line: &str) -> bool {
    let line = line.trim();
    EXIT_TOKENS.iter().any(|token| *token == line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_tokens() {
        assert_eq!(parse_input("exit"), Input::Exit);
        assert_eq!(parse_input(":q"), Input::Exit);
        assert_eq!(parse_input("  exit \n"), Input::Exit);
        assert_eq!(parse_input("\t:q"), Input::Exit);
    }

    #[test]
    fn near_misses_are_messages() {
        assert_eq!(parse_input("Exit"), Input::Message("Exit".to_string()));
        assert_eq!(parse_input("exit now"), Input::Message("exit now".to_string()));
        assert_eq!(parse_input(":quit"), Input::Message(":quit".to_string()));
        assert_eq!(parse_input("/quit"), Input::Message("/quit".to_string()));
    }

    #[test]
    fn messages_keep_original_text() {
        assert_eq!(
            parse_input("  indented question "),
            Input::Message("  indented question ".to_string())
        );
        assert_eq!(parse_input(""), Input::Message(String::new()));
    }
}
