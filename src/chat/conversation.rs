//! The in-memory conversation history.

use crate::error::{Error, Result};
use crate::types::{ChatCompletionParams, Message, Model, Role};

/// System prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a chat assistant living in my computer terminal. I am probably trying to get quick answers.";

/// An ordered conversation: one system message, then alternating user and
/// assistant messages.
///
/// Messages are never edited or removed once appended. The only way a user
/// message lacks a reply is while the reply is being streamed or after the
/// request for it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation with the given system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// All messages, oldest first. The first is always the system message.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages, including the system message.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false: a conversation holds at least its system message.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The system message.
    pub fn system(&self) -> &Message {
        &self.messages[0]
    }

    /// The most recent message.
    pub fn last(&self) -> &Message {
        &self.messages[self.messages.len() - 1]
    }

    /// Number of user messages that have been sent.
    pub fn turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|message| message.role == Role::User)
            .count()
    }

    /// Returns true if the last message is a user message with no reply yet.
    pub fn is_awaiting_reply(&self) -> bool {
        self.last().role == Role::User
    }

    /// Append a user message.
    ///
    /// Fails without changing anything if the previous user message has not
    /// been answered.
    pub fn push_user(&mut self, content: impl Into<String>) -> Result<()> {
        if self.is_awaiting_reply() {
            return Err(Error::validation(
                "the previous user message has no assistant reply",
                Some("role".to_string()),
            ));
        }
        self.messages.push(Message::user(content));
        Ok(())
    }

    /// Append the assistant's reply to the pending user message.
    ///
    /// Fails without changing anything if no user message is pending.
    pub fn push_assistant(&mut self, content: impl Into<String>) -> Result<()> {
        if !self.is_awaiting_reply() {
            return Err(Error::validation(
                "an assistant reply must follow a user message",
                Some("role".to_string()),
            ));
        }
        self.messages.push(Message::assistant(content));
        Ok(())
    }

    /// Streaming request parameters carrying the whole conversation.
    pub fn to_params(&self, model: &Model) -> ChatCompletionParams {
        ChatCompletionParams::new_streaming(model.clone(), self.messages.clone())
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_one_system_message() {
        let conversation = Conversation::default();
        assert_eq!(conversation.len(), 1);
        assert!(!conversation.is_empty());
        assert_eq!(conversation.system(), &Message::system(DEFAULT_SYSTEM_PROMPT));
        assert!(!conversation.is_awaiting_reply());
        assert_eq!(conversation.turns(), 0);
    }

    #[test]
    fn grows_by_two_per_turn() {
        let mut conversation = Conversation::new("sys");
        for turn in 1..=3 {
            conversation.push_user(format!("question {turn}")).unwrap();
            assert!(conversation.is_awaiting_reply());
            conversation.push_assistant(format!("answer {turn}")).unwrap();
            assert_eq!(conversation.len(), 1 + 2 * turn);
        }
        assert_eq!(conversation.turns(), 3);

        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant,
            ]
        );
        assert_eq!(
            conversation
                .messages()
                .iter()
                .filter(|m| m.role == Role::System)
                .count(),
            1
        );
    }

    #[test]
    fn rejects_out_of_order_messages() {
        let mut conversation = Conversation::new("sys");
        let err = conversation.push_assistant("unprompted").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(conversation.len(), 1);

        conversation.push_user("one").unwrap();
        let err = conversation.push_user("two").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.last(), &Message::user("one"));
    }

    #[test]
    fn params_carry_every_message() {
        let mut conversation = Conversation::new("sys");
        conversation.push_user("hello").unwrap();
        let params = conversation.to_params(&Model::default());
        assert!(params.stream);
        assert_eq!(params.messages, conversation.messages());
        assert_eq!(params.model, Model::default());
    }
}
