use crate::types::FinishReason;

/// One incremental unit of a streamed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// A non-empty piece of reply text.
    TextDelta(String),

    /// A chunk with no text: role announcements, finish markers, usage.
    Other {
        /// Present on the chunk that ends the reply.
        finish_reason: Option<FinishReason>,
    },
}

impl Fragment {
    /// Returns the text carried by this fragment, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Fragment::TextDelta(text) => Some(text),
            Fragment::Other { .. } => None,
        }
    }

    /// Consumes the fragment and returns its text, if any.
    pub fn into_text(self) -> Option<String> {
        match self {
            Fragment::TextDelta(text) => Some(text),
            Fragment::Other { .. } => None,
        }
    }

    /// Returns true if this fragment carries text.
    pub fn is_text(&self) -> bool {
        matches!(self, Fragment::TextDelta(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_accessors() {
        let fragment = Fragment::TextDelta("abc".to_string());
        assert!(fragment.is_text());
        assert_eq!(fragment.text(), Some("abc"));
        assert_eq!(fragment.into_text(), Some("abc".to_string()));

        let fragment = Fragment::Other {
            finish_reason: Some(FinishReason::Length),
        };
        assert!(!fragment.is_text());
        assert_eq!(fragment.text(), None);
    }
}
