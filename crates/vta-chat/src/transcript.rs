//! Ordered, append-only record of a chat session.

use vta_core::Message;

/// Chat turns in submission order.
///
/// The order is replayed verbatim to the completion endpoint, so there is no
/// API for removing or reordering entries. A transcript lives exactly as long
/// as its session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vta_core::Role;

    #[test]
    fn test_new_transcript_is_empty() {
        let transcript = Transcript::new();
        assert!(transcript.is_empty());
        assert_eq!(transcript.len(), 0);
        assert!(transcript.last().is_none());
    }

    #[test]
    fn test_push_preserves_order() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("first"));
        transcript.push(Message::assistant("second"));
        transcript.push(Message::user("third"));

        let contents: Vec<&str> = transcript
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(transcript.last().unwrap().role, Role::User);
    }
}
