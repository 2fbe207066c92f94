//! Knowledge-base context for prompts.

use std::sync::Arc;

use async_trait::async_trait;
use vta_core::Message;

/// Finds material relevant to a query among the uploaded documents.
///
/// Lookups are infallible: an implementation that cannot find anything
/// returns an empty string, so the session never has to handle a lookup error.
#[async_trait]
pub trait KnowledgeLookup: Send + Sync {
    async fn lookup(&self, query: &str, files: &[String]) -> String;
}

/// Lookup that returns a fixed notice instead of searching.
///
/// Stands in until document retrieval against the knowledge store exists.
pub struct PlaceholderLookup;

impl PlaceholderLookup {
    pub const RESPONSE: &'static str =
        "Relevant information from the knowledge base would be returned here.";
}

#[async_trait]
impl KnowledgeLookup for PlaceholderLookup {
    async fn lookup(&self, query: &str, files: &[String]) -> String {
        tracing::debug!(query = %query, files = ?files, "Querying knowledge base");
        Self::RESPONSE.to_string()
    }
}

/// Builds the system message prepended when augmentation is on.
#[derive(Clone)]
pub struct ContextAugmenter {
    lookup: Arc<dyn KnowledgeLookup>,
}

impl ContextAugmenter {
    pub fn new(lookup: Arc<dyn KnowledgeLookup>) -> Self {
        Self { lookup }
    }

    /// Run the lookup and wrap its result in a system message.
    ///
    /// An empty lookup result yields a system message with empty content.
    pub async fn system_message(&self, query: &str, files: &[String]) -> Message {
        let info = self.lookup.lookup(query, files).await;
        if info.trim().is_empty() {
            Message::system("")
        } else {
            Message::system(format!("Relevant information: {}\n\n", info))
        }
    }
}

impl Default for ContextAugmenter {
    fn default() -> Self {
        Self::new(Arc::new(PlaceholderLookup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use vta_core::Role;

    struct RecordingLookup {
        answer: String,
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    #[async_trait]
    impl KnowledgeLookup for RecordingLookup {
        async fn lookup(&self, query: &str, files: &[String]) -> String {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), files.to_vec()));
            self.answer.clone()
        }
    }

    #[tokio::test]
    async fn test_placeholder_returns_constant() {
        let files = vec!["syllabus.pdf".to_string()];
        let a = PlaceholderLookup.lookup("when is the exam", &files).await;
        let b = PlaceholderLookup.lookup("something else", &[]).await;
        assert_eq!(a, PlaceholderLookup::RESPONSE);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_default_augmenter_wraps_placeholder() {
        let msg = ContextAugmenter::default().system_message("q", &[]).await;
        assert_eq!(msg.role, Role::System);
        assert_eq!(
            msg.content,
            format!("Relevant information: {}\n\n", PlaceholderLookup::RESPONSE)
        );
    }

    #[tokio::test]
    async fn test_empty_lookup_gives_empty_system_message() {
        let lookup = Arc::new(RecordingLookup {
            answer: String::new(),
            calls: Mutex::new(Vec::new()),
        });
        let augmenter = ContextAugmenter::new(lookup);
        let msg = augmenter.system_message("q", &[]).await;
        assert_eq!(msg, Message::system(""));
    }

    #[tokio::test]
    async fn test_lookup_receives_query_and_files() {
        let lookup = Arc::new(RecordingLookup {
            answer: "Exam is in week 9.".to_string(),
            calls: Mutex::new(Vec::new()),
        });
        let augmenter = ContextAugmenter::new(lookup.clone());
        let files = vec!["a.pdf".to_string(), "b.txt".to_string()];

        let msg = augmenter.system_message("when is the exam?", &files).await;

        assert_eq!(msg.content, "Relevant information: Exam is in week 9.\n\n");
        let calls = lookup.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "when is the exam?");
        assert_eq!(calls[0].1, files);
    }
}
