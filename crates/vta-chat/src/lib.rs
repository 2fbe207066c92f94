//! Chat session engine for the Virtual TA.
//!
//! Holds the transcript, talks to an OpenAI-compatible completion endpoint,
//! optionally prepends knowledge-base context, and tracks the documents the
//! external knowledge store has accepted.

pub mod augment;
pub mod completion;
pub mod error;
pub mod registry;
pub mod session;
pub mod store;
pub mod transcript;

pub use augment::{ContextAugmenter, KnowledgeLookup, PlaceholderLookup};
pub use completion::{CompletionClient, HttpCompletionClient};
pub use error::ChatError;
pub use registry::{FileState, UploadRegistry};
pub use session::{SessionController, SubmitOutcome, FALLBACK_REPLY};
pub use store::{DeleteResponse, HttpKnowledgeStore, KnowledgeStore, UploadFile, UploadResponse};
pub use transcript::Transcript;
