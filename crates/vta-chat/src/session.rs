//! Session controller: drives one chat turn at a time.
//!
//! A turn is augment (optional) -> complete -> append. Only one turn may be
//! in flight; a submit that arrives while busy is dropped, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;
use vta_core::Message;

use crate::augment::ContextAugmenter;
use crate::completion::CompletionClient;
use crate::transcript::Transcript;

/// Assistant message appended when a completion fails for any reason.
pub const FALLBACK_REPLY: &str = "Sorry, there was an error processing your request.";

/// What a call to [`SessionController::submit`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// Another turn was in flight; the input was dropped.
    Busy,
    /// The endpoint replied and the reply was appended.
    Replied(String),
    /// The request failed and [`FALLBACK_REPLY`] was appended.
    Failed,
}

/// Clears the busy flag when dropped, whatever path the turn took.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Owns the transcript for one chat session.
pub struct SessionController {
    id: Uuid,
    completion: Arc<dyn CompletionClient>,
    augmenter: ContextAugmenter,
    transcript: Mutex<Transcript>,
    busy: AtomicBool,
    augment: AtomicBool,
}

impl SessionController {
    pub fn new(completion: Arc<dyn CompletionClient>, augmenter: ContextAugmenter) -> Self {
        Self {
            id: Uuid::new_v4(),
            completion,
            augmenter,
            transcript: Mutex::new(Transcript::new()),
            busy: AtomicBool::new(false),
            augment: AtomicBool::new(false),
        }
    }

    /// Start with knowledge-base augmentation on or off.
    pub fn with_augment(self, enabled: bool) -> Self {
        self.augment.store(enabled, Ordering::Relaxed);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn augment_enabled(&self) -> bool {
        self.augment.load(Ordering::Relaxed)
    }

    pub fn set_augment(&self, enabled: bool) {
        self.augment.store(enabled, Ordering::Relaxed);
        tracing::debug!(session = %self.id, enabled, "Knowledge-base augmentation set");
    }

    /// Flip augmentation and return the new setting.
    pub fn toggle_augment(&self) -> bool {
        let enabled = !self.augment.fetch_xor(true, Ordering::Relaxed);
        tracing::debug!(session = %self.id, enabled, "Knowledge-base augmentation toggled");
        enabled
    }

    /// Snapshot of the transcript.
    pub fn transcript(&self) -> Transcript {
        self.lock_transcript().clone()
    }

    /// Submit user input and wait for the assistant's reply.
    ///
    /// `known_files` is the current knowledge-base file list, handed to the
    /// lookup when augmentation is on. The user message stays in the
    /// transcript even if the request fails.
    pub async fn submit(&self, text: &str, known_files: &[String]) -> SubmitOutcome {
        if text.trim().is_empty() {
            return SubmitOutcome::Ignored;
        }

        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            tracing::debug!(session = %self.id, "Submission dropped while busy");
            return SubmitOutcome::Busy;
        };

        let history = {
            let mut transcript = self.lock_transcript();
            let history = transcript.messages().to_vec();
            transcript.push(Message::user(text));
            history
        };

        let mut request = Vec::with_capacity(history.len() + 2);
        if self.augment_enabled() {
            request.push(self.augmenter.system_message(text, known_files).await);
        }
        request.extend(history);
        request.push(Message::user(text));

        match self.completion.complete(&request).await {
            Ok(reply) => {
                tracing::debug!(session = %self.id, chars = reply.len(), "Completion received");
                self.lock_transcript().push(Message::assistant(reply.clone()));
                SubmitOutcome::Replied(reply)
            }
            Err(e) => {
                tracing::error!(session = %self.id, error = %e, "Completion failed");
                self.lock_transcript().push(Message::assistant(FALLBACK_REPLY));
                SubmitOutcome::Failed
            }
        }
    }

    fn lock_transcript(&self) -> MutexGuard<'_, Transcript> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
