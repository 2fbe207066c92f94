//! Filenames the knowledge store has confirmed, and the ones in flight.
//!
//! Entries move `PendingUpload -> Present -> PendingDelete -> Absent`.
//! A rejected upload drops back to `Absent`, a rejected delete to `Present`.
//! Nothing becomes visible through [`UploadRegistry::files`] until the store
//! confirms it.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::ChatError;
use crate::store::{KnowledgeStore, UploadFile};

/// Where a filename sits in the upload/delete lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileState {
    Absent,
    PendingUpload,
    Present,
    PendingDelete,
}

#[derive(Default)]
struct RegistryState {
    present: Vec<String>,
    pending_uploads: Vec<String>,
    pending_deletes: Vec<String>,
}

/// Confirm-then-mutate view of the knowledge store's documents.
///
/// Uploads and deletes may run concurrently with each other; the lock is
/// never held across a network call.
pub struct UploadRegistry {
    store: Arc<dyn KnowledgeStore>,
    accepted_extensions: Vec<String>,
    state: Mutex<RegistryState>,
}

impl UploadRegistry {
    pub fn new(store: Arc<dyn KnowledgeStore>, accepted_extensions: Vec<String>) -> Self {
        let accepted_extensions = accepted_extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Self {
            store,
            accepted_extensions,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Confirmed filenames in the order the store reported them.
    pub fn files(&self) -> Vec<String> {
        self.state().present.clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state().present.iter().any(|f| f == name)
    }

    pub fn state_of(&self, name: &str) -> FileState {
        let state = self.state();
        let present = state.present.iter().any(|f| f == name);
        if present && state.pending_deletes.iter().any(|f| f == name) {
            FileState::PendingDelete
        } else if present {
            FileState::Present
        } else if state.pending_uploads.iter().any(|f| f == name) {
            FileState::PendingUpload
        } else {
            FileState::Absent
        }
    }

    /// Whether the path has one of the extensions offered for upload.
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.accepted_extensions.iter().any(|a| *a == ext)
            })
            .unwrap_or(false)
    }

    /// Upload documents and record the names the store accepted.
    ///
    /// Returns the full confirmed list after the upload. On rejection or
    /// failure the registry is left as it was and the error is returned.
    pub async fn upload(&self, files: Vec<UploadFile>) -> Result<Vec<String>, ChatError> {
        if files.is_empty() {
            return Ok(self.files());
        }

        let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
        let pending = PendingGuard::new(self, Pending::Upload, names.clone());

        let result = self.store.upload(&files).await;

        let mut state = self.state();
        pending.settle(&mut state);

        match result {
            Ok(response) if response.success => {
                tracing::info!(
                    submitted = names.len(),
                    accepted = response.uploaded_files.len(),
                    "Files uploaded"
                );
                state.present.extend(response.uploaded_files);
                Ok(state.present.clone())
            }
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "store reported failure".to_string());
                tracing::warn!(files = ?names, message = %message, "File upload failed");
                Err(ChatError::Upload(message))
            }
            Err(e) => {
                tracing::warn!(files = ?names, error = %e, "Error uploading files");
                Err(e)
            }
        }
    }

    /// Ask the store to delete a file; forget it only once the store agrees.
    pub async fn delete(&self, name: &str) -> Result<(), ChatError> {
        let pending = PendingGuard::new(self, Pending::Delete, vec![name.to_string()]);

        let result = self.store.delete(name).await;

        let mut state = self.state();
        pending.settle(&mut state);

        match result {
            Ok(response) if response.success => {
                state.present.retain(|f| f != name);
                tracing::info!(file = %name, "File deleted");
                Ok(())
            }
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "store reported failure".to_string());
                tracing::warn!(file = %name, message = %message, "File deletion failed");
                Err(ChatError::Delete(message))
            }
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "Error deleting file");
                Err(e)
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone, Copy)]
enum Pending {
    Upload,
    Delete,
}

/// Marks names as in flight for as long as it lives.
///
/// Dropping it, including when the owning future is cancelled mid-request,
/// settles each name back to its state before the request.
struct PendingGuard<'a> {
    registry: &'a UploadRegistry,
    kind: Pending,
    names: Vec<String>,
}

impl<'a> PendingGuard<'a> {
    fn new(registry: &'a UploadRegistry, kind: Pending, names: Vec<String>) -> Self {
        let mut state = registry.state();
        let list = match kind {
            Pending::Upload => &mut state.pending_uploads,
            Pending::Delete => &mut state.pending_deletes,
        };
        list.extend(names.iter().cloned());
        drop(state);
        Self {
            registry,
            kind,
            names,
        }
    }

    /// Clear the names under a lock the caller already holds, so the
    /// outcome is applied in the same critical section.
    fn settle(mut self, state: &mut RegistryState) {
        self.release(state);
    }

    fn release(&mut self, state: &mut RegistryState) {
        let list = match self.kind {
            Pending::Upload => &mut state.pending_uploads,
            Pending::Delete => &mut state.pending_deletes,
        };
        for name in self.names.drain(..) {
            remove_one(list, &name);
        }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.names.is_empty() {
            return;
        }
        let registry = self.registry;
        let mut state = registry.state();
        self.release(&mut state);
    }
}

fn remove_one(list: &mut Vec<String>, name: &str) {
    if let Some(pos) = list.iter().position(|f| f == name) {
        list.remove(pos);
    }
}
