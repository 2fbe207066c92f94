//! HTTP access to the external knowledge-base document store.
//!
//! The store owns the documents. This side only submits uploads, requests
//! deletes, and reads back what the store says it accepted.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use vta_core::config::KnowledgeConfig;

use crate::error::ChatError;

/// Multipart field name the upload route expects, repeated once per file.
pub const UPLOAD_FIELD: &str = "files";

// =============================================================================
// Wire types
// =============================================================================

/// Body returned by the upload route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    /// Names the store accepted. May differ from the names submitted.
    #[serde(default)]
    pub uploaded_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body returned by the delete route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// =============================================================================
// UploadFile
// =============================================================================

/// A document selected for upload, held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime = infer_mime_type(&name);
        Self { name, bytes, mime }
    }

    /// Read a document from disk. The upload name is the path's file name.
    pub async fn from_path(path: &Path) -> Result<Self, ChatError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ChatError::UnsupportedFile(path.display().to_string()))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(name, bytes))
    }
}

fn infer_mime_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}

// =============================================================================
// KnowledgeStore
// =============================================================================

/// Remote store holding knowledge-base documents.
///
/// A store that answers with `success: false` returns `Ok`; `Err` is reserved
/// for requests that produced no usable answer at all.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    async fn upload(&self, files: &[UploadFile]) -> Result<UploadResponse, ChatError>;
    async fn delete(&self, name: &str) -> Result<DeleteResponse, ChatError>;
}

/// `KnowledgeStore` speaking to `POST {upload_path}` and
/// `DELETE {delete_path}/{name}` on the configured origin.
#[derive(Clone)]
pub struct HttpKnowledgeStore {
    client: Client,
    upload_url: Url,
    delete_base: Url,
}

impl HttpKnowledgeStore {
    pub fn new(config: &KnowledgeConfig) -> Result<Self, ChatError> {
        let base = config.base_url.trim_end_matches('/');
        let upload_url = parse_url(&format!("{}{}", base, config.upload_path))?;
        let delete_base = parse_url(&format!("{}{}", base, config.delete_path))?;

        Ok(Self {
            client: Client::new(),
            upload_url,
            delete_base,
        })
    }

    pub fn upload_url(&self) -> &Url {
        &self.upload_url
    }

    /// Delete route for a file, with the name percent-encoded as one segment.
    pub fn delete_url(&self, name: &str) -> Result<Url, ChatError> {
        let mut url = self.delete_base.clone();
        url.path_segments_mut()
            .map_err(|_| ChatError::InvalidUrl(self.delete_base.to_string()))?
            .pop_if_empty()
            .push(name);
        Ok(url)
    }
}

#[async_trait]
impl KnowledgeStore for HttpKnowledgeStore {
    async fn upload(&self, files: &[UploadFile]) -> Result<UploadResponse, ChatError> {
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.name.clone())
                .mime_str(&file.mime)
                .map_err(|err| ChatError::UnsupportedFile(format!("{}: {err}", file.name)))?;
            form = form.part(UPLOAD_FIELD, part);
        }

        let response = self
            .client
            .post(self.upload_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|err| ChatError::Transport(format!("upload request failed: {err}")))?;

        read_json(response).await
    }

    async fn delete(&self, name: &str) -> Result<DeleteResponse, ChatError> {
        let url = self.delete_url(name)?;
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|err| ChatError::Transport(format!("delete request failed: {err}")))?;

        read_json(response).await
    }
}

fn parse_url(raw: &str) -> Result<Url, ChatError> {
    Url::parse(raw).map_err(|err| ChatError::InvalidUrl(format!("{raw}: {err}")))
}

/// Decode a JSON body regardless of status; the store reports failures
/// in-band through `success`.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ChatError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|err| ChatError::Transport(format!("failed to read response: {err}")))?;

    serde_json::from_slice(&body).map_err(|err| {
        ChatError::Protocol(format!(
            "unexpected response (status {}): {err}",
            status.as_u16()
        ))
    })
}
