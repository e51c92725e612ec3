use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Raw answer body, chunk by chunk, in arrival order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskRequest {
    pub question: String,
    pub transcript: Option<String>,
    pub pdf_indexed: bool,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopRequest {
    pub session_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub pdf_processed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PdfUpload {
    pub pdf_filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AudioUpload {
    #[serde(default)]
    pub transcript: Option<String>,
    pub audio_filename: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// The remote ingestion/answering service.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn status(&self) -> Result<StatusResponse>;

    async fn process_pdf(&self, path: &Path) -> Result<PdfUpload>;

    async fn process_audio(&self, path: &Path) -> Result<AudioUpload>;

    /// Open the answer stream. Dropping the returned stream (or the pending
    /// future) aborts the underlying request.
    async fn ask(&self, request: &AskRequest) -> Result<ByteStream>;

    /// Ask the backend to halt generation for `session_id`.
    async fn stop(&self, session_id: &str) -> Result<()>;

    async fn reset_index(&self) -> Result<()>;
}
