use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, error, info};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::backend::{
    AskRequest, AudioUpload, Backend, ByteStream, ErrorBody, PdfUpload, StatusResponse,
    StopRequest,
};
use crate::config::ClientConfig;
use crate::error::{BackendError, Result, UNKNOWN_SERVER_ERROR};

const UNKNOWN_UPLOAD_ERROR: &str = "Unknown error";

/// [`Backend`] over HTTP against the configured origin.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, &config.api_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn upload(&self, path: &str, field: &'static str, file: &Path) -> Result<Response> {
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| field.to_string());
        info!("Uploading {} ({} bytes) to {}", file_name, bytes.len(), path);

        let form = Form::new().part(field, Part::bytes(bytes).file_name(file_name));
        let response = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to upload to {}: {}", path, e);
                BackendError::from(e)
            })?;
        Ok(response)
    }
}

/// Decode a JSON success body, or turn a failure status into
/// [`BackendError::Server`] carrying the body's `error` field.
async fn json_or_error<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T> {
    if !response.status().is_success() {
        return Err(server_error(response, fallback).await);
    }
    Ok(response.json::<T>().await?)
}

async fn server_error(response: Response, fallback: &str) -> BackendError {
    let status = response.status().as_u16();
    let message = match response.text().await {
        Ok(body) => error_message(&body),
        Err(e) => {
            debug!("Failed to read error body: {}", e);
            None
        }
    }
    .unwrap_or_else(|| fallback.to_string());
    BackendError::Server { status, message }
}

/// The `error` field of a JSON error body, if there is one.
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .filter(|message| !message.is_empty())
}

#[async_trait]
impl Backend for HttpBackend {
    async fn status(&self) -> Result<StatusResponse> {
        let response = self.client.get(self.url("/status")).send().await?;
        json_or_error(response, UNKNOWN_SERVER_ERROR).await
    }

    async fn process_pdf(&self, path: &Path) -> Result<PdfUpload> {
        let response = self.upload("/process-pdf", "pdf", path).await?;
        json_or_error(response, UNKNOWN_UPLOAD_ERROR).await
    }

    async fn process_audio(&self, path: &Path) -> Result<AudioUpload> {
        let response = self.upload("/process-audio", "audio", path).await?;
        json_or_error(response, UNKNOWN_UPLOAD_ERROR).await
    }

    async fn ask(&self, request: &AskRequest) -> Result<ByteStream> {
        debug!("[{}] POST /ask", request.session_id);
        let response = self
            .client
            .post(self.url("/ask"))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("[{}] Failed to send question: {}", request.session_id, e);
                BackendError::from(e)
            })?;

        if !response.status().is_success() {
            return Err(server_error(response, UNKNOWN_SERVER_ERROR).await);
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| BackendError::Stream(e.to_string())));
        Ok(Box::pin(stream))
    }

    async fn stop(&self, session_id: &str) -> Result<()> {
        let body = StopRequest {
            session_id: session_id.to_string(),
        };
        self.client
            .post(self.url("/stop"))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn reset_index(&self) -> Result<()> {
        let response = self.client.post(self.url("/reset-index")).send().await?;
        json_or_error::<serde_json::Value>(response, UNKNOWN_UPLOAD_ERROR).await?;
        Ok(())
    }
}
