//! HTTP access to the document chat backend.

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    error::ErrorBody,
    protocol::{
        ChatResponse, HealthResponse, StatusResponse, UploadResponse, CHAT_PATH,
        CHAT_QUERY_FIELD, HEALTH_PATH, STATUS_PATH, UPLOAD_FILE_FIELD, UPLOAD_PATH,
    },
};
use tracing::debug;
use url::Url;

use crate::{error::RequestError, types::FileHandle, types::PDF_MIME_TYPE};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn status(&self) -> Result<StatusResponse, RequestError>;
    async fn upload_pdf(&self, file: &FileHandle) -> Result<UploadResponse, RequestError>;
    async fn chat(&self, query: &str) -> Result<ChatResponse, RequestError>;
    async fn health(&self) -> Result<HealthResponse, RequestError>;
}

pub struct HttpBackend {
    http: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: Url) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, mut base_url: Url) -> Self {
        // Url::join drops the last path segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, RequestError> {
        self.base_url
            .join(path)
            .map_err(|err| RequestError::Transport(format!("invalid endpoint {path}: {err}")))
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RequestError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(RequestError::Http {
                status: status.as_u16(),
                detail: ErrorBody::detail_from_bytes(&body),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| RequestError::Decode(err.to_string()))
    }
}

#[async_trait]
impl DocumentBackend for HttpBackend {
    async fn status(&self) -> Result<StatusResponse, RequestError> {
        let url = self.endpoint(STATUS_PATH)?;
        debug!(%url, "requesting document status");
        let response = self.http.get(url).send().await?;
        Self::read_json(response).await
    }

    async fn upload_pdf(&self, file: &FileHandle) -> Result<UploadResponse, RequestError> {
        let url = self.endpoint(UPLOAD_PATH)?;
        debug!(%url, file = file.name(), size_bytes = file.len(), "uploading document");
        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(PDF_MIME_TYPE)?;
        let form = Form::new().part(UPLOAD_FILE_FIELD, part);
        let response = self.http.post(url).multipart(form).send().await?;
        Self::read_json(response).await
    }

    async fn chat(&self, query: &str) -> Result<ChatResponse, RequestError> {
        let url = self.endpoint(CHAT_PATH)?;
        debug!(%url, query_len = query.len(), "submitting question");
        let form = Form::new().text(CHAT_QUERY_FIELD, query.to_string());
        let response = self.http.post(url).multipart(form).send().await?;
        Self::read_json(response).await
    }

    async fn health(&self) -> Result<HealthResponse, RequestError> {
        let url = self.endpoint(HEALTH_PATH)?;
        let response = self.http.get(url).send().await?;
        Self::read_json(response).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
