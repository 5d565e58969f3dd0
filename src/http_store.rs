//! HTTP [`CaseStore`] backed by the caselens backend service.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list | `GET /api/cases` |
//! | query | `GET /api/case/{id}` (404 → `None`) |
//! | upload | `POST /upload` multipart: `case_name`, repeated `files`, optional `case_id` |
//! | rename | `PATCH /api/case/{id}` with `{"name": …}` |
//! | delete | `DELETE /api/case/{id}` |
//!
//! Uploads carry no client-side timeout or size cap; every other call is
//! bounded by `[api].timeout_secs`.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use caselens_core::models::{CaseId, CaseListing, CaseRecord};
use caselens_core::store::CaseStore;
use caselens_core::upload::{UploadFile, UploadRequest};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;

#[derive(Error, Debug)]
pub enum HttpStoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("upload response did not include a case_id")]
    MissingCaseId,
}

#[derive(Deserialize)]
struct UploadResponse {
    case_id: Option<CaseId>,
}

#[derive(Serialize)]
struct RenameBody<'a> {
    name: &'a str,
}

pub struct HttpCaseStore {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpCaseStore {
    /// `base_url` should be like `http://localhost:8000`; a trailing slash
    /// is dropped.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HttpStoreError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self, HttpStoreError> {
        Self::new(&api.base_url, Duration::from_secs(api.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(resp: Response) -> Result<Response, HttpStoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), %body, "backend returned an error");
        Err(HttpStoreError::Server {
            status: status.as_u16(),
            body,
        })
    }
}

fn file_part(file: &UploadFile) -> Result<Part, HttpStoreError> {
    let mime = if file.name.to_ascii_lowercase().ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    };
    Ok(Part::bytes(file.bytes.to_vec())
        .file_name(file.name.clone())
        .mime_str(mime)?)
}

#[async_trait]
impl CaseStore for HttpCaseStore {
    async fn list_cases(&self) -> Result<Vec<CaseListing>> {
        let url = self.url("/api/cases");
        debug!(url = %url, "listing cases");
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(HttpStoreError::from)?;
        let cases: Vec<CaseListing> = Self::check(resp)
            .await?
            .json()
            .await
            .map_err(HttpStoreError::from)?;
        Ok(cases)
    }

    async fn get_case(&self, id: CaseId) -> Result<Option<CaseRecord>> {
        let url = self.url(&format!("/api/case/{}", id));
        debug!(url = %url, "fetching case");
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(HttpStoreError::from)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let record: CaseRecord = Self::check(resp)
            .await?
            .json()
            .await
            .map_err(HttpStoreError::from)?;
        Ok(Some(record))
    }

    async fn upload(&self, request: &UploadRequest) -> Result<CaseId> {
        let url = self.url("/upload");
        let mut form = Form::new().text("case_name", request.case_name.clone());
        for file in &request.files {
            form = form.part("files", file_part(file)?);
        }
        if let Some(target) = request.target {
            form = form.text("case_id", target.to_string());
        }

        let total_bytes: u64 = request.files.iter().map(|f| f.size).sum();
        info!(
            url = %url,
            files = request.files.len(),
            bytes = total_bytes,
            target = ?request.target,
            "uploading batch"
        );
        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(HttpStoreError::from)?;
        let body: UploadResponse = Self::check(resp)
            .await?
            .json()
            .await
            .map_err(HttpStoreError::from)?;
        let case_id = body.case_id.ok_or(HttpStoreError::MissingCaseId)?;
        info!(%case_id, "upload accepted");
        Ok(case_id)
    }

    async fn rename_case(&self, id: CaseId, name: &str) -> Result<()> {
        let url = self.url(&format!("/api/case/{}", id));
        info!(url = %url, name, "renaming case");
        let resp = self
            .client
            .patch(&url)
            .timeout(self.timeout)
            .json(&RenameBody { name })
            .send()
            .await
            .map_err(HttpStoreError::from)?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn delete_case(&self, id: CaseId) -> Result<()> {
        let url = self.url(&format!("/api/case/{}", id));
        info!(url = %url, "deleting case");
        let resp = self
            .client
            .delete(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(HttpStoreError::from)?;
        Self::check(resp).await?;
        Ok(())
    }
}
