//! Google Drive folder document source.
//!
//! This module is only available when the `gdrive` feature is enabled.
//! Obtaining the OAuth access token is the caller's job; this source only
//! lists and downloads.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};

use crate::document::{META_GDRIVE_FILE_ID, Origin};
use crate::error::{RagError, Result};
use crate::source::{DocumentSource, SourceEntry};

/// The Drive v3 files endpoint.
const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

/// Page size requested when listing a folder.
const PAGE_SIZE: &str = "100";

/// Escape `value` for use inside a single-quoted Drive query string.
fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// The `q` expression selecting the non-trashed PDFs directly under `folder_id`.
fn folder_query(folder_id: &str) -> String {
    format!(
        "{} in parents and mimeType='application/pdf' and trashed=false",
        quote_literal(folder_id)
    )
}

/// A [`DocumentSource`] over the PDFs in one Google Drive folder.
///
/// Listing follows `nextPageToken` until the folder is exhausted. Every
/// document carries its Drive file id as `gdrive_file_id` metadata.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::gdrive::GoogleDriveSource;
///
/// let source = GoogleDriveSource::new(access_token, "1AbCdEfG")?;
/// let report = pipeline.run(&source, IngestMode::Incremental).await?;
/// ```
pub struct GoogleDriveSource {
    client: reqwest::Client,
    access_token: String,
    folder_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

impl GoogleDriveSource {
    /// Create a source for `folder_id` authenticated with `access_token`.
    pub fn new(access_token: impl Into<String>, folder_id: impl Into<String>) -> Result<Self> {
        Self::with_timeout(access_token, folder_id, Duration::from_secs(120))
    }

    /// Like [`new`](Self::new) with an explicit request timeout.
    pub fn with_timeout(
        access_token: impl Into<String>,
        folder_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return Err(Self::err("access token must not be empty"));
        }
        let folder_id = folder_id.into();
        if folder_id.trim().is_empty() {
            return Err(Self::err("folder id must not be empty"));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Self::err(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, access_token, folder_id })
    }

    fn err(message: impl Into<String>) -> RagError {
        RagError::SourceError { source_name: "gdrive".into(), message: message.into() }
    }

    async fn check(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!(source = "gdrive", %status, action, "Drive API error");
        Err(Self::err(format!("{action} returned {status}: {body}")))
    }
}

#[async_trait]
impl DocumentSource for GoogleDriveSource {
    fn name(&self) -> &str {
        "gdrive"
    }

    async fn list(&self) -> Result<Vec<SourceEntry>> {
        let query = folder_query(&self.folder_id);
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("q", query.clone()),
                ("pageSize", PAGE_SIZE.to_string()),
                ("fields", "nextPageToken, files(id, name)".to_string()),
            ];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }

            let response = self
                .client
                .get(DRIVE_FILES_URL)
                .bearer_auth(&self.access_token)
                .query(&params)
                .send()
                .await
                .map_err(|e| Self::err(format!("list request failed: {e}")))?;
            let list: FileList = Self::check(response, "list")
                .await?
                .json()
                .await
                .map_err(|e| Self::err(format!("failed to parse file list: {e}")))?;

            entries.extend(
                list.files.into_iter().map(|f| SourceEntry { id: f.id, display_name: f.name }),
            );
            match list.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(folder = %self.folder_id, count = entries.len(), "listed Drive folder");
        Ok(entries)
    }

    async fn fetch(&self, id: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(format!("{DRIVE_FILES_URL}/{id}"))
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| Self::err(format!("download of '{id}' failed: {e}")))?;
        let bytes = Self::check(response, "download")
            .await?
            .bytes()
            .await
            .map_err(|e| Self::err(format!("download of '{id}' was interrupted: {e}")))?;
        debug!(file_id = id, size = bytes.len(), "downloaded Drive file");
        Ok(bytes.to_vec())
    }

    fn origin(&self, id: &str) -> Origin {
        Origin::Remote { id: id.to_string(), id_key: META_GDRIVE_FILE_ID.to_string() }
    }
}
