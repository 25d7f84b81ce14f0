//! HTTP client for the Gittxt scan service.
//!
//! The service owns every heavy operation: cloning, walking, classifying,
//! token counting, artifact generation. This module only speaks its REST
//! contract and maps responses into the `core` model. Non-2xx responses
//! carry a FastAPI-style `{"detail": ...}` body; that detail becomes the
//! user-facing message where present.

pub mod error;

use serde::{Deserialize, Serialize};

use crate::core::{ScanProgress, ScanResult, TreeNode};

pub use error::ApiError;

/// Options for a repository scan, posted verbatim to the service.
#[derive(Debug, Clone, Serialize)]
pub struct ScanRequest {
    pub repo_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub output_format: Vec<String>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_limit: Option<u64>,
    pub lite_mode: bool,
    pub create_zip: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_depth: Option<u32>,
}

/// Acknowledgement for a newly queued scan (URL scan or ZIP upload).
#[derive(Debug, Clone, Deserialize)]
pub struct ScanAccepted {
    pub scan_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// The pre-scan exploration result: directory structure plus the distinct
/// file extensions found, without running a full scan.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoPreview {
    pub tree: TreeNode,
    #[serde(default)]
    pub file_extensions: Vec<String>,
}

/// Content of a single scanned file, fetched on demand for the preview
/// pane.
#[derive(Debug, Clone, Deserialize)]
pub struct FileInspection {
    pub content: String,
    pub file_path: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub size_bytes: u64,
}

/// The service-side configuration exposed over `GET`/`POST /config`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging_level: Option<String>,
}

#[derive(Serialize)]
struct TreeRequest<'a> {
    repo_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Serialize)]
struct InspectRequest<'a> {
    scan_id: &'a str,
    file_path: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

/// A thin, cloneable client over the service's REST endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Queues a new scan. The service answers immediately with a scan id;
    /// progress is polled separately.
    pub async fn start_scan(&self, request: &ScanRequest) -> Result<ScanAccepted, ApiError> {
        let response = self
            .http
            .post(self.url("/scans"))
            .json(request)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Polls the progress of a queued or running scan.
    pub async fn scan_status(&self, scan_id: &str) -> Result<ScanProgress, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/scans/{scan_id}")))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Releases the service-side ephemeral artifacts of a scan session.
    pub async fn close_scan(&self, scan_id: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(&format!("/scans/{scan_id}/close")))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// Fetches the complete result of a finished scan.
    pub async fn fetch_summary(&self, scan_id: &str) -> Result<ScanResult, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/summary/{scan_id}")))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Explores a repository's structure without scanning it.
    pub async fn fetch_repo_tree(
        &self,
        repo_url: &str,
        branch: Option<&str>,
    ) -> Result<RepoPreview, ApiError> {
        let response = self
            .http
            .post(self.url("/scans/tree"))
            .json(&TreeRequest { repo_url, branch })
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Uploads a ZIP archive for scanning.
    pub async fn upload_archive(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ScanAccepted, ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/zip")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Fetches the content of a single scanned file for the preview pane.
    pub async fn inspect_file(
        &self,
        scan_id: &str,
        file_path: &str,
    ) -> Result<FileInspection, ApiError> {
        let response = self
            .http
            .post(self.url("/inspect"))
            .json(&InspectRequest { scan_id, file_path })
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Downloads a generated artifact (`txt`, `json`, `md`, or `zip`).
    pub async fn download_artifact(
        &self,
        scan_id: &str,
        format: &str,
    ) -> Result<Vec<u8>, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/artifacts/{scan_id}/{format}")))
            .send()
            .await?;
        Ok(check(response).await?.bytes().await?.to_vec())
    }

    pub async fn fetch_service_config(&self) -> Result<ServiceConfig, ApiError> {
        let response = self.http.get(self.url("/config")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn update_service_config(
        &self,
        config: &ServiceConfig,
    ) -> Result<ServiceConfig, ApiError> {
        let response = self
            .http
            .post(self.url("/config"))
            .json(config)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

/// Turns a non-2xx response into an [`ApiError::Status`], pulling the
/// message from the `detail` field when the body carries one.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.detail)
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}
