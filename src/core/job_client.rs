use crate::domain::model::{JobHandle, JobStatus, TranslationRequest};
use crate::domain::ports::{ClientSettings, JobApi};
use crate::utils::error::{Result, TranslatorError};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// reqwest-backed client for the translator backend.
pub struct HttpJobClient {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    url: String,
}

impl HttpJobClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| TranslatorError::ConfigError {
            field: "api.base_url".to_string(),
            message: format!("Invalid URL '{}': {}", base_url, e),
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn from_settings<C: ClientSettings>(settings: &C) -> Result<Self> {
        Self::new(settings.api_base_url(), settings.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TranslatorError::ConfigError {
                field: "api.base_url".to_string(),
                message: format!("'{}' cannot be used as a base URL", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// 相對路徑的 result_url 以 API base URL 解析，絕對 URL 原樣回傳
    pub fn resolve_result_url(&self, result_url: &str) -> String {
        if Url::parse(result_url).is_ok() {
            return result_url.to_string();
        }
        self.base_url
            .join(result_url)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| result_url.to_string())
    }

    /// `GET /api/jobs/{jobId}/download`, only answered for completed jobs.
    pub async fn fetch_download_url(&self, handle: &JobHandle) -> Result<String> {
        let url = self.endpoint(&["api", "jobs", &handle.job_id, "download"])?;
        tracing::debug!("Requesting download URL: {}", url);

        let response = self.client.get(url).send().await?;
        let body: DownloadResponse = Self::read_json(response).await?;
        Ok(self.resolve_result_url(&body.url))
    }

    pub async fn download(&self, result_url: &str) -> Result<Vec<u8>> {
        let url = self.resolve_result_url(result_url);
        tracing::debug!("Downloading translated document from: {}", url);

        let response = self.client.get(&url).send().await?;
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        tracing::debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(TranslatorError::RejectedError {
            status: status.as_u16(),
            message: rejection_message(&body, status.canonical_reason()),
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| TranslatorError::ProtocolError {
            message: format!("{} (body: {})", e, truncate(&body, 200)),
        })
    }
}

#[async_trait::async_trait]
impl JobApi for HttpJobClient {
    async fn submit(&self, request: TranslationRequest) -> Result<JobHandle> {
        let url = self.endpoint(&["api", "translate"])?;
        tracing::debug!(
            "Submitting {} ({} bytes, {} -> {}) to {}",
            request.file.file_name,
            request.file.size(),
            request.source_language,
            request.target_language,
            url
        );

        let part = Part::bytes(request.file.bytes.clone())
            .file_name(request.file.file_name.clone())
            .mime_str("application/pdf")?;
        let form = Form::new()
            .part("file", part)
            .text("source_language", request.source_language.as_str().to_string())
            .text("target_language", request.target_language.as_str().to_string());

        let response = self.client.post(url).multipart(form).send().await?;
        tracing::debug!("Submit response status: {}", response.status());

        let handle: JobHandle = Self::read_json(response).await?;
        if handle.job_id.trim().is_empty() {
            return Err(TranslatorError::ProtocolError {
                message: "submit response carried an empty jobId".to_string(),
            });
        }
        Ok(handle)
    }

    async fn fetch_status(&self, handle: &JobHandle) -> Result<JobStatus> {
        let url = self.endpoint(&["api", "jobs", &handle.job_id])?;
        let response = self.client.get(url).send().await?;
        Self::read_json(response).await
    }
}

/// FastAPI 錯誤格式為 `{"detail": "..."}`
fn rejection_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(serde_json::Value::Object(obj)) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(detail) = obj.get("detail") {
            return match detail {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
        }
    }

    let body = body.trim();
    if body.is_empty() {
        reason.unwrap_or("request failed").to_string()
    } else {
        truncate(body, 200)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
