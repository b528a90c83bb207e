use crate::utils::error::{Result, TranslatorError};
use crate::utils::validation::{
    validate_file_extension, validate_file_size, validate_non_empty_string,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf"];

/// A document picked by the user, held in memory until it is uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                TranslatorError::validation("file", format!("'{}' is not a file", path.display()))
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self { file_name, bytes })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// 只接受非空且不超過上限的 PDF
    pub fn validate(&self, max_size: u64) -> Result<()> {
        validate_file_extension("file", &self.file_name, ACCEPTED_EXTENSIONS)?;
        validate_file_size("file", self.size(), max_size)
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("file_name", &self.file_name)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Opaque short language identifier such as `en`, `zh` or `ja`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn parse(field_name: &str, code: &str) -> Result<Self> {
        validate_non_empty_string(field_name, code)?;
        Ok(Self(code.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub file: Arc<SelectedFile>,
    pub source_language: LanguageCode,
    pub target_language: LanguageCode,
}

impl TranslationRequest {
    pub fn new(file: Arc<SelectedFile>, source_language: &str, target_language: &str) -> Result<Self> {
        let source_language = LanguageCode::parse("source_language", source_language)?;
        let target_language = LanguageCode::parse("target_language", target_language)?;
        if source_language == target_language {
            return Err(TranslatorError::validation(
                "target_language",
                format!("source and target are both '{}'", source_language),
            ));
        }
        Ok(Self {
            file,
            source_language,
            target_language,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    #[serde(rename = "jobId")]
    pub job_id: String,
}

impl JobHandle {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.job_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[serde(alias = "pending")]
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// One status observation. Produced fresh on every poll tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub status: JobState,
    #[serde(default)]
    pub result_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
}

impl JobStatus {
    pub fn queued() -> Self {
        Self::with_state(JobState::Queued)
    }

    pub fn processing() -> Self {
        Self::with_state(JobState::Processing)
    }

    pub fn completed(result_url: impl Into<String>) -> Self {
        Self {
            result_url: Some(result_url.into()),
            ..Self::with_state(JobState::Completed)
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::with_state(JobState::Failed)
        }
    }

    fn with_state(status: JobState) -> Self {
        Self {
            status,
            result_url: None,
            error: None,
            progress: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// 後端提供的錯誤訊息優先
    pub fn failure_message(&self) -> String {
        self.error
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .unwrap_or("Unknown error")
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Phase {
    #[default]
    Idle,
    FileSelected,
    Translating,
    Completed,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Idle => "idle",
            Phase::FileSelected => "file selected",
            Phase::Translating => "translating",
            Phase::Completed => "completed",
            Phase::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Application-visible state of one translation session.
///
/// `result_url` is set iff `phase == Completed` and `error_message` is set iff
/// `phase == Failed`. Only [`WorkflowState::apply`](crate::core::transition)
/// mutates it.
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    pub phase: Phase,
    pub selected_file: Option<Arc<SelectedFile>>,
    pub job: Option<JobHandle>,
    pub progress: Option<f64>,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub(crate) session: u64,
}

impl WorkflowState {
    /// Translate button and language selectors are disabled while translating.
    pub fn controls_enabled(&self) -> bool {
        self.phase != Phase::Translating
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Completed | Phase::Failed)
    }

    pub fn elapsed(&self) -> Option<chrono::Duration> {
        let started = self.started_at?;
        Some(self.finished_at.unwrap_or_else(Utc::now) - started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_parses_pending_as_queued() {
        let status: JobStatus =
            serde_json::from_str(r#"{"status":"pending","progress":0}"#).unwrap();
        assert_eq!(status.status, JobState::Queued);
        assert_eq!(status.progress, Some(0.0));
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_job_status_ignores_extra_backend_fields() {
        let body = serde_json::json!({
            "id": "abc",
            "file_name": "paper.pdf",
            "source_language": "auto",
            "target_language": "zh",
            "status": "completed",
            "progress": 100.0,
            "error": null,
            "result_url": "https://x/translated.pdf",
            "created_at": "2024-01-01T00:00:00",
            "updated_at": "2024-01-01T00:00:00"
        });
        let status: JobStatus = serde_json::from_value(body).unwrap();
        assert!(status.is_terminal());
        assert_eq!(status.result_url.as_deref(), Some("https://x/translated.pdf"));
    }

    #[test]
    fn test_failure_message_falls_back_when_blank() {
        assert_eq!(JobStatus::failed("PDF文本提取失败").failure_message(), "PDF文本提取失败");
        assert_eq!(JobStatus::failed("  ").failure_message(), "Unknown error");
        assert_eq!(
            JobStatus::with_state(JobState::Failed).failure_message(),
            "Unknown error"
        );
    }

    #[test]
    fn test_translation_request_rejects_bad_language_pair() {
        let file = Arc::new(SelectedFile::new("a.pdf", b"%PDF-1.4".to_vec()));
        assert!(TranslationRequest::new(file.clone(), "en", "zh").is_ok());
        assert!(TranslationRequest::new(file.clone(), "", "zh").is_err());
        assert!(TranslationRequest::new(file.clone(), "en", "  ").is_err());
        assert!(TranslationRequest::new(file, "ja", "ja").is_err());
    }

    #[test]
    fn test_selected_file_validation() {
        let pdf = SelectedFile::new("paper.PDF", vec![1; 16]);
        assert!(pdf.validate(1024).is_ok());
        assert!(pdf.validate(8).is_err());

        let empty = SelectedFile::new("paper.pdf", Vec::new());
        assert!(empty.validate(1024).is_err());

        let text = SelectedFile::new("notes.txt", vec![1; 16]);
        assert!(text.validate(1024).is_err());
    }

    #[test]
    fn test_handle_deserializes_from_submit_response() {
        let handle: JobHandle =
            serde_json::from_str(r#"{"jobId":"abc","status":"pending","translatedPdfUrl":null}"#)
                .unwrap();
        assert_eq!(handle, JobHandle::new("abc"));
    }
}
