use crate::domain::model::{JobHandle, JobStatus, TranslationRequest};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// The two backend calls the workflow depends on. Implementations keep no
/// state between calls and never retry.
#[async_trait]
pub trait JobApi: Send + Sync {
    async fn submit(&self, request: TranslationRequest) -> Result<JobHandle>;
    async fn fetch_status(&self, handle: &JobHandle) -> Result<JobStatus>;
}

pub trait ClientSettings: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn poll_interval(&self) -> Duration;
    fn request_timeout(&self) -> Duration;
    fn max_file_size(&self) -> u64;
    fn default_source_language(&self) -> &str;
    fn default_target_language(&self) -> &str;
    fn supported_languages(&self) -> &[String];
}
