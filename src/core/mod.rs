pub mod job_client;
pub mod poller;
pub mod transition;
pub mod workflow;

pub use crate::domain::model::{JobHandle, JobStatus, Phase, WorkflowState};
pub use crate::domain::ports::{ClientSettings, JobApi};
pub use crate::utils::error::Result;
