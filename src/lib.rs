pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{cli::LocalStorage, CliConfig, LogFormat};

pub use crate::config::toml_config::TomlConfig;
pub use crate::core::{
    job_client::HttpJobClient,
    poller::{PollHandle, Poller, DEFAULT_POLL_INTERVAL},
    transition::Transition,
    workflow::{TranslationWorkflow, DEFAULT_MAX_FILE_SIZE},
};
pub use crate::domain::model::{
    JobHandle, JobState, JobStatus, LanguageCode, Phase, SelectedFile, TranslationRequest,
    WorkflowState,
};
pub use crate::domain::ports::{ClientSettings, JobApi};
pub use crate::utils::error::{Result, TranslatorError};
