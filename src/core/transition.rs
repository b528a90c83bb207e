use crate::domain::model::{JobHandle, JobState, JobStatus, Phase, SelectedFile, WorkflowState};
use crate::utils::error::{Result, TranslatorError};
use chrono::Utc;
use std::sync::Arc;

/// Every way the workflow state can change. Events coming back from the
/// network carry the session they were issued under and are ignored once the
/// session has moved on.
#[derive(Debug, Clone)]
pub enum Transition {
    SelectFile(Arc<SelectedFile>),
    BeginTranslation,
    JobSubmitted { session: u64, job: JobHandle },
    SubmitFailed { session: u64, message: String },
    StatusReported { session: u64, status: JobStatus },
    PollFailed { session: u64, message: String },
    Reset,
}

impl WorkflowState {
    pub fn session(&self) -> u64 {
        self.session
    }

    /// The file to upload, if a translation may start from the current phase.
    pub fn ensure_can_translate(&self) -> Result<Arc<SelectedFile>> {
        match self.phase {
            Phase::Translating => Err(TranslatorError::invalid_operation(
                "A translation is already running for this file",
            )),
            Phase::Completed | Phase::Failed => Err(TranslatorError::invalid_operation(
                "Re-upload or reset before starting another translation",
            )),
            Phase::Idle | Phase::FileSelected => self.selected_file.clone().ok_or_else(|| {
                TranslatorError::invalid_operation("Please select a file first")
            }),
        }
    }

    /// Applies one transition. Returns whether anything visible changed;
    /// stale network events are discarded with `Ok(false)`.
    pub fn apply(&mut self, transition: Transition) -> Result<bool> {
        let changed = match transition {
            Transition::SelectFile(file) => {
                if self.phase == Phase::Translating {
                    return Err(TranslatorError::invalid_operation(
                        "Cannot change the file while a translation is running",
                    ));
                }
                *self = WorkflowState {
                    phase: Phase::FileSelected,
                    selected_file: Some(file),
                    session: self.session + 1,
                    ..WorkflowState::default()
                };
                true
            }
            Transition::BeginTranslation => {
                self.ensure_can_translate()?;
                self.phase = Phase::Translating;
                self.session += 1;
                self.job = None;
                self.progress = None;
                self.started_at = Some(Utc::now());
                self.finished_at = None;
                true
            }
            Transition::JobSubmitted { session, job } => {
                if !self.is_current(session) {
                    return Ok(false);
                }
                self.job = Some(job);
                true
            }
            Transition::SubmitFailed { session, message }
            | Transition::PollFailed { session, message } => {
                if !self.is_current(session) {
                    return Ok(false);
                }
                self.fail(message);
                true
            }
            Transition::StatusReported { session, status } => {
                if !self.is_current(session) {
                    return Ok(false);
                }
                self.observe(status)
            }
            Transition::Reset => {
                *self = WorkflowState {
                    session: self.session + 1,
                    ..WorkflowState::default()
                };
                true
            }
        };

        debug_assert!(self.invariants_hold(), "workflow invariants violated: {:?}", self);
        Ok(changed)
    }

    fn is_current(&self, session: u64) -> bool {
        self.session == session && self.phase == Phase::Translating
    }

    fn observe(&mut self, status: JobStatus) -> bool {
        match status.status {
            JobState::Queued | JobState::Processing => {
                if status.progress.is_some() && status.progress != self.progress {
                    self.progress = status.progress;
                    true
                } else {
                    false
                }
            }
            JobState::Completed => {
                match status.result_url.filter(|url| !url.trim().is_empty()) {
                    Some(url) => {
                        self.phase = Phase::Completed;
                        self.result_url = Some(url);
                        self.error_message = None;
                        self.progress = Some(100.0);
                        self.finished_at = Some(Utc::now());
                    }
                    None => self.fail("Job completed without a result URL".to_string()),
                }
                true
            }
            JobState::Failed => {
                self.fail(status.failure_message());
                true
            }
        }
    }

    fn fail(&mut self, message: String) {
        let message = if message.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            message
        };
        self.phase = Phase::Failed;
        self.result_url = None;
        self.error_message = Some(message);
        self.finished_at = Some(Utc::now());
    }

    fn invariants_hold(&self) -> bool {
        let result_ok = self.result_url.is_some() == (self.phase == Phase::Completed);
        let error_ok = self.error_message.is_some() == (self.phase == Phase::Failed);
        let file_ok = self.phase == Phase::Idle || self.selected_file.is_some();
        result_ok && error_ok && file_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected() -> WorkflowState {
        let mut state = WorkflowState::default();
        let file = Arc::new(SelectedFile::new("paper.pdf", b"%PDF".to_vec()));
        state.apply(Transition::SelectFile(file)).unwrap();
        state
    }

    fn translating() -> (WorkflowState, u64) {
        let mut state = selected();
        state.apply(Transition::BeginTranslation).unwrap();
        let session = state.session();
        (state, session)
    }

    #[test]
    fn test_select_file_moves_to_file_selected() {
        let state = selected();
        assert_eq!(state.phase, Phase::FileSelected);
        assert!(state.selected_file.is_some());
        assert!(state.controls_enabled());
    }

    #[test]
    fn test_translate_without_file_is_invalid_operation() {
        let mut state = WorkflowState::default();
        let err = state.apply(Transition::BeginTranslation).unwrap_err();
        assert!(matches!(err, TranslatorError::InvalidOperation { .. }));
        assert_eq!(state.phase, Phase::Idle);
    }

    #[test]
    fn test_duplicate_begin_is_rejected() {
        let (mut state, session) = translating();
        assert!(!state.controls_enabled());
        let err = state.apply(Transition::BeginTranslation).unwrap_err();
        assert!(matches!(err, TranslatorError::InvalidOperation { .. }));
        assert_eq!(state.session(), session);
    }

    #[test]
    fn test_completed_status_stores_result_url() {
        let (mut state, session) = translating();
        let changed = state
            .apply(Transition::StatusReported {
                session,
                status: JobStatus::completed("https://x/translated.pdf"),
            })
            .unwrap();
        assert!(changed);
        assert_eq!(state.phase, Phase::Completed);
        assert_eq!(state.result_url.as_deref(), Some("https://x/translated.pdf"));
        assert!(state.error_message.is_none());
        assert!(state.finished_at.is_some());
    }

    #[test]
    fn test_completed_without_url_fails() {
        let (mut state, session) = translating();
        let status = JobStatus {
            result_url: None,
            ..JobStatus::completed("")
        };
        state
            .apply(Transition::StatusReported { session, status })
            .unwrap();
        assert_eq!(state.phase, Phase::Failed);
        assert!(state.result_url.is_none());
    }

    #[test]
    fn test_failed_status_prefers_backend_message() {
        let (mut state, session) = translating();
        state
            .apply(Transition::StatusReported {
                session,
                status: JobStatus::failed("翻译失败: quota exceeded"),
            })
            .unwrap();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.error_message.as_deref(), Some("翻译失败: quota exceeded"));
    }

    #[test]
    fn test_non_terminal_status_only_updates_progress() {
        let (mut state, session) = translating();
        let unchanged = state
            .apply(Transition::StatusReported {
                session,
                status: JobStatus::processing(),
            })
            .unwrap();
        assert!(!unchanged);

        let status = JobStatus {
            progress: Some(42.0),
            ..JobStatus::processing()
        };
        assert!(state
            .apply(Transition::StatusReported { session, status })
            .unwrap());
        assert_eq!(state.phase, Phase::Translating);
        assert_eq!(state.progress, Some(42.0));
    }

    #[test]
    fn test_stale_session_events_are_ignored() {
        let (mut state, session) = translating();
        state.apply(Transition::Reset).unwrap();

        let changed = state
            .apply(Transition::StatusReported {
                session,
                status: JobStatus::completed("https://x/late.pdf"),
            })
            .unwrap();
        assert!(!changed);
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.result_url.is_none());

        let changed = state
            .apply(Transition::PollFailed {
                session,
                message: "late".to_string(),
            })
            .unwrap();
        assert!(!changed);
        assert!(state.error_message.is_none());
    }

    #[test]
    fn test_failure_message_is_never_empty() {
        let (mut state, session) = translating();
        state
            .apply(Transition::SubmitFailed {
                session,
                message: "   ".to_string(),
            })
            .unwrap();
        assert_eq!(state.error_message.as_deref(), Some("Unknown error"));
    }

    #[test]
    fn test_finished_states_require_reupload_or_reset() {
        let (mut state, session) = translating();
        state
            .apply(Transition::StatusReported {
                session,
                status: JobStatus::failed("boom"),
            })
            .unwrap();
        assert!(state.apply(Transition::BeginTranslation).is_err());

        let file = Arc::new(SelectedFile::new("second.pdf", b"%PDF".to_vec()));
        state.apply(Transition::SelectFile(file)).unwrap();
        assert_eq!(state.phase, Phase::FileSelected);
        assert!(state.error_message.is_none());
        assert!(state.apply(Transition::BeginTranslation).is_ok());
    }
}
