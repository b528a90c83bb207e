use crate::core::poller::{PollHandle, Poller};
use crate::core::transition::Transition;
use crate::domain::model::{JobHandle, JobStatus, Phase, SelectedFile, TranslationRequest, WorkflowState};
use crate::domain::ports::{ClientSettings, JobApi};
use crate::utils::error::{Result, TranslatorError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

type ActiveSlot = Arc<Mutex<Option<PollHandle>>>;

/// Drives one translation session: file selection, submission, polling and
/// the resulting phase changes.
///
/// State lives in a `watch` channel so the UI layer can re-render on every
/// change. All mutation goes through [`WorkflowState::apply`] inside
/// `send_if_modified`, which serialises transitions; the active poll run is
/// only started or cancelled while that lock is held.
pub struct TranslationWorkflow<A: JobApi + ?Sized + 'static> {
    api: Arc<A>,
    poller: Poller<A>,
    state: Arc<watch::Sender<WorkflowState>>,
    active: ActiveSlot,
    max_file_size: u64,
}

impl<A: JobApi + ?Sized + 'static> TranslationWorkflow<A> {
    pub fn new(api: Arc<A>, poll_interval: Duration, max_file_size: u64) -> Self {
        let (state, _) = watch::channel(WorkflowState::default());
        Self {
            poller: Poller::new(Arc::clone(&api), poll_interval),
            api,
            state: Arc::new(state),
            active: Arc::new(Mutex::new(None)),
            max_file_size,
        }
    }

    pub fn with_settings<C: ClientSettings>(api: Arc<A>, settings: &C) -> Self {
        Self::new(api, settings.poll_interval(), settings.max_file_size())
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    pub fn active_pollers(&self) -> usize {
        let slot = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().filter(|handle| handle.is_active()).map_or(0, |_| 1)
    }

    /// Stores a new document. Re-uploading from `Completed`/`Failed` clears the
    /// previous outcome; a file cannot be swapped while translating.
    pub fn select_file(&self, file: SelectedFile) -> Result<()> {
        file.validate(self.max_file_size)?;
        let file = Arc::new(file);

        let mut outcome = Ok(());
        self.state.send_if_modified(|state| {
            if state.phase != Phase::Translating {
                cancel_active(&self.active);
            }
            match state.apply(Transition::SelectFile(Arc::clone(&file))) {
                Ok(changed) => changed,
                Err(err) => {
                    outcome = Err(err);
                    false
                }
            }
        });

        if outcome.is_ok() {
            tracing::info!("📄 Selected {} ({} bytes)", file.file_name, file.size());
        }
        outcome
    }

    /// Submits the selected file and starts polling the created job.
    ///
    /// Rejected locally (state untouched, no network activity) with
    /// `InvalidOperation` when no file is selected or a translation is
    /// already running, and with `ValidationError` for a bad language pair.
    /// A failed submit moves the workflow to `Failed` and is returned.
    pub async fn translate(&self, source_language: &str, target_language: &str) -> Result<JobHandle> {
        let mut prepared: Result<(TranslationRequest, u64)> =
            Err(TranslatorError::invalid_operation("Please select a file first"));
        self.state.send_if_modified(|state| {
            prepared = begin_translation(state, source_language, target_language);
            prepared.is_ok()
        });
        let (request, session) = prepared?;

        tracing::info!(
            "🚀 Uploading {} for translation {} -> {}",
            request.file.file_name,
            request.source_language,
            request.target_language
        );

        let job = match self.api.submit(request).await {
            Ok(job) => job,
            Err(err) => {
                tracing::error!("❌ Submit failed: {}", err);
                let message = err.to_string();
                self.state.send_if_modified(|state| {
                    apply_event(state, Transition::SubmitFailed { session, message })
                });
                return Err(err);
            }
        };

        tracing::info!("📨 Translation job created: {}", job);

        let mut started = false;
        self.state.send_if_modified(|state| {
            let submitted = Transition::JobSubmitted {
                session,
                job: job.clone(),
            };
            started = apply_event(state, submitted);
            if started {
                let handle = self.start_polling(job.clone(), session);
                let mut slot = self.active.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(previous) = slot.replace(handle) {
                    previous.cancel();
                }
            }
            started
        });

        if started {
            Ok(job)
        } else {
            tracing::warn!("Job {} was accepted after the workflow moved on; not polling it", job);
            Err(TranslatorError::invalid_operation(format!(
                "The workflow was reset while job {} was being submitted",
                job
            )))
        }
    }

    /// Cancels any active poll run and returns to `Idle`.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            cancel_active(&self.active);
            if let Err(err) = state.apply(Transition::Reset) {
                tracing::error!("Reset rejected: {}", err);
            }
        });
        tracing::info!("🔄 Workflow reset");
    }

    /// Stops polling without touching visible state, for teardown.
    pub fn shutdown(&self) {
        // 與 transition 共用同一把鎖，避免與回呼交錯
        self.state.send_if_modified(|_| {
            cancel_active(&self.active);
            false
        });
    }

    /// Resolves once the workflow leaves `Translating`.
    pub async fn wait_for_outcome(&self) -> WorkflowState {
        let mut receiver = self.subscribe();
        let outcome = receiver
            .wait_for(|state| state.phase != Phase::Translating)
            .await
            .map(|state| WorkflowState::clone(&state));
        outcome.unwrap_or_else(|_| self.state())
    }

    fn start_polling(&self, job: JobHandle, session: u64) -> PollHandle {
        let on_update = {
            let state = Arc::clone(&self.state);
            let active = Arc::clone(&self.active);
            move |status: JobStatus| {
                dispatch(&state, &active, Transition::StatusReported { session, status });
            }
        };
        let on_error = {
            let state = Arc::clone(&self.state);
            let active = Arc::clone(&self.active);
            move |err: TranslatorError| {
                let message = err.to_string();
                dispatch(&state, &active, Transition::PollFailed { session, message });
            }
        };
        self.poller.start(job, on_update, on_error)
    }
}

impl<A: JobApi + ?Sized + 'static> Drop for TranslationWorkflow<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn begin_translation(
    state: &mut WorkflowState,
    source_language: &str,
    target_language: &str,
) -> Result<(TranslationRequest, u64)> {
    let file = state.ensure_can_translate()?;
    let request = TranslationRequest::new(file, source_language, target_language)?;
    state.apply(Transition::BeginTranslation)?;
    Ok((request, state.session()))
}

fn apply_event(state: &mut WorkflowState, transition: Transition) -> bool {
    match state.apply(transition) {
        Ok(changed) => changed,
        Err(err) => {
            tracing::warn!("Ignoring rejected transition: {}", err);
            false
        }
    }
}

fn dispatch(state: &watch::Sender<WorkflowState>, active: &ActiveSlot, transition: Transition) {
    state.send_if_modified(|state| {
        let changed = apply_event(state, transition);
        if changed {
            match state.phase {
                Phase::Completed => {
                    tracing::info!(
                        "✅ Translation completed: {}",
                        state.result_url.as_deref().unwrap_or_default()
                    );
                }
                Phase::Failed => {
                    tracing::error!(
                        "❌ Translation failed: {}",
                        state.error_message.as_deref().unwrap_or_default()
                    );
                }
                _ => {
                    if let Some(progress) = state.progress {
                        tracing::info!("⏳ Translating... {:.0}%", progress);
                    }
                }
            }
            if state.is_finished() {
                // 輪詢已自行結束，釋放 handle
                active.lock().unwrap_or_else(PoisonError::into_inner).take();
            }
        }
        changed
    });
}

fn cancel_active(active: &ActiveSlot) {
    let mut slot = active.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(handle) = slot.take() {
        handle.cancel();
    }
}
