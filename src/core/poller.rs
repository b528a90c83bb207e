use crate::domain::model::{JobHandle, JobStatus};
use crate::domain::ports::JobApi;
use crate::utils::error::TranslatorError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Turns the one-shot status check into a recurring observation until the job
/// reaches a terminal status, a poll fails, or the run is cancelled.
///
/// Every `start` advances the poller's generation. A run only reports results
/// while its generation is still current, so a response that resolves after
/// `cancel` (or after a newer `start`) is dropped.
pub struct Poller<A: JobApi + ?Sized> {
    api: Arc<A>,
    interval: Duration,
    generation: Arc<AtomicU64>,
}

/// Handle for one polling run.
pub struct PollHandle {
    job: JobHandle,
    generation: u64,
    current: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl<A: JobApi + ?Sized + 'static> Poller<A> {
    pub fn new(api: Arc<A>, interval: Duration) -> Self {
        Self {
            api,
            // tokio::time::interval 不接受零週期
            interval: interval.max(Duration::from_millis(1)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Schedules the first check immediately, then one per interval while the
    /// job stays `queued`/`processing`. `on_update` sees every status including
    /// the terminal one; `on_error` fires at most once and ends the run.
    pub fn start<U, E>(&self, handle: JobHandle, mut on_update: U, on_error: E) -> PollHandle
    where
        U: FnMut(JobStatus) + Send + 'static,
        E: FnOnce(TranslatorError) + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.generation);
        let api = Arc::clone(&self.api);
        let period = self.interval;
        let job = handle.clone();

        tracing::debug!(
            "Polling job {} every {:?} (generation {})",
            job,
            period,
            generation
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // 前一次請求尚未完成時跳過到期的 tick
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tick: u64 = 0;

            loop {
                ticker.tick().await;
                if current.load(Ordering::SeqCst) != generation {
                    return;
                }

                tick += 1;
                tracing::debug!("Poll tick {} for job {}", tick, job);
                let outcome = api.fetch_status(&job).await;

                if current.load(Ordering::SeqCst) != generation {
                    tracing::warn!(
                        "Discarding poll result for job {} from cancelled generation {}",
                        job,
                        generation
                    );
                    return;
                }

                match outcome {
                    Ok(status) => {
                        let terminal = status.is_terminal();
                        tracing::debug!("Job {} reported {:?}", job, status.status);
                        on_update(status);
                        if terminal {
                            tracing::debug!("Job {} reached a terminal status after {} ticks", job, tick);
                            return;
                        }
                    }
                    Err(err) => {
                        // 傳輸錯誤直接視為終止，不重試
                        tracing::error!("Poll tick {} for job {} failed: {}", tick, job, err);
                        on_error(err);
                        return;
                    }
                }
            }
        });

        PollHandle {
            job: handle,
            generation,
            current: Arc::clone(&self.generation),
            task,
        }
    }
}

impl PollHandle {
    pub fn job(&self) -> &JobHandle {
        &self.job
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True until the run terminates or is cancelled.
    pub fn is_active(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation && !self.task.is_finished()
    }

    /// Stops scheduling immediately and drops any in-flight request. Safe to
    /// call repeatedly or after the run ended on its own.
    pub fn cancel(&self) {
        let invalidated = self
            .current
            .compare_exchange(
                self.generation,
                self.generation + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        self.task.abort();
        if invalidated {
            tracing::debug!("Cancelled polling for job {}", self.job);
        }
    }

    /// Waits for the run to end, either naturally or through `cancel`.
    pub async fn finished(self) {
        let _ = self.task.await;
    }
}
