//! Job Lifecycle Controller
//!
//! Owns the optimize pipeline: trigger a job, poll its status on a fixed
//! schedule, and on completion fan the result out into the Store together
//! with refreshed inventory and the job's picking list.
//!
//! Phases: IDLE -> TRIGGERING -> POLLING -> COMPLETED, with any gateway
//! failure going to FAILED and settling back to IDLE. A run is a spawned
//! task that targets the Store; it ends by itself on COMPLETED or FAILED and
//! is aborted when the controller is disposed or dropped.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use shared::{Job, JobId, JobStatus, OptimizationResult, PickingList};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::PollingConfig;
use crate::error::{ClientError, ClientResult};
use crate::gateway::Gateway;
use crate::store::{Action, Store};

/// Lower bound for any poll delay
pub const MIN_POLL_DELAY: Duration = Duration::from_millis(1);

/// Observable controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Triggering,
    Polling(JobId),
    Completed(JobId),
    Failed,
}

impl Phase {
    /// A run is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::Triggering | Phase::Polling(_))
    }
}

/// Delays between status polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    initial_delay: Duration,
    interval: Duration,
}

impl PollSchedule {
    pub fn new(initial_delay: Duration, interval: Duration) -> Self {
        Self {
            initial_delay: initial_delay.max(MIN_POLL_DELAY),
            interval: interval.max(MIN_POLL_DELAY),
        }
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), Duration::from_millis(2000))
    }
}

impl From<&PollingConfig> for PollSchedule {
    fn from(config: &PollingConfig) -> Self {
        Self::new(
            Duration::from_millis(config.initial_delay_ms),
            Duration::from_millis(config.interval_ms),
        )
    }
}

/// What a successful run committed to the Store
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedRun {
    pub job_id: JobId,
    pub result: OptimizationResult,
    pub picking_list: PickingList,
    /// Number of status polls it took
    pub polls: u32,
}

/// Handle to a started run
///
/// Awaiting it is optional: dropping the handle does not stop the run.
#[derive(Debug)]
pub struct RunHandle {
    rx: oneshot::Receiver<ClientResult<CompletedRun>>,
}

impl RunHandle {
    /// Wait for the run to finish
    pub async fn wait(self) -> ClientResult<CompletedRun> {
        self.rx.await.unwrap_or(Err(ClientError::Cancelled))
    }
}

pub struct JobController {
    gateway: Arc<dyn Gateway>,
    store: Store,
    schedule: PollSchedule,
    phase: Arc<watch::Sender<Phase>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl JobController {
    pub fn new(gateway: Arc<dyn Gateway>, store: Store, schedule: PollSchedule) -> Self {
        let (phase, _rx) = watch::channel(Phase::Idle);
        Self {
            gateway,
            store,
            schedule,
            phase: Arc::new(phase),
            task: Mutex::new(None),
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Start a new optimization run
    ///
    /// Rejected with [`ClientError::OptimizationInFlight`] while a run is
    /// triggering or polling. The previous result and picking list are
    /// cleared from the Store before the trigger call is made.
    pub fn start(&self) -> ClientResult<RunHandle> {
        let mut accepted = false;
        self.phase.send_if_modified(|phase| {
            if phase.is_busy() {
                return false;
            }
            *phase = Phase::Triggering;
            accepted = true;
            true
        });
        if !accepted {
            return Err(ClientError::OptimizationInFlight);
        }
        tracing::debug!("optimization phase -> TRIGGERING");

        self.store.dispatch(Action::BeginOptimization);

        let run = Run {
            gateway: Arc::clone(&self.gateway),
            store: self.store.clone(),
            phase: Arc::clone(&self.phase),
            schedule: self.schedule,
            job_id: None,
        };
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let outcome = run.execute().await;
            let _ = tx.send(outcome);
        });

        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }

        Ok(RunHandle { rx })
    }

    /// Start a run and wait for it to finish
    pub async fn run_to_completion(&self) -> ClientResult<CompletedRun> {
        self.start()?.wait().await
    }

    /// Stop any in-flight run
    ///
    /// The optimizing flag is cleared for the job the run was tracking and
    /// the controller returns to IDLE.
    pub fn dispose(&self) {
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(task) = task else {
            return;
        };
        if task.is_finished() {
            return;
        }
        task.abort();

        let current = self.phase();
        if let Phase::Polling(job_id) = current {
            self.store.dispatch(Action::OptimizationFailed {
                job_id: Some(job_id),
            });
        } else if current == Phase::Triggering {
            self.store
                .dispatch(Action::OptimizationFailed { job_id: None });
        }
        self.phase.send_replace(Phase::Idle);
        tracing::debug!("optimization run disposed");
    }
}

impl Drop for JobController {
    fn drop(&mut self) {
        let task = self
            .task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

/// State of one run, moved into its task
struct Run {
    gateway: Arc<dyn Gateway>,
    store: Store,
    phase: Arc<watch::Sender<Phase>>,
    schedule: PollSchedule,
    job_id: Option<JobId>,
}

impl Run {
    async fn execute(mut self) -> ClientResult<CompletedRun> {
        let outcome = self.drive().await;
        self.finish(&outcome);
        outcome
    }

    /// Publish the final phase of this run
    ///
    /// Only moves the phase while it still belongs to this run, so a run
    /// that was disposed and replaced never clobbers its successor.
    fn finish(&self, outcome: &ClientResult<CompletedRun>) {
        match outcome {
            Ok(run) => {
                tracing::info!(
                    "optimization {} completed after {} poll(s): {} school(s) selected",
                    run.job_id,
                    run.polls,
                    run.result.selected_count()
                );
                self.leave_phase(Phase::Completed(run.job_id));
            }
            Err(ClientError::Superseded { .. }) => {
                // A newer run owns the Store now; leave it alone
                self.leave_phase(Phase::Idle);
            }
            Err(_) => {
                self.store
                    .dispatch(Action::OptimizationFailed { job_id: self.job_id });
                if self.leave_phase(Phase::Failed) {
                    self.phase.send_if_modified(|phase| {
                        if *phase != Phase::Failed {
                            return false;
                        }
                        *phase = Phase::Idle;
                        true
                    });
                    tracing::debug!("optimization phase -> Idle");
                }
            }
        }
    }

    /// The phase this run published last
    fn own_phase(&self) -> Phase {
        match self.job_id {
            Some(job_id) => Phase::Polling(job_id),
            None => Phase::Triggering,
        }
    }

    /// Replace the phase if it is still this run's; returns whether it was
    fn leave_phase(&self, next: Phase) -> bool {
        let own = self.own_phase();
        let replaced = self.phase.send_if_modified(|phase| {
            if *phase != own {
                return false;
            }
            *phase = next;
            true
        });
        if replaced {
            tracing::debug!("optimization phase -> {:?}", next);
        }
        replaced
    }

    async fn drive(&mut self) -> ClientResult<CompletedRun> {
        let created = self.gateway.trigger_optimize().await?;
        let job_id = created.job_id;
        self.job_id = Some(job_id);

        self.store.dispatch(Action::SetJob(Job::pending(job_id)));
        self.set_phase(Phase::Polling(job_id));

        let mut delay = self.schedule.initial_delay();
        let mut last_status = JobStatus::Pending;
        let mut polls = 0u32;

        loop {
            tokio::time::sleep(delay).await;
            delay = self.schedule.interval();

            self.ensure_tracking(job_id)?;
            let job = self.gateway.fetch_job_status(job_id).await?;
            polls += 1;

            if job.job_id != job_id {
                return Err(ClientError::MalformedResponse(format!(
                    "status for job {} reported job {}",
                    job_id, job.job_id
                )));
            }

            if !last_status.can_advance_to(job.status) {
                tracing::debug!(
                    "ignoring {} for job {} after {}",
                    job.status,
                    job_id,
                    last_status
                );
                continue;
            }
            last_status = job.status;

            if job.status != JobStatus::Completed {
                self.commit(job_id, Action::SetJob(job))?;
                continue;
            }

            let result = job.result.clone().ok_or_else(|| {
                ClientError::MalformedResponse(format!("job {} completed without a result", job_id))
            })?;
            self.commit(job_id, Action::SetJob(job))?;

            let inventory = self.gateway.fetch_inventory().await?;
            self.ensure_tracking(job_id)?;
            let picking_list = self.gateway.fetch_picking_list(job_id).await?;

            self.commit(job_id, Action::SetInventory(inventory))?;
            self.commit(
                job_id,
                Action::SetResult {
                    job_id,
                    result: result.clone(),
                },
            )?;
            self.commit(
                job_id,
                Action::SetPickingList {
                    job_id,
                    picking_list: picking_list.clone(),
                },
            )?;

            return Ok(CompletedRun {
                job_id,
                result,
                picking_list,
                polls,
            });
        }
    }

    fn ensure_tracking(&self, job_id: JobId) -> ClientResult<()> {
        if self.store.snapshot().is_tracking(job_id) {
            Ok(())
        } else {
            tracing::warn!("job {} is no longer tracked; stopping its poll loop", job_id);
            Err(ClientError::Superseded { job_id })
        }
    }

    fn commit(&self, job_id: JobId, action: Action) -> ClientResult<()> {
        if self.store.dispatch_for_job(job_id, action) {
            Ok(())
        } else {
            tracing::warn!("discarding stale response for job {}", job_id);
            Err(ClientError::Superseded { job_id })
        }
    }

    fn set_phase(&self, phase: Phase) {
        tracing::debug!("optimization phase -> {:?}", phase);
        self.phase.send_replace(phase);
    }
}
