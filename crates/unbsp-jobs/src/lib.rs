// unbsp-jobs — bounded worker pool for independent decompile jobs.
//
// One critical section guards the pending queue and the running count;
// everything observable per job (progress, state, log stream) lives on the
// job itself, so observers never contend with the scheduler. Progress is an
// f32 snapshot carried in an AtomicU32 bit-cast; log and terminal events
// flow through a per-job crossbeam channel in submission order.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    fn from_u8(value: u8) -> JobState {
        match value {
            0 => JobState::Pending,
            1 => JobState::Running,
            2 => JobState::Succeeded,
            _ => JobState::Failed,
        }
    }
}

/// One user-facing message from a job, in emission order.
#[derive(Debug, Clone)]
pub struct LogMessage {
    pub text: String,
    pub is_error: bool,
}

/// Everything a job observer can receive.
#[derive(Debug, Clone)]
pub enum JobEvent {
    Log(LogMessage),
    Finished { failed: bool },
}

struct JobInner {
    name: String,
    /// f32 progress in [0,1], stored as raw bits for a tearing-free snapshot.
    progress: AtomicU32,
    state: AtomicU8,
    events: Sender<JobEvent>,
}

impl JobInner {
    fn set_state(&self, state: JobState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn state(&self) -> JobState {
        JobState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn progress(&self) -> f32 {
        f32::from_bits(self.progress.load(Ordering::Acquire))
    }
}

/// Caller-facing view of one submitted job.
pub struct JobHandle {
    inner: Arc<JobInner>,
    /// Ordered log/terminal event stream for this job alone.
    pub events: Receiver<JobEvent>,
}

impl JobHandle {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn progress(&self) -> f32 {
        self.inner.progress()
    }

    pub fn state(&self) -> JobState {
        self.inner.state()
    }
}

/// Worker-side view handed to the job body: progress and log reporting.
pub struct JobContext {
    inner: Arc<JobInner>,
}

impl JobContext {
    pub fn progress(&self, fraction: f32) {
        self.inner
            .progress
            .store(fraction.clamp(0.0, 1.0).to_bits(), Ordering::Release);
    }

    pub fn log(&self, message: &str, is_error: bool) {
        // A disconnected receiver just means nobody is listening.
        let _ = self.inner.events.send(JobEvent::Log(LogMessage {
            text: message.to_string(),
            is_error,
        }));
    }
}

type Work = Box<dyn FnOnce(&JobContext) -> Result<(), String> + Send + 'static>;

struct QueuedJob {
    inner: Arc<JobInner>,
    work: Work,
}

struct SchedulerState {
    pending: VecDeque<QueuedJob>,
    running: usize,
    /// Every job ever submitted, for aggregate progress.
    jobs: Vec<Arc<JobInner>>,
    next_worker: usize,
}

struct SchedulerInner {
    limit: usize,
    state: Mutex<SchedulerState>,
    idle: Condvar,
}

/// FIFO bounded-concurrency scheduler. Failures are terminal and never
/// retried; a failed job frees its slot exactly like a successful one.
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    /// `limit` of None uses the host's available parallelism.
    pub fn new(limit: Option<usize>) -> Scheduler {
        let limit = limit
            .or_else(|| thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1)
            .max(1);
        Scheduler {
            inner: Arc::new(SchedulerInner {
                limit,
                state: Mutex::new(SchedulerState {
                    pending: VecDeque::new(),
                    running: 0,
                    jobs: Vec::new(),
                    next_worker: 0,
                }),
                idle: Condvar::new(),
            }),
        }
    }

    pub fn limit(&self) -> usize {
        self.inner.limit
    }

    /// Enqueue a job and immediately fill any free slots.
    pub fn submit(
        &self,
        name: impl Into<String>,
        work: impl FnOnce(&JobContext) -> Result<(), String> + Send + 'static,
    ) -> JobHandle {
        let (events, receiver) = unbounded();
        let inner = Arc::new(JobInner {
            name: name.into(),
            progress: AtomicU32::new(0.0f32.to_bits()),
            state: AtomicU8::new(JobState::Pending as u8),
            events,
        });
        {
            let mut state = self.inner.state.lock();
            state.jobs.push(inner.clone());
            state.pending.push_back(QueuedJob {
                inner: inner.clone(),
                work: Box::new(work),
            });
        }
        fill_slots(&self.inner);
        JobHandle { inner, events: receiver }
    }

    /// Mean progress over every submitted job, terminal ones included.
    pub fn overall_progress(&self) -> f32 {
        let state = self.inner.state.lock();
        if state.jobs.is_empty() {
            return 0.0;
        }
        let sum: f32 = state.jobs.iter().map(|j| j.progress()).sum();
        sum / state.jobs.len() as f32
    }

    /// True when every submitted job has reached a terminal state.
    pub fn all_terminal(&self) -> bool {
        let state = self.inner.state.lock();
        state.running == 0 && state.pending.is_empty()
    }

    /// Block until the queue drains and every running job finishes.
    pub fn wait_idle(&self) {
        let mut state = self.inner.state.lock();
        while state.running > 0 || !state.pending.is_empty() {
            self.inner.idle.wait(&mut state);
        }
    }
}

/// Start pending jobs while slots are free. Spawning happens outside the
/// lock; each worker refills the pool when its job reaches a terminal state.
fn fill_slots(scheduler: &Arc<SchedulerInner>) {
    loop {
        let (job, worker_id) = {
            let mut state = scheduler.state.lock();
            if state.running >= scheduler.limit {
                return;
            }
            let Some(job) = state.pending.pop_front() else {
                return;
            };
            state.running += 1;
            state.next_worker += 1;
            (job, state.next_worker)
        };

        job.inner.set_state(JobState::Running);
        let worker_scheduler = scheduler.clone();
        let spawned = thread::Builder::new()
            .name(format!("unbsp-job-{worker_id}"))
            .spawn(move || {
                run_job(job);
                let mut state = worker_scheduler.state.lock();
                state.running -= 1;
                if state.running == 0 && state.pending.is_empty() {
                    worker_scheduler.idle.notify_all();
                }
                drop(state);
                fill_slots(&worker_scheduler);
            });
        if let Err(err) = spawned {
            warn!(%err, "failed to spawn worker thread");
            let mut state = scheduler.state.lock();
            state.running -= 1;
        }
    }
}

fn run_job(job: QueuedJob) {
    let QueuedJob { inner, work } = job;
    let context = JobContext { inner: inner.clone() };
    // A panicking job body must still reach a terminal state, or its slot
    // leaks and the queue behind it starves.
    let result = catch_unwind(AssertUnwindSafe(|| work(&context)))
        .unwrap_or_else(|payload| Err(panic_text(payload.as_ref())));
    match result {
        Ok(()) => {
            context.progress(1.0);
            inner.set_state(JobState::Succeeded);
            debug!(name = %inner.name, "job succeeded");
            let _ = inner.events.send(JobEvent::Finished { failed: false });
        }
        Err(message) => {
            inner.set_state(JobState::Failed);
            debug!(name = %inner.name, %message, "job failed");
            let _ = inner.events.send(JobEvent::Log(LogMessage {
                text: message,
                is_error: true,
            }));
            let _ = inner.events.send(JobEvent::Finished { failed: true });
        }
    }
}

/// Best-effort message out of a panic payload.
fn panic_text(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "job panicked".to_string()
    }
}
