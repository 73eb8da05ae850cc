//! Shared server state: the waiting queue, concurrency counters, the
//! shutdown flag, and the four condition signals that coordinate
//! controllers, workers, and the accept loop.

use std::fmt;
use std::sync::Mutex;

use tokio::sync::{oneshot, Notify};

use crate::queue::WaitingQueue;
use crate::wire::Response;

/// A job accepted by a controller but not yet executed. Once a worker
/// dequeues and runs it (or a controller removes/cancels it), exactly one
/// [`Response`] is sent down `reply` — the single point of contact back to
/// the connection that submitted the job.
pub struct JobRecord {
    pub job_id: String,
    pub command: String,
    pub reply: oneshot::Sender<Response>,
}

impl fmt::Debug for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRecord")
            .field("job_id", &self.job_id)
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}

/// Everything protected by the single shared-state mutex: the waiting
/// queue plus the counters from SPEC_FULL §3's `ConcurrencyState` and
/// `ServerState`.
#[derive(Debug)]
pub struct Inner {
    pub queue: WaitingQueue,
    pub concurrency: u32,
    pub running_jobs: u32,
    pub busy_workers: u32,
    pub shutdown_requested: bool,
    pub jobs_submitted: u64,
}

impl Inner {
    fn new(capacity: usize) -> Self {
        Self {
            queue: WaitingQueue::new(capacity),
            concurrency: 1,
            running_jobs: 0,
            busy_workers: 0,
            shutdown_requested: false,
            jobs_submitted: 0,
        }
    }
}

/// The server's shared state, owned by `main` and handed by reference to the
/// acceptor, every controller, and every worker. Replaces the reference
/// implementation's process-wide static mutexes and condition variables
/// (SPEC_FULL §9, "Global mutable state").
pub struct Shared {
    pub inner: Mutex<Inner>,

    /// Signalled when a job is dequeued by a worker or removed by STOP;
    /// waited by ISSUE_JOB controllers parked because the queue was full.
    pub queue_not_full: Notify,
    /// Signalled when a job is enqueued, or when concurrency is raised;
    /// waited by workers parked on an empty queue or a saturated
    /// concurrency limit.
    pub queue_not_empty: Notify,
    /// Signalled by each worker after decrementing `running_jobs`; waited by
    /// an EXIT controller until `running_jobs` reaches zero.
    pub all_jobs_done: Notify,
    /// The single-slot acceptor gate (SPEC_FULL §5): the accept loop waits
    /// on this after spawning a controller, until that controller has
    /// passed its first guarded mutation.
    pub acceptor_gate: Notify,
}

impl Shared {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::new(queue_capacity)),
            queue_not_full: Notify::new(),
            queue_not_empty: Notify::new(),
            all_jobs_done: Notify::new(),
            acceptor_gate: Notify::new(),
        }
    }

    /// Allocates the next job ID. Job IDs are assigned in strictly
    /// increasing order of a monotonic counter (SPEC_FULL §8 invariant 4).
    pub fn next_job_id(inner: &mut Inner) -> String {
        inner.jobs_submitted += 1;
        format!("job_{}", inner.jobs_submitted)
    }

    /// Releases the acceptor gate, letting the accept loop proceed to the
    /// next `accept()`. Every controller must call this exactly once,
    /// whatever verb it handled (SPEC_FULL §4.4, "Releases the acceptor
    /// gate").
    pub fn release_acceptor_gate(&self) {
        self.acceptor_gate.notify_one();
    }

    /// Sets `shutdown_requested` (idempotent) and drains every job still
    /// waiting in the queue, notifying each submitter's connection that the
    /// server is terminating before their job ran. Shared by the `exit`
    /// controller and the SIGINT handler in `server::Server::run`, since
    /// both paths must uphold the same "exactly one reply per job" invariant
    /// (SPEC_FULL §5 invariant 2) on the way into DRAINING.
    pub fn begin_shutdown_and_drain(&self) {
        let drained = {
            let mut inner = self.inner.lock().unwrap();
            let already_shutting_down = inner.shutdown_requested;
            inner.shutdown_requested = true;

            if already_shutting_down {
                return;
            }

            let mut drained = Vec::new();
            while !inner.queue.is_empty() {
                drained.push(inner.queue.dequeue_head());
            }
            drained
        };

        // Wake every ISSUE_JOB controller parked on a full queue; they will
        // observe `shutdown_requested` and cancel themselves.
        self.queue_not_full.notify_waiters();

        for record in drained {
            let job_id = record.job_id.clone();
            if record
                .reply
                .send(Response::ServerTerminatedBeforeExecution)
                .is_err()
            {
                tracing::warn!(
                    job_id,
                    "submitter connection gone before drain notice"
                );
            }
        }
    }
}
