//! Persistent worker tasks: dequeue jobs under the dynamic concurrency
//! throttle, execute them, and reply on the submitter's own connection
//! through the job's reply channel (SPEC_FULL §4.5).

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::job;
use crate::state::{JobRecord, Shared};
use crate::wire::Response;

/// Runs one persistent worker loop until shutdown is observed. `id` is only
/// used to tag log events; workers are otherwise interchangeable.
#[instrument(name = "worker", skip(shared))]
pub async fn run(id: usize, shared: Arc<Shared>) {
    loop {
        let Some(record) = next_job(&shared).await else {
            info!(worker = id, "observed shutdown, exiting");
            return;
        };

        info!(worker = id, job_id = %record.job_id, command = %record.command, "running job");

        let output = match job::run_job(&record.command).await {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(worker = id, job_id = %record.job_id, %error, "job failed to execute");
                Vec::new()
            },
        };

        let job_id = record.job_id.clone();
        if record
            .reply
            .send(Response::JobOutput {
                job_id: job_id.clone(),
                stdout: output,
            })
            .is_err()
        {
            warn!(worker = id, job_id, "submitter connection gone before output could be sent");
        }

        {
            let mut inner = shared.inner.lock().unwrap();
            inner.running_jobs -= 1;
            inner.busy_workers -= 1;
        }
        shared.all_jobs_done.notify_waiters();
    }
}

/// Waits until a job can be dequeued under the throttle predicate
/// `(queue.empty OR running_jobs == concurrency) AND NOT shutdown_requested`,
/// or until shutdown is observed (`None`).
///
/// The dequeue, the `running_jobs` reservation, and the `busy_workers`
/// increment all happen under the same lock acquisition as the predicate
/// check: `running_jobs` must go up atomically with the decision to run a
/// job, or a second worker can observe the same stale count and dequeue a
/// job the throttle should have held back (SPEC_FULL §8 invariant 2).
async fn next_job(shared: &Arc<Shared>) -> Option<JobRecord> {
    loop {
        let notified = shared.queue_not_empty.notified();
        tokio::pin!(notified);

        let mut inner = shared.inner.lock().unwrap();
        if inner.shutdown_requested {
            return None;
        }
        if !inner.queue.is_empty() && inner.running_jobs < inner.concurrency {
            let record = inner.queue.dequeue_head();
            inner.busy_workers += 1;
            inner.running_jobs += 1;
            drop(inner);
            shared.queue_not_full.notify_one();
            return Some(record);
        }
        drop(inner);
        notified.await;
    }
}
