//! The per-connection controller: reads exactly one command, dispatches to
//! the matching verb handler, and exits — though the connection itself may
//! stay open well past that if the verb was `issueJob` (SPEC_FULL §4.4,
//! §9 "Run one command per connection").

use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn, Level};

use crate::state::{JobRecord, Shared};
use crate::wire::{self, Command, Response};

/// Ensures the acceptor gate is released exactly once per connection, no
/// matter which branch a controller exits through (early framing error,
/// an invalid command, or a fully-handled verb). Verb handlers that need to
/// release the gate at a specific point (SPEC_FULL §4.4 names one per verb)
/// call [`AcceptorGateGuard::release`] explicitly; anything left unreleased
/// is caught by the `Drop` impl.
struct AcceptorGateGuard<'a> {
    shared: &'a Shared,
    released: bool,
}

impl<'a> AcceptorGateGuard<'a> {
    fn new(shared: &'a Shared) -> Self {
        Self {
            shared,
            released: false,
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.shared.release_acceptor_gate();
            self.released = true;
        }
    }
}

impl Drop for AcceptorGateGuard<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Handles one accepted connection end to end.
#[instrument(name = "controller", skip_all, fields(peer = %conn.peer_addr().map(|a| a.to_string()).unwrap_or_default()))]
pub async fn handle_connection(
    shared: Arc<Shared>,
    conn: TcpStream,
    max_job_size: u32,
) {
    if let Err(error) = conn.set_nodelay(true) {
        warn!(%error, "failed to set TCP_NODELAY");
    }

    let mut gate = AcceptorGateGuard::new(&shared);
    let mut framed = wire::framed(conn, max_job_size as usize);

    let payload = match framed.next().await {
        None => {
            debug!("connection closed before sending a command");
            return;
        },
        Some(Err(error)) => {
            warn!(%error, "framing error on connection");
            return;
        },
        Some(Ok(payload)) => payload,
    };

    let text = String::from_utf8_lossy(&payload).into_owned();
    let command = wire::command::parse(&text);
    debug!(?command, "dispatching command");

    match command {
        Command::Issue { command } => {
            handle_issue(&shared, &mut gate, &mut framed, command).await
        },
        Command::SetConcurrency { raw } => {
            handle_set_concurrency(&shared, &mut gate, &mut framed, raw).await
        },
        Command::Poll => handle_poll(&shared, &mut gate, &mut framed).await,
        Command::Stop { job_id } => {
            handle_stop(&shared, &mut gate, &mut framed, job_id).await
        },
        Command::Exit => handle_exit(&shared, &mut gate, &mut framed).await,
        Command::Invalid => {
            debug!(raw = %text, "closing connection on unrecognised command");
        },
    }
}

type Conn = tokio_util::codec::Framed<TcpStream, wire::Codec>;

async fn send(framed: &mut Conn, response: Response) {
    if let Err(error) = framed.send(response.to_bytes()).await {
        warn!(%error, "failed to send response");
    }
}

async fn handle_issue(
    shared: &Arc<Shared>,
    gate: &mut AcceptorGateGuard<'_>,
    framed: &mut Conn,
    command: String,
) {
    let job_id = {
        let mut inner = shared.inner.lock().unwrap();
        Shared::next_job_id(&mut inner)
    };

    let (tx, rx) = oneshot::channel();
    let mut tx = Some(tx);

    loop {
        let notified = shared.queue_not_full.notified();
        tokio::pin!(notified);

        enum Action {
            Cancel,
            Enqueued,
            Wait,
        }

        let action = {
            let mut inner = shared.inner.lock().unwrap();
            if inner.shutdown_requested {
                Action::Cancel
            } else if !inner.queue.is_full() {
                let record = JobRecord {
                    job_id: job_id.clone(),
                    command: command.clone(),
                    reply: tx.take().expect("enqueued at most once"),
                };
                inner
                    .queue
                    .enqueue(record)
                    .expect("capacity was just checked under the same lock");
                Action::Enqueued
            } else {
                Action::Wait
            }
        };

        match action {
            Action::Cancel => {
                gate.release();
                send(framed, Response::SubmitCanceled).await;
                return;
            },
            Action::Enqueued => break,
            Action::Wait => {
                // Release the acceptor gate before parking: a controller
                // stuck waiting for a queue slot must not also block every
                // other connection's dispatch (SPEC_FULL §4.4, "Releases
                // the acceptor gate before blocking").
                gate.release();
                notified.await;
            },
        }
    }

    shared.queue_not_empty.notify_one();

    send(
        framed,
        Response::Submitted {
            job_id: job_id.clone(),
            command: command.clone(),
        },
    )
    .await;
    info!(job_id, %command, "job submitted");

    // The connection stays open from here: a worker (or a later STOP/EXIT
    // controller) will eventually deliver the one reply this job ever gets.
    gate.release();

    match rx.await {
        Ok(response) => send(framed, response).await,
        Err(_) => warn!(job_id, "job record was dropped without a reply"),
    }
}

async fn handle_set_concurrency(
    shared: &Arc<Shared>,
    gate: &mut AcceptorGateGuard<'_>,
    framed: &mut Conn,
    raw: String,
) {
    let Ok(new_concurrency) = raw.trim().parse::<u32>() else {
        gate.release();
        send(framed, Response::InvalidConcurrency).await;
        return;
    };
    if new_concurrency == 0 {
        gate.release();
        send(framed, Response::InvalidConcurrency).await;
        return;
    }

    let (old, busy) = {
        let mut inner = shared.inner.lock().unwrap();
        let old = inner.concurrency;
        let busy = inner.busy_workers;
        inner.concurrency = new_concurrency;
        (old, busy)
    };

    send(
        framed,
        Response::ConcurrencySetAt {
            n: new_concurrency,
        },
    )
    .await;

    if new_concurrency > busy {
        shared.queue_not_empty.notify_waiters();
    }

    info!(old, new = new_concurrency, "concurrency changed");
    gate.release();
}

async fn handle_poll(
    shared: &Arc<Shared>,
    gate: &mut AcceptorGateGuard<'_>,
    framed: &mut Conn,
) {
    let entries = {
        let inner = shared.inner.lock().unwrap();
        inner.queue.snapshot()
    };

    let count = entries.len() as isize;
    if let Err(error) = framed.get_mut().write_all(&wire::raw_word(count)).await {
        warn!(%error, "failed to send poll count");
        gate.release();
        return;
    }

    for (job_id, command) in entries {
        send(framed, Response::PollEntry { command, job_id }).await;
    }

    gate.release();
}

async fn handle_stop(
    shared: &Arc<Shared>,
    gate: &mut AcceptorGateGuard<'_>,
    framed: &mut Conn,
    job_id: String,
) {
    let removed = {
        let mut inner = shared.inner.lock().unwrap();
        inner.queue.remove_by_id(&job_id)
    };

    match removed {
        Some(record) => {
            send(
                framed,
                Response::StopRemoved {
                    job_id: job_id.clone(),
                },
            )
            .await;
            shared.queue_not_full.notify_one();
            if record.reply.send(Response::RemovedBeforeExecution).is_err() {
                warn!(job_id, "submitter connection gone before cancellation notice");
            }
            info!(job_id, "job removed before execution");
        },
        None => {
            send(framed, Response::StopNotFound { job_id }).await;
        },
    }

    gate.release();
}

#[instrument(name = "exit", skip_all, level = Level::INFO)]
async fn handle_exit(
    shared: &Arc<Shared>,
    gate: &mut AcceptorGateGuard<'_>,
    framed: &mut Conn,
) {
    shared.begin_shutdown_and_drain();

    loop {
        let notified = shared.all_jobs_done.notified();
        tokio::pin!(notified);
        let running = shared.inner.lock().unwrap().running_jobs;
        if running == 0 {
            break;
        }
        notified.await;
    }

    send(framed, Response::ServerTerminated).await;

    // Wake idle workers so they observe `shutdown_requested` and exit.
    shared.queue_not_empty.notify_waiters();

    info!("server terminated by client request");
    gate.release();
}
