//! The coordinator: binds the listener (owned by the caller), spawns the
//! worker pool, and drives the accept loop with the acceptor gate and a
//! SIGINT-triggered graceful drain (SPEC_FULL §4.7, §4.8).

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::config::ServerConfig;
use crate::controller;
use crate::state::Shared;
use crate::worker;

/// Owns the shared state and startup parameters for one server run. Built
/// once from a [`ServerConfig`] and consumed by [`Server::run`].
pub struct Server {
    shared: Arc<Shared>,
    worker_count: usize,
    max_job_size: u32,
}

impl Server {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new(config.buffer_capacity)),
            worker_count: config.worker_count,
            max_job_size: config.max_job_size,
        }
    }

    /// Runs the accept loop to completion: LISTENING until an `exit` command
    /// or SIGINT moves the server into DRAINING, then STOPPED once every
    /// running job and worker has finished (SPEC_FULL §4.8).
    #[instrument(name = "server", skip_all)]
    pub async fn run(self, listener: TcpListener) -> std::io::Result<()> {
        info!(addr = %listener.local_addr()?, workers = self.worker_count, "listening");

        let cancel = CancellationToken::new();
        {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if let Err(error) = signal::ctrl_c().await {
                    warn!(%error, "failed to install SIGINT handler");
                    return;
                }
                info!("received SIGINT, beginning graceful shutdown");
                cancel.cancel();
            });
        }

        let mut workers = Vec::with_capacity(self.worker_count);
        for id in 0..self.worker_count {
            let shared = Arc::clone(&self.shared);
            workers.push(tokio::spawn(worker::run(id, shared)));
        }

        loop {
            let shutdown_requested = {
                let accepted = tokio::select! {
                    accepted = listener.accept() => Some(accepted),
                    _ = cancel.cancelled() => None,
                };

                match accepted {
                    Some(Ok((conn, _))) => {
                        let shared = Arc::clone(&self.shared);
                        let max_job_size = self.max_job_size;
                        tokio::spawn(async move {
                            controller::handle_connection(
                                shared,
                                conn,
                                max_job_size,
                            )
                            .await;
                        });
                        self.shared.acceptor_gate.notified().await;
                        false
                    },
                    Some(Err(error)) => {
                        warn!(%error, "failed to accept connection");
                        false
                    },
                    None => {
                        self.shared.begin_shutdown_and_drain();
                        true
                    },
                }
            };

            if shutdown_requested
                || self.shared.inner.lock().unwrap().shutdown_requested
            {
                break;
            }
        }

        // Redundant with the EXIT/SIGINT paths above, but safe: make sure
        // any worker still parked on an empty queue wakes and observes
        // `shutdown_requested`.
        self.shared.queue_not_empty.notify_waiters();

        for (id, handle) in workers.into_iter().enumerate() {
            if let Err(error) = handle.await {
                error!(id, %error, "worker task panicked");
            }
        }

        info!("server stopped");
        Ok(())
    }
}
