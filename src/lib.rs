//! Core orchestration engine for a remote job-execution server: a bounded
//! producer/consumer queue, a concurrency-limited worker pool, and the
//! coordination protocol that ties acceptor, controllers, and workers
//! together through a graceful drain-and-exit shutdown.

pub mod config;
pub mod controller;
pub mod job;
pub mod queue;
pub mod server;
pub mod state;
pub mod wire;
pub mod worker;
