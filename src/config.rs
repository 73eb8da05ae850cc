use std::net::{IpAddr, Ipv4Addr};

use clap::Parser;

/// Startup configuration for the job-execution server.
#[derive(Parser, Debug, Clone)]
#[command(about, long_about = None, version)]
pub struct ServerConfig {
    /// Address to listen on.
    #[arg(short, long, default_value_t = IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)))]
    pub listen: IpAddr,
    /// (TCP) port to listen on.
    #[arg(short, long, default_value_t = 7878)]
    pub port: u16,
    /// Maximum number of jobs the waiting queue may hold at once.
    #[arg(short = 'c', long, default_value_t = 16)]
    pub buffer_capacity: usize,
    /// Number of persistent worker tasks.
    #[arg(short = 'w', long, default_value_t = 4)]
    pub worker_count: usize,
    /// Maximum length, in bytes, of a submitted command line.
    #[arg(short = 'z', long, default_value_t = 65535)]
    pub max_job_size: u32,
    /// Enables human-friendly logging.
    #[arg(short, long, default_value_t)]
    pub debug: bool,
}
