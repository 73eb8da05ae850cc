//! Minimal demo client: connects, sends one command frame, and prints every
//! reply frame the server sends back until it closes the connection.
//!
//! External to the core per SPEC_FULL §1 (the client binary and its CLI
//! parsing are an out-of-scope collaborator); included only as a runnable
//! demonstration of the wire protocol. `poll`'s leading count word is not a
//! length-prefixed frame (see `wire::response::Response::PollEntry`'s note),
//! so this generic loop will not render it specially.

use std::net::IpAddr;
use std::process::ExitCode;

use bytes::Bytes;
use clap::Parser;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use jobexec::wire::Codec;

/// Connects to a running `jobexecd` and sends one command.
#[derive(Parser, Debug)]
#[command(about, long_about = None, version)]
struct Args {
    /// Server address to connect to.
    host: IpAddr,
    /// Server port to connect to.
    port: u16,
    /// Command verb and arguments, e.g. `issueJob /bin/echo hello`.
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let command = args.command.join(" ");

    let conn = match TcpStream::connect((args.host, args.port)).await {
        Ok(conn) => conn,
        Err(error) => {
            eprintln!("failed to connect: {error}");
            return ExitCode::FAILURE;
        },
    };

    let mut framed = Framed::new(conn, Codec::default());

    if let Err(error) = framed.send(Bytes::from(command)).await {
        eprintln!("failed to send command: {error}");
        return ExitCode::FAILURE;
    }

    while let Some(frame) = framed.next().await {
        match frame {
            Ok(payload) => println!("{}", String::from_utf8_lossy(&payload)),
            Err(error) => {
                eprintln!("framing error: {error}");
                return ExitCode::FAILURE;
            },
        }
    }

    ExitCode::SUCCESS
}
