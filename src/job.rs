//! Executes one command line as a child process and captures its stdout.

use std::io;
use std::process::Stdio;

use tokio::process::Command;

/// Tokenises `command` on single spaces (no shell, no quoting — preserved
/// verbatim from the reference implementation, see SPEC_FULL §9) and runs it
/// as a child process, capturing stdout.
///
/// Supersedes the reference implementation's pipe-and-temp-file handoff
/// (SPEC_FULL §4.6/§9): `tokio::process::Command` pipes the child's stdout
/// directly, so no parent/child IPC or scratch file is needed.
///
/// Stderr and exit status are not part of the contract: stderr is
/// discarded, and a failing or non-existent program still yields whatever
/// (possibly empty) stdout it produced before failing, never an error from
/// this function due to the child's own exit code.
pub async fn run_job(command: &str) -> io::Result<Vec<u8>> {
    let mut tokens = command.split(' ').filter(|t| !t.is_empty());

    let Some(program) = tokens.next() else {
        return Ok(Vec::new());
    };

    let output = Command::new(program)
        .args(tokens)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await?;

    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout() {
        let out = run_job("/bin/echo hello world").await.unwrap();
        assert_eq!(out, b"hello world\n");
    }

    #[tokio::test]
    async fn empty_command_yields_no_output() {
        let out = run_job("").await.unwrap();
        assert_eq!(out, Vec::<u8>::new());
    }

    #[tokio::test]
    async fn nonexistent_program_is_an_error_not_a_panic() {
        let result = run_job("/no/such/program-xyz").await;
        assert!(result.is_err());
    }
}
