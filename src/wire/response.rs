//! The fixed response strings each verb's handler may send, and their
//! rendering to bytes for the frame codec.

use bytes::Bytes;

/// A response frame payload. Each variant renders to exactly the wire string
/// named in its doc comment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Response {
    /// `JOB <id, cmd> SUBMITTED`
    Submitted { job_id: String, command: String },
    /// `JOB SUBMIT CANCELED BECAUSE OF SERVER TERMINATION`
    SubmitCanceled,
    /// The job output frame, `-----<id> output start------\n<stdout>\n-----<id> output end------`.
    JobOutput { job_id: String, stdout: Vec<u8> },
    /// `JOB HAS BEEN REMOVED BEFORE EXECUTION`
    RemovedBeforeExecution,
    /// `SERVER TERMINATED BEFORE EXECUTION`
    ServerTerminatedBeforeExecution,
    /// `CONCURRENCY SET AT <n>`
    ConcurrencySetAt { n: u32 },
    /// Sent when `setConcurrency`'s argument fails to parse as a positive
    /// integer (REDESIGN FLAG: the original left this unspecified).
    InvalidConcurrency,
    /// One POLL entry: `<command>, <jobID>`.
    ///
    /// Note: POLL's leading count is *not* one of these — per the wire
    /// table, the count travels as a bare word in the length field itself
    /// (matching the reference implementation's `send(&bufferSize, ...)`),
    /// not as a length-prefixed payload. See [`super::frame::raw_word`] and
    /// `controller::handle_poll`.
    PollEntry { command: String, job_id: String },
    /// `JOB <id> REMOVED`
    StopRemoved { job_id: String },
    /// `JOB <id> NOTFOUND`
    StopNotFound { job_id: String },
    /// `SERVER TERMINATED`
    ServerTerminated,
}

impl Response {
    /// Renders this response to the bytes that should be sent as a single
    /// frame's payload.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Response::Submitted { job_id, command } => {
                Bytes::from(format!("JOB <{job_id}, {command}> SUBMITTED"))
            },
            Response::SubmitCanceled => Bytes::from_static(
                b"JOB SUBMIT CANCELED BECAUSE OF SERVER TERMINATION",
            ),
            Response::JobOutput { job_id, stdout } => {
                let stdout = String::from_utf8_lossy(stdout);
                Bytes::from(format!(
                    "-----{job_id} output start------\n{stdout}\n-----{job_id} output end------"
                ))
            },
            Response::RemovedBeforeExecution => {
                Bytes::from_static(b"JOB HAS BEEN REMOVED BEFORE EXECUTION")
            },
            Response::ServerTerminatedBeforeExecution => {
                Bytes::from_static(b"SERVER TERMINATED BEFORE EXECUTION")
            },
            Response::ConcurrencySetAt { n } => {
                Bytes::from(format!("CONCURRENCY SET AT {n}"))
            },
            Response::InvalidConcurrency => {
                Bytes::from_static(b"INVALID CONCURRENCY VALUE")
            },
            Response::PollEntry { command, job_id } => {
                Bytes::from(format!("{command}, {job_id}"))
            },
            Response::StopRemoved { job_id } => {
                Bytes::from(format!("JOB {job_id} REMOVED"))
            },
            Response::StopNotFound { job_id } => {
                Bytes::from(format!("JOB {job_id} NOTFOUND"))
            },
            Response::ServerTerminated => {
                Bytes::from_static(b"SERVER TERMINATED")
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_job_output_with_markers() {
        let r = Response::JobOutput {
            job_id: "job_1".to_string(),
            stdout: b"hello\n".to_vec(),
        };
        assert_eq!(
            r.to_bytes(),
            Bytes::from_static(
                b"-----job_1 output start------\nhello\n\n-----job_1 output end------"
            )
        );
    }

    #[test]
    fn renders_stop_outcomes() {
        assert_eq!(
            Response::StopRemoved {
                job_id: "job_4".to_string()
            }
            .to_bytes(),
            Bytes::from_static(b"JOB job_4 REMOVED")
        );
        assert_eq!(
            Response::StopNotFound {
                job_id: "job_4".to_string()
            }
            .to_bytes(),
            Bytes::from_static(b"JOB job_4 NOTFOUND")
        );
    }
}
