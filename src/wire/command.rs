//! Classifies a single payload string into one of five verbs plus arguments.

/// A command sent by the client to the server, already classified into its
/// kind and tail. `Invalid` carries no data; per the protocol, an invalid
/// command gets no reply and the connection is simply closed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// `issueJob <command line...>` — submit a job for execution.
    Issue { command: String },
    /// `setConcurrency <n>` — change the number of jobs allowed to run at
    /// once.
    SetConcurrency { raw: String },
    /// `poll` — list jobs currently waiting in the queue.
    Poll,
    /// `stop <jobID>` — cancel a job that has not yet started executing.
    Stop { job_id: String },
    /// `exit` — request a graceful shutdown of the server.
    Exit,
    /// Anything not matching one of the above verbs.
    Invalid,
}

/// Splits `s` into its first whitespace-delimited word and the remainder
/// (with any single leading space stripped). Mirrors the reference
/// implementation's `removeFirstWord`/`getFirstWord` pair.
fn split_verb(s: &str) -> (&str, &str) {
    match s.split_once(' ') {
        Some((verb, rest)) => (verb, rest),
        None => (s, ""),
    }
}

/// Parses a raw command payload into a [`Command`].
pub fn parse(payload: &str) -> Command {
    let (verb, rest) = split_verb(payload);

    match verb {
        "issueJob" => Command::Issue {
            command: rest.to_string(),
        },
        "setConcurrency" => Command::SetConcurrency {
            raw: rest.to_string(),
        },
        "poll" => Command::Poll,
        "stop" => Command::Stop {
            job_id: rest.to_string(),
        },
        "exit" => Command::Exit,
        _ => Command::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_recognised_verb() {
        assert_eq!(
            parse("issueJob /bin/echo hello world"),
            Command::Issue {
                command: "/bin/echo hello world".to_string()
            }
        );
        assert_eq!(
            parse("setConcurrency 4"),
            Command::SetConcurrency {
                raw: "4".to_string()
            }
        );
        assert_eq!(parse("poll"), Command::Poll);
        assert_eq!(parse("poll ignored tail"), Command::Poll);
        assert_eq!(
            parse("stop job_3"),
            Command::Stop {
                job_id: "job_3".to_string()
            }
        );
        assert_eq!(parse("exit"), Command::Exit);
    }

    #[test]
    fn rejects_unknown_verbs() {
        assert_eq!(parse("frobnicate everything"), Command::Invalid);
        assert_eq!(parse(""), Command::Invalid);
    }

    #[test]
    fn issue_job_tail_may_contain_spaces() {
        let Command::Issue { command } = parse("issueJob /bin/sh -c \"echo hi\"")
        else {
            panic!("expected Issue");
        };
        assert_eq!(command, "/bin/sh -c \"echo hi\"");
    }
}
