use std::fmt;
use std::io::{self, PipeReader, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::Serialize;
use wait_timeout::ChildExt;

/// Outcome of running an external program
///
/// `output` holds stdout and stderr interleaved as the program wrote them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub success: bool,
    /// The command line, for diagnostics
    pub command: String,
    pub output: String,
}

impl CommandResult {
    fn failed(command: String, output: String) -> Self {
        Self {
            success: false,
            command,
            output,
        }
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "An error occurred while trying to run a command '{}'. The command's output is\n\n{}",
            self.command, self.output
        )
    }
}

/// Run `args` (program first) in `cwd`, waiting at most `timeout`
///
/// Never returns an error: spawn failures, non-zero exits and timeouts all
/// produce `success == false` with a readable `output`.
pub fn run_executable<S: AsRef<str>>(args: &[S], cwd: Option<&Path>, timeout: Option<Duration>) -> CommandResult {
    let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
    let command = args.join(" ");

    let Some((program, rest)) = args.split_first() else {
        return CommandResult::failed(command, "No command was given.".to_string());
    };

    debug!("Spawning '{command}' (cwd={cwd:?}, timeout={timeout:?})");
    let (mut child, reader) = match spawn_merged(program, rest, cwd) {
        Ok(spawned) => spawned,
        Err(e) => {
            warn!("Failed to spawn '{command}': {e}");
            return CommandResult::failed(command, format!("Failed to start '{program}': {e}"));
        }
    };
    let collector = collect_output(reader);
    let deadline = timeout.map(|limit| (Instant::now() + limit, limit));

    let status = match timeout {
        Some(limit) => match child.wait_timeout(limit) {
            Ok(Some(status)) => status,
            Ok(None) => {
                kill_and_reap(&mut child, &command);
                return timed_out(command, limit);
            }
            Err(e) => {
                kill_and_reap(&mut child, &command);
                return CommandResult::failed(command, format!("Failed to wait for the command: {e}"));
            }
        },
        None => match child.wait() {
            Ok(status) => status,
            Err(e) => return CommandResult::failed(command, format!("Failed to wait for the command: {e}")),
        },
    };

    // Background processes the command left behind can hold the pipe open
    let output = match deadline {
        Some((deadline, limit)) => {
            match collector.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                Ok(read) => decode_output(read, &command),
                Err(RecvTimeoutError::Timeout) => {
                    warn!("Output of '{command}' still open after it exited");
                    return timed_out(command, limit);
                }
                Err(RecvTimeoutError::Disconnected) => reader_gone(&command),
            }
        }
        None => match collector.recv() {
            Ok(read) => decode_output(read, &command),
            Err(_) => reader_gone(&command),
        },
    };
    debug!("'{command}' finished with {status}");

    CommandResult {
        success: status.success(),
        command,
        output,
    }
}

/// Spawn with stdout and stderr sharing one pipe
fn spawn_merged(program: &str, rest: &[&str], cwd: Option<&Path>) -> io::Result<(Child, PipeReader)> {
    let (reader, writer) = io::pipe()?;

    let mut command = Command::new(program);
    command
        .args(rest)
        .stdin(Stdio::null())
        .stdout(writer.try_clone()?)
        .stderr(writer);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    let child = command.spawn()?;
    // Dropping `command` closes our copies of the write end, so the reader sees EOF
    drop(command);
    Ok((child, reader))
}

fn timed_out(command: String, limit: Duration) -> CommandResult {
    let message = format!("Command '{command}' timed out after {} seconds.", limit.as_secs_f64());
    CommandResult::failed(command, message)
}

/// Read the pipe to EOF on a detached thread
fn collect_output(mut reader: PipeReader) -> Receiver<io::Result<Vec<u8>>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let read = reader.read_to_end(&mut buffer).map(|_| buffer);
        // The receiver is gone once the caller gave up on a timeout
        let _ = tx.send(read);
    });
    rx
}

fn decode_output(read: io::Result<Vec<u8>>, command: &str) -> String {
    match read {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!("Failed to read output of '{command}': {e}");
            String::new()
        }
    }
}

fn reader_gone(command: &str) -> String {
    warn!("Output reader for '{command}' stopped without a result");
    String::new()
}

fn kill_and_reap(child: &mut Child, command: &str) {
    if let Err(e) = child.kill()
        && e.kind() != io::ErrorKind::InvalidInput
    {
        warn!("Failed to kill '{command}': {e}");
    }
    if let Err(e) = child.wait() {
        warn!("Failed to reap '{command}': {e}");
    }
}
