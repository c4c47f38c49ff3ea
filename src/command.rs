use crate::Error;
use log::{info, warn};
use std::{
    process::{Child, ExitStatus},
    sync::atomic::{AtomicBool, Ordering},
    thread::sleep,
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

// A terminal delivers SIGINT to the whole foreground process group, so the child normally begins
// shutting down on its own. It is killed only if it outlives this.
const GRACE_PERIOD: Duration = Duration::from_millis(250);

/// How a launch ended, once the child process has been spawned.
#[derive(Debug)]
pub enum Outcome {
    Success,
    Failed {
        command: String,
        status: ExitStatus,
    },
    Interrupted,
}

impl Outcome {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Success | Outcome::Interrupted => 0,
            Outcome::Failed { .. } => 1,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Success => Ok(()),
            Outcome::Failed { command, status } => {
                write!(f, "Server failed to start: command `{command}` ")?;
                match status.code() {
                    Some(code) => write!(f, "returned non-zero exit status {code}"),
                    None => write_termination(f, *status),
                }
            }
            Outcome::Interrupted => f.write_str("Server stopped by user"),
        }
    }
}

#[cfg(unix)]
fn write_termination(f: &mut std::fmt::Formatter<'_>, status: ExitStatus) -> std::fmt::Result {
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(signal) => write!(f, "died with signal {signal}"),
        None => write!(f, "terminated ({status})"),
    }
}

#[cfg(not(unix))]
fn write_termination(f: &mut std::fmt::Formatter<'_>, status: ExitStatus) -> std::fmt::Result {
    write!(f, "terminated ({status})")
}

/// Blocks until `child` exits or `interrupted` is raised. Returns `None` if interrupted, in which
/// case the child has been reaped.
pub fn supervise(
    child: &mut Child,
    interrupted: &AtomicBool,
) -> Result<Option<ExitStatus>, Error> {
    loop {
        let status = try_wait(child)?;
        if interrupted.load(Ordering::SeqCst) {
            info!("interrupt received; stopping child process {}", child.id());
            if status.is_none() {
                stop(child)?;
            }
            return Ok(None);
        }
        match status {
            Some(status) if status.success() => return Ok(Some(status)),
            // The child may have died from the same SIGINT whose handler has not run yet.
            Some(status) => {
                sleep(POLL_INTERVAL);
                if interrupted.load(Ordering::SeqCst) {
                    info!("child process exited after interrupt: {status}");
                    return Ok(None);
                }
                return Ok(Some(status));
            }
            None => sleep(POLL_INTERVAL),
        }
    }
}

fn stop(child: &mut Child) -> Result<(), Error> {
    let deadline = Instant::now() + GRACE_PERIOD;
    while Instant::now() < deadline {
        if try_wait(child)?.is_some() {
            return Ok(());
        }
        sleep(POLL_INTERVAL);
    }
    warn!(
        "child process {} still running after {GRACE_PERIOD:?}; killing it",
        child.id()
    );
    child.kill().map_err(|source| Error::Kill { source })?;
    child.wait().map_err(|source| Error::Wait { source })?;
    Ok(())
}

fn try_wait(child: &mut Child) -> Result<Option<ExitStatus>, Error> {
    child.try_wait().map_err(|source| Error::Wait { source })
}
