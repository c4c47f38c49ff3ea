use std::{ffi::OsString, io, path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to enter working directory `{}`", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to spawn `{}`", program.display())]
    Spawn {
        program: OsString,
        #[source]
        source: io::Error,
    },
    #[error("failed to wait for child process")]
    Wait {
        #[source]
        source: io::Error,
    },
    #[error("failed to kill child process")]
    Kill {
        #[source]
        source: io::Error,
    },
    #[error("failed to install interrupt handler")]
    InterruptHandler {
        #[source]
        source: ctrlc::Error,
    },
}
