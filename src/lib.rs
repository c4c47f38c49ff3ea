use log::{debug, info};
use std::{
    env::set_current_dir,
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::Command,
    sync::atomic::AtomicBool,
};

mod command;
use command::supervise;
pub use command::Outcome;

mod error;
pub use error::Error;

mod interrupt;
pub use interrupt::install_interrupt_handler;

pub const WORKING_DIR: &str = "/home/runner/workspace";

/// Name of the runtime mode flag passed to the server.
pub const MODE_VAR: &str = "NODE_ENV";

// The server is served through Vite, which wants `development` even though this runner launches
// the deployed app.
pub const MODE_VALUE: &str = "development";

pub const PROGRAM: &str = "tsx";

pub const ARGS: [&str; 1] = ["server/index.ts"];

/// Launches the server from [`WORKING_DIR`], treating Ctrl-C as a clean stop.
pub fn run() -> Result<Outcome, Error> {
    let interrupted = install_interrupt_handler()?;
    launcher().run(&interrupted)
}

#[must_use]
pub fn launcher() -> Launcher {
    Launcher::new(WORKING_DIR, PROGRAM).args(ARGS)
}

pub struct Launcher {
    dir: PathBuf,
    program: OsString,
    args: Vec<OsString>,
}

impl Launcher {
    /// Launch `program` from `dir`, with the mode flag set
    #[must_use]
    pub fn new<P, S>(dir: P, program: S) -> Launcher
    where
        P: AsRef<Path>,
        S: AsRef<OsStr>,
    {
        Launcher {
            dir: dir.as_ref().to_owned(),
            program: program.as_ref().to_owned(),
            args: Vec::new(),
        }
    }

    /// Pass `arg` to program
    #[must_use]
    pub fn arg<S>(mut self, arg: S) -> Launcher
    where
        S: AsRef<OsStr>,
    {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Pass `args` to program
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Launcher
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_owned()));
        self
    }

    /// Runs the program to completion, or until `interrupted` is raised.
    ///
    /// The process first enters the working directory. A directory that is missing or cannot be
    /// entered is reported before anything is spawned. A child that exits unsuccessfully is an
    /// [`Outcome`], not an error.
    pub fn run(&self, interrupted: &AtomicBool) -> Result<Outcome, Error> {
        env_logger::try_init().unwrap_or_default();
        enter_dir(&self.dir)?;
        let mut command = self.command();
        debug!("{:?}", &command);
        info!("<<< {}", self.dir.display());
        let mut child = command.spawn().map_err(|source| Error::Spawn {
            program: self.program.clone(),
            source,
        })?;
        let status = supervise(&mut child, interrupted)?;
        info!(">>> {}", self.dir.display());
        debug!("status: {status:?}");
        let outcome = match status {
            None => Outcome::Interrupted,
            Some(status) if status.success() => Outcome::Success,
            Some(status) => Outcome::Failed {
                command: self.command_line(),
                status,
            },
        };
        Ok(outcome)
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        // Another thread may have moved the process since `enter_dir`.
        command.current_dir(&self.dir);
        command.env(MODE_VAR, MODE_VALUE);
        command
    }

    fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|arg| arg.display().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn enter_dir(dir: &Path) -> Result<(), Error> {
    set_current_dir(dir).map_err(|source| Error::Directory {
        path: dir.to_owned(),
        source,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn launcher_uses_fixed_command() {
        let launcher = launcher();
        let command = launcher.command();
        assert_eq!(OsStr::new(PROGRAM), command.get_program());
        assert_eq!(
            ARGS.map(OsStr::new).to_vec(),
            command.get_args().collect::<Vec<_>>()
        );
        assert_eq!(Some(Path::new(WORKING_DIR)), command.get_current_dir());
        assert_eq!("tsx server/index.ts", launcher.command_line());
    }

    #[test]
    fn mode_flag_overrides_inherited_value() {
        let command = launcher().command();
        let envs = command.get_envs().collect::<Vec<_>>();
        assert_eq!(
            vec![(OsStr::new("NODE_ENV"), Some(OsStr::new("development")))],
            envs
        );
    }

    #[test]
    fn missing_dir_is_directory_error() {
        let tempdir = tempfile::tempdir().unwrap();
        let missing = tempdir.path().join("missing");
        let error = enter_dir(&missing).unwrap_err();
        assert!(matches!(error, Error::Directory { path, .. } if path == missing));
    }

    #[test]
    fn file_is_directory_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            enter_dir(file.path()),
            Err(Error::Directory { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn inaccessible_dir_is_directory_error() {
        use std::{
            fs::{Permissions, read_dir, set_permissions},
            io::ErrorKind,
            os::unix::fs::PermissionsExt,
        };

        let tempdir = tempfile::tempdir().unwrap();
        let dir = tempdir.path().join("locked");
        std::fs::create_dir(&dir).unwrap();
        set_permissions(&dir, Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not bind a privileged user.
        if read_dir(&dir).is_ok() {
            eprintln!("skipping: `{}` is still accessible", dir.display());
        } else {
            let error = enter_dir(&dir).unwrap_err();
            assert!(
                matches!(
                    &error,
                    Error::Directory { path, source }
                        if *path == dir && source.kind() == ErrorKind::PermissionDenied
                ),
                "{error:?}"
            );
        }

        set_permissions(&dir, Permissions::from_mode(0o755)).unwrap();
    }
}
