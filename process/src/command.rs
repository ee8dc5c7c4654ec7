//! # DevRS Buffered Command (`Command`)
//!
//! File: process/src/command.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/devrs
//!
//! ## Overview
//!
//! `Command` wraps `std::process::Command` together with three in-memory
//! buffers for the child's stdin, stdout and stderr. It forwards launching to
//! the standard library and enriches failures: a failed launch or an abnormal
//! exit becomes a [`ProcessError`] that names the command line and, when the
//! child wrote any, includes its stderr output.
//!
//! ## Lifecycle
//!
//! ```text
//! NotStarted --start()--> Running --wait()--> Waited
//! ```
//!
//! `run()` is `start()` followed by `wait()`. Starting twice, waiting before
//! starting, and waiting twice are reported as errors rather than panics.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use devrs_process::Command;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut cmd = Command::new("git", ["rev-parse", "HEAD"]);
//! cmd.run()?;
//! println!("{} -> {}", cmd, cmd.stdout_lossy().trim());
//! # Ok(())
//! # }
//! ```
//!
use crate::error::{Failure, ProcessError, Result};
use crate::pipes::{Captured, Pipes};
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use std::process::{Child, ExitStatus, Stdio};
use std::time::Duration;
use tracing::{debug, warn};

/// How long `wait` keeps collecting output after [`Command::kill`].
const KILL_GRACE: Duration = Duration::from_millis(200);

enum State {
    NotStarted,
    Running {
        child: Child,
        pipes: Pipes,
        killed: bool,
    },
    Waited,
}

/// An external command with buffered standard streams.
///
/// Compare with [`std::process::Command`]; the differences are that output is
/// always captured and that errors describe the command that produced them.
pub struct Command {
    inner: std::process::Command,
    stdin: Vec<u8>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    state: State,
    status: Option<ExitStatus>,
}

impl Command {
    /// Creates a command for `program` with the given arguments.
    ///
    /// Nothing is validated here. A missing program is reported by
    /// [`Command::start`] (or [`Command::run`]).
    pub fn new<S, I, A>(program: S, args: I) -> Command
    where
        S: AsRef<OsStr>,
        I: IntoIterator<Item = A>,
        A: AsRef<OsStr>,
    {
        let mut inner = std::process::Command::new(program);
        inner.args(args);
        Command {
            inner,
            stdin: Vec::new(),
            stdout: Vec::new(),
            stderr: Vec::new(),
            state: State::NotStarted,
            status: None,
        }
    }

    /// # Add Argument (`arg`)
    ///
    /// Appends one argument. Has no effect once the process has started.
    ///
    /// ## Returns
    /// * `&mut Command` - `self`, for chaining.
    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut Command {
        self.inner.arg(arg);
        self
    }

    /// # Add Arguments (`args`)
    ///
    /// Appends several arguments in order.
    ///
    /// ## Returns
    /// * `&mut Command` - `self`, for chaining.
    pub fn args<I, S>(&mut self, args: I) -> &mut Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.inner.args(args);
        self
    }

    /// Sets the working directory of the child.
    pub fn current_dir<P: AsRef<Path>>(&mut self, dir: P) -> &mut Command {
        self.inner.current_dir(dir);
        self
    }

    /// Sets one environment variable for the child.
    pub fn env<K, V>(&mut self, key: K, val: V) -> &mut Command
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.inner.env(key, val);
        self
    }

    /// Sets several environment variables for the child.
    pub fn envs<I, K, V>(&mut self, vars: I) -> &mut Command
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.inner.envs(vars);
        self
    }

    /// Removes a variable from the child's environment.
    pub fn env_remove<K: AsRef<OsStr>>(&mut self, key: K) -> &mut Command {
        self.inner.env_remove(key);
        self
    }

    /// Clears the inherited environment; only variables set afterwards reach the child.
    pub fn env_clear(&mut self) -> &mut Command {
        self.inner.env_clear();
        self
    }

    /// The program name as given to [`Command::new`].
    pub fn get_program(&self) -> &OsStr {
        self.inner.get_program()
    }

    /// The arguments, in order, without the program name.
    pub fn get_args(&self) -> std::process::CommandArgs<'_> {
        self.inner.get_args()
    }

    /// Input handed to the child on start. Fill it before calling
    /// [`Command::start`] or [`Command::run`]; the child sees EOF afterwards.
    pub fn stdin_mut(&mut self) -> &mut Vec<u8> {
        &mut self.stdin
    }

    /// Bytes the child wrote to stdout. Populated by [`Command::wait`].
    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    /// Bytes the child wrote to stderr. Populated by [`Command::wait`].
    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    /// # Stdout As Text (`stdout_lossy`)
    ///
    /// ## Returns
    /// * `String` - The stdout buffer decoded as UTF-8, invalid sequences replaced.
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr buffer decoded as UTF-8, invalid sequences replaced.
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Exit status of the child, once [`Command::wait`] has reaped it.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.status
    }

    /// OS process id while the child is running.
    pub fn id(&self) -> Option<u32> {
        match &self.state {
            State::Running { child, .. } => Some(child.id()),
            _ => None,
        }
    }

    /// # Kill Child (`kill`)
    ///
    /// Kills the running child. A subsequent [`Command::wait`] reports the
    /// termination as an execution failure.
    ///
    /// Only the direct child is signalled. Processes it spawned may keep the
    /// output pipes open; after a kill, `wait` collects output for at most
    /// a short grace period and then returns with whatever was captured. A
    /// caller that starts, waits on its own timer, then kills and waits is
    /// therefore never blocked by leftover descendants.
    ///
    /// ## Errors
    /// Returns `InvalidInput` if the process is not running, or the OS error
    /// from signalling it.
    pub fn kill(&mut self) -> std::io::Result<()> {
        match &mut self.state {
            State::Running { child, killed, .. } => {
                let program = self.inner.get_program().to_string_lossy();
                debug!("Killing process {} ({})", child.id(), program);
                child.kill()?;
                *killed = true;
                Ok(())
            }
            _ => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "process is not running",
            )),
        }
    }

    /// Launches the process and waits for it to exit.
    pub fn run(&mut self) -> Result<()> {
        self.start()?;
        self.wait()
    }

    /// Launches the process without waiting for it.
    ///
    /// Stdio is always redirected to this command's buffers; any stdio the
    /// caller configured on the inner command is overridden.
    pub fn start(&mut self) -> Result<()> {
        if !matches!(self.state, State::NotStarted) {
            return Err(self.launch_error(Failure::AlreadyStarted));
        }

        debug!("Starting process: {}", self);
        self.inner
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match self.inner.spawn() {
            Ok(child) => child,
            Err(e) => {
                let err = self.launch_error(Failure::Io(e));
                warn!("{}", err);
                return Err(err);
            }
        };
        debug!("Process {} started: {}", child.id(), self);

        let input = std::mem::take(&mut self.stdin);
        let pipes = Pipes::attach(&mut child, input);
        self.state = State::Running {
            child,
            pipes,
            killed: false,
        };
        Ok(())
    }

    /// Blocks until the process exits and collects its output.
    ///
    /// Fails if the process exited unsuccessfully, if collecting its output
    /// failed, or if it was never started or already waited on.
    pub fn wait(&mut self) -> Result<()> {
        let outcome = match std::mem::replace(&mut self.state, State::Waited) {
            State::NotStarted => {
                self.state = State::NotStarted;
                Err(Failure::NotStarted)
            }
            State::Waited => Err(Failure::AlreadyWaited),
            State::Running {
                mut child,
                pipes,
                killed,
            } => {
                let waited = child.wait();
                let (Captured { stdout, stderr }, stream_error) = if killed {
                    pipes.finish_within(KILL_GRACE)
                } else {
                    pipes.finish()
                };
                self.stdout = stdout;
                self.stderr = stderr;
                match waited {
                    Ok(status) => {
                        debug!("Process {} exited with {}: {}", child.id(), status, self);
                        self.status = Some(status);
                        if !status.success() {
                            Err(Failure::Status(status))
                        } else if let Some(e) = stream_error {
                            Err(Failure::Io(e))
                        } else {
                            Ok(())
                        }
                    }
                    Err(e) => Err(Failure::Io(e)),
                }
            }
        };

        outcome.map_err(|failure| {
            let err = self.execution_error(failure);
            warn!("{}", err);
            err
        })
    }

    fn launch_error(&self, source: Failure) -> ProcessError {
        ProcessError::Launch {
            command: self.to_string(),
            source,
        }
    }

    fn execution_error(&self, source: Failure) -> ProcessError {
        ProcessError::Execution {
            command: self.to_string(),
            source,
            stderr: self.stderr_lossy(),
        }
    }
}

/// Renders the program and its arguments joined by single spaces.
///
/// Arguments are not quoted, so the result is meant for messages only and
/// cannot be fed back to a shell reliably.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.get_program().to_string_lossy())?;
        for arg in self.inner.get_args() {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::NotStarted => "not started",
            State::Running { .. } => "running",
            State::Waited => "waited",
        };
        f.debug_struct("Command")
            .field("command", &self.to_string())
            .field("state", &state)
            .field("status", &self.status)
            .field("stdin_len", &self.stdin.len())
            .field("stdout_len", &self.stdout.len())
            .field("stderr_len", &self.stderr.len())
            .finish()
    }
}
