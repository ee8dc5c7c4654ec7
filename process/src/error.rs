//! # DevRS Process Error Types
//!
//! File: process/src/error.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/devrs
//!
//! ## Overview
//!
//! This module defines the errors returned by [`crate::Command`]. Every failure
//! carries the rendered command line so the message alone is enough to tell
//! which invocation went wrong.
//!
//! ## Architecture
//!
//! The error system consists of three parts:
//! - `ProcessError`: What the caller sees. One variant per failure kind
//!   (launch vs. execution), built with `thiserror`.
//! - `Failure`: The underlying cause reported by the host process primitive
//!   (I/O error, exit status, lifecycle misuse). Exposed as the error `source()`.
//! - `Result<T>`: Alias for `std::result::Result<T, ProcessError>`.
//!
//! ## Examples
//!
//! ```rust
//! use devrs_process::{Command, ErrorKind};
//!
//! let mut cmd = Command::new("definitely-not-a-real-binary", ["--flag"]);
//! match cmd.run() {
//!     Err(e) if e.kind() == ErrorKind::LaunchFailure => {
//!         let expected = "cmd definitely-not-a-real-binary --flag failed with:";
//!         assert!(e.to_string().starts_with(expected));
//!     }
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! ```
//!
use std::process::ExitStatus;
use thiserror::Error;

/// Coarse classification of a [`ProcessError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The process could not be started.
    LaunchFailure,
    /// The process started but did not finish successfully.
    ExecutionFailure,
}

/// Underlying cause of a failed launch or wait.
#[derive(Error, Debug)]
pub enum Failure {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// The child exited with a non-zero code or was killed by a signal.
    #[error("{0}")]
    Status(ExitStatus),

    #[error("process already started")]
    AlreadyStarted,

    #[error("process not started")]
    NotStarted,

    #[error("wait was already called")]
    AlreadyWaited,
}

/// Error returned by [`crate::Command::run`], [`crate::Command::start`] and
/// [`crate::Command::wait`].
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("cmd {command} failed with: {source}")]
    Launch {
        command: String,
        #[source]
        source: Failure,
    },

    #[error("{}", describe_execution(.command, .source, .stderr))]
    Execution {
        command: String,
        #[source]
        source: Failure,
        /// Captured stderr text, lossily decoded. Empty when the child wrote nothing.
        stderr: String,
    },
}

/// Builds the execution failure message, appending captured stderr when there is any.
fn describe_execution(command: &str, source: &Failure, stderr: &str) -> String {
    if stderr.is_empty() {
        format!("running {} failed with: {}.", command, source)
    } else {
        format!("{}: failed with {}.\n\n here:{}", command, source, stderr)
    }
}

impl ProcessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessError::Launch { .. } => ErrorKind::LaunchFailure,
            ProcessError::Execution { .. } => ErrorKind::ExecutionFailure,
        }
    }

    /// The rendered command line of the failed invocation.
    pub fn command(&self) -> &str {
        match self {
            ProcessError::Launch { command, .. } | ProcessError::Execution { command, .. } => {
                command
            }
        }
    }

    /// The underlying cause.
    pub fn failure(&self) -> &Failure {
        match self {
            ProcessError::Launch { source, .. } | ProcessError::Execution { source, .. } => source,
        }
    }

    /// The exit status, if the failure was an abnormal exit.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        match self.failure() {
            Failure::Status(status) => Some(*status),
            _ => None,
        }
    }

    /// Stderr captured before the failure, if any was written.
    pub fn captured_stderr(&self) -> Option<&str> {
        match self {
            ProcessError::Execution { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}

/// Type alias for Result using [`ProcessError`].
pub type Result<T> = std::result::Result<T, ProcessError>;
