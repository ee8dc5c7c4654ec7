//! # DevRS Process Execution Utilities (`devrs_process`)
//!
//! File: process/src/lib.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/devrs
//!
//! ## Overview
//!
//! A thin wrapper around `std::process::Command` for running external tools
//! from DevRS. It provides:
//!
//! - **Captured streams:** stdin is supplied from a buffer, stdout and stderr
//!   are collected into buffers.
//! - **Descriptive errors:** launch failures and abnormal exits are reported
//!   with the rendered command line and any stderr the child produced.
//! - **Readable rendering:** `Command` implements `Display` as the space-joined
//!   program and arguments.
//!
//! There are no retries, timeouts or cancellation. A caller needing a bounded
//! wait can `start()`, race a timer, and `kill()` the child.
//!
//! ## Architecture
//!
//! - **`command`**: The `Command` wrapper and its lifecycle.
//! - **`error`**: `ProcessError`, `ErrorKind` and the underlying `Failure`.
//! - **`pipes`**: Helper threads that service the child's standard streams.
//!
//! The library emits `tracing` events but never installs a subscriber.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use devrs_process::Command;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut cmd = Command::new("sh", ["-c", "cat; echo done >&2"]);
//! cmd.stdin_mut().extend_from_slice(b"hello");
//! cmd.run()?;
//! assert_eq!(cmd.stdout(), b"hello");
//! # Ok(())
//! # }
//! ```
//!

/// The buffered `Command` wrapper.
pub mod command;
/// Error types returned by `Command`.
pub mod error;
mod pipes;

pub use command::Command;
pub use error::{ErrorKind, Failure, ProcessError, Result};
