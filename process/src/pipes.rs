//! # DevRS Process Stream Plumbing
//!
//! File: process/src/pipes.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/devrs
//!
//! ## Overview
//!
//! Connects a spawned child's piped stdin/stdout/stderr to in-memory buffers.
//! Each stream is serviced by its own helper thread: one writes the stdin
//! buffer and closes the pipe, two drain stdout and stderr until EOF. Servicing
//! all three concurrently keeps a child that fills one pipe while waiting on
//! another from deadlocking.
//!
use std::io::{self, Read, Write};
use std::process::Child;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// Helper threads attached to a running child.
pub(crate) struct Pipes {
    stdin: Option<JoinHandle<io::Result<()>>>,
    stdout: Option<JoinHandle<io::Result<Vec<u8>>>>,
    stderr: Option<JoinHandle<io::Result<Vec<u8>>>>,
}

/// Everything collected from the child's output streams.
pub(crate) struct Captured {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Pipes {
    /// Takes the child's pipe ends and starts servicing them.
    ///
    /// `input` is written to the child's stdin, after which stdin is closed.
    pub(crate) fn attach(child: &mut Child, input: Vec<u8>) -> Pipes {
        let stdin = child.stdin.take().map(|mut pipe| {
            thread::spawn(move || {
                let result = match pipe.write_all(&input) {
                    // The child may exit without reading its input.
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                        debug!("Child closed stdin before reading {} bytes", input.len());
                        Ok(())
                    }
                    other => other,
                };
                drop(pipe);
                result
            })
        });
        let stdout = child.stdout.take().map(|pipe| thread::spawn(move || drain(pipe)));
        let stderr = child.stderr.take().map(|pipe| thread::spawn(move || drain(pipe)));
        Pipes {
            stdin,
            stdout,
            stderr,
        }
    }

    /// Joins all helper threads.
    ///
    /// Output is returned even when one of the streams failed, so stderr text
    /// survives for diagnostics; the first I/O error is reported alongside it.
    pub(crate) fn finish(self) -> (Captured, Option<io::Error>) {
        let mut first_error = None;

        let stdout = settle(join(self.stdout), &mut first_error);
        let stderr = settle(join(self.stderr), &mut first_error);
        if let Some(handle) = self.stdin {
            if let Err(e) = join_handle(handle) {
                first_error.get_or_insert(e);
            }
        }

        (
            Captured {
                stdout: stdout.unwrap_or_default(),
                stderr: stderr.unwrap_or_default(),
            },
            first_error,
        )
    }

    /// Like [`Pipes::finish`], but gives the helper threads at most `grace` to
    /// reach EOF.
    ///
    /// Descendants of a killed child can hold the pipes open indefinitely.
    /// Threads still blocked when the grace period ends are detached and their
    /// output is dropped.
    pub(crate) fn finish_within(self, grace: Duration) -> (Captured, Option<io::Error>) {
        let deadline = Instant::now() + grace;
        while !self.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        let Pipes {
            stdin,
            stdout,
            stderr,
        } = self;
        let stdout = stdout.filter(|h| h.is_finished());
        let stderr = stderr.filter(|h| h.is_finished());
        if stdout.is_none() || stderr.is_none() {
            debug!("Output pipes still held open after kill, detaching readers");
        }
        Pipes {
            stdin: stdin.filter(|h| h.is_finished()),
            stdout,
            stderr,
        }
        .finish()
    }

    fn is_finished(&self) -> bool {
        done(&self.stdin) && done(&self.stdout) && done(&self.stderr)
    }
}

fn done<T>(handle: &Option<JoinHandle<T>>) -> bool {
    match handle {
        Some(handle) => handle.is_finished(),
        None => true,
    }
}

fn drain<R: Read>(mut pipe: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf)?;
    Ok(buf)
}

fn join(handle: Option<JoinHandle<io::Result<Vec<u8>>>>) -> io::Result<Vec<u8>> {
    match handle {
        Some(handle) => join_handle(handle),
        None => Ok(Vec::new()),
    }
}

fn join_handle<T>(handle: JoinHandle<io::Result<T>>) -> io::Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("stream thread panicked")))
}

fn settle(result: io::Result<Vec<u8>>, first_error: &mut Option<io::Error>) -> Option<Vec<u8>> {
    match result {
        Ok(buf) => Some(buf),
        Err(e) => {
            first_error.get_or_insert(e);
            None
        }
    }
}
