//! # DevRS Process Integration Test Common Helpers
//!
//! File: process/tests/common.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/devrs
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `process/tests/`. Each test
//! file declares `mod common;` and pulls in what it needs.
//!

// Different test files use different helpers.
#![allow(dead_code)]

use devrs_process::Command;
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// # Initialize Test Logging (`init_logging`)
///
/// Installs a `tracing` subscriber once per test binary so library events are
/// visible with `RUST_LOG=debug cargo test -- --nocapture`. Defaults to `warn`.
pub fn init_logging() {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_test_writer()
            .with_target(false)
            .compact()
            .try_init();
    });
}

/// # Shell Command (`sh`)
///
/// Builds a `Command` running `script` through `sh -c`.
pub fn sh(script: &str) -> Command {
    init_logging();
    Command::new("sh", ["-c", script])
}
