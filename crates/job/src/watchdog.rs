//! Process watchdog.
//!
//! The job has no internal cancellation. The watchdog bounds the process
//! lifetime from the outside: once armed, a plain OS thread force-exits the
//! process when the ceiling is reached, whatever the dispatch loop is doing.
//! It observes the outcome of the run but never steers it.

use std::time::{Duration, Instant};

use campaign_common::config::{AppConfig, DEFAULT_EXIT_GRACE_SECS, DEFAULT_MAX_RUNTIME_SECS};

/// Exit status when the ceiling is hit.
const TIMED_OUT_EXIT_CODE: i32 = 2;

pub struct Watchdog {
    armed_at: Instant,
    exit_grace: Duration,
}

impl Watchdog {
    /// Start the ceiling timer.
    pub fn arm(ceiling: Duration, exit_grace: Duration) -> std::io::Result<Self> {
        std::thread::Builder::new()
            .name("watchdog".to_string())
            .spawn(move || {
                std::thread::sleep(ceiling);
                tracing::error!(
                    ceiling_secs = ceiling.as_secs(),
                    "Watchdog ceiling reached, forcing exit"
                );
                std::process::exit(TIMED_OUT_EXIT_CODE);
            })?;

        tracing::info!(ceiling_secs = ceiling.as_secs(), "Watchdog armed");
        Ok(Self {
            armed_at: Instant::now(),
            exit_grace,
        })
    }

    /// Report the run outcome, wait out the grace period and return the exit code.
    pub async fn finish(self, success: bool) -> i32 {
        tracing::info!(
            success,
            elapsed_secs = self.armed_at.elapsed().as_secs(),
            grace_secs = self.exit_grace.as_secs(),
            "Job finished, exiting after grace period"
        );
        if !self.exit_grace.is_zero() {
            tokio::time::sleep(self.exit_grace).await;
        }
        exit_code(success)
    }
}

/// Ceiling and exit grace for the run. Falls back to the defaults when the
/// configuration could not be loaded, so that failure still exits through
/// [`Watchdog::finish`].
pub fn limits(config: Option<&AppConfig>) -> (Duration, Duration) {
    match config {
        Some(config) => (config.max_runtime(), config.exit_grace()),
        None => (
            Duration::from_secs(DEFAULT_MAX_RUNTIME_SECS),
            Duration::from_secs(DEFAULT_EXIT_GRACE_SECS),
        ),
    }
}

pub fn exit_code(success: bool) -> i32 {
    if success { 0 } else { 1 }
}
