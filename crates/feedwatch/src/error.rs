use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while wiring up the watchdog.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no tokio runtime available: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
}

/// Failures of a single alert delivery. Logged by the dispatcher, never retried.
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("{0:#}")]
    Io(#[from] std::io::Error),
    #[error("mail transport did not accept input on stdin")]
    StdinUnavailable,
    #[error("mail transport exited with {0}")]
    Exit(ExitStatus),
    #[error("mail transport did not finish within {0:?}")]
    Timeout(Duration),
}
