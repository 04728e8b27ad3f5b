//! `tracing` subscriber setup.
//!
//! The library only emits events; installing a subscriber is left to the
//! application. These helpers install a formatting subscriber filtered by
//! a directive string such as [`TaskListConfig::log_filter`].
//!
//! [`TaskListConfig::log_filter`]: crate::TaskListConfig::log_filter

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Errors from [`try_init_logging`].
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directive did not parse.
    #[error("invalid log filter: {0}")]
    InvalidFilter(#[from] ParseError),

    /// A global subscriber is already installed.
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Installs the global subscriber, reporting failures.
///
/// # Errors
///
/// Returns [`LoggingError::InvalidFilter`] for a malformed directive and
/// [`LoggingError::AlreadyInitialized`] if a subscriber is already set.
pub fn try_init_logging(filter: &str) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(filter)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}

/// Installs the global subscriber, falling back to `info` for a malformed
/// directive. Does nothing if a subscriber is already installed.
pub fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
