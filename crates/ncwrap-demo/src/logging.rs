#![forbid(unsafe_code)]

//! File logging for the demo.
//!
//! The terminal is in raw mode while the demo runs, so events go to a file.
//! `NCWRAP_LOG` holds an `EnvFilter` directive (default `warn`).

use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt as tfmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `NCWRAP_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn";

#[derive(Debug)]
pub enum LoggingError {
    Io(io::Error),
    /// A global subscriber is already installed.
    AlreadySet,
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot open log file: {e}"),
            Self::AlreadySet => write!(f, "a global tracing subscriber is already set"),
        }
    }
}

impl std::error::Error for LoggingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::AlreadySet => None,
        }
    }
}

impl From<io::Error> for LoggingError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// The filter from `NCWRAP_LOG`, falling back to [`DEFAULT_FILTER`].
pub fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_env("NCWRAP_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a global subscriber writing to `path`. Without a path nothing is
/// installed and events are discarded.
pub fn init(path: Option<&Path>) -> Result<(), LoggingError> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)?;
    let layer = tfmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file));
    tracing_subscriber::registry()
        .with(filter_from_env())
        .with(layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadySet)?;
    tracing::info!(path = %path.display(), "logging started");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_path_installs_nothing() {
        assert!(init(None).is_ok());
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let err = init(Some(Path::new("/nonexistent/ncwrap/demo.log"))).unwrap_err();
        assert!(matches!(err, LoggingError::Io(_)));
    }
}
