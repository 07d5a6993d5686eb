#![forbid(unsafe_code)]

//! Engine-reported failures.

use std::fmt;
use std::io;

use ncwrap_core::{CellError, ChannelError};

use crate::handle::PlaneHandle;

/// A failure code returned by an engine primitive.
///
/// These are recoverable: the caller can retry with different input.
#[derive(Debug)]
pub enum EngineError {
    /// The engine has been stopped.
    Stopped,
    /// The engine was used before `init`.
    NotInitialized,
    /// An argument was rejected.
    InvalidArgument(String),
    /// A coordinate fell outside the plane.
    OutOfBounds { plane: PlaneHandle, y: i32, x: i32 },
    /// The standard plane cannot be destroyed or reparented.
    StdPlane,
    /// A widget could not be laid out in the space available.
    Geometry {
        rows: u32,
        cols: u32,
        avail_rows: u32,
        avail_cols: u32,
    },
    /// A requested capability is unavailable and degradation was refused.
    Unsupported(&'static str),
    /// An image could not be loaded or decoded.
    Image(String),
    Channel(ChannelError),
    Cell(CellError),
    /// Terminal I/O failed.
    Io(io::Error),
}

impl EngineError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "engine has been stopped"),
            Self::NotInitialized => write!(f, "engine has not been initialized"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::OutOfBounds { plane, y, x } => {
                write!(f, "({y}, {x}) is outside plane {plane}")
            }
            Self::StdPlane => write!(f, "operation not permitted on the standard plane"),
            Self::Geometry {
                rows,
                cols,
                avail_rows,
                avail_cols,
            } => write!(
                f,
                "widget needs {rows}x{cols} cells but only {avail_rows}x{avail_cols} are available"
            ),
            Self::Unsupported(what) => write!(f, "{what} is not supported"),
            Self::Image(msg) => write!(f, "image error: {msg}"),
            Self::Channel(e) => write!(f, "{e}"),
            Self::Cell(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "terminal I/O error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Channel(e) => Some(e),
            Self::Cell(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ChannelError> for EngineError {
    fn from(e: ChannelError) -> Self {
        Self::Channel(e)
    }
}

impl From<CellError> for EngineError {
    fn from(e: CellError) -> Self {
        Self::Cell(e)
    }
}

impl From<io::Error> for EngineError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
