#![forbid(unsafe_code)]

//! Demo error type.

use std::fmt;

use ncwrap::prelude::*;

#[derive(Debug)]
pub enum DemoError {
    Engine(EngineError),
    Plane(PlaneError),
    Selector(SelectorError),
    Visual(VisualError),
    Session(SessionError),
    /// The terminal cannot fit the layout.
    TooSmall { rows: u32, cols: u32 },
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Engine(e) => write!(f, "{e}"),
            Self::Plane(e) => write!(f, "{e}"),
            Self::Selector(e) => write!(f, "{e}"),
            Self::Visual(e) => write!(f, "{e}"),
            Self::Session(e) => write!(f, "{e}"),
            Self::TooSmall { rows, cols } => {
                write!(f, "terminal too small for the demo ({cols}x{rows})")
            }
        }
    }
}

impl std::error::Error for DemoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(e) => Some(e),
            Self::Plane(e) => Some(e),
            Self::Selector(e) => Some(e),
            Self::Visual(e) => Some(e),
            Self::Session(e) => Some(e),
            Self::TooSmall { .. } => None,
        }
    }
}

impl From<EngineError> for DemoError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

impl From<PlaneError> for DemoError {
    fn from(err: PlaneError) -> Self {
        Self::Plane(err)
    }
}

impl From<SelectorError> for DemoError {
    fn from(err: SelectorError) -> Self {
        Self::Selector(err)
    }
}

impl From<VisualError> for DemoError {
    fn from(err: VisualError) -> Self {
        Self::Visual(err)
    }
}

impl From<SessionError> for DemoError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}
