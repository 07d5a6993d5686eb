#![forbid(unsafe_code)]

//! Wrapper error types.
//!
//! Misuse of an invalidated wrapper is a programming error and panics;
//! these types cover the recoverable cases.

use std::fmt;

use ncwrap_engine::EngineError;

use crate::plane::{Owner, Plane};

/// Errors from [`Plane`] lifetime operations.
#[derive(Debug)]
pub enum PlaneError {
    /// The wrapper was never bound to a native plane.
    Unset,
    /// The native plane was destroyed or handed back.
    Invalidated,
    /// The wrapper does not own its native plane.
    NotOwner(Owner),
    /// The session that created the plane has stopped.
    Stopped,
    Engine(EngineError),
}

impl fmt::Display for PlaneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "plane has no native handle"),
            Self::Invalidated => write!(f, "plane has been invalidated"),
            Self::NotOwner(owner) => write!(f, "plane is owned by {owner}"),
            Self::Stopped => write!(f, "session has stopped"),
            Self::Engine(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PlaneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EngineError> for PlaneError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

/// Errors from [`Selector::new`](crate::Selector::new).
#[derive(Debug)]
pub enum SelectorError {
    /// Two items share an option identifier. The plane is returned untouched.
    DuplicateOption { option: String, plane: Plane },
    /// The plane is not owned by its wrapper, so it cannot be handed over.
    NotOwner { owner: Owner, plane: Plane },
    /// The engine refused the widget; the plane has been invalidated.
    Engine(EngineError),
}

impl SelectorError {
    /// The plane handed back by a rejected construction, if any.
    pub fn into_plane(self) -> Option<Plane> {
        match self {
            Self::DuplicateOption { plane, .. } | Self::NotOwner { plane, .. } => Some(plane),
            Self::Engine(_) => None,
        }
    }
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateOption { option, .. } => {
                write!(f, "selector option {option:?} appears more than once")
            }
            Self::NotOwner { owner, .. } => {
                write!(f, "selector needs an owned plane, but it is owned by {owner}")
            }
            Self::Engine(e) => write!(f, "selector construction failed: {e}"),
        }
    }
}

impl std::error::Error for SelectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(e) => Some(e),
            Self::DuplicateOption { .. } | Self::NotOwner { .. } => None,
        }
    }
}

impl From<EngineError> for SelectorError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

/// Errors from [`Visual`](crate::Visual) operations.
#[derive(Debug)]
pub enum VisualError {
    /// The visual outlived its session or was released.
    Released,
    Engine(EngineError),
}

impl fmt::Display for VisualError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Released => write!(f, "visual has been released"),
            Self::Engine(e) => write!(f, "blit failed: {e}"),
        }
    }
}

impl std::error::Error for VisualError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(e) => Some(e),
            Self::Released => None,
        }
    }
}

impl From<EngineError> for VisualError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

/// Errors from [`Session`](crate::Session) operations.
#[derive(Debug)]
pub enum SessionError {
    /// `stop` has already run.
    Stopped,
    Engine(EngineError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "session has stopped"),
            Self::Engine(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(e) => Some(e),
            Self::Stopped => None,
        }
    }
}

impl From<EngineError> for SessionError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

/// Errors from [`Direct`](crate::Direct) operations.
#[derive(Debug)]
pub enum DirectError {
    /// `stop` has already run.
    Stopped,
    Engine(EngineError),
}

impl fmt::Display for DirectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "direct mode has stopped"),
            Self::Engine(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DirectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(e) => Some(e),
            Self::Stopped => None,
        }
    }
}

impl From<EngineError> for DirectError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}
