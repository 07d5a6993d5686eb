#![forbid(unsafe_code)]

//! Safe wrappers over a terminal rendering engine.
//!
//! The engine owns planes, widgets and images and names them by opaque
//! handles. This crate gives each native plane exactly one managed
//! identity ([`Plane`]), tracks who is responsible for destroying it, and
//! turns use-after-release into a loud failure instead of undefined
//! behaviour.
//!
//! # Example
//!
//! ```
//! use ncwrap::prelude::*;
//!
//! let session = Session::init(SoftEngine::headless(24, 80), &InitOptions::default()).unwrap();
//! let root = session.std_plane();
//! let child = Plane::create_at(&root, 5, 5, 6, 30).unwrap();
//! child.put_str_yx(0, 0, "hello").unwrap();
//! session.render().unwrap();
//!
//! // Wrapping a live handle yields the same wrapper.
//! assert!(session.wrap_plane(child.handle()).ptr_eq(&child));
//!
//! child.destroy().unwrap();
//! assert!(!child.is_valid());
//! ```

pub mod direct;
pub mod error;
pub mod plane;
pub mod registry;
pub mod selector;
pub mod session;
pub mod visual;

pub use direct::Direct;
pub use error::{DirectError, PlaneError, SelectorError, SessionError, VisualError};
pub use plane::{Ink, Owner, Plane};
pub use registry::PlaneRegistry;
pub use selector::Selector;
pub use session::Session;
pub use visual::Visual;

pub mod prelude {
    pub use crate::{
        Direct, DirectError, Ink, Owner, Plane, PlaneError, Selector, SelectorError, Session,
        SessionError, Visual, VisualError,
    };
    pub use ncwrap_core::{
        Align, Alpha, Cell, Channel, Channels, Color, EventType, InputEvent, Key, Modifiers, Style,
    };
    pub use ncwrap_engine::{
        BlitFlags, BlitOptions, Blitter, CellView, DirectEngine, Engine, EngineError, InitFlags,
        InitOptions, InputReadiness, PlaneFlags, PlaneOptions, Scale, SelectorItem,
        SelectorOptions, SoftDirect, SoftEngine,
    };
}
