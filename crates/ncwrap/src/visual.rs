#![forbid(unsafe_code)]

//! Decoded images and blitting.

use std::path::Path;
use std::rc::{Rc, Weak};

use ncwrap_engine::{BlitFlags, BlitOptions, VisualHandle};

use crate::error::VisualError;
use crate::plane::{Owner, Plane};
use crate::session::{Session, SessionInner};

/// A decoded image held by the engine.
pub struct Visual {
    session: Weak<SessionInner>,
    handle: VisualHandle,
}

impl Visual {
    /// Load an image file; `None` if it cannot be opened or decoded.
    pub fn from_file(session: &Session, path: impl AsRef<Path>) -> Option<Visual> {
        let path = path.as_ref();
        if session.is_stopped() {
            return None;
        }
        let loaded = session.inner().engine_mut().visual_from_file(path);
        match loaded {
            Ok(handle) => {
                tracing::debug!(visual = %handle, path = %path.display(), "visual loaded");
                Some(Self::adopt(session, handle))
            }
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "visual load failed");
                None
            }
        }
    }

    /// Wrap `rows * cols` RGBA pixels, row-major.
    pub fn from_rgba(session: &Session, rows: u32, cols: u32, rgba: &[u8]) -> Result<Visual, VisualError> {
        if session.is_stopped() {
            return Err(VisualError::Released);
        }
        let handle = session
            .inner()
            .engine_mut()
            .visual_from_rgba(rows, cols, rgba)?;
        Ok(Self::adopt(session, handle))
    }

    fn adopt(session: &Session, handle: VisualHandle) -> Self {
        Self {
            session: Rc::downgrade(session.inner()),
            handle,
        }
    }

    pub fn handle(&self) -> VisualHandle {
        self.handle
    }

    fn session(&self) -> Result<Rc<SessionInner>, VisualError> {
        self.session
            .upgrade()
            .filter(|s| !s.is_stopped())
            .ok_or(VisualError::Released)
    }

    /// Pixel size as `(rows, cols)`.
    pub fn dim_yx(&self) -> Result<(u32, u32), VisualError> {
        Ok(self.session()?.engine().visual_dim_yx(self.handle))
    }

    /// Blit with `options` as given. Without a target plane the engine
    /// creates one under the standard plane; the returned wrapper owns it.
    pub fn blit(&self, options: &BlitOptions) -> Result<Plane, VisualError> {
        let session = self.session()?;
        let handle = session.engine_mut().visual_blit(self.handle, options)?;
        let created = options.plane.is_none() || options.flags.contains(BlitFlags::CHILDPLANE);
        tracing::debug!(visual = %self.handle, plane = %handle, created, "visual blitted");
        Ok(if created {
            session.adopt(handle, Owner::Wrapper)
        } else {
            session.wrap(handle)
        })
    }

    /// Blit onto `target`. Unless `CHILDPLANE` is set this returns `target`
    /// itself; with it, a new owned child of `target`.
    ///
    /// # Panics
    ///
    /// If `target` is not valid.
    pub fn blit_onto(&self, target: &Plane, options: &BlitOptions) -> Result<Plane, VisualError> {
        let options = BlitOptions {
            plane: Some(target.handle()),
            ..options.clone()
        };
        self.blit(&options)
    }
}

impl Drop for Visual {
    fn drop(&mut self) {
        let Ok(session) = self.session() else {
            return;
        };
        match session.try_engine_mut() {
            Some(mut engine) => {
                engine.visual_destroy(self.handle);
                tracing::trace!(visual = %self.handle, "visual released");
            }
            None => tracing::warn!(visual = %self.handle, "engine busy during visual teardown"),
        }
    }
}

impl std::fmt::Debug for Visual {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Visual").field(&self.handle).finish()
    }
}
