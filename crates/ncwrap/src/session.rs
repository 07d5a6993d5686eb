#![forbid(unsafe_code)]

//! Engine session.
//!
//! A [`Session`] owns the engine and the plane identity cache. Planes,
//! selectors and visuals keep only a weak reference back to it, so the
//! session is the one strong owner; dropping it stops the engine.
//!
//! Stopping is irreversible. It empties the identity cache and invalidates
//! every wrapper still alive, so later use of them panics and their
//! teardown never reaches the stopped engine.

use std::cell::{Cell, OnceCell, Ref, RefCell, RefMut};
use std::ops::ControlFlow;
use std::rc::Rc;
use std::time::Duration;

use ncwrap_core::InputEvent;
use ncwrap_engine::{CellView, Engine, InitOptions, InputReadiness, PlaneHandle};

use crate::error::SessionError;
use crate::plane::{Owner, Plane, PlaneInner};
use crate::registry::PlaneRegistry;

pub(crate) struct SessionInner {
    engine: RefCell<Box<dyn Engine>>,
    registry: RefCell<PlaneRegistry>,
    stopped: Cell<bool>,
    std_plane: OnceCell<Plane>,
}

impl SessionInner {
    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.get()
    }

    pub(crate) fn engine(&self) -> Ref<'_, Box<dyn Engine>> {
        self.engine.borrow()
    }

    pub(crate) fn engine_mut(&self) -> RefMut<'_, Box<dyn Engine>> {
        self.engine.borrow_mut()
    }

    /// `None` while another call holds the engine.
    pub(crate) fn try_engine_mut(&self) -> Option<RefMut<'_, Box<dyn Engine>>> {
        self.engine.try_borrow_mut().ok()
    }

    /// Register a new wrapper for a handle the engine just produced.
    pub(crate) fn adopt(self: &Rc<Self>, handle: PlaneHandle, owner: Owner) -> Plane {
        let plane = Plane::bind(Rc::downgrade(self), handle, owner);
        let displaced = self.registry.borrow_mut().insert(handle, &plane);
        if let Some(old) = displaced {
            tracing::warn!(plane = %handle, "handle reused while an old wrapper was live; invalidating it");
            old.invalidate();
        }
        plane
    }

    /// The cached wrapper for `handle`, or a new non-owning one.
    pub(crate) fn wrap(self: &Rc<Self>, handle: PlaneHandle) -> Plane {
        let cached = self.registry.borrow_mut().lookup(handle);
        if let Some(plane) = cached {
            tracing::trace!(plane = %handle, "identity cache hit");
            return plane;
        }
        tracing::debug!(plane = %handle, "wrapping uncached plane");
        self.adopt(handle, Owner::Engine)
    }

    pub(crate) fn forget(&self, handle: PlaneHandle, plane: &Rc<PlaneInner>) {
        if let Ok(mut registry) = self.registry.try_borrow_mut() {
            registry.remove(handle, plane);
        }
    }

    pub(crate) fn prune(&self, handle: PlaneHandle) {
        if let Ok(mut registry) = self.registry.try_borrow_mut() {
            registry.prune(handle);
        }
    }
}

/// A running engine and the wrappers bound to it.
pub struct Session {
    inner: Rc<SessionInner>,
}

impl Session {
    /// Start `engine` and take ownership of it.
    pub fn init(engine: impl Engine + 'static, options: &InitOptions) -> Result<Self, SessionError> {
        let mut engine: Box<dyn Engine> = Box::new(engine);
        engine.init(options)?;
        let (rows, cols) = engine.term_dim_yx();
        tracing::info!(rows, cols, "session started");
        Ok(Self {
            inner: Rc::new(SessionInner {
                engine: RefCell::new(engine),
                registry: RefCell::new(PlaneRegistry::new()),
                stopped: Cell::new(false),
                std_plane: OnceCell::new(),
            }),
        })
    }

    /// A session on the real terminal.
    #[cfg(all(feature = "terminal", not(target_arch = "wasm32")))]
    pub fn terminal(options: &InitOptions) -> Result<Self, SessionError> {
        use ncwrap_engine::{SoftEngine, TerminalBackend};
        Self::init(SoftEngine::new(TerminalBackend::new()), options)
    }

    pub(crate) fn inner(&self) -> &Rc<SessionInner> {
        &self.inner
    }

    fn ensure_running(&self) -> Result<(), SessionError> {
        if self.inner.is_stopped() {
            Err(SessionError::Stopped)
        } else {
            Ok(())
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.is_stopped()
    }

    /// Stop the engine. Every live wrapper is invalidated first.
    pub fn stop(&self) -> Result<(), SessionError> {
        if self.inner.stopped.replace(true) {
            return Err(SessionError::Stopped);
        }
        let live = self.inner.registry.borrow_mut().drain();
        for plane in &live {
            plane.invalidate();
        }
        let invalidated = live.len();
        drop(live);
        self.inner.engine_mut().stop()?;
        tracing::info!(invalidated, "session stopped");
        Ok(())
    }

    /// The standard plane, or [`SessionError::Stopped`].
    pub fn try_std_plane(&self) -> Result<Plane, SessionError> {
        self.ensure_running()?;
        if let Some(plane) = self.inner.std_plane.get() {
            return Ok(plane.clone());
        }
        let handle = self.inner.engine().std_plane()?;
        let plane = self.inner.std_plane.get_or_init(|| self.inner.wrap(handle));
        Ok(plane.clone())
    }

    /// The standard plane. Non-owning and cached.
    ///
    /// # Panics
    ///
    /// If the session has stopped.
    pub fn std_plane(&self) -> Plane {
        match self.try_std_plane() {
            Ok(plane) => plane,
            Err(err) => panic!("standard plane unavailable: {err}"),
        }
    }

    /// The wrapper for a native plane, creating a non-owning one if the
    /// handle is not cached.
    pub fn wrap_plane(&self, handle: PlaneHandle) -> Plane {
        self.inner.wrap(handle)
    }

    /// The identity cache.
    pub fn registry(&self) -> Ref<'_, PlaneRegistry> {
        self.inner.registry.borrow()
    }

    pub fn term_dim_yx(&self) -> (u32, u32) {
        self.inner.engine().term_dim_yx()
    }

    pub fn render(&self) -> Result<(), SessionError> {
        self.ensure_running()?;
        Ok(self.inner.engine_mut().render()?)
    }

    /// Repaint the whole screen. Returns the terminal size.
    pub fn refresh(&self) -> Result<(u32, u32), SessionError> {
        self.ensure_running()?;
        Ok(self.inner.engine_mut().refresh()?)
    }

    /// A cell of the last rendered frame.
    pub fn at(&self, y: u32, x: u32) -> Option<CellView> {
        self.inner.engine().at_yx(y, x)
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Wait for an event; `None` once input is closed.
    pub fn get_blocking(&self) -> Result<Option<InputEvent>, SessionError> {
        self.ensure_running()?;
        Ok(self.inner.engine_mut().get_blocking()?)
    }

    pub fn get_nonblocking(&self) -> Result<Option<InputEvent>, SessionError> {
        self.ensure_running()?;
        Ok(self.inner.engine_mut().get_nonblocking()?)
    }

    /// Wait up to `timeout` (forever if `None`) for input.
    pub fn input_ready(&self, timeout: Option<Duration>) -> Result<InputReadiness, SessionError> {
        self.ensure_running()?;
        Ok(self.inner.engine_mut().input_ready(timeout)?)
    }

    /// Feed every event to `handler` as input becomes ready, draining the
    /// queue each time. Returns when the handler breaks or input closes.
    pub fn run_loop<F>(&self, mut handler: F) -> Result<(), SessionError>
    where
        F: FnMut(&Session, &InputEvent) -> ControlFlow<()>,
    {
        loop {
            match self.input_ready(None)? {
                InputReadiness::Closed => return Ok(()),
                InputReadiness::Idle => {}
                InputReadiness::Ready => {
                    while let Some(event) = self.get_nonblocking()? {
                        if handler(self, &event).is_break() {
                            return Ok(());
                        }
                        if self.is_stopped() {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Terminal
    // -----------------------------------------------------------------------

    pub fn str_width(&self, text: &str) -> usize {
        self.inner.engine().str_width(text)
    }

    pub fn can_open_images(&self) -> bool {
        self.inner.engine().can_open_images()
    }

    pub fn mice_enable(&self) -> Result<(), SessionError> {
        self.ensure_running()?;
        Ok(self.inner.engine_mut().mice_enable(true)?)
    }

    pub fn mice_disable(&self) -> Result<(), SessionError> {
        self.ensure_running()?;
        Ok(self.inner.engine_mut().mice_enable(false)?)
    }

    /// Terminal cursor position, if it is shown.
    pub fn cursor_yx(&self) -> Option<(u32, u32)> {
        self.inner.engine().cursor_yx()
    }

    pub fn cursor_enable(&self, y: u32, x: u32) -> Result<(), SessionError> {
        self.ensure_running()?;
        Ok(self.inner.engine_mut().cursor_enable(y, x)?)
    }

    pub fn cursor_disable(&self) -> Result<(), SessionError> {
        self.ensure_running()?;
        Ok(self.inner.engine_mut().cursor_disable()?)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.is_stopped() {
            return;
        }
        if let Err(err) = self.stop() {
            tracing::warn!(error = %err, "session stop on drop failed");
        }
    }
}
