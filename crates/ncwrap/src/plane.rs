#![forbid(unsafe_code)]

//! Managed plane wrappers.
//!
//! A [`Plane`] is the single managed identity of one native plane. Clones
//! share that identity; the session's [`PlaneRegistry`](crate::PlaneRegistry)
//! guarantees that wrapping a live handle again yields the same wrapper.
//!
//! # Lifecycle
//!
//! A wrapper moves one way through `unset -> valid -> invalidated`. Once
//! invalidated it never becomes valid again. Every accessor checks the state
//! first and panics on an unset or invalidated wrapper; [`Plane::try_handle`]
//! is the non-panicking check.
//!
//! # Ownership
//!
//! The wrapper that created a native plane owns it and destroys it when the
//! last clone drops. Ownership can be handed to the engine or to a widget
//! with [`Plane::transfer_ownership`]; a non-owning wrapper never destroys
//! the native plane.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use ncwrap_core::{Align, Alpha, Cell as NcCell, Channel, Channels, Color, Style};
use ncwrap_engine::{
    CellView, Engine, EngineError, PlaneFlags, PlaneHandle, PlaneOptions, SelectorHandle,
};

use crate::error::PlaneError;
use crate::session::SessionInner;

/// Who is responsible for destroying a native plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// The managed wrapper destroys it on drop.
    Wrapper,
    /// The engine (or nobody) destroys it.
    Engine,
    /// A selector widget destroys it with itself.
    Selector(SelectorHandle),
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wrapper => write!(f, "its wrapper"),
            Self::Engine => write!(f, "the engine"),
            Self::Selector(h) => write!(f, "selector {h}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Unset,
    Valid(PlaneHandle),
    Invalidated,
}

pub(crate) struct PlaneInner {
    session: Weak<SessionInner>,
    slot: Cell<Slot>,
    owner: Cell<Owner>,
}

impl PlaneInner {
    pub(crate) fn bound_to(&self, handle: PlaneHandle) -> bool {
        self.slot.get() == Slot::Valid(handle)
    }

    /// Set the native handle. Write-once.
    fn bind(&self, handle: PlaneHandle) {
        match self.slot.get() {
            Slot::Unset => self.slot.set(Slot::Valid(handle)),
            Slot::Valid(old) => panic!("plane {old} is already bound; cannot rebind to {handle}"),
            Slot::Invalidated => panic!("cannot bind an invalidated plane to {handle}"),
        }
    }
}

impl Drop for PlaneInner {
    fn drop(&mut self) {
        let Slot::Valid(handle) = self.slot.get() else {
            return;
        };
        let Some(session) = self.session.upgrade() else {
            return;
        };
        session.prune(handle);
        if self.owner.get() != Owner::Wrapper || session.is_stopped() {
            return;
        }
        let Some(mut engine) = session.try_engine_mut() else {
            tracing::warn!(plane = %handle, "engine busy during plane teardown; native plane leaked");
            return;
        };
        match engine.plane_destroy(handle) {
            Ok(()) => tracing::debug!(plane = %handle, "owned plane destroyed on drop"),
            Err(err) => tracing::warn!(plane = %handle, error = %err, "plane teardown failed"),
        }
    }
}

/// Temporary colours and styles for [`Plane::put_str_styled`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ink {
    pub styles: Style,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
}

impl Ink {
    pub fn fg(color: Color) -> Self {
        Self {
            fg: Some(color),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn on(mut self, bg: Color) -> Self {
        self.bg = Some(bg);
        self
    }

    #[must_use]
    pub fn styled(mut self, styles: Style) -> Self {
        self.styles = styles;
        self
    }
}

/// A managed reference to a native plane.
#[derive(Clone)]
pub struct Plane(Rc<PlaneInner>);

impl Plane {
    pub(crate) fn from_inner(inner: Rc<PlaneInner>) -> Self {
        Self(inner)
    }

    pub(crate) fn inner(&self) -> &Rc<PlaneInner> {
        &self.0
    }

    /// A fresh wrapper bound to `handle`. Registration is the caller's job.
    pub(crate) fn bind(session: Weak<SessionInner>, handle: PlaneHandle, owner: Owner) -> Self {
        let inner = PlaneInner {
            session,
            slot: Cell::new(Slot::Unset),
            owner: Cell::new(owner),
        };
        inner.bind(handle);
        Self(Rc::new(inner))
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Create a native child of `parent`. The returned wrapper owns it.
    ///
    /// # Panics
    ///
    /// If `parent` is not valid.
    pub fn create(parent: &Plane, options: &PlaneOptions) -> Result<Plane, EngineError> {
        let session = parent.session();
        let handle = session.engine_mut().plane_create(parent.handle(), options)?;
        tracing::debug!(plane = %handle, parent = %parent.handle(), "plane created");
        Ok(session.adopt(handle, Owner::Wrapper))
    }

    pub fn create_at(
        parent: &Plane,
        y: i32,
        x: i32,
        rows: u32,
        cols: u32,
    ) -> Result<Plane, EngineError> {
        Self::create(parent, &PlaneOptions::new(y, x, rows, cols))
    }

    /// A plane that tracks `parent`'s size minus the margins.
    pub fn marginalized(
        parent: &Plane,
        top: u32,
        left: u32,
        bottom: u32,
        right: u32,
        flags: PlaneFlags,
    ) -> Result<Plane, EngineError> {
        Self::create(
            parent,
            &PlaneOptions::marginalized(top, left, bottom, right).with_flags(flags),
        )
    }

    // -----------------------------------------------------------------------
    // Lifetime
    // -----------------------------------------------------------------------

    /// The native handle, or why there is none.
    pub fn try_handle(&self) -> Result<PlaneHandle, PlaneError> {
        match self.0.slot.get() {
            Slot::Valid(handle) => Ok(handle),
            Slot::Unset => Err(PlaneError::Unset),
            Slot::Invalidated => Err(PlaneError::Invalidated),
        }
    }

    /// The native handle.
    ///
    /// # Panics
    ///
    /// If the wrapper is unset or invalidated.
    pub fn handle(&self) -> PlaneHandle {
        match self.0.slot.get() {
            Slot::Valid(handle) => handle,
            Slot::Unset => panic!("tried to access an unset plane"),
            Slot::Invalidated => panic!("tried to access an invalidated plane"),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.0.slot.get(), Slot::Valid(_))
    }

    pub fn owner(&self) -> Owner {
        self.0.owner.get()
    }

    /// Whether dropping the last clone destroys the native plane.
    pub fn owns_resource(&self) -> bool {
        self.is_valid() && self.owner() == Owner::Wrapper
    }

    /// Same managed identity.
    pub fn ptr_eq(&self, other: &Plane) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Destroy the native plane now and invalidate the wrapper.
    ///
    /// Only the owning wrapper may destroy; a second call reports
    /// [`PlaneError::Invalidated`].
    pub fn destroy(&self) -> Result<(), PlaneError> {
        let handle = self.try_handle()?;
        let owner = self.owner();
        if owner != Owner::Wrapper {
            return Err(PlaneError::NotOwner(owner));
        }
        let session = self.0.session.upgrade().ok_or(PlaneError::Stopped)?;
        if session.is_stopped() {
            return Err(PlaneError::Stopped);
        }
        session.engine_mut().plane_destroy(handle)?;
        tracing::debug!(plane = %handle, "plane destroyed");
        self.invalidate();
        Ok(())
    }

    /// Give up ownership: the native plane is left to the engine and this
    /// wrapper stays valid for reads but never destroys it.
    ///
    /// Ownership only moves away from the wrapper. A wrapper that does not
    /// own its plane reports [`PlaneError::NotOwner`] and is unchanged.
    pub fn transfer_ownership(&self) -> Result<(), PlaneError> {
        self.hand_over(Owner::Engine)
    }

    pub(crate) fn hand_over(&self, owner: Owner) -> Result<(), PlaneError> {
        let handle = self.try_handle()?;
        let current = self.owner();
        if current != Owner::Wrapper || owner == Owner::Wrapper {
            return Err(PlaneError::NotOwner(current));
        }
        tracing::debug!(plane = %handle, to = %owner, "plane ownership transferred");
        self.0.owner.set(owner);
        Ok(())
    }

    /// Invalidate without destroying the native plane, dropping the cache
    /// entry. Invalidating twice is a no-op.
    pub fn invalidate(&self) {
        let Slot::Valid(handle) = self.0.slot.get() else {
            return;
        };
        if let Some(session) = self.0.session.upgrade() {
            session.forget(handle, &self.0);
        }
        self.0.slot.set(Slot::Invalidated);
        tracing::debug!(plane = %handle, "plane invalidated");
    }

    // -----------------------------------------------------------------------
    // Engine access
    // -----------------------------------------------------------------------

    pub(crate) fn inner_session(&self) -> Option<Rc<SessionInner>> {
        self.0.session.upgrade()
    }

    fn session(&self) -> Rc<SessionInner> {
        let handle = self.handle();
        match self.0.session.upgrade() {
            Some(session) => session,
            None => panic!("plane {handle} outlived its session"),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&dyn Engine, PlaneHandle) -> R) -> R {
        let handle = self.handle();
        let session = self.session();
        let engine = session.engine();
        f(&**engine, handle)
    }

    fn write<R>(&self, f: impl FnOnce(&mut dyn Engine, PlaneHandle) -> R) -> R {
        let handle = self.handle();
        let session = self.session();
        let mut engine = session.engine_mut();
        f(&mut **engine, handle)
    }

    // -----------------------------------------------------------------------
    // Geometry
    // -----------------------------------------------------------------------

    pub fn name(&self) -> Option<String> {
        self.read(|e, h| e.plane_name(h))
    }

    /// The parent plane, or `None` for the standard plane.
    pub fn parent(&self) -> Option<Plane> {
        let parent = self.read(|e, h| e.plane_parent(h))?;
        Some(self.session().wrap(parent))
    }

    /// Position relative to the parent.
    pub fn yx(&self) -> (i32, i32) {
        self.read(|e, h| e.plane_yx(h))
    }

    pub fn y(&self) -> i32 {
        self.yx().0
    }

    pub fn x(&self) -> i32 {
        self.yx().1
    }

    /// Position relative to the terminal origin.
    pub fn abs_yx(&self) -> (i32, i32) {
        self.read(|e, h| e.plane_abs_yx(h))
    }

    pub fn abs_y(&self) -> i32 {
        self.abs_yx().0
    }

    pub fn abs_x(&self) -> i32 {
        self.abs_yx().1
    }

    pub fn dim_yx(&self) -> (u32, u32) {
        self.read(|e, h| e.plane_dim_yx(h))
    }

    pub fn rows(&self) -> u32 {
        self.dim_yx().0
    }

    pub fn columns(&self) -> u32 {
        self.dim_yx().1
    }

    /// Last row, in the parent's coordinates.
    pub fn bottom_y(&self) -> i32 {
        let (rows, _) = self.dim_yx();
        self.y() + rows as i32 - 1
    }

    /// Last column, in the parent's coordinates.
    pub fn right_x(&self) -> i32 {
        let (_, cols) = self.dim_yx();
        self.x() + cols as i32 - 1
    }

    /// Whether a point in the parent's coordinates falls on this plane.
    pub fn contains(&self, y: i32, x: i32) -> bool {
        let (py, px) = self.yx();
        let (rows, cols) = self.dim_yx();
        y >= py && x >= px && y < py + rows as i32 && x < px + cols as i32
    }

    /// Whether a terminal coordinate falls on this plane.
    pub fn abs_contains(&self, y: i32, x: i32) -> bool {
        let (py, px) = self.abs_yx();
        let (rows, cols) = self.dim_yx();
        y >= py && x >= px && y < py + rows as i32 && x < px + cols as i32
    }

    pub fn cursor_yx(&self) -> (u32, u32) {
        self.read(|e, h| e.plane_cursor_yx(h))
    }

    pub fn cursor_y(&self) -> u32 {
        self.cursor_yx().0
    }

    pub fn cursor_x(&self) -> u32 {
        self.cursor_yx().1
    }

    /// Move the cursor; `-1` keeps that coordinate.
    pub fn cursor_move(&self, y: i32, x: i32) -> Result<(), EngineError> {
        self.write(|e, h| e.plane_cursor_move_yx(h, y, x))
    }

    pub fn move_to(&self, y: i32, x: i32) -> Result<(), EngineError> {
        self.write(|e, h| e.plane_move_yx(h, y, x))
    }

    pub fn move_top(&self) {
        self.write(|e, h| e.plane_move_top(h));
    }

    pub fn move_bottom(&self) {
        self.write(|e, h| e.plane_move_bottom(h));
    }

    pub fn resize(&self, rows: u32, cols: u32) -> Result<(), EngineError> {
        self.write(|e, h| e.plane_resize_simple(h, rows, cols))
    }

    pub fn resize_marginalized(&self) -> Result<(), EngineError> {
        self.write(|e, h| e.plane_resize_marginalized(h))
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    pub fn erase(&self) {
        self.write(|e, h| e.plane_erase(h));
    }

    pub fn erase_region(&self, y: i32, x: i32, ylen: i32, xlen: i32) -> Result<(), EngineError> {
        self.write(|e, h| e.plane_erase_region(h, y, x, ylen, xlen))
    }

    /// Rounded box from the cursor to `(ystop, xstop)`; `ctlword` takes
    /// [`boxmask`](ncwrap_engine::boxmask) bits.
    pub fn rounded_box(
        &self,
        styles: Style,
        channels: Channels,
        ystop: u32,
        xstop: u32,
        ctlword: u32,
    ) -> Result<(), EngineError> {
        self.write(|e, h| e.plane_rounded_box(h, styles, channels, ystop, xstop, ctlword))
    }

    /// White rounded box from the cursor to `(ystop, xstop)`.
    pub fn box_to(&self, ystop: u32, xstop: u32) -> Result<(), EngineError> {
        self.rounded_box(Style::NONE, Channels::from_fg(Color::WHITE), ystop, xstop, 0)
    }

    /// Rounded box around the plane's edge.
    pub fn perimeter_rounded_box(&self, color: Color) -> Result<(), EngineError> {
        self.write(|e, h| {
            e.plane_cursor_move_yx(h, 0, 0)?;
            let (rows, cols) = e.plane_dim_yx(h);
            e.plane_rounded_box(
                h,
                Style::NONE,
                Channels::from_fg(color),
                rows.saturating_sub(1),
                cols.saturating_sub(1),
                0,
            )
        })
    }

    pub fn scrolling(&self) -> bool {
        self.read(|e, h| e.plane_scrolling(h))
    }

    /// Returns the previous setting.
    pub fn set_scrolling(&self, scrolling: bool) -> bool {
        self.write(|e, h| e.plane_set_scrolling(h, scrolling))
    }

    pub fn scroll_up(&self, rows: u32) -> Result<(), EngineError> {
        self.write(|e, h| e.plane_scrollup(h, rows))
    }

    /// Write at the cursor. Returns the columns written.
    pub fn put_str(&self, text: &str) -> Result<u32, EngineError> {
        self.put_str_yx(-1, -1, text)
    }

    pub fn put_str_yx(&self, y: i32, x: i32, text: &str) -> Result<u32, EngineError> {
        self.write(|e, h| e.plane_putstr_yx(h, y, x, text))
    }

    /// Write with temporary colours and styles; the plane's own are
    /// restored afterwards, whatever the outcome.
    pub fn put_str_styled(&self, y: i32, x: i32, ink: Ink, text: &str) -> Result<u32, EngineError> {
        self.write(|e, h| {
            let channels = e.plane_channels(h);
            let styles = e.plane_styles(h);
            if let Some(fg) = ink.fg {
                e.plane_set_fg_rgb(h, fg);
            }
            if let Some(bg) = ink.bg {
                e.plane_set_bg_rgb(h, bg);
            }
            e.plane_set_styles(h, ink.styles);
            let written = e.plane_putstr_yx(h, y, x, text);
            e.plane_set_channels(h, channels);
            e.plane_set_styles(h, styles);
            written
        })
    }

    /// Write aligned on row `y`, or the cursor row when `None`.
    pub fn put_str_aligned(&self, y: Option<i32>, align: Align, text: &str) -> Result<u32, EngineError> {
        let y = y.unwrap_or(-1);
        self.write(|e, h| e.plane_putstr_aligned(h, y, align, text))
    }

    /// Write at the cursor keeping each cell's colours and styles.
    pub fn put_str_stained(&self, text: &str) -> Result<u32, EngineError> {
        self.write(|e, h| e.plane_putstr_stained(h, text))
    }

    /// Fill a region, interpolating channels between the corners
    /// `[upper-left, upper-right, lower-left, lower-right]`.
    #[allow(clippy::too_many_arguments)]
    pub fn gradient(
        &self,
        y: i32,
        x: i32,
        ylen: u32,
        xlen: u32,
        egc: &str,
        styles: Style,
        corners: [Channels; 4],
    ) -> Result<u32, EngineError> {
        self.write(|e, h| e.plane_gradient(h, y, x, ylen, xlen, egc, styles, corners))
    }

    /// Gradient at double vertical resolution using half blocks.
    pub fn high_gradient(
        &self,
        y: i32,
        x: i32,
        ylen: u32,
        xlen: u32,
        corners: [Channel; 4],
    ) -> Result<u32, EngineError> {
        self.write(|e, h| e.plane_gradient2x1(h, y, x, ylen, xlen, corners))
    }

    pub fn greyscale(&self) {
        self.write(|e, h| e.plane_greyscale(h));
    }

    // -----------------------------------------------------------------------
    // Colours, styles and the base cell
    // -----------------------------------------------------------------------

    pub fn channels(&self) -> Channels {
        self.read(|e, h| e.plane_channels(h))
    }

    pub fn set_channels(&self, channels: Channels) {
        self.write(|e, h| e.plane_set_channels(h, channels));
    }

    /// Swap foreground and background colours.
    pub fn reverse_channels(&self) {
        self.write(|e, h| {
            let reversed = e.plane_channels(h).reverse();
            e.plane_set_channels(h, reversed);
        });
    }

    pub fn fg_rgb(&self) -> Color {
        self.channels().fg_rgb()
    }

    pub fn bg_rgb(&self) -> Color {
        self.channels().bg_rgb()
    }

    pub fn set_fg_rgb(&self, color: Color) {
        self.write(|e, h| e.plane_set_fg_rgb(h, color));
    }

    pub fn set_bg_rgb(&self, color: Color) {
        self.write(|e, h| e.plane_set_bg_rgb(h, color));
    }

    pub fn set_fg_alpha(&self, alpha: Alpha) -> Result<(), EngineError> {
        self.write(|e, h| e.plane_set_fg_alpha(h, alpha))
    }

    /// High contrast is rejected for the background.
    pub fn set_bg_alpha(&self, alpha: Alpha) -> Result<(), EngineError> {
        self.write(|e, h| e.plane_set_bg_alpha(h, alpha))
    }

    pub fn styles(&self) -> Style {
        self.read(|e, h| e.plane_styles(h))
    }

    pub fn set_styles(&self, styles: Style) {
        self.write(|e, h| e.plane_set_styles(h, styles));
    }

    /// Set the base cell from a cluster; an empty `egc` leaves glyphs below
    /// visible.
    pub fn set_base(&self, egc: &str, styles: Style, channels: Channels) -> Result<(), EngineError> {
        self.write(|e, h| e.plane_set_base(h, egc, styles, channels))
    }

    pub fn set_base_cell(&self, cell: &NcCell) -> Result<(), EngineError> {
        self.write(|e, h| e.plane_set_base_cell(h, cell))
    }

    pub fn base(&self) -> CellView {
        self.read(|e, h| e.plane_base(h))
    }

    /// A cell of this plane, `None` outside it.
    pub fn at(&self, y: u32, x: u32) -> Option<CellView> {
        self.read(|e, h| e.plane_at_yx(h, y, x))
    }
}

impl PartialEq for Plane {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Plane {}

impl fmt::Debug for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plane")
            .field("slot", &self.0.slot.get())
            .field("owner", &self.0.owner.get())
            .finish()
    }
}
