#![forbid(unsafe_code)]

//! The rendering-engine contract and an in-process implementation of it.
//!
//! [`Engine`] lists every entry point the safe wrapper calls. Resources are
//! named by opaque handles ([`PlaneHandle`], [`SelectorHandle`],
//! [`VisualHandle`]); the engine owns them, and a freed handle value may be
//! issued again later. Calling an entry point with a handle that names
//! nothing is undefined on a native engine; the soft engine panics.
//!
//! [`SoftEngine`] implements the contract in process. Its back end is
//! pluggable: [`HeadlessBackend`] renders to memory for tests, and
//! `TerminalBackend` (feature `terminal`) drives a real terminal.
//!
//! Direct mode ([`DirectEngine`], [`SoftDirect`]) skips the pile entirely
//! and writes styled text at the terminal cursor.

pub mod direct;
pub mod error;
pub mod frame;
pub mod handle;
pub mod headless;
pub mod options;
pub mod soft;
#[cfg(all(feature = "terminal", not(target_arch = "wasm32")))]
pub mod terminal;

use std::path::Path;
use std::time::Duration;

use ncwrap_core::{Align, Alpha, Cell, Channel, Channels, Color, InputEvent, Style};

pub use direct::{DirectEngine, DirectMonitor, DirectSink, HeadlessSink, SoftDirect};
pub use error::EngineError;
pub use frame::{CellView, ChangeRun, Frame};
pub use handle::{PlaneHandle, SelectorHandle, VisualHandle};
pub use headless::{EngineMonitor, HeadlessBackend};
pub use options::{
    BlitFlags, BlitOptions, Blitter, InitFlags, InitOptions, LogLevel, Margins, PlaneFlags,
    PlaneOptions, Scale, SelectorItem, SelectorOptions,
};
pub use soft::{Backend, EngineStats, SoftEngine};
#[cfg(all(feature = "terminal", not(target_arch = "wasm32")))]
pub use terminal::{TerminalBackend, TerminalSink};

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// Outcome of waiting for input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputReadiness {
    /// An event can be read without blocking.
    Ready,
    /// The wait timed out.
    Idle,
    /// The input source is closed; nothing more will arrive.
    Closed,
}

/// Edge bits for [`Engine::plane_rounded_box`]: set a bit to omit that edge.
pub mod boxmask {
    pub const TOP: u32 = 0x1;
    pub const RIGHT: u32 = 0x2;
    pub const BOTTOM: u32 = 0x4;
    pub const LEFT: u32 = 0x8;
}

/// The rendering engine's entry points.
///
/// Coordinates are `(y, x)`. Where a coordinate is an `i32`, `-1` means
/// "the plane's cursor position" unless stated otherwise.
pub trait Engine {
    // --- lifecycle ---------------------------------------------------------

    /// Take over the output device. Must precede every other call.
    fn init(&mut self, options: &InitOptions) -> Result<()>;
    /// Release every resource and restore the output device. Irreversible.
    fn stop(&mut self) -> Result<()>;
    /// The standard plane: full-screen, never destroyed by the caller.
    fn std_plane(&self) -> Result<PlaneHandle>;
    fn term_dim_yx(&self) -> (u32, u32);
    /// Composite the pile and present it.
    fn render(&mut self) -> Result<()>;
    /// Repaint the whole screen; returns the terminal size.
    fn refresh(&mut self) -> Result<(u32, u32)>;
    /// A cell of the last rendered frame.
    fn at_yx(&self, y: u32, x: u32) -> Option<CellView>;
    fn cursor_enable(&mut self, y: u32, x: u32) -> Result<()>;
    fn cursor_disable(&mut self) -> Result<()>;
    fn cursor_yx(&self) -> Option<(u32, u32)>;
    fn mice_enable(&mut self, enabled: bool) -> Result<()>;
    fn can_open_images(&self) -> bool;
    /// Columns `text` occupies.
    fn str_width(&self, text: &str) -> usize;

    // --- input -------------------------------------------------------------

    /// Wait for the next event; `None` once input is closed.
    fn get_blocking(&mut self) -> Result<Option<InputEvent>>;
    /// The next event if one is queued.
    fn get_nonblocking(&mut self) -> Result<Option<InputEvent>>;
    /// Wait up to `timeout` (forever if `None`) for input.
    fn input_ready(&mut self, timeout: Option<Duration>) -> Result<InputReadiness>;

    // --- planes ------------------------------------------------------------

    fn plane_create(&mut self, parent: PlaneHandle, options: &PlaneOptions) -> Result<PlaneHandle>;
    /// Destroy a plane; its children are reparented to its parent.
    fn plane_destroy(&mut self, plane: PlaneHandle) -> Result<()>;
    fn plane_parent(&self, plane: PlaneHandle) -> Option<PlaneHandle>;
    fn plane_name(&self, plane: PlaneHandle) -> Option<String>;
    /// Position relative to the parent.
    fn plane_yx(&self, plane: PlaneHandle) -> (i32, i32);
    /// Position relative to the terminal origin.
    fn plane_abs_yx(&self, plane: PlaneHandle) -> (i32, i32);
    fn plane_dim_yx(&self, plane: PlaneHandle) -> (u32, u32);
    fn plane_cursor_yx(&self, plane: PlaneHandle) -> (u32, u32);
    fn plane_cursor_move_yx(&mut self, plane: PlaneHandle, y: i32, x: i32) -> Result<()>;
    fn plane_move_yx(&mut self, plane: PlaneHandle, y: i32, x: i32) -> Result<()>;
    fn plane_move_top(&mut self, plane: PlaneHandle);
    fn plane_move_bottom(&mut self, plane: PlaneHandle);
    fn plane_resize_simple(&mut self, plane: PlaneHandle, rows: u32, cols: u32) -> Result<()>;
    /// Refit a marginalized plane to its parent.
    fn plane_resize_marginalized(&mut self, plane: PlaneHandle) -> Result<()>;

    fn plane_channels(&self, plane: PlaneHandle) -> Channels;
    fn plane_set_channels(&mut self, plane: PlaneHandle, channels: Channels);
    fn plane_styles(&self, plane: PlaneHandle) -> Style;
    fn plane_set_styles(&mut self, plane: PlaneHandle, styles: Style);
    fn plane_set_fg_rgb(&mut self, plane: PlaneHandle, color: Color);
    fn plane_set_bg_rgb(&mut self, plane: PlaneHandle, color: Color);
    fn plane_set_fg_alpha(&mut self, plane: PlaneHandle, alpha: Alpha) -> Result<()>;
    fn plane_set_bg_alpha(&mut self, plane: PlaneHandle, alpha: Alpha) -> Result<()>;

    fn plane_set_base(
        &mut self,
        plane: PlaneHandle,
        egc: &str,
        styles: Style,
        channels: Channels,
    ) -> Result<()>;
    /// Rejects cells whose cluster lives in another plane's pool.
    fn plane_set_base_cell(&mut self, plane: PlaneHandle, cell: &Cell) -> Result<()>;
    fn plane_base(&self, plane: PlaneHandle) -> CellView;
    fn plane_at_yx(&self, plane: PlaneHandle, y: u32, x: u32) -> Option<CellView>;

    fn plane_erase(&mut self, plane: PlaneHandle);
    /// Erase a region; a length of 0 spans the dimension, negative extends
    /// up/left.
    fn plane_erase_region(
        &mut self,
        plane: PlaneHandle,
        y: i32,
        x: i32,
        ylen: i32,
        xlen: i32,
    ) -> Result<()>;

    /// Returns the columns written.
    fn plane_putstr_yx(&mut self, plane: PlaneHandle, y: i32, x: i32, text: &str) -> Result<u32>;
    fn plane_putstr_aligned(
        &mut self,
        plane: PlaneHandle,
        y: i32,
        align: Align,
        text: &str,
    ) -> Result<u32>;
    /// Write at the cursor keeping each cell's existing colours and styles.
    fn plane_putstr_stained(&mut self, plane: PlaneHandle, text: &str) -> Result<u32>;

    /// Rounded box from the cursor to `(ystop, xstop)` inclusive; see
    /// [`boxmask`] for `ctlword`.
    fn plane_rounded_box(
        &mut self,
        plane: PlaneHandle,
        styles: Style,
        channels: Channels,
        ystop: u32,
        xstop: u32,
        ctlword: u32,
    ) -> Result<()>;
    /// Fill with `egc`, interpolating channels between the corners
    /// (upper-left, upper-right, lower-left, lower-right). Returns cells
    /// filled.
    #[allow(clippy::too_many_arguments)]
    fn plane_gradient(
        &mut self,
        plane: PlaneHandle,
        y: i32,
        x: i32,
        ylen: u32,
        xlen: u32,
        egc: &str,
        styles: Style,
        corners: [Channels; 4],
    ) -> Result<u32>;
    /// Gradient at twice the vertical resolution using half blocks.
    fn plane_gradient2x1(
        &mut self,
        plane: PlaneHandle,
        y: i32,
        x: i32,
        ylen: u32,
        xlen: u32,
        corners: [Channel; 4],
    ) -> Result<u32>;

    fn plane_scrolling(&self, plane: PlaneHandle) -> bool;
    /// Returns the previous setting.
    fn plane_set_scrolling(&mut self, plane: PlaneHandle, scrolling: bool) -> bool;
    fn plane_scrollup(&mut self, plane: PlaneHandle, rows: u32) -> Result<()>;
    fn plane_greyscale(&mut self, plane: PlaneHandle);

    // --- selector ----------------------------------------------------------

    /// Build a selector on `plane`. On failure the plane has been destroyed.
    fn selector_create(
        &mut self,
        plane: PlaneHandle,
        options: &SelectorOptions,
    ) -> Result<SelectorHandle>;
    /// Destroy the widget and its plane; returns the final selection.
    fn selector_destroy(&mut self, selector: SelectorHandle) -> Option<String>;
    fn selector_plane(&self, selector: SelectorHandle) -> PlaneHandle;
    fn selector_additem(&mut self, selector: SelectorHandle, item: &SelectorItem) -> Result<()>;
    fn selector_delitem(&mut self, selector: SelectorHandle, option: &str) -> Result<()>;
    fn selector_previtem(&mut self, selector: SelectorHandle) -> Option<String>;
    fn selector_nextitem(&mut self, selector: SelectorHandle) -> Option<String>;
    fn selector_selected(&self, selector: SelectorHandle) -> Option<String>;
    fn selector_items(&self, selector: SelectorHandle) -> Vec<SelectorItem>;
    /// Returns whether the widget consumed the event.
    fn selector_offer_input(&mut self, selector: SelectorHandle, event: &InputEvent) -> bool;

    // --- visuals -----------------------------------------------------------

    fn visual_from_file(&mut self, path: &Path) -> Result<VisualHandle>;
    fn visual_from_rgba(&mut self, rows: u32, cols: u32, rgba: &[u8]) -> Result<VisualHandle>;
    /// Pixel size.
    fn visual_dim_yx(&self, visual: VisualHandle) -> (u32, u32);
    /// Returns the plane drawn on: the target, or a plane the engine created.
    fn visual_blit(&mut self, visual: VisualHandle, options: &BlitOptions) -> Result<PlaneHandle>;
    fn visual_destroy(&mut self, visual: VisualHandle);
}
