#![forbid(unsafe_code)]

//! Direct mode.
//!
//! Direct mode writes styled text straight to the terminal at its cursor.
//! There is no pile, no planes and no render step: every write is visible
//! as soon as the device is flushed. [`DirectEngine`] lists the entry
//! points; [`SoftDirect`] implements them over a [`DirectSink`], the device
//! side, the same way [`SoftEngine`](crate::SoftEngine) sits on a
//! [`Backend`](crate::Backend).
//!
//! Output wraps at the right edge: a line that fills the last column wraps
//! when the next cluster arrives. Wrapping or a newline on the last row
//! scrolls the screen up by one row.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use ncwrap_core::{Channels, Color, Style, grapheme_width};
use unicode_segmentation::UnicodeSegmentation;

use crate::Result;
use crate::error::EngineError;
use crate::frame::{CellView, Frame};

/// Direct-mode entry points.
///
/// Coordinates are `(y, x)` from the terminal origin. In
/// [`DirectEngine::cursor_move_yx`], `-1` keeps the current coordinate.
pub trait DirectEngine {
    fn init(&mut self) -> Result<()>;
    /// Restore the terminal. Irreversible.
    fn stop(&mut self) -> Result<()>;
    fn dim_yx(&self) -> (u32, u32);

    /// The current colours.
    fn channels(&self) -> Channels;
    fn set_channels(&mut self, channels: Channels) -> Result<()>;
    fn set_fg_rgb(&mut self, color: Color) -> Result<()>;
    fn set_bg_rgb(&mut self, color: Color) -> Result<()>;
    fn set_fg_default(&mut self) -> Result<()>;
    fn set_bg_default(&mut self) -> Result<()>;
    fn styles(&self) -> Style;
    fn set_styles(&mut self, styles: Style) -> Result<()>;

    /// Write `text` at the cursor. Each non-default half of `channels`
    /// overrides the current colour for this write only. Returns the
    /// columns written.
    fn putstr(&mut self, channels: Channels, text: &str) -> Result<u32>;

    fn cursor_move_yx(&mut self, y: i32, x: i32) -> Result<()>;
    /// Moves clamp at the screen edge.
    fn cursor_up(&mut self, n: u32) -> Result<()>;
    fn cursor_down(&mut self, n: u32) -> Result<()>;
    fn cursor_left(&mut self, n: u32) -> Result<()>;
    fn cursor_right(&mut self, n: u32) -> Result<()>;
    fn cursor_yx(&mut self) -> Result<(u32, u32)>;
    fn cursor_enable(&mut self) -> Result<()>;
    fn cursor_disable(&mut self) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
}

/// The device side of a [`SoftDirect`].
pub trait DirectSink {
    /// Current terminal size as `(rows, cols)`.
    fn size(&self) -> io::Result<(u32, u32)>;
    fn start(&mut self) -> io::Result<()>;
    /// Where the device's cursor is, if it can tell.
    fn cursor_position(&mut self) -> io::Result<Option<(u32, u32)>>;
    /// Draw one cluster at `(y, x)`.
    fn put(&mut self, y: u32, x: u32, egc: &str, width: u8, channels: Channels, styles: Style)
    -> io::Result<()>;
    /// Scroll the whole screen up one row.
    fn scroll(&mut self) -> io::Result<()>;
    fn move_to(&mut self, y: u32, x: u32) -> io::Result<()>;
    fn show_cursor(&mut self, visible: bool) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
    /// Restore the device. Called once, from [`DirectEngine::stop`].
    fn shutdown(&mut self) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uninit,
    Running,
    Stopped,
}

/// Direct mode over a sink `S`.
pub struct SoftDirect<S: DirectSink> {
    sink: S,
    lifecycle: Lifecycle,
    dims: (u32, u32),
    channels: Channels,
    styles: Style,
    cursor: (u32, u32),
}

impl<S: DirectSink> SoftDirect<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            lifecycle: Lifecycle::Uninit,
            dims: (0, 0),
            channels: Channels::DEFAULT,
            styles: Style::NONE,
            cursor: (0, 0),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn ensure_running(&self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Running => Ok(()),
            Lifecycle::Uninit => Err(EngineError::NotInitialized),
            Lifecycle::Stopped => Err(EngineError::Stopped),
        }
    }

    fn newline(&mut self) -> io::Result<()> {
        let rows = self.dim_yx().0;
        self.cursor.1 = 0;
        if self.cursor.0 + 1 < rows {
            self.cursor.0 += 1;
        } else {
            self.sink.scroll()?;
        }
        Ok(())
    }

    fn place(&mut self, y: u32, x: u32) -> Result<()> {
        self.ensure_running()?;
        self.sink.move_to(y, x)?;
        self.cursor = (y, x);
        Ok(())
    }
}

impl<S: DirectSink> DirectEngine for SoftDirect<S> {
    fn init(&mut self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Running => return Err(EngineError::invalid("direct mode already started")),
            Lifecycle::Stopped => return Err(EngineError::Stopped),
            Lifecycle::Uninit => {}
        }
        self.sink.start()?;
        self.dims = self.sink.size()?;
        let (rows, cols) = self.dims;
        self.cursor = match self.sink.cursor_position()? {
            Some((y, x)) => (y.min(rows.saturating_sub(1)), x.min(cols.saturating_sub(1))),
            None => (0, 0),
        };
        self.lifecycle = Lifecycle::Running;
        tracing::debug!(rows, cols, cursor = ?self.cursor, "direct mode started");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Stopped => Err(EngineError::Stopped),
            Lifecycle::Uninit => {
                self.lifecycle = Lifecycle::Stopped;
                Ok(())
            }
            Lifecycle::Running => {
                self.lifecycle = Lifecycle::Stopped;
                self.sink.shutdown()?;
                tracing::debug!("direct mode stopped");
                Ok(())
            }
        }
    }

    /// Asks the device each time, falling back to the size seen at start.
    fn dim_yx(&self) -> (u32, u32) {
        match self.sink.size() {
            Ok((rows, cols)) if rows > 0 && cols > 0 => (rows, cols),
            _ => self.dims,
        }
    }

    fn channels(&self) -> Channels {
        self.channels
    }

    fn set_channels(&mut self, channels: Channels) -> Result<()> {
        self.ensure_running()?;
        self.channels = channels;
        Ok(())
    }

    fn set_fg_rgb(&mut self, color: Color) -> Result<()> {
        self.ensure_running()?;
        self.channels.set_fg_rgb(color);
        Ok(())
    }

    fn set_bg_rgb(&mut self, color: Color) -> Result<()> {
        self.ensure_running()?;
        self.channels.set_bg_rgb(color);
        Ok(())
    }

    fn set_fg_default(&mut self) -> Result<()> {
        self.ensure_running()?;
        self.channels.set_fg_default();
        Ok(())
    }

    fn set_bg_default(&mut self) -> Result<()> {
        self.ensure_running()?;
        self.channels.set_bg_default();
        Ok(())
    }

    fn styles(&self) -> Style {
        self.styles
    }

    fn set_styles(&mut self, styles: Style) -> Result<()> {
        self.ensure_running()?;
        self.styles = styles;
        Ok(())
    }

    fn putstr(&mut self, channels: Channels, text: &str) -> Result<u32> {
        self.ensure_running()?;
        let mut ink = self.channels;
        if !channels.fg_default() {
            ink.set_fg_channel(channels.fg_channel());
        }
        if !channels.bg_default() {
            ink.set_bg_channel(channels.bg_channel());
        }
        let cols = self.dim_yx().1;
        let mut written = 0;
        for g in text.graphemes(true) {
            if g == "\n" || g == "\r\n" {
                self.newline()?;
                continue;
            }
            let width = grapheme_width(g).max(1) as u32;
            if width > cols {
                break;
            }
            if self.cursor.1 + width > cols {
                self.newline()?;
            }
            let (y, x) = self.cursor;
            self.sink.put(y, x, g, width as u8, ink, self.styles)?;
            self.cursor.1 += width;
            written += width;
        }
        Ok(written)
    }

    fn cursor_move_yx(&mut self, y: i32, x: i32) -> Result<()> {
        self.ensure_running()?;
        let (rows, cols) = self.dim_yx();
        let ny = if y < 0 { self.cursor.0 } else { y as u32 };
        let nx = if x < 0 { self.cursor.1 } else { x as u32 };
        if ny >= rows || nx >= cols {
            return Err(EngineError::invalid(format!(
                "cursor ({y}, {x}) is outside the {rows}x{cols} terminal"
            )));
        }
        self.place(ny, nx)
    }

    fn cursor_up(&mut self, n: u32) -> Result<()> {
        let (y, x) = self.cursor;
        self.place(y.saturating_sub(n), x)
    }

    fn cursor_down(&mut self, n: u32) -> Result<()> {
        let (y, x) = self.cursor;
        let last = self.dim_yx().0.saturating_sub(1);
        self.place(y.saturating_add(n).min(last), x)
    }

    fn cursor_left(&mut self, n: u32) -> Result<()> {
        let (y, x) = self.cursor;
        self.place(y, x.saturating_sub(n))
    }

    fn cursor_right(&mut self, n: u32) -> Result<()> {
        let (y, x) = self.cursor;
        let last = self.dim_yx().1.saturating_sub(1);
        self.place(y, x.saturating_add(n).min(last))
    }

    /// The device's answer when it has one; otherwise the tracked position.
    fn cursor_yx(&mut self) -> Result<(u32, u32)> {
        self.ensure_running()?;
        if let Some(pos) = self.sink.cursor_position()? {
            self.cursor = pos;
        }
        let (y, x) = self.cursor;
        Ok((y, x.min(self.dim_yx().1.saturating_sub(1))))
    }

    fn cursor_enable(&mut self) -> Result<()> {
        self.ensure_running()?;
        self.sink.show_cursor(true)?;
        Ok(())
    }

    fn cursor_disable(&mut self) -> Result<()> {
        self.ensure_running()?;
        self.sink.show_cursor(false)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.ensure_running()?;
        self.sink.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Headless sink
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct DirectScreen {
    screen: Frame,
    started: bool,
    cursor_visible: bool,
    flushes: u32,
    scrolls: u32,
}

/// A direct-mode sink drawing into memory.
#[derive(Debug, Clone)]
pub struct HeadlessSink {
    screen: Rc<RefCell<DirectScreen>>,
}

impl HeadlessSink {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            screen: Rc::new(RefCell::new(DirectScreen {
                screen: Frame::new(rows, cols),
                started: false,
                cursor_visible: true,
                flushes: 0,
                scrolls: 0,
            })),
        }
    }
}

impl DirectSink for HeadlessSink {
    fn size(&self) -> io::Result<(u32, u32)> {
        let s = self.screen.borrow();
        Ok((s.screen.rows(), s.screen.cols()))
    }

    fn start(&mut self) -> io::Result<()> {
        self.screen.borrow_mut().started = true;
        Ok(())
    }

    /// Memory has no cursor of its own; the tracked one is authoritative.
    fn cursor_position(&mut self) -> io::Result<Option<(u32, u32)>> {
        Ok(None)
    }

    fn put(
        &mut self,
        y: u32,
        x: u32,
        egc: &str,
        width: u8,
        channels: Channels,
        styles: Style,
    ) -> io::Result<()> {
        let mut s = self.screen.borrow_mut();
        s.screen.set(
            y,
            x,
            CellView {
                egc: egc.to_string(),
                width,
                styles,
                channels,
            },
        );
        if width == 2 {
            s.screen.set(
                y,
                x + 1,
                CellView {
                    width: 2,
                    channels,
                    ..CellView::blank()
                },
            );
        }
        Ok(())
    }

    fn scroll(&mut self) -> io::Result<()> {
        let mut s = self.screen.borrow_mut();
        s.screen.scroll_up(1);
        s.scrolls += 1;
        Ok(())
    }

    fn move_to(&mut self, _y: u32, _x: u32) -> io::Result<()> {
        Ok(())
    }

    fn show_cursor(&mut self, visible: bool) -> io::Result<()> {
        self.screen.borrow_mut().cursor_visible = visible;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.screen.borrow_mut().flushes += 1;
        Ok(())
    }

    fn shutdown(&mut self) -> io::Result<()> {
        let mut s = self.screen.borrow_mut();
        s.started = false;
        s.cursor_visible = true;
        Ok(())
    }
}

impl SoftDirect<HeadlessSink> {
    /// Direct mode over a `rows` x `cols` in-memory terminal.
    pub fn headless(rows: u32, cols: u32) -> Self {
        Self::new(HeadlessSink::new(rows, cols))
    }

    pub fn monitor(&self) -> DirectMonitor {
        DirectMonitor {
            screen: Rc::clone(&self.sink.screen),
        }
    }
}

/// Read access to a headless direct-mode screen.
#[derive(Clone)]
pub struct DirectMonitor {
    screen: Rc<RefCell<DirectScreen>>,
}

impl DirectMonitor {
    /// Everything written so far.
    pub fn screen(&self) -> Frame {
        self.screen.borrow().screen.clone()
    }

    pub fn is_started(&self) -> bool {
        self.screen.borrow().started
    }

    pub fn cursor_visible(&self) -> bool {
        self.screen.borrow().cursor_visible
    }

    pub fn flushes(&self) -> u32 {
        self.screen.borrow().flushes
    }

    pub fn scrolls(&self) -> u32 {
        self.screen.borrow().scrolls
    }
}
