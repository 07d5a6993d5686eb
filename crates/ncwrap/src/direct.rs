#![forbid(unsafe_code)]

//! Direct-mode wrapper.
//!
//! [`Direct`] writes styled text at the terminal cursor without planes or
//! rendering. Like [`Session`](crate::Session) it is stopped exactly once:
//! explicitly with [`Direct::stop`] or on drop. After that every call
//! reports [`DirectError::Stopped`].

use ncwrap_core::{Channels, Color, Style};
use ncwrap_engine::DirectEngine;

use crate::error::DirectError;
use crate::plane::Ink;

/// A running direct-mode context.
pub struct Direct {
    engine: Box<dyn DirectEngine>,
    stopped: bool,
}

impl Direct {
    /// Start `engine` and take ownership of it.
    pub fn init(engine: impl DirectEngine + 'static) -> Result<Self, DirectError> {
        let mut engine: Box<dyn DirectEngine> = Box::new(engine);
        engine.init()?;
        let (rows, cols) = engine.dim_yx();
        tracing::info!(rows, cols, "direct mode started");
        Ok(Self {
            engine,
            stopped: false,
        })
    }

    /// Direct mode on the real terminal.
    #[cfg(all(feature = "terminal", not(target_arch = "wasm32")))]
    pub fn terminal() -> Result<Self, DirectError> {
        use ncwrap_engine::{SoftDirect, TerminalSink};
        Self::init(SoftDirect::new(TerminalSink::new()))
    }

    fn engine(&mut self) -> Result<&mut dyn DirectEngine, DirectError> {
        if self.stopped {
            return Err(DirectError::Stopped);
        }
        Ok(self.engine.as_mut())
    }

    /// Restore the terminal. Irreversible.
    pub fn stop(&mut self) -> Result<(), DirectError> {
        self.engine()?;
        self.stopped = true;
        self.engine.stop()?;
        tracing::info!("direct mode stopped");
        Ok(())
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    // -----------------------------------------------------------------------
    // Geometry
    // -----------------------------------------------------------------------

    pub fn dim_yx(&self) -> (u32, u32) {
        self.engine.dim_yx()
    }

    pub fn rows(&self) -> u32 {
        self.dim_yx().0
    }

    pub fn columns(&self) -> u32 {
        self.dim_yx().1
    }

    // -----------------------------------------------------------------------
    // Colours and styles
    // -----------------------------------------------------------------------

    pub fn set_fg_rgb8(&mut self, r: u8, g: u8, b: u8) -> Result<(), DirectError> {
        self.set_fg_rgb(Color::rgb(r, g, b))
    }

    pub fn set_bg_rgb8(&mut self, r: u8, g: u8, b: u8) -> Result<(), DirectError> {
        self.set_bg_rgb(Color::rgb(r, g, b))
    }

    pub fn set_fg_rgb(&mut self, color: Color) -> Result<(), DirectError> {
        Ok(self.engine()?.set_fg_rgb(color)?)
    }

    pub fn set_bg_rgb(&mut self, color: Color) -> Result<(), DirectError> {
        Ok(self.engine()?.set_bg_rgb(color)?)
    }

    /// Set the foreground from a packed `0xRRGGBB` value; higher bits are
    /// ignored.
    pub fn set_fg_packed(&mut self, rgb: u32) -> Result<(), DirectError> {
        self.set_fg_rgb(Color::from_u32(rgb))
    }

    pub fn set_bg_packed(&mut self, rgb: u32) -> Result<(), DirectError> {
        self.set_bg_rgb(Color::from_u32(rgb))
    }

    pub fn set_fg_default(&mut self) -> Result<(), DirectError> {
        Ok(self.engine()?.set_fg_default()?)
    }

    pub fn set_bg_default(&mut self) -> Result<(), DirectError> {
        Ok(self.engine()?.set_bg_default()?)
    }

    pub fn channels(&self) -> Channels {
        self.engine.channels()
    }

    pub fn set_channels(&mut self, channels: Channels) -> Result<(), DirectError> {
        Ok(self.engine()?.set_channels(channels)?)
    }

    pub fn styles(&self) -> Style {
        self.engine.styles()
    }

    pub fn set_styles(&mut self, styles: Style) -> Result<(), DirectError> {
        Ok(self.engine()?.set_styles(styles)?)
    }

    // -----------------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------------

    /// Write at the cursor in the current colours and styles.
    pub fn put_str(&mut self, text: &str) -> Result<u32, DirectError> {
        self.put_str_channels(Channels::DEFAULT, text)
    }

    /// Write with `channels` overriding the current colours for this write.
    pub fn put_str_channels(&mut self, channels: Channels, text: &str) -> Result<u32, DirectError> {
        Ok(self.engine()?.putstr(channels, text)?)
    }

    /// Optionally move the cursor, then write with temporary colours and
    /// styles. The context's own colours and styles are restored
    /// afterwards, whatever the outcome.
    pub fn put_str_styled(
        &mut self,
        y: Option<u32>,
        x: Option<u32>,
        ink: Ink,
        text: &str,
    ) -> Result<u32, DirectError> {
        if y.is_some() || x.is_some() {
            self.cursor_move_yx(y, x)?;
        }
        let engine = self.engine()?;
        let channels = engine.channels();
        let styles = engine.styles();

        let written = apply_ink(engine, ink).and_then(|()| engine.putstr(Channels::DEFAULT, text));

        let restored = restore(engine, channels, styles);
        let written = written?;
        restored?;
        Ok(written)
    }

    pub fn flush(&mut self) -> Result<(), DirectError> {
        Ok(self.engine()?.flush()?)
    }

    // -----------------------------------------------------------------------
    // Cursor
    // -----------------------------------------------------------------------

    /// Move the cursor; `None` keeps that coordinate.
    pub fn cursor_move_yx(&mut self, y: Option<u32>, x: Option<u32>) -> Result<(), DirectError> {
        let coord = |v: Option<u32>| v.map_or(-1, |v| i32::try_from(v).unwrap_or(i32::MAX));
        Ok(self.engine()?.cursor_move_yx(coord(y), coord(x))?)
    }

    pub fn cursor_up(&mut self, n: u32) -> Result<(), DirectError> {
        Ok(self.engine()?.cursor_up(n)?)
    }

    pub fn cursor_down(&mut self, n: u32) -> Result<(), DirectError> {
        Ok(self.engine()?.cursor_down(n)?)
    }

    pub fn cursor_left(&mut self, n: u32) -> Result<(), DirectError> {
        Ok(self.engine()?.cursor_left(n)?)
    }

    pub fn cursor_right(&mut self, n: u32) -> Result<(), DirectError> {
        Ok(self.engine()?.cursor_right(n)?)
    }

    pub fn cursor_yx(&mut self) -> Result<(u32, u32), DirectError> {
        Ok(self.engine()?.cursor_yx()?)
    }

    pub fn cursor_enable(&mut self) -> Result<(), DirectError> {
        Ok(self.engine()?.cursor_enable()?)
    }

    pub fn cursor_disable(&mut self) -> Result<(), DirectError> {
        Ok(self.engine()?.cursor_disable()?)
    }
}

fn apply_ink(engine: &mut dyn DirectEngine, ink: Ink) -> ncwrap_engine::Result<()> {
    if let Some(fg) = ink.fg {
        engine.set_fg_rgb(fg)?;
    }
    if let Some(bg) = ink.bg {
        engine.set_bg_rgb(bg)?;
    }
    engine.set_styles(ink.styles)
}

fn restore(
    engine: &mut dyn DirectEngine,
    channels: Channels,
    styles: Style,
) -> ncwrap_engine::Result<()> {
    engine.set_channels(channels)?;
    engine.set_styles(styles)
}

impl Drop for Direct {
    fn drop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if let Err(err) = self.engine.stop() {
            tracing::warn!(error = %err, "direct mode stop failed during drop");
        }
    }
}
