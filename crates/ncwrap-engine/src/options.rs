#![forbid(unsafe_code)]

//! Native option records.
//!
//! These mirror the engine's option structs: plain public fields with
//! `Default`, plus a few builder helpers. Bit sets use `bitflags` with the
//! engine's raw values.

use bitflags::bitflags;
use ncwrap_core::{Align, Channels};

use crate::handle::PlaneHandle;

// ---------------------------------------------------------------------------
// Engine initialization
// ---------------------------------------------------------------------------

/// Engine diagnostic verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub enum LogLevel {
    Silent,
    Panic,
    Fatal,
    #[default]
    Error,
    Warning,
    Info,
    Verbose,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parse a level name or its numeric value (`-1` is silent).
    pub fn parse(value: &str) -> Option<Self> {
        let level = match value.trim().to_ascii_lowercase().as_str() {
            "silent" | "-1" => Self::Silent,
            "panic" | "0" => Self::Panic,
            "fatal" | "1" => Self::Fatal,
            "error" | "2" => Self::Error,
            "warning" | "warn" | "3" => Self::Warning,
            "info" | "4" => Self::Info,
            "verbose" | "5" => Self::Verbose,
            "debug" | "6" => Self::Debug,
            "trace" | "7" => Self::Trace,
            _ => return None,
        };
        Some(level)
    }

    /// The matching `tracing` level, or `None` when silent.
    pub fn tracing_level(self) -> Option<tracing::Level> {
        match self {
            Self::Silent => None,
            Self::Panic | Self::Fatal | Self::Error => Some(tracing::Level::ERROR),
            Self::Warning => Some(tracing::Level::WARN),
            Self::Info => Some(tracing::Level::INFO),
            Self::Verbose | Self::Debug => Some(tracing::Level::DEBUG),
            Self::Trace => Some(tracing::Level::TRACE),
        }
    }
}

bitflags! {
    /// Engine initialization flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InitFlags: u64 {
        const INHIBIT_SETLOCALE    = 0x0001;
        const NO_CLEAR_BITMAPS     = 0x0002;
        /// Do not install a SIGWINCH handler.
        const NO_WINCH_SIGHANDLER  = 0x0004;
        /// Do not install SIGINT/SIGTERM handlers.
        const NO_QUIT_SIGHANDLERS  = 0x0008;
        const PRESERVE_CURSOR      = 0x0010;
        const SUPPRESS_BANNERS     = 0x0020;
        /// Stay on the primary screen.
        const NO_ALTERNATE_SCREEN  = 0x0040;
        const NO_FONT_CHANGES      = 0x0080;
        /// Discard input instead of queueing it.
        const DRAIN_INPUT          = 0x0100;
    }
}

/// Cells reserved around the standard plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Margins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Margins {
    pub const fn uniform(n: u32) -> Self {
        Self {
            top: n,
            right: n,
            bottom: n,
            left: n,
        }
    }

    /// Parse `"n"` or `"top,right,bottom,left"`.
    pub fn parse(value: &str) -> Option<Self> {
        let parts: Vec<u32> = value
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<_, _>>()
            .ok()?;
        match parts.as_slice() {
            [n] => Some(Self::uniform(*n)),
            [top, right, bottom, left] => Some(Self {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }),
            _ => None,
        }
    }
}

/// Engine initialization options.
///
/// # Environment Variables
///
/// [`InitOptions::from_env`] starts from the defaults and applies:
///
/// | Variable | Effect |
/// |----------|--------|
/// | `NCWRAP_LOGLEVEL` | [`LogLevel::parse`] |
/// | `NCWRAP_NO_ALTSCREEN` | `1`/`true` sets [`InitFlags::NO_ALTERNATE_SCREEN`] |
/// | `NCWRAP_NO_MOUSE` | `1`/`true` disables mouse events |
/// | `NCWRAP_MARGINS` | [`Margins::parse`] |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOptions {
    pub log_level: LogLevel,
    pub flags: InitFlags,
    pub margins: Margins,
    /// Enable mouse events at startup.
    pub mice: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Error,
            flags: InitFlags::empty(),
            margins: Margins::default(),
            mice: true,
        }
    }
}

impl InitOptions {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`InitOptions::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let truthy = |key: &str| {
            lookup(key).is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        };
        let mut options = Self::default();
        if let Some(level) = lookup("NCWRAP_LOGLEVEL").and_then(|v| LogLevel::parse(&v)) {
            options.log_level = level;
        }
        if truthy("NCWRAP_NO_ALTSCREEN") {
            options.flags |= InitFlags::NO_ALTERNATE_SCREEN;
        }
        if truthy("NCWRAP_NO_MOUSE") {
            options.mice = false;
        }
        if let Some(margins) = lookup("NCWRAP_MARGINS").and_then(|v| Margins::parse(&v)) {
            options.margins = margins;
        }
        options
    }

    #[must_use]
    pub fn with_flags(mut self, flags: InitFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    #[must_use]
    pub fn with_mice(mut self, mice: bool) -> Self {
        self.mice = mice;
        self
    }
}

// ---------------------------------------------------------------------------
// Planes
// ---------------------------------------------------------------------------

bitflags! {
    /// Plane creation flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PlaneFlags: u64 {
        /// `x` is an [`Align`] value relative to the parent.
        const HORALIGNED   = 0x0001;
        /// `y` is an [`Align`] value relative to the parent.
        const VERALIGNED   = 0x0002;
        /// Size tracks the parent minus margins; `rows`/`cols` must be zero.
        const MARGINALIZED = 0x0004;
        /// Stay put when a scrolling parent scrolls.
        const FIXED        = 0x0008;
        /// Text output grows the plane instead of stopping at its edge.
        const AUTOGROW     = 0x0010;
        /// Scrolling enabled at creation.
        const VSCROLL      = 0x0020;
    }
}

/// Plane creation options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaneOptions {
    pub y: i32,
    pub x: i32,
    pub rows: u32,
    pub cols: u32,
    pub name: Option<String>,
    pub flags: PlaneFlags,
    pub margin_b: u32,
    pub margin_r: u32,
}

impl PlaneOptions {
    pub fn new(y: i32, x: i32, rows: u32, cols: u32) -> Self {
        Self {
            y,
            x,
            rows,
            cols,
            ..Self::default()
        }
    }

    /// A plane filling its parent minus the given margins.
    pub fn marginalized(top: u32, left: u32, bottom: u32, right: u32) -> Self {
        Self {
            y: top as i32,
            x: left as i32,
            flags: PlaneFlags::MARGINALIZED,
            margin_b: bottom,
            margin_r: right,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: PlaneFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Align horizontally within the parent instead of using `x`.
    #[must_use]
    pub fn aligned_x(mut self, align: Align) -> Self {
        self.x = align as i32;
        self.flags |= PlaneFlags::HORALIGNED;
        self
    }

    /// Align vertically within the parent instead of using `y`.
    #[must_use]
    pub fn aligned_y(mut self, align: Align) -> Self {
        self.y = align as i32;
        self.flags |= PlaneFlags::VERALIGNED;
        self
    }
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// One selector entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorItem {
    /// Identifier reported on selection.
    pub option: String,
    pub desc: Option<String>,
}

impl SelectorItem {
    pub fn new(option: impl Into<String>, desc: Option<&str>) -> Self {
        Self {
            option: option.into(),
            desc: desc.map(str::to_string),
        }
    }
}

/// Selector creation options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectorOptions {
    pub title: Option<String>,
    /// Text on the top border.
    pub secondary: Option<String>,
    /// Text on the bottom border.
    pub footer: Option<String>,
    pub items: Vec<SelectorItem>,
    pub default_index: usize,
    /// Maximum visible items; 0 shows all.
    pub max_display: usize,
    pub op_channels: Channels,
    pub desc_channels: Channels,
    pub title_channels: Channels,
    pub footer_channels: Channels,
    pub box_channels: Channels,
    pub flags: u64,
}

impl SelectorOptions {
    #[must_use]
    pub fn with_items(mut self, items: impl IntoIterator<Item = SelectorItem>) -> Self {
        self.items = items.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }

    #[must_use]
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    #[must_use]
    pub fn with_default_index(mut self, index: usize) -> Self {
        self.default_index = index;
        self
    }

    #[must_use]
    pub fn with_max_display(mut self, max: usize) -> Self {
        self.max_display = max;
        self
    }
}

// ---------------------------------------------------------------------------
// Visuals
// ---------------------------------------------------------------------------

/// How an image is fitted to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(u32)]
pub enum Scale {
    /// One source pixel per blitter pixel.
    #[default]
    None = 0,
    /// Fit within the target, keeping aspect ratio.
    Scale,
    /// Fill the target exactly.
    Stretch,
    NoneHiRes,
    ScaleHiRes,
}

/// Glyph set used to render pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(u32)]
pub enum Blitter {
    /// Engine's choice.
    #[default]
    Default = 0,
    /// One pixel per cell, drawn as background.
    OneByOne,
    /// Two vertical pixels per cell via half blocks.
    TwoByOne,
    TwoByTwo,
    ThreeByTwo,
    Braille,
    Pixel,
    FourByOne,
    EightByOne,
}

impl Blitter {
    /// Pixels per cell as `(rows, cols)`.
    pub const fn geometry(self) -> (u32, u32) {
        match self {
            Self::OneByOne => (1, 1),
            Self::Default | Self::TwoByOne => (2, 1),
            Self::TwoByTwo => (2, 2),
            Self::ThreeByTwo => (3, 2),
            Self::Braille => (4, 2),
            Self::Pixel => (1, 1),
            Self::FourByOne => (4, 1),
            Self::EightByOne => (8, 1),
        }
    }
}

bitflags! {
    /// Blit flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BlitFlags: u64 {
        /// Fail instead of falling back to a simpler blitter.
        const NO_DEGRADE     = 0x0001;
        /// Use blended alpha for drawn cells.
        const BLEND          = 0x0002;
        const HORALIGNED     = 0x0004;
        const VERALIGNED     = 0x0008;
        /// Treat `transcolor` as transparent.
        const ADDALPHA       = 0x0010;
        /// Blit into a new child of the given plane.
        const CHILDPLANE     = 0x0020;
        /// Nearest-neighbour scaling.
        const NOINTERPOLATE  = 0x0040;
    }
}

/// Blit options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlitOptions {
    /// Target plane; `None` creates a new plane on the standard pile.
    pub plane: Option<PlaneHandle>,
    pub scaling: Scale,
    pub y: i32,
    pub x: i32,
    pub begin_y: u32,
    pub begin_x: u32,
    /// Source rows; 0 means to the bottom edge.
    pub len_y: u32,
    /// Source columns; 0 means to the right edge.
    pub len_x: u32,
    pub blitter: Blitter,
    pub flags: BlitFlags,
    /// `0xRRGGBB` treated as transparent with [`BlitFlags::ADDALPHA`].
    pub transcolor: u32,
    pub px_offy: u32,
    pub px_offx: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn init_defaults() {
        let opts = InitOptions::default();
        assert_eq!(opts.log_level, LogLevel::Error);
        assert!(opts.flags.is_empty());
        assert_eq!(opts.margins, Margins::default());
        assert!(opts.mice);
    }

    #[test]
    fn env_overrides() {
        let opts = InitOptions::from_lookup(lookup(&[
            ("NCWRAP_LOGLEVEL", "debug"),
            ("NCWRAP_NO_ALTSCREEN", "true"),
            ("NCWRAP_NO_MOUSE", "1"),
            ("NCWRAP_MARGINS", "1,2,3,4"),
        ]));
        assert_eq!(opts.log_level, LogLevel::Debug);
        assert!(opts.flags.contains(InitFlags::NO_ALTERNATE_SCREEN));
        assert!(!opts.mice);
        assert_eq!(
            opts.margins,
            Margins {
                top: 1,
                right: 2,
                bottom: 3,
                left: 4
            }
        );
    }

    #[test]
    fn env_garbage_is_ignored() {
        let opts = InitOptions::from_lookup(lookup(&[
            ("NCWRAP_LOGLEVEL", "loud"),
            ("NCWRAP_NO_ALTSCREEN", "yes"),
            ("NCWRAP_MARGINS", "1,2"),
        ]));
        assert_eq!(opts, InitOptions::default());
    }

    #[test]
    fn log_level_numeric() {
        assert_eq!(LogLevel::parse("-1"), Some(LogLevel::Silent));
        assert_eq!(LogLevel::parse("7"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::Silent.tracing_level(), None);
        assert_eq!(
            LogLevel::Warning.tracing_level(),
            Some(tracing::Level::WARN)
        );
    }

    #[test]
    fn plane_flag_values() {
        assert_eq!(PlaneFlags::HORALIGNED.bits(), 0x01);
        assert_eq!(PlaneFlags::VERALIGNED.bits(), 0x02);
        assert_eq!(PlaneFlags::MARGINALIZED.bits(), 0x04);
        assert_eq!(PlaneFlags::FIXED.bits(), 0x08);
        assert_eq!(PlaneFlags::AUTOGROW.bits(), 0x10);
        assert_eq!(PlaneFlags::VSCROLL.bits(), 0x20);
    }

    #[test]
    fn marginalized_options() {
        let opts = PlaneOptions::marginalized(1, 2, 3, 4);
        assert_eq!((opts.y, opts.x), (1, 2));
        assert_eq!((opts.rows, opts.cols), (0, 0));
        assert_eq!((opts.margin_b, opts.margin_r), (3, 4));
        assert!(opts.flags.contains(PlaneFlags::MARGINALIZED));
    }

    #[test]
    fn aligned_options_store_align_in_coordinate() {
        let opts = PlaneOptions::new(0, 0, 3, 10).aligned_x(Align::Center);
        assert_eq!(opts.x, 2);
        assert!(opts.flags.contains(PlaneFlags::HORALIGNED));
    }

    #[test]
    fn blit_flag_values() {
        assert_eq!(BlitFlags::NO_DEGRADE.bits(), 0x01);
        assert_eq!(BlitFlags::CHILDPLANE.bits(), 0x20);
        assert_eq!(BlitFlags::NOINTERPOLATE.bits(), 0x40);
        assert_eq!(Blitter::Pixel as u32, 6);
        assert_eq!(Scale::ScaleHiRes as u32, 4);
    }
}
