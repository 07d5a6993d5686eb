#![forbid(unsafe_code)]

//! Cell record and codec.
//!
//! A `Cell` is one grid position's renderable content. Its layout is the
//! engine's in-memory record, field for field:
//!
//! ```text
//! #[repr(C)]
//! Cell {
//!     gcluster: u32,          // 4B  EGC bytes (LE) or spill index
//!     gcluster_backstop: u8,  // 1B  always zero
//!     width: u8,              // 1B  display columns (1 or 2)
//!     stylemask: u16,         // 2B  Style bits
//!     channels: u64,          // 8B  Channels word
//! }                           // 16B
//! ```
//!
//! # Cluster encoding
//!
//! - `0`: empty cell
//! - `0x01XX_XXXX`: spilled cluster, `XX_XXXX` is an [`EgcId`] slot in the
//!   owning plane's pool
//! - anything else: the cluster's UTF-8 bytes packed little-endian
//!
//! A spill marker cannot alias inline text: the top byte of an inline word
//! is either zero (clusters shorter than four bytes) or a UTF-8 continuation
//! byte (`>= 0x80`).

use unicode_segmentation::UnicodeSegmentation;

use crate::channel::{ChannelError, Channels};
use crate::color::{Alpha, Color, Style};
use crate::egc_pool::{EgcId, EgcPool};
use crate::{char_width, str_width};

/// Top-byte marker of a spilled cluster.
const SPILL_MARKER: u32 = 0x0100_0000;
const SPILL_TAG_MASK: u32 = 0xFF00_0000;

/// Failure while packing a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    /// The style mask used bits outside the defined [`Style`] set.
    UndefinedStyleBits(u16),
    /// The requested width disagrees with the glyph's display width.
    InvalidWidth { glyph: char, width: u8, expected: u8 },
    /// Control characters cannot be stored in a cell.
    ControlCharacter(char),
    /// The text held more than one grapheme cluster.
    MultipleClusters(String),
}

impl std::fmt::Display for CellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UndefinedStyleBits(bits) => {
                write!(f, "style mask 0x{bits:04x} uses undefined bits")
            }
            Self::InvalidWidth {
                glyph,
                width,
                expected,
            } => write!(
                f,
                "width {width} for {glyph:?} does not match display width {expected}"
            ),
            Self::ControlCharacter(c) => write!(f, "control character {c:?} cannot be stored"),
            Self::MultipleClusters(s) => write!(f, "{s:?} is more than one grapheme cluster"),
        }
    }
}

impl std::error::Error for CellError {}

/// Decoded view of a cell's cluster field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Empty,
    /// Up to four UTF-8 bytes, zero padded.
    Inline([u8; 4]),
    Spilled(EgcId),
}

/// The width a cell must carry for `c`: 2 for wide glyphs, otherwise 1.
///
/// The zero glyph and glyphs without a defined width count as 1.
#[inline]
pub fn cell_width(c: char) -> u8 {
    if char_width(c) == 2 { 2 } else { 1 }
}

/// One terminal cell (16 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct Cell {
    gcluster: u32,
    gcluster_backstop: u8,
    width: u8,
    stylemask: u16,
    channels: u64,
}

const _: () = assert!(core::mem::size_of::<Cell>() == 16);

impl Cell {
    /// Empty cell: no glyph, width 1, no style, default colours.
    pub const EMPTY: Self = Self {
        gcluster: 0,
        gcluster_backstop: 0,
        width: 1,
        stylemask: 0,
        channels: 0,
    };

    /// Pack a single-scalar glyph.
    ///
    /// # Errors
    ///
    /// - [`CellError::UndefinedStyleBits`] if `stylemask` has bits outside [`Style`]
    /// - [`CellError::InvalidWidth`] if `width` is not [`cell_width`]`(glyph)`
    /// - [`CellError::ControlCharacter`] for C0/C1 controls other than `'\0'`
    pub fn pack(
        glyph: char,
        width: u8,
        stylemask: u16,
        channels: Channels,
    ) -> Result<Self, CellError> {
        if stylemask & !Style::all().bits() != 0 {
            return Err(CellError::UndefinedStyleBits(stylemask));
        }
        if glyph != '\0' && glyph.is_control() {
            return Err(CellError::ControlCharacter(glyph));
        }
        let expected = cell_width(glyph);
        if width != expected {
            return Err(CellError::InvalidWidth {
                glyph,
                width,
                expected,
            });
        }
        let mut buf = [0u8; 4];
        glyph.encode_utf8(&mut buf);
        let gcluster = if glyph == '\0' {
            0
        } else {
            u32::from_le_bytes(buf)
        };
        Ok(Self {
            gcluster,
            gcluster_backstop: 0,
            width,
            stylemask,
            channels: channels.raw(),
        })
    }

    /// Cell for `c` with its computed width and no style or colour.
    ///
    /// Control characters produce [`Cell::EMPTY`].
    pub fn from_char(c: char) -> Self {
        Self::pack(c, cell_width(c), 0, Channels::DEFAULT).unwrap_or(Self::EMPTY)
    }

    /// Load a whole grapheme cluster, spilling into `pool` when it does not
    /// fit inline.
    ///
    /// An empty string loads [`Cell::EMPTY`] with the given style and channels.
    pub fn load(
        pool: &mut EgcPool,
        egc: &str,
        styles: Style,
        channels: Channels,
    ) -> Result<Self, CellError> {
        let mut clusters = egc.graphemes(true);
        let Some(first) = clusters.next() else {
            return Ok(Self::EMPTY.with_styles(styles).with_channels(channels));
        };
        if clusters.next().is_some() {
            return Err(CellError::MultipleClusters(egc.to_string()));
        }
        if let Some(c) = first.chars().find(|c| c.is_control()) {
            return Err(CellError::ControlCharacter(c));
        }
        let width = if str_width(first) >= 2 { 2 } else { 1 };
        let gcluster = if first.len() <= 4 {
            let mut buf = [0u8; 4];
            buf[..first.len()].copy_from_slice(first.as_bytes());
            u32::from_le_bytes(buf)
        } else {
            SPILL_MARKER | pool.intern(first, width).raw()
        };
        Ok(Self {
            gcluster,
            gcluster_backstop: 0,
            width,
            stylemask: styles.bits(),
            channels: channels.raw(),
        })
    }

    /// Right half of a wide glyph: no cluster, width 2.
    pub fn continuation(styles: Style, channels: Channels) -> Self {
        Self {
            gcluster: 0,
            gcluster_backstop: 0,
            width: 2,
            stylemask: styles.bits(),
            channels: channels.raw(),
        }
    }

    /// Raw cluster word.
    #[inline]
    pub const fn gcluster(&self) -> u32 {
        self.gcluster
    }

    /// The backstop byte, always zero.
    #[inline]
    pub const fn backstop(&self) -> u8 {
        self.gcluster_backstop
    }

    #[inline]
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Raw style mask.
    #[inline]
    pub const fn stylemask(&self) -> u16 {
        self.stylemask
    }

    #[inline]
    pub const fn styles(&self) -> Style {
        Style::from_raw(self.stylemask)
    }

    #[inline]
    pub const fn channels(&self) -> Channels {
        Channels::from_raw(self.channels)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.gcluster == 0
    }

    /// Left half of a wide glyph.
    #[inline]
    pub const fn is_wide(&self) -> bool {
        self.gcluster != 0 && self.width == 2
    }

    /// Right half of a wide glyph.
    #[inline]
    pub const fn is_continuation(&self) -> bool {
        self.gcluster == 0 && self.width == 2
    }

    #[inline]
    pub const fn is_spilled(&self) -> bool {
        self.gcluster & SPILL_TAG_MASK == SPILL_MARKER
    }

    /// Decode the cluster field.
    pub const fn glyph(&self) -> Glyph {
        if self.gcluster == 0 {
            Glyph::Empty
        } else if self.is_spilled() {
            Glyph::Spilled(EgcId::new(self.gcluster & EgcId::MAX_SLOT))
        } else {
            Glyph::Inline(self.gcluster.to_le_bytes())
        }
    }

    /// Spill slot, if the cluster lives in a pool.
    pub const fn egc_id(&self) -> Option<EgcId> {
        match self.glyph() {
            Glyph::Spilled(id) => Some(id),
            _ => None,
        }
    }

    /// The cluster text when stored inline.
    pub fn inline_egc(&self) -> Option<String> {
        match self.glyph() {
            Glyph::Inline(bytes) => {
                let len = bytes.iter().position(|&b| b == 0).unwrap_or(4);
                std::str::from_utf8(&bytes[..len]).ok().map(str::to_string)
            }
            _ => None,
        }
    }

    /// The cluster text, resolving spills through `pool`.
    ///
    /// Empty cells yield an empty string; a dangling spill yields `None`.
    pub fn egc(&self, pool: &EgcPool) -> Option<String> {
        match self.glyph() {
            Glyph::Empty => Some(String::new()),
            Glyph::Inline(_) => self.inline_egc(),
            Glyph::Spilled(id) => pool.get(id).map(str::to_string),
        }
    }

    #[inline]
    pub const fn fg_rgb(&self) -> Color {
        self.channels().fg_rgb()
    }

    #[inline]
    pub const fn bg_rgb(&self) -> Color {
        self.channels().bg_rgb()
    }

    #[inline]
    pub const fn fg_alpha(&self) -> Alpha {
        self.channels().fg_alpha()
    }

    #[inline]
    pub const fn bg_alpha(&self) -> Alpha {
        self.channels().bg_alpha()
    }

    pub fn set_styles(&mut self, styles: Style) {
        self.stylemask = styles.bits();
    }

    pub fn styles_on(&mut self, styles: Style) {
        self.stylemask |= styles.bits();
    }

    pub fn styles_off(&mut self, styles: Style) {
        self.stylemask &= !styles.bits();
    }

    pub fn set_channels(&mut self, channels: Channels) {
        self.channels = channels.raw();
    }

    pub fn set_fg_rgb(&mut self, color: Color) {
        self.update_channels(|ch| ch.set_fg_rgb(color));
    }

    pub fn set_bg_rgb(&mut self, color: Color) {
        self.update_channels(|ch| ch.set_bg_rgb(color));
    }

    pub fn set_fg_alpha(&mut self, alpha: Alpha) {
        self.update_channels(|ch| ch.set_fg_alpha(alpha));
    }

    /// Set the background alpha; high contrast is rejected.
    pub fn set_bg_alpha(&mut self, alpha: Alpha) -> Result<(), ChannelError> {
        let mut ch = self.channels();
        ch.set_bg_alpha(alpha)?;
        self.channels = ch.raw();
        Ok(())
    }

    #[must_use]
    pub fn with_styles(mut self, styles: Style) -> Self {
        self.set_styles(styles);
        self
    }

    #[must_use]
    pub fn with_channels(mut self, channels: Channels) -> Self {
        self.set_channels(channels);
        self
    }

    /// Copy of this cell keeping only the glyph-independent state.
    #[must_use]
    pub fn blank(&self) -> Self {
        Self::EMPTY
            .with_styles(self.styles())
            .with_channels(self.channels())
    }

    /// Release the pool reference held by this cell, if any.
    pub fn release(&self, pool: &mut EgcPool) {
        if let Some(id) = self.egc_id() {
            pool.release(id);
        }
    }

    /// Take a pool reference for a copy of this cell, if needed.
    pub fn retain(&self, pool: &mut EgcPool) {
        if let Some(id) = self.egc_id() {
            pool.retain(id);
        }
    }

    fn update_channels(&mut self, f: impl FnOnce(&mut Channels)) {
        let mut ch = self.channels();
        f(&mut ch);
        self.channels = ch.raw();
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("glyph", &self.glyph())
            .field("width", &self.width)
            .field("styles", &self.styles())
            .field("channels", &self.channels())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Cell, CellError, Glyph, cell_width};
    use crate::channel::{ChannelError, Channels};
    use crate::color::{Alpha, Color, Style};
    use crate::egc_pool::EgcPool;

    #[test]
    fn cell_is_16_bytes() {
        assert_eq!(core::mem::size_of::<Cell>(), 16);
        assert_eq!(core::mem::align_of::<Cell>(), 8);
    }

    #[test]
    fn empty_cell_matches_trivial_initializer() {
        let c = Cell::EMPTY;
        assert_eq!(c.gcluster(), 0);
        assert_eq!(c.backstop(), 0);
        assert_eq!(c.width(), 1);
        assert_eq!(c.stylemask(), 0);
        assert_eq!(c.channels(), Channels::DEFAULT);
        assert_eq!(Cell::default(), c);
    }

    #[test]
    fn ascii_is_stored_little_endian() {
        let c = Cell::from_char('A');
        assert_eq!(c.gcluster(), 0x41);
        assert_eq!(c.inline_egc().as_deref(), Some("A"));
        assert_eq!(c.width(), 1);
    }

    #[test]
    fn multibyte_scalar_is_inline() {
        let c = Cell::from_char('╭');
        assert_eq!(c.gcluster().to_le_bytes()[..3], *"╭".as_bytes());
        assert!(!c.is_spilled());
        assert_eq!(c.inline_egc().as_deref(), Some("╭"));
    }

    #[test]
    fn wide_glyph_needs_width_two() {
        assert_eq!(cell_width('中'), 2);
        assert!(Cell::pack('中', 2, 0, Channels::DEFAULT).is_ok());
        assert_eq!(
            Cell::pack('中', 1, 0, Channels::DEFAULT),
            Err(CellError::InvalidWidth {
                glyph: '中',
                width: 1,
                expected: 2
            })
        );
        assert_eq!(
            Cell::pack('a', 2, 0, Channels::DEFAULT),
            Err(CellError::InvalidWidth {
                glyph: 'a',
                width: 2,
                expected: 1
            })
        );
    }

    #[test]
    fn zero_glyph_is_width_one_and_empty() {
        assert_eq!(cell_width('\0'), 1);
        let c = Cell::pack('\0', 1, 0, Channels::DEFAULT).unwrap();
        assert!(c.is_empty());
        assert_eq!(c.glyph(), Glyph::Empty);
    }

    #[test]
    fn combining_mark_counts_as_width_one() {
        assert_eq!(cell_width('\u{301}'), 1);
    }

    #[test]
    fn undefined_style_bits_rejected() {
        assert_eq!(
            Cell::pack('x', 1, 0x0020, Channels::DEFAULT),
            Err(CellError::UndefinedStyleBits(0x0020))
        );
        let ok = Cell::pack('x', 1, Style::BOLD.bits(), Channels::DEFAULT).unwrap();
        assert_eq!(ok.styles(), Style::BOLD);
    }

    #[test]
    fn control_characters_rejected() {
        assert_eq!(
            Cell::pack('\n', 1, 0, Channels::DEFAULT),
            Err(CellError::ControlCharacter('\n'))
        );
        assert_eq!(Cell::from_char('\x1b'), Cell::EMPTY);
    }

    #[test]
    fn load_short_cluster_inline() {
        let mut pool = EgcPool::new();
        let c = Cell::load(&mut pool, "é", Style::NONE, Channels::DEFAULT).unwrap();
        assert!(!c.is_spilled());
        assert!(pool.is_empty());
        assert_eq!(c.egc(&pool).as_deref(), Some("é"));
    }

    #[test]
    fn load_long_cluster_spills() {
        let mut pool = EgcPool::new();
        let c = Cell::load(&mut pool, "👩‍🔬", Style::ITALIC, Channels::DEFAULT).unwrap();
        assert!(c.is_spilled());
        assert_eq!(c.gcluster() & 0xFF00_0000, 0x0100_0000);
        assert_eq!(c.width(), 2);
        assert_eq!(c.egc(&pool).as_deref(), Some("👩‍🔬"));
        assert_eq!(c.styles(), Style::ITALIC);
        c.release(&mut pool);
        assert!(pool.is_empty());
        assert_eq!(c.egc(&pool), None);
    }

    #[test]
    fn load_rejects_multiple_clusters() {
        let mut pool = EgcPool::new();
        assert_eq!(
            Cell::load(&mut pool, "ab", Style::NONE, Channels::DEFAULT),
            Err(CellError::MultipleClusters("ab".to_string()))
        );
    }

    #[test]
    fn load_empty_string_keeps_style_and_channels() {
        let mut pool = EgcPool::new();
        let ch = Channels::from_colors(Color::RED, Color::BLUE);
        let c = Cell::load(&mut pool, "", Style::BOLD, ch).unwrap();
        assert!(c.is_empty());
        assert_eq!(c.styles(), Style::BOLD);
        assert_eq!(c.channels(), ch);
    }

    #[test]
    fn channel_mutators_are_isolated() {
        let mut c = Cell::from_char('x').with_channels(Channels::pack(
            Color::RED,
            Alpha::Opaque,
            Color::BLUE,
            Alpha::Opaque,
        ));
        c.set_bg_alpha(Alpha::Blend).unwrap();
        assert_eq!(c.fg_rgb(), Color::RED);
        assert_eq!(c.bg_rgb(), Color::BLUE);
        assert_eq!(c.fg_alpha(), Alpha::Opaque);
        assert_eq!(c.bg_alpha(), Alpha::Blend);
        assert_eq!(
            c.set_bg_alpha(Alpha::HighContrast),
            Err(ChannelError::HighContrastBackground)
        );
        assert_eq!(c.bg_alpha(), Alpha::Blend);
        assert_eq!(c.inline_egc().as_deref(), Some("x"));
    }

    #[test]
    fn wide_halves() {
        let left = Cell::from_char('中');
        let right = Cell::continuation(Style::NONE, Channels::DEFAULT);
        assert!(left.is_wide());
        assert!(!left.is_continuation());
        assert!(right.is_continuation());
        assert!(right.is_empty());
        assert!(!Cell::EMPTY.is_continuation());
    }

    #[test]
    fn styles_on_off() {
        let mut c = Cell::from_char('x');
        c.styles_on(Style::BOLD | Style::ITALIC);
        c.styles_off(Style::BOLD);
        assert_eq!(c.styles(), Style::ITALIC);
    }
}

#[cfg(test)]
mod cell_proptests {
    use super::{Cell, cell_width};
    use crate::channel::Channels;
    use crate::color::Style;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn pack_round_trips_printable(c in any::<char>().prop_filter("printable", |c| !c.is_control() && *c != '\0'),
                                      styles in 0u16..0x20, raw in any::<u64>()) {
            let channels = Channels::from_raw(raw);
            let cell = Cell::pack(c, cell_width(c), styles, channels).unwrap();
            prop_assert_eq!(cell.inline_egc(), Some(c.to_string()));
            prop_assert_eq!(cell.styles(), Style::from_raw(styles));
            prop_assert_eq!(cell.channels(), channels);
            prop_assert_eq!(cell.backstop(), 0);
            prop_assert!(!cell.is_spilled());
        }

        #[test]
        fn undefined_style_bits_never_pack(bits in 0x20u16..=u16::MAX) {
            prop_assert!(Cell::pack('x', 1, bits, Channels::DEFAULT).is_err());
        }
    }
}
