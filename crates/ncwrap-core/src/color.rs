#![forbid(unsafe_code)]

//! Colour, alpha, style and alignment value types.
//!
//! These are plain values with no lifetime concerns. Their raw encodings
//! match the engine ABI so they can be OR-ed straight into channel words and
//! cell style masks.

/// A 24-bit RGB colour.
///
/// - **Layout:** `0x00RRGGBB`. The upper byte is always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(transparent)]
pub struct Color(u32);

impl Color {
    /// Mask covering the 24 colour bits.
    pub const MASK: u32 = 0x00FF_FFFF;

    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const LIGHT_GREY: Self = Self::rgb(192, 192, 192);
    pub const GREY: Self = Self::rgb(127, 127, 127);
    pub const DARK_GREY: Self = Self::rgb(64, 64, 64);
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// Create a colour from its components.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    /// Create a colour from a packed `0xRRGGBB` value.
    ///
    /// Bits above the 24 colour bits are discarded.
    #[inline]
    pub const fn from_u32(value: u32) -> Self {
        Self(value & Self::MASK)
    }

    /// The packed `0xRRGGBB` value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    /// Perceptual luma in `0..=255` (BT.601 weights).
    #[inline]
    pub const fn luma(self) -> u8 {
        let y = (self.r() as u32 * 299 + self.g() as u32 * 587 + self.b() as u32 * 114) / 1000;
        y as u8
    }

    /// Grey colour with the same luma as `self`.
    #[inline]
    pub const fn greyscale(self) -> Self {
        let y = self.luma();
        Self::rgb(y, y, y)
    }

    /// Component-wise midpoint of two colours.
    #[inline]
    pub const fn average(self, other: Self) -> Self {
        Self::rgb(
            ((self.r() as u16 + other.r() as u16) / 2) as u8,
            ((self.g() as u16 + other.g() as u16) / 2) as u8,
            ((self.b() as u16 + other.b() as u16) / 2) as u8,
        )
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::rgb(r, g, b)
    }
}

/// Transparency level of one channel.
///
/// The discriminant is the raw value of the 2-bit alpha field *in place*,
/// i.e. already shifted to bit 28 of a 32-bit channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(u32)]
pub enum Alpha {
    #[default]
    Opaque = 0x0000_0000,
    Blend = 0x1000_0000,
    Transparent = 0x2000_0000,
    HighContrast = 0x3000_0000,
}

impl Alpha {
    /// Mask of the alpha field within a 32-bit channel.
    pub const MASK: u32 = 0x3000_0000;

    pub const ALL: [Self; 4] = [
        Self::Opaque,
        Self::Blend,
        Self::Transparent,
        Self::HighContrast,
    ];

    /// Raw in-place value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Decode a raw in-place alpha value.
    ///
    /// Decoding is total: anything that is not exactly one of the four
    /// encodings decodes to [`Alpha::Opaque`].
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0x1000_0000 => Self::Blend,
            0x2000_0000 => Self::Transparent,
            0x3000_0000 => Self::HighContrast,
            _ => Self::Opaque,
        }
    }
}

bitflags::bitflags! {
    /// Text style bitmask.
    ///
    /// The empty set is "no style". Iterating yields single styles in
    /// ascending bit order, and collecting such a sequence rebuilds the
    /// mask, so the set-of-styles form round-trips losslessly.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Style: u16 {
        const STRUCK    = 0x0001;
        const BOLD      = 0x0002;
        const UNDERCURL = 0x0004;
        const UNDERLINE = 0x0008;
        const ITALIC    = 0x0010;
    }
}

impl Style {
    /// No style.
    pub const NONE: Self = Self::empty();

    /// Decode a raw style mask, dropping undefined bits.
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self::from_bits_truncate(raw)
    }

    /// Decode a raw mask from a 32-bit engine value, dropping undefined bits.
    #[inline]
    pub const fn from_raw32(raw: u32) -> Self {
        Self::from_bits_truncate((raw & 0xFFFF) as u16)
    }

    /// Ordered list of the single styles present.
    pub fn to_vec(self) -> Vec<Style> {
        self.iter().collect()
    }
}

impl From<&[Style]> for Style {
    fn from(styles: &[Style]) -> Self {
        styles.iter().copied().collect()
    }
}

/// Horizontal alignment for aligned output and aligned plane placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(u32)]
pub enum Align {
    #[default]
    Unaligned = 0,
    Left = 1,
    Center = 2,
    Right = 3,
}

impl Align {
    /// Decode a raw alignment value; unknown values are unaligned.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Left,
            2 => Self::Center,
            3 => Self::Right,
            _ => Self::Unaligned,
        }
    }

    /// Offset of an item of width `len` within a span of width `avail`.
    ///
    /// Returns `None` for [`Align::Unaligned`] or when the item does not fit.
    pub const fn offset(self, avail: u32, len: u32) -> Option<u32> {
        if len > avail {
            return None;
        }
        match self {
            Self::Unaligned => None,
            Self::Left => Some(0),
            Self::Center => Some((avail - len) / 2),
            Self::Right => Some(avail - len),
        }
    }
}
