#![forbid(unsafe_code)]

//! Channel codec.
//!
//! A [`Channel`] is one packed 32-bit colour word; [`Channels`] concatenates
//! a foreground and a background channel into the 64-bit word the engine
//! attaches to cells, plane bases and widget chrome.
//!
//! # Channel layout (32 bits)
//!
//! ```text
//! 0x8000_0000  reserved, must be zero
//! 0x4000_0000  colour is *not* the terminal default
//! 0x3000_0000  alpha (2 bits)
//! 0x0800_0000  colour is a palette index
//! 0x0700_0000  reserved, must be zero
//! 0x00FF_FFFF  RGB (rrggbb) or palette index
//! ```
//!
//! # Channels layout (64 bits)
//!
//! ```text
//! channels = (foreground << 32) | background
//! ```
//!
//! Every mutator is a masked read-modify-write: changing one field never
//! perturbs the bits of any other field.

use crate::color::{Alpha, Color};

/// Failure reported by a channel mutator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// A raw alpha value had bits outside the 2-bit alpha field.
    InvalidAlpha(u32),
    /// High-contrast alpha is only meaningful for the foreground.
    HighContrastBackground,
}

impl std::fmt::Display for ChannelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAlpha(raw) => write!(f, "invalid alpha value 0x{raw:08x}"),
            Self::HighContrastBackground => {
                write!(f, "high-contrast alpha is not valid for a background channel")
            }
        }
    }
}

impl std::error::Error for ChannelError {}

/// One packed 32-bit colour channel.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(transparent)]
pub struct Channel(u32);

impl Channel {
    pub const COLOR_MASK: u32 = 0x00FF_FFFF;
    pub const ALPHA_MASK: u32 = Alpha::MASK;
    pub const NOT_DEFAULT_MASK: u32 = 0x4000_0000;
    pub const PALETTE_MASK: u32 = 0x0800_0000;
    pub const RESERVED_MASK: u32 = 0x8700_0000;

    /// The default-colour channel (all bits zero).
    pub const DEFAULT: Self = Self(0);

    /// Channel carrying `color`, opaque, with the not-default marker set.
    #[inline]
    pub const fn from_color(color: Color) -> Self {
        Self(color.value() | Self::NOT_DEFAULT_MASK)
    }

    /// Channel carrying `color` at the given alpha.
    #[inline]
    pub const fn from_color_alpha(color: Color, alpha: Alpha) -> Self {
        Self(color.value() | Self::NOT_DEFAULT_MASK | alpha.raw())
    }

    /// Reinterpret a raw word. Reserved bits are cleared.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw & !Self::RESERVED_MASK)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The RGB colour bits.
    #[inline]
    pub const fn rgb(self) -> Color {
        Color::from_u32(self.0 & Self::COLOR_MASK)
    }

    #[inline]
    pub const fn r(self) -> u8 {
        self.rgb().r()
    }

    #[inline]
    pub const fn g(self) -> u8 {
        self.rgb().g()
    }

    #[inline]
    pub const fn b(self) -> u8 {
        self.rgb().b()
    }

    #[inline]
    pub const fn alpha(self) -> Alpha {
        Alpha::from_raw(self.0 & Self::ALPHA_MASK)
    }

    /// True if the channel uses the terminal's default colour.
    #[inline]
    pub const fn is_default(self) -> bool {
        self.0 & Self::NOT_DEFAULT_MASK == 0
    }

    #[inline]
    pub const fn is_palette(self) -> bool {
        !self.is_default() && self.0 & Self::PALETTE_MASK != 0
    }

    /// The palette index, if this channel holds one.
    #[inline]
    pub const fn palette_index(self) -> Option<u8> {
        if self.is_palette() {
            Some(self.0 as u8)
        } else {
            None
        }
    }

    /// Set the RGB colour, leaving alpha untouched.
    ///
    /// Clears the palette bit and sets the not-default marker.
    #[inline]
    pub fn set_rgb(&mut self, color: Color) {
        self.0 = (self.0 & !(Self::COLOR_MASK | Self::PALETTE_MASK))
            | Self::NOT_DEFAULT_MASK
            | color.value();
    }

    /// Set a palette index, leaving alpha untouched.
    #[inline]
    pub fn set_palette_index(&mut self, index: u8) {
        self.0 = (self.0 & !Self::COLOR_MASK)
            | Self::NOT_DEFAULT_MASK
            | Self::PALETTE_MASK
            | index as u32;
    }

    /// Set the alpha field, leaving colour untouched.
    ///
    /// A non-opaque alpha implies a non-default colour, so it also sets the
    /// not-default marker.
    #[inline]
    pub fn set_alpha(&mut self, alpha: Alpha) {
        self.0 = (self.0 & !Self::ALPHA_MASK) | alpha.raw();
        if alpha != Alpha::Opaque {
            self.0 |= Self::NOT_DEFAULT_MASK;
        }
    }

    /// Set the alpha field from a raw in-place value.
    pub fn set_alpha_raw(&mut self, raw: u32) -> Result<(), ChannelError> {
        if raw & !Self::ALPHA_MASK != 0 {
            return Err(ChannelError::InvalidAlpha(raw));
        }
        self.set_alpha(Alpha::from_raw(raw));
        Ok(())
    }

    /// Mark the channel as using the default colour.
    ///
    /// Colour bits are kept so a later `set_not_default` restores them.
    #[inline]
    pub fn set_default(&mut self) {
        self.0 &= !(Self::NOT_DEFAULT_MASK | Self::PALETTE_MASK);
    }

    #[inline]
    pub fn set_not_default(&mut self) {
        self.0 |= Self::NOT_DEFAULT_MASK;
    }

    /// Builder form of [`Channel::set_alpha`].
    #[inline]
    pub fn with_alpha(mut self, alpha: Alpha) -> Self {
        self.set_alpha(alpha);
        self
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Channel(0x{:08x})", self.0)
    }
}

impl From<Color> for Channel {
    fn from(color: Color) -> Self {
        Self::from_color(color)
    }
}

/// A packed foreground/background channel pair.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(transparent)]
pub struct Channels(u64);

impl Channels {
    /// Both halves default.
    pub const DEFAULT: Self = Self(0);

    const BG_MASK: u64 = 0x0000_0000_FFFF_FFFF;
    const FG_MASK: u64 = 0xFFFF_FFFF_0000_0000;

    /// Concatenate two channels.
    #[inline]
    pub const fn combine(fg: Channel, bg: Channel) -> Self {
        Self(((fg.raw() as u64) << 32) | bg.raw() as u64)
    }

    /// Pack both colours and alphas without checking them.
    ///
    /// This is the raw constructor: a high-contrast background is stored as
    /// given. Use [`Channels::try_pack`] to reject it.
    #[inline]
    pub const fn pack(fg: Color, fg_alpha: Alpha, bg: Color, bg_alpha: Alpha) -> Self {
        Self::combine(
            Channel::from_color_alpha(fg, fg_alpha),
            Channel::from_color_alpha(bg, bg_alpha),
        )
    }

    /// Checked form of [`Channels::pack`].
    pub const fn try_pack(
        fg: Color,
        fg_alpha: Alpha,
        bg: Color,
        bg_alpha: Alpha,
    ) -> Result<Self, ChannelError> {
        if matches!(bg_alpha, Alpha::HighContrast) {
            return Err(ChannelError::HighContrastBackground);
        }
        Ok(Self::pack(fg, fg_alpha, bg, bg_alpha))
    }

    /// Opaque foreground and background colours.
    #[inline]
    pub const fn from_colors(fg: Color, bg: Color) -> Self {
        Self::combine(Channel::from_color(fg), Channel::from_color(bg))
    }

    /// Opaque foreground colour over a default background.
    #[inline]
    pub const fn from_fg(fg: Color) -> Self {
        Self::combine(Channel::from_color(fg), Channel::DEFAULT)
    }

    const RESERVED_MASK: u64 =
        ((Channel::RESERVED_MASK as u64) << 32) | Channel::RESERVED_MASK as u64;

    /// Reinterpret a raw word. Reserved bits of both halves are cleared.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw & !Self::RESERVED_MASK)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// The foreground (high) half.
    #[inline]
    pub const fn fg_channel(self) -> Channel {
        Channel((self.0 >> 32) as u32)
    }

    /// The background (low) half.
    #[inline]
    pub const fn bg_channel(self) -> Channel {
        Channel(self.0 as u32)
    }

    #[inline]
    pub fn set_fg_channel(&mut self, fg: Channel) {
        self.0 = (self.0 & Self::BG_MASK) | ((fg.raw() as u64) << 32);
    }

    #[inline]
    pub fn set_bg_channel(&mut self, bg: Channel) {
        self.0 = (self.0 & Self::FG_MASK) | bg.raw() as u64;
    }

    #[inline]
    pub const fn fg_rgb(self) -> Color {
        self.fg_channel().rgb()
    }

    #[inline]
    pub const fn bg_rgb(self) -> Color {
        self.bg_channel().rgb()
    }

    #[inline]
    pub const fn fg_alpha(self) -> Alpha {
        self.fg_channel().alpha()
    }

    #[inline]
    pub const fn bg_alpha(self) -> Alpha {
        self.bg_channel().alpha()
    }

    #[inline]
    pub const fn fg_default(self) -> bool {
        self.fg_channel().is_default()
    }

    #[inline]
    pub const fn bg_default(self) -> bool {
        self.bg_channel().is_default()
    }

    pub fn set_fg_rgb(&mut self, color: Color) {
        let mut fg = self.fg_channel();
        fg.set_rgb(color);
        self.set_fg_channel(fg);
    }

    pub fn set_bg_rgb(&mut self, color: Color) {
        let mut bg = self.bg_channel();
        bg.set_rgb(color);
        self.set_bg_channel(bg);
    }

    pub fn set_fg_alpha(&mut self, alpha: Alpha) {
        let mut fg = self.fg_channel();
        fg.set_alpha(alpha);
        self.set_fg_channel(fg);
    }

    /// Set the background alpha.
    ///
    /// Rejects [`Alpha::HighContrast`], leaving the word unchanged.
    pub fn set_bg_alpha(&mut self, alpha: Alpha) -> Result<(), ChannelError> {
        if alpha == Alpha::HighContrast {
            return Err(ChannelError::HighContrastBackground);
        }
        let mut bg = self.bg_channel();
        bg.set_alpha(alpha);
        self.set_bg_channel(bg);
        Ok(())
    }

    pub fn set_fg_default(&mut self) {
        let mut fg = self.fg_channel();
        fg.set_default();
        self.set_fg_channel(fg);
    }

    pub fn set_bg_default(&mut self) {
        let mut bg = self.bg_channel();
        bg.set_default();
        self.set_bg_channel(bg);
    }

    pub fn set_fg_palette_index(&mut self, index: u8) {
        let mut fg = self.fg_channel();
        fg.set_palette_index(index);
        self.set_fg_channel(fg);
    }

    pub fn set_bg_palette_index(&mut self, index: u8) {
        let mut bg = self.bg_channel();
        bg.set_palette_index(index);
        self.set_bg_channel(bg);
    }

    /// Swap the foreground and background colours.
    ///
    /// Colour, default and palette bits move to the other half; each half
    /// keeps its own alpha.
    #[must_use]
    pub const fn reverse(self) -> Self {
        let keep = (Channel::ALPHA_MASK as u64) << 32 | Channel::ALPHA_MASK as u64;
        let swapped = self.0.rotate_left(32);
        Self((swapped & !keep) | (self.0 & keep))
    }
}

impl std::fmt::Debug for Channels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Channels(fg=0x{:08x}, bg=0x{:08x})",
            self.fg_channel().raw(),
            self.bg_channel().raw()
        )
    }
}

impl From<u64> for Channels {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<Channels> for u64 {
    fn from(channels: Channels) -> Self {
        channels.raw()
    }
}
