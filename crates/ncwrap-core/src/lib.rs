#![forbid(unsafe_code)]

//! Core value types for ncwrap: colours, channel words, cells and input events.
//!
//! Everything here is a plain value whose encoding matches the rendering
//! engine's ABI bit for bit. Nothing in this crate talks to an engine.

pub mod cell;
pub mod channel;
pub mod color;
pub mod egc_pool;
pub mod event;

pub use cell::{Cell, CellError, Glyph};
pub use channel::{Channel, ChannelError, Channels};
pub use color::{Align, Alpha, Color, Style};
pub use egc_pool::{EgcId, EgcPool};
pub use event::{EventType, InputEvent, Key, Modifiers};

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width of a single scalar in cells (0, 1 or 2).
///
/// Control characters and other scalars without a defined width are 0.
#[inline]
#[must_use]
pub fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Display width of a grapheme cluster, clamped to 2.
#[inline]
#[must_use]
pub fn grapheme_width(grapheme: &str) -> usize {
    grapheme.width().min(2)
}

/// Display width of text in cells, summed per grapheme cluster.
#[must_use]
pub fn str_width(text: &str) -> usize {
    if text.is_ascii() {
        return text.bytes().filter(|b| !b.is_ascii_control()).count();
    }
    text.graphemes(true).map(grapheme_width).sum()
}

/// Check if a string contains any wide clusters.
#[must_use]
pub fn has_wide_chars(text: &str) -> bool {
    text.graphemes(true).any(|g| grapheme_width(g) > 1)
}
