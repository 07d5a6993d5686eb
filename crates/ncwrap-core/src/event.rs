#![forbid(unsafe_code)]

//! Input events as delivered by the engine.
//!
//! The engine reports every input as a single record: a key id (either a
//! Unicode scalar or a synthesized code above the Unicode range), the cell
//! and pixel coordinates for mouse events, the UTF-8 text that produced the
//! event, modifier state and a press/repeat/release kind.
//!
//! # Design Notes
//!
//! - Coordinates are 0-indexed; `-1` means "not a mouse event"
//! - Synthesized key ids start at `0x110000 + 1000`, past the last scalar
//! - `Key::from_id` is total: unknown synthesized ids map to [`Key::Invalid`]

use bitflags::bitflags;

/// First synthesized key id.
pub const PRETERUNICODEBASE: u32 = 1_115_000;

/// Key identity of an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A Unicode scalar (including tab, escape and space).
    Char(char),
    Invalid,
    /// The terminal was resized.
    Resize,
    Up,
    Right,
    Down,
    Left,
    Enter,
    /// Pointer motion with no button change.
    Motion,
    /// Mouse button 1 through 12. Buttons 4 and 5 are the scroll wheel.
    Button(u8),
}

impl Key {
    pub const TAB: Self = Self::Char('\t');
    pub const ESC: Self = Self::Char('\x1b');
    pub const SPACE: Self = Self::Char(' ');
    pub const SCROLL_UP: Self = Self::Button(4);
    pub const SCROLL_DOWN: Self = Self::Button(5);

    /// Decode an engine key id.
    pub fn from_id(id: u32) -> Self {
        match id {
            1_115_001 => Self::Resize,
            1_115_002 => Self::Up,
            1_115_003 => Self::Right,
            1_115_004 => Self::Down,
            1_115_005 => Self::Left,
            1_115_121 => Self::Enter,
            1_115_200 => Self::Motion,
            1_115_201..=1_115_212 => Self::Button((id - 1_115_200) as u8),
            _ => char::from_u32(id).map_or(Self::Invalid, Self::Char),
        }
    }

    /// Engine key id.
    pub fn id(self) -> u32 {
        match self {
            Self::Char(c) => c as u32,
            Self::Invalid => PRETERUNICODEBASE,
            Self::Resize => 1_115_001,
            Self::Up => 1_115_002,
            Self::Right => 1_115_003,
            Self::Down => 1_115_004,
            Self::Left => 1_115_005,
            Self::Enter => 1_115_121,
            Self::Motion => 1_115_200,
            Self::Button(n) if (1..=12).contains(&n) => 1_115_200 + u32::from(n),
            Self::Button(_) => PRETERUNICODEBASE,
        }
    }

    /// Whether this is a mouse button or motion event.
    pub fn is_mouse(self) -> bool {
        matches!(self, Self::Motion | Self::Button(_))
    }
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        Self::Char(c)
    }
}

/// Press, repeat or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum EventType {
    #[default]
    Unknown = 0,
    Press = 1,
    Repeat = 2,
    Release = 3,
}

impl EventType {
    /// Decode a raw kind; unknown values map to [`EventType::Unknown`].
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Press,
            2 => Self::Repeat,
            3 => Self::Release,
            _ => Self::Unknown,
        }
    }
}

bitflags! {
    /// Modifier keys held during an input event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const SUPER = 0b1000;
    }
}

impl Modifiers {
    pub const NONE: Self = Self::empty();
}

/// One input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub key: Key,
    /// Cell row, or -1.
    pub y: i32,
    /// Cell column, or -1.
    pub x: i32,
    /// Text that produced the event; empty for synthesized keys.
    pub utf8: String,
    pub modifiers: Modifiers,
    pub evtype: EventType,
    /// Pixel offset within the cell, or -1.
    pub ypx: i32,
    pub xpx: i32,
}

impl InputEvent {
    /// A keypress with no position.
    pub fn key(key: impl Into<Key>) -> Self {
        let key = key.into();
        let utf8 = match key {
            Key::Char(c) => c.to_string(),
            _ => String::new(),
        };
        Self {
            key,
            y: -1,
            x: -1,
            utf8,
            modifiers: Modifiers::NONE,
            evtype: EventType::Press,
            ypx: -1,
            xpx: -1,
        }
    }

    /// A mouse event at cell `(y, x)`.
    pub fn mouse(key: Key, y: i32, x: i32, evtype: EventType) -> Self {
        Self {
            key,
            y,
            x,
            utf8: String::new(),
            modifiers: Modifiers::NONE,
            evtype,
            ypx: 0,
            xpx: 0,
        }
    }

    /// A resize notification.
    pub fn resize() -> Self {
        Self::key(Key::Resize)
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub fn with_type(mut self, evtype: EventType) -> Self {
        self.evtype = evtype;
        self
    }

    /// Engine key id of this event.
    pub fn id(&self) -> u32 {
        self.key.id()
    }

    pub fn is_char(&self, c: char) -> bool {
        self.key == Key::Char(c)
    }

    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    pub fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    pub fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Press or repeat; releases are filtered out by most consumers.
    pub fn is_press(&self) -> bool {
        matches!(self.evtype, EventType::Press | EventType::Repeat | EventType::Unknown)
    }
}
