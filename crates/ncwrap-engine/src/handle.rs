#![forbid(unsafe_code)]

//! Opaque native handles.
//!
//! Handles are non-zero integers standing in for engine-side addresses.
//! Like addresses, a freed value may be handed out again by a later
//! allocation, so a handle alone never proves that the resource it named
//! is still the one behind it.

use std::fmt;
use std::num::NonZeroU64;

macro_rules! native_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(NonZeroU64);

        impl $name {
            /// Wrap a raw handle value; zero is the null handle.
            #[inline]
            pub const fn new(raw: u64) -> Option<Self> {
                match NonZeroU64::new(raw) {
                    Some(v) => Some(Self(v)),
                    None => None,
                }
            }

            #[inline]
            pub const fn get(self) -> u64 {
                self.0.get()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:#x})"), self.0.get())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self.0.get())
            }
        }
    };
}

native_handle!(
    /// Native plane handle.
    PlaneHandle
);
native_handle!(
    /// Native selector widget handle.
    SelectorHandle
);
native_handle!(
    /// Native visual (decoded image) handle.
    VisualHandle
);

/// Hands out handle values, reusing freed ones most-recent first.
#[derive(Debug)]
pub(crate) struct HandleAllocator {
    base: u64,
    next: u64,
    free: Vec<u64>,
}

impl HandleAllocator {
    /// Values start at `base` and step by 16 so they read like addresses.
    pub(crate) fn new(base: u64) -> Self {
        debug_assert!(base != 0);
        Self {
            base,
            next: base,
            free: Vec::new(),
        }
    }

    pub(crate) fn alloc(&mut self) -> u64 {
        if let Some(raw) = self.free.pop() {
            return raw;
        }
        let raw = self.next;
        self.next += 0x10;
        raw
    }

    pub(crate) fn release(&mut self, raw: u64) {
        debug_assert!(raw >= self.base && raw < self.next, "foreign handle");
        debug_assert!(!self.free.contains(&raw), "double release");
        self.free.push(raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_null() {
        assert!(PlaneHandle::new(0).is_none());
        assert_eq!(PlaneHandle::new(0x40).map(PlaneHandle::get), Some(0x40));
    }

    #[test]
    fn debug_names_the_kind() {
        let h = SelectorHandle::new(0x20).unwrap();
        assert_eq!(format!("{h:?}"), "SelectorHandle(0x20)");
        assert_eq!(h.to_string(), "0x20");
    }

    #[test]
    fn freed_values_are_reused_lifo() {
        let mut alloc = HandleAllocator::new(0x1000);
        let a = alloc.alloc();
        let b = alloc.alloc();
        assert_ne!(a, b);
        alloc.release(a);
        alloc.release(b);
        assert_eq!(alloc.alloc(), b);
        assert_eq!(alloc.alloc(), a);
        assert_eq!(alloc.alloc(), 0x1020);
    }
}
