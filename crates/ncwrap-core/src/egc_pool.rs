#![forbid(unsafe_code)]

//! Extended grapheme cluster pool.
//!
//! A [`Cell`](crate::cell::Cell) stores up to four UTF-8 bytes inline. Longer
//! clusters (ZWJ emoji, stacked combining marks) spill into the owning
//! plane's `EgcPool`, and the cell keeps a 24-bit slot index instead.
//!
//! - Reference counting: a slot lives while any cell refers to it
//! - Deduplication via hash lookup
//! - Slot reuse via free list
//!
//! # Usage
//!
//! ```
//! use ncwrap_core::egc_pool::EgcPool;
//!
//! let mut pool = EgcPool::new();
//! let id = pool.intern("👩‍🔬", 2);
//! assert_eq!(pool.get(id), Some("👩‍🔬"));
//! assert_eq!(pool.width(id), Some(2));
//!
//! pool.release(id);
//! assert_eq!(pool.get(id), None);
//! ```

use std::collections::HashMap;

/// Slot index of a spilled cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct EgcId(u32);

impl EgcId {
    /// Maximum slot index (24 bits).
    pub const MAX_SLOT: u32 = 0x00FF_FFFF;

    #[inline]
    pub const fn new(slot: u32) -> Self {
        debug_assert!(slot <= Self::MAX_SLOT, "slot overflow");
        Self(slot & Self::MAX_SLOT)
    }

    #[inline]
    pub const fn slot(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct EgcSlot {
    text: String,
    width: u8,
    refcount: u32,
}

/// A reference-counted pool for spilled grapheme clusters.
#[derive(Debug, Clone, Default)]
pub struct EgcPool {
    /// `None` marks a free slot.
    slots: Vec<Option<EgcSlot>>,
    lookup: HashMap<String, EgcId>,
    free_list: Vec<u32>,
}

impl EgcPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live clusters.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Intern a cluster and return its id.
    ///
    /// Interning text that is already present bumps its reference count and
    /// returns the existing id.
    ///
    /// # Panics
    ///
    /// Panics if the pool would exceed 2^24 slots.
    pub fn intern(&mut self, text: &str, width: u8) -> EgcId {
        if let Some(&id) = self.lookup.get(text) {
            self.retain(id);
            return id;
        }

        let slot_idx = self.alloc_slot();
        let id = EgcId::new(slot_idx);
        let slot = EgcSlot {
            text: text.to_string(),
            width,
            refcount: 1,
        };

        if (slot_idx as usize) < self.slots.len() {
            self.slots[slot_idx as usize] = Some(slot);
        } else {
            debug_assert_eq!(slot_idx as usize, self.slots.len());
            self.slots.push(Some(slot));
        }

        self.lookup.insert(text.to_string(), id);
        id
    }

    /// The text for an id, or `None` if it has been freed.
    pub fn get(&self, id: EgcId) -> Option<&str> {
        self.slot(id).map(|slot| slot.text.as_str())
    }

    /// The display width recorded at intern time.
    pub fn width(&self, id: EgcId) -> Option<u8> {
        self.slot(id).map(|slot| slot.width)
    }

    /// Call when a cell holding `id` is copied.
    pub fn retain(&mut self, id: EgcId) {
        if let Some(Some(slot)) = self.slots.get_mut(id.slot()) {
            slot.refcount = slot.refcount.saturating_add(1);
        }
    }

    /// Call when a cell holding `id` is overwritten or erased.
    ///
    /// The slot is freed when its count reaches zero.
    pub fn release(&mut self, id: EgcId) {
        let slot_idx = id.slot();
        if let Some(Some(slot)) = self.slots.get_mut(slot_idx) {
            slot.refcount = slot.refcount.saturating_sub(1);
            if slot.refcount == 0 {
                self.lookup.remove(&slot.text);
                self.slots[slot_idx] = None;
                self.free_list.push(slot_idx as u32);
            }
        }
    }

    /// Reference count, 0 if freed.
    pub fn refcount(&self, id: EgcId) -> u32 {
        self.slot(id).map(|slot| slot.refcount).unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.lookup.clear();
        self.free_list.clear();
    }

    fn slot(&self, id: EgcId) -> Option<&EgcSlot> {
        self.slots.get(id.slot()).and_then(|slot| slot.as_ref())
    }

    fn alloc_slot(&mut self) -> u32 {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.slots.len() as u32;
            assert!(idx <= EgcId::MAX_SLOT, "egc pool capacity exceeded");
            idx
        }
    }
}
