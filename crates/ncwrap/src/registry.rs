#![forbid(unsafe_code)]

//! Plane identity cache.
//!
//! Maps a native plane handle to a non-owning reference to the one wrapper
//! that stands for it. The registry never keeps a wrapper alive: when the
//! last [`Plane`] clone drops, its entry goes stale and is pruned, either by
//! the wrapper's own teardown or by the next lookup of that handle.
//!
//! Native handle values are reused after a plane is freed, so an entry is
//! only trusted if its wrapper is still alive and still bound to the same
//! handle.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use ncwrap_engine::PlaneHandle;

use crate::plane::{Plane, PlaneInner};

/// Session-scoped cache of live plane wrappers.
#[derive(Debug, Default)]
pub struct PlaneRegistry {
    entries: HashMap<PlaneHandle, Weak<PlaneInner>>,
}

impl PlaneRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Entries, including stale ones not yet pruned.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a live wrapper is registered for `handle`.
    pub fn contains(&self, handle: PlaneHandle) -> bool {
        self.entries
            .get(&handle)
            .and_then(Weak::upgrade)
            .is_some_and(|inner| inner.bound_to(handle))
    }

    /// The live wrapper for `handle`, pruning a stale entry.
    pub(crate) fn lookup(&mut self, handle: PlaneHandle) -> Option<Plane> {
        let entry = self.entries.get(&handle)?;
        match entry.upgrade() {
            Some(inner) if inner.bound_to(handle) => Some(Plane::from_inner(inner)),
            _ => {
                self.entries.remove(&handle);
                tracing::debug!(plane = %handle, "pruned stale identity cache entry");
                None
            }
        }
    }

    /// Register `plane` under `handle`, returning a live wrapper it displaced.
    pub(crate) fn insert(&mut self, handle: PlaneHandle, plane: &Plane) -> Option<Plane> {
        self.entries
            .insert(handle, Rc::downgrade(plane.inner()))
            .and_then(|old| old.upgrade())
            .filter(|old| !Rc::ptr_eq(old, plane.inner()) && old.bound_to(handle))
            .map(Plane::from_inner)
    }

    /// Remove the entry for `handle` if it refers to `plane`.
    pub(crate) fn remove(&mut self, handle: PlaneHandle, plane: &Rc<PlaneInner>) {
        if self
            .entries
            .get(&handle)
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), Rc::as_ptr(plane)))
        {
            self.entries.remove(&handle);
        }
    }

    /// Remove the entry for `handle` if its wrapper is gone.
    pub(crate) fn prune(&mut self, handle: PlaneHandle) {
        if self
            .entries
            .get(&handle)
            .is_some_and(|weak| weak.strong_count() == 0)
        {
            self.entries.remove(&handle);
        }
    }

    /// Empty the cache, returning every wrapper that was still alive.
    pub(crate) fn drain(&mut self) -> Vec<Plane> {
        self.entries
            .drain()
            .filter_map(|(_, weak)| weak.upgrade())
            .map(Plane::from_inner)
            .collect()
    }
}
