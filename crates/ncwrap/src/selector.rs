#![forbid(unsafe_code)]

//! Selection menu widget.
//!
//! A [`Selector`] consumes the [`Plane`] it is drawn on. On success the
//! plane's ownership passes to the widget, which destroys it along with
//! itself; the wrapper is then invalidated.

use std::rc::{Rc, Weak};

use ncwrap_core::InputEvent;
use ncwrap_engine::{EngineError, SelectorHandle, SelectorItem, SelectorOptions};

use crate::error::SelectorError;
use crate::plane::{Owner, Plane};
use crate::session::SessionInner;

/// A native selector widget and the plane it owns.
pub struct Selector {
    session: Weak<SessionInner>,
    handle: SelectorHandle,
    plane: Plane,
}

fn first_duplicate(items: &[SelectorItem]) -> Option<&str> {
    items.iter().enumerate().find_map(|(i, item)| {
        items[..i]
            .iter()
            .any(|earlier| earlier.option == item.option)
            .then_some(item.option.as_str())
    })
}

impl Selector {
    /// Build a selector on `plane`.
    ///
    /// Duplicate option identifiers, and planes the caller does not own, are
    /// rejected before the engine sees them, handing the plane back in the
    /// error. If the engine refuses the widget it has already destroyed the
    /// plane, so the wrapper is invalidated.
    ///
    /// # Panics
    ///
    /// If `plane` is not valid.
    pub fn new(plane: Plane, options: &SelectorOptions) -> Result<Selector, SelectorError> {
        if let Some(option) = first_duplicate(&options.items) {
            return Err(SelectorError::DuplicateOption {
                option: option.to_string(),
                plane,
            });
        }
        let plane_handle = plane.handle();
        if plane.owner() != Owner::Wrapper {
            return Err(SelectorError::NotOwner {
                owner: plane.owner(),
                plane,
            });
        }
        let session = match plane.inner_session() {
            Some(session) => session,
            None => panic!("plane {plane_handle} outlived its session"),
        };
        let created = session
            .engine_mut()
            .selector_create(plane_handle, options);
        match created {
            Ok(handle) => {
                if let Err(err) = plane.hand_over(Owner::Selector(handle)) {
                    panic!("selector {handle} could not take plane {plane_handle}: {err}");
                }
                tracing::debug!(selector = %handle, plane = %plane_handle, "selector created");
                Ok(Selector {
                    session: Rc::downgrade(&session),
                    handle,
                    plane,
                })
            }
            Err(err) => {
                tracing::debug!(plane = %plane_handle, error = %err, "selector creation failed");
                plane.invalidate();
                Err(SelectorError::Engine(err))
            }
        }
    }

    pub fn handle(&self) -> SelectorHandle {
        self.handle
    }

    fn session(&self) -> Rc<SessionInner> {
        match self.session.upgrade() {
            Some(session) if !session.is_stopped() => session,
            _ => panic!("selector {} used after its session stopped", self.handle),
        }
    }

    /// The widget's plane, resolved through the identity cache: the same
    /// wrapper that was consumed.
    pub fn plane(&self) -> Plane {
        let session = self.session();
        let handle = session.engine().selector_plane(self.handle);
        session.wrap(handle)
    }

    pub fn add_item(&self, item: &SelectorItem) -> Result<(), EngineError> {
        self.session()
            .engine_mut()
            .selector_additem(self.handle, item)
    }

    pub fn delete_item(&self, option: &str) -> Result<(), EngineError> {
        self.session()
            .engine_mut()
            .selector_delitem(self.handle, option)
    }

    /// Select the previous item, returning the new selection.
    pub fn prev_item(&self) -> Option<String> {
        self.session().engine_mut().selector_previtem(self.handle)
    }

    /// Select the next item, returning the new selection.
    pub fn next_item(&self) -> Option<String> {
        self.session().engine_mut().selector_nextitem(self.handle)
    }

    pub fn selected(&self) -> Option<String> {
        self.session().engine().selector_selected(self.handle)
    }

    pub fn items(&self) -> Vec<SelectorItem> {
        self.session().engine().selector_items(self.handle)
    }

    /// Returns whether the widget consumed the event.
    pub fn offer_input(&self, event: &InputEvent) -> bool {
        self.session()
            .engine_mut()
            .selector_offer_input(self.handle, event)
    }
}

impl Drop for Selector {
    fn drop(&mut self) {
        if let Some(session) = self.session.upgrade().filter(|s| !s.is_stopped()) {
            match session.try_engine_mut() {
                Some(mut engine) => {
                    let selected = engine.selector_destroy(self.handle);
                    tracing::debug!(selector = %self.handle, ?selected, "selector destroyed");
                }
                None => {
                    tracing::warn!(selector = %self.handle, "engine busy during selector teardown");
                }
            }
        }
        self.plane.invalidate();
    }
}

impl std::fmt::Debug for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("handle", &self.handle)
            .field("plane", &self.plane)
            .finish()
    }
}
