#![forbid(unsafe_code)]

//! Selection menu widget.
//!
//! The widget draws into a plane it owns:
//!
//! ```text
//!  title
//! ╭─secondary──────╮
//! │ opt1 desc one  │
//! │ opt2 desc two  │   <- selected row drawn with reversed channels
//! ╰─footer─────────╯
//! ```
//!
//! The plane is resized to fit on creation and whenever the item list
//! changes. If the widget cannot be built, the plane is destroyed.

use ncwrap_core::{Channels, EventType, InputEvent, Key, Style, str_width};

use super::model::Model;
use super::plane::PlaneState;
use crate::error::EngineError;
use crate::handle::{PlaneHandle, SelectorHandle};
use crate::options::{SelectorItem, SelectorOptions};

#[derive(Debug, Clone)]
pub(crate) struct SelectorState {
    pub(crate) plane: PlaneHandle,
    title: Option<String>,
    secondary: Option<String>,
    footer: Option<String>,
    items: Vec<SelectorItem>,
    selected: Option<usize>,
    /// First item shown.
    start: usize,
    max_display: usize,
    op_channels: Channels,
    desc_channels: Channels,
    title_channels: Channels,
    footer_channels: Channels,
    box_channels: Channels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    rows: u32,
    cols: u32,
    title_rows: u32,
    display: u32,
}

fn item_width(item: &SelectorItem) -> usize {
    str_width(&item.option) + item.desc.as_deref().map_or(0, |d| 1 + str_width(d))
}

impl SelectorState {
    fn new(plane: PlaneHandle, options: &SelectorOptions) -> Self {
        Self {
            plane,
            title: options.title.clone(),
            secondary: options.secondary.clone(),
            footer: options.footer.clone(),
            items: options.items.clone(),
            selected: (!options.items.is_empty()).then_some(options.default_index),
            start: 0,
            max_display: options.max_display,
            op_channels: options.op_channels,
            desc_channels: options.desc_channels,
            title_channels: options.title_channels,
            footer_channels: options.footer_channels,
            box_channels: options.box_channels,
        }
    }

    fn display_rows(&self) -> usize {
        let n = self.items.len();
        let shown = if self.max_display == 0 {
            n
        } else {
            n.min(self.max_display)
        };
        shown.max(1)
    }

    fn layout(&self) -> Layout {
        let width = |s: &Option<String>| s.as_deref().map_or(0, str_width);
        let inner = self
            .items
            .iter()
            .map(item_width)
            .chain([width(&self.secondary), width(&self.footer)])
            .max()
            .unwrap_or(0);
        let title_rows = u32::from(self.title.is_some());
        let display = self.display_rows() as u32;
        let cols = (inner + 4).max(width(&self.title) + 2).max(4) as u32;
        Layout {
            rows: title_rows + display + 2,
            cols,
            title_rows,
            display,
        }
    }

    pub(crate) fn selected_option(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.items.get(i))
            .map(|item| item.option.as_str())
    }

    pub(crate) fn items(&self) -> &[SelectorItem] {
        &self.items
    }

    /// Scroll so the selection is on screen.
    fn reveal(&mut self) {
        let display = self.display_rows();
        let Some(sel) = self.selected else {
            self.start = 0;
            return;
        };
        if sel < self.start {
            self.start = sel;
        } else if sel >= self.start + display {
            self.start = sel + 1 - display;
        }
        self.start = self.start.min(self.items.len().saturating_sub(display));
    }

    fn step(&mut self, forward: bool) -> Option<String> {
        let len = self.items.len();
        let sel = self.selected?;
        let next = if forward {
            (sel + 1) % len
        } else {
            (sel + len - 1) % len
        };
        self.selected = Some(next);
        self.reveal();
        self.selected_option().map(str::to_string)
    }

    fn draw(&self, plane: &mut PlaneState) -> Result<(), EngineError> {
        let layout = self.layout();
        plane.erase();
        if let Some(title) = &self.title {
            paint(plane, 0, 1, title, self.title_channels)?;
        }
        let top = layout.title_rows;
        let bottom = layout.rows - 1;
        plane.cursor_move(top as i32, 0)?;
        plane.rounded_box(Style::NONE, self.box_channels, bottom, layout.cols - 1, 0)?;
        if let Some(secondary) = &self.secondary {
            paint(plane, top, 2, secondary, self.title_channels)?;
        }
        if let Some(footer) = &self.footer {
            paint(plane, bottom, 2, footer, self.footer_channels)?;
        }

        let shown = self.items.iter().enumerate().skip(self.start);
        for (row, (idx, item)) in shown.take(layout.display as usize).enumerate() {
            let y = top + 1 + row as u32;
            let (op, desc) = if self.selected == Some(idx) {
                (self.op_channels.reverse(), self.desc_channels.reverse())
            } else {
                (self.op_channels, self.desc_channels)
            };
            if self.selected == Some(idx) {
                let fill = " ".repeat(layout.cols as usize - 2);
                paint(plane, y, 1, &fill, op)?;
            }
            let used = paint(plane, y, 2, &item.option, op)?;
            if let Some(d) = &item.desc {
                paint(plane, y, 3 + used, d, desc)?;
            }
        }
        Ok(())
    }

    /// Item index under plane-local `(y, x)`, if any.
    fn item_at(&self, y: i32, x: i32) -> Option<usize> {
        let layout = self.layout();
        let first = (layout.title_rows + 1) as i32;
        if y < first || y >= first + layout.display as i32 || x < 1 || x >= layout.cols as i32 - 1 {
            return None;
        }
        let idx = self.start + (y - first) as usize;
        (idx < self.items.len()).then_some(idx)
    }
}

/// Write `text` with explicit channels, leaving the plane's own colours.
fn paint(
    plane: &mut PlaneState,
    y: u32,
    x: u32,
    text: &str,
    channels: Channels,
) -> Result<u32, EngineError> {
    let saved = (plane.channels, plane.styles);
    plane.channels = channels;
    plane.styles = Style::NONE;
    let written = plane.put_str(y as i32, x as i32, text, false);
    (plane.channels, plane.styles) = saved;
    written
}

impl Model {
    fn selector(&self, handle: SelectorHandle) -> &SelectorState {
        match self.selectors.get(&handle) {
            Some(sel) => sel,
            None => panic!("dangling selector handle {handle}"),
        }
    }

    fn selector_mut(&mut self, handle: SelectorHandle) -> &mut SelectorState {
        match self.selectors.get_mut(&handle) {
            Some(sel) => sel,
            None => panic!("dangling selector handle {handle}"),
        }
    }

    pub(crate) fn is_selector_live(&self, handle: SelectorHandle) -> bool {
        self.selectors.contains_key(&handle)
    }

    /// Check that `state` fits on screen, then size its plane and draw.
    fn fit_selector(&mut self, state: &SelectorState) -> Result<(), EngineError> {
        let layout = state.layout();
        let (avail_rows, avail_cols) = self.plane(self.std_plane()?).dim_yx();
        if layout.rows > avail_rows || layout.cols > avail_cols {
            return Err(EngineError::Geometry {
                rows: layout.rows,
                cols: layout.cols,
                avail_rows,
                avail_cols,
            });
        }
        self.resize_plane(state.plane, layout.rows, layout.cols)?;
        state.draw(self.plane_mut(state.plane))
    }

    fn build_selector(
        &mut self,
        plane: PlaneHandle,
        options: &SelectorOptions,
    ) -> Result<SelectorState, EngineError> {
        self.ensure_running()?;
        if plane == self.std_plane()? {
            return Err(EngineError::StdPlane);
        }
        if !options.items.is_empty() && options.default_index >= options.items.len() {
            return Err(EngineError::invalid(format!(
                "default index {} out of range for {} items",
                options.default_index,
                options.items.len()
            )));
        }
        for (i, item) in options.items.iter().enumerate() {
            if options.items[..i].iter().any(|o| o.option == item.option) {
                return Err(EngineError::invalid(format!(
                    "duplicate option {:?}",
                    item.option
                )));
            }
        }
        let mut state = SelectorState::new(plane, options);
        state.reveal();
        self.fit_selector(&state)?;
        Ok(state)
    }

    /// Build a selector on `plane`. On failure the plane is destroyed.
    pub(crate) fn create_selector(
        &mut self,
        plane: PlaneHandle,
        options: &SelectorOptions,
    ) -> Result<SelectorHandle, EngineError> {
        match self.build_selector(plane, options) {
            Ok(state) => {
                let handle = self.alloc_selector();
                self.selectors.insert(handle, state);
                self.stats.selector_creates += 1;
                tracing::trace!(selector = %handle, %plane, "soft selector created");
                Ok(handle)
            }
            Err(err) => {
                if self.is_plane_live(plane) && self.destroy_plane(plane).is_err() {
                    tracing::warn!(%plane, "could not destroy plane of failed selector");
                }
                Err(err)
            }
        }
    }

    /// Destroy the widget and its plane, returning the final selection.
    pub(crate) fn destroy_selector(&mut self, handle: SelectorHandle) -> Option<String> {
        let Some(state) = self.selectors.remove(&handle) else {
            panic!("dangling selector handle {handle}");
        };
        if self.is_plane_live(state.plane) && self.destroy_plane(state.plane).is_err() {
            tracing::warn!(plane = %state.plane, "selector plane could not be destroyed");
        }
        self.release_selector(handle);
        self.stats.selector_destroys += 1;
        state.selected_option().map(str::to_string)
    }

    pub(crate) fn selector_plane(&self, handle: SelectorHandle) -> PlaneHandle {
        self.selector(handle).plane
    }

    pub(crate) fn selector_selected(&self, handle: SelectorHandle) -> Option<String> {
        self.selector(handle).selected_option().map(str::to_string)
    }

    pub(crate) fn selector_items(&self, handle: SelectorHandle) -> Vec<SelectorItem> {
        self.selector(handle).items().to_vec()
    }

    fn redraw_selector(&mut self, handle: SelectorHandle) -> Result<(), EngineError> {
        let state = self.selector(handle).clone();
        self.fit_selector(&state)
    }

    pub(crate) fn selector_add_item(
        &mut self,
        handle: SelectorHandle,
        item: &SelectorItem,
    ) -> Result<(), EngineError> {
        let state = self.selector_mut(handle);
        if state.items.iter().any(|o| o.option == item.option) {
            return Err(EngineError::invalid(format!(
                "duplicate option {:?}",
                item.option
            )));
        }
        let previous = state.clone();
        state.items.push(item.clone());
        if state.selected.is_none() {
            state.selected = Some(0);
        }
        if let Err(err) = self.redraw_selector(handle) {
            self.selectors.insert(handle, previous);
            self.redraw_selector(handle)?;
            return Err(err);
        }
        Ok(())
    }

    pub(crate) fn selector_del_item(
        &mut self,
        handle: SelectorHandle,
        option: &str,
    ) -> Result<(), EngineError> {
        let state = self.selector_mut(handle);
        let Some(pos) = state.items.iter().position(|o| o.option == option) else {
            return Err(EngineError::invalid(format!("no option {option:?}")));
        };
        state.items.remove(pos);
        let len = state.items.len();
        state.selected = match state.selected {
            _ if len == 0 => None,
            Some(sel) if sel > pos => Some(sel - 1),
            Some(sel) => Some(sel.min(len - 1)),
            None => None,
        };
        state.reveal();
        self.redraw_selector(handle)
    }

    pub(crate) fn selector_step(
        &mut self,
        handle: SelectorHandle,
        forward: bool,
    ) -> Option<String> {
        let selected = self.selector_mut(handle).step(forward);
        if let Err(err) = self.redraw_selector(handle) {
            tracing::warn!(selector = %handle, error = %err, "selector redraw failed");
        }
        selected
    }

    /// Offer an input event; returns whether the widget consumed it.
    pub(crate) fn selector_offer_input(
        &mut self,
        handle: SelectorHandle,
        event: &InputEvent,
    ) -> bool {
        if event.evtype == EventType::Release || self.selector(handle).items.is_empty() {
            return false;
        }
        match event.key {
            Key::Up | Key::SCROLL_UP => {
                self.selector_step(handle, false);
                true
            }
            Key::Down | Key::SCROLL_DOWN => {
                self.selector_step(handle, true);
                true
            }
            Key::Button(1) => {
                let (py, px) = self.abs_yx(self.selector_plane(handle));
                let Some(idx) = self.selector(handle).item_at(event.y - py, event.x - px) else {
                    return false;
                };
                self.selector_mut(handle).selected = Some(idx);
                if let Err(err) = self.redraw_selector(handle) {
                    tracing::warn!(selector = %handle, error = %err, "selector redraw failed");
                }
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{InitOptions, PlaneOptions};

    fn setup(rows: u32, cols: u32) -> (Model, PlaneHandle) {
        let mut model = Model::new();
        model.start((rows, cols), &InitOptions::default());
        let std = model.std_plane().unwrap();
        let plane = model
            .create_plane(std, &PlaneOptions::new(1, 1, 1, 1))
            .unwrap();
        (model, plane)
    }

    fn options() -> SelectorOptions {
        SelectorOptions::default()
            .with_title("pick")
            .with_footer("esc")
            .with_items([
                SelectorItem::new("one", Some("first")),
                SelectorItem::new("two", None),
                SelectorItem::new("three", Some("third")),
            ])
    }

    #[test]
    fn lays_out_and_draws() {
        let (mut m, plane) = setup(24, 80);
        let sel = m.create_selector(plane, &options()).unwrap();
        assert_eq!(m.plane(plane).dim_yx(), (6, 15));
        let frame = m.compose();
        assert_eq!(frame.row_text(1).trim_end(), "  pick");
        assert_eq!(frame.row_text(2).trim_end(), " ╭─────────────╮");
        assert_eq!(frame.row_text(3).trim_end(), " │ one first   │");
        assert_eq!(frame.row_text(4).trim_end(), " │ two         │");
        assert_eq!(frame.row_text(6).trim_end(), " ╰─esc─────────╯");
        assert_eq!(m.selector_selected(sel).as_deref(), Some("one"));
    }

    #[test]
    fn navigation_wraps() {
        let (mut m, plane) = setup(24, 80);
        let sel = m.create_selector(plane, &options()).unwrap();
        assert_eq!(m.selector_step(sel, false).as_deref(), Some("three"));
        assert_eq!(m.selector_step(sel, true).as_deref(), Some("one"));
        assert_eq!(m.selector_step(sel, true).as_deref(), Some("two"));
    }

    #[test]
    fn too_large_destroys_plane() {
        let (mut m, plane) = setup(4, 80);
        let err = m.create_selector(plane, &options()).unwrap_err();
        assert!(matches!(err, EngineError::Geometry { rows: 6, .. }));
        assert!(!m.is_plane_live(plane));
    }

    #[test]
    fn bad_default_index_destroys_plane() {
        let (mut m, plane) = setup(24, 80);
        let err = m
            .create_selector(plane, &options().with_default_index(3))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
        assert!(!m.is_plane_live(plane));
    }

    #[test]
    fn add_and_delete_items() {
        let (mut m, plane) = setup(24, 80);
        let sel = m
            .create_selector(plane, &SelectorOptions::default())
            .unwrap();
        assert_eq!(m.selector_selected(sel), None);
        m.selector_add_item(sel, &SelectorItem::new("a", None)).unwrap();
        assert_eq!(m.selector_selected(sel).as_deref(), Some("a"));
        assert!(m.selector_add_item(sel, &SelectorItem::new("a", None)).is_err());
        m.selector_add_item(sel, &SelectorItem::new("b", None)).unwrap();
        m.selector_step(sel, true);
        m.selector_del_item(sel, "b").unwrap();
        assert_eq!(m.selector_selected(sel).as_deref(), Some("a"));
        assert!(m.selector_del_item(sel, "zzz").is_err());
        m.selector_del_item(sel, "a").unwrap();
        assert_eq!(m.selector_selected(sel), None);
    }

    #[test]
    fn max_display_scrolls() {
        let (mut m, plane) = setup(24, 80);
        let sel = m
            .create_selector(plane, &options().with_max_display(2))
            .unwrap();
        m.selector_step(sel, false);
        let frame = m.compose();
        assert!(frame.row_text(3).contains("two"));
        assert!(frame.row_text(4).contains("three"));
    }

    #[test]
    fn mouse_click_selects_row() {
        let (mut m, plane) = setup(24, 80);
        let sel = m.create_selector(plane, &options()).unwrap();
        let click = InputEvent::mouse(Key::Button(1), 5, 4, EventType::Press);
        assert!(m.selector_offer_input(sel, &click));
        assert_eq!(m.selector_selected(sel).as_deref(), Some("three"));
        let release = click.clone().with_type(EventType::Release);
        assert!(!m.selector_offer_input(sel, &release));
        let outside = InputEvent::mouse(Key::Button(1), 20, 40, EventType::Press);
        assert!(!m.selector_offer_input(sel, &outside));
        assert!(!m.selector_offer_input(sel, &InputEvent::key('q')));
    }

    #[test]
    fn destroy_takes_the_plane() {
        let (mut m, plane) = setup(24, 80);
        let sel = m.create_selector(plane, &options()).unwrap();
        m.selector_step(sel, true);
        assert_eq!(m.destroy_selector(sel).as_deref(), Some("two"));
        assert!(!m.is_plane_live(plane));
        assert!(!m.is_selector_live(sel));
    }
}
