#![forbid(unsafe_code)]

//! The soft engine's resource tables, plane tree and compositor.
//!
//! # Design Notes
//!
//! - The z-order is one list for the whole pile, bottom first
//! - Destroying a plane reparents its children to its parent and keeps
//!   their absolute positions
//! - A handle that names nothing is a caller bug and panics
//!
//! # Compositing
//!
//! Each terminal cell is resolved top-down through the z-order. The glyph
//! comes from the topmost plane with a non-empty cluster. Colours walk the
//! same stack per half: transparent is skipped, blend is accumulated and
//! averaged with whatever lies beneath, opaque terminates. The walk ends at
//! the first plane whose background terminates, so an opaque plane hides
//! the glyphs below it. A high-contrast foreground becomes black or white
//! depending on the luma of the resolved background.

use std::collections::HashMap;

use ncwrap_core::{Align, Alpha, Channel, Channels, Color, Style};

use super::EngineStats;
use super::plane::{PlaneMargins, PlaneState};
use super::selector::SelectorState;
use super::visual::VisualState;
use crate::error::EngineError;
use crate::frame::{CellView, Frame};
use crate::handle::{HandleAllocator, PlaneHandle, SelectorHandle, VisualHandle};
use crate::options::{InitOptions, Margins, PlaneFlags, PlaneOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    Uninit,
    Running,
    Stopped,
}

pub(crate) struct Model {
    planes: HashMap<PlaneHandle, PlaneState>,
    /// Bottom to top.
    zorder: Vec<PlaneHandle>,
    std: Option<PlaneHandle>,
    pub(crate) selectors: HashMap<SelectorHandle, SelectorState>,
    pub(crate) visuals: HashMap<VisualHandle, VisualState>,
    plane_ids: HandleAllocator,
    selector_ids: HandleAllocator,
    visual_ids: HandleAllocator,
    pub(crate) frame: Frame,
    pub(crate) stats: EngineStats,
    pub(crate) cursor: Option<(u32, u32)>,
    pub(crate) mice: bool,
    pub(crate) lifecycle: Lifecycle,
    margins: Margins,
    term: (u32, u32),
}

fn fresh<H>(ids: &mut HandleAllocator, make: fn(u64) -> Option<H>) -> H {
    make(ids.alloc()).unwrap_or_else(|| unreachable!("handle allocator yielded zero"))
}

impl PlaneMargins {
    /// Size of a marginalized plane inside a parent of the given size.
    fn fit(&self, (rows, cols): (u32, u32)) -> Option<(u32, u32)> {
        let r = rows.checked_sub(self.top + self.bottom)?;
        let c = cols.checked_sub(self.left + self.right)?;
        (r > 0 && c > 0).then_some((r, c))
    }
}

impl Model {
    pub(crate) fn new() -> Self {
        Self {
            planes: HashMap::new(),
            zorder: Vec::new(),
            std: None,
            selectors: HashMap::new(),
            visuals: HashMap::new(),
            plane_ids: HandleAllocator::new(0x5500_0000_1000),
            selector_ids: HandleAllocator::new(0x5500_0001_0000),
            visual_ids: HandleAllocator::new(0x5500_0002_0000),
            frame: Frame::new(0, 0),
            stats: EngineStats::default(),
            cursor: None,
            mice: false,
            lifecycle: Lifecycle::Uninit,
            margins: Margins::default(),
            term: (0, 0),
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub(crate) fn start(&mut self, (rows, cols): (u32, u32), options: &InitOptions) {
        self.margins = options.margins;
        self.mice = options.mice;
        self.term = (rows, cols);
        self.frame = Frame::new(rows, cols);
        let (srows, scols) = self.std_dims();
        let handle = fresh(&mut self.plane_ids, PlaneHandle::new);
        let mut std = PlaneState::new(
            handle,
            None,
            (self.margins.top as i32, self.margins.left as i32),
            (srows, scols),
            PlaneFlags::empty(),
        );
        std.name = Some("std".to_string());
        self.planes.insert(handle, std);
        self.zorder.push(handle);
        self.std = Some(handle);
        self.lifecycle = Lifecycle::Running;
    }

    pub(crate) fn ensure_running(&self) -> Result<(), EngineError> {
        match self.lifecycle {
            Lifecycle::Uninit => Err(EngineError::NotInitialized),
            Lifecycle::Running => Ok(()),
            Lifecycle::Stopped => Err(EngineError::Stopped),
        }
    }

    /// Release every resource. Handles issued so far are never reissued.
    pub(crate) fn stop(&mut self) {
        self.selectors.clear();
        self.visuals.clear();
        self.planes.clear();
        self.zorder.clear();
        self.std = None;
        self.cursor = None;
        self.lifecycle = Lifecycle::Stopped;
    }

    pub(crate) fn term_dims(&self) -> (u32, u32) {
        self.term
    }

    fn std_dims(&self) -> (u32, u32) {
        let m = self.margins;
        let rows = self.term.0.saturating_sub(m.top + m.bottom).max(1);
        let cols = self.term.1.saturating_sub(m.left + m.right).max(1);
        (rows, cols)
    }

    pub(crate) fn std_plane(&self) -> Result<PlaneHandle, EngineError> {
        self.ensure_running()?;
        self.std.ok_or(EngineError::NotInitialized)
    }

    /// Adopt a new terminal size, resizing the standard plane.
    pub(crate) fn resize_terminal(&mut self, rows: u32, cols: u32) -> Result<(), EngineError> {
        self.term = (rows, cols);
        let std = self.std_plane()?;
        let (srows, scols) = self.std_dims();
        self.resize_plane(std, srows, scols)
    }

    // -----------------------------------------------------------------------
    // Plane table
    // -----------------------------------------------------------------------

    pub(crate) fn is_plane_live(&self, handle: PlaneHandle) -> bool {
        self.planes.contains_key(&handle)
    }

    pub(crate) fn live_plane_count(&self) -> usize {
        self.planes.len()
    }

    pub(crate) fn plane(&self, handle: PlaneHandle) -> &PlaneState {
        match self.planes.get(&handle) {
            Some(plane) => plane,
            None => panic!("dangling plane handle {handle}"),
        }
    }

    pub(crate) fn plane_mut(&mut self, handle: PlaneHandle) -> &mut PlaneState {
        match self.planes.get_mut(&handle) {
            Some(plane) => plane,
            None => panic!("dangling plane handle {handle}"),
        }
    }

    pub(crate) fn create_plane(
        &mut self,
        parent: PlaneHandle,
        options: &PlaneOptions,
    ) -> Result<PlaneHandle, EngineError> {
        self.ensure_running()?;
        let pdims = self.plane(parent).dim_yx();
        let flags = options.flags;

        let (rows, cols, margins) = if flags.contains(PlaneFlags::MARGINALIZED) {
            let margins = PlaneMargins {
                top: options.y.max(0) as u32,
                left: options.x.max(0) as u32,
                bottom: options.margin_b,
                right: options.margin_r,
            };
            let (rows, cols) = margins.fit(pdims).ok_or_else(|| {
                EngineError::invalid(format!("margins {margins:?} leave no room in {pdims:?}"))
            })?;
            (rows, cols, Some(margins))
        } else {
            if options.rows == 0 || options.cols == 0 {
                return Err(EngineError::invalid(format!(
                    "plane size {}x{} is empty",
                    options.rows, options.cols
                )));
            }
            (options.rows, options.cols, None)
        };

        let aligned = |raw: i32, avail: u32, len: u32| {
            Align::from_raw(raw.max(0) as u32)
                .offset(avail, len)
                .unwrap_or(0) as i32
        };
        let y = if flags.contains(PlaneFlags::VERALIGNED) && margins.is_none() {
            aligned(options.y, pdims.0, rows)
        } else {
            options.y
        };
        let x = if flags.contains(PlaneFlags::HORALIGNED) && margins.is_none() {
            aligned(options.x, pdims.1, cols)
        } else {
            options.x
        };

        let handle = fresh(&mut self.plane_ids, PlaneHandle::new);
        let mut plane = PlaneState::new(handle, Some(parent), (y, x), (rows, cols), flags);
        plane.name = options.name.clone();
        plane.margins = margins;
        self.planes.insert(handle, plane);
        self.plane_mut(parent).children.push(handle);
        self.zorder.push(handle);
        self.stats.plane_creates += 1;
        tracing::trace!(%handle, %parent, rows, cols, y, x, "soft plane created");
        Ok(handle)
    }

    pub(crate) fn destroy_plane(&mut self, handle: PlaneHandle) -> Result<(), EngineError> {
        if self.std == Some(handle) {
            return Err(EngineError::StdPlane);
        }
        let Some(plane) = self.planes.remove(&handle) else {
            panic!("dangling plane handle {handle}");
        };
        if let Some(p) = plane.parent.and_then(|parent| self.planes.get_mut(&parent)) {
            p.children.retain(|&c| c != handle);
        }
        for &child in &plane.children {
            let c = self.plane_mut(child);
            c.parent = plane.parent;
            c.y += plane.y;
            c.x += plane.x;
        }
        if let Some(p) = plane.parent.and_then(|parent| self.planes.get_mut(&parent)) {
            p.children.extend_from_slice(&plane.children);
        }
        self.zorder.retain(|&h| h != handle);
        self.selectors.retain(|sh, sel| {
            let bound = sel.plane == handle;
            if bound {
                tracing::warn!(selector = %sh, plane = %handle, "selector lost its plane");
            }
            !bound
        });
        self.plane_ids.release(handle.get());
        self.stats.plane_destroys += 1;
        tracing::trace!(%handle, "soft plane destroyed");
        Ok(())
    }

    /// Position relative to the terminal origin.
    pub(crate) fn abs_yx(&self, handle: PlaneHandle) -> (i32, i32) {
        let mut plane = self.plane(handle);
        let (mut y, mut x) = (plane.y, plane.x);
        while let Some(parent) = plane.parent {
            plane = self.plane(parent);
            y += plane.y;
            x += plane.x;
        }
        (y, x)
    }

    pub(crate) fn move_top(&mut self, handle: PlaneHandle) {
        self.zorder.retain(|&h| h != handle);
        self.zorder.push(handle);
    }

    pub(crate) fn move_bottom(&mut self, handle: PlaneHandle) {
        self.zorder.retain(|&h| h != handle);
        self.zorder.insert(0, handle);
    }

    pub(crate) fn resize_plane(
        &mut self,
        handle: PlaneHandle,
        rows: u32,
        cols: u32,
    ) -> Result<(), EngineError> {
        self.plane_mut(handle).resize(rows, cols)?;
        self.relayout_children(handle);
        Ok(())
    }

    /// Refit a marginalized plane to its parent.
    pub(crate) fn resize_marginalized(&mut self, handle: PlaneHandle) -> Result<(), EngineError> {
        let plane = self.plane(handle);
        let (Some(margins), Some(parent)) = (plane.margins, plane.parent) else {
            return Err(EngineError::invalid(format!(
                "plane {handle} is not marginalized"
            )));
        };
        let pdims = self.plane(parent).dim_yx();
        let (rows, cols) = margins.fit(pdims).unwrap_or((1, 1));
        self.resize_plane(handle, rows, cols)
    }

    /// Run a text operation on `handle`, then carry its children along
    /// with any rows it scrolled. `FIXED` children stay where they are.
    pub(crate) fn write_text<T>(
        &mut self,
        handle: PlaneHandle,
        op: impl FnOnce(&mut PlaneState) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let plane = self.plane_mut(handle);
        let out = op(plane);
        let scrolled = plane.take_scrolled() as i32;
        if scrolled > 0 {
            let children = self.plane(handle).children.clone();
            for child in children {
                let c = self.plane_mut(child);
                if !c.flags.contains(PlaneFlags::FIXED) {
                    c.y -= scrolled;
                }
            }
        }
        out
    }

    fn relayout_children(&mut self, handle: PlaneHandle) {
        let pdims = self.plane(handle).dim_yx();
        let children = self.plane(handle).children.clone();
        for child in children {
            let Some(margins) = self.plane(child).margins else {
                continue;
            };
            let (rows, cols) = margins.fit(pdims).unwrap_or((1, 1));
            if self.plane_mut(child).resize(rows, cols).is_ok() {
                self.relayout_children(child);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Widgets and visuals
    // -----------------------------------------------------------------------

    pub(crate) fn alloc_selector(&mut self) -> SelectorHandle {
        fresh(&mut self.selector_ids, SelectorHandle::new)
    }

    pub(crate) fn release_selector(&mut self, handle: SelectorHandle) {
        self.selector_ids.release(handle.get());
    }

    pub(crate) fn alloc_visual(&mut self) -> VisualHandle {
        fresh(&mut self.visual_ids, VisualHandle::new)
    }

    pub(crate) fn release_visual(&mut self, handle: VisualHandle) {
        self.visual_ids.release(handle.get());
    }

    // -----------------------------------------------------------------------
    // Compositing
    // -----------------------------------------------------------------------

    /// Composite the pile into a frame of the terminal's size.
    pub(crate) fn compose(&self) -> Frame {
        let (rows, cols) = self.term;
        let mut frame = Frame::new(rows, cols);
        let stack: Vec<(&PlaneState, (i32, i32))> = self
            .zorder
            .iter()
            .rev()
            .map(|&h| (self.plane(h), self.abs_yx(h)))
            .collect();
        for ty in 0..rows {
            for tx in 0..cols {
                frame.set(ty, tx, resolve(&stack, ty as i32, tx as i32));
            }
            repair_wide(&mut frame, ty);
        }
        frame
    }
}

/// Colour resolution state for one half of a cell.
#[derive(Default)]
struct HalfStack {
    blends: Vec<Color>,
    base: Option<Color>,
    done: bool,
    contrast: bool,
}

impl HalfStack {
    fn push(&mut self, ch: Channel) {
        if self.done {
            return;
        }
        match ch.alpha() {
            Alpha::Transparent => {}
            Alpha::Blend => {
                if !ch.is_default() {
                    self.blends.push(ch.rgb());
                }
            }
            Alpha::Opaque => {
                self.base = (!ch.is_default()).then(|| ch.rgb());
                self.done = true;
            }
            Alpha::HighContrast => {
                self.contrast = true;
                self.done = true;
            }
        }
    }

    fn fold(&self) -> Option<Color> {
        self.blends.iter().rev().fold(self.base, |acc, &c| {
            Some(match acc {
                Some(below) => c.average(below),
                None => c,
            })
        })
    }
}

fn resolve(stack: &[(&PlaneState, (i32, i32))], ty: i32, tx: i32) -> CellView {
    let mut glyph: Option<CellView> = None;
    let mut fg = HalfStack::default();
    let mut bg = HalfStack::default();
    for (plane, (py, px)) in stack {
        let (y, x) = (ty - py, tx - px);
        let (rows, cols) = plane.dim_yx();
        if y < 0 || x < 0 || y >= rows as i32 || x >= cols as i32 {
            continue;
        }
        let cell = plane.visible(y as u32, x as u32);
        if glyph.is_none() && (!cell.egc.is_empty() || cell.is_continuation()) {
            glyph = Some(cell.clone());
        }
        fg.push(cell.channels.fg_channel());
        bg.push(cell.channels.bg_channel());
        if bg.done {
            break;
        }
    }

    let bg_color = bg.fold();
    let fg_color = if fg.contrast {
        let luma = bg_color.map_or(0, Color::luma);
        Some(if luma > 127 { Color::BLACK } else { Color::WHITE })
    } else {
        fg.fold()
    };
    let channel = |c: Option<Color>| c.map_or(Channel::DEFAULT, Channel::from_color);
    let channels = Channels::combine(channel(fg_color), channel(bg_color));

    match glyph {
        Some(g) => CellView { channels, ..g },
        None => CellView {
            styles: Style::NONE,
            channels,
            ..CellView::blank()
        },
    }
}

/// Blank out wide-glyph halves whose partner was covered by another plane.
fn repair_wide(frame: &mut Frame, y: u32) {
    let cols = frame.cols();
    for x in 0..cols {
        let Some(cell) = frame.get(y, x) else { continue };
        let orphan = if cell.is_continuation() {
            x == 0
                || frame
                    .get(y, x - 1)
                    .is_none_or(|left| left.width != 2 || left.is_continuation())
        } else if cell.width == 2 {
            frame.get(y, x + 1).is_none_or(|right| !right.is_continuation())
        } else {
            false
        };
        if orphan {
            let channels = cell.channels;
            frame.set(
                y,
                x,
                CellView {
                    channels,
                    ..CellView::blank()
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(rows: u32, cols: u32) -> Model {
        let mut model = Model::new();
        model.start((rows, cols), &InitOptions::default());
        model
    }

    fn child(model: &mut Model, parent: PlaneHandle, y: i32, x: i32, r: u32, c: u32) -> PlaneHandle {
        model
            .create_plane(parent, &PlaneOptions::new(y, x, r, c))
            .unwrap()
    }

    #[test]
    fn create_before_start_fails() {
        let model = Model::new();
        assert!(matches!(model.std_plane(), Err(EngineError::NotInitialized)));
    }

    #[test]
    fn children_are_positioned_relative_to_parent() {
        let mut m = running(24, 80);
        let std = m.std_plane().unwrap();
        let a = child(&mut m, std, 2, 3, 10, 10);
        let b = child(&mut m, a, 1, 1, 2, 2);
        assert_eq!(m.abs_yx(b), (3, 4));
    }

    #[test]
    fn destroy_reparents_children_in_place() {
        let mut m = running(24, 80);
        let std = m.std_plane().unwrap();
        let a = child(&mut m, std, 2, 3, 10, 10);
        let b = child(&mut m, a, 1, 1, 2, 2);
        m.destroy_plane(a).unwrap();
        assert!(!m.is_plane_live(a));
        assert_eq!(m.plane(b).parent, Some(std));
        assert_eq!(m.abs_yx(b), (3, 4));
        assert!(matches!(m.destroy_plane(std), Err(EngineError::StdPlane)));
    }

    #[test]
    fn freed_plane_handles_are_reused() {
        let mut m = running(24, 80);
        let std = m.std_plane().unwrap();
        let a = child(&mut m, std, 0, 0, 1, 1);
        m.destroy_plane(a).unwrap();
        let b = child(&mut m, std, 0, 0, 1, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn marginalized_planes_track_parent_size() {
        let mut m = running(24, 80);
        let std = m.std_plane().unwrap();
        let p = m
            .create_plane(std, &PlaneOptions::marginalized(1, 2, 3, 4))
            .unwrap();
        assert_eq!(m.plane(p).dim_yx(), (20, 74));
        m.resize_terminal(30, 100).unwrap();
        assert_eq!(m.plane(p).dim_yx(), (26, 94));
        assert!(
            m.create_plane(std, &PlaneOptions::marginalized(20, 0, 10, 0))
                .is_err()
        );
    }

    #[test]
    fn children_follow_a_scrolling_parent_unless_fixed() {
        let mut m = running(10, 10);
        let std = m.std_plane().unwrap();
        let host = child(&mut m, std, 2, 0, 3, 4);
        m.plane_mut(host).scrolling = true;
        let loose = child(&mut m, host, 2, 0, 1, 1);
        let pinned = m
            .create_plane(
                host,
                &PlaneOptions::new(2, 1, 1, 1).with_flags(PlaneFlags::FIXED),
            )
            .unwrap();

        let written = m
            .write_text(host, |p| p.put_str(2, 0, "abcdefgh", false))
            .unwrap();
        assert_eq!(written, 8);
        assert_eq!((m.plane(loose).y, m.plane(loose).x), (1, 0));
        assert_eq!((m.plane(pinned).y, m.plane(pinned).x), (2, 1));

        m.write_text(host, |p| p.scroll_up(1)).unwrap();
        assert_eq!(m.plane(loose).y, 0);
        assert_eq!(m.plane(pinned).y, 2);
        assert_eq!(m.abs_yx(loose), (2, 0));
    }

    #[test]
    fn aligned_placement() {
        let mut m = running(24, 80);
        let std = m.std_plane().unwrap();
        let opts = PlaneOptions::new(0, 0, 4, 20)
            .aligned_x(Align::Center)
            .aligned_y(Align::Right);
        let p = m.create_plane(std, &opts).unwrap();
        assert_eq!(m.abs_yx(p), (20, 30));
    }

    #[test]
    fn opaque_plane_occludes_lower_glyphs() {
        let mut m = running(2, 4);
        let std = m.std_plane().unwrap();
        m.plane_mut(std).put_str(0, 0, "abcd", false).unwrap();
        let top = child(&mut m, std, 0, 1, 1, 2);
        m.plane_mut(top).put_str(0, 0, "x", false).unwrap();
        assert_eq!(m.compose().row_text(0), "ax d");
    }

    #[test]
    fn transparent_plane_shows_lower_glyphs() {
        let mut m = running(1, 4);
        let std = m.std_plane().unwrap();
        m.plane_mut(std).put_str(0, 0, "abcd", false).unwrap();
        let top = child(&mut m, std, 0, 0, 1, 4);
        let clear = Channels::pack(Color::BLACK, Alpha::Transparent, Color::BLACK, Alpha::Transparent);
        m.plane_mut(top).set_base("", Style::NONE, clear).unwrap();
        m.plane_mut(top).put_str(0, 2, "Z", false).unwrap();
        assert_eq!(m.compose().row_text(0), "abZd");
    }

    #[test]
    fn blend_averages_with_background() {
        let mut m = running(1, 1);
        let std = m.std_plane().unwrap();
        m.plane_mut(std)
            .set_base(" ", Style::NONE, Channels::from_colors(Color::WHITE, Color::BLACK))
            .unwrap();
        let top = child(&mut m, std, 0, 0, 1, 1);
        let red_blend = Channels::pack(Color::RED, Alpha::Blend, Color::RED, Alpha::Blend);
        m.plane_mut(top).set_base(" ", Style::NONE, red_blend).unwrap();
        let cell = m.compose().get(0, 0).cloned().unwrap();
        assert_eq!(cell.channels.bg_rgb(), Color::RED.average(Color::BLACK));
    }

    #[test]
    fn high_contrast_foreground_follows_background_luma() {
        let mut m = running(1, 2);
        let std = m.std_plane().unwrap();
        let mut light = Channels::from_colors(Color::RED, Color::WHITE);
        light.set_fg_alpha(Alpha::HighContrast);
        let mut dark = Channels::from_colors(Color::RED, Color::BLACK);
        dark.set_fg_alpha(Alpha::HighContrast);
        m.plane_mut(std).channels = light;
        m.plane_mut(std).put_str(0, 0, "a", false).unwrap();
        m.plane_mut(std).channels = dark;
        m.plane_mut(std).put_str(0, 1, "b", false).unwrap();
        let frame = m.compose();
        assert_eq!(frame.get(0, 0).unwrap().channels.fg_rgb(), Color::BLACK);
        assert_eq!(frame.get(0, 1).unwrap().channels.fg_rgb(), Color::WHITE);
    }

    #[test]
    fn covered_wide_glyph_half_is_blanked() {
        let mut m = running(1, 4);
        let std = m.std_plane().unwrap();
        m.plane_mut(std).put_str(0, 0, "中", false).unwrap();
        let top = child(&mut m, std, 0, 1, 1, 1);
        m.plane_mut(top).put_str(0, 0, "x", false).unwrap();
        assert_eq!(m.compose().row_text(0), " x  ");
    }

    #[test]
    fn z_order_moves() {
        let mut m = running(1, 2);
        let std = m.std_plane().unwrap();
        let a = child(&mut m, std, 0, 0, 1, 1);
        let b = child(&mut m, std, 0, 0, 1, 1);
        m.plane_mut(a).put_str(0, 0, "a", false).unwrap();
        m.plane_mut(b).put_str(0, 0, "b", false).unwrap();
        assert_eq!(m.compose().row_text(0), "b ");
        m.move_top(a);
        assert_eq!(m.compose().row_text(0), "a ");
        m.move_bottom(a);
        assert_eq!(m.compose().row_text(0), "b ");
    }

    #[test]
    fn stop_releases_everything() {
        let mut m = running(4, 4);
        let std = m.std_plane().unwrap();
        child(&mut m, std, 0, 0, 1, 1);
        m.stop();
        assert_eq!(m.live_plane_count(), 0);
        assert!(matches!(m.std_plane(), Err(EngineError::Stopped)));
    }
}
