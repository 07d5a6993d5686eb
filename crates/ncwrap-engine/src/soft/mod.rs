#![forbid(unsafe_code)]

//! In-process implementation of [`Engine`].
//!
//! [`SoftEngine`] keeps the whole pile in memory and composites it on
//! `render`. Everything that touches a device is behind [`Backend`]: frame
//! presentation, input, mouse reporting and the terminal size.

mod model;
mod plane;
mod selector;
mod visual;

use std::cell::{Ref, RefCell, RefMut};
use std::io;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use ncwrap_core::{Align, Alpha, Cell, Channel, Channels, Color, InputEvent, Key, Style};

pub(crate) use model::Model;

use crate::error::EngineError;
use crate::frame::{CellView, Frame};
use crate::handle::{PlaneHandle, SelectorHandle, VisualHandle};
use crate::options::{BlitOptions, InitOptions, PlaneOptions, SelectorItem, SelectorOptions};
use crate::{Engine, InputReadiness, Result};

/// The device side of a [`SoftEngine`].
pub trait Backend {
    /// Current terminal size as `(rows, cols)`.
    fn size(&self) -> io::Result<(u32, u32)>;
    /// Take over the device.
    fn start(&mut self, options: &InitOptions) -> io::Result<()>;
    /// Show a composited frame.
    fn present(&mut self, frame: &Frame, cursor: Option<(u32, u32)>) -> io::Result<()>;
    /// Forget what is on screen so the next present repaints everything.
    fn invalidate(&mut self);
    fn set_mice(&mut self, enabled: bool) -> io::Result<()>;
    fn poll_input(&mut self, timeout: Option<Duration>) -> io::Result<InputReadiness>;
    /// The next queued event, without blocking.
    fn read_input(&mut self) -> io::Result<Option<InputEvent>>;
    /// Restore the device. Called once, from [`Engine::stop`].
    fn shutdown(&mut self) -> io::Result<()>;

    fn can_open_images(&self) -> bool {
        true
    }
}

/// Call counts for resource-creating and -destroying entry points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Planes created, excluding the standard plane.
    pub plane_creates: u64,
    pub plane_destroys: u64,
    pub selector_creates: u64,
    pub selector_destroys: u64,
    pub visual_creates: u64,
    pub visual_destroys: u64,
    pub blits: u64,
    pub renders: u64,
}

/// The soft engine over a back end `B`.
pub struct SoftEngine<B: Backend> {
    model: Rc<RefCell<Model>>,
    backend: B,
}

impl<B: Backend> SoftEngine<B> {
    pub fn new(backend: B) -> Self {
        Self {
            model: Rc::new(RefCell::new(Model::new())),
            backend,
        }
    }

    pub fn stats(&self) -> EngineStats {
        self.m().stats
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub(crate) fn shared_model(&self) -> Rc<RefCell<Model>> {
        Rc::clone(&self.model)
    }

    fn m(&self) -> Ref<'_, Model> {
        self.model.borrow()
    }

    fn mm(&self) -> RefMut<'_, Model> {
        self.model.borrow_mut()
    }

    /// Apply an event's side effects; `None` if it is filtered out.
    fn accept(&mut self, event: InputEvent) -> Result<Option<InputEvent>> {
        if event.key == Key::Resize {
            let (rows, cols) = self.backend.size()?;
            self.mm().resize_terminal(rows, cols)?;
            tracing::debug!(rows, cols, "terminal resized");
        } else if event.key.is_mouse() && !self.m().mice {
            return Ok(None);
        }
        Ok(Some(event))
    }
}

impl<B: Backend> Engine for SoftEngine<B> {
    fn init(&mut self, options: &InitOptions) -> Result<()> {
        if self.m().lifecycle != model::Lifecycle::Uninit {
            return Err(EngineError::invalid("engine already initialized"));
        }
        self.backend.start(options)?;
        let (rows, cols) = self.backend.size()?;
        self.mm().start((rows, cols), options);
        self.backend.set_mice(options.mice)?;
        tracing::debug!(rows, cols, flags = ?options.flags, "soft engine started");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let lifecycle = self.m().lifecycle;
        match lifecycle {
            model::Lifecycle::Stopped => Err(EngineError::Stopped),
            model::Lifecycle::Uninit => {
                self.mm().stop();
                Ok(())
            }
            model::Lifecycle::Running => {
                self.mm().stop();
                self.backend.shutdown()?;
                tracing::debug!("soft engine stopped");
                Ok(())
            }
        }
    }

    fn std_plane(&self) -> Result<PlaneHandle> {
        self.m().std_plane()
    }

    fn term_dim_yx(&self) -> (u32, u32) {
        self.m().term_dims()
    }

    fn render(&mut self) -> Result<()> {
        self.m().ensure_running()?;
        let frame = self.m().compose();
        let cursor = self.m().cursor;
        self.backend.present(&frame, cursor)?;
        let mut m = self.mm();
        m.frame = frame;
        m.stats.renders += 1;
        Ok(())
    }

    fn refresh(&mut self) -> Result<(u32, u32)> {
        self.m().ensure_running()?;
        self.backend.invalidate();
        let m = self.model.borrow();
        self.backend.present(&m.frame, m.cursor)?;
        Ok(m.term_dims())
    }

    fn at_yx(&self, y: u32, x: u32) -> Option<CellView> {
        self.m().frame.get(y, x).cloned()
    }

    fn cursor_enable(&mut self, y: u32, x: u32) -> Result<()> {
        let mut m = self.mm();
        m.ensure_running()?;
        let (rows, cols) = m.term_dims();
        if y >= rows || x >= cols {
            return Err(EngineError::invalid(format!(
                "cursor ({y}, {x}) outside {rows}x{cols} terminal"
            )));
        }
        m.cursor = Some((y, x));
        Ok(())
    }

    fn cursor_disable(&mut self) -> Result<()> {
        let mut m = self.mm();
        m.ensure_running()?;
        m.cursor = None;
        Ok(())
    }

    fn cursor_yx(&self) -> Option<(u32, u32)> {
        self.m().cursor
    }

    fn mice_enable(&mut self, enabled: bool) -> Result<()> {
        self.m().ensure_running()?;
        self.backend.set_mice(enabled)?;
        self.mm().mice = enabled;
        Ok(())
    }

    fn can_open_images(&self) -> bool {
        self.backend.can_open_images()
    }

    fn str_width(&self, text: &str) -> usize {
        ncwrap_core::str_width(text)
    }

    fn get_blocking(&mut self) -> Result<Option<InputEvent>> {
        loop {
            match self.input_ready(None)? {
                InputReadiness::Closed => return Ok(None),
                InputReadiness::Idle => {}
                InputReadiness::Ready => {
                    if let Some(event) = self.get_nonblocking()? {
                        return Ok(Some(event));
                    }
                }
            }
        }
    }

    fn get_nonblocking(&mut self) -> Result<Option<InputEvent>> {
        self.m().ensure_running()?;
        while let Some(event) = self.backend.read_input()? {
            if let Some(event) = self.accept(event)? {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    fn input_ready(&mut self, timeout: Option<Duration>) -> Result<InputReadiness> {
        self.m().ensure_running()?;
        Ok(self.backend.poll_input(timeout)?)
    }

    // --- planes ------------------------------------------------------------

    fn plane_create(&mut self, parent: PlaneHandle, options: &PlaneOptions) -> Result<PlaneHandle> {
        self.mm().create_plane(parent, options)
    }

    fn plane_destroy(&mut self, plane: PlaneHandle) -> Result<()> {
        self.mm().destroy_plane(plane)
    }

    fn plane_parent(&self, plane: PlaneHandle) -> Option<PlaneHandle> {
        self.m().plane(plane).parent
    }

    fn plane_name(&self, plane: PlaneHandle) -> Option<String> {
        self.m().plane(plane).name.clone()
    }

    fn plane_yx(&self, plane: PlaneHandle) -> (i32, i32) {
        let m = self.m();
        let p = m.plane(plane);
        (p.y, p.x)
    }

    fn plane_abs_yx(&self, plane: PlaneHandle) -> (i32, i32) {
        self.m().abs_yx(plane)
    }

    fn plane_dim_yx(&self, plane: PlaneHandle) -> (u32, u32) {
        self.m().plane(plane).dim_yx()
    }

    fn plane_cursor_yx(&self, plane: PlaneHandle) -> (u32, u32) {
        self.m().plane(plane).cursor_yx()
    }

    fn plane_cursor_move_yx(&mut self, plane: PlaneHandle, y: i32, x: i32) -> Result<()> {
        self.mm().plane_mut(plane).cursor_move(y, x)
    }

    fn plane_move_yx(&mut self, plane: PlaneHandle, y: i32, x: i32) -> Result<()> {
        let mut m = self.mm();
        if m.std_plane()? == plane {
            return Err(EngineError::StdPlane);
        }
        let p = m.plane_mut(plane);
        p.y = y;
        p.x = x;
        Ok(())
    }

    fn plane_move_top(&mut self, plane: PlaneHandle) {
        self.mm().move_top(plane);
    }

    fn plane_move_bottom(&mut self, plane: PlaneHandle) {
        self.mm().move_bottom(plane);
    }

    fn plane_resize_simple(&mut self, plane: PlaneHandle, rows: u32, cols: u32) -> Result<()> {
        self.mm().resize_plane(plane, rows, cols)
    }

    fn plane_resize_marginalized(&mut self, plane: PlaneHandle) -> Result<()> {
        self.mm().resize_marginalized(plane)
    }

    fn plane_channels(&self, plane: PlaneHandle) -> Channels {
        self.m().plane(plane).channels
    }

    fn plane_set_channels(&mut self, plane: PlaneHandle, channels: Channels) {
        self.mm().plane_mut(plane).channels = channels;
    }

    fn plane_styles(&self, plane: PlaneHandle) -> Style {
        self.m().plane(plane).styles
    }

    fn plane_set_styles(&mut self, plane: PlaneHandle, styles: Style) {
        self.mm().plane_mut(plane).styles = styles;
    }

    fn plane_set_fg_rgb(&mut self, plane: PlaneHandle, color: Color) {
        self.mm().plane_mut(plane).channels.set_fg_rgb(color);
    }

    fn plane_set_bg_rgb(&mut self, plane: PlaneHandle, color: Color) {
        self.mm().plane_mut(plane).channels.set_bg_rgb(color);
    }

    fn plane_set_fg_alpha(&mut self, plane: PlaneHandle, alpha: Alpha) -> Result<()> {
        self.mm().plane_mut(plane).set_fg_alpha(alpha);
        Ok(())
    }

    fn plane_set_bg_alpha(&mut self, plane: PlaneHandle, alpha: Alpha) -> Result<()> {
        self.mm().plane_mut(plane).set_bg_alpha(alpha)
    }

    fn plane_set_base(
        &mut self,
        plane: PlaneHandle,
        egc: &str,
        styles: Style,
        channels: Channels,
    ) -> Result<()> {
        self.mm().plane_mut(plane).set_base(egc, styles, channels)
    }

    fn plane_set_base_cell(&mut self, plane: PlaneHandle, cell: &Cell) -> Result<()> {
        self.mm().plane_mut(plane).set_base_cell(cell)
    }

    fn plane_base(&self, plane: PlaneHandle) -> CellView {
        self.m().plane(plane).base()
    }

    fn plane_at_yx(&self, plane: PlaneHandle, y: u32, x: u32) -> Option<CellView> {
        self.m().plane(plane).at(y, x)
    }

    fn plane_erase(&mut self, plane: PlaneHandle) {
        self.mm().plane_mut(plane).erase();
    }

    fn plane_erase_region(
        &mut self,
        plane: PlaneHandle,
        y: i32,
        x: i32,
        ylen: i32,
        xlen: i32,
    ) -> Result<()> {
        self.mm().plane_mut(plane).erase_region(y, x, ylen, xlen)
    }

    fn plane_putstr_yx(&mut self, plane: PlaneHandle, y: i32, x: i32, text: &str) -> Result<u32> {
        self.mm()
            .write_text(plane, |p| p.put_str(y, x, text, false))
    }

    fn plane_putstr_aligned(
        &mut self,
        plane: PlaneHandle,
        y: i32,
        align: Align,
        text: &str,
    ) -> Result<u32> {
        self.mm()
            .write_text(plane, |p| p.put_str_aligned(y, align, text))
    }

    fn plane_putstr_stained(&mut self, plane: PlaneHandle, text: &str) -> Result<u32> {
        self.mm()
            .write_text(plane, |p| p.put_str(-1, -1, text, true))
    }

    fn plane_rounded_box(
        &mut self,
        plane: PlaneHandle,
        styles: Style,
        channels: Channels,
        ystop: u32,
        xstop: u32,
        ctlword: u32,
    ) -> Result<()> {
        self.mm()
            .plane_mut(plane)
            .rounded_box(styles, channels, ystop, xstop, ctlword)
    }

    fn plane_gradient(
        &mut self,
        plane: PlaneHandle,
        y: i32,
        x: i32,
        ylen: u32,
        xlen: u32,
        egc: &str,
        styles: Style,
        corners: [Channels; 4],
    ) -> Result<u32> {
        self.mm()
            .plane_mut(plane)
            .gradient(y, x, ylen, xlen, egc, styles, corners)
    }

    fn plane_gradient2x1(
        &mut self,
        plane: PlaneHandle,
        y: i32,
        x: i32,
        ylen: u32,
        xlen: u32,
        corners: [Channel; 4],
    ) -> Result<u32> {
        self.mm()
            .plane_mut(plane)
            .gradient2x1(y, x, ylen, xlen, corners)
    }

    fn plane_scrolling(&self, plane: PlaneHandle) -> bool {
        self.m().plane(plane).scrolling
    }

    fn plane_set_scrolling(&mut self, plane: PlaneHandle, scrolling: bool) -> bool {
        std::mem::replace(&mut self.mm().plane_mut(plane).scrolling, scrolling)
    }

    fn plane_scrollup(&mut self, plane: PlaneHandle, rows: u32) -> Result<()> {
        self.mm().write_text(plane, |p| p.scroll_up(rows))
    }

    fn plane_greyscale(&mut self, plane: PlaneHandle) {
        self.mm().plane_mut(plane).greyscale();
    }

    // --- selector ----------------------------------------------------------

    fn selector_create(
        &mut self,
        plane: PlaneHandle,
        options: &SelectorOptions,
    ) -> Result<SelectorHandle> {
        self.mm().create_selector(plane, options)
    }

    fn selector_destroy(&mut self, selector: SelectorHandle) -> Option<String> {
        self.mm().destroy_selector(selector)
    }

    fn selector_plane(&self, selector: SelectorHandle) -> PlaneHandle {
        self.m().selector_plane(selector)
    }

    fn selector_additem(&mut self, selector: SelectorHandle, item: &SelectorItem) -> Result<()> {
        self.mm().selector_add_item(selector, item)
    }

    fn selector_delitem(&mut self, selector: SelectorHandle, option: &str) -> Result<()> {
        self.mm().selector_del_item(selector, option)
    }

    fn selector_previtem(&mut self, selector: SelectorHandle) -> Option<String> {
        self.mm().selector_step(selector, false)
    }

    fn selector_nextitem(&mut self, selector: SelectorHandle) -> Option<String> {
        self.mm().selector_step(selector, true)
    }

    fn selector_selected(&self, selector: SelectorHandle) -> Option<String> {
        self.m().selector_selected(selector)
    }

    fn selector_items(&self, selector: SelectorHandle) -> Vec<SelectorItem> {
        self.m().selector_items(selector)
    }

    fn selector_offer_input(&mut self, selector: SelectorHandle, event: &InputEvent) -> bool {
        self.mm().selector_offer_input(selector, event)
    }

    // --- visuals -----------------------------------------------------------

    fn visual_from_file(&mut self, path: &Path) -> Result<VisualHandle> {
        self.mm().load_visual_file(path)
    }

    fn visual_from_rgba(&mut self, rows: u32, cols: u32, rgba: &[u8]) -> Result<VisualHandle> {
        self.mm().load_visual_rgba(rows, cols, rgba)
    }

    fn visual_dim_yx(&self, visual: VisualHandle) -> (u32, u32) {
        self.m().visual_dims(visual)
    }

    fn visual_blit(&mut self, visual: VisualHandle, options: &BlitOptions) -> Result<PlaneHandle> {
        self.mm().blit(visual, options)
    }

    fn visual_destroy(&mut self, visual: VisualHandle) {
        self.mm().destroy_visual(visual);
    }
}
