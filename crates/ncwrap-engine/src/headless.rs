#![forbid(unsafe_code)]

//! In-memory back end and test monitor.
//!
//! [`HeadlessBackend`] has a fixed-size virtual terminal, an input queue fed
//! by the test, and a record of every presented frame. Build one with
//! [`SoftEngine::headless`] and keep the [`EngineMonitor`] from
//! [`SoftEngine::monitor`] to inspect the engine after it has been boxed
//! into a session.
//!
//! # Example
//!
//! ```
//! use ncwrap_engine::{Engine, InitOptions, SoftEngine};
//!
//! let mut engine = SoftEngine::headless(24, 80);
//! let monitor = engine.monitor();
//! engine.init(&InitOptions::default()).unwrap();
//! let std = engine.std_plane().unwrap();
//! engine.plane_putstr_yx(std, 0, 0, "hello").unwrap();
//! engine.render().unwrap();
//! assert_eq!(monitor.frame().row_text(0).trim_end(), "hello");
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use ncwrap_core::InputEvent;

use crate::frame::Frame;
use crate::handle::{PlaneHandle, SelectorHandle, VisualHandle};
use crate::options::InitOptions;
use crate::soft::{Backend, EngineStats, Model, SoftEngine};
use crate::InputReadiness;

#[derive(Debug, Default)]
struct HeadlessIo {
    rows: u32,
    cols: u32,
    queue: VecDeque<InputEvent>,
    closed: bool,
    started: bool,
    mice: bool,
    presented: Vec<Frame>,
}

/// Back end rendering into memory.
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    io: Rc<RefCell<HeadlessIo>>,
}

impl HeadlessBackend {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            io: Rc::new(RefCell::new(HeadlessIo {
                rows,
                cols,
                ..HeadlessIo::default()
            })),
        }
    }
}

impl Backend for HeadlessBackend {
    fn size(&self) -> io::Result<(u32, u32)> {
        let io = self.io.borrow();
        Ok((io.rows, io.cols))
    }

    fn start(&mut self, _options: &InitOptions) -> io::Result<()> {
        self.io.borrow_mut().started = true;
        Ok(())
    }

    fn present(&mut self, frame: &Frame, _cursor: Option<(u32, u32)>) -> io::Result<()> {
        self.io.borrow_mut().presented.push(frame.clone());
        Ok(())
    }

    fn invalidate(&mut self) {}

    fn set_mice(&mut self, enabled: bool) -> io::Result<()> {
        self.io.borrow_mut().mice = enabled;
        Ok(())
    }

    /// An empty queue with no timeout reports `Closed`: nothing can feed the
    /// queue while the caller is blocked on it.
    fn poll_input(&mut self, timeout: Option<Duration>) -> io::Result<InputReadiness> {
        let io = self.io.borrow();
        Ok(if !io.queue.is_empty() {
            InputReadiness::Ready
        } else if io.closed || timeout.is_none() {
            InputReadiness::Closed
        } else {
            InputReadiness::Idle
        })
    }

    fn read_input(&mut self) -> io::Result<Option<InputEvent>> {
        Ok(self.io.borrow_mut().queue.pop_front())
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.io.borrow_mut().started = false;
        Ok(())
    }
}

impl SoftEngine<HeadlessBackend> {
    /// A soft engine over a `rows` x `cols` in-memory terminal.
    pub fn headless(rows: u32, cols: u32) -> Self {
        Self::new(HeadlessBackend::new(rows, cols))
    }

    /// A handle for inspecting this engine from outside.
    pub fn monitor(&self) -> EngineMonitor {
        EngineMonitor {
            model: self.shared_model(),
            io: Rc::clone(&self.backend().io),
        }
    }
}

/// Read access to a headless soft engine, plus input injection.
///
/// Do not call the monitor from inside an engine call.
#[derive(Clone)]
pub struct EngineMonitor {
    model: Rc<RefCell<Model>>,
    io: Rc<RefCell<HeadlessIo>>,
}

impl EngineMonitor {
    pub fn stats(&self) -> EngineStats {
        self.model.borrow().stats
    }

    pub fn is_plane_live(&self, plane: PlaneHandle) -> bool {
        self.model.borrow().is_plane_live(plane)
    }

    pub fn is_selector_live(&self, selector: SelectorHandle) -> bool {
        self.model.borrow().is_selector_live(selector)
    }

    pub fn is_visual_live(&self, visual: VisualHandle) -> bool {
        self.model.borrow().visuals.contains_key(&visual)
    }

    /// Live planes including the standard plane.
    pub fn live_plane_count(&self) -> usize {
        self.model.borrow().live_plane_count()
    }

    /// The last rendered frame.
    pub fn frame(&self) -> Frame {
        self.model.borrow().frame.clone()
    }

    /// Every frame handed to the back end, oldest first.
    pub fn presented_frames(&self) -> Vec<Frame> {
        self.io.borrow().presented.clone()
    }

    pub fn is_started(&self) -> bool {
        self.io.borrow().started
    }

    pub fn mice_enabled(&self) -> bool {
        self.io.borrow().mice
    }

    pub fn push_input(&self, event: InputEvent) {
        self.io.borrow_mut().queue.push_back(event);
    }

    /// Mark input closed once the queue drains.
    pub fn close_input(&self) {
        self.io.borrow_mut().closed = true;
    }

    /// Change the terminal size and queue the resize notification.
    pub fn resize(&self, rows: u32, cols: u32) {
        let mut io = self.io.borrow_mut();
        io.rows = rows;
        io.cols = cols;
        io.queue.push_back(InputEvent::resize());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Engine;
    use crate::options::{PlaneOptions, SelectorItem, SelectorOptions};
    use ncwrap_core::{EventType, Key};

    fn started(rows: u32, cols: u32) -> (SoftEngine<HeadlessBackend>, EngineMonitor) {
        let mut engine = SoftEngine::headless(rows, cols);
        let monitor = engine.monitor();
        engine.init(&InitOptions::default()).unwrap();
        (engine, monitor)
    }

    #[test]
    fn lifecycle() {
        let (mut engine, monitor) = started(10, 20);
        assert!(monitor.is_started());
        assert_eq!(engine.term_dim_yx(), (10, 20));
        assert_eq!(monitor.live_plane_count(), 1);
        assert!(engine.init(&InitOptions::default()).is_err());
        engine.stop().unwrap();
        assert!(!monitor.is_started());
        assert_eq!(monitor.live_plane_count(), 0);
        assert!(engine.std_plane().is_err());
        assert!(engine.stop().is_err());
    }

    #[test]
    fn render_presents_frames() {
        let (mut engine, monitor) = started(2, 5);
        let std = engine.std_plane().unwrap();
        engine.plane_putstr_yx(std, 1, 0, "hi").unwrap();
        engine.render().unwrap();
        engine.refresh().unwrap();
        assert_eq!(monitor.frame().text(), "     \nhi   ");
        assert_eq!(monitor.presented_frames().len(), 2);
        assert_eq!(engine.at_yx(1, 1).map(|c| c.egc), Some("i".to_string()));
        assert_eq!(monitor.stats().renders, 1);
    }

    #[test]
    fn input_queue_and_readiness() {
        let (mut engine, monitor) = started(2, 5);
        let idle = Some(Duration::from_millis(0));
        assert_eq!(engine.input_ready(idle).unwrap(), InputReadiness::Idle);
        monitor.push_input(InputEvent::key('a'));
        assert_eq!(engine.input_ready(idle).unwrap(), InputReadiness::Ready);
        assert_eq!(engine.get_blocking().unwrap(), Some(InputEvent::key('a')));
        assert_eq!(engine.get_nonblocking().unwrap(), None);
        monitor.close_input();
        assert_eq!(engine.get_blocking().unwrap(), None);
    }

    #[test]
    fn mouse_events_respect_mice_setting() {
        let (mut engine, monitor) = started(2, 5);
        engine.mice_enable(false).unwrap();
        assert!(!monitor.mice_enabled());
        monitor.push_input(InputEvent::mouse(Key::Button(1), 0, 0, EventType::Press));
        monitor.push_input(InputEvent::key('x'));
        assert_eq!(engine.get_nonblocking().unwrap(), Some(InputEvent::key('x')));
    }

    #[test]
    fn resize_event_resizes_std_plane() {
        let (mut engine, monitor) = started(10, 20);
        monitor.resize(12, 30);
        let event = engine.get_nonblocking().unwrap().unwrap();
        assert_eq!(event.key, Key::Resize);
        let std = engine.std_plane().unwrap();
        assert_eq!(engine.plane_dim_yx(std), (12, 30));
    }

    #[test]
    fn selector_failure_destroys_plane() {
        let (mut engine, monitor) = started(3, 20);
        let std = engine.std_plane().unwrap();
        let plane = engine
            .plane_create(std, &PlaneOptions::new(0, 0, 1, 1))
            .unwrap();
        let options =
            SelectorOptions::default().with_items([SelectorItem::new("a", None), SelectorItem::new("b", None)]);
        assert!(engine.selector_create(plane, &options).is_err());
        assert!(!monitor.is_plane_live(plane));
        assert_eq!(monitor.stats().plane_destroys, 1);
    }
}
