#![forbid(unsafe_code)]

//! Real-terminal back end.
//!
//! [`TerminalBackend`] puts the terminal in raw mode (plus the alternate
//! screen and mouse capture unless disabled), presents frames as diffs
//! against the previous frame, and translates `crossterm` events into
//! [`InputEvent`]s.
//!
//! # Cleanup
//!
//! Terminal state is restored on `shutdown`, on drop, from a panic hook,
//! and on SIGINT/SIGTERM. Features are disabled in reverse order of
//! enabling; raw mode goes last.
//!
//! # Resize
//!
//! SIGWINCH and crossterm's resize events both set one pending flag, which
//! is reported as a single [`Key::Resize`] input.
//!
//! # Direct mode
//!
//! [`TerminalSink`] is the direct-mode device: output goes inline at the
//! terminal cursor, with no raw mode and no alternate screen.

use std::collections::VecDeque;
use std::io::{self, BufWriter, Write};
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use ncwrap_core::{Channel, Channels, EventType, InputEvent, Key, Modifiers, Style};

#[cfg(unix)]
use signal_hook::consts::signal::{SIGINT, SIGTERM, SIGWINCH};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::direct::DirectSink;
use crate::frame::{CellView, Frame};
use crate::options::{InitFlags, InitOptions};
use crate::soft::Backend;
use crate::InputReadiness;

/// Longest single wait inside `poll_input`, so a pending resize is noticed.
const POLL_SLICE: Duration = Duration::from_millis(50);

const BUFFER_CAPACITY: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Presenter
// ---------------------------------------------------------------------------

/// State-tracked ANSI emission of frame diffs.
pub(crate) struct Presenter<W: Write> {
    writer: BufWriter<W>,
    current: Option<(Channels, Style)>,
    cursor: Option<(u32, u32)>,
}

fn sgr_channel<W: Write>(w: &mut W, ch: Channel, ground: u8) -> io::Result<()> {
    if ch.is_default() {
        return Ok(());
    }
    match ch.palette_index() {
        Some(idx) => write!(w, "\x1b[{ground}8;5;{idx}m"),
        None => write!(w, "\x1b[{ground}8;2;{};{};{}m", ch.r(), ch.g(), ch.b()),
    }
}

fn sgr_styles<W: Write>(w: &mut W, styles: Style) -> io::Result<()> {
    for style in styles.iter() {
        let code = match style {
            Style::BOLD => "1",
            Style::ITALIC => "3",
            Style::UNDERLINE => "4",
            Style::UNDERCURL => "4:3",
            Style::STRUCK => "9",
            _ => continue,
        };
        write!(w, "\x1b[{code}m")?;
    }
    Ok(())
}

impl<W: Write> Presenter<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(BUFFER_CAPACITY, writer),
            current: None,
            cursor: None,
        }
    }

    /// Emit the cells of `frame` that differ from `prev`.
    pub(crate) fn present(
        &mut self,
        frame: &Frame,
        prev: Option<&Frame>,
        cursor: Option<(u32, u32)>,
    ) -> io::Result<()> {
        self.writer.write_all(b"\x1b[?25l")?;
        for run in frame.diff_runs(prev) {
            for x in run.x0..=run.x1 {
                let Some(cell) = frame.get(run.y, x) else {
                    continue;
                };
                if cell.is_continuation() {
                    continue;
                }
                self.move_to(run.y, x)?;
                self.emit_cell(cell)?;
            }
        }
        self.writer.write_all(b"\x1b[0m")?;
        self.current = None;
        if let Some((y, x)) = cursor {
            self.move_to(y, x)?;
            self.writer.write_all(b"\x1b[?25h")?;
        }
        tracing::trace!("frame presented");
        self.writer.flush()
    }

    fn emit_cell(&mut self, cell: &CellView) -> io::Result<()> {
        let style = (cell.channels, cell.styles);
        if self.current != Some(style) {
            self.writer.write_all(b"\x1b[0m")?;
            sgr_channel(&mut self.writer, cell.channels.fg_channel(), 3)?;
            sgr_channel(&mut self.writer, cell.channels.bg_channel(), 4)?;
            sgr_styles(&mut self.writer, cell.styles)?;
            self.current = Some(style);
        }
        if cell.egc.is_empty() {
            self.writer.write_all(b" ")?;
        } else {
            self.writer.write_all(cell.egc.as_bytes())?;
        }
        if let Some((y, x)) = self.cursor {
            self.cursor = Some((y, x + u32::from(cell.width.max(1))));
        }
        Ok(())
    }

    fn move_to(&mut self, y: u32, x: u32) -> io::Result<()> {
        if self.cursor == Some((y, x)) {
            return Ok(());
        }
        write!(self.writer, "\x1b[{};{}H", y + 1, x + 1)?;
        self.cursor = Some((y, x));
        Ok(())
    }

    /// Forget tracked state; the terminal is in an unknown state.
    pub(crate) fn reset(&mut self) {
        self.current = None;
        self.cursor = None;
    }

    #[cfg(test)]
    fn into_inner(self) -> io::Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| io::Error::other(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Back end
// ---------------------------------------------------------------------------

/// Back end driving the process's controlling terminal.
pub struct TerminalBackend {
    presenter: Presenter<io::Stdout>,
    previous: Option<Frame>,
    pending: VecDeque<InputEvent>,
    resize_pending: Arc<AtomicBool>,
    raw_mode: bool,
    alternate_screen: bool,
    mouse: bool,
    drain_input: bool,
    #[cfg(unix)]
    signal_guard: Option<SignalGuard>,
}

impl TerminalBackend {
    pub fn new() -> Self {
        Self {
            presenter: Presenter::new(io::stdout()),
            previous: None,
            pending: VecDeque::new(),
            resize_pending: Arc::new(AtomicBool::new(false)),
            raw_mode: false,
            alternate_screen: false,
            mouse: false,
            drain_input: false,
            #[cfg(unix)]
            signal_guard: None,
        }
    }

    fn cleanup(&mut self) {
        #[cfg(unix)]
        let _ = self.signal_guard.take();

        let mut stdout = io::stdout();
        if self.mouse {
            let _ = crossterm::execute!(stdout, crossterm::event::DisableMouseCapture);
            self.mouse = false;
            tracing::debug!("mouse capture disabled");
        }
        let _ = crossterm::execute!(stdout, crossterm::style::ResetColor, crossterm::cursor::Show);
        if self.alternate_screen {
            let _ = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
            self.alternate_screen = false;
            tracing::debug!("alternate screen disabled");
        }
        if self.drain_input {
            while crossterm::event::poll(Duration::ZERO).unwrap_or(false) {
                if crossterm::event::read().is_err() {
                    break;
                }
            }
        }
        if self.raw_mode {
            let _ = crossterm::terminal::disable_raw_mode();
            self.raw_mode = false;
            tracing::debug!("terminal raw mode disabled");
        }
        let _ = stdout.flush();
    }

    fn enqueue(&mut self, event: crossterm::event::Event) {
        if let crossterm::event::Event::Resize(..) = event {
            self.resize_pending.store(true, Ordering::Relaxed);
        } else if let Some(event) = map_crossterm_event(event) {
            self.pending.push_back(event);
        }
    }
}

impl Default for TerminalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TerminalBackend {
    fn drop(&mut self) {
        self.cleanup();
    }
}

impl Backend for TerminalBackend {
    fn size(&self) -> io::Result<(u32, u32)> {
        let (cols, rows) = crossterm::terminal::size()?;
        Ok((u32::from(rows), u32::from(cols)))
    }

    fn start(&mut self, options: &InitOptions) -> io::Result<()> {
        install_panic_hook();
        crossterm::terminal::enable_raw_mode()?;
        self.raw_mode = true;
        tracing::debug!("terminal raw mode enabled");

        #[cfg(unix)]
        {
            let quit = !options.flags.contains(InitFlags::NO_QUIT_SIGHANDLERS);
            let winch = !options.flags.contains(InitFlags::NO_WINCH_SIGHANDLER);
            self.signal_guard = SignalGuard::new(quit, winch, Arc::clone(&self.resize_pending))?;
        }

        let mut stdout = io::stdout();
        if !options.flags.contains(InitFlags::NO_ALTERNATE_SCREEN) {
            crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
            self.alternate_screen = true;
            tracing::debug!("alternate screen enabled");
        }
        crossterm::execute!(
            stdout,
            crossterm::cursor::Hide,
            crossterm::terminal::Clear(crossterm::terminal::ClearType::All)
        )?;
        self.drain_input = options.flags.contains(InitFlags::DRAIN_INPUT);
        self.presenter.reset();
        self.previous = None;
        Ok(())
    }

    fn present(&mut self, frame: &Frame, cursor: Option<(u32, u32)>) -> io::Result<()> {
        self.presenter.present(frame, self.previous.as_ref(), cursor)?;
        self.previous = Some(frame.clone());
        Ok(())
    }

    fn invalidate(&mut self) {
        self.presenter.reset();
        self.previous = None;
    }

    fn set_mice(&mut self, enabled: bool) -> io::Result<()> {
        if enabled == self.mouse {
            return Ok(());
        }
        let mut stdout = io::stdout();
        if enabled {
            crossterm::execute!(stdout, crossterm::event::EnableMouseCapture)?;
        } else {
            crossterm::execute!(stdout, crossterm::event::DisableMouseCapture)?;
        }
        self.mouse = enabled;
        tracing::debug!(enabled, "mouse capture toggled");
        Ok(())
    }

    fn poll_input(&mut self, timeout: Option<Duration>) -> io::Result<InputReadiness> {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if !self.pending.is_empty() || self.resize_pending.load(Ordering::Relaxed) {
                return Ok(InputReadiness::Ready);
            }
            let slice = deadline.map_or(POLL_SLICE, |d| {
                d.saturating_duration_since(Instant::now()).min(POLL_SLICE)
            });
            if crossterm::event::poll(slice)? {
                let event = crossterm::event::read()?;
                self.enqueue(event);
                continue;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(InputReadiness::Idle);
            }
        }
    }

    fn read_input(&mut self) -> io::Result<Option<InputEvent>> {
        if self.resize_pending.swap(false, Ordering::Relaxed) {
            return Ok(Some(InputEvent::resize()));
        }
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }
        while crossterm::event::poll(Duration::ZERO)? {
            let event = crossterm::event::read()?;
            self.enqueue(event);
            if let Some(event) = self.read_pending() {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.cleanup();
        Ok(())
    }
}

impl TerminalBackend {
    fn read_pending(&mut self) -> Option<InputEvent> {
        if self.resize_pending.swap(false, Ordering::Relaxed) {
            return Some(InputEvent::resize());
        }
        self.pending.pop_front()
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

fn best_effort_cleanup() {
    let mut stdout = io::stdout();
    let _ = crossterm::execute!(stdout, crossterm::event::DisableMouseCapture);
    let _ = crossterm::execute!(stdout, crossterm::style::ResetColor, crossterm::cursor::Show);
    let _ = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
    let _ = crossterm::terminal::disable_raw_mode();
    let _ = stdout.flush();
}

#[cfg(unix)]
struct SignalGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl SignalGuard {
    fn new(quit: bool, winch: bool, resize: Arc<AtomicBool>) -> io::Result<Option<Self>> {
        let mut wanted = Vec::new();
        if quit {
            wanted.extend([SIGINT, SIGTERM]);
        }
        if winch {
            wanted.push(SIGWINCH);
        }
        if wanted.is_empty() {
            return Ok(None);
        }
        let mut signals = Signals::new(&wanted)?;
        let handle = signals.handle();
        let thread = std::thread::spawn(move || {
            for signal in signals.forever() {
                match signal {
                    SIGWINCH => {
                        resize.store(true, Ordering::Relaxed);
                        tracing::debug!("SIGWINCH received");
                    }
                    SIGINT | SIGTERM => {
                        tracing::warn!("termination signal received, cleaning up");
                        best_effort_cleanup();
                        std::process::exit(128 + signal);
                    }
                    _ => {}
                }
            }
        });
        Ok(Some(Self {
            handle,
            thread: Some(thread),
        }))
    }
}

#[cfg(unix)]
impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// ---------------------------------------------------------------------------
// Direct mode
// ---------------------------------------------------------------------------

/// Cluster-at-a-time ANSI emission for direct mode.
pub(crate) struct DirectWriter<W: Write> {
    writer: BufWriter<W>,
    current: Option<(Channels, Style)>,
    cursor: Option<(u32, u32)>,
}

impl<W: Write> DirectWriter<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(BUFFER_CAPACITY, writer),
            current: None,
            cursor: None,
        }
    }

    pub(crate) fn put(
        &mut self,
        y: u32,
        x: u32,
        egc: &str,
        width: u8,
        channels: Channels,
        styles: Style,
    ) -> io::Result<()> {
        self.move_to(y, x)?;
        if self.current != Some((channels, styles)) {
            self.writer.write_all(b"\x1b[0m")?;
            sgr_channel(&mut self.writer, channels.fg_channel(), 3)?;
            sgr_channel(&mut self.writer, channels.bg_channel(), 4)?;
            sgr_styles(&mut self.writer, styles)?;
            self.current = Some((channels, styles));
        }
        self.writer.write_all(egc.as_bytes())?;
        self.cursor = Some((y, x + u32::from(width.max(1))));
        Ok(())
    }

    pub(crate) fn move_to(&mut self, y: u32, x: u32) -> io::Result<()> {
        if self.cursor == Some((y, x)) {
            return Ok(());
        }
        let clamp = |v: u32| u16::try_from(v).unwrap_or(u16::MAX);
        crossterm::queue!(self.writer, crossterm::cursor::MoveTo(clamp(x), clamp(y)))?;
        self.cursor = Some((y, x));
        Ok(())
    }

    /// The terminal cursor stays put while the contents move, so the next
    /// write repositions explicitly.
    pub(crate) fn scroll(&mut self) -> io::Result<()> {
        crossterm::queue!(self.writer, crossterm::terminal::ScrollUp(1))?;
        self.cursor = None;
        Ok(())
    }

    pub(crate) fn show_cursor(&mut self, visible: bool) -> io::Result<()> {
        if visible {
            crossterm::queue!(self.writer, crossterm::cursor::Show)
        } else {
            crossterm::queue!(self.writer, crossterm::cursor::Hide)
        }
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Reset attributes, show the cursor and flush.
    pub(crate) fn finish(&mut self) -> io::Result<()> {
        self.writer.write_all(b"\x1b[0m")?;
        self.current = None;
        self.show_cursor(true)?;
        self.writer.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> io::Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| io::Error::other(e.to_string()))
    }
}

/// Direct-mode device writing inline to stdout.
pub struct TerminalSink {
    out: DirectWriter<io::Stdout>,
    started: bool,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self {
            out: DirectWriter::new(io::stdout()),
            started: false,
        }
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TerminalSink {
    fn drop(&mut self) {
        if self.started {
            let _ = self.out.finish();
        }
    }
}

impl DirectSink for TerminalSink {
    fn size(&self) -> io::Result<(u32, u32)> {
        let (cols, rows) = crossterm::terminal::size()?;
        Ok((u32::from(rows), u32::from(cols)))
    }

    fn start(&mut self) -> io::Result<()> {
        install_panic_hook();
        self.started = true;
        tracing::debug!("direct sink started");
        Ok(())
    }

    /// Queries the terminal. A terminal that does not answer is not an
    /// error; the caller keeps its own position.
    fn cursor_position(&mut self) -> io::Result<Option<(u32, u32)>> {
        self.out.flush()?;
        match crossterm::cursor::position() {
            Ok((x, y)) => {
                self.out.cursor = Some((u32::from(y), u32::from(x)));
                Ok(Some((u32::from(y), u32::from(x))))
            }
            Err(err) => {
                tracing::debug!(error = %err, "cursor position query failed");
                Ok(None)
            }
        }
    }

    fn put(
        &mut self,
        y: u32,
        x: u32,
        egc: &str,
        width: u8,
        channels: Channels,
        styles: Style,
    ) -> io::Result<()> {
        self.out.put(y, x, egc, width, channels, styles)
    }

    fn scroll(&mut self) -> io::Result<()> {
        self.out.scroll()
    }

    fn move_to(&mut self, y: u32, x: u32) -> io::Result<()> {
        self.out.move_to(y, x)
    }

    fn show_cursor(&mut self, visible: bool) -> io::Result<()> {
        self.out.show_cursor(visible)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.started = false;
        self.out.finish()
    }
}

// ---------------------------------------------------------------------------
// Event mapping
// ---------------------------------------------------------------------------

fn map_crossterm_event(event: crossterm::event::Event) -> Option<InputEvent> {
    match event {
        crossterm::event::Event::Key(key) => map_key_event(key),
        crossterm::event::Event::Mouse(mouse) => map_mouse_event(mouse),
        crossterm::event::Event::Resize(..) => Some(InputEvent::resize()),
        _ => None,
    }
}

fn map_key_event(event: crossterm::event::KeyEvent) -> Option<InputEvent> {
    use crossterm::event::KeyCode;
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Tab => Key::TAB,
        KeyCode::Esc => Key::ESC,
        KeyCode::Backspace => Key::Char('\x7f'),
        _ => return None,
    };
    let evtype = match event.kind {
        crossterm::event::KeyEventKind::Press => EventType::Press,
        crossterm::event::KeyEventKind::Repeat => EventType::Repeat,
        crossterm::event::KeyEventKind::Release => EventType::Release,
    };
    Some(
        InputEvent::key(key)
            .with_modifiers(map_modifiers(event.modifiers))
            .with_type(evtype),
    )
}

fn map_modifiers(modifiers: crossterm::event::KeyModifiers) -> Modifiers {
    use crossterm::event::KeyModifiers;
    let mut mapped = Modifiers::NONE;
    if modifiers.contains(KeyModifiers::SHIFT) {
        mapped |= Modifiers::SHIFT;
    }
    if modifiers.contains(KeyModifiers::ALT) {
        mapped |= Modifiers::ALT;
    }
    if modifiers.contains(KeyModifiers::CONTROL) {
        mapped |= Modifiers::CTRL;
    }
    if modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::HYPER | KeyModifiers::META) {
        mapped |= Modifiers::SUPER;
    }
    mapped
}

fn button_number(button: crossterm::event::MouseButton) -> u8 {
    match button {
        crossterm::event::MouseButton::Left => 1,
        crossterm::event::MouseButton::Middle => 2,
        crossterm::event::MouseButton::Right => 3,
    }
}

fn map_mouse_event(event: crossterm::event::MouseEvent) -> Option<InputEvent> {
    use crossterm::event::MouseEventKind;
    let (key, evtype) = match event.kind {
        MouseEventKind::Down(b) => (Key::Button(button_number(b)), EventType::Press),
        MouseEventKind::Up(b) => (Key::Button(button_number(b)), EventType::Release),
        MouseEventKind::Drag(b) => (Key::Button(button_number(b)), EventType::Repeat),
        MouseEventKind::Moved => (Key::Motion, EventType::Unknown),
        MouseEventKind::ScrollUp => (Key::SCROLL_UP, EventType::Press),
        MouseEventKind::ScrollDown => (Key::SCROLL_DOWN, EventType::Press),
        MouseEventKind::ScrollLeft => (Key::Button(6), EventType::Press),
        MouseEventKind::ScrollRight => (Key::Button(7), EventType::Press),
    };
    Some(
        InputEvent::mouse(key, i32::from(event.row), i32::from(event.column), evtype)
            .with_modifiers(map_modifiers(event.modifiers)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncwrap_core::Color;

    fn output(frame: &Frame, prev: Option<&Frame>, cursor: Option<(u32, u32)>) -> String {
        let mut presenter = Presenter::new(Vec::new());
        presenter.present(frame, prev, cursor).unwrap();
        String::from_utf8(presenter.into_inner().unwrap()).unwrap()
    }

    fn glyph(text: &str, channels: Channels) -> CellView {
        CellView {
            egc: text.to_string(),
            channels,
            ..CellView::blank()
        }
    }

    #[test]
    fn unchanged_frame_emits_no_cells() {
        let frame = Frame::new(2, 2);
        let out = output(&frame, Some(&frame), None);
        assert_eq!(out, "\x1b[?25l\x1b[0m");
    }

    #[test]
    fn style_is_emitted_once_per_run() {
        let old = Frame::new(1, 4);
        let mut frame = old.clone();
        let red = Channels::from_fg(Color::RED);
        frame.set(0, 0, glyph("a", red));
        frame.set(0, 1, glyph("b", red));
        frame.set(0, 2, glyph("c", red));
        let out = output(&frame, Some(&old), None);
        assert_eq!(out.matches("\x1b[38;2;255;0;0m").count(), 1);
        assert!(out.starts_with("\x1b[?25l\x1b[1;1H"));
        assert!(out.contains("abc"));
    }

    #[test]
    fn cursor_is_placed_and_shown() {
        let frame = Frame::new(2, 2);
        let out = output(&frame, Some(&frame), Some((1, 0)));
        assert!(out.ends_with("\x1b[2;1H\x1b[?25h"));
    }

    #[test]
    fn styles_map_to_sgr() {
        let mut out = Vec::new();
        sgr_styles(&mut out, Style::BOLD | Style::UNDERCURL).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\x1b[1m\x1b[4:3m");
    }

    #[test]
    fn direct_writes_track_position_and_style() {
        let red = Channels::from_fg(Color::RED);
        let mut w = DirectWriter::new(Vec::new());
        w.put(0, 0, "a", 1, red, Style::NONE).unwrap();
        w.put(0, 1, "b", 1, red, Style::NONE).unwrap();
        w.put(1, 0, "c", 1, red, Style::BOLD).unwrap();
        let out = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert!(out.starts_with("\x1b[1;1H\x1b[0m\x1b[38;2;255;0;0mab"));
        assert!(out.contains("\x1b[2;1H"));
        assert_eq!(out.matches("\x1b[38;2;255;0;0m").count(), 2);
        assert!(out.ends_with("\x1b[1mc"));
    }

    #[test]
    fn direct_scroll_forces_a_reposition() {
        let mut w = DirectWriter::new(Vec::new());
        w.put(1, 0, "a", 1, Channels::DEFAULT, Style::NONE).unwrap();
        w.scroll().unwrap();
        w.put(1, 1, "b", 1, Channels::DEFAULT, Style::NONE).unwrap();
        w.finish().unwrap();
        let out = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert_eq!(out, "\x1b[2;1H\x1b[0ma\x1b[1S\x1b[2;2Hb\x1b[0m\x1b[?25h");
    }

    #[test]
    fn key_events_map() {
        use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
        let event = map_key_event(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL)).unwrap();
        assert_eq!(event.key, Key::Char('q'));
        assert!(event.ctrl());
        assert!(map_key_event(KeyEvent::new(KeyCode::F(1), KeyModifiers::NONE)).is_none());
    }

    #[test]
    fn mouse_events_map() {
        use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
        let event = map_mouse_event(MouseEvent {
            kind: MouseEventKind::Up(MouseButton::Right),
            column: 7,
            row: 3,
            modifiers: KeyModifiers::NONE,
        })
        .unwrap();
        assert_eq!(event.key, Key::Button(3));
        assert_eq!((event.y, event.x), (3, 7));
        assert_eq!(event.evtype, EventType::Release);
    }
}
