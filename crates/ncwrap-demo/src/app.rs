#![forbid(unsafe_code)]

//! Demo application: title bar, demo menu and content area.
//!
//! ```text
//! ┌ title bar ─────────────────────────────────────┐
//! │                                                │
//! │  [ Select Demo ]   ╭─────────────────────────╮ │
//! │   0 Text           │ content                 │ │
//! │   1 Planes         │                         │ │
//! │   2 Mouse          ╰─────────────────────────╯ │
//! └────────────────────────────────────────────────┘
//! ```

use std::ops::ControlFlow;
use std::path::Path;

use ncwrap::prelude::*;

use crate::demos::{self, Demo};
use crate::error::DemoError;

/// Gap between the screen edge and the menu and content planes.
pub const BORDER: i32 = 3;
const MENU_ROWS: u32 = 10;
const MENU_COLS: u32 = 35;

const TITLE_LEFT: &str = " ncwrap demo";
const TITLE_RIGHT: &str = "Movement: ↑ ↓  Quit: q ";

pub struct App {
    demos: Vec<Box<dyn Demo>>,
    selector: Selector,
    content: Plane,
    border: Plane,
    current: usize,
}

fn menu_options(demos: &[Box<dyn Demo>], default_index: usize) -> SelectorOptions {
    let items = demos
        .iter()
        .enumerate()
        .map(|(i, demo)| SelectorItem::new(i.to_string(), Some(demo.title())));
    SelectorOptions {
        op_channels: Channels::from_colors(Color::DARK_GREY, Color::BLACK),
        desc_channels: Channels::from_colors(Color::WHITE, Color::BLACK),
        box_channels: Channels::from_colors(Color::GREY, Color::BLACK),
        ..SelectorOptions::default()
    }
    .with_secondary("[ Select Demo ]")
    .with_items(items)
    .with_default_index(default_index)
}

/// Draw the title bar across row 0 of the standard plane.
pub fn draw_title_bar(session: &Session) -> Result<(), DemoError> {
    let root = session.try_std_plane()?;
    let cols = root.columns() as usize;
    let used = session.str_width(TITLE_LEFT) + session.str_width(TITLE_RIGHT);
    let middle = " ".repeat(cols.saturating_sub(used));
    let bar = format!("{TITLE_LEFT}{middle}{TITLE_RIGHT}");
    root.put_str_styled(0, 0, Ink::fg(Color::WHITE).on(Color::BLUE), &bar)?;
    Ok(())
}

impl App {
    /// Lay out the screen and start demo `start` (clamped to the last one).
    pub fn new(session: &Session, start: usize, image: Option<&Path>) -> Result<App, DemoError> {
        let root = session.try_std_plane()?;
        root.erase();
        let (rows, cols) = root.dim_yx();
        draw_title_bar(session)?;

        let menu_plane = Plane::create_at(&root, BORDER + 1, BORDER, MENU_ROWS, MENU_COLS)?;
        menu_plane.set_base(" ", Style::NONE, Channels::DEFAULT)?;

        let border_x = menu_plane.right_x() + 1;
        let border_rows = rows as i32 - 2 * BORDER;
        let border_cols = cols as i32 - border_x - BORDER;
        if border_rows < 3 || border_cols < 3 {
            return Err(DemoError::TooSmall { rows, cols });
        }
        let border = Plane::create_at(
            &root,
            BORDER + 1,
            border_x,
            border_rows as u32,
            border_cols as u32,
        )?;
        border.perimeter_rounded_box(Color::WHITE)?;
        let content = Plane::create_at(
            &border,
            1,
            1,
            border.rows() - 2,
            border.columns() - 2,
        )?;

        let demos = demos::all(image);
        let current = start.min(demos.len() - 1);
        let selector = Selector::new(menu_plane, &menu_options(&demos, current))?;
        tracing::info!(demos = demos.len(), current, "demo app laid out");

        let mut app = App {
            demos,
            selector,
            content,
            border,
            current,
        };
        app.demos[current].start(session, &app.content)?;
        session.render()?;
        Ok(app)
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn content(&self) -> &Plane {
        &self.content
    }

    pub fn border(&self) -> &Plane {
        &self.border
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// The demo the menu points at; the first if the selection is unusable.
    fn selected_index(&self) -> usize {
        self.selector
            .selected()
            .and_then(|option| option.parse::<usize>().ok())
            .filter(|&i| i < self.demos.len())
            .unwrap_or(0)
    }

    fn switch_to(&mut self, session: &Session, index: usize) -> Result<(), DemoError> {
        self.demos[self.current].stop();
        self.content.erase();
        self.current = index;
        tracing::debug!(demo = self.demos[index].title(), "switching demo");
        self.demos[index].start(session, &self.content)
    }

    fn step(&mut self, session: &Session, forward: bool) -> Result<(), DemoError> {
        let index = self.selected_index();
        let next = if forward {
            Some(index + 1).filter(|&i| i < self.demos.len())
        } else {
            index.checked_sub(1)
        };
        let Some(next) = next else {
            return Ok(());
        };
        if forward {
            self.selector.next_item();
        } else {
            self.selector.prev_item();
        }
        self.switch_to(session, next)
    }

    /// React to one event and re-render. Breaks on `q`.
    pub fn handle(&mut self, session: &Session, event: &InputEvent) -> ControlFlow<()> {
        let result = match event.key {
            Key::Char('q') => return ControlFlow::Break(()),
            Key::Up | Key::Char('k') => self.step(session, false),
            Key::Down | Key::Char('j') => self.step(session, true),
            Key::Resize => session
                .refresh()
                .map_err(DemoError::from)
                .and_then(|_| draw_title_bar(session)),
            _ => {
                self.demos[self.current].handle_input(event);
                Ok(())
            }
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, key = ?event.key, "input handling failed");
        }
        if let Err(err) = session.render() {
            tracing::warn!(error = %err, "render failed");
        }
        ControlFlow::Continue(())
    }

    /// Run until `q` or end of input.
    pub fn run(&mut self, session: &Session) -> Result<(), DemoError> {
        session.run_loop(|session, event| self.handle(session, event))?;
        self.demos[self.current].stop();
        tracing::info!("demo app finished");
        Ok(())
    }
}
