#![forbid(unsafe_code)]

use std::path::PathBuf;

use ncwrap::prelude::*;

use super::Demo;
use crate::error::DemoError;

const ICON_ROWS: u32 = 8;
const ICON_COLS: u32 = 16;

/// A round icon fading from blue to green, transparent outside the circle.
pub fn icon_pixels() -> Vec<u8> {
    let (cy, cx) = (ICON_ROWS as f32 / 2.0, ICON_COLS as f32 / 2.0);
    let mut rgba = Vec::with_capacity((ICON_ROWS * ICON_COLS * 4) as usize);
    for y in 0..ICON_ROWS {
        for x in 0..ICON_COLS {
            let dy = (y as f32 + 0.5 - cy) / cy;
            let dx = (x as f32 + 0.5 - cx) / cx;
            let inside = dy * dy + dx * dx <= 1.0;
            let t = x as f32 / (ICON_COLS - 1) as f32;
            rgba.extend_from_slice(&[
                0,
                (t * 255.0) as u8,
                ((1.0 - t) * 255.0) as u8,
                if inside { 255 } else { 0 },
            ]);
        }
    }
    rgba
}

/// A blitted image and a pad that records clicks.
pub struct MouseDemo {
    image: Option<PathBuf>,
    visual: Option<Visual>,
    icon: Option<Plane>,
    pad: Option<Plane>,
    content: Option<Plane>,
    pressed: bool,
    clicks: u32,
}

impl MouseDemo {
    pub fn new(image: Option<PathBuf>) -> Self {
        Self {
            image,
            visual: None,
            icon: None,
            pad: None,
            content: None,
            pressed: false,
            clicks: 0,
        }
    }

    pub fn clicks(&self) -> u32 {
        self.clicks
    }

    fn load(&self, session: &Session) -> Result<Visual, DemoError> {
        if let Some(path) = &self.image {
            if let Some(visual) = Visual::from_file(session, path) {
                return Ok(visual);
            }
            tracing::warn!(path = %path.display(), "image not loaded; using the built-in icon");
        }
        Ok(Visual::from_rgba(session, ICON_ROWS, ICON_COLS, &icon_pixels())?)
    }

    fn status(&self, text: &str) {
        let Some(content) = &self.content else {
            return;
        };
        let y = content.rows() as i32 - 1;
        if y < 0 {
            return;
        }
        let result = content
            .erase_region(y, 0, 1, 0)
            .and_then(|()| content.put_str_styled(y, 1, Ink::fg(Color::LIGHT_GREY), text));
        if let Err(err) = result {
            tracing::warn!(error = %err, "status line not drawn");
        }
    }
}

impl Demo for MouseDemo {
    fn title(&self) -> &'static str {
        "Mouse"
    }

    fn start(&mut self, session: &Session, content: &Plane) -> Result<(), DemoError> {
        content.put_str_styled(0, 1, Ink::fg(Color::WHITE).styled(Style::BOLD), "Mouse")?;

        let visual = self.load(session)?;
        let icon = visual.blit_onto(
            content,
            &BlitOptions {
                y: 1,
                x: 1,
                blitter: Blitter::TwoByOne,
                flags: BlitFlags::CHILDPLANE | BlitFlags::BLEND,
                ..BlitOptions::default()
            },
        )?;

        let pad = Plane::create_at(content, icon.bottom_y() + 2, 1, 7, 24)?;
        pad.perimeter_rounded_box(Color::GREY)?;

        self.visual = Some(visual);
        self.icon = Some(icon);
        self.pad = Some(pad);
        self.content = Some(content.clone());
        self.pressed = false;
        self.status("Click inside the box");
        Ok(())
    }

    fn stop(&mut self) {
        self.icon = None;
        self.visual = None;
        self.pad = None;
        self.content = None;
        self.pressed = false;
    }

    fn handle_input(&mut self, event: &InputEvent) -> bool {
        if event.key != Key::Button(1) {
            return false;
        }
        self.pressed = event.evtype != EventType::Release;
        let Some(pad) = &self.pad else {
            return false;
        };
        if self.pressed && pad.abs_contains(event.y, event.x) {
            let (py, px) = pad.abs_yx();
            if let Err(err) = pad.put_str_yx(event.y - py, event.x - px, "X") {
                tracing::warn!(error = %err, "click mark not drawn");
            }
            self.clicks += 1;
            self.status(&format!("{} clicks, last at {},{}", self.clicks, event.y, event.x));
        }
        true
    }
}
