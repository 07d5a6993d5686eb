#![forbid(unsafe_code)]

use ncwrap::prelude::*;

use super::Demo;
use crate::error::DemoError;

fn fg(color: Color) -> Channels {
    Channels::from_fg(color)
}

/// Gradients and layered planes.
#[derive(Default)]
pub struct PlaneDemo {
    gradient: Option<Plane>,
    boxed: Option<Plane>,
    overlay: Option<Plane>,
}

impl Demo for PlaneDemo {
    fn title(&self) -> &'static str {
        "Planes"
    }

    fn start(&mut self, _session: &Session, content: &Plane) -> Result<(), DemoError> {
        let gradient = Plane::create_at(content, 1, 2, 6, 30)?;
        gradient.gradient(
            0,
            0,
            6,
            30,
            " ",
            Style::NONE,
            [fg(Color::BLUE), fg(Color::GREEN), fg(Color::RED), fg(Color::WHITE)],
        )?;
        gradient.high_gradient(
            0,
            0,
            6,
            30,
            [
                Channel::from_color(Color::BLUE),
                Channel::from_color(Color::BLUE),
                Channel::from_color(Color::WHITE),
                Channel::from_color(Color::WHITE),
            ],
        )?;

        let boxed = Plane::create_at(content, 8, 2, 6, 6)?;
        boxed.perimeter_rounded_box(Color::BLUE)?;

        // Blended on both layers, so the gradient shows through.
        let overlay = Plane::create_at(content, 4, 20, 6, 14)?;
        let mut tint = Channels::from_colors(Color::WHITE, Color::DARK_GREY);
        tint.set_fg_alpha(Alpha::Blend);
        tint.set_bg_alpha(Alpha::Blend).map_err(EngineError::from)?;
        overlay.set_base("", Style::NONE, tint)?;
        overlay.put_str_yx(2, 3, "overlay")?;

        self.gradient = Some(gradient);
        self.boxed = Some(boxed);
        self.overlay = Some(overlay);
        Ok(())
    }

    fn stop(&mut self) {
        self.gradient = None;
        self.boxed = None;
        self.overlay = None;
    }
}
