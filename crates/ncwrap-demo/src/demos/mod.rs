#![forbid(unsafe_code)]

//! The individual demos shown in the content area.

use std::path::Path;

use ncwrap::prelude::*;

use crate::error::DemoError;

mod mouse;
mod planes;
mod text;

pub use mouse::MouseDemo;
pub use planes::PlaneDemo;
pub use text::TextDemo;

/// One selectable demo.
///
/// `start` draws into the content plane; `stop` drops whatever planes the
/// demo created. The app erases the content plane between demos.
pub trait Demo {
    /// Menu label.
    fn title(&self) -> &'static str;

    fn start(&mut self, session: &Session, content: &Plane) -> Result<(), DemoError>;

    fn stop(&mut self) {}

    /// Returns whether the event was consumed.
    fn handle_input(&mut self, _event: &InputEvent) -> bool {
        false
    }
}

/// Every demo, in menu order.
pub fn all(image: Option<&Path>) -> Vec<Box<dyn Demo>> {
    vec![
        Box::new(TextDemo),
        Box::new(PlaneDemo::default()),
        Box::new(MouseDemo::new(image.map(Path::to_path_buf))),
    ]
}
