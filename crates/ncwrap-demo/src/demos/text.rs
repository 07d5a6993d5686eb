#![forbid(unsafe_code)]

use ncwrap::prelude::*;

use super::Demo;
use crate::error::DemoError;

const STYLES: [(Style, &str); 5] = [
    (Style::BOLD, "bold"),
    (Style::ITALIC, "italic"),
    (Style::UNDERLINE, "underline"),
    (Style::UNDERCURL, "undercurl"),
    (Style::STRUCK, "struck"),
];

/// Styled, aligned and wide text.
pub struct TextDemo;

impl Demo for TextDemo {
    fn title(&self) -> &'static str {
        "Text"
    }

    fn start(&mut self, _session: &Session, content: &Plane) -> Result<(), DemoError> {
        let rows = content.rows() as i32;
        let line = |y: i32, ink: Ink, text: &str| -> Result<(), DemoError> {
            if y < rows {
                content.put_str_styled(y, 1, ink, text)?;
            }
            Ok(())
        };

        line(0, Ink::fg(Color::WHITE).styled(Style::BOLD), "Text")?;
        for (i, (style, label)) in STYLES.iter().enumerate() {
            line(2 + i as i32, Ink::fg(Color::LIGHT_GREY).styled(*style), label)?;
        }

        let aligned = [(Align::Left, "left"), (Align::Center, "center"), (Align::Right, "right")];
        for (i, (align, label)) in aligned.into_iter().enumerate() {
            let y = 8 + i as i32;
            if y < rows {
                content.put_str_aligned(Some(y), align, label)?;
            }
        }

        line(12, Ink::fg(Color::GREEN), "wide: 日本語 ✓")?;
        line(13, Ink::fg(Color::GREY).on(Color::BLACK), "grey on black")?;
        Ok(())
    }
}
