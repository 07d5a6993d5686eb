#![forbid(unsafe_code)]

//! Rendered frames.
//!
//! A [`Frame`] is the composited result of a render: one resolved
//! [`CellView`] per terminal cell, with all alpha already applied. Frames
//! are what back ends present and what `at_yx` reads back.

use ncwrap_core::{Channels, Style};

/// A cell's visible content with its cluster resolved to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellView {
    /// Cluster text; empty for blank cells and wide-glyph continuations.
    pub egc: String,
    pub width: u8,
    pub styles: Style,
    pub channels: Channels,
}

impl CellView {
    pub fn blank() -> Self {
        Self {
            egc: String::new(),
            width: 1,
            styles: Style::NONE,
            channels: Channels::DEFAULT,
        }
    }

    /// Right half of a wide glyph.
    pub fn is_continuation(&self) -> bool {
        self.egc.is_empty() && self.width == 2
    }
}

impl Default for CellView {
    fn default() -> Self {
        Self::blank()
    }
}

/// A contiguous run of changed cells on a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRun {
    pub y: u32,
    /// Start column (inclusive).
    pub x0: u32,
    /// End column (inclusive).
    pub x1: u32,
}

/// A composited screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    rows: u32,
    cols: u32,
    cells: Vec<CellView>,
}

impl Frame {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            cells: vec![CellView::blank(); rows as usize * cols as usize],
        }
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn get(&self, y: u32, x: u32) -> Option<&CellView> {
        if y >= self.rows || x >= self.cols {
            return None;
        }
        self.cells.get(y as usize * self.cols as usize + x as usize)
    }

    pub(crate) fn set(&mut self, y: u32, x: u32, cell: CellView) {
        if y < self.rows && x < self.cols {
            let idx = y as usize * self.cols as usize + x as usize;
            self.cells[idx] = cell;
        }
    }

    /// Drop the top `n` rows, shifting the rest up and blanking the bottom.
    pub(crate) fn scroll_up(&mut self, n: u32) {
        let cut = n.min(self.rows) as usize * self.cols as usize;
        self.cells.drain(..cut);
        self.cells
            .resize(self.rows as usize * self.cols as usize, CellView::blank());
    }

    /// Visible text of row `y`, blanks as spaces.
    pub fn row_text(&self, y: u32) -> String {
        let mut out = String::new();
        for x in 0..self.cols {
            let Some(cell) = self.get(y, x) else { break };
            if cell.is_continuation() {
                continue;
            }
            if cell.egc.is_empty() {
                out.push(' ');
            } else {
                out.push_str(&cell.egc);
            }
        }
        out
    }

    /// All rows joined with newlines.
    pub fn text(&self) -> String {
        (0..self.rows)
            .map(|y| self.row_text(y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Changed cells relative to `prev`, coalesced into per-row runs.
    ///
    /// A size change marks every cell as changed.
    pub fn diff_runs(&self, prev: Option<&Frame>) -> Vec<ChangeRun> {
        let full = prev.is_none_or(|p| p.rows != self.rows || p.cols != self.cols);
        let mut runs = Vec::new();
        for y in 0..self.rows {
            let mut open: Option<u32> = None;
            for x in 0..self.cols {
                let changed = full
                    || prev
                        .and_then(|p| p.get(y, x))
                        .is_none_or(|old| Some(old) != self.get(y, x));
                match (changed, open) {
                    (true, None) => open = Some(x),
                    (false, Some(x0)) => {
                        runs.push(ChangeRun { y, x0, x1: x - 1 });
                        open = None;
                    }
                    _ => {}
                }
            }
            if let Some(x0) = open {
                runs.push(ChangeRun {
                    y,
                    x0,
                    x1: self.cols - 1,
                });
            }
        }
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(s: &str) -> CellView {
        CellView {
            egc: s.to_string(),
            ..CellView::blank()
        }
    }

    #[test]
    fn new_frame_is_blank() {
        let f = Frame::new(2, 3);
        assert_eq!(f.row_text(0), "   ");
        assert_eq!(f.get(1, 2), Some(&CellView::blank()));
        assert_eq!(f.get(2, 0), None);
    }

    #[test]
    fn row_text_skips_continuations() {
        let mut f = Frame::new(1, 3);
        f.set(
            0,
            0,
            CellView {
                egc: "中".into(),
                width: 2,
                ..CellView::blank()
            },
        );
        f.set(
            0,
            1,
            CellView {
                width: 2,
                ..CellView::blank()
            },
        );
        f.set(0, 2, glyph("x"));
        assert_eq!(f.row_text(0), "中x");
    }

    #[test]
    fn diff_without_previous_is_full() {
        let f = Frame::new(2, 4);
        let runs = f.diff_runs(None);
        assert_eq!(
            runs,
            vec![
                ChangeRun { y: 0, x0: 0, x1: 3 },
                ChangeRun { y: 1, x0: 0, x1: 3 }
            ]
        );
    }

    #[test]
    fn diff_coalesces_adjacent_changes() {
        let old = Frame::new(1, 6);
        let mut new = old.clone();
        new.set(0, 1, glyph("a"));
        new.set(0, 2, glyph("b"));
        new.set(0, 5, glyph("c"));
        assert_eq!(
            new.diff_runs(Some(&old)),
            vec![
                ChangeRun { y: 0, x0: 1, x1: 2 },
                ChangeRun { y: 0, x0: 5, x1: 5 }
            ]
        );
        assert!(new.diff_runs(Some(&new)).is_empty());
    }
}
