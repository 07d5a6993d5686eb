#![forbid(unsafe_code)]

//! Per-plane state and drawing primitives.

use ncwrap_core::{
    Align, Alpha, Cell, Channel, Channels, Color, EgcPool, Style, grapheme_width, str_width,
};
use unicode_segmentation::UnicodeSegmentation;

use crate::boxmask;
use crate::error::EngineError;
use crate::frame::CellView;
use crate::handle::PlaneHandle;
use crate::options::PlaneFlags;

/// Margins of a marginalized plane: top, left, bottom, right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PlaneMargins {
    pub(crate) top: u32,
    pub(crate) left: u32,
    pub(crate) bottom: u32,
    pub(crate) right: u32,
}

/// Rounded box glyphs: corners then horizontal and vertical edges.
const ROUNDED: [char; 6] = ['╭', '╮', '╰', '╯', '─', '│'];

#[derive(Debug)]
pub(crate) struct PlaneState {
    pub(crate) handle: PlaneHandle,
    pub(crate) name: Option<String>,
    pub(crate) parent: Option<PlaneHandle>,
    pub(crate) children: Vec<PlaneHandle>,
    /// Position relative to the parent.
    pub(crate) y: i32,
    pub(crate) x: i32,
    rows: u32,
    cols: u32,
    cells: Vec<Cell>,
    pool: EgcPool,
    base: Cell,
    cursor_y: u32,
    cursor_x: u32,
    pub(crate) channels: Channels,
    pub(crate) styles: Style,
    pub(crate) scrolling: bool,
    pub(crate) flags: PlaneFlags,
    pub(crate) margins: Option<PlaneMargins>,
    /// Rows scrolled off the top since the owner last looked.
    scrolled: u32,
}

impl PlaneState {
    pub(crate) fn new(
        handle: PlaneHandle,
        parent: Option<PlaneHandle>,
        (y, x): (i32, i32),
        (rows, cols): (u32, u32),
        flags: PlaneFlags,
    ) -> Self {
        debug_assert!(rows > 0 && cols > 0);
        Self {
            handle,
            name: None,
            parent,
            children: Vec::new(),
            y,
            x,
            rows,
            cols,
            cells: vec![Cell::EMPTY; rows as usize * cols as usize],
            pool: EgcPool::new(),
            base: Cell::EMPTY,
            cursor_y: 0,
            cursor_x: 0,
            channels: Channels::DEFAULT,
            styles: Style::NONE,
            scrolling: flags.contains(PlaneFlags::VSCROLL),
            flags,
            margins: None,
            scrolled: 0,
        }
    }

    #[inline]
    pub(crate) fn dim_yx(&self) -> (u32, u32) {
        (self.rows, self.cols)
    }

    #[inline]
    pub(crate) fn cursor_yx(&self) -> (u32, u32) {
        (self.cursor_y, self.cursor_x)
    }

    #[inline]
    fn grows(&self) -> bool {
        self.flags.contains(PlaneFlags::AUTOGROW)
    }

    /// Rows scrolled since the last call, resetting the count.
    pub(crate) fn take_scrolled(&mut self) -> u32 {
        std::mem::take(&mut self.scrolled)
    }

    #[inline]
    fn index(&self, y: u32, x: u32) -> usize {
        debug_assert!(y < self.rows && x < self.cols);
        y as usize * self.cols as usize + x as usize
    }

    fn out_of_bounds(&self, y: i32, x: i32) -> EngineError {
        EngineError::OutOfBounds {
            plane: self.handle,
            y,
            x,
        }
    }

    // -----------------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------------

    fn egc(&self, cell: &Cell) -> String {
        cell.egc(&self.pool).unwrap_or_default()
    }

    fn view(&self, cell: &Cell) -> CellView {
        CellView {
            egc: self.egc(cell),
            width: cell.width(),
            styles: cell.styles(),
            channels: cell.channels(),
        }
    }

    pub(crate) fn at(&self, y: u32, x: u32) -> Option<CellView> {
        if y >= self.rows || x >= self.cols {
            return None;
        }
        Some(self.view(&self.cells[self.index(y, x)]))
    }

    pub(crate) fn base(&self) -> CellView {
        self.view(&self.base)
    }

    /// What the compositor sees at `(y, x)`: the stored cell, with the base
    /// cell standing in for an empty glyph and for unset colours and styles.
    pub(crate) fn visible(&self, y: u32, x: u32) -> CellView {
        let cell = &self.cells[self.index(y, x)];
        if cell.is_continuation() {
            return self.view(cell);
        }
        let glyph = if cell.is_empty() { &self.base } else { cell };
        let channels = if cell.channels() == Channels::DEFAULT {
            self.base.channels()
        } else {
            cell.channels()
        };
        let styles = if cell.stylemask() == 0 {
            self.base.styles()
        } else {
            cell.styles()
        };
        CellView {
            egc: self.egc(glyph),
            width: glyph.width(),
            styles,
            channels,
        }
    }

    // -----------------------------------------------------------------------
    // Cursor, size and base
    // -----------------------------------------------------------------------

    /// Move the cursor; `-1` keeps the current coordinate.
    pub(crate) fn cursor_move(&mut self, y: i32, x: i32) -> Result<(), EngineError> {
        let ny = if y < 0 { self.cursor_y } else { y as u32 };
        let nx = if x < 0 { self.cursor_x } else { x as u32 };
        if ny >= self.rows || nx >= self.cols {
            return Err(self.out_of_bounds(y, x));
        }
        self.cursor_y = ny;
        self.cursor_x = nx;
        Ok(())
    }

    /// Resize keeping the top-left contents.
    pub(crate) fn resize(&mut self, rows: u32, cols: u32) -> Result<(), EngineError> {
        if rows == 0 || cols == 0 {
            return Err(EngineError::invalid(format!(
                "cannot resize plane {} to {rows}x{cols}",
                self.handle
            )));
        }
        if (rows, cols) == (self.rows, self.cols) {
            return Ok(());
        }
        let mut cells = vec![Cell::EMPTY; rows as usize * cols as usize];
        for y in 0..self.rows {
            for x in 0..self.cols {
                let old = self.cells[self.index(y, x)];
                if y < rows && x < cols && !(old.is_wide() && x + 1 == cols) {
                    cells[y as usize * cols as usize + x as usize] = old;
                } else {
                    old.release(&mut self.pool);
                }
            }
        }
        self.cells = cells;
        self.rows = rows;
        self.cols = cols;
        self.cursor_y = self.cursor_y.min(rows - 1);
        self.cursor_x = self.cursor_x.min(cols - 1);
        Ok(())
    }

    pub(crate) fn set_base(
        &mut self,
        egc: &str,
        styles: Style,
        channels: Channels,
    ) -> Result<(), EngineError> {
        let egc = egc.trim_end_matches('\0');
        let cell = Cell::load(&mut self.pool, egc, styles, channels)?;
        let old = std::mem::replace(&mut self.base, cell);
        old.release(&mut self.pool);
        Ok(())
    }

    pub(crate) fn set_base_cell(&mut self, cell: &Cell) -> Result<(), EngineError> {
        if cell.is_spilled() {
            return Err(EngineError::invalid(
                "base cell refers to a cluster pool it does not belong to",
            ));
        }
        let old = std::mem::replace(&mut self.base, *cell);
        old.release(&mut self.pool);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Cell storage
    // -----------------------------------------------------------------------

    /// Replace the cell at `(y, x)`, clearing the other half of any wide
    /// glyph it overlaps.
    fn store(&mut self, y: u32, x: u32, cell: Cell) {
        let idx = self.index(y, x);
        let old = self.cells[idx];
        if old.is_wide() && x + 1 < self.cols {
            let right = self.index(y, x + 1);
            self.cells[right] = Cell::EMPTY;
        } else if old.is_continuation() && x > 0 {
            let left = self.index(y, x - 1);
            let prev = std::mem::replace(&mut self.cells[left], Cell::EMPTY);
            prev.release(&mut self.pool);
        }
        self.cells[idx] = cell;
        old.release(&mut self.pool);
    }

    /// Write one cluster at `(y, x)` with explicit styling.
    ///
    /// Returns the columns used, or 0 if a wide cluster does not fit.
    pub(crate) fn write_egc(
        &mut self,
        y: u32,
        x: u32,
        egc: &str,
        styles: Style,
        channels: Channels,
    ) -> Result<u32, EngineError> {
        let cell = Cell::load(&mut self.pool, egc, styles, channels)?;
        if cell.is_wide() && x + 1 >= self.cols {
            cell.release(&mut self.pool);
            return Ok(0);
        }
        self.store(y, x, cell);
        if cell.is_wide() {
            self.store(y, x + 1, Cell::continuation(styles, channels));
            return Ok(2);
        }
        Ok(1)
    }

    fn write_char(
        &mut self,
        y: u32,
        x: u32,
        c: char,
        styles: Style,
        channels: Channels,
    ) -> Result<u32, EngineError> {
        let mut buf = [0u8; 4];
        self.write_egc(y, x, c.encode_utf8(&mut buf), styles, channels)
    }

    fn clear_cell(&mut self, y: u32, x: u32) {
        self.store(y, x, Cell::EMPTY);
    }

    /// Drop the top `n` rows, shifting everything up.
    fn scroll_rows(&mut self, n: u32) {
        let n = n.min(self.rows);
        let cut = n as usize * self.cols as usize;
        for cell in self.cells.drain(..cut) {
            cell.release(&mut self.pool);
        }
        self.cells.resize(self.rows as usize * self.cols as usize, Cell::EMPTY);
        self.scrolled += n;
    }

    /// A growing plane gains a row at the bottom instead of scrolling.
    fn newline(&mut self) -> Result<(), EngineError> {
        self.cursor_x = 0;
        if self.cursor_y + 1 < self.rows {
            self.cursor_y += 1;
        } else if self.grows() {
            self.resize(self.rows + 1, self.cols)?;
            self.cursor_y += 1;
        } else {
            self.scroll_rows(1);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Erasing and scrolling
    // -----------------------------------------------------------------------

    pub(crate) fn erase(&mut self) {
        for cell in std::mem::take(&mut self.cells) {
            cell.release(&mut self.pool);
        }
        self.cells = vec![Cell::EMPTY; self.rows as usize * self.cols as usize];
        self.cursor_y = 0;
        self.cursor_x = 0;
    }

    /// Resolve a region anchored at `(y, x)` (`-1` meaning the cursor).
    ///
    /// A positive length extends down/right, a negative one up/left, and
    /// zero spans the whole dimension.
    fn region(
        &self,
        y: i32,
        x: i32,
        ylen: i32,
        xlen: i32,
    ) -> Result<(u32, u32, u32, u32), EngineError> {
        let y0 = if y < 0 { self.cursor_y } else { y as u32 };
        let x0 = if x < 0 { self.cursor_x } else { x as u32 };
        if y0 >= self.rows || x0 >= self.cols {
            return Err(self.out_of_bounds(y, x));
        }
        let span = |start: u32, len: i32, limit: u32| -> (u32, u32) {
            match len {
                0 => (0, limit),
                l if l > 0 => (start, (l as u32).min(limit - start)),
                l => {
                    let back = l.unsigned_abs().min(start + 1);
                    (start + 1 - back, back)
                }
            }
        };
        let (ry, rh) = span(y0, ylen, self.rows);
        let (rx, rw) = span(x0, xlen, self.cols);
        Ok((ry, rx, rh, rw))
    }

    pub(crate) fn erase_region(
        &mut self,
        y: i32,
        x: i32,
        ylen: i32,
        xlen: i32,
    ) -> Result<(), EngineError> {
        let (ry, rx, rh, rw) = self.region(y, x, ylen, xlen)?;
        for yy in ry..ry + rh {
            for xx in rx..rx + rw {
                self.clear_cell(yy, xx);
            }
        }
        Ok(())
    }

    pub(crate) fn scroll_up(&mut self, n: u32) -> Result<(), EngineError> {
        if !self.scrolling {
            return Err(EngineError::invalid(format!(
                "plane {} does not scroll",
                self.handle
            )));
        }
        self.scroll_rows(n);
        self.cursor_y = self.cursor_y.saturating_sub(n);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Text
    // -----------------------------------------------------------------------

    /// Write `text` from `(y, x)` (`-1` keeps the cursor coordinate).
    ///
    /// Output stops at the right edge unless the plane scrolls, in which
    /// case it wraps and scrolls. An autogrow plane that does not scroll
    /// widens to fit the line; one that scrolls adds rows instead. A stained
    /// write keeps each destination cell's existing colours and styles.
    /// Returns the columns written.
    pub(crate) fn put_str(
        &mut self,
        y: i32,
        x: i32,
        text: &str,
        stain: bool,
    ) -> Result<u32, EngineError> {
        self.cursor_move(y, x)?;
        let mut written = 0;
        for g in text.graphemes(true) {
            if g == "\n" || g == "\r\n" {
                if !self.scrolling {
                    break;
                }
                self.newline()?;
                continue;
            }
            let width = grapheme_width(g).max(1) as u32;
            if self.cursor_x + width > self.cols {
                if self.grows() && !self.scrolling {
                    self.resize(self.rows, self.cursor_x + width)?;
                } else if !self.scrolling || width > self.cols {
                    break;
                } else {
                    self.newline()?;
                }
            }
            let (cy, cx) = (self.cursor_y, self.cursor_x);
            let (styles, channels) = if stain {
                let old = self.cells[self.index(cy, cx)];
                (old.styles(), old.channels())
            } else {
                (self.styles, self.channels)
            };
            let used = self.write_egc(cy, cx, g, styles, channels)?;
            self.cursor_x += used;
            written += used;
        }
        Ok(written)
    }

    /// Write `text` on row `y` positioned by `align`.
    pub(crate) fn put_str_aligned(
        &mut self,
        y: i32,
        align: Align,
        text: &str,
    ) -> Result<u32, EngineError> {
        let width = str_width(text) as u32;
        let x = match align.offset(self.cols, width) {
            Some(x) => x as i32,
            None if align == Align::Unaligned => -1,
            None => 0,
        };
        self.put_str(y, x, text, false)
    }

    // -----------------------------------------------------------------------
    // Boxes and gradients
    // -----------------------------------------------------------------------

    /// Rounded box from the cursor to `(ystop, xstop)` inclusive.
    pub(crate) fn rounded_box(
        &mut self,
        styles: Style,
        channels: Channels,
        ystop: u32,
        xstop: u32,
        ctlword: u32,
    ) -> Result<(), EngineError> {
        let (y0, x0) = (self.cursor_y, self.cursor_x);
        if ystop >= self.rows || xstop >= self.cols {
            return Err(self.out_of_bounds(ystop as i32, xstop as i32));
        }
        if ystop <= y0 || xstop <= x0 {
            return Err(EngineError::invalid(format!(
                "box from ({y0}, {x0}) to ({ystop}, {xstop}) is degenerate"
            )));
        }
        let [ul, ur, ll, lr, hl, vl] = ROUNDED;
        let top = ctlword & boxmask::TOP == 0;
        let right = ctlword & boxmask::RIGHT == 0;
        let bottom = ctlword & boxmask::BOTTOM == 0;
        let left = ctlword & boxmask::LEFT == 0;

        let corners = [
            (y0, x0, ul, top || left),
            (y0, xstop, ur, top || right),
            (ystop, x0, ll, bottom || left),
            (ystop, xstop, lr, bottom || right),
        ];
        for (y, x, c, draw) in corners {
            if draw {
                self.write_char(y, x, c, styles, channels)?;
            }
        }
        for x in x0 + 1..xstop {
            if top {
                self.write_char(y0, x, hl, styles, channels)?;
            }
            if bottom {
                self.write_char(ystop, x, hl, styles, channels)?;
            }
        }
        for y in y0 + 1..ystop {
            if left {
                self.write_char(y, x0, vl, styles, channels)?;
            }
            if right {
                self.write_char(y, xstop, vl, styles, channels)?;
            }
        }
        self.cursor_y = ystop;
        self.cursor_x = xstop;
        Ok(())
    }

    /// Fill a region with `egc`, interpolating channels between the four
    /// corners. An empty `egc` keeps the existing glyphs.
    ///
    /// Lengths of 0 extend to the plane edge. Returns the cells touched.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn gradient(
        &mut self,
        y: i32,
        x: i32,
        ylen: u32,
        xlen: u32,
        egc: &str,
        styles: Style,
        [ul, ur, ll, lr]: [Channels; 4],
    ) -> Result<u32, EngineError> {
        let (ry, rx, rh, rw) = self.region(y, x, ylen as i32, xlen as i32)?;
        let egc = egc.trim_end_matches('\0');
        let mut filled = 0;
        for dy in 0..rh {
            for dx in 0..rw {
                let fg = bilerp(
                    [ul.fg_channel(), ur.fg_channel(), ll.fg_channel(), lr.fg_channel()],
                    (dy, rh),
                    (dx, rw),
                );
                let bg = bilerp(
                    [ul.bg_channel(), ur.bg_channel(), ll.bg_channel(), lr.bg_channel()],
                    (dy, rh),
                    (dx, rw),
                );
                let channels = Channels::combine(fg, bg);
                let (cy, cx) = (ry + dy, rx + dx);
                if egc.is_empty() {
                    let idx = self.index(cy, cx);
                    let mut cell = self.cells[idx];
                    cell.set_channels(channels);
                    cell.set_styles(styles);
                    self.cells[idx] = cell;
                } else if self.write_egc(cy, cx, egc, styles, channels)? == 0 {
                    continue;
                }
                filled += 1;
            }
        }
        Ok(filled)
    }

    /// Gradient at double vertical resolution using upper half blocks.
    ///
    /// Each cell's foreground is its top pixel, its background the bottom.
    pub(crate) fn gradient2x1(
        &mut self,
        y: i32,
        x: i32,
        ylen: u32,
        xlen: u32,
        corners: [Channel; 4],
    ) -> Result<u32, EngineError> {
        let (ry, rx, rh, rw) = self.region(y, x, ylen as i32, xlen as i32)?;
        let mut filled = 0;
        for dy in 0..rh {
            for dx in 0..rw {
                let top = bilerp(corners, (dy * 2, rh * 2), (dx, rw));
                let bottom = bilerp(corners, (dy * 2 + 1, rh * 2), (dx, rw));
                let channels = Channels::combine(top, bottom);
                self.write_char(ry + dy, rx + dx, '▀', Style::NONE, channels)?;
                filled += 1;
            }
        }
        Ok(filled)
    }

    // -----------------------------------------------------------------------
    // Colour
    // -----------------------------------------------------------------------

    pub(crate) fn set_fg_alpha(&mut self, alpha: Alpha) {
        self.channels.set_fg_alpha(alpha);
    }

    pub(crate) fn set_bg_alpha(&mut self, alpha: Alpha) -> Result<(), EngineError> {
        self.channels.set_bg_alpha(alpha)?;
        Ok(())
    }

    /// Convert every stored colour to its grey equivalent.
    pub(crate) fn greyscale(&mut self) {
        fn grey(ch: Channels) -> Channels {
            let mut ch = ch;
            if !ch.fg_default() {
                ch.set_fg_rgb(ch.fg_rgb().greyscale());
            }
            if !ch.bg_default() {
                ch.set_bg_rgb(ch.bg_rgb().greyscale());
            }
            ch
        }
        for cell in &mut self.cells {
            cell.set_channels(grey(cell.channels()));
        }
        self.base.set_channels(grey(self.base.channels()));
    }
}

fn lerp(a: u8, b: u8, (num, den): (u32, u32)) -> u8 {
    if den == 0 {
        return a;
    }
    ((u32::from(a) * (den - num) + u32::from(b) * num + den / 2) / den) as u8
}

fn lerp_color(a: Color, b: Color, t: (u32, u32)) -> Color {
    Color::rgb(lerp(a.r(), b.r(), t), lerp(a.g(), b.g(), t), lerp(a.b(), b.b(), t))
}

/// Bilinear interpolation between corner channels.
///
/// `(i, n)` is the position along an axis of `n` steps. Alpha comes from
/// the upper-left corner; all-default corners stay default.
fn bilerp([ul, ur, ll, lr]: [Channel; 4], (iy, ny): (u32, u32), (ix, nx): (u32, u32)) -> Channel {
    if ul.is_default() && ur.is_default() && ll.is_default() && lr.is_default() {
        let mut ch = Channel::DEFAULT;
        ch.set_alpha(ul.alpha());
        return ch;
    }
    let tx = (ix, nx.saturating_sub(1));
    let ty = (iy, ny.saturating_sub(1));
    let top = lerp_color(ul.rgb(), ur.rgb(), tx);
    let bottom = lerp_color(ll.rgb(), lr.rgb(), tx);
    Channel::from_color_alpha(lerp_color(top, bottom, ty), ul.alpha())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(rows: u32, cols: u32) -> PlaneState {
        PlaneState::new(
            PlaneHandle::new(0x10).unwrap(),
            None,
            (0, 0),
            (rows, cols),
            PlaneFlags::empty(),
        )
    }

    fn row(p: &PlaneState, y: u32) -> String {
        (0..p.cols)
            .filter_map(|x| p.at(y, x))
            .filter(|c| !c.is_continuation())
            .map(|c| if c.egc.is_empty() { " ".to_string() } else { c.egc })
            .collect()
    }

    #[test]
    fn put_str_truncates_at_edge() {
        let mut p = plane(2, 5);
        assert_eq!(p.put_str(0, 2, "hello", false).unwrap(), 3);
        assert_eq!(row(&p, 0), "  hel");
        assert_eq!(p.cursor_yx(), (0, 5));
    }

    #[test]
    fn put_str_wraps_when_scrolling() {
        let mut p = plane(2, 3);
        p.scrolling = true;
        assert_eq!(p.put_str(0, 0, "abcdefg", false).unwrap(), 7);
        assert_eq!(row(&p, 0), "def");
        assert_eq!(row(&p, 1), "g  ");
    }

    #[test]
    fn autogrow_widens_instead_of_truncating() {
        let mut p = plane(1, 3);
        p.flags |= PlaneFlags::AUTOGROW;
        assert_eq!(p.put_str(0, 1, "hello", false).unwrap(), 5);
        assert_eq!(p.dim_yx(), (1, 6));
        assert_eq!(row(&p, 0), " hello");
        assert_eq!(p.take_scrolled(), 0);
    }

    #[test]
    fn autogrow_adds_rows_when_scrolling() {
        let mut p = plane(2, 3);
        p.flags |= PlaneFlags::AUTOGROW;
        p.scrolling = true;
        assert_eq!(p.put_str(0, 0, "abcdefg", false).unwrap(), 7);
        assert_eq!(p.dim_yx(), (3, 3));
        assert_eq!(row(&p, 0), "abc");
        assert_eq!(row(&p, 2), "g  ");
        assert_eq!(p.take_scrolled(), 0);
    }

    #[test]
    fn scrolling_is_counted() {
        let mut p = plane(2, 3);
        p.scrolling = true;
        p.put_str(0, 0, "abcdefghi", false).unwrap();
        assert_eq!(p.take_scrolled(), 1);
        assert_eq!(p.take_scrolled(), 0);
        p.scroll_up(2).unwrap();
        assert_eq!(p.take_scrolled(), 2);
    }

    #[test]
    fn wide_glyph_occupies_two_cells() {
        let mut p = plane(1, 4);
        assert_eq!(p.put_str(0, 0, "中a", false).unwrap(), 3);
        assert!(p.at(0, 1).unwrap().is_continuation());
        assert_eq!(row(&p, 0), "中a ");
        // Overwriting the right half clears the left half.
        p.put_str(0, 1, "b", false).unwrap();
        assert_eq!(row(&p, 0), " ba ");
    }

    #[test]
    fn wide_glyph_at_last_column_is_dropped() {
        let mut p = plane(1, 3);
        assert_eq!(p.put_str(0, 2, "中", false).unwrap(), 0);
        assert_eq!(row(&p, 0), "   ");
    }

    #[test]
    fn spilled_clusters_are_released_on_overwrite() {
        let mut p = plane(1, 4);
        p.put_str(0, 0, "👩‍🔬", false).unwrap();
        assert_eq!(p.pool.len(), 1);
        assert_eq!(p.at(0, 0).unwrap().egc, "👩‍🔬");
        p.put_str(0, 0, "ab", false).unwrap();
        assert!(p.pool.is_empty());
    }

    #[test]
    fn stained_write_keeps_colours() {
        let mut p = plane(1, 3);
        p.channels = Channels::from_colors(Color::RED, Color::BLUE);
        p.put_str(0, 0, "abc", false).unwrap();
        p.channels = Channels::from_colors(Color::GREEN, Color::BLACK);
        p.put_str(0, 0, "xy", true).unwrap();
        let cell = p.at(0, 0).unwrap();
        assert_eq!(cell.egc, "x");
        assert_eq!(cell.channels.fg_rgb(), Color::RED);
    }

    #[test]
    fn aligned_text() {
        let mut p = plane(1, 10);
        p.put_str_aligned(0, Align::Right, "abc").unwrap();
        assert_eq!(row(&p, 0), "       abc");
        p.erase();
        p.put_str_aligned(0, Align::Center, "abcd").unwrap();
        assert_eq!(row(&p, 0), "   abcd   ");
    }

    #[test]
    fn rounded_box_perimeter() {
        let mut p = plane(3, 4);
        p.rounded_box(Style::NONE, Channels::DEFAULT, 2, 3, 0).unwrap();
        assert_eq!(row(&p, 0), "╭──╮");
        assert_eq!(row(&p, 1), "│  │");
        assert_eq!(row(&p, 2), "╰──╯");
        assert_eq!(p.cursor_yx(), (2, 3));
    }

    #[test]
    fn rounded_box_rejects_degenerate_and_oversized() {
        let mut p = plane(3, 4);
        assert!(p.rounded_box(Style::NONE, Channels::DEFAULT, 0, 3, 0).is_err());
        assert!(p.rounded_box(Style::NONE, Channels::DEFAULT, 3, 3, 0).is_err());
    }

    #[test]
    fn erase_region_negative_lengths_extend_backwards() {
        let mut p = plane(1, 6);
        p.put_str(0, 0, "abcdef", false).unwrap();
        p.erase_region(0, 3, 1, -2).unwrap();
        assert_eq!(row(&p, 0), "ab  ef");
        p.erase_region(0, 0, 0, 1).unwrap();
        assert_eq!(row(&p, 0), " b  ef");
        assert!(p.erase_region(1, 0, 1, 1).is_err());
    }

    #[test]
    fn gradient_hits_corner_colours() {
        let mut p = plane(6, 30);
        let fg = |c| Channels::from_fg(c);
        let n = p
            .gradient(
                0,
                0,
                6,
                30,
                " ",
                Style::NONE,
                [fg(Color::BLUE), fg(Color::GREEN), fg(Color::RED), fg(Color::WHITE)],
            )
            .unwrap();
        assert_eq!(n, 180);
        assert_eq!(p.at(0, 0).unwrap().channels.fg_rgb(), Color::BLUE);
        assert_eq!(p.at(0, 29).unwrap().channels.fg_rgb(), Color::GREEN);
        assert_eq!(p.at(5, 0).unwrap().channels.fg_rgb(), Color::RED);
        assert_eq!(p.at(5, 29).unwrap().channels.fg_rgb(), Color::WHITE);
        assert!(p.at(2, 2).unwrap().channels.bg_default());
    }

    #[test]
    fn high_gradient_uses_half_blocks() {
        let mut p = plane(2, 2);
        let blue = Channel::from_color(Color::BLUE);
        let white = Channel::from_color(Color::WHITE);
        p.gradient2x1(0, 0, 0, 0, [blue, blue, white, white]).unwrap();
        let top = p.at(0, 0).unwrap();
        assert_eq!(top.egc, "▀");
        assert_eq!(top.channels.fg_rgb(), Color::BLUE);
        assert_eq!(p.at(1, 1).unwrap().channels.bg_rgb(), Color::WHITE);
    }

    #[test]
    fn resize_keeps_origin_contents() {
        let mut p = plane(2, 4);
        p.put_str(0, 0, "abcd", false).unwrap();
        p.resize(3, 2).unwrap();
        assert_eq!(p.dim_yx(), (3, 2));
        assert_eq!(row(&p, 0), "ab");
        assert!(p.resize(0, 2).is_err());
    }

    #[test]
    fn scroll_up_requires_scrolling() {
        let mut p = plane(2, 2);
        assert!(p.scroll_up(1).is_err());
        p.scrolling = true;
        p.put_str(1, 0, "xy", false).unwrap();
        p.scroll_up(1).unwrap();
        assert_eq!(row(&p, 0), "xy");
        assert_eq!(row(&p, 1), "  ");
    }

    #[test]
    fn base_stands_in_for_empty_cells() {
        let mut p = plane(1, 2);
        let ch = Channels::from_colors(Color::WHITE, Color::BLACK);
        p.set_base(".", Style::BOLD, ch).unwrap();
        p.put_str(0, 1, "x", false).unwrap();
        let empty = p.visible(0, 0);
        assert_eq!(empty.egc, ".");
        assert_eq!(empty.channels, ch);
        assert_eq!(empty.styles, Style::BOLD);
        assert_eq!(p.visible(0, 1).egc, "x");
    }

    #[test]
    fn greyscale_skips_default_colours() {
        let mut p = plane(1, 1);
        p.channels = Channels::from_fg(Color::RED);
        p.put_str(0, 0, "x", false).unwrap();
        p.greyscale();
        let cell = p.at(0, 0).unwrap();
        assert_eq!(cell.channels.fg_rgb(), Color::RED.greyscale());
        assert!(cell.channels.bg_default());
    }
}
