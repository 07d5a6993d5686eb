#![forbid(unsafe_code)]

//! Decoded images and cell blitters.
//!
//! Two blitters are native: 1x1 (one pixel per cell, painted as background)
//! and 2x1 (two stacked pixels per cell using half blocks). Every other
//! blitter degrades to 2x1 unless degradation is refused. Pixel offsets only
//! apply to the pixel blitter, which always degrades, so they are ignored.

use std::path::Path;

use image::{RgbaImage, imageops, imageops::FilterType};
use ncwrap_core::{Align, Alpha, Channel, Channels, Color, Style};

use super::model::Model;
use crate::error::EngineError;
use crate::handle::{PlaneHandle, VisualHandle};
use crate::options::{BlitFlags, BlitOptions, Blitter, PlaneOptions, Scale};

#[derive(Debug, Clone)]
pub(crate) struct VisualState {
    image: RgbaImage,
}

/// Fully transparent channels, for planes a blit allocates.
const CLEAR: Channels = Channels::combine(
    Channel::from_raw(Alpha::Transparent as u32),
    Channel::from_raw(Alpha::Transparent as u32),
);

fn scale_to_fit(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let scale = (max_width as f32 / width as f32).min(max_height as f32 / height as f32);
    let new_w = (width as f32 * scale).round().max(1.0) as u32;
    let new_h = (height as f32 * scale).round().max(1.0) as u32;
    (new_w, new_h)
}

/// Resize `image` for an area of `avail` cells of `cell_px` pixels each.
fn fit_image(
    image: RgbaImage,
    scaling: Scale,
    (avail_rows, avail_cols): (u32, u32),
    (cell_h, cell_w): (u32, u32),
    nearest: bool,
) -> RgbaImage {
    let (w, h) = image.dimensions();
    let (max_w, max_h) = (avail_cols * cell_w, avail_rows * cell_h);
    let (new_w, new_h) = match scaling {
        Scale::None | Scale::NoneHiRes => return image,
        Scale::Stretch => (max_w, max_h),
        Scale::Scale | Scale::ScaleHiRes => scale_to_fit(w, h, max_w, max_h),
    };
    if (new_w, new_h) == (w, h) {
        return image;
    }
    let filter = if nearest {
        FilterType::Nearest
    } else {
        FilterType::Triangle
    };
    imageops::resize(&image, new_w, new_h, filter)
}

/// The source region selected by `begin`/`len` (`len` 0 meaning to the edge).
fn crop(image: &RgbaImage, options: &BlitOptions) -> Result<RgbaImage, EngineError> {
    let (w, h) = image.dimensions();
    let (by, bx) = (options.begin_y, options.begin_x);
    if by >= h || bx >= w {
        return Err(EngineError::invalid(format!(
            "region origin ({by}, {bx}) outside {h}x{w} image"
        )));
    }
    let len_y = if options.len_y == 0 { h - by } else { options.len_y };
    let len_x = if options.len_x == 0 { w - bx } else { options.len_x };
    if by + len_y > h || bx + len_x > w {
        return Err(EngineError::invalid(format!(
            "region {len_y}x{len_x} at ({by}, {bx}) exceeds {h}x{w} image"
        )));
    }
    if (by, bx, len_y, len_x) == (0, 0, h, w) {
        return Ok(image.clone());
    }
    Ok(imageops::crop_imm(image, bx, by, len_x, len_y).to_image())
}

/// Colour of pixel `(x, y)`, or `None` where the image is transparent.
fn pixel(image: &RgbaImage, x: u32, y: u32, options: &BlitOptions) -> Option<Color> {
    if x >= image.width() || y >= image.height() {
        return None;
    }
    let [r, g, b, a] = image.get_pixel(x, y).0;
    let color = Color::rgb(r, g, b);
    let keyed = options.flags.contains(BlitFlags::ADDALPHA)
        && color == Color::from_u32(options.transcolor);
    (a >= 128 && !keyed).then_some(color)
}

impl Model {
    fn visual(&self, handle: VisualHandle) -> &VisualState {
        match self.visuals.get(&handle) {
            Some(v) => v,
            None => panic!("dangling visual handle {handle}"),
        }
    }

    fn insert_visual(&mut self, image: RgbaImage) -> VisualHandle {
        let handle = self.alloc_visual();
        self.visuals.insert(handle, VisualState { image });
        self.stats.visual_creates += 1;
        handle
    }

    pub(crate) fn load_visual_file(&mut self, path: &Path) -> Result<VisualHandle, EngineError> {
        self.ensure_running()?;
        let image = image::open(path)
            .map_err(|e| EngineError::Image(format!("{}: {e}", path.display())))?
            .to_rgba8();
        Ok(self.insert_visual(image))
    }

    pub(crate) fn load_visual_rgba(
        &mut self,
        rows: u32,
        cols: u32,
        data: &[u8],
    ) -> Result<VisualHandle, EngineError> {
        self.ensure_running()?;
        if rows == 0 || cols == 0 {
            return Err(EngineError::invalid("empty RGBA image"));
        }
        let image = RgbaImage::from_raw(cols, rows, data.to_vec()).ok_or_else(|| {
            EngineError::invalid(format!(
                "{} bytes is not a {rows}x{cols} RGBA image",
                data.len()
            ))
        })?;
        Ok(self.insert_visual(image))
    }

    /// Pixel size as `(rows, cols)`.
    pub(crate) fn visual_dims(&self, handle: VisualHandle) -> (u32, u32) {
        let (w, h) = self.visual(handle).image.dimensions();
        (h, w)
    }

    pub(crate) fn destroy_visual(&mut self, handle: VisualHandle) {
        if self.visuals.remove(&handle).is_none() {
            panic!("dangling visual handle {handle}");
        }
        self.release_visual(handle);
        self.stats.visual_destroys += 1;
    }

    /// Render a visual into a plane, returning the plane drawn on.
    ///
    /// With no target plane, or with `CHILDPLANE`, a new plane is created
    /// (under the standard plane or the target respectively).
    pub(crate) fn blit(
        &mut self,
        handle: VisualHandle,
        options: &BlitOptions,
    ) -> Result<PlaneHandle, EngineError> {
        self.ensure_running()?;
        let cell_px = match options.blitter {
            Blitter::Default | Blitter::TwoByOne => (2, 1),
            Blitter::OneByOne => (1, 1),
            other if options.flags.contains(BlitFlags::NO_DEGRADE) => {
                tracing::debug!(blitter = ?other, "blitter unavailable, degradation refused");
                return Err(EngineError::Unsupported("blitter"));
            }
            other => {
                tracing::debug!(blitter = ?other, "degrading blitter to 2x1");
                (2, 1)
            }
        };
        let source = crop(&self.visual(handle).image, options)?;

        let new_plane = options.plane.is_none() || options.flags.contains(BlitFlags::CHILDPLANE);
        let anchor = match options.plane {
            Some(plane) => plane,
            None => self.std_plane()?,
        };
        let (arows, acols) = self.plane(anchor).dim_yx();
        let valigned = options.flags.contains(BlitFlags::VERALIGNED);
        let haligned = options.flags.contains(BlitFlags::HORALIGNED);
        let oy = if valigned { 0 } else { options.y.max(0) as u32 };
        let ox = if haligned { 0 } else { options.x.max(0) as u32 };
        let avail = (
            arows.saturating_sub(oy).max(1),
            acols.saturating_sub(ox).max(1),
        );
        let nearest = options.flags.contains(BlitFlags::NOINTERPOLATE);
        let image = fit_image(source, options.scaling, avail, cell_px, nearest);

        let (cell_h, cell_w) = cell_px;
        let rows = image.height().div_ceil(cell_h);
        let cols = image.width().div_ceil(cell_w);
        let place = |raw: i32, aligned: bool, span: u32, len: u32| {
            if aligned {
                Align::from_raw(raw.max(0) as u32).offset(span, len).unwrap_or(0) as i32
            } else {
                raw
            }
        };
        let y = place(options.y, valigned, arows, rows);
        let x = place(options.x, haligned, acols, cols);

        let (target, y, x) = if new_plane {
            let plane = self.create_plane(anchor, &PlaneOptions::new(y, x, rows, cols))?;
            self.plane_mut(plane).set_base("", Style::NONE, CLEAR)?;
            (plane, 0, 0)
        } else {
            (anchor, y, x)
        };

        let alpha = if options.flags.contains(BlitFlags::BLEND) {
            Alpha::Blend
        } else {
            Alpha::Opaque
        };
        let clear = Channel::DEFAULT.with_alpha(Alpha::Transparent);
        let plane = self.plane_mut(target);
        let (prows, pcols) = plane.dim_yx();
        for r in 0..rows {
            for c in 0..cols {
                let (py, px) = (y + r as i32, x + c as i32);
                if py < 0 || px < 0 || py >= prows as i32 || px >= pcols as i32 {
                    continue;
                }
                let (egc, channels) = if cell_h == 1 {
                    let Some(color) = pixel(&image, c, r, options) else {
                        continue;
                    };
                    let ch = Channel::from_color_alpha(color, alpha);
                    (" ", Channels::combine(ch, ch))
                } else {
                    let top = pixel(&image, c, r * 2, options);
                    let bottom = pixel(&image, c, r * 2 + 1, options);
                    let paint = |color: Color| Channel::from_color_alpha(color, alpha);
                    match (top, bottom) {
                        (Some(t), Some(b)) => ("▀", Channels::combine(paint(t), paint(b))),
                        (Some(t), None) => ("▀", Channels::combine(paint(t), clear)),
                        (None, Some(b)) => ("▄", Channels::combine(paint(b), clear)),
                        (None, None) => continue,
                    }
                };
                plane.write_egc(py as u32, px as u32, egc, Style::NONE, channels)?;
            }
        }
        self.stats.blits += 1;
        tracing::trace!(visual = %handle, plane = %target, rows, cols, "soft blit");
        Ok(target)
    }
}
