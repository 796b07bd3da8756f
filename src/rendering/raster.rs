/// Software rasterizer for paint commands
///
/// Everything is drawn into an opaque RGBA canvas. Text is approximated by
/// one filled box per visible glyph, which keeps output deterministic across
/// machines (no font discovery) and good enough for page composition.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::deck::Color;
use crate::platform::Bitmap;
use crate::rendering::layout::{glyph_width, Rect};
use crate::rendering::paint::PaintCommand;
use crate::{Error, Result, Viewport};

/// Largest canvas edge accepted, in device pixels
pub const MAX_CANVAS_EDGE: u32 = 16_384;

struct Canvas {
    img: RgbaImage,
    scale: f32,
}

impl Canvas {
    /// Map a layout rectangle to device pixels, clipped to the canvas.
    /// Returns `None` when nothing is left after clipping.
    fn device_rect(&self, r: Rect) -> Option<(u32, u32, u32, u32)> {
        let s = self.scale;
        let x0 = (r.x as f32 * s).round().max(0.0) as u32;
        let y0 = (r.y as f32 * s).round().max(0.0) as u32;
        let x1 = (((r.x as f32) + r.width as f32) * s).round().max(0.0) as u32;
        let y1 = (((r.y as f32) + r.height as f32) * s).round().max(0.0) as u32;
        let x1 = x1.min(self.img.width());
        let y1 = y1.min(self.img.height());
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0, y0, x1, y1))
    }

    fn blend(&mut self, x: u32, y: u32, c: Color) {
        let px = self.img.get_pixel_mut(x, y);
        if c.a == 255 {
            *px = Rgba([c.r, c.g, c.b, 255]);
            return;
        }
        let [r, g, b, _] = px.0;
        let mixed = Color::rgb(r, g, b).lerp(c.opaque(), f32::from(c.a) / 255.0);
        *px = Rgba([mixed.r, mixed.g, mixed.b, 255]);
    }

    fn fill(&mut self, r: Rect, c: Color) {
        if let Some((x0, y0, x1, y1)) = self.device_rect(r) {
            for y in y0..y1 {
                for x in x0..x1 {
                    self.blend(x, y, c);
                }
            }
        }
    }

    fn gradient(&mut self, r: Rect, from: Color, to: Color) {
        let Some((x0, y0, x1, y1)) = self.device_rect(r) else {
            return;
        };
        let w = (x1 - x0).max(2) - 1;
        let h = (y1 - y0).max(2) - 1;
        for y in y0..y1 {
            let ty = (y - y0) as f32 / h as f32;
            for x in x0..x1 {
                let tx = (x - x0) as f32 / w as f32;
                self.blend(x, y, from.lerp(to, (tx + ty) / 2.0));
            }
        }
    }

    fn outline(&mut self, r: Rect, c: Color) {
        let Some((x0, y0, x1, y1)) = self.device_rect(r) else {
            return;
        };
        for x in x0..x1 {
            self.blend(x, y0, c);
            if y1 - 1 > y0 {
                self.blend(x, y1 - 1, c);
            }
        }
        for y in (y0 + 1)..y1.saturating_sub(1) {
            self.blend(x0, y, c);
            if x1 - 1 > x0 {
                self.blend(x1 - 1, y, c);
            }
        }
    }

    fn text(&mut self, x: i32, y: i32, size: u32, c: Color, text: &str) {
        let advance = glyph_width(size);
        // glyph body sits in the lower part of the line box
        let top = y + (size / 4) as i32;
        let height = (size * 7 / 10).max(1);
        let width = (advance * 4 / 5).max(1);
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let gx = x + (advance * i as u32) as i32;
            self.fill(Rect::new(gx, top, width, height), c);
        }
    }

    fn image(&mut self, r: Rect, pixels: &RgbaImage) {
        let Some((x0, y0, x1, y1)) = self.device_rect(r) else {
            return;
        };
        let (bw, bh) = (x1 - x0, y1 - y0);
        let (iw, ih) = pixels.dimensions();
        if iw == 0 || ih == 0 {
            return;
        }
        let fit = (bw as f32 / iw as f32).min(bh as f32 / ih as f32);
        let tw = ((iw as f32 * fit).round() as u32).clamp(1, bw);
        let th = ((ih as f32 * fit).round() as u32).clamp(1, bh);
        let scaled = imageops::resize(pixels, tw, th, FilterType::Triangle);
        let ox = x0 + (bw - tw) / 2;
        let oy = y0 + (bh - th) / 2;
        for (sx, sy, px) in scaled.enumerate_pixels() {
            let [r, g, b, a] = px.0;
            if a > 0 {
                self.blend(ox + sx, oy + sy, Color::rgba(r, g, b, a));
            }
        }
    }
}

/// Device size of a `viewport` captured at `scale`
pub fn canvas_size(viewport: Viewport, scale: f32) -> Result<(u32, u32)> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::CaptureError(format!("invalid capture scale {}", scale)));
    }
    let w = (viewport.width as f32 * scale).round();
    let h = (viewport.height as f32 * scale).round();
    if w < 1.0 || h < 1.0 || w > MAX_CANVAS_EDGE as f32 || h > MAX_CANVAS_EDGE as f32 {
        return Err(Error::CaptureError(format!(
            "canvas {}x{} outside 1..={} pixels",
            w, h, MAX_CANVAS_EDGE
        )));
    }
    Ok((w as u32, h as u32))
}

/// Draw `commands` in order onto a `viewport`-sized canvas oversampled by
/// `scale`. The canvas starts filled with `background` (made opaque).
pub fn rasterize(
    commands: &[PaintCommand],
    viewport: Viewport,
    scale: f32,
    background: Color,
) -> Result<Bitmap> {
    let (w, h) = canvas_size(viewport, scale)?;
    let bg = background.opaque();
    let mut canvas = Canvas {
        img: RgbaImage::from_pixel(w, h, Rgba([bg.r, bg.g, bg.b, 255])),
        scale,
    };
    for cmd in commands {
        match cmd {
            PaintCommand::Gradient { rect, from, to } => canvas.gradient(*rect, *from, *to),
            PaintCommand::SolidRect { rect, color } => canvas.fill(*rect, *color),
            PaintCommand::Outline { rect, color } => canvas.outline(*rect, *color),
            PaintCommand::Text { x, y, size, color, text } => {
                canvas.text(*x, *y, *size, *color, text)
            }
            PaintCommand::Image { rect, pixels } => canvas.image(*rect, pixels),
        }
    }
    Ok(Bitmap::from_image(canvas.img))
}
