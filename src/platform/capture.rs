/// Capture seam: turning a slide's rendered region into a bitmap

use futures::future::BoxFuture;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use sha2::{Digest, Sha256};
use std::io::Cursor;

use crate::deck::{Color, Slide, Theme};
use crate::{Error, Result};

/// An RGBA8 raster produced by a capture backend
#[derive(Debug, Clone)]
pub struct Bitmap {
    image: RgbaImage,
}

impl Bitmap {
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let px = Rgba([color.r, color.g, color.b, color.a]);
        Self::from_image(RgbaImage::from_pixel(width, height, px))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Packed RGB8 samples with alpha composited over `backdrop`.
    pub fn to_rgb_bytes(&self, backdrop: Color) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.image.as_raw().len() / 4 * 3);
        for px in self.image.pixels() {
            let [r, g, b, a] = px.0;
            if a == 255 {
                out.extend_from_slice(&[r, g, b]);
            } else {
                let t = f32::from(a) / 255.0;
                let c = backdrop.lerp(Color::rgb(r, g, b), t);
                out.extend_from_slice(&[c.r, c.g, c.b]);
            }
        }
        out
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(self.image.clone())
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(buf)
    }

    /// SHA-256 over dimensions and raw pixels, hex encoded
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width().to_le_bytes());
        hasher.update(self.height().to_le_bytes());
        hasher.update(self.image.as_raw());
        hex::encode(hasher.finalize())
    }
}

/// Options passed with every capture request
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOptions {
    /// Oversampling factor applied to the region's layout size
    pub scale: f32,
    /// Opaque fill painted before the region, so transparent areas are not white
    pub background: Color,
    /// Substitute cross-origin images instead of failing the capture
    pub cors_safe: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            background: Theme::default().export_background,
            cors_safe: true,
        }
    }
}

/// The visual region of one slide, as handed to a capture backend
#[derive(Debug, Clone, Copy)]
pub struct CaptureRegion<'a> {
    pub index: usize,
    pub slide: &'a Slide,
    pub theme: &'a Theme,
    /// Whether the region is currently laid out (present and not hidden)
    pub measurable: bool,
}

impl CaptureRegion<'_> {
    /// Backends call this first: a hidden region cannot be captured.
    pub fn ensure_measurable(&self) -> Result<()> {
        if self.measurable {
            Ok(())
        } else {
            Err(Error::CaptureError(format!(
                "slide {} (index {}) is not laid out",
                self.slide.id, self.index
            )))
        }
    }
}

/// Rasterizes slide regions.
///
/// The controller never has two captures in flight; implementations may rely
/// on exclusive access to whatever layout state they read.
pub trait CaptureBackend: Send + Sync {
    fn capture<'a>(
        &'a self,
        region: CaptureRegion<'a>,
        options: &'a CaptureOptions,
    ) -> BoxFuture<'a, Result<Bitmap>>;

    /// Resolves once pending layout changes have been applied. `None` means
    /// the backend has no such signal and callers should wait a fixed delay.
    fn layout_settled(&self) -> Option<BoxFuture<'_, ()>> {
        None
    }
}
