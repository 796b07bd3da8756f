//! Software capture backend
//!
//! Slides go through three stages: [`layout`] places boxes in viewport
//! pixels, [`paint`] resolves them into colored drawing commands, and
//! [`raster`] draws those into an RGBA bitmap at the capture scale.
//! [`worker::RasterWorker`] runs the pipeline on its own thread behind the
//! [`CaptureBackend`](crate::platform::CaptureBackend) seam.

pub mod layout;
pub mod paint;
pub mod raster;
pub mod worker;

pub use layout::{layout_slide, LayoutNode, NodeKind, Rect};
pub use paint::{paint_nodes, ImageLoader, ImageSource, PaintCommand};
pub use raster::rasterize;
pub use worker::RasterWorker;

use crate::deck::{Slide, Theme};
use crate::platform::{Bitmap, CaptureOptions};
use crate::{Result, Viewport};

/// Render one slide synchronously, the way the worker does it.
pub fn render_slide(
    slide: &Slide,
    theme: &Theme,
    viewport: Viewport,
    options: &CaptureOptions,
    images: &mut ImageLoader,
) -> Result<Bitmap> {
    let nodes = layout_slide(slide, viewport);
    let commands = paint_nodes(&nodes, theme, images, options.cors_safe)?;
    rasterize(&commands, viewport, options.scale, options.background)
}
