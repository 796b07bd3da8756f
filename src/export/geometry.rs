//! Paper formats and fit-to-page placement

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

/// Physical paper format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageFormat {
    A3,
    #[default]
    A4,
    A5,
    Letter,
}

impl PageFormat {
    /// Portrait (width, height) in millimetres
    fn portrait_mm(self) -> (f64, f64) {
        match self {
            PageFormat::A3 => (297.0, 420.0),
            PageFormat::A4 => (210.0, 297.0),
            PageFormat::A5 => (148.0, 210.0),
            PageFormat::Letter => (215.9, 279.4),
        }
    }

    pub fn size(self, orientation: Orientation) -> PageSize {
        let (w, h) = self.portrait_mm();
        match orientation {
            Orientation::Portrait => PageSize { width_mm: w, height_mm: h },
            Orientation::Landscape => PageSize { width_mm: h, height_mm: w },
        }
    }
}

impl FromStr for PageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "a3" => Ok(PageFormat::A3),
            "a4" => Ok(PageFormat::A4),
            "a5" => Ok(PageFormat::A5),
            "letter" => Ok(PageFormat::Letter),
            other => Err(Error::ConfigError(format!("unknown page format '{}'", other))),
        }
    }
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageFormat::A3 => "A3",
            PageFormat::A4 => "A4",
            PageFormat::A5 => "A5",
            PageFormat::Letter => "Letter",
        };
        f.write_str(name)
    }
}

/// Page dimensions in millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

/// Where a bitmap lands on a page, in millimetres from the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Millimetres per bitmap pixel
    pub scale: f64,
}

/// Uniformly scale a `width_px` x `height_px` bitmap to fit `page`, centered.
///
/// The scale is `min(page_w / w, page_h / h)`, so one axis fills the page and
/// the other gets equal margins on both sides. Never stretches.
pub fn fit_to_page(page: PageSize, width_px: u32, height_px: u32) -> Result<Placement> {
    if width_px == 0 || height_px == 0 {
        return Err(Error::CaptureError(format!(
            "cannot place an empty {}x{} bitmap",
            width_px, height_px
        )));
    }
    let (w, h) = (f64::from(width_px), f64::from(height_px));
    let scale = (page.width_mm / w).min(page.height_mm / h);
    let width = w * scale;
    let height = h * scale;
    Ok(Placement {
        x: (page.width_mm - width) / 2.0,
        y: (page.height_mm - height) / 2.0,
        width,
        height,
        scale,
    })
}
