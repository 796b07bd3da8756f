//! Deck export: page geometry and document backends
//!
//! The sequencing of an export (flag handling, settling, one capture at a
//! time) lives in [`crate::controller`]; this module knows how a single
//! captured bitmap becomes a page.

pub mod geometry;
#[cfg(feature = "pdf")]
pub mod pdf;

pub use geometry::{fit_to_page, Orientation, PageFormat, PageSize, Placement};

use std::path::PathBuf;

use crate::deck::Color;
use crate::platform::{Bitmap, PageDocument};
use crate::{Error, Result};

/// Outcome of a finished export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// Where the document was saved
    pub path: PathBuf,
    pub pages: usize,
}

/// What a call to `export_deck` did
#[derive(Debug)]
pub enum ExportStatus {
    Completed(ExportReport),
    /// The export aborted; nothing was saved and a notice was shown
    Failed(Error),
    /// Another export was still running, so this call did nothing
    AlreadyRunning,
}

impl ExportStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, ExportStatus::Completed(_))
    }
}

/// Lay one captured slide onto `doc`.
///
/// The first slide reuses the page a new document starts with, later ones
/// append a page first. The page is filled with `background`, then the bitmap
/// is drawn scaled to fit and centered.
pub fn place_slide(
    doc: &mut dyn PageDocument,
    bitmap: &Bitmap,
    position: usize,
    orientation: Orientation,
    format: PageFormat,
    background: Color,
) -> Result<Placement> {
    if position > 0 {
        doc.add_page(orientation, format)?;
    }
    let page = doc.page_size();
    let placement = fit_to_page(page, bitmap.width(), bitmap.height())?;
    doc.fill_rect(0.0, 0.0, page.width_mm, page.height_mm, background)?;
    doc.draw_image(
        bitmap,
        placement.x,
        placement.y,
        placement.width,
        placement.height,
    )?;
    Ok(placement)
}
