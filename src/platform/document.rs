/// Document-assembly seam: composing bitmaps into a paginated file

use std::path::PathBuf;

use crate::deck::Color;
use crate::export::geometry::{Orientation, PageFormat, PageSize};
use crate::platform::capture::Bitmap;
use crate::Result;

/// An in-memory document built up page by page.
///
/// A fresh document already holds one blank page. Coordinates are
/// millimetres measured from the top-left corner of the current (last) page.
/// Nothing reaches disk until [`PageDocument::save`].
pub trait PageDocument: Send {
    /// Size of the current page
    fn page_size(&self) -> PageSize;

    fn page_count(&self) -> usize;

    /// Append a blank page and make it current
    fn add_page(&mut self, orientation: Orientation, format: PageFormat) -> Result<()>;

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) -> Result<()>;

    fn draw_image(&mut self, bitmap: &Bitmap, x: f64, y: f64, width: f64, height: f64)
        -> Result<()>;

    /// Finalize and hand the file to the host's download mechanism.
    /// Returns where it ended up.
    fn save(self: Box<Self>, file_name: &str) -> Result<PathBuf>;
}

/// Factory for output documents
pub trait DocumentAssembler: Send + Sync {
    fn new_document(
        &self,
        orientation: Orientation,
        format: PageFormat,
    ) -> Result<Box<dyn PageDocument>>;
}
