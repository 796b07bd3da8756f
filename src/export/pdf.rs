//! PDF document backend built on `lopdf`.
//!
//! The whole document stays in memory until `save`, which serializes it and
//! writes a single file into the download directory. An export that fails
//! part way simply drops the document.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::fs;
use std::path::{Path, PathBuf};

use crate::deck::Color;
use crate::export::geometry::{Orientation, PageFormat, PageSize};
use crate::platform::{Bitmap, DocumentAssembler, PageDocument};
use crate::{Error, Result};

const PT_PER_MM: f64 = 72.0 / 25.4;

fn pt(mm: f64) -> f32 {
    (mm * PT_PER_MM) as f32
}

/// Writes exported decks as PDF files into `download_dir`
#[derive(Debug, Clone)]
pub struct PdfAssembler {
    download_dir: PathBuf,
}

impl PdfAssembler {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self { download_dir: download_dir.into() }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }
}

impl DocumentAssembler for PdfAssembler {
    fn new_document(
        &self,
        orientation: Orientation,
        format: PageFormat,
    ) -> Result<Box<dyn PageDocument>> {
        Ok(Box::new(PdfDocument::new(
            self.download_dir.clone(),
            format.size(orientation),
        )))
    }
}

struct PdfPage {
    size: PageSize,
    operations: Vec<Operation>,
    images: Vec<(String, ObjectId)>,
    /// Last solid fill, used as the backdrop for translucent image pixels
    backdrop: Color,
}

impl PdfPage {
    fn blank(size: PageSize) -> Self {
        Self {
            size,
            operations: Vec::new(),
            images: Vec::new(),
            backdrop: Color::rgb(255, 255, 255),
        }
    }

    /// Convert a top-left based mm rectangle to PDF user space (points, bottom-left origin)
    fn to_user_space(&self, x: f64, y: f64, width: f64, height: f64) -> [f32; 4] {
        [
            pt(x),
            pt(self.size.height_mm - y - height),
            pt(width),
            pt(height),
        ]
    }
}

/// A PDF under construction
pub struct PdfDocument {
    doc: Document,
    pages_id: ObjectId,
    pages: Vec<PdfPage>,
    download_dir: PathBuf,
    image_count: usize,
}

impl PdfDocument {
    fn new(download_dir: PathBuf, first_page: PageSize) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            pages: vec![PdfPage::blank(first_page)],
            download_dir,
            image_count: 0,
        }
    }

    fn current(&mut self) -> Result<&mut PdfPage> {
        self.pages
            .last_mut()
            .ok_or_else(|| Error::AssemblyError("document has no pages".to_string()))
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        let pages_id = self.pages_id;
        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());

        for page in std::mem::take(&mut self.pages) {
            let content = Content { operations: page.operations }
                .encode()
                .map_err(|e| Error::AssemblyError(e.to_string()))?;
            let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));

            let mut xobjects = Dictionary::new();
            for (name, id) in page.images {
                xobjects.set(name, id);
            }
            let media_box: Vec<Object> = vec![
                0_i64.into(),
                0_i64.into(),
                pt(page.size.width_mm).into(),
                pt(page.size.height_mm).into(),
            ];
            let page_id = self.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box,
                "Contents" => content_id,
                "Resources" => dictionary! { "XObject" => xobjects },
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        };
        self.doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| Error::AssemblyError(e.to_string()))?;
        Ok(bytes)
    }
}

impl PageDocument for PdfDocument {
    fn page_size(&self) -> PageSize {
        self.pages.last().map_or(
            PageFormat::A4.size(Orientation::Landscape),
            |p| p.size,
        )
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn add_page(&mut self, orientation: Orientation, format: PageFormat) -> Result<()> {
        self.pages.push(PdfPage::blank(format.size(orientation)));
        Ok(())
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) -> Result<()> {
        let page = self.current()?;
        let [ux, uy, uw, uh] = page.to_user_space(x, y, width, height);
        let (r, g, b) = color.to_unit_rgb();
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new("re", vec![ux.into(), uy.into(), uw.into(), uh.into()]),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
        page.backdrop = color.opaque();
        Ok(())
    }

    fn draw_image(
        &mut self,
        bitmap: &Bitmap,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        let backdrop = self.current()?.backdrop;
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(bitmap.width()),
                "Height" => i64::from(bitmap.height()),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
            },
            bitmap.to_rgb_bytes(backdrop),
        );
        let image_id = self.doc.add_object(stream);
        self.image_count += 1;
        let name = format!("Im{}", self.image_count);

        let page = self.current()?;
        let [ux, uy, uw, uh] = page.to_user_space(x, y, width, height);
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![uw.into(), 0_i64.into(), 0_i64.into(), uh.into(), ux.into(), uy.into()],
            ),
            Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ]);
        page.images.push((name, image_id));
        Ok(())
    }

    fn save(self: Box<Self>, file_name: &str) -> Result<PathBuf> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(Error::AssemblyError(format!("invalid file name '{}'", file_name)));
        }
        let dir = self.download_dir.clone();
        let bytes = (*self).finish()?;
        fs::create_dir_all(&dir)
            .map_err(|e| Error::AssemblyError(format!("{}: {}", dir.display(), e)))?;
        let path = dir.join(file_name);
        fs::write(&path, bytes)
            .map_err(|e| Error::AssemblyError(format!("{}: {}", path.display(), e)))?;
        log::info!("saved {}", path.display());
        Ok(path)
    }
}
