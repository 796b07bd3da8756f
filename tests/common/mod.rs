//! Test doubles for the platform seams.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt};
use slidedeck::deck::{Block, Color, Slide, SlideBody, SlideKind, Theme};
use slidedeck::export::{Orientation, PageFormat, PageSize};
use slidedeck::platform::{
    Bitmap, CaptureBackend, CaptureOptions, CaptureRegion, DocumentAssembler, MemoryNotifier,
    PageDocument, WindowedHost,
};
use slidedeck::{Deck, Error, Platform, Result, Viewer, ViewerConfig};
use tokio::sync::Notify;

pub fn deck(n: u32) -> Deck {
    let slides = (1..=n)
        .map(|id| Slide {
            id,
            kind: if id == 1 { SlideKind::Cover } else { SlideKind::Content },
            title: (id != 1).then(|| format!("Slide {}", id)),
            body: SlideBody::Full {
                content: vec![Block::Heading { text: format!("Heading {}", id), level: 1 }],
            },
        })
        .collect();
    Deck::new("Test deck", "test_A4.pdf", Theme::default(), slides).unwrap()
}

/// One capture call as seen by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureCall {
    pub index: usize,
    pub slide_id: u32,
    pub measurable: bool,
    pub scale: f32,
    pub background: Color,
    pub cors_safe: bool,
}

/// Returns a solid bitmap per slide, optionally failing at one index or
/// pausing on the first capture until released.
#[derive(Default)]
pub struct FakeCapture {
    pub calls: Mutex<Vec<CaptureCall>>,
    pub fail_at: Option<usize>,
    /// Signalled when the first capture starts
    pub started: Arc<Notify>,
    /// First capture waits for this when `hold_first` is set
    pub release: Arc<Notify>,
    pub hold_first: bool,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub settle_calls: AtomicUsize,
    pub settle_signal: bool,
}

impl FakeCapture {
    pub fn new() -> Self {
        Self { settle_signal: true, ..Default::default() }
    }

    pub fn failing_at(index: usize) -> Self {
        Self { fail_at: Some(index), ..Self::new() }
    }

    pub fn holding_first() -> Self {
        Self { hold_first: true, ..Self::new() }
    }

    pub fn calls(&self) -> Vec<CaptureCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl CaptureBackend for FakeCapture {
    fn capture<'a>(
        &'a self,
        region: CaptureRegion<'a>,
        options: &'a CaptureOptions,
    ) -> BoxFuture<'a, Result<Bitmap>> {
        async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let first = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(CaptureCall {
                    index: region.index,
                    slide_id: region.slide.id,
                    measurable: region.measurable,
                    scale: options.scale,
                    background: options.background,
                    cors_safe: options.cors_safe,
                });
                calls.len() == 1
            };
            if first && self.hold_first {
                self.started.notify_one();
                self.release.notified().await;
            }
            tokio::task::yield_now().await;
            let res = if self.fail_at == Some(region.index) {
                Err(Error::CaptureError(format!("boom on slide {}", region.slide.id)))
            } else {
                region.ensure_measurable().map(|()| {
                    // width encodes the slide so page order can be checked
                    Bitmap::solid(100 + region.index as u32, 50, options.background)
                })
            };
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            res
        }
        .boxed()
    }

    fn layout_settled(&self) -> Option<BoxFuture<'_, ()>> {
        if !self.settle_signal {
            return None;
        }
        self.settle_calls.fetch_add(1, Ordering::SeqCst);
        Some(tokio::task::yield_now().boxed())
    }
}

/// Everything a recording document was asked to do
#[derive(Debug, Default, Clone)]
pub struct DocLog {
    pub documents: usize,
    pub pages: usize,
    pub fills: Vec<(usize, Color)>,
    /// (page, bitmap width, x, y, w, h)
    pub draws: Vec<(usize, u32, f64, f64, f64, f64)>,
    pub saved: Vec<String>,
}

#[derive(Default, Clone)]
pub struct RecordingAssembler {
    pub log: Arc<Mutex<DocLog>>,
    pub fail_save: bool,
}

impl RecordingAssembler {
    pub fn log(&self) -> DocLog {
        self.log.lock().unwrap().clone()
    }
}

struct RecordingDocument {
    log: Arc<Mutex<DocLog>>,
    size: PageSize,
    pages: usize,
    fail_save: bool,
}

impl PageDocument for RecordingDocument {
    fn page_size(&self) -> PageSize {
        self.size
    }

    fn page_count(&self) -> usize {
        self.pages
    }

    fn add_page(&mut self, orientation: Orientation, format: PageFormat) -> Result<()> {
        self.pages += 1;
        self.size = format.size(orientation);
        self.log.lock().unwrap().pages = self.pages;
        Ok(())
    }

    fn fill_rect(&mut self, _x: f64, _y: f64, _w: f64, _h: f64, color: Color) -> Result<()> {
        self.log.lock().unwrap().fills.push((self.pages, color));
        Ok(())
    }

    fn draw_image(&mut self, bitmap: &Bitmap, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .draws
            .push((self.pages, bitmap.width(), x, y, w, h));
        Ok(())
    }

    fn save(self: Box<Self>, file_name: &str) -> Result<PathBuf> {
        if self.fail_save {
            return Err(Error::AssemblyError("disk full".to_string()));
        }
        self.log.lock().unwrap().saved.push(file_name.to_string());
        Ok(PathBuf::from("/downloads").join(file_name))
    }
}

impl DocumentAssembler for RecordingAssembler {
    fn new_document(
        &self,
        orientation: Orientation,
        format: PageFormat,
    ) -> Result<Box<dyn PageDocument>> {
        let mut log = self.log.lock().unwrap();
        log.documents += 1;
        log.pages = 1;
        Ok(Box::new(RecordingDocument {
            log: self.log.clone(),
            size: format.size(orientation),
            pages: 1,
            fail_save: self.fail_save,
        }))
    }
}

pub struct Rig {
    pub viewer: Viewer,
    pub capture: Arc<FakeCapture>,
    pub assembler: RecordingAssembler,
    pub notices: Arc<MemoryNotifier>,
}

pub fn rig_full(
    n: u32,
    capture: FakeCapture,
    assembler: RecordingAssembler,
    config: ViewerConfig,
) -> Rig {
    let capture = Arc::new(capture);
    let notices = Arc::new(MemoryNotifier::new());
    let platform = Platform {
        capture: capture.clone(),
        assembler: Arc::new(assembler.clone()),
        fullscreen: Arc::new(WindowedHost::new()),
        notifier: notices.clone(),
    };
    let viewer = Viewer::new(deck(n), config, platform).unwrap();
    Rig { viewer, capture, assembler, notices }
}

pub fn rig_with(n: u32, capture: FakeCapture, config: ViewerConfig) -> Rig {
    rig_full(n, capture, RecordingAssembler::default(), config)
}

pub fn rig(n: u32, capture: FakeCapture) -> Rig {
    rig_with(n, capture, ViewerConfig::default())
}
