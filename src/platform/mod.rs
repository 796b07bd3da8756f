//! Platform surface: capture, document assembly, fullscreen, user notices
//!
//! The viewer core talks to its environment only through these traits, so it
//! can run against a real host, the headless backends in this crate, or test
//! doubles.

pub mod capture;
pub mod document;
pub mod fullscreen;
pub mod notice;

pub use capture::{Bitmap, CaptureBackend, CaptureOptions, CaptureRegion};
pub use document::{DocumentAssembler, PageDocument};
pub use fullscreen::{FullscreenHost, WindowedHost};
pub use notice::{LogNotifier, MemoryNotifier, Notice, NoticeLevel, Notifier};

use std::sync::Arc;

/// The collaborators a [`Viewer`](crate::controller::Viewer) is wired to
#[derive(Clone)]
pub struct Platform {
    pub capture: Arc<dyn CaptureBackend>,
    pub assembler: Arc<dyn DocumentAssembler>,
    pub fullscreen: Arc<dyn FullscreenHost>,
    pub notifier: Arc<dyn Notifier>,
}

impl Platform {
    /// Software capture worker, PDF output into `config.download_dir`, a
    /// windowed fullscreen host and log-backed notices.
    #[cfg(feature = "pdf")]
    pub fn headless(config: &crate::ViewerConfig) -> crate::Result<Self> {
        let worker = crate::rendering::worker::RasterWorker::spawn(
            config.viewport,
            config.asset_root.clone(),
        )?;
        Ok(Self {
            capture: Arc::new(worker),
            assembler: Arc::new(crate::export::pdf::PdfAssembler::new(config.download_dir.clone())),
            fullscreen: Arc::new(WindowedHost::new()),
            notifier: Arc::new(LogNotifier),
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_fullscreen(mut self, host: Arc<dyn FullscreenHost>) -> Self {
        self.fullscreen = host;
        self
    }
}
