use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::oneshot;

use crate::deck::{Slide, Theme};
use crate::platform::{Bitmap, CaptureBackend, CaptureOptions, CaptureRegion};
use crate::rendering::paint::ImageLoader;
use crate::{Error, Result, Viewport};

enum Command {
    Capture {
        index: usize,
        slide: Slide,
        theme: Theme,
        options: CaptureOptions,
        resp: oneshot::Sender<Result<Bitmap>>,
    },
    Settle(oneshot::Sender<()>),
    Close(oneshot::Sender<()>),
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}

/// A capture backend backed by a dedicated rendering thread.
///
/// The thread owns the image cache and renders one job at a time, in the
/// order jobs were submitted. Handles are cheap to clone; the thread exits on
/// [`close`](RasterWorker::close) or once every handle is dropped.
#[derive(Clone)]
pub struct RasterWorker {
    cmd_tx: Sender<Command>,
    viewport: Viewport,
}

impl RasterWorker {
    /// Spawn the rendering thread. Relative image paths resolve against `asset_root`.
    pub fn spawn(viewport: Viewport, asset_root: impl Into<PathBuf>) -> Result<Self> {
        let asset_root = asset_root.into();
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();

        thread::Builder::new()
            .name("slide-raster".to_string())
            .spawn(move || {
                let mut images = ImageLoader::new(&asset_root);
                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        Command::Capture { index, slide, theme, options, resp } => {
                            log::debug!("rendering slide {} (index {})", slide.id, index);
                            let res = panic::catch_unwind(AssertUnwindSafe(|| {
                                super::render_slide(&slide, &theme, viewport, &options, &mut images)
                            }))
                            .unwrap_or_else(|payload| {
                                log::error!("rendering slide {} panicked", slide.id);
                                // the cache may be half written
                                images = ImageLoader::new(&asset_root);
                                Err(Error::CaptureError(format!(
                                    "rendering slide {} failed: {}",
                                    slide.id,
                                    panic_message(payload.as_ref())
                                )))
                            });
                            let _ = resp.send(res);
                        }
                        Command::Settle(resp) => {
                            let _ = resp.send(());
                        }
                        Command::Close(resp) => {
                            let _ = resp.send(());
                            break;
                        }
                    }
                }
                log::debug!("raster worker stopped");
            })?;

        Ok(Self { cmd_tx, viewport })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Stop the rendering thread after the jobs already queued.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Close(tx))
            .map_err(|_| Error::Other("raster worker already stopped".to_string()))?;
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))
    }
}

impl CaptureBackend for RasterWorker {
    fn capture<'a>(
        &'a self,
        region: CaptureRegion<'a>,
        options: &'a CaptureOptions,
    ) -> BoxFuture<'a, Result<Bitmap>> {
        async move {
            region.ensure_measurable()?;
            let (tx, rx) = oneshot::channel();
            self.cmd_tx
                .send(Command::Capture {
                    index: region.index,
                    slide: region.slide.clone(),
                    theme: region.theme.clone(),
                    options: options.clone(),
                    resp: tx,
                })
                .map_err(|_| Error::CaptureError("raster worker stopped".to_string()))?;
            rx.await
                .map_err(|e| Error::CaptureError(format!("Capture canceled: {}", e)))?
        }
        .boxed()
    }

    fn layout_settled(&self) -> Option<BoxFuture<'_, ()>> {
        let (tx, rx) = oneshot::channel();
        let queued = self.cmd_tx.send(Command::Settle(tx)).is_ok();
        Some(
            async move {
                if queued {
                    let _ = rx.await;
                }
            }
            .boxed(),
        )
    }
}
