//! Viewer/Exporter Controller
//!
//! [`Viewer`] owns the session state for one deck: which slide is current,
//! whether an export is running, and which slide that export is capturing.
//! All methods take `&self`; the state sits behind a mutex that is never held
//! across an `.await`, so navigation calls made while [`Viewer::export_deck`]
//! is suspended see `is_exporting == true` and are refused.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::deck::{Deck, Slide};
use crate::export::{place_slide, ExportReport, ExportStatus};
use crate::navigation::{Button, KeyEvent, NavCommand, Navigator};
use crate::platform::{Bitmap, CaptureOptions, CaptureRegion, Notice, Platform};
use crate::{Error, Result, ViewerConfig, VisibilityPolicy};

/// Snapshot of the viewer's mutable state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerState {
    pub current_index: usize,
    pub is_exporting: bool,
    /// Slide the running export is capturing right now
    pub capturing: Option<usize>,
}

struct Session {
    nav: Navigator,
    is_exporting: bool,
    capturing: Option<usize>,
}

/// Result of [`Viewer::toggle_fullscreen`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FullscreenChange {
    Entered,
    Exited,
    /// The host refused; a notice was shown and nothing changed
    Denied(String),
}

/// What the navigation bar shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlBar {
    pub previous_enabled: bool,
    pub next_enabled: bool,
    /// "Slide {n} / {N}", 1-based
    pub position: String,
    pub fullscreen_label: &'static str,
    /// The export control is hidden while fullscreen
    pub export_visible: bool,
    pub export_busy: bool,
    pub export_label: &'static str,
}

/// Clears the export flags when an export ends, however it ends
struct ExportGuard<'a> {
    session: &'a Mutex<Session>,
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        let mut s = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        s.is_exporting = false;
        s.capturing = None;
    }
}

pub struct Viewer {
    deck: Deck,
    config: ViewerConfig,
    platform: Platform,
    session: Mutex<Session>,
}

impl Viewer {
    /// Mount a viewer on `deck`, starting at the first slide.
    pub fn new(deck: Deck, config: ViewerConfig, platform: Platform) -> Result<Self> {
        config.validate()?;
        let nav = Navigator::new(deck.len())?;
        log::debug!("viewer mounted on '{}' ({} slides)", deck.title(), deck.len());
        Ok(Self {
            deck,
            config,
            platform,
            session: Mutex::new(Session {
                nav,
                is_exporting: false,
                capturing: None,
            }),
        })
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn state(&self) -> ViewerState {
        let s = self.session();
        ViewerState {
            current_index: s.nav.current(),
            is_exporting: s.is_exporting,
            capturing: s.capturing,
        }
    }

    pub fn current_index(&self) -> usize {
        self.session().nav.current()
    }

    pub fn current_slide(&self) -> &Slide {
        let i = self.current_index();
        &self.deck.slides()[i]
    }

    pub fn is_exporting(&self) -> bool {
        self.session().is_exporting
    }

    /// Asks the host; the viewer keeps no fullscreen flag of its own.
    pub fn is_fullscreen(&self) -> bool {
        self.platform.fullscreen.is_fullscreen()
    }

    /// Apply a transition unless an export is running. Returns whether the
    /// current index changed.
    pub fn navigate(&self, cmd: NavCommand) -> bool {
        let mut s = self.session();
        if s.is_exporting {
            log::debug!("ignoring {:?}: export in progress", cmd);
            return false;
        }
        let moved = s.nav.apply(cmd);
        if moved {
            log::debug!("{:?} -> slide {}", cmd, s.nav.current());
        }
        moved
    }

    /// Key-down handler. Unmapped keys and auto-repeat events do nothing.
    pub fn handle_key(&self, event: &KeyEvent) -> bool {
        match self.config.keymap.resolve(event) {
            Some(cmd) => self.navigate(cmd),
            None => false,
        }
    }

    /// Click on a navigation button. A disabled button does nothing.
    pub fn press_button(&self, button: Button) -> bool {
        if !self.session().nav.is_enabled(button) {
            return false;
        }
        self.navigate(button.command())
    }

    /// Whether slide `index` is laid out and therefore capturable.
    ///
    /// The current slide always is. During an export the policy decides for
    /// the others.
    pub fn is_slide_visible(&self, index: usize) -> bool {
        let s = self.session();
        if index >= s.nav.len() {
            return false;
        }
        if index == s.nav.current() {
            return true;
        }
        if !s.is_exporting {
            return false;
        }
        match self.config.visibility_policy {
            VisibilityPolicy::AllSlides => true,
            VisibilityPolicy::OneAtATime => s.capturing == Some(index),
        }
    }

    pub fn control_bar(&self) -> ControlBar {
        let fullscreen = self.is_fullscreen();
        let s = self.session();
        ControlBar {
            previous_enabled: s.nav.is_enabled(Button::Previous),
            next_enabled: s.nav.is_enabled(Button::Next),
            position: format!("Slide {} / {}", s.nav.current() + 1, s.nav.len()),
            fullscreen_label: if fullscreen { "Exit fullscreen" } else { "Enter fullscreen" },
            export_visible: !fullscreen,
            export_busy: s.is_exporting,
            export_label: if s.is_exporting { "Generating A4..." } else { "Export PDF (A4)" },
        }
    }

    /// Enter fullscreen if not in it, leave it otherwise. A refusal is shown
    /// as a notice and changes nothing.
    pub async fn toggle_fullscreen(&self) -> FullscreenChange {
        let host = &self.platform.fullscreen;
        let entering = !host.is_fullscreen();
        let res = if entering {
            host.request_fullscreen().await
        } else {
            host.exit_fullscreen().await
        };
        match res {
            Ok(()) if entering => FullscreenChange::Entered,
            Ok(()) => FullscreenChange::Exited,
            Err(e) => {
                let message = format!("Could not toggle fullscreen: {}", e);
                self.platform.notifier.notify(Notice::error(message.clone()));
                FullscreenChange::Denied(message)
            }
        }
    }

    fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            scale: self.config.capture_scale,
            background: self.deck.theme().export_background,
            cors_safe: self.config.cors_safe,
        }
    }

    /// Capture the slide on screen with the export's capture options.
    pub async fn capture_current(&self) -> Result<Bitmap> {
        if self.is_exporting() {
            return Err(Error::ExportInProgress);
        }
        let index = self.current_index();
        let options = self.capture_options();
        let region = CaptureRegion {
            index,
            slide: &self.deck.slides()[index],
            theme: self.deck.theme(),
            measurable: self.is_slide_visible(index),
        };
        self.platform.capture.capture(region, &options).await
    }

    /// File name the export is saved under
    pub fn export_file_name(&self) -> &str {
        self.config
            .export_file_name
            .as_deref()
            .unwrap_or_else(|| self.deck.export_file_name())
    }

    fn begin_export(&self) -> Option<ExportGuard<'_>> {
        let mut s = self.session();
        if s.is_exporting {
            return None;
        }
        s.is_exporting = true;
        s.capturing = None;
        Some(ExportGuard { session: &self.session })
    }

    fn set_capturing(&self, index: Option<usize>) {
        self.session().capturing = index;
    }

    async fn settle(&self) {
        match self.platform.capture.layout_settled() {
            Some(signal) => signal.await,
            None => tokio::time::sleep(self.config.settle_delay()).await,
        }
    }

    /// Export every slide, in deck order, one page each.
    ///
    /// A call made while another export is running returns
    /// [`ExportStatus::AlreadyRunning`] without touching anything. Any failure
    /// aborts the export, discards the partial document and shows a notice.
    /// `is_exporting` is back to `false` whenever this returns, and also when
    /// the future is dropped before completion.
    pub async fn export_deck(&self) -> ExportStatus {
        let Some(_guard) = self.begin_export() else {
            log::warn!("export requested while another export is running");
            return ExportStatus::AlreadyRunning;
        };
        log::info!(
            "exporting {} slides to {} ({} {:?})",
            self.deck.len(),
            self.export_file_name(),
            self.config.page_format,
            self.config.orientation
        );

        match self.run_export().await {
            Ok(report) => {
                log::info!("exported {} pages to {}", report.pages, report.path.display());
                ExportStatus::Completed(report)
            }
            Err(e) => {
                self.platform
                    .notifier
                    .notify(Notice::error(format!("Failed to generate the PDF document: {}", e)));
                ExportStatus::Failed(e)
            }
        }
    }

    async fn run_export(&self) -> Result<ExportReport> {
        self.settle().await;

        let orientation = self.config.orientation;
        let format = self.config.page_format;
        let background = self.deck.theme().export_background;
        let options = self.capture_options();
        let mut doc = self.platform.assembler.new_document(orientation, format)?;

        for (index, slide) in self.deck.slides().iter().enumerate() {
            self.set_capturing(Some(index));
            if self.config.visibility_policy == VisibilityPolicy::OneAtATime {
                if let Some(signal) = self.platform.capture.layout_settled() {
                    signal.await;
                }
            }
            let region = CaptureRegion {
                index,
                slide,
                theme: self.deck.theme(),
                measurable: self.is_slide_visible(index),
            };
            let bitmap = self.platform.capture.capture(region, &options).await?;
            let placement = place_slide(doc.as_mut(), &bitmap, index, orientation, format, background)?;
            log::debug!(
                "slide {} -> page {} ({}x{} px at {:.4} mm/px)",
                slide.id,
                index + 1,
                bitmap.width(),
                bitmap.height(),
                placement.scale
            );
        }
        self.set_capturing(None);

        let pages = doc.page_count();
        let path = doc.save(self.export_file_name())?;
        Ok(ExportReport { path, pages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{Block, SlideBody, SlideKind, Theme};
    use crate::export::{Orientation, PageFormat, PageSize};
    use crate::platform::{
        CaptureBackend, DocumentAssembler, MemoryNotifier, PageDocument, WindowedHost,
    };
    use futures::future::{self, BoxFuture, FutureExt};
    use std::path::PathBuf;
    use std::sync::Arc;

    struct SolidCapture;

    impl CaptureBackend for SolidCapture {
        fn capture<'a>(
            &'a self,
            region: CaptureRegion<'a>,
            options: &'a CaptureOptions,
        ) -> BoxFuture<'a, Result<Bitmap>> {
            let res = region
                .ensure_measurable()
                .map(|()| Bitmap::solid(40, 20, options.background));
            future::ready(res).boxed()
        }

        fn layout_settled(&self) -> Option<BoxFuture<'_, ()>> {
            Some(future::ready(()).boxed())
        }
    }

    struct NullDocument(usize);

    impl PageDocument for NullDocument {
        fn page_size(&self) -> PageSize {
            PageFormat::A4.size(Orientation::Landscape)
        }
        fn page_count(&self) -> usize {
            self.0
        }
        fn add_page(&mut self, _: Orientation, _: PageFormat) -> Result<()> {
            self.0 += 1;
            Ok(())
        }
        fn fill_rect(&mut self, _: f64, _: f64, _: f64, _: f64, _: crate::deck::Color) -> Result<()> {
            Ok(())
        }
        fn draw_image(&mut self, _: &Bitmap, _: f64, _: f64, _: f64, _: f64) -> Result<()> {
            Ok(())
        }
        fn save(self: Box<Self>, file_name: &str) -> Result<PathBuf> {
            Ok(PathBuf::from(file_name))
        }
    }

    struct NullAssembler;

    impl DocumentAssembler for NullAssembler {
        fn new_document(&self, _: Orientation, _: PageFormat) -> Result<Box<dyn PageDocument>> {
            Ok(Box::new(NullDocument(1)))
        }
    }

    fn deck(n: u32) -> Deck {
        let slides = (1..=n)
            .map(|id| Slide {
                id,
                kind: SlideKind::Content,
                title: Some(format!("S{}", id)),
                body: SlideBody::Full {
                    content: vec![Block::Paragraph { text: "x".into(), tone: Default::default() }],
                },
            })
            .collect();
        Deck::new("t", "out.pdf", Theme::default(), slides).unwrap()
    }

    fn platform(notifier: Arc<MemoryNotifier>) -> Platform {
        Platform {
            capture: Arc::new(SolidCapture),
            assembler: Arc::new(NullAssembler),
            fullscreen: Arc::new(WindowedHost::new()),
            notifier,
        }
    }

    fn viewer(n: u32) -> Viewer {
        Viewer::new(deck(n), ViewerConfig::default(), platform(Arc::new(MemoryNotifier::new()))).unwrap()
    }

    #[test]
    fn starts_at_first_slide_idle() {
        let v = viewer(3);
        assert_eq!(
            v.state(),
            ViewerState { current_index: 0, is_exporting: false, capturing: None }
        );
    }

    #[test]
    fn keys_and_buttons_share_transitions() {
        let v = viewer(3);
        assert!(v.handle_key(&KeyEvent::press("ArrowRight")));
        assert!(v.handle_key(&KeyEvent::new(" ", "Space")));
        assert!(!v.handle_key(&KeyEvent::press("ArrowRight")));
        assert_eq!(v.current_index(), 2);
        assert!(!v.press_button(Button::Next));
        assert!(v.press_button(Button::Previous));
        assert_eq!(v.current_index(), 1);
    }

    #[test]
    fn held_keys_do_not_repeat() {
        let v = viewer(3);
        let mut held = KeyEvent::press("ArrowRight");
        held.repeat = true;
        assert!(!v.handle_key(&held));
        assert_eq!(v.current_index(), 0);
    }

    #[test]
    fn navigation_is_refused_while_exporting() {
        let v = viewer(3);
        let guard = v.begin_export().unwrap();
        assert!(!v.navigate(NavCommand::Next));
        assert!(!v.press_button(Button::Next));
        assert!(!v.handle_key(&KeyEvent::press("ArrowRight")));
        assert_eq!(v.current_index(), 0);
        drop(guard);
        assert!(!v.is_exporting());
        assert!(v.navigate(NavCommand::Next));
    }

    #[test]
    fn second_begin_export_is_refused() {
        let v = viewer(2);
        let first = v.begin_export();
        assert!(first.is_some());
        assert!(v.begin_export().is_none());
    }

    #[test]
    fn visibility_follows_policy() {
        let v = viewer(3);
        assert!(v.is_slide_visible(0));
        assert!(!v.is_slide_visible(1));
        assert!(!v.is_slide_visible(3));
        let _g = v.begin_export().unwrap();
        assert!(v.is_slide_visible(2));

        let config = ViewerConfig { visibility_policy: VisibilityPolicy::OneAtATime, ..Default::default() };
        let one = Viewer::new(deck(3), config, platform(Arc::new(MemoryNotifier::new()))).unwrap();
        let _g = one.begin_export().unwrap();
        assert!(!one.is_slide_visible(2));
        one.set_capturing(Some(2));
        assert!(one.is_slide_visible(2));
        assert!(!one.is_slide_visible(1));
        assert!(one.is_slide_visible(0));
    }

    #[test]
    fn control_bar_reflects_position() {
        let v = viewer(3);
        let bar = v.control_bar();
        assert!(!bar.previous_enabled);
        assert!(bar.next_enabled);
        assert_eq!(bar.position, "Slide 1 / 3");
        assert!(bar.export_visible);
        assert!(!bar.export_busy);
        v.navigate(NavCommand::Next);
        v.navigate(NavCommand::Next);
        let bar = v.control_bar();
        assert!(bar.previous_enabled && !bar.next_enabled);
        assert_eq!(bar.position, "Slide 3 / 3");
    }

    #[tokio::test]
    async fn fullscreen_hides_export_control() {
        let v = viewer(2);
        assert_eq!(v.toggle_fullscreen().await, FullscreenChange::Entered);
        let bar = v.control_bar();
        assert!(!bar.export_visible);
        assert_eq!(bar.fullscreen_label, "Exit fullscreen");
        assert_eq!(v.toggle_fullscreen().await, FullscreenChange::Exited);
        assert!(!v.is_fullscreen());
    }

    #[tokio::test]
    async fn export_resets_flags_and_counts_pages() {
        let v = viewer(4);
        match v.export_deck().await {
            ExportStatus::Completed(report) => {
                assert_eq!(report.pages, 4);
                assert_eq!(report.path, PathBuf::from("out.pdf"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(v.state().capturing, None);
        assert!(!v.is_exporting());
    }

    #[tokio::test]
    async fn configured_file_name_wins() {
        let config = ViewerConfig { export_file_name: Some("mine.pdf".into()), ..Default::default() };
        let v = Viewer::new(deck(1), config, platform(Arc::new(MemoryNotifier::new()))).unwrap();
        assert_eq!(v.export_file_name(), "mine.pdf");
    }

    #[tokio::test]
    async fn capture_current_is_refused_during_export() {
        let v = viewer(2);
        assert_eq!(v.capture_current().await.unwrap().width(), 40);
        let _g = v.begin_export().unwrap();
        assert!(matches!(v.capture_current().await, Err(Error::ExportInProgress)));
    }
}
