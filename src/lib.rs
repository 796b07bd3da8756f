//! Slidedeck viewer core
//!
//! A fixed, ordered deck of slides shown one at a time, with clamped
//! keyboard/button navigation, a fullscreen toggle, and export of the whole
//! deck to a paginated, image-based PDF.
//!
//! # Features
//!
//! - **Deck model**: slides are structured JSON data (typed content blocks), validated once
//! - **Pluggable platform**: capture, document assembly, fullscreen and notices are traits
//! - **Headless backend**: a software rasterizer on a worker thread plus an `lopdf` writer
//!   (`pdf` feature, on by default)
//!
//! # Example
//!
//! ```no_run
//! use slidedeck::{Deck, ExportStatus, Platform, Viewer, ViewerConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ViewerConfig {
//!     download_dir: "out".into(),
//!     ..Default::default()
//! };
//! let platform = Platform::headless(&config)?;
//! let viewer = Viewer::new(Deck::builtin()?, config, platform)?;
//!
//! viewer.handle_key(&slidedeck::KeyEvent::press("ArrowRight"));
//! assert_eq!(viewer.current_index(), 1);
//!
//! if let ExportStatus::Completed(report) = viewer.export_deck().await {
//!     println!("{} pages written to {}", report.pages, report.path.display());
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

pub mod deck;
pub mod navigation;

// Collaborator seams (capture, documents, fullscreen, notices)
pub mod platform;

// Software capture backend
pub mod rendering;

pub mod export;

pub mod controller;

pub use controller::{ControlBar, FullscreenChange, Viewer, ViewerState};
pub use deck::{Deck, Slide, SlideBody, SlideKind, Theme};
pub use export::{ExportReport, ExportStatus, Orientation, PageFormat};
pub use navigation::{Button, KeyEvent, Keymap, NavCommand, Navigator};
pub use platform::Platform;

/// Viewport dimensions in layout pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 675,
        }
    }
}

/// Which slides are laid out (and therefore capturable) during an export.
///
/// Outside an export only the current slide is visible either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityPolicy {
    /// Every slide stays measurable for the whole export
    #[default]
    AllSlides,
    /// Only the slide being captured is measurable, one at a time
    OneAtATime,
}

impl FromStr for VisibilityPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "all" | "all-slides" => Ok(VisibilityPolicy::AllSlides),
            "one" | "one-at-a-time" => Ok(VisibilityPolicy::OneAtATime),
            other => Err(Error::ConfigError(format!("unknown visibility policy '{}'", other))),
        }
    }
}

impl fmt::Display for VisibilityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisibilityPolicy::AllSlides => f.write_str("all-slides"),
            VisibilityPolicy::OneAtATime => f.write_str("one-at-a-time"),
        }
    }
}

/// Configuration for a [`Viewer`]
///
/// The defaults reproduce the classic deck export: a 1200x675 viewport
/// captured at 2x onto A4 landscape pages.
///
/// # Examples
///
/// ```
/// let cfg = slidedeck::ViewerConfig::default();
/// assert_eq!(cfg.capture_scale, 2.0);
/// assert_eq!(cfg.settle_delay().as_millis(), 800);
/// ```
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Layout size of one slide region
    pub viewport: Viewport,
    /// Oversampling factor requested from the capture backend
    pub capture_scale: f32,
    /// Replace cross-origin images instead of failing the capture
    pub cors_safe: bool,
    /// Fixed pause before the first capture when the backend has no settle signal
    pub settle_delay_ms: u64,
    pub page_format: PageFormat,
    pub orientation: Orientation,
    pub visibility_policy: VisibilityPolicy,
    pub keymap: Keymap,
    /// Base directory for relative image paths in slide content
    pub asset_root: PathBuf,
    /// Where exported documents are saved
    pub download_dir: PathBuf,
    /// Overrides the deck's own export file name
    pub export_file_name: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            capture_scale: 2.0,
            cors_safe: true,
            settle_delay_ms: 800,
            page_format: PageFormat::A4,
            orientation: Orientation::Landscape,
            visibility_policy: VisibilityPolicy::AllSlides,
            keymap: Keymap::default(),
            asset_root: PathBuf::from("."),
            download_dir: PathBuf::from("."),
            export_file_name: None,
        }
    }
}

impl ViewerConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Reject settings no capture could honor
    pub fn validate(&self) -> Result<()> {
        if !self.capture_scale.is_finite() || self.capture_scale <= 0.0 {
            return Err(Error::ConfigError(format!(
                "capture scale must be positive, got {}",
                self.capture_scale
            )));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(Error::ConfigError(format!(
                "viewport {}x{} is empty",
                self.viewport.width, self.viewport.height
            )));
        }
        if let Some(name) = &self.export_file_name {
            if name.trim().is_empty() {
                return Err(Error::ConfigError("export file name is empty".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ViewerConfig::default();
        assert_eq!(config.viewport.width, 1200);
        assert_eq!(config.viewport.height, 675);
        assert!(config.cors_safe);
        assert_eq!(config.page_format, PageFormat::A4);
        assert_eq!(config.orientation, Orientation::Landscape);
        assert_eq!(config.visibility_policy, VisibilityPolicy::AllSlides);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_scale() {
        let config = ViewerConfig { capture_scale: 0.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
        let config = ViewerConfig { export_file_name: Some("  ".into()), ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_visibility_policy_names() {
        assert_eq!("all".parse::<VisibilityPolicy>().unwrap(), VisibilityPolicy::AllSlides);
        assert_eq!(
            "one_at_a_time".parse::<VisibilityPolicy>().unwrap(),
            VisibilityPolicy::OneAtATime
        );
        assert!("some".parse::<VisibilityPolicy>().is_err());
        assert_eq!(VisibilityPolicy::OneAtATime.to_string(), "one-at-a-time");
    }
}
