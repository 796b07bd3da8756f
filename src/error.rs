//! Error types for the slide viewer

use thiserror::Error;

/// Result type alias for viewer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, viewing or exporting a deck
#[derive(Error, Debug)]
pub enum Error {
    /// The deck (or its JSON source) is malformed
    #[error("Invalid deck: {0}")]
    DeckError(String),

    /// Capturing a slide region to a bitmap failed
    #[error("Capture failed: {0}")]
    CaptureError(String),

    /// Building or saving the output document failed
    #[error("Document assembly failed: {0}")]
    AssemblyError(String),

    /// The host refused or failed a fullscreen transition
    #[error("Fullscreen request denied: {0}")]
    FullscreenError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// `export_deck` was called while another export was still running
    #[error("An export is already in progress")]
    ExportInProgress,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::DeckError(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::CaptureError(err.to_string())
    }
}

#[cfg(feature = "pdf")]
impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::AssemblyError(err.to_string())
    }
}
