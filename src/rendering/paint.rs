/// Paint commands: layout nodes resolved against the theme and image sources

use base64::Engine as _;
use image::RgbaImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

use crate::deck::{Accent, Color, Theme};
use crate::rendering::layout::{glyph_width, line_height, Ink, LayoutNode, NodeKind, Rect};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    /// Diagonal (top-left to bottom-right) two-stop gradient
    Gradient {
        rect: Rect,
        from: Color,
        to: Color,
    },
    SolidRect {
        rect: Rect,
        color: Color,
    },
    /// One-pixel frame inside `rect`
    Outline {
        rect: Rect,
        color: Color,
    },
    /// A single line of text starting at (`x`, `y`), drawn as glyph boxes
    Text {
        x: i32,
        y: i32,
        size: u32,
        color: Color,
        text: String,
    },
    /// Decoded image scaled to fit `rect`, centered
    Image {
        rect: Rect,
        pixels: Arc<RgbaImage>,
    },
}

/// Where an image source points
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// `data:` URI payload
    Inline(Vec<u8>),
    /// Another origin; never fetched
    Remote(String),
    Local(PathBuf),
}

impl ImageSource {
    pub fn classify(src: &str, asset_root: &Path) -> Result<ImageSource> {
        match Url::parse(src) {
            Ok(url) => match url.scheme() {
                "data" => decode_data_uri(src).map(ImageSource::Inline),
                "http" | "https" => Ok(ImageSource::Remote(src.to_string())),
                "file" => url
                    .to_file_path()
                    .map(ImageSource::Local)
                    .map_err(|_| Error::CaptureError(format!("bad file URL '{}'", src))),
                other => Err(Error::CaptureError(format!(
                    "unsupported image scheme '{}' in '{}'",
                    other, src
                ))),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(ImageSource::Local(asset_root.join(src.trim_start_matches('/'))))
            }
            Err(e) => Err(Error::CaptureError(format!("bad image source '{}': {}", src, e))),
        }
    }
}

fn decode_data_uri(src: &str) -> Result<Vec<u8>> {
    let rest = src.strip_prefix("data:").unwrap_or(src);
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::CaptureError("data URI without payload".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(Error::CaptureError(format!(
            "only base64 data URIs are supported (got '{}')",
            header
        )));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::CaptureError(format!("invalid base64 image: {}", e)))
}

/// Resolves and decodes slide images, remembering what it already decoded
pub struct ImageLoader {
    asset_root: PathBuf,
    cache: HashMap<String, Option<Arc<RgbaImage>>>,
}

impl ImageLoader {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            cache: HashMap::new(),
        }
    }

    /// Pixels for `src`, or `None` when a placeholder should be drawn.
    ///
    /// Remote images would taint the capture: with `cors_safe` they become a
    /// placeholder, without it the capture fails. Unreadable local files
    /// degrade to a placeholder the way a broken image does in a browser.
    pub fn load(&mut self, src: &str, cors_safe: bool) -> Result<Option<Arc<RgbaImage>>> {
        if let Some(hit) = self.cache.get(src) {
            return Ok(hit.clone());
        }
        let decoded = match ImageSource::classify(src, &self.asset_root)? {
            ImageSource::Remote(url) => {
                if !cors_safe {
                    return Err(Error::CaptureError(format!(
                        "cross-origin image '{}' would taint the capture",
                        url
                    )));
                }
                // not cached: the outcome depends on `cors_safe`
                log::debug!("substituting placeholder for cross-origin image {}", url);
                return Ok(None);
            }
            ImageSource::Inline(bytes) => Some(Arc::new(image::load_from_memory(&bytes)?.to_rgba8())),
            ImageSource::Local(path) => match image::open(&path) {
                Ok(img) => Some(Arc::new(img.to_rgba8())),
                Err(e) => {
                    log::warn!("image {} unavailable: {}", path.display(), e);
                    None
                }
            },
        };
        self.cache.insert(src.to_string(), decoded.clone());
        Ok(decoded)
    }
}

fn tint(theme: &Theme, accent: Accent) -> Color {
    match accent {
        Accent::Primary => theme.primary,
        Accent::Accent => theme.accent,
        Accent::Danger => theme.danger,
        Accent::Muted => theme.muted_text,
    }
}

fn ink(theme: &Theme, ink: Ink) -> Color {
    match ink {
        Ink::Text => theme.text,
        Ink::MutedText => theme.muted_text,
        Ink::Border => theme.border,
        Ink::Tint(a) => tint(theme, a),
    }
}

/// Turn layout nodes into paint commands, back to front.
pub fn paint_nodes(
    nodes: &[LayoutNode],
    theme: &Theme,
    images: &mut ImageLoader,
    cors_safe: bool,
) -> Result<Vec<PaintCommand>> {
    let mut out = Vec::with_capacity(nodes.len() * 2);
    for node in nodes {
        let rect = node.rect;
        match &node.kind {
            NodeKind::Backdrop => out.push(PaintCommand::Gradient {
                rect,
                from: theme.background.from,
                to: theme.background.to,
            }),
            NodeKind::Panel { border } => {
                out.push(PaintCommand::SolidRect { rect, color: theme.panel });
                let mut frame = ink(theme, *border);
                if let Ink::Tint(_) = border {
                    frame = frame.with_alpha(0x66);
                }
                out.push(PaintCommand::Outline { rect, color: frame });
            }
            NodeKind::Bar { ink: i } => out.push(PaintCommand::SolidRect { rect, color: ink(theme, *i) }),
            NodeKind::Text { lines, size, ink: i, centered } => {
                let color = ink(theme, *i);
                let advance = glyph_width(*size);
                for (n, line) in lines.iter().enumerate() {
                    let width = advance * line.chars().count() as u32;
                    let x = if *centered {
                        rect.x + (rect.width.saturating_sub(width) / 2) as i32
                    } else {
                        rect.x
                    };
                    out.push(PaintCommand::Text {
                        x,
                        y: rect.y + (line_height(*size) * n as u32) as i32,
                        size: *size,
                        color,
                        text: line.clone(),
                    });
                }
            }
            NodeKind::Image { src, alt } => match images.load(src, cors_safe)? {
                Some(pixels) => out.push(PaintCommand::Image { rect, pixels }),
                None => {
                    out.push(PaintCommand::Outline { rect, color: theme.muted_text });
                    if !alt.is_empty() {
                        out.push(PaintCommand::Text {
                            x: rect.x + 6,
                            y: rect.y + 6,
                            size: 12,
                            color: theme.muted_text,
                            text: alt.clone(),
                        });
                    }
                }
            },
        }
    }
    Ok(out)
}
