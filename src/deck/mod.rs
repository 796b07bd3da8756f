//! Slide deck model
//!
//! A [`Deck`] is a fixed, ordered sequence of [`Slide`] records. It is
//! validated once at construction and offers no way to add, remove or reorder
//! slides afterwards; the viewer only ever indexes into it.

pub mod content;
pub mod theme;

pub use content::{Accent, Block, Tone, MAX_IMAGE_HEIGHT};
pub use theme::{Color, Gradient, Theme};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::{Error, Result};

const BUILTIN_DECK: &str = include_str!("../../assets/deck.json");

/// Whether a slide renders edge-to-edge or with the title chrome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    Cover,
    #[default]
    Content,
}

/// Body arrangement of a slide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Full,
    Split,
}

/// Renderable payload of a slide, one or two regions depending on layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum SlideBody {
    Full {
        content: Vec<Block>,
    },
    /// Text pane on the left, visual pane on the right
    Split {
        text: Vec<Block>,
        visual: Vec<Block>,
    },
}

/// One page of the deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub id: u32,
    #[serde(default)]
    pub kind: SlideKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub body: SlideBody,
}

impl Slide {
    pub fn layout(&self) -> Layout {
        match self.body {
            SlideBody::Full { .. } => Layout::Full,
            SlideBody::Split { .. } => Layout::Split,
        }
    }

    /// Title for listings: the slide title, or the first heading of a cover.
    pub fn display_title(&self) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }
        let mut heading = None;
        for block in self.blocks() {
            block.walk(&mut |b| {
                if heading.is_none() {
                    if let Block::Heading { text, .. } = b {
                        heading = Some(text.clone());
                    }
                }
            });
        }
        heading.unwrap_or_else(|| format!("Slide {}", self.id))
    }

    fn check_sizes(&self) -> Result<()> {
        let mut oversized = None;
        for block in self.blocks() {
            block.walk(&mut |b| {
                if let Block::Image { height, .. } = b {
                    if *height > MAX_IMAGE_HEIGHT && oversized.is_none() {
                        oversized = Some(*height);
                    }
                }
            });
        }
        match oversized {
            Some(height) => Err(Error::DeckError(format!(
                "slide {} has an image {}px tall; the limit is {}px",
                self.id, height, MAX_IMAGE_HEIGHT
            ))),
            None => Ok(()),
        }
    }

    /// Top-level blocks of every region, in reading order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        const NONE: &[Block] = &[];
        let (first, second) = match &self.body {
            SlideBody::Full { content } => (content.as_slice(), NONE),
            SlideBody::Split { text, visual } => (text.as_slice(), visual.as_slice()),
        };
        first.iter().chain(second.iter())
    }
}

#[derive(Debug, Deserialize)]
struct DeckSource {
    title: String,
    #[serde(default = "default_export_file_name")]
    export_file_name: String,
    #[serde(default)]
    theme: Theme,
    slides: Vec<Slide>,
}

fn default_export_file_name() -> String {
    "presentation_A4.pdf".to_string()
}

/// The fixed, ordered sequence of slides shown by a viewer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "DeckSource")]
pub struct Deck {
    title: String,
    export_file_name: String,
    theme: Theme,
    slides: Vec<Slide>,
}

impl TryFrom<DeckSource> for Deck {
    type Error = Error;

    fn try_from(src: DeckSource) -> Result<Self> {
        Deck::new(src.title, src.export_file_name, src.theme, src.slides)
    }
}

impl Deck {
    /// Validate and freeze a deck.
    ///
    /// Rejects an empty slide list, duplicate or out-of-order ids, content
    /// slides without a title, images taller than [`MAX_IMAGE_HEIGHT`], an
    /// empty export file name and a translucent export background.
    pub fn new(
        title: impl Into<String>,
        export_file_name: impl Into<String>,
        theme: Theme,
        slides: Vec<Slide>,
    ) -> Result<Self> {
        let export_file_name = export_file_name.into();
        if slides.is_empty() {
            return Err(Error::DeckError("a deck needs at least one slide".to_string()));
        }
        if export_file_name.trim().is_empty() {
            return Err(Error::DeckError("export file name is empty".to_string()));
        }
        theme.validate()?;

        let mut seen = HashSet::new();
        let mut prev: Option<u32> = None;
        for slide in &slides {
            if !seen.insert(slide.id) {
                return Err(Error::DeckError(format!("duplicate slide id {}", slide.id)));
            }
            if let Some(p) = prev {
                if slide.id <= p {
                    return Err(Error::DeckError(format!(
                        "slide id {} follows {}; ids must increase in display order",
                        slide.id, p
                    )));
                }
            }
            prev = Some(slide.id);

            if slide.kind == SlideKind::Content
                && slide.title.as_deref().map_or(true, |t| t.trim().is_empty())
            {
                return Err(Error::DeckError(format!("content slide {} has no title", slide.id)));
            }
            slide.check_sizes()?;
        }

        Ok(Self {
            title: title.into(),
            export_file_name,
            theme,
            slides,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::DeckError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// The deck bundled with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_DECK)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn export_file_name(&self) -> &str {
        &self.export_file_name
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    /// Number of slides; never zero.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Always false: construction rejects empty decks.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}
