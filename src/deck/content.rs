//! Typed content blocks that make up a slide body.
//!
//! The navigation and export core never looks inside these; they are consumed
//! only by a rendering backend (see `crate::rendering`).

use serde::{Deserialize, Serialize};

/// Which theme color a block is tinted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accent {
    #[default]
    Primary,
    Accent,
    Danger,
    Muted,
}

/// Emphasis of running text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Strong,
    #[default]
    Normal,
    Muted,
}

/// One node of a slide body tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading {
        text: String,
        #[serde(default = "default_heading_level")]
        level: u8,
    },
    Paragraph {
        text: String,
        #[serde(default)]
        tone: Tone,
    },
    /// Panel with a tinted title line and body text
    Card {
        title: String,
        #[serde(default)]
        text: String,
        #[serde(default)]
        accent: Accent,
    },
    List {
        items: Vec<String>,
    },
    /// Children laid out row-major in `columns` equal columns
    Grid {
        columns: u8,
        children: Vec<Block>,
    },
    Image {
        src: String,
        #[serde(default)]
        alt: String,
        #[serde(default = "default_image_height")]
        height: u32,
    },
    Divider {
        #[serde(default)]
        accent: Accent,
    },
}

fn default_heading_level() -> u8 {
    1
}

fn default_image_height() -> u32 {
    55
}

/// Tallest image box a slide may reserve, in layout pixels
pub const MAX_IMAGE_HEIGHT: u32 = 4096;

impl Block {
    /// Visit this block and all of its descendants, depth first.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Block)) {
        f(self);
        if let Block::Grid { children, .. } = self {
            for child in children {
                child.walk(f);
            }
        }
    }

    /// Plain text carried by this block alone (not its children).
    pub fn text(&self) -> String {
        match self {
            Block::Heading { text, .. } | Block::Paragraph { text, .. } => text.clone(),
            Block::Card { title, text, .. } => {
                if text.is_empty() {
                    title.clone()
                } else {
                    format!("{}: {}", title, text)
                }
            }
            Block::List { items } => items.join("; "),
            Block::Image { alt, .. } => alt.clone(),
            Block::Grid { .. } | Block::Divider { .. } => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_deserialize_with_defaults() {
        let json = r#"[
            {"type": "heading", "text": "Hi"},
            {"type": "card", "title": "One"},
            {"type": "image", "src": "logo.png"},
            {"type": "divider"}
        ]"#;
        let blocks: Vec<Block> = serde_json::from_str(json).unwrap();
        assert_eq!(blocks[0], Block::Heading { text: "Hi".into(), level: 1 });
        assert!(matches!(&blocks[1], Block::Card { accent: Accent::Primary, text, .. } if text.is_empty()));
        assert!(matches!(&blocks[2], Block::Image { height: 55, .. }));
        assert!(matches!(&blocks[3], Block::Divider { accent: Accent::Primary }));
    }

    #[test]
    fn walk_visits_grid_children() {
        let grid = Block::Grid {
            columns: 2,
            children: vec![
                Block::Paragraph { text: "a".into(), tone: Tone::Normal },
                Block::Grid {
                    columns: 1,
                    children: vec![Block::List { items: vec!["b".into()] }],
                },
            ],
        };
        let mut seen = 0;
        grid.walk(&mut |_| seen += 1);
        assert_eq!(seen, 4);
    }

    #[test]
    fn unknown_block_type_is_rejected() {
        let res: std::result::Result<Block, _> = serde_json::from_str(r#"{"type":"video","src":"x"}"#);
        assert!(res.is_err());
    }
}
