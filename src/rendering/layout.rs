/// Box layout for slides
///
/// Positions are in CSS-like layout pixels of the viewport; the rasterizer
/// applies the capture scale afterwards. Text metrics are estimates (a fixed
/// advance per glyph), which is all the glyph-box painter needs.

use crate::deck::{Accent, Block, Slide, SlideBody, SlideKind, Tone};
use crate::Viewport;

const CONTENT_PAD_X: u32 = 80;
const CONTENT_PAD_Y: u32 = 40;
const TITLE_SIZE: u32 = 26;
const TITLE_GAP: u32 = 35;
const SPLIT_GAP: u32 = 40;
const VISUAL_PAD: u32 = 30;
const BLOCK_GAP: u32 = 20;
const CARD_PAD: u32 = 20;
const GRID_GAP: u32 = 30;
const COVER_PAD: u32 = 20;

/// Largest cursor position layout produces
pub const MAX_COORD: i32 = 1 << 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(i32::try_from(self.height).unwrap_or(i32::MAX))
    }

    /// Shrink by `pad` on every side
    pub fn inset(&self, pad: u32) -> Rect {
        Rect {
            x: self.x + pad as i32,
            y: self.y + pad as i32,
            width: self.width.saturating_sub(pad * 2),
            height: self.height.saturating_sub(pad * 2),
        }
    }
}

/// Semantic color role, resolved against the deck theme when painting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ink {
    Text,
    MutedText,
    Border,
    Tint(Accent),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Full-region background gradient
    Backdrop,
    Panel { border: Ink },
    Bar { ink: Ink },
    Text { lines: Vec<String>, size: u32, ink: Ink, centered: bool },
    Image { src: String, alt: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub rect: Rect,
    pub kind: NodeKind,
}

/// Average glyph advance as a fraction of the font size
pub(crate) fn glyph_width(size: u32) -> u32 {
    (size * 11 / 20).max(1)
}

pub(crate) fn line_height(size: u32) -> u32 {
    size * 3 / 2
}

/// Greedy word wrap by estimated glyph width
pub fn wrap(text: &str, width: u32, size: u32) -> Vec<String> {
    let per_line = (width / glyph_width(size)).max(1) as usize;
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        let cur_len = cur.chars().count();
        let word_len = word.chars().count();
        if cur_len > 0 && cur_len + 1 + word_len > per_line {
            lines.push(std::mem::take(&mut cur));
        }
        if !cur.is_empty() {
            cur.push(' ');
        }
        cur.push_str(word);
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

/// Lay out one slide for `viewport`.
///
/// Covers use the whole viewport with their content centered vertically.
/// Content slides get padding, a title bar, and either one body region or a
/// 45/55 split whose right pane is drawn as a panel.
pub fn layout_slide(slide: &Slide, viewport: Viewport) -> Vec<LayoutNode> {
    let full = Rect::new(0, 0, viewport.width, viewport.height);
    let mut nodes = vec![LayoutNode { rect: full, kind: NodeKind::Backdrop }];

    if slide.kind == SlideKind::Cover {
        let area = full.inset(COVER_PAD);
        let blocks: Vec<&Block> = slide.blocks().collect();
        stack_centered(&blocks, area, true, &mut nodes);
        return nodes;
    }

    let inner = Rect {
        x: CONTENT_PAD_X as i32,
        y: CONTENT_PAD_Y as i32,
        width: viewport.width.saturating_sub(CONTENT_PAD_X * 2),
        height: viewport.height.saturating_sub(CONTENT_PAD_Y * 2),
    };

    let title = slide.title.clone().unwrap_or_default();
    let title_w = inner.width.saturating_sub(21);
    let title_lines = wrap(&title, title_w, TITLE_SIZE);
    let title_h = line_height(TITLE_SIZE) * title_lines.len().max(1) as u32;
    nodes.push(LayoutNode {
        rect: Rect::new(inner.x, inner.y + (title_h as i32 - TITLE_SIZE as i32) / 2, 6, TITLE_SIZE),
        kind: NodeKind::Bar { ink: Ink::Tint(Accent::Primary) },
    });
    nodes.push(LayoutNode {
        rect: Rect::new(inner.x + 21, inner.y, title_w, title_h),
        kind: NodeKind::Text { lines: title_lines, size: TITLE_SIZE, ink: Ink::Text, centered: false },
    });
    let rule_y = inner.y + title_h as i32 + 15;
    nodes.push(LayoutNode {
        rect: Rect::new(inner.x, rule_y, inner.width, 1),
        kind: NodeKind::Bar { ink: Ink::Border },
    });

    let body_top = rule_y + TITLE_GAP as i32;
    let body = Rect {
        x: inner.x,
        y: body_top,
        width: inner.width,
        height: (inner.bottom() - body_top).max(0) as u32,
    };

    match &slide.body {
        SlideBody::Full { content } => {
            let blocks: Vec<&Block> = content.iter().collect();
            stack_centered(&blocks, body, false, &mut nodes);
        }
        SlideBody::Split { text, visual } => {
            let usable = body.width.saturating_sub(SPLIT_GAP);
            let left_w = usable * 45 / 100;
            let left = Rect { width: left_w, ..body };
            let right_x = body.x + (left_w + SPLIT_GAP) as i32;
            let right_w = usable - left_w;

            let blocks: Vec<&Block> = text.iter().collect();
            stack_centered(&blocks, left, false, &mut nodes);

            let visual_blocks: Vec<&Block> = visual.iter().collect();
            let content_w = right_w.saturating_sub(VISUAL_PAD * 2);
            let content_h = stack_height(&visual_blocks, content_w);
            let panel_h = content_h.saturating_add(VISUAL_PAD * 2).min(body.height);
            let panel = Rect {
                x: right_x,
                y: body.y + (body.height.saturating_sub(panel_h) / 2) as i32,
                width: right_w,
                height: panel_h,
            };
            nodes.push(LayoutNode { rect: panel, kind: NodeKind::Panel { border: Ink::Border } });
            stack_centered(&visual_blocks, panel.inset(VISUAL_PAD), false, &mut nodes);
        }
    }
    nodes
}

fn stack_height(blocks: &[&Block], width: u32) -> u32 {
    let gaps = BLOCK_GAP * blocks.len().saturating_sub(1) as u32;
    blocks
        .iter()
        .map(|b| block_height(b, width))
        .fold(gaps, u32::saturating_add)
}

/// Stack blocks vertically, centered within `area`. Content taller than the
/// area starts at its top and is clipped by the rasterizer.
fn stack_centered(blocks: &[&Block], area: Rect, centered: bool, out: &mut Vec<LayoutNode>) {
    let total = stack_height(blocks, area.width);
    let mut y = area.y + (area.height.saturating_sub(total) / 2) as i32;
    for block in blocks {
        let h = block_height(block, area.width);
        place_block(block, Rect::new(area.x, y, area.width, h), centered, out);
        y = advance(y, h, BLOCK_GAP);
    }
}

/// Move a layout cursor past a box of height `h` and a `gap`. Cursors stop
/// at [`MAX_COORD`], far outside any canvas.
fn advance(y: i32, h: u32, gap: u32) -> i32 {
    let step = i32::try_from(h.saturating_add(gap)).unwrap_or(i32::MAX);
    y.saturating_add(step).min(MAX_COORD)
}

fn heading_size(level: u8) -> u32 {
    match level {
        0 | 1 => 26,
        2 => 16,
        _ => 14,
    }
}

fn card_title_size() -> u32 {
    16
}

fn body_size() -> u32 {
    14
}

fn text_height(text: &str, width: u32, size: u32) -> u32 {
    line_height(size).saturating_mul(wrap(text, width, size).len() as u32)
}

fn grid_cell_width(columns: u8, width: u32) -> u32 {
    let cols = u32::from(columns.max(1));
    width.saturating_sub(GRID_GAP * (cols - 1)) / cols
}

fn block_height(block: &Block, width: u32) -> u32 {
    match block {
        Block::Heading { text, level } => text_height(text, width, heading_size(*level)),
        Block::Paragraph { text, .. } => text_height(text, width, body_size() + 2),
        Block::Card { title, text, .. } => {
            let inner = width.saturating_sub(CARD_PAD * 2);
            let mut h = text_height(title, inner, card_title_size()).saturating_add(CARD_PAD * 2);
            if !text.is_empty() {
                h = h.saturating_add(text_height(text, inner, body_size())).saturating_add(5);
            }
            h
        }
        Block::List { items } => {
            let inner = width.saturating_sub(24);
            let gaps = 10 * items.len().saturating_sub(1) as u32;
            items
                .iter()
                .map(|i| text_height(i, inner, body_size()))
                .fold(gaps, u32::saturating_add)
        }
        Block::Grid { columns, children } => {
            let cols = usize::from((*columns).max(1));
            let cell_w = grid_cell_width(*columns, width);
            let rows: Vec<u32> = children
                .chunks(cols)
                .map(|row| row.iter().map(|c| block_height(c, cell_w)).max().unwrap_or(0))
                .collect();
            let gaps = GRID_GAP * rows.len().saturating_sub(1) as u32;
            rows.into_iter().fold(gaps, u32::saturating_add)
        }
        Block::Image { height, .. } => *height,
        Block::Divider { .. } => 4,
    }
}

fn place_block(block: &Block, rect: Rect, centered: bool, out: &mut Vec<LayoutNode>) {
    match block {
        Block::Heading { text, level } => {
            let size = heading_size(*level);
            let ink = if *level >= 2 { Ink::Tint(Accent::Primary) } else { Ink::Text };
            out.push(LayoutNode {
                rect,
                kind: NodeKind::Text { lines: wrap(text, rect.width, size), size, ink, centered },
            });
        }
        Block::Paragraph { text, tone } => {
            let size = body_size() + 2;
            let ink = match tone {
                Tone::Muted => Ink::MutedText,
                Tone::Normal | Tone::Strong => Ink::Text,
            };
            out.push(LayoutNode {
                rect,
                kind: NodeKind::Text { lines: wrap(text, rect.width, size), size, ink, centered },
            });
        }
        Block::Card { title, text, accent } => {
            out.push(LayoutNode { rect, kind: NodeKind::Panel { border: Ink::Tint(*accent) } });
            let inner = rect.inset(CARD_PAD);
            let title_lines = wrap(title, inner.width, card_title_size());
            let title_h = line_height(card_title_size()) * title_lines.len() as u32;
            out.push(LayoutNode {
                rect: Rect { height: title_h, ..inner },
                kind: NodeKind::Text {
                    lines: title_lines,
                    size: card_title_size(),
                    ink: Ink::Tint(*accent),
                    centered,
                },
            });
            if !text.is_empty() {
                let y = inner.y + title_h as i32 + 5;
                let lines = wrap(text, inner.width, body_size());
                let h = line_height(body_size()) * lines.len() as u32;
                out.push(LayoutNode {
                    rect: Rect { y, height: h, ..inner },
                    kind: NodeKind::Text { lines, size: body_size(), ink: Ink::MutedText, centered },
                });
            }
        }
        Block::List { items } => {
            let mut y = rect.y;
            let inner_w = rect.width.saturating_sub(24);
            for item in items {
                let lines = wrap(item, inner_w, body_size());
                let h = line_height(body_size()) * lines.len() as u32;
                out.push(LayoutNode {
                    rect: Rect::new(rect.x + 4, y + 8, 6, 6),
                    kind: NodeKind::Bar { ink: Ink::Tint(Accent::Primary) },
                });
                out.push(LayoutNode {
                    rect: Rect::new(rect.x + 24, y, inner_w, h),
                    kind: NodeKind::Text { lines, size: body_size(), ink: Ink::MutedText, centered: false },
                });
                y = advance(y, h, 10);
            }
        }
        Block::Grid { columns, children } => {
            let cols = usize::from((*columns).max(1));
            let cell_w = grid_cell_width(*columns, rect.width);
            let mut y = rect.y;
            for row in children.chunks(cols) {
                let row_h = row.iter().map(|c| block_height(c, cell_w)).max().unwrap_or(0);
                for (i, child) in row.iter().enumerate() {
                    let x = rect.x + ((cell_w + GRID_GAP) * i as u32) as i32;
                    place_block(child, Rect::new(x, y, cell_w, row_h), centered, out);
                }
                y = advance(y, row_h, GRID_GAP);
            }
        }
        Block::Image { src, alt, height } => {
            // Unknown intrinsic size at layout time: reserve a 3:1 box
            let width = height.saturating_mul(3).min(rect.width);
            let x = if centered {
                rect.x + (rect.width.saturating_sub(width) / 2) as i32
            } else {
                rect.x
            };
            out.push(LayoutNode {
                rect: Rect::new(x, rect.y, width, *height),
                kind: NodeKind::Image { src: src.clone(), alt: alt.clone() },
            });
        }
        Block::Divider { accent } => {
            let width = if centered { 60.min(rect.width) } else { rect.width };
            let x = rect.x + (rect.width.saturating_sub(width) / 2) as i32;
            out.push(LayoutNode {
                rect: Rect::new(x, rect.y, width, 4),
                kind: NodeKind::Bar { ink: Ink::Tint(*accent) },
            });
        }
    }
}
