//! Pagination — places atomic blocks onto fixed-size pages.
//!
//! # Rules
//! - A block never straddles a page boundary: if it does not fit in the space left,
//!   it moves whole to the next page.
//! - A block marked `keep_with_next` (section headings) travels with the block after it.
//! - `space_before` is dropped at the top of a page.
//! - A chain taller than an empty page starts on a fresh page and its last block
//!   flows across the break, so a heading still never ends a page. A single block
//!   taller than an empty page is split the same way. Both are logged as warnings.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::layout::document::{Node, Page};
use crate::layout::font_metrics::PageConfig;

const EPSILON: f32 = 0.01;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// One printed line (or fixed gap). Node coordinates are relative to the line's
/// top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub height: f32,
    pub nodes: Vec<Node>,
}

impl Line {
    pub fn gap(height: f32) -> Self {
        Self {
            height,
            nodes: Vec::new(),
        }
    }
}

/// A unit of content that must stay on one page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub lines: Vec<Line>,
    pub space_before: f32,
    pub keep_with_next: bool,
}

impl Block {
    pub fn new(lines: Vec<Line>, space_before: f32) -> Self {
        Self {
            lines,
            space_before,
            keep_with_next: false,
        }
    }

    pub fn height(&self) -> f32 {
        self.lines.iter().map(|l| l.height).sum()
    }

    /// A block with nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.nodes.is_empty())
    }
}

/// Summary of a pagination run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationReport {
    pub page_count: usize,
    /// Fraction of each page's content area that is used (0.0–1.0).
    pub page_fill: Vec<f32>,
    /// Blocks too tall for a page that had to be split across pages.
    pub blocks_split: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// Lays blocks out top to bottom across as many pages as needed.
///
/// Always returns at least one page.
pub fn paginate(blocks: Vec<Block>, config: &PageConfig) -> (Vec<Page>, PaginationReport) {
    let mut cursor = PageCursor::new(config);

    for chain in chain_blocks(blocks) {
        cursor.place_chain(chain);
    }

    cursor.finish()
}

/// Groups blocks into chains joined by `keep_with_next`, skipping empty blocks.
pub(crate) fn chain_blocks(blocks: Vec<Block>) -> Vec<Vec<Block>> {
    let mut chains: Vec<Vec<Block>> = Vec::new();
    let mut open: Vec<Block> = Vec::new();

    for block in blocks.into_iter().filter(|b| !b.is_empty()) {
        let keep = block.keep_with_next;
        open.push(block);
        if !keep {
            chains.push(std::mem::take(&mut open));
        }
    }
    if !open.is_empty() {
        chains.push(open);
    }
    chains
}

// ────────────────────────────────────────────────────────────────────────────
// Cursor
// ────────────────────────────────────────────────────────────────────────────

struct PageCursor<'a> {
    config: &'a PageConfig,
    pages: Vec<Page>,
    nodes: Vec<Node>,
    fills: Vec<f32>,
    /// Current y position from the page top.
    y: f32,
    /// Nothing placed on the current page yet.
    fresh: bool,
    blocks_split: usize,
}

impl<'a> PageCursor<'a> {
    fn new(config: &'a PageConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            nodes: Vec::new(),
            fills: Vec::new(),
            y: config.margin,
            fresh: true,
            blocks_split: 0,
        }
    }

    fn remaining(&self) -> f32 {
        self.config.content_bottom() - self.y
    }

    fn gap_for(&self, block: &Block) -> f32 {
        if self.fresh {
            0.0
        } else {
            block.space_before
        }
    }

    /// Height the chain would take when its first gap is `first_gap`.
    fn chain_height(chain: &[Block], first_gap: f32) -> f32 {
        chain
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let gap = if i == 0 { first_gap } else { b.space_before };
                gap + b.height()
            })
            .sum()
    }

    fn place_chain(&mut self, chain: Vec<Block>) {
        let Some(first) = chain.first() else {
            return;
        };

        let here = Self::chain_height(&chain, self.gap_for(first));
        if here <= self.remaining() + EPSILON {
            chain.into_iter().for_each(|b| self.place_block(b));
            return;
        }

        let on_fresh_page = Self::chain_height(&chain, 0.0);
        if on_fresh_page <= self.config.content_height() + EPSILON {
            self.break_page();
            chain.into_iter().for_each(|b| self.place_block(b));
            return;
        }

        // Too tall for any page: the block after the headings has to flow.
        if !self.fresh {
            self.break_page();
        }
        let last = chain.len() - 1;
        for (i, block) in chain.into_iter().enumerate() {
            if i < last {
                self.place_single(block);
            } else {
                self.flow_block(block);
            }
        }
    }

    fn place_single(&mut self, block: Block) {
        if self.gap_for(&block) + block.height() <= self.remaining() + EPSILON {
            self.place_block(block);
            return;
        }
        if !self.fresh && block.height() <= self.config.content_height() + EPSILON {
            self.break_page();
            self.place_block(block);
            return;
        }

        self.flow_block(block);
    }

    /// Places `block` line by line from the current position, breaking pages as
    /// needed. Counted as a split only when it actually crosses a page break.
    fn flow_block(&mut self, block: Block) {
        if self.gap_for(&block) + block.height() <= self.remaining() + EPSILON {
            self.place_block(block);
            return;
        }

        self.blocks_split += 1;
        warn!(
            height = block.height(),
            remaining = self.remaining(),
            page_height = self.config.content_height(),
            "Block does not fit on one page; splitting at line boundaries"
        );
        self.y += self.gap_for(&block);
        for line in block.lines {
            if !self.fresh && line.height > self.remaining() + EPSILON {
                self.break_page();
            }
            self.place_line(line);
        }
    }

    fn place_block(&mut self, block: Block) {
        self.y += self.gap_for(&block);
        for line in block.lines {
            self.place_line(line);
        }
    }

    fn place_line(&mut self, line: Line) {
        let top = self.y;
        let left = self.config.margin;
        self.nodes
            .extend(line.nodes.into_iter().map(|n| n.offset(left, top)));
        self.y += line.height;
        self.fresh = false;
    }

    fn break_page(&mut self) {
        let used = (self.y - self.config.margin) / self.config.content_height();
        self.fills.push(used.clamp(0.0, 1.0));
        self.pages.push(Page {
            number: self.pages.len() + 1,
            nodes: std::mem::take(&mut self.nodes),
        });
        self.y = self.config.margin;
        self.fresh = true;
    }

    fn finish(mut self) -> (Vec<Page>, PaginationReport) {
        if !self.nodes.is_empty() || self.pages.is_empty() {
            self.break_page();
        }
        let report = PaginationReport {
            page_count: self.pages.len(),
            page_fill: self.fills,
            blocks_split: self.blocks_split,
        };
        (self.pages, report)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::document::{TextKind, TextRun};
    use crate::layout::font_metrics::{a4_page_config, FontFace};
    use crate::layout::theme::Rgb;

    fn make_line(label: &str, height: f32) -> Line {
        Line {
            height,
            nodes: vec![Node::Text(TextRun {
                x: 0.0,
                baseline: height * 0.8,
                text: label.to_string(),
                face: FontFace::Regular,
                size: 11.0,
                color: Rgb::grey(0),
                kind: TextKind::Body,
            })],
        }
    }

    fn make_block(label: &str, lines: usize, line_height: f32) -> Block {
        Block::new(
            (0..lines)
                .map(|i| make_line(&format!("{label}-{i}"), line_height))
                .collect(),
            10.0,
        )
    }

    /// Pages on which any line of `label` was placed.
    fn pages_of(pages: &[Page], label: &str) -> Vec<usize> {
        let mut found: Vec<usize> = pages
            .iter()
            .filter(|p| {
                p.nodes
                    .iter()
                    .filter_map(Node::as_text)
                    .any(|r| r.text.starts_with(&format!("{label}-")))
            })
            .map(|p| p.number)
            .collect();
        found.dedup();
        found
    }

    #[test]
    fn test_empty_input_yields_one_blank_page() {
        let (pages, report) = paginate(vec![], &a4_page_config());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].nodes.is_empty());
        assert_eq!(report.page_count, 1);
    }

    #[test]
    fn test_blocks_offset_by_margin() {
        let config = a4_page_config();
        let (pages, _) = paginate(vec![make_block("a", 1, 20.0)], &config);
        let run = pages[0].nodes[0].as_text().unwrap();
        assert!((run.x - config.margin).abs() < 1e-4);
        // First block on a page: space_before dropped.
        assert!((run.baseline - (config.margin + 16.0)).abs() < 1e-3);
    }

    #[test]
    fn test_block_that_does_not_fit_moves_whole() {
        let config = a4_page_config();
        // content height 781.89: 3 blocks of 250 fit (770 incl. gaps), the 4th does not.
        let blocks: Vec<Block> = (0..4)
            .map(|i| make_block(&format!("b{i}"), 10, 25.0))
            .collect();
        let (pages, report) = paginate(blocks, &config);

        assert_eq!(report.page_count, 2);
        assert_eq!(pages_of(&pages, "b2"), vec![1]);
        assert_eq!(pages_of(&pages, "b3"), vec![2]);
        assert_eq!(report.blocks_split, 0);
    }

    #[test]
    fn test_no_block_ever_straddles_pages() {
        let config = a4_page_config();
        let blocks: Vec<Block> = (0..40)
            .map(|i| make_block(&format!("e{i}"), 1 + i % 5, 15.4))
            .collect();
        let (pages, report) = paginate(blocks, &config);
        assert!(report.page_count > 1);
        for i in 0..40 {
            assert_eq!(pages_of(&pages, &format!("e{i}")).len(), 1, "block e{i} split");
        }
    }

    #[test]
    fn test_nothing_is_placed_below_the_bottom_margin() {
        let config = a4_page_config();
        let blocks: Vec<Block> = (0..30).map(|i| make_block(&format!("x{i}"), 4, 18.0)).collect();
        let (pages, _) = paginate(blocks, &config);
        for page in &pages {
            for run in page.nodes.iter().filter_map(Node::as_text) {
                assert!(run.baseline <= config.content_bottom());
            }
        }
    }

    #[test]
    fn test_heading_travels_with_next_block() {
        let config = a4_page_config();
        // Fill most of page 1, leaving room for the heading but not heading + entry.
        let filler = make_block("filler", 1, 740.0);
        let mut heading = make_block("heading", 1, 30.0);
        heading.keep_with_next = true;
        let entry = make_block("entry", 3, 20.0);

        let (pages, _) = paginate(vec![filler, heading, entry], &config);
        assert_eq!(pages_of(&pages, "heading"), vec![2]);
        assert_eq!(pages_of(&pages, "entry"), vec![2]);
    }

    #[test]
    fn test_heading_never_ends_a_page_when_chain_exceeds_a_page() {
        let config = a4_page_config();
        let filler = make_block("filler", 1, 300.0);
        let mut heading = make_block("heading", 1, 30.0);
        heading.keep_with_next = true;
        // 760pt fits a page alone, but not after the heading (30 + 10 + 760).
        let entry = make_block("entry", 38, 20.0);

        let (pages, report) = paginate(vec![filler, heading, entry], &config);
        assert_eq!(pages_of(&pages, "filler"), vec![1]);
        assert_eq!(pages_of(&pages, "heading"), vec![2]);
        assert_eq!(pages_of(&pages, "entry"), vec![2, 3]);
        assert_eq!(report.blocks_split, 1);
        for page in &pages {
            let last = page.nodes.iter().filter_map(Node::as_text).last().unwrap();
            assert!(!last.text.starts_with("heading-"), "page {} ends with heading", page.number);
        }
    }

    #[test]
    fn test_oversized_chain_on_fresh_page_does_not_add_blank_page() {
        let config = a4_page_config();
        let mut heading = make_block("heading", 1, 30.0);
        heading.keep_with_next = true;
        let entry = make_block("entry", 38, 20.0);

        let (pages, _) = paginate(vec![heading, entry], &config);
        assert_eq!(pages_of(&pages, "heading"), vec![1]);
        assert_eq!(pages_of(&pages, "entry"), vec![1, 2]);
    }

    #[test]
    fn test_oversized_block_is_split_and_reported() {
        let config = a4_page_config();
        let giant = make_block("giant", 100, 20.0); // 2000pt
        let (pages, report) = paginate(vec![giant], &config);
        assert_eq!(report.blocks_split, 1);
        assert!(report.page_count >= 3);
        assert_eq!(pages_of(&pages, "giant").len(), report.page_count);
    }

    #[test]
    fn test_empty_blocks_are_skipped() {
        let config = a4_page_config();
        let blank = Block::new(vec![Line::gap(500.0)], 0.0);
        let (pages, report) = paginate(vec![blank, make_block("a", 1, 20.0)], &config);
        assert_eq!(report.page_count, 1);
        assert_eq!(pages_of(&pages, "a"), vec![1]);
    }

    #[test]
    fn test_page_fill_reported_per_page() {
        let config = a4_page_config();
        let (_, report) = paginate(vec![make_block("a", 1, config.content_height() / 2.0)], &config);
        assert_eq!(report.page_fill.len(), 1);
        assert!((report.page_fill[0] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_chain_blocks_groups_keep_with_next() {
        let mut heading = make_block("h", 1, 10.0);
        heading.keep_with_next = true;
        let chains = chain_blocks(vec![heading, make_block("a", 1, 10.0), make_block("b", 1, 10.0)]);
        assert_eq!(chains.len(), 2);
        assert_eq!(chains[0].len(), 2);
        assert_eq!(chains[1].len(), 1);
    }
}
