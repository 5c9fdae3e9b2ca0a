//! The rendered document tree: pages of absolutely positioned nodes.
//!
//! This tree is the single artifact shared by the on-screen preview and the PDF
//! export. Coordinates are PDF points with the origin at the top-left corner of the
//! page; the exporter flips the y axis.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::AppError;
use crate::layout::font_metrics::FontFace;
use crate::layout::theme::Rgb;

/// What a text run represents, so consumers can inspect the document without
/// reverse-engineering styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    Name,
    Roles,
    Contact,
    Heading,
    EntryTitle,
    EntrySubtitle,
    Meta,
    Body,
    BulletGlyph,
    Token,
    Separator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub x: f32,
    pub baseline: f32,
    pub text: String,
    pub face: FontFace,
    pub size: f32,
    pub color: Rgb,
    pub kind: TextKind,
}

/// Horizontal rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub thickness: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Embedded image as a data URL, exactly as stored on the resume.
    pub data_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Text(TextRun),
    Rule(Rule),
    Image(ImageBox),
}

impl Node {
    /// Returns the node translated by `(dx, dy)`.
    pub fn offset(self, dx: f32, dy: f32) -> Node {
        match self {
            Node::Text(mut run) => {
                run.x += dx;
                run.baseline += dy;
                Node::Text(run)
            }
            Node::Rule(mut rule) => {
                rule.x += dx;
                rule.y += dy;
                Node::Rule(rule)
            }
            Node::Image(mut image) => {
                image.x += dx;
                image.y += dy;
                Node::Image(image)
            }
        }
    }

    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            Node::Text(run) => Some(run),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based.
    pub number: usize,
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub title: String,
    pub author: String,
    pub page_width: f32,
    pub page_height: f32,
    pub background: Rgb,
    pub pages: Vec<Page>,
}

impl RenderedDocument {
    /// SHA-256 of the serialized tree. Equal inputs yield equal fingerprints.
    pub fn fingerprint(&self) -> Result<String, AppError> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    /// All text runs in reading order (page by page, placement order).
    pub fn text_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.pages
            .iter()
            .flat_map(|p| p.nodes.iter())
            .filter_map(Node::as_text)
    }

    pub fn runs_of_kind(&self, kind: TextKind) -> Vec<&TextRun> {
        self.text_runs().filter(|r| r.kind == kind).collect()
    }

    /// Section headings in document order.
    pub fn headings(&self) -> Vec<&str> {
        self.runs_of_kind(TextKind::Heading)
            .into_iter()
            .map(|r| r.text.as_str())
            .collect()
    }

    pub fn images(&self) -> Vec<&ImageBox> {
        self.pages
            .iter()
            .flat_map(|p| p.nodes.iter())
            .filter_map(|n| match n {
                Node::Image(image) => Some(image),
                _ => None,
            })
            .collect()
    }
}
