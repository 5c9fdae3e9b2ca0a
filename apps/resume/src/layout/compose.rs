//! Composition — maps a `ResumeData` snapshot onto styled, atomic layout blocks.
//!
//! Everything here is positioned relative to the content box; pagination adds the
//! page margin and decides page breaks. No function in this module can fail: blank
//! or missing optional fields are simply not drawn.

use std::iter;

use tracing::warn;

use crate::crop::data_url::decode_image_data_url;

use crate::layout::document::{ImageBox, Node, Rule, TextKind, TextRun};
use crate::layout::font_metrics::{get_metrics, FontFace, PageConfig, ASCENT_EM, DESCENT_EM};
use crate::layout::order::SectionOrder;
use crate::layout::paginate::{Block, Line};
use crate::layout::text::{bullet_points, present, wrap_text};
use crate::layout::theme::{Palette, Rgb};
use crate::models::resume::{
    AchievementEntry, CustomEntry, CustomSection, CustomSectionBody, EducationEntry,
    ExperienceEntry, ProjectEntry, ResumeData, SectionKey,
};

pub const BULLET: &str = "\u{2022}";
pub const SEPARATOR: &str = " \u{00B7} ";
pub const ROLE_SEPARATOR: &str = " | ";

const PORTRAIT_SIZE: f32 = 80.0;
const PORTRAIT_GAP: f32 = 15.0;
const NAME_MARGIN: f32 = 4.0;
const ROLES_MARGIN: f32 = 8.0;
const CONTACT_GAP: f32 = 20.0;
const HEADING_SPACE_BEFORE: f32 = 18.0;
const HEADING_RULE_GAP: f32 = 4.0;
const RULE_THICKNESS: f32 = 1.0;
const HEADING_MARGIN_BOTTOM: f32 = 8.0;
const ENTRY_SPACING: f32 = 10.0;
const PARAGRAPH_SPACING: f32 = 6.0;
const ROW_GAP: f32 = 2.0;
const BULLET_GAP: f32 = 5.0;
const BULLET_SPACING: f32 = 2.0;
const COLUMN_GAP: f32 = 10.0;
/// Right-hand meta column (dates, locations) never takes more than this share of the width.
const META_MAX_FRACTION: f32 = 0.4;

// ────────────────────────────────────────────────────────────────────────────
// Styles
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub(crate) struct TextStyle {
    pub face: FontFace,
    pub size: f32,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    pub color: Rgb,
    pub kind: TextKind,
}

impl TextStyle {
    const fn new(face: FontFace, size: f32, line_height: f32, color: Rgb, kind: TextKind) -> Self {
        Self {
            face,
            size,
            line_height,
            color,
            kind,
        }
    }

    pub fn leading(&self) -> f32 {
        self.size * self.line_height
    }

    pub fn width(&self, text: &str) -> f32 {
        get_metrics(self.face).width_pt(text, self.size)
    }

    pub fn wrap(&self, text: &str, width: f32) -> Vec<String> {
        wrap_text(text, get_metrics(self.face), self.size, width)
    }

    /// Baseline offset from the top of a line, glyph box centred in the leading.
    fn baseline(&self) -> f32 {
        self.leading() / 2.0 + (ASCENT_EM - DESCENT_EM) / 2.0 * self.size
    }

    fn run(&self, text: &str, x: f32, top: f32) -> Node {
        Node::Text(TextRun {
            x,
            baseline: top + self.baseline(),
            text: text.to_string(),
            face: self.face,
            size: self.size,
            color: self.color,
            kind: self.kind,
        })
    }

    fn line(&self, text: &str, x: f32) -> Line {
        Line {
            height: self.leading(),
            nodes: vec![self.run(text, x, 0.0)],
        }
    }
}

/// The document's style sheet for one palette.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Styles {
    pub name: TextStyle,
    pub roles: TextStyle,
    pub contact: TextStyle,
    pub heading: TextStyle,
    pub entry_title: TextStyle,
    pub entry_subtitle: TextStyle,
    pub meta: TextStyle,
    pub body: TextStyle,
    pub bullet: TextStyle,
    pub token: TextStyle,
    pub separator: TextStyle,
}

impl Styles {
    pub fn new(palette: &Palette, base: f32) -> Self {
        use FontFace::*;
        Self {
            name: TextStyle::new(Bold, 24.0, 1.2, palette.text, TextKind::Name),
            roles: TextStyle::new(Regular, 16.0, 1.2, palette.muted, TextKind::Roles),
            contact: TextStyle::new(Regular, 10.0, 1.4, palette.contact, TextKind::Contact),
            heading: TextStyle::new(Bold, 16.0, 1.2, palette.text, TextKind::Heading),
            entry_title: TextStyle::new(Bold, 13.0, 1.25, palette.text, TextKind::EntryTitle),
            entry_subtitle: TextStyle::new(
                BoldItalic,
                12.0,
                1.25,
                palette.contact,
                TextKind::EntrySubtitle,
            ),
            meta: TextStyle::new(Regular, base, 1.25, palette.muted, TextKind::Meta),
            body: TextStyle::new(Regular, base, 1.4, palette.body, TextKind::Body),
            bullet: TextStyle::new(Bold, base, 1.4, palette.text, TextKind::BulletGlyph),
            token: TextStyle::new(Regular, base, 1.6, palette.text, TextKind::Token),
            separator: TextStyle::new(Regular, base, 1.6, palette.muted, TextKind::Separator),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Data-level rules
// ────────────────────────────────────────────────────────────────────────────

/// Header layout, selected by the presence of a usable profile image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderVariant<'a> {
    Centered,
    WithPortrait(&'a str),
}

/// An image that does not decode counts as absent.
pub fn header_variant(data: &ResumeData) -> HeaderVariant<'_> {
    let Some(url) = present(data.profile_image.as_deref()) else {
        return HeaderVariant::Centered;
    };
    match decode_image_data_url(url) {
        Ok(_) => HeaderVariant::WithPortrait(url),
        Err(e) => {
            warn!(error = %e, "Ignoring unusable profile image");
            HeaderVariant::Centered
        }
    }
}

/// Phone, email, location, link, in that order; blanks are omitted.
/// Both header variants draw exactly these items.
pub fn contact_items(data: &ResumeData) -> Vec<&str> {
    [
        Some(data.phone.as_str()),
        Some(data.email.as_str()),
        Some(data.location.as_str()),
    ]
    .into_iter()
    .chain(iter::once(data.link.as_deref()))
    .filter_map(present)
    .collect()
}

/// Role titles joined with `" | "`, or `None` when there are none.
pub fn roles_line(data: &ResumeData) -> Option<String> {
    let titles: Vec<&str> = data
        .roles
        .iter()
        .filter_map(|r| present(Some(r.title.as_str())))
        .collect();
    if titles.is_empty() {
        None
    } else {
        Some(titles.join(ROLE_SEPARATOR))
    }
}

fn has_tokens(tokens: &[String]) -> bool {
    tokens.iter().any(|t| present(Some(t.as_str())).is_some())
}

/// Whether the built-in section has anything to show, ignoring visibility.
pub fn section_has_content(data: &ResumeData, key: SectionKey) -> bool {
    match key {
        SectionKey::Summary => present(Some(data.summary.as_str())).is_some(),
        SectionKey::Experience => !data.experience.is_empty(),
        SectionKey::Education => !data.education.is_empty(),
        SectionKey::Achievements => !data.achievements.is_empty(),
        SectionKey::Projects => !data.projects.is_empty(),
        SectionKey::Skills => has_tokens(&data.skills),
        SectionKey::Languages => has_tokens(&data.languages),
    }
}

/// A section is rendered iff it is visible and has content.
pub fn section_is_rendered(data: &ResumeData, key: SectionKey) -> bool {
    data.is_visible(key) && section_has_content(data, key)
}

pub fn custom_section_has_content(section: &CustomSection) -> bool {
    match &section.body {
        CustomSectionBody::Unset => false,
        CustomSectionBody::Entries(entries) => !entries.is_empty(),
        CustomSectionBody::Text(content) => has_tokens(content),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Composer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Center,
}

pub(crate) struct Composer<'a> {
    data: &'a ResumeData,
    styles: Styles,
    palette: Palette,
    width: f32,
}

impl<'a> Composer<'a> {
    pub fn new(data: &'a ResumeData, palette: Palette, page: &PageConfig) -> Self {
        Self {
            data,
            styles: Styles::new(&palette, page.base_font_size),
            palette,
            width: page.content_width(),
        }
    }

    /// Header, built-in sections in `order`, then custom sections in data order.
    pub fn compose(&self, order: &SectionOrder) -> Vec<Block> {
        let mut blocks = vec![self.header()];
        for key in order.keys() {
            blocks.extend(self.section(*key));
        }
        for custom in &self.data.custom_sections {
            blocks.extend(self.custom_section(custom));
        }
        blocks
    }

    // ── header ──────────────────────────────────────────────────────────────

    fn header(&self) -> Block {
        match header_variant(self.data) {
            HeaderVariant::Centered => Block::new(self.header_lines(self.width, Align::Center), 0.0),
            HeaderVariant::WithPortrait(url) => {
                let text_x = PORTRAIT_SIZE + PORTRAIT_GAP;
                let text_lines = self.header_lines(self.width - text_x, Align::Left);
                let text_height: f32 = text_lines.iter().map(|l| l.height).sum();
                let height = text_height.max(PORTRAIT_SIZE);

                let mut nodes = vec![Node::Image(ImageBox {
                    x: 0.0,
                    y: (height - PORTRAIT_SIZE) / 2.0,
                    width: PORTRAIT_SIZE,
                    height: PORTRAIT_SIZE,
                    data_url: url.to_string(),
                })];
                let mut y = (height - text_height) / 2.0;
                for line in text_lines {
                    nodes.extend(line.nodes.into_iter().map(|n| n.offset(text_x, y)));
                    y += line.height;
                }
                Block::new(vec![Line { height, nodes }], 0.0)
            }
        }
    }

    fn header_lines(&self, width: f32, align: Align) -> Vec<Line> {
        let mut lines = Vec::new();

        if let Some(name) = present(Some(self.data.name.as_str())) {
            lines.extend(self.aligned(name, &self.styles.name, width, align));
            lines.push(Line::gap(NAME_MARGIN));
        }
        if let Some(roles) = roles_line(self.data) {
            lines.extend(self.aligned(&roles, &self.styles.roles, width, align));
            lines.push(Line::gap(ROLES_MARGIN));
        }
        lines.extend(self.contact_rows(&contact_items(self.data), width, align));

        while lines.last().is_some_and(|l| l.nodes.is_empty()) {
            lines.pop();
        }
        lines
    }

    fn aligned(&self, text: &str, style: &TextStyle, width: f32, align: Align) -> Vec<Line> {
        style
            .wrap(text, width)
            .into_iter()
            .map(|l| {
                let x = match align {
                    Align::Left => 0.0,
                    Align::Center => ((width - style.width(&l)) / 2.0).max(0.0),
                };
                style.line(&l, x)
            })
            .collect()
    }

    /// Packs contact items into rows separated by a fixed gap.
    fn contact_rows(&self, items: &[&str], width: f32, align: Align) -> Vec<Line> {
        let style = &self.styles.contact;
        let mut rows: Vec<(Vec<(String, f32)>, f32)> = Vec::new();
        let mut row: Vec<(String, f32)> = Vec::new();
        let mut row_width = 0.0_f32;

        for item in items {
            for piece in style.wrap(item, width) {
                let w = style.width(&piece);
                if !row.is_empty() && row_width + CONTACT_GAP + w > width {
                    rows.push((std::mem::take(&mut row), row_width));
                    row_width = 0.0;
                }
                row_width += if row.is_empty() { w } else { CONTACT_GAP + w };
                row.push((piece, w));
            }
        }
        if !row.is_empty() {
            rows.push((row, row_width));
        }

        rows.into_iter()
            .map(|(items, row_width)| {
                let mut x = match align {
                    Align::Left => 0.0,
                    Align::Center => ((width - row_width) / 2.0).max(0.0),
                };
                let mut nodes = Vec::with_capacity(items.len());
                for (text, w) in items {
                    nodes.push(style.run(&text, x, 0.0));
                    x += w + CONTACT_GAP;
                }
                Line {
                    height: style.leading(),
                    nodes,
                }
            })
            .collect()
    }

    // ── sections ────────────────────────────────────────────────────────────

    fn section(&self, key: SectionKey) -> Vec<Block> {
        if !section_is_rendered(self.data, key) {
            return Vec::new();
        }

        let data = self.data;
        let (body, spacing) = match key {
            SectionKey::Summary => (vec![Block::new(self.text_lines(&data.summary), 0.0)], 0.0),
            SectionKey::Experience => (
                data.experience.iter().map(|e| self.experience_entry(e)).collect(),
                ENTRY_SPACING,
            ),
            SectionKey::Education => (
                data.education.iter().map(|e| self.education_entry(e)).collect(),
                ENTRY_SPACING,
            ),
            SectionKey::Achievements => (
                data.achievements
                    .iter()
                    .map(|e| self.achievement_entry(e))
                    .collect(),
                ENTRY_SPACING,
            ),
            SectionKey::Projects => (
                data.projects.iter().map(|e| self.project_entry(e)).collect(),
                ENTRY_SPACING,
            ),
            SectionKey::Skills => (self.tokens(&data.skills), 0.0),
            SectionKey::Languages => (self.tokens(&data.languages), 0.0),
        };

        self.with_heading(data.title_for(key), body, spacing)
    }

    fn custom_section(&self, section: &CustomSection) -> Vec<Block> {
        if !custom_section_has_content(section) {
            return Vec::new();
        }

        let (body, spacing) = match &section.body {
            CustomSectionBody::Unset => (Vec::new(), 0.0),
            CustomSectionBody::Entries(entries) => (
                entries.iter().map(|e| self.custom_entry(e)).collect(),
                ENTRY_SPACING,
            ),
            CustomSectionBody::Text(content) => (
                content
                    .iter()
                    .filter(|t| present(Some(t.as_str())).is_some())
                    .map(|t| Block::new(self.text_lines(t), 0.0))
                    .collect(),
                PARAGRAPH_SPACING,
            ),
        };

        self.with_heading(&section.title, body, spacing)
    }

    /// Heading block (kept with the first body block) followed by spaced body blocks.
    fn with_heading(&self, title: &str, body: Vec<Block>, spacing: f32) -> Vec<Block> {
        let mut blocks = Vec::with_capacity(body.len() + 1);
        blocks.extend(self.heading(title));
        blocks.extend(body.into_iter().enumerate().map(|(i, mut b)| {
            b.space_before = if i == 0 { 0.0 } else { spacing };
            b
        }));
        blocks
    }

    fn heading(&self, title: &str) -> Option<Block> {
        let title = present(Some(title))?;
        let style = &self.styles.heading;

        let mut lines: Vec<Line> = style
            .wrap(title, self.width)
            .iter()
            .map(|l| style.line(l, 0.0))
            .collect();
        lines.push(Line {
            height: HEADING_RULE_GAP + RULE_THICKNESS + HEADING_MARGIN_BOTTOM,
            nodes: vec![Node::Rule(Rule {
                x: 0.0,
                y: HEADING_RULE_GAP,
                width: self.width,
                thickness: RULE_THICKNESS,
                color: self.palette.rule,
            })],
        });

        Some(Block {
            lines,
            space_before: HEADING_SPACE_BEFORE,
            keep_with_next: true,
        })
    }

    // ── entries ─────────────────────────────────────────────────────────────

    fn experience_entry(&self, entry: &ExperienceEntry) -> Block {
        let s = &self.styles;
        let title = present(Some(entry.title.as_str())).or_else(|| present(entry.position.as_deref()));
        let mut lines = self.columns(
            &[(Some(entry.company.as_str()), s.entry_title), (title, s.entry_subtitle)],
            &[(Some(entry.duration.as_str()), s.meta), (entry.location.as_deref(), s.meta)],
        );
        self.append_bullets(&mut lines, &entry.description);
        Block::new(lines, 0.0)
    }

    fn education_entry(&self, entry: &EducationEntry) -> Block {
        let s = &self.styles;
        let degree = match (
            present(Some(entry.degree.as_str())),
            present(entry.field.as_deref()),
        ) {
            (Some(degree), Some(field)) => Some(format!("{degree}, {field}")),
            (Some(degree), None) => Some(degree.to_string()),
            (None, Some(field)) => Some(field.to_string()),
            (None, None) => None,
        };
        let mut lines = self.columns(
            &[(Some(entry.school.as_str()), s.entry_title), (degree.as_deref(), s.entry_subtitle)],
            &[(Some(entry.duration.as_str()), s.meta), (entry.location.as_deref(), s.meta)],
        );
        self.append_bullets(&mut lines, entry.description.as_deref().unwrap_or_default());
        Block::new(lines, 0.0)
    }

    fn achievement_entry(&self, entry: &AchievementEntry) -> Block {
        let s = &self.styles;
        let mut lines = self.columns(
            &[(Some(entry.title.as_str()), s.entry_title)],
            &[(entry.date.as_deref(), s.meta)],
        );
        self.append_bullets(&mut lines, &entry.description);
        Block::new(lines, 0.0)
    }

    fn project_entry(&self, entry: &ProjectEntry) -> Block {
        let s = &self.styles;
        let mut lines = self.columns(&[(Some(entry.name.as_str()), s.entry_title)], &[]);
        self.append_bullets(&mut lines, &entry.description);

        let technologies: Vec<&str> = entry
            .technologies
            .iter()
            .filter_map(|t| present(Some(t.as_str())))
            .collect();
        if !technologies.is_empty() {
            let text = format!("Technologies: {}", technologies.join(", "));
            self.append_rows(&mut lines, self.text_lines(&text));
        }
        if let Some(link) = present(entry.link.as_deref()) {
            self.append_rows(&mut lines, self.text_lines(&format!("Link: {link}")));
        }
        Block::new(lines, 0.0)
    }

    fn custom_entry(&self, entry: &CustomEntry) -> Block {
        let s = &self.styles;
        let mut lines = self.columns(
            &[(Some(entry.title.as_str()), s.entry_title), (entry.organization.as_deref(), s.entry_subtitle)],
            &[(entry.date.as_deref(), s.meta), (entry.location.as_deref(), s.meta)],
        );
        self.append_bullets(&mut lines, entry.description.as_deref().unwrap_or_default());
        Block::new(lines, 0.0)
    }

    // ── building blocks ─────────────────────────────────────────────────────

    /// Two-column rows: wrapped titles on the left, right-aligned meta on the right.
    fn columns(&self, left: &[(Option<&str>, TextStyle)], right: &[(Option<&str>, TextStyle)]) -> Vec<Line> {
        let keep = |items: &[(Option<&str>, TextStyle)]| -> Vec<(String, TextStyle)> {
            items
                .iter()
                .filter_map(|(text, style)| present(*text).map(|t| (t.to_string(), *style)))
                .collect()
        };
        let left = keep(left);
        let right = keep(right);

        let right_width = right
            .iter()
            .map(|(t, s)| s.width(t))
            .fold(0.0_f32, f32::max)
            .min(self.width * META_MAX_FRACTION);
        let left_width = if right.is_empty() {
            self.width
        } else {
            self.width - right_width - COLUMN_GAP
        };

        let wrap_all = |items: Vec<(String, TextStyle)>, width: f32| -> Vec<(String, TextStyle)> {
            items
                .into_iter()
                .flat_map(|(t, s)| s.wrap(&t, width).into_iter().map(move |l| (l, s)))
                .collect()
        };
        let left = wrap_all(left, left_width);
        let right = wrap_all(right, right_width);

        (0..left.len().max(right.len()))
            .map(|i| {
                let l = left.get(i);
                let r = right.get(i);
                let height = l
                    .map(|(_, s)| s.leading())
                    .into_iter()
                    .chain(r.map(|(_, s)| s.leading()))
                    .fold(0.0_f32, f32::max);

                let mut nodes = Vec::with_capacity(2);
                if let Some((text, style)) = l {
                    nodes.push(style.run(text, 0.0, (height - style.leading()) / 2.0));
                }
                if let Some((text, style)) = r {
                    let x = (self.width - style.width(text)).max(0.0);
                    nodes.push(style.run(text, x, (height - style.leading()) / 2.0));
                }
                Line { height, nodes }
            })
            .collect()
    }

    /// Bullet list: glyph plus wrapped text, continuation lines indented under the text.
    fn bullets(&self, description: &str) -> Vec<Line> {
        let glyph = &self.styles.bullet;
        let body = &self.styles.body;
        let indent = glyph.width(BULLET) + BULLET_GAP;
        let height = body.leading().max(glyph.leading());

        let mut lines = Vec::new();
        for (i, point) in bullet_points(description).into_iter().enumerate() {
            if i > 0 {
                lines.push(Line::gap(BULLET_SPACING));
            }
            for (j, text) in body.wrap(point, self.width - indent).iter().enumerate() {
                let mut nodes = Vec::with_capacity(2);
                if j == 0 {
                    nodes.push(glyph.run(BULLET, 0.0, (height - glyph.leading()) / 2.0));
                }
                nodes.push(body.run(text, indent, (height - body.leading()) / 2.0));
                lines.push(Line { height, nodes });
            }
        }
        lines
    }

    fn append_bullets(&self, lines: &mut Vec<Line>, description: &str) {
        let bullets = self.bullets(description);
        self.append_rows(lines, bullets);
    }

    fn append_rows(&self, lines: &mut Vec<Line>, rows: Vec<Line>) {
        if rows.is_empty() {
            return;
        }
        if !lines.is_empty() {
            lines.push(Line::gap(ROW_GAP));
        }
        lines.extend(rows);
    }

    /// Plain paragraph text; each non-blank source line is wrapped separately.
    fn text_lines(&self, text: &str) -> Vec<Line> {
        let body = &self.styles.body;
        bullet_points(text)
            .into_iter()
            .flat_map(|para| body.wrap(para, self.width))
            .map(|l| body.line(&l, 0.0))
            .collect()
    }

    /// Inline token list with a separator strictly between tokens.
    ///
    /// A token's trailing separator always stays on the token's row.
    fn tokens(&self, tokens: &[String]) -> Vec<Block> {
        let tokens: Vec<&str> = tokens
            .iter()
            .filter_map(|t| present(Some(t.as_str())))
            .collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        let token_style = &self.styles.token;
        let sep_style = &self.styles.separator;
        let sep_width = sep_style.width(SEPARATOR);
        let height = token_style.leading().max(sep_style.leading());

        let mut lines: Vec<Line> = Vec::new();
        let mut nodes: Vec<Node> = Vec::new();
        let mut x = 0.0_f32;

        for (i, token) in tokens.iter().enumerate() {
            let last_token = i + 1 == tokens.len();
            let pieces = token_style.wrap(token, self.width);
            let piece_count = pieces.len();

            for (j, piece) in pieces.into_iter().enumerate() {
                let w = token_style.width(&piece);
                let trailing = if j + 1 == piece_count && !last_token {
                    sep_width
                } else {
                    0.0
                };
                if x > 0.0 && x + w + trailing > self.width {
                    lines.push(Line {
                        height,
                        nodes: std::mem::take(&mut nodes),
                    });
                    x = 0.0;
                }
                nodes.push(token_style.run(&piece, x, (height - token_style.leading()) / 2.0));
                x += w;
                if trailing > 0.0 {
                    nodes.push(sep_style.run(SEPARATOR, x, (height - sep_style.leading()) / 2.0));
                    x += sep_width;
                }
            }
        }
        if !nodes.is_empty() {
            lines.push(Line { height, nodes });
        }

        vec![Block::new(lines, 0.0)]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
