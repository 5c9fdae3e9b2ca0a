// Document renderer: ResumeData + theme → paginated A4 document tree.
// Pure and deterministic: no clock, no randomness, no I/O. The same tree feeds the
// preview and the PDF exporter.

pub mod compose;
pub mod document;
pub mod font_metrics;
pub mod order;
pub mod paginate;
pub mod text;
pub mod theme;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::resume::ResumeData;

pub use compose::{contact_items, header_variant, section_is_rendered, HeaderVariant};
pub use document::{Node, RenderedDocument, TextKind};
pub use font_metrics::PageConfig;
pub use order::SectionOrder;
pub use theme::Theme;

/// Everything besides the data that shapes a render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub theme: Theme,
    pub page: PageConfig,
    pub section_order: SectionOrder,
}

impl RenderOptions {
    pub fn with_theme(theme: Theme) -> Self {
        Self {
            theme,
            ..Self::default()
        }
    }
}

/// Renders a snapshot into pages. Never fails: blank or missing fields are omitted.
pub fn render_document(data: &ResumeData, options: &RenderOptions) -> RenderedDocument {
    let palette = options.theme.palette();
    let blocks = compose::Composer::new(data, palette, &options.page).compose(&options.section_order);
    let (pages, report) = paginate::paginate(blocks, &options.page);

    debug!(
        theme = %options.theme,
        pages = report.page_count,
        blocks_split = report.blocks_split,
        page_fill = ?report.page_fill,
        "Rendered resume document"
    );

    let author = data.name.trim().to_string();
    let title = if author.is_empty() {
        String::new()
    } else {
        format!("{author}'s Resume")
    };

    RenderedDocument {
        title,
        author,
        page_width: options.page.width,
        page_height: options.page.height,
        background: palette.background,
        pages,
    }
}

/// A4, default section order.
pub fn render(data: &ResumeData, theme: Theme) -> RenderedDocument {
    render_document(data, &RenderOptions::with_theme(theme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::data_url::make_image_data_url;
    use crate::models::resume::{
        CustomEntry, CustomSection, ExperienceEntry, ProjectEntry, SectionKey,
    };

    fn make_name_and_summary() -> ResumeData {
        ResumeData {
            name: "Ada Lovelace".to_string(),
            summary: "Analyst of engines.".to_string(),
            ..ResumeData::empty()
        }
    }

    fn texts_of(doc: &RenderedDocument, kind: TextKind) -> Vec<String> {
        doc.runs_of_kind(kind).into_iter().map(|r| r.text.clone()).collect()
    }

    fn pages_with_text(doc: &RenderedDocument, text: &str) -> Vec<usize> {
        doc.pages
            .iter()
            .filter(|p| p.nodes.iter().filter_map(Node::as_text).any(|r| r.text == text))
            .map(|p| p.number)
            .collect()
    }

    #[test]
    fn test_render_is_idempotent() {
        let data = ResumeData::sample();
        let a = render(&data, Theme::Light);
        let b = render(&data, Theme::Light);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn test_sample_renders_all_default_sections_in_order() {
        let doc = render(&ResumeData::sample(), Theme::Light);
        assert_eq!(
            doc.headings(),
            vec![
                "Professional Summary",
                "Experience",
                "Education",
                "Achievements",
                "Key Projects",
                "Skills",
                "Languages",
            ]
        );
        assert_eq!(doc.title, "John Doe's Resume");
        assert_eq!(doc.author, "John Doe");
    }

    #[test]
    fn test_name_and_summary_only_renders_header_and_summary() {
        let doc = render(&make_name_and_summary(), Theme::Light);
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.headings(), vec!["Professional Summary"]);
        assert_eq!(texts_of(&doc, TextKind::Name), vec!["Ada Lovelace"]);
        assert_eq!(texts_of(&doc, TextKind::Body), vec!["Analyst of engines."]);
        for run in doc.text_runs() {
            assert!(
                matches!(run.kind, TextKind::Name | TextKind::Heading | TextKind::Body),
                "unexpected {:?} run '{}'",
                run.kind,
                run.text
            );
        }
        assert!(doc.images().is_empty());
    }

    #[test]
    fn test_empty_sequence_never_renders_heading() {
        let mut data = make_name_and_summary();
        data.visible_sections.insert(SectionKey::Achievements, true);
        let doc = render(&data, Theme::Light);
        assert!(!doc.headings().contains(&"Achievements"));
    }

    #[test]
    fn test_hidden_section_is_suppressed_even_when_non_empty() {
        let mut data = ResumeData::sample();
        data.visible_sections.insert(SectionKey::Skills, false);
        let doc = render(&data, Theme::Light);
        assert!(!doc.headings().contains(&"Skills"));
        assert!(texts_of(&doc, TextKind::Token)
            .iter()
            .all(|t| !data.skills.contains(t)));
    }

    #[test]
    fn test_omission_law_matches_section_predicate() {
        let mut data = ResumeData::sample();
        data.achievements.clear();
        data.summary = "   ".to_string();
        data.languages = vec![" ".to_string()];
        data.visible_sections.insert(SectionKey::Projects, false);

        let doc = render(&data, Theme::Light);
        let headings = doc.headings();
        for key in SectionKey::ALL {
            assert_eq!(
                headings.contains(&data.title_for(key)),
                section_is_rendered(&data, key),
                "section {key}"
            );
        }
        assert_eq!(headings, vec!["Experience", "Education", "Skills"]);
    }

    #[test]
    fn test_title_override_and_blank_override_fallback() {
        let mut data = make_name_and_summary();
        data.section_titles
            .insert(SectionKey::Summary, "About Me".to_string());
        assert_eq!(render(&data, Theme::Light).headings(), vec!["About Me"]);

        data.section_titles.insert(SectionKey::Summary, "  ".to_string());
        assert_eq!(
            render(&data, Theme::Light).headings(),
            vec!["Professional Summary"]
        );
    }

    #[test]
    fn test_entry_order_is_preserved() {
        let mut data = ResumeData::empty();
        data.experience = ["A", "B", "C"]
            .iter()
            .map(|c| ExperienceEntry::new(*c, "Engineer", "2020", "Did work"))
            .collect();
        let doc = render(&data, Theme::Light);
        assert_eq!(texts_of(&doc, TextKind::EntryTitle), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_separator_count_in_document() {
        for n in 0..8 {
            let data = ResumeData {
                skills: (0..n).map(|i| format!("Skill{i}")).collect(),
                ..ResumeData::empty()
            };
            let doc = render(&data, Theme::Light);
            assert_eq!(doc.runs_of_kind(TextKind::Token).len(), n);
            assert_eq!(doc.runs_of_kind(TextKind::Separator).len(), n.saturating_sub(1));
        }
    }

    #[test]
    fn test_header_branching_keeps_contacts_identical() {
        let plain = ResumeData::sample();
        let portrait = ResumeData::sample()
            .with_profile_image(Some(make_image_data_url(8, 8)));

        let a = render(&plain, Theme::Light);
        let b = render(&portrait, Theme::Light);
        assert_eq!(header_variant(&plain), HeaderVariant::Centered);
        assert!(matches!(header_variant(&portrait), HeaderVariant::WithPortrait(_)));
        assert_eq!(texts_of(&a, TextKind::Contact), texts_of(&b, TextKind::Contact));
        assert_eq!(a.images().len(), 0);
        assert_eq!(b.images().len(), 1);
        assert_eq!(b.images()[0].width, b.images()[0].height);
    }

    #[test]
    fn test_theme_changes_colours_only() {
        let data = ResumeData::sample();
        let light = render(&data, Theme::Light);
        let dark = render(&data, Theme::Dark);

        let shape = |doc: &RenderedDocument| -> Vec<(String, f32, f32, TextKind, usize)> {
            doc.pages
                .iter()
                .flat_map(|p| {
                    p.nodes
                        .iter()
                        .filter_map(Node::as_text)
                        .map(move |r| (r.text.clone(), r.x, r.baseline, r.kind, p.number))
                })
                .collect()
        };
        assert_eq!(shape(&light), shape(&dark));
        assert_ne!(light.background, dark.background);
        assert_ne!(light.fingerprint().unwrap(), dark.fingerprint().unwrap());
    }

    #[test]
    fn test_section_order_is_a_parameter() {
        let data = ResumeData::sample();
        let options = RenderOptions {
            section_order: "skills,summary".parse().unwrap(),
            ..RenderOptions::default()
        };
        let headings = render_document(&data, &options).headings().join("|");
        assert!(headings.starts_with("Skills|Professional Summary|Experience"));
    }

    #[test]
    fn test_custom_sections_follow_builtin_sections() {
        let mut data = make_name_and_summary();
        data.custom_sections = vec![
            CustomSection::entries("Volunteering", vec![CustomEntry::new("Mentor")]),
            CustomSection::text("Interests", vec!["Chess".to_string()]),
            CustomSection::text("Empty", vec!["   ".to_string()]),
        ];
        let options = RenderOptions {
            section_order: "languages".parse().unwrap(),
            ..RenderOptions::default()
        };
        let doc = render_document(&data, &options);
        assert_eq!(
            doc.headings(),
            vec!["Professional Summary", "Volunteering", "Interests"]
        );
    }

    #[test]
    fn test_long_resume_paginates_without_splitting_entries() {
        let mut data = make_name_and_summary();
        data.experience = (0..30)
            .map(|i| {
                ExperienceEntry::new(
                    format!("Company {i}"),
                    "Engineer",
                    "2010 - 2012",
                    format!("Result {i}-0\nResult {i}-1\nResult {i}-2"),
                )
            })
            .collect();
        data.projects = vec![ProjectEntry::new("Tail project", "Last")];

        let doc = render(&data, Theme::Light);
        assert!(doc.pages.len() > 1);
        for i in 0..30 {
            let title_pages = pages_with_text(&doc, &format!("Company {i}"));
            assert_eq!(title_pages.len(), 1);
            for j in 0..3 {
                assert_eq!(pages_with_text(&doc, &format!("Result {i}-{j}")), title_pages);
            }
        }
        // A heading is never the last thing on a page.
        for page in &doc.pages {
            let last = page.nodes.iter().rev().find_map(Node::as_text);
            assert!(last.map(|r| r.kind != TextKind::Heading).unwrap_or(true));
        }
    }

    #[test]
    fn test_blank_name_has_blank_title() {
        let doc = render(&ResumeData::empty(), Theme::Light);
        assert_eq!(doc.title, "");
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.text_runs().count(), 0);
    }
}
