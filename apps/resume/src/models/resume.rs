//! Resume Data Model — the canonical in-memory representation of one resume.
//!
//! A `ResumeData` value is replaced wholesale on every edit; nothing in this crate
//! mutates a snapshot it was handed. Sequence order is display order.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Allocates a fresh opaque entry id. Ids are never reused after deletion.
pub fn new_entry_id() -> String {
    Uuid::new_v4().to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Section keys
// ────────────────────────────────────────────────────────────────────────────

/// The fixed, built-in sections. Custom sections are not keyed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKey {
    Summary,
    Experience,
    Education,
    Achievements,
    Projects,
    Skills,
    Languages,
}

impl SectionKey {
    pub const ALL: [SectionKey; 7] = [
        SectionKey::Summary,
        SectionKey::Experience,
        SectionKey::Education,
        SectionKey::Achievements,
        SectionKey::Projects,
        SectionKey::Skills,
        SectionKey::Languages,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKey::Summary => "summary",
            SectionKey::Experience => "experience",
            SectionKey::Education => "education",
            SectionKey::Achievements => "achievements",
            SectionKey::Projects => "projects",
            SectionKey::Skills => "skills",
            SectionKey::Languages => "languages",
        }
    }

    /// Heading used when `sectionTitles` has no usable override.
    pub fn default_title(&self) -> &'static str {
        match self {
            SectionKey::Summary => "Professional Summary",
            SectionKey::Experience => "Experience",
            SectionKey::Education => "Education",
            SectionKey::Achievements => "Achievements",
            SectionKey::Projects => "Key Projects",
            SectionKey::Skills => "Skills",
            SectionKey::Languages => "Languages",
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        SectionKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| AppError::Validation(format!("Unknown section key '{}'", s.trim())))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entries
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    pub id: String,
    pub title: String,
}

impl Role {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_entry_id(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    pub id: String,
    pub company: String,
    pub title: String,
    /// Older form versions stored the job title here; only shown when `title` is blank.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free display string, e.g. "June 2021 - Present".
    pub duration: String,
    /// Newline-delimited bullet source.
    pub description: String,
}

impl ExperienceEntry {
    pub fn new(
        company: impl Into<String>,
        title: impl Into<String>,
        duration: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: new_entry_id(),
            company: company.into(),
            title: title.into(),
            position: None,
            location: None,
            duration: duration.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub id: String,
    pub school: String,
    pub degree: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EducationEntry {
    pub fn new(
        school: impl Into<String>,
        degree: impl Into<String>,
        duration: impl Into<String>,
    ) -> Self {
        Self {
            id: new_entry_id(),
            school: school.into(),
            degree: degree.into(),
            field: None,
            location: None,
            duration: duration.into(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub technologies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl ProjectEntry {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: new_entry_id(),
            name: name.into(),
            description: description.into(),
            technologies: Vec::new(),
            link: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AchievementEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl AchievementEntry {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: new_entry_id(),
            title: title.into(),
            description: description.into(),
            date: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Custom sections
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomEntry {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CustomEntry {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_entry_id(),
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Payload of a user-defined section, discriminated on the wire by `type`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CustomSectionBody {
    /// The user created the section but has not picked a kind yet.
    #[default]
    Unset,
    Entries(Vec<CustomEntry>),
    Text(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCustomSection", into = "RawCustomSection")]
pub struct CustomSection {
    pub id: String,
    pub title: String,
    pub body: CustomSectionBody,
}

impl CustomSection {
    pub fn entries(title: impl Into<String>, entries: Vec<CustomEntry>) -> Self {
        Self {
            id: new_entry_id(),
            title: title.into(),
            body: CustomSectionBody::Entries(entries),
        }
    }

    pub fn text(title: impl Into<String>, content: Vec<String>) -> Self {
        Self {
            id: new_entry_id(),
            title: title.into(),
            body: CustomSectionBody::Text(content),
        }
    }
}

/// Wire shape of a custom section: a `type` tag plus optional payload arrays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawCustomSection {
    id: String,
    title: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    entries: Option<Vec<CustomEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<Vec<String>>,
}

impl From<RawCustomSection> for CustomSection {
    fn from(raw: RawCustomSection) -> Self {
        let body = match raw.kind.trim() {
            "entry" | "entries" => CustomSectionBody::Entries(raw.entries.unwrap_or_default()),
            "text" => CustomSectionBody::Text(raw.content.unwrap_or_default()),
            _ => CustomSectionBody::Unset,
        };
        Self {
            id: raw.id,
            title: raw.title,
            body,
        }
    }
}

impl From<CustomSection> for RawCustomSection {
    fn from(section: CustomSection) -> Self {
        let (kind, entries, content) = match section.body {
            CustomSectionBody::Unset => (String::new(), None, None),
            CustomSectionBody::Entries(entries) => ("entry".to_string(), Some(entries), None),
            CustomSectionBody::Text(content) => ("text".to_string(), None, Some(content)),
        };
        Self {
            id: section.id,
            title: section.title,
            kind,
            entries,
            content,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Root
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeData {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    /// Profile URL (LinkedIn or similar).
    #[serde(rename = "linkedin", alias = "link", skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Embedded raster image as a data URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    pub roles: Vec<Role>,
    pub summary: String,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub projects: Vec<ProjectEntry>,
    pub achievements: Vec<AchievementEntry>,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
    pub section_titles: BTreeMap<SectionKey, String>,
    pub visible_sections: BTreeMap<SectionKey, bool>,
    pub custom_sections: Vec<CustomSection>,
}

impl ResumeData {
    /// A blank session object.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Heading for a fixed section: the override when non-blank, the built-in default otherwise.
    pub fn title_for(&self, key: SectionKey) -> &str {
        self.section_titles
            .get(&key)
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| key.default_title())
    }

    /// Absent keys default to visible.
    pub fn is_visible(&self, key: SectionKey) -> bool {
        self.visible_sections.get(&key).copied().unwrap_or(true)
    }

    /// Copy-on-write replacement of the profile image.
    pub fn with_profile_image(self, image: Option<String>) -> Self {
        Self {
            profile_image: image,
            ..self
        }
    }

    /// Checks the id invariant on every repeatable sequence: ids are non-blank and
    /// unique within their own sequence. All problems are reported at once.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut problems = Vec::new();

        check_ids("roles", self.roles.iter().map(|e| e.id.as_str()), &mut problems);
        check_ids(
            "experience",
            self.experience.iter().map(|e| e.id.as_str()),
            &mut problems,
        );
        check_ids(
            "education",
            self.education.iter().map(|e| e.id.as_str()),
            &mut problems,
        );
        check_ids(
            "projects",
            self.projects.iter().map(|e| e.id.as_str()),
            &mut problems,
        );
        check_ids(
            "achievements",
            self.achievements.iter().map(|e| e.id.as_str()),
            &mut problems,
        );
        check_ids(
            "customSections",
            self.custom_sections.iter().map(|s| s.id.as_str()),
            &mut problems,
        );

        for section in &self.custom_sections {
            if let CustomSectionBody::Entries(entries) = &section.body {
                check_ids(
                    &format!("customSections[{}].entries", section.id),
                    entries.iter().map(|e| e.id.as_str()),
                    &mut problems,
                );
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(problems.join("; ")))
        }
    }
}

fn check_ids<'a>(sequence: &str, ids: impl Iterator<Item = &'a str>, problems: &mut Vec<String>) {
    let mut seen = HashSet::new();
    let mut duplicates = BTreeSet::new();
    let mut blanks = 0usize;

    for id in ids {
        if id.trim().is_empty() {
            blanks += 1;
        } else if !seen.insert(id) {
            duplicates.insert(id);
        }
    }

    if blanks > 0 {
        problems.push(format!("{sequence}: {blanks} entry(ies) without an id"));
    }
    if !duplicates.is_empty() {
        let list: Vec<&str> = duplicates.into_iter().collect();
        problems.push(format!("{sequence}: duplicate id(s) {}", list.join(", ")));
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
