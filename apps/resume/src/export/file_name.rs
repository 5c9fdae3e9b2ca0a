//! Export file naming. The only place the current date enters the system.

use chrono::{NaiveDate, Utc};

pub const PDF_EXTENSION: &str = "pdf";

/// `"John  Doe"` + 2024-01-15 + `"pdf"` → `"john-doe-resume-2024-01-15.pdf"`.
///
/// The name is lower-cased and whitespace runs collapse to single hyphens. A blank
/// name yields `"resume-2024-01-15.pdf"`.
pub fn export_file_name(name: &str, date: NaiveDate, ext: &str) -> String {
    let slug = name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    let date = date.format("%Y-%m-%d");
    let ext = ext.trim().trim_start_matches('.');

    if slug.is_empty() {
        format!("resume-{date}.{ext}")
    } else {
        format!("{slug}-resume-{date}.{ext}")
    }
}

/// Today's date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// PDF file name for today's UTC date.
pub fn suggested_file_name(name: &str) -> String {
    export_file_name(name, today(), PDF_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_john_doe() {
        assert_eq!(
            export_file_name("John Doe", make_date(), "pdf"),
            "john-doe-resume-2024-01-15.pdf"
        );
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        assert_eq!(
            export_file_name("  Mary \t Ann\n  Smith ", make_date(), "pdf"),
            "mary-ann-smith-resume-2024-01-15.pdf"
        );
    }

    #[test]
    fn test_blank_name() {
        assert_eq!(export_file_name("   ", make_date(), "pdf"), "resume-2024-01-15.pdf");
    }

    #[test]
    fn test_extension_with_leading_dot() {
        assert_eq!(
            export_file_name("Ada", make_date(), ".json"),
            "ada-resume-2024-01-15.json"
        );
    }

    #[test]
    fn test_suggested_name_uses_utc_date() {
        let before = Utc::now().date_naive();
        let name = suggested_file_name("Ada Lovelace");
        let after = Utc::now().date_naive();
        assert!(
            name == export_file_name("Ada Lovelace", before, PDF_EXTENSION)
                || name == export_file_name("Ada Lovelace", after, PDF_EXTENSION),
            "{name}"
        );
    }

    #[test]
    fn test_deterministic_for_fixed_date() {
        let a = export_file_name("Élodie Durand", make_date(), "pdf");
        let b = export_file_name("Élodie Durand", make_date(), "pdf");
        assert_eq!(a, b);
        assert_eq!(a, "élodie-durand-resume-2024-01-15.pdf");
    }

    #[test]
    fn test_suggested_name_uses_pdf_extension() {
        let name = suggested_file_name("John Doe");
        assert!(name.starts_with("john-doe-resume-"));
        assert!(name.ends_with(".pdf"));
        assert_eq!(name.len(), "john-doe-resume-2024-01-15.pdf".len());
    }
}
