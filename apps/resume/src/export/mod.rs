// Export boundary: the rendered document tree → PDF bytes + derived file name.
// The PDF is written from the same tree the preview shows. A failed export leaves the
// caller's ResumeData untouched and can simply be retried.

pub mod file_name;
pub mod pdf;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::errors::AppError;
use crate::layout::document::RenderedDocument;

pub use file_name::{export_file_name, suggested_file_name, today, PDF_EXTENSION};
pub use pdf::write_pdf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Writes the artifact into `dir` (created if missing) and returns the full path.
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf, AppError> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.bytes).await?;
        info!(path = %path.display(), bytes = self.bytes.len(), "Wrote export");
        Ok(path)
    }
}

/// Serializes `doc` and names it after `name` and `date`.
pub fn export_pdf(
    doc: &RenderedDocument,
    name: &str,
    date: NaiveDate,
) -> Result<ExportArtifact, AppError> {
    let bytes = write_pdf(doc)?;
    let file_name = export_file_name(name, date, PDF_EXTENSION);
    info!(
        file_name = %file_name,
        pages = doc.pages.len(),
        bytes = bytes.len(),
        "Exported resume PDF"
    );
    Ok(ExportArtifact { file_name, bytes })
}
