use std::path::{Path, PathBuf};

use anyhow::anyhow;
use bytes::Bytes;
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::cli::{Command, CropSpec, PortraitArgs, RenderArgs};
use crate::config::Config;
use crate::crop::{CropRect, PortraitCropper};
use crate::errors::AppError;
use crate::export::{export_pdf, suggested_file_name, today};
use crate::layout::document::RenderedDocument;
use crate::layout::{render_document, RenderOptions};
use crate::models::resume::ResumeData;

pub async fn run(command: Command, config: &Config) -> Result<(), AppError> {
    match command {
        Command::Sample => {
            println!("{}", serde_json::to_string_pretty(&ResumeData::sample())?);
        }
        Command::Preview(args) => {
            let doc = preview(&args, config).await?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
            eprintln!(
                "pages: {}  fingerprint: {}  file: {}",
                doc.pages.len(),
                doc.fingerprint()?,
                suggested_file_name(&doc.author)
            );
        }
        Command::Export {
            render,
            out_dir,
            date,
        } => {
            let out_dir = out_dir.unwrap_or_else(|| config.output_dir.clone());
            let path = export(&render, &out_dir, date.unwrap_or_else(today), config).await?;
            println!("{}", path.display());
        }
        Command::Portrait(args) => {
            let updated = portrait(&args, config).await?;
            let json = serde_json::to_string_pretty(&updated)?;
            match &args.output {
                Some(path) => {
                    tokio::fs::write(path, json).await?;
                    info!(path = %path.display(), "Wrote updated resume");
                }
                None => println!("{json}"),
            }
        }
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Commands
// ────────────────────────────────────────────────────────────────────────────

pub async fn preview(args: &RenderArgs, config: &Config) -> Result<RenderedDocument, AppError> {
    let data = load_resume(args.input.as_deref()).await?;
    render_blocking(data, render_options(args, config)).await
}

/// Renders, serializes and writes the PDF; returns the written path.
pub async fn export(
    args: &RenderArgs,
    out_dir: &Path,
    date: NaiveDate,
    config: &Config,
) -> Result<PathBuf, AppError> {
    let data = load_resume(args.input.as_deref()).await?;
    let name = data.name.clone();
    let doc = render_blocking(data, render_options(args, config)).await?;

    let artifact = tokio::task::spawn_blocking(move || export_pdf(&doc, &name, date))
        .await
        .map_err(|e| AppError::Internal(anyhow!("Export task failed: {e}")))??;

    artifact.write_to(out_dir).await
}

/// Runs one crop session over the photo and returns the resume carrying the portrait.
pub async fn portrait(args: &PortraitArgs, config: &Config) -> Result<ResumeData, AppError> {
    let data = load_resume(args.input.as_deref()).await?;
    let upload = Bytes::from(tokio::fs::read(&args.photo).await?);

    let mut cropper = PortraitCropper::new(config.crop.clone());
    let session = cropper.begin(upload).await?;
    let selection = match args.crop {
        Some(CropSpec { x, y, side }) => session.complete(CropRect::square(x, y, side)),
        None => session.complete_selection(),
    };
    info!(?selection, "Crop selection");

    match cropper.confirm(&data).await {
        Ok(Some(updated)) => Ok(updated),
        Ok(None) => Err(AppError::Crop("No completed crop selection".to_string())),
        Err(e) => {
            warn!(code = e.code(), "Crop failed; discarding session");
            cropper.cancel();
            Err(e)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Reads and validates a ResumeData JSON file, or falls back to the sample profile.
pub async fn load_resume(input: Option<&Path>) -> Result<ResumeData, AppError> {
    let data = match input {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path).await?;
            serde_json::from_str::<ResumeData>(&raw)?
        }
        None => {
            info!("No input file; using the sample profile");
            ResumeData::sample()
        }
    };
    data.validate()?;
    Ok(data)
}

fn render_options(args: &RenderArgs, config: &Config) -> RenderOptions {
    RenderOptions {
        theme: args.theme.unwrap_or(config.theme),
        section_order: args
            .section_order
            .clone()
            .unwrap_or_else(|| config.section_order.clone()),
        ..RenderOptions::default()
    }
}

/// Layout is CPU-bound; keep it off the async executor.
async fn render_blocking(
    data: ResumeData,
    options: RenderOptions,
) -> Result<RenderedDocument, AppError> {
    tokio::task::spawn_blocking(move || render_document(&data, &options))
        .await
        .map_err(|e| AppError::Internal(anyhow!("Render task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::DynamicImage;

    use super::*;
    use crate::layout::Theme;
    use crate::models::resume::ExperienceEntry;

    fn make_config() -> Config {
        Config::from_lookup(|_| None).unwrap()
    }

    async fn make_input(dir: &Path, data: &ResumeData) -> PathBuf {
        let path = dir.join("resume.json");
        tokio::fs::write(&path, serde_json::to_string(data).unwrap())
            .await
            .unwrap();
        path
    }

    async fn make_photo(dir: &Path) -> PathBuf {
        let img = image::RgbImage::from_pixel(400, 300, image::Rgb([90, 60, 30]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        let path = dir.join("photo.png");
        tokio::fs::write(&path, buf.into_inner()).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_resume_defaults_to_sample() {
        let data = load_resume(None).await.unwrap();
        let sample = ResumeData::sample();
        assert_eq!(data.name, sample.name);
        assert_eq!(data.experience.len(), sample.experience.len());
    }

    #[tokio::test]
    async fn test_load_resume_rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = ResumeData::sample();
        let mut entry = ExperienceEntry::new("B", "Dev", "2020", "");
        entry.id = data.experience[0].id.clone();
        data.experience.push(entry);
        let input = make_input(dir.path(), &data).await;

        let err = load_resume(Some(&input)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_load_resume_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();
        assert!(matches!(
            load_resume(Some(&path)).await,
            Err(AppError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_preview_honours_flags_over_config() {
        let args = RenderArgs {
            input: None,
            theme: Some(Theme::Dark),
            section_order: Some("languages".parse().unwrap()),
        };
        let doc = preview(&args, &make_config()).await.unwrap();
        assert_eq!(doc.background, Theme::Dark.palette().background);
        assert_eq!(doc.headings().first(), Some(&"Languages"));
    }

    #[tokio::test]
    async fn test_export_writes_named_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let path = export(&RenderArgs::default(), dir.path(), date, &make_config())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("john-doe-resume-2024-01-15.pdf"));
        let bytes = tokio::fs::read(&path).await.unwrap();
        assert!(lopdf::Document::load_mem(&bytes).is_ok());
    }

    #[tokio::test]
    async fn test_portrait_then_export_embeds_image() {
        let dir = tempfile::tempdir().unwrap();
        let input = make_input(dir.path(), &ResumeData::sample()).await;
        let photo = make_photo(dir.path()).await;
        let output = dir.path().join("with-portrait.json");

        let args = PortraitArgs {
            input: Some(input),
            photo,
            crop: Some(CropSpec {
                x: 20.0,
                y: 20.0,
                side: 120.0,
            }),
            output: Some(output.clone()),
        };
        run(Command::Portrait(args), &make_config()).await.unwrap();

        let updated = load_resume(Some(&output)).await.unwrap();
        assert!(updated
            .profile_image
            .as_deref()
            .is_some_and(|url| url.starts_with("data:image/jpeg;base64,")));

        let render_args = RenderArgs {
            input: Some(output),
            ..RenderArgs::default()
        };
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let pdf = export(&render_args, dir.path(), date, &make_config())
            .await
            .unwrap();
        let doc = lopdf::Document::load_mem(&tokio::fs::read(&pdf).await.unwrap()).unwrap();
        assert!(doc.objects.values().any(|o| o
            .as_stream()
            .map(|s| s.dict.get(b"Subtype").and_then(|v| v.as_name()).ok() == Some(&b"Image"[..]))
            .unwrap_or(false)));
    }

    #[tokio::test]
    async fn test_portrait_with_unreadable_photo_fails() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("photo.png");
        tokio::fs::write(&photo, b"garbage").await.unwrap();
        let args = PortraitArgs {
            input: None,
            photo,
            crop: None,
            output: None,
        };
        assert!(matches!(
            portrait(&args, &make_config()).await,
            Err(AppError::ImageDecode(_))
        ));
    }
}
