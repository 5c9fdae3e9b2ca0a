use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::crop::CropSettings;
use crate::layout::{SectionOrder, Theme};

/// Configuration loaded from environment variables. Every variable has a default;
/// invalid values are reported at startup. Command-line flags override these.
#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub output_dir: PathBuf,
    pub section_order: SectionOrder,
    pub crop: CropSettings,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jpeg_quality: u8 = parse_var(&lookup, "CROP_JPEG_QUALITY", 90)?;
        if !(1..=100).contains(&jpeg_quality) {
            bail!("CROP_JPEG_QUALITY must be between 1 and 100, got {jpeg_quality}");
        }
        let min_side: f32 = parse_var(&lookup, "CROP_MIN_SIDE_PX", 50.0)?;
        if !min_side.is_finite() || min_side < 1.0 {
            bail!("CROP_MIN_SIDE_PX must be at least 1, got {min_side}");
        }

        Ok(Config {
            theme: parse_var(&lookup, "RESUME_THEME", Theme::Light)?,
            output_dir: lookup("RESUME_OUTPUT_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            section_order: parse_var(&lookup, "RESUME_SECTION_ORDER", SectionOrder::default())?,
            crop: CropSettings {
                min_side,
                jpeg_quality,
                ..CropSettings::default()
            },
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
