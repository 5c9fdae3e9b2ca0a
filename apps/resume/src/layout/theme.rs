//! Light/dark theme selection. A theme changes colours only, never content or order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => f.write_str("light"),
            Theme::Dark => f.write_str("dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(AppError::Validation(format!(
                "Unknown theme '{other}' (expected 'light' or 'dark')"
            ))),
        }
    }
}

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn grey(v: u8) -> Self {
        Self { r: v, g: v, b: v }
    }

    /// Components scaled to 0.0–1.0, as PDF colour operators expect.
    pub fn unit_components(&self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Colours used by the document styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub background: Rgb,
    pub text: Rgb,
    /// Roles line, dates, durations, separators.
    pub muted: Rgb,
    /// Contact line and entry subtitles.
    pub contact: Rgb,
    /// Descriptions and paragraphs.
    pub body: Rgb,
    /// Section heading underline.
    pub rule: Rgb,
}

impl Theme {
    pub fn palette(&self) -> Palette {
        match self {
            Theme::Light => Palette {
                background: Rgb::grey(0xff),
                text: Rgb::grey(0x00),
                muted: Rgb::grey(0x66),
                contact: Rgb::grey(0x33),
                body: Rgb::grey(0x44),
                rule: Rgb::grey(0x00),
            },
            Theme::Dark => Palette {
                background: Rgb::grey(0x00),
                text: Rgb::grey(0xff),
                muted: Rgb::grey(0x99),
                contact: Rgb::grey(0xcc),
                body: Rgb::grey(0xbb),
                rule: Rgb::grey(0xff),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_from_str() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(" light ".parse::<Theme>().unwrap(), Theme::Light);
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn test_palettes_invert_background_and_text() {
        let light = Theme::Light.palette();
        let dark = Theme::Dark.palette();
        assert_eq!(light.background, dark.text);
        assert_eq!(light.text, dark.background);
        assert_eq!(light.muted.to_hex(), "#666666");
        assert_eq!(dark.muted.to_hex(), "#999999");
    }

    #[test]
    fn test_unit_components() {
        assert_eq!(Rgb::grey(0xff).unit_components(), [1.0, 1.0, 1.0]);
        assert_eq!(Rgb::new(0, 0, 0).unit_components(), [0.0, 0.0, 0.0]);
    }
}
