// Command-line front end: stands in for the editing form and the preview pane.

pub mod handlers;

use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::errors::AppError;
use crate::layout::{SectionOrder, Theme};

#[derive(Parser, Debug)]
#[command(name = "resume")]
#[command(version, about = "Render resume data into a paginated A4 document and PDF")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the built-in sample profile as JSON
    Sample,

    /// Render and print the document tree as JSON
    Preview(RenderArgs),

    /// Render and write the PDF under its derived file name
    Export {
        #[command(flatten)]
        render: RenderArgs,

        /// Output directory (defaults to RESUME_OUTPUT_DIR)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Date used in the file name, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Crop a photo into a square portrait and store it on the resume
    Portrait(PortraitArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// ResumeData JSON file (defaults to the sample profile)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// light or dark (defaults to RESUME_THEME)
    #[arg(long)]
    pub theme: Option<Theme>,

    /// Comma-separated section keys, e.g. "summary,experience,skills"
    #[arg(long)]
    pub section_order: Option<SectionOrder>,
}

#[derive(Args, Debug, Clone)]
pub struct PortraitArgs {
    /// ResumeData JSON file (defaults to the sample profile)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Image file to crop (PNG or JPEG)
    #[arg(long)]
    pub photo: PathBuf,

    /// Square selection in display pixels as X,Y,SIDE (defaults to the centered square)
    #[arg(long)]
    pub crop: Option<CropSpec>,

    /// Where to write the updated ResumeData JSON (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// `X,Y,SIDE` in display pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSpec {
    pub x: f32,
    pub y: f32,
    pub side: f32,
}

impl FromStr for CropSpec {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::Validation(format!("Invalid crop '{s}': expected X,Y,SIDE"));
        let values = s
            .split(',')
            .map(|v| v.trim().parse::<f32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        match values.as_slice() {
            [x, y, side] if values.iter().all(|v| v.is_finite()) && *side > 0.0 => Ok(CropSpec {
                x: *x,
                y: *y,
                side: *side,
            }),
            _ => Err(invalid()),
        }
    }
}
