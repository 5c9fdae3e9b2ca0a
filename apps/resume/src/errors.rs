use thiserror::Error;

/// Application-level error type.
///
/// The renderer never produces one of these: malformed or missing optional data is
/// resolved by omission. Errors only arise where bytes enter or leave the system
/// (input JSON, uploaded images, exported files).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Crop error: {0}")]
    Crop(String),

    #[error("A crop session is already open for this upload")]
    CropInProgress,

    #[error("Export error: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code, used in log lines and CLI failure output.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            AppError::Crop(_) => "CROP_ERROR",
            AppError::CropInProgress => "CROP_IN_PROGRESS",
            AppError::Export(_) => "EXPORT_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Json(_) => "JSON_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True when retrying the same action can reasonably succeed
    /// (a failed export or crop render, as opposed to bad input).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Export(_) | AppError::Crop(_) | AppError::Io(_) | AppError::Internal(_)
        )
    }
}
