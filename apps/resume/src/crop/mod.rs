// Portrait crop pipeline: turns an uploaded image into a square JPEG data URL for
// `ResumeData::profile_image`. At most one session is open per cropper; cancelling or
// confirming tears it down, and the resume data is only ever replaced on success.

pub mod data_url;
pub mod geometry;
pub mod pipeline;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::resume::ResumeData;

pub use geometry::{CropRect, CropUnit, PixelRegion, Size};
pub use pipeline::CropSession;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropSettings {
    /// Smallest selection side, in display pixels.
    pub min_side: f32,
    /// JPEG quality, 1–100.
    pub jpeg_quality: u8,
    /// Bounds the image is scaled into for selection.
    pub max_display: Size,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self {
            min_side: 50.0,
            jpeg_quality: 90,
            max_display: Size::new(640.0, 400.0),
        }
    }
}

/// Owns the single in-flight crop session.
#[derive(Debug, Default)]
pub struct PortraitCropper {
    settings: CropSettings,
    session: Option<CropSession>,
}

impl PortraitCropper {
    pub fn new(settings: CropSettings) -> Self {
        Self {
            settings,
            session: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Opens a session for `upload`. Fails with `CropInProgress` while one is open.
    pub async fn begin(&mut self, upload: Bytes) -> Result<&mut CropSession, AppError> {
        if self.session.is_some() {
            return Err(AppError::CropInProgress);
        }
        let session = CropSession::open(upload, &self.settings).await?;
        Ok(self.session.insert(session))
    }

    pub fn session(&self) -> Option<&CropSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut CropSession> {
        self.session.as_mut()
    }

    pub fn can_confirm(&self) -> bool {
        self.session.as_ref().is_some_and(CropSession::can_confirm)
    }

    /// Renders the completed selection and returns `data` with the new portrait.
    ///
    /// `Ok(None)` when there is no session or no completed selection. On error the
    /// session stays open.
    pub async fn confirm(&mut self, data: &ResumeData) -> Result<Option<ResumeData>, AppError> {
        let Some(session) = self.session.as_ref() else {
            return Ok(None);
        };
        let Some(url) = session.render().await? else {
            return Ok(None);
        };

        self.session = None;
        info!(bytes = url.len(), "Portrait crop confirmed");
        Ok(Some(data.clone().with_profile_image(Some(url))))
    }

    /// Discards the session, if any. Returns whether one was open.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.session.take().is_some();
        if cancelled {
            info!("Portrait crop cancelled");
        }
        cancelled
    }
}
