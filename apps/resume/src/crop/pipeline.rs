//! One crop session: decode → select → resample → encode → embed.
//!
//! Decoding and resampling are CPU-bound and run inside `spawn_blocking`. The
//! session owns its decoded image; dropping the session discards all crop state.

use std::io::Cursor;
use std::sync::Arc;

use anyhow::anyhow;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, GenericImageView, ImageEncoder};
use tracing::{debug, info};

use crate::crop::data_url::encode_data_url;
use crate::crop::geometry::{constrain_square, initial_square, to_natural, CropRect, PixelRegion, Size};
use crate::crop::CropSettings;
use crate::errors::AppError;

pub struct CropSession {
    source: Arc<DynamicImage>,
    natural: (u32, u32),
    display: Size,
    settings: CropSettings,
    selection: CropRect,
    completed: Option<CropRect>,
}

impl std::fmt::Debug for CropSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CropSession")
            .field("natural", &self.natural)
            .field("display", &self.display)
            .field("selection", &self.selection)
            .field("completed", &self.completed)
            .finish()
    }
}

impl CropSession {
    /// Decodes `upload` and seeds the selection with the centered initial square.
    ///
    /// An undecodable upload returns `AppError::ImageDecode` and no session exists.
    pub async fn open(upload: Bytes, settings: &CropSettings) -> Result<Self, AppError> {
        let upload_len = upload.len();
        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&upload))
            .await
            .map_err(|e| AppError::Internal(anyhow!("Image decode task failed: {e}")))?
            .map_err(|e| AppError::ImageDecode(format!("Failed to decode image: {e}")))?;

        let natural = image.dimensions();
        if natural.0 == 0 || natural.1 == 0 {
            return Err(AppError::ImageDecode("Image has no pixels".to_string()));
        }

        let display = Size::from_pixels(natural.0, natural.1).fit_within(settings.max_display);
        info!(
            bytes = upload_len,
            width = natural.0,
            height = natural.1,
            "Opened crop session"
        );

        Ok(Self {
            source: Arc::new(image),
            natural,
            display,
            settings: settings.clone(),
            selection: initial_square(display),
            completed: None,
        })
    }

    pub fn natural_size(&self) -> (u32, u32) {
        self.natural
    }

    /// Size the image is shown at while selecting.
    pub fn display_size(&self) -> Size {
        self.display
    }

    /// In-progress selection.
    pub fn selection(&self) -> CropRect {
        self.selection
    }

    pub fn completed(&self) -> Option<CropRect> {
        self.completed
    }

    pub fn update(&mut self, rect: CropRect) {
        self.selection = rect;
    }

    /// Records the completed selection (constrained to a valid square in display pixels).
    pub fn complete(&mut self, rect: CropRect) -> CropRect {
        let constrained = constrain_square(rect, self.display, self.settings.min_side);
        debug!(?constrained, "Crop selection completed");
        self.selection = constrained;
        self.completed = Some(constrained);
        constrained
    }

    /// Completes whatever is currently selected.
    pub fn complete_selection(&mut self) -> CropRect {
        self.complete(self.selection)
    }

    pub fn can_confirm(&self) -> bool {
        self.completed.is_some()
    }

    /// Native-pixel region the completed selection maps to.
    pub fn region(&self) -> Option<PixelRegion> {
        self.completed
            .map(|rect| to_natural(rect, self.display, self.natural))
    }

    /// Resamples the completed selection and returns it as a JPEG data URL.
    ///
    /// `Ok(None)` when nothing has been completed. The session is left intact either
    /// way, so a failure can be retried or cancelled.
    pub async fn render(&self) -> Result<Option<String>, AppError> {
        let Some(region) = self.region() else {
            return Ok(None);
        };

        let source = Arc::clone(&self.source);
        let quality = self.settings.jpeg_quality;
        let jpeg = tokio::task::spawn_blocking(move || resample_to_jpeg(&source, region, quality))
            .await
            .map_err(|e| AppError::Internal(anyhow!("Crop resample task failed: {e}")))??;

        debug!(side = region.side, bytes = jpeg.len(), "Portrait encoded");
        Ok(Some(encode_data_url("image/jpeg", &jpeg)))
    }
}

/// Cuts `region` out of `image` into a square RGB raster and encodes it as JPEG.
pub(crate) fn resample_to_jpeg(
    image: &DynamicImage,
    region: PixelRegion,
    quality: u8,
) -> Result<Vec<u8>, AppError> {
    let side = region.side;
    let cropped = image.crop_imm(region.x, region.y, side, side);
    let raster = if cropped.dimensions() == (side, side) {
        cropped.to_rgb8()
    } else {
        cropped.resize_exact(side, side, FilterType::Lanczos3).to_rgb8()
    };

    encode_jpeg(raster.as_raw(), side, side, quality)
        .map_err(|e| AppError::Crop(format!("JPEG encoding failed: {e}")))
}

pub(crate) fn encode_jpeg(
    rgb: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, quality).write_image(
        rgb,
        width,
        height,
        ExtendedColorType::Rgb8,
    )?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::data_url::decode_data_url;

    fn make_png(width: u32, height: u32) -> Bytes {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        Bytes::from(buf.into_inner())
    }

    fn decoded_dimensions(data_url: &str) -> (u32, u32) {
        let payload = decode_data_url(data_url).unwrap();
        assert_eq!(payload.mime, "image/jpeg");
        image::load_from_memory(&payload.bytes).unwrap().dimensions()
    }

    #[tokio::test]
    async fn test_open_rejects_garbage() {
        let result = CropSession::open(Bytes::from_static(b"not an image"), &CropSettings::default()).await;
        assert!(matches!(result, Err(AppError::ImageDecode(_))));
    }

    #[tokio::test]
    async fn test_open_fits_display_and_seeds_initial_square() {
        let session = CropSession::open(make_png(1280, 800), &CropSettings::default())
            .await
            .unwrap();
        assert_eq!(session.natural_size(), (1280, 800));
        assert_eq!(session.display_size(), Size::new(640.0, 400.0));
        assert_eq!(session.selection(), initial_square(session.display_size()));
        assert!(!session.can_confirm());
    }

    #[tokio::test]
    async fn test_render_without_completed_selection_is_none() {
        let mut session = CropSession::open(make_png(200, 100), &CropSettings::default())
            .await
            .unwrap();
        session.update(CropRect::square(0.0, 0.0, 80.0));
        assert!(session.render().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_render_produces_square_jpeg_at_native_resolution() {
        let mut session = CropSession::open(make_png(1280, 800), &CropSettings::default())
            .await
            .unwrap();
        session.complete(CropRect::pixels(10.0, 10.0, 150.0, 100.0));
        assert!(session.can_confirm());

        let url = session.render().await.unwrap().unwrap();
        // 100 display px at a 2x natural/display ratio.
        assert_eq!(decoded_dimensions(&url), (200, 200));
    }

    #[tokio::test]
    async fn test_initial_selection_renders_centered_square() {
        let mut session = CropSession::open(make_png(300, 200), &CropSettings::default())
            .await
            .unwrap();
        let rect = session.complete_selection();
        assert!((rect.width - 180.0).abs() < 1e-3);
        assert_eq!(session.region(), Some(PixelRegion { x: 60, y: 10, side: 180 }));

        let url = session.render().await.unwrap().unwrap();
        assert_eq!(decoded_dimensions(&url), (180, 180));
    }

    #[tokio::test]
    async fn test_minimum_side_scales_with_ratio() {
        let mut session = CropSession::open(make_png(2000, 1000), &CropSettings::default())
            .await
            .unwrap();
        // Display is 640x320, ratio 3.125; minimum 50 display px → 156 native px.
        session.complete(CropRect::square(0.0, 0.0, 5.0));
        let url = session.render().await.unwrap().unwrap();
        let (w, h) = decoded_dimensions(&url);
        assert_eq!(w, h);
        assert!(w >= (50.0_f32 * 3.125).round() as u32);
    }

    #[test]
    fn test_resample_clamps_region_to_image() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(40, 40));
        let jpeg = resample_to_jpeg(&img, PixelRegion { x: 0, y: 0, side: 40 }, 90).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }
}
