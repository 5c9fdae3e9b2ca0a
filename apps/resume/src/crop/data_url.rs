//! `data:` URLs, the embeddable image form stored in `profileImage`.

use base64::Engine;
use image::DynamicImage;

use crate::errors::AppError;

/// Decoded payload of a data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// `data:{mime};base64,{payload}`.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Parses a data URL with either a base64 or a percent-encoded payload.
pub fn decode_data_url(uri: &str) -> Result<DataUrl, AppError> {
    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| AppError::ImageDecode("Not a data URL".to_string()))?;

    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| AppError::ImageDecode("Invalid data URL: missing comma".to_string()))?;

    let mut params = metadata.split(';');
    let mime = params
        .next()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("text/plain")
        .to_lowercase();
    let is_base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| AppError::ImageDecode(format!("Failed to decode base64: {e}")))?
    } else {
        percent_decode(payload)?
    };

    Ok(DataUrl { mime, bytes })
}

/// Decodes a data URL whose payload is a raster image the `image` crate can read.
pub fn decode_image_data_url(uri: &str) -> Result<DynamicImage, AppError> {
    let payload = decode_data_url(uri)?;
    if !payload.mime.starts_with("image/") {
        return Err(AppError::ImageDecode(format!(
            "Expected an image data URL, got '{}'",
            payload.mime
        )));
    }
    image::load_from_memory(&payload.bytes)
        .map_err(|e| AppError::ImageDecode(format!("Failed to decode image: {e}")))
}

/// Small solid PNG as a data URL.
#[cfg(test)]
pub(crate) fn make_image_data_url(width: u32, height: u32) -> String {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]));
    let mut buf = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    encode_data_url("image/png", &buf.into_inner())
}

fn percent_decode(input: &str) -> Result<Vec<u8>, AppError> {
    let raw = input.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i] == b'%' {
            let byte = raw
                .get(i + 1..i + 3)
                .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| AppError::ImageDecode("Invalid percent-encoding".to_string()))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    Ok(out)
}
