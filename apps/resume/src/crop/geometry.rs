//! Crop rectangle geometry: display space ↔ native image pixels.
//!
//! The selection is made on a scaled-down display copy of the image. Before
//! resampling it is mapped back to native pixels through the natural/display ratio.

use serde::{Deserialize, Serialize};

/// Share of the limiting dimension covered by the initial selection.
const INITIAL_FRACTION: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f32, height as f32)
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }

    /// Scales down (never up) so both sides fit within `bounds`.
    pub fn fit_within(&self, bounds: Size) -> Size {
        if self.width <= 0.0 || self.height <= 0.0 {
            return *self;
        }
        let scale = (bounds.width / self.width)
            .min(bounds.height / self.height)
            .min(1.0);
        Size::new(self.width * scale, self.height * scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropUnit {
    /// Coordinates are percentages of the displayed image's width/height.
    Percent,
    /// Coordinates are displayed-image pixels.
    Pixels,
}

/// A crop selection over the displayed image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub unit: CropUnit,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRect {
    pub fn pixels(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            unit: CropUnit::Pixels,
            x,
            y,
            width,
            height,
        }
    }

    pub fn percent(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            unit: CropUnit::Percent,
            x,
            y,
            width,
            height,
        }
    }

    /// Square selection in display pixels.
    pub fn square(x: f32, y: f32, side: f32) -> Self {
        Self::pixels(x, y, side, side)
    }

    pub fn to_pixels(&self, display: Size) -> CropRect {
        match self.unit {
            CropUnit::Pixels => *self,
            CropUnit::Percent => CropRect::pixels(
                self.x / 100.0 * display.width,
                self.y / 100.0 * display.height,
                self.width / 100.0 * display.width,
                self.height / 100.0 * display.height,
            ),
        }
    }
}

/// A square region of the source image, in native pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub side: u32,
}

/// Centered square covering 90% of the limiting dimension, in percent units.
pub fn initial_square(display: Size) -> CropRect {
    if display.width <= 0.0 || display.height <= 0.0 {
        return CropRect::percent(0.0, 0.0, 0.0, 0.0);
    }
    let side = display.min_side() * INITIAL_FRACTION;
    let width = side / display.width * 100.0;
    let height = side / display.height * 100.0;
    CropRect::percent((100.0 - width) / 2.0, (100.0 - height) / 2.0, width, height)
}

/// Forces a selection to a 1:1 square of at least `min_side` display pixels that lies
/// inside the displayed image. Returns pixel units.
///
/// When the image itself is smaller than `min_side`, the whole short side is used.
pub fn constrain_square(rect: CropRect, display: Size, min_side: f32) -> CropRect {
    let r = rect.to_pixels(display);
    let max_side = display.min_side().max(0.0);
    let min_side = min_side.min(max_side);

    let side = r.width.min(r.height).max(min_side).min(max_side);
    let x = r.x.clamp(0.0, (display.width - side).max(0.0));
    let y = r.y.clamp(0.0, (display.height - side).max(0.0));
    CropRect::square(x, y, side)
}

/// Maps a display-space selection onto native pixels.
///
/// The result is square, at least one pixel, and lies inside the image.
pub fn to_natural(rect: CropRect, display: Size, natural: (u32, u32)) -> PixelRegion {
    let (natural_w, natural_h) = natural;
    let r = rect.to_pixels(display);
    let scale_x = natural_w as f32 / display.width.max(f32::EPSILON);
    let scale_y = natural_h as f32 / display.height.max(f32::EPSILON);

    let side = (r.width * scale_x)
        .min(r.height * scale_y)
        .round()
        .max(1.0) as u32;
    let side = side.min(natural_w).min(natural_h).max(1);

    let x = ((r.x * scale_x).round().max(0.0) as u32).min(natural_w.saturating_sub(side));
    let y = ((r.y * scale_y).round().max(0.0) as u32).min(natural_h.saturating_sub(side));
    PixelRegion { x, y, side }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISPLAY: Size = Size::new(640.0, 400.0);

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_fit_within_scales_down_only() {
        let big = Size::new(1280.0, 800.0).fit_within(DISPLAY);
        assert!(close(big.width, 640.0) && close(big.height, 400.0));

        let tall = Size::new(300.0, 1200.0).fit_within(DISPLAY);
        assert!(close(tall.height, 400.0) && close(tall.width, 100.0));

        let small = Size::new(120.0, 90.0).fit_within(DISPLAY);
        assert_eq!(small, Size::new(120.0, 90.0));
    }

    #[test]
    fn test_initial_square_is_centered_ninety_percent() {
        let rect = initial_square(DISPLAY);
        assert_eq!(rect.unit, CropUnit::Percent);
        assert!(close(rect.height, 90.0));
        assert!(close(rect.width, 56.25));

        let px = rect.to_pixels(DISPLAY);
        assert!(close(px.width, 360.0) && close(px.height, 360.0));
        assert!(close(px.x, 140.0) && close(px.y, 20.0));
    }

    #[test]
    fn test_constrain_square_enforces_aspect_and_minimum() {
        let rect = constrain_square(CropRect::pixels(10.0, 10.0, 200.0, 120.0), DISPLAY, 50.0);
        assert_eq!(rect.unit, CropUnit::Pixels);
        assert!(close(rect.width, 120.0) && close(rect.height, 120.0));

        let tiny = constrain_square(CropRect::square(5.0, 5.0, 10.0), DISPLAY, 50.0);
        assert!(close(tiny.width, 50.0));
    }

    #[test]
    fn test_constrain_square_stays_inside_display() {
        let rect = constrain_square(CropRect::square(600.0, 380.0, 100.0), DISPLAY, 50.0);
        assert!(close(rect.x, 540.0) && close(rect.y, 300.0));

        let huge = constrain_square(CropRect::square(-20.0, -20.0, 1000.0), DISPLAY, 50.0);
        assert!(close(huge.width, 400.0));
        assert!(close(huge.x, 0.0) && close(huge.y, 0.0));
    }

    #[test]
    fn test_constrain_square_on_image_smaller_than_minimum() {
        let display = Size::new(40.0, 30.0);
        let rect = constrain_square(CropRect::square(0.0, 0.0, 10.0), display, 50.0);
        assert!(close(rect.width, 30.0));
    }

    #[test]
    fn test_to_natural_scales_by_ratio() {
        let region = to_natural(CropRect::square(10.0, 10.0, 100.0), DISPLAY, (1280, 800));
        assert_eq!(region, PixelRegion { x: 20, y: 20, side: 200 });
    }

    #[test]
    fn test_to_natural_clamps_to_image() {
        let region = to_natural(CropRect::square(600.0, 390.0, 100.0), DISPLAY, (640, 400));
        assert_eq!(region.side, 100);
        assert_eq!(region.x, 540);
        assert_eq!(region.y, 300);
    }

    #[test]
    fn test_natural_side_respects_scaled_minimum() {
        let natural = (3000_u32, 2000_u32);
        let display = Size::from_pixels(natural.0, natural.1).fit_within(DISPLAY);
        let ratio = natural.0 as f32 / display.width;

        for (x, y, side) in [(0.0, 0.0, 1.0), (100.0, 50.0, 49.0), (500.0, 300.0, 300.0)] {
            let rect = constrain_square(CropRect::square(x, y, side), display, 50.0);
            let region = to_natural(rect, display, natural);
            assert!(region.side >= (50.0 * ratio).round() as u32);
            assert!(region.x + region.side <= natural.0);
            assert!(region.y + region.side <= natural.1);
        }
    }
}
