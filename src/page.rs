//! Per-page input produced by a renderer.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// A positioned run of text on one page.
///
/// Coordinates are in rendered pixels with the origin at the top-left of
/// the page. `y` is the text baseline, so the glyphs occupy roughly
/// `y - height ..= y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Glyph height; `None` (or a non-positive value) when the source did not report one.
    pub height: Option<f32>,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, x: f32, y: f32, height: Option<f32>) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            height,
        }
    }

    /// Height to use for geometry, substituting `default` when unknown.
    pub fn effective_height(&self, default: f32) -> f32 {
        match self.height {
            Some(h) if h.is_finite() && h > 0.0 => h,
            _ => default,
        }
    }
}

/// One rendered page: its raster and the text found on it.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub raster: RgbaImage,
    pub fragments: Vec<TextFragment>,
}

impl RenderedPage {
    pub fn new(raster: RgbaImage, fragments: Vec<TextFragment>) -> Self {
        Self { raster, fragments }
    }

    /// A page with no text layer, e.g. a photographed worksheet.
    pub fn image_only(raster: RgbaImage) -> Self {
        Self::new(raster, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_and_zero_heights_use_default() {
        assert_eq!(TextFragment::new("a", 0.0, 0.0, None).effective_height(20.0), 20.0);
        assert_eq!(TextFragment::new("a", 0.0, 0.0, Some(0.0)).effective_height(20.0), 20.0);
        assert_eq!(TextFragment::new("a", 0.0, 0.0, Some(f32::NAN)).effective_height(20.0), 20.0);
        assert_eq!(TextFragment::new("a", 0.0, 0.0, Some(12.5)).effective_height(20.0), 12.5);
    }
}
