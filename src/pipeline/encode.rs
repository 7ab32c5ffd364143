//! Image encoding: cropped problem → PNG bytes.
//!
//! PNG is lossless, so thin strokes and small print survive exactly as
//! cropped; worksheet pages are mostly white and compress well anyway.

use crate::error::SplitError;
use crate::output::ProblemImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a problem image as PNG.
pub fn encode_png(problem: &ProblemImage) -> Result<Vec<u8>, SplitError> {
    let mut buf = Vec::new();
    problem
        .image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| SplitError::EncodeFailed {
            label: problem.label.clone(),
            detail: e.to_string(),
        })?;

    debug!("Encoded {} → {} bytes PNG", problem.label, buf.len());
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let problem = ProblemImage {
            index: 0,
            label: "Problem 1".into(),
            image: RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])),
            cropped: true,
        };
        let png = encode_png(&problem).expect("encode should succeed");
        assert_eq!(&png[..4], b"\x89PNG");
        let decoded = image::load_from_memory(&png).expect("valid png").to_rgba8();
        assert_eq!(decoded.dimensions(), (10, 10));
    }
}
