//! Region slicing: copy one boundary's rows out of the stitched canvas.

use crate::pipeline::boundary::Boundary;
use crate::pipeline::stitch::WHITE;
use image::{imageops, RgbaImage};

/// Pixel height a boundary will be sliced to: `max(1, round(span))`.
pub fn slice_height(boundary: &Boundary) -> u32 {
    let h = boundary.span().round();
    if h < 1.0 {
        1
    } else if h >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        h as u32
    }
}

/// Copy the full-width band of `canvas` covered by `boundary`.
///
/// Returns `None` when the band is thinner than `min_height` pixels. Rows
/// that fall past the bottom of the canvas (possible after rounding) are
/// left white.
pub fn slice_region(canvas: &RgbaImage, boundary: &Boundary, min_height: u32) -> Option<RgbaImage> {
    let height = slice_height(boundary);
    if height < min_height {
        return None;
    }

    let width = canvas.width();
    let top = boundary.start_y.round().max(0.0) as u32;
    let mut region = RgbaImage::from_pixel(width, height, WHITE);

    if top < canvas.height() {
        let visible = height.min(canvas.height() - top);
        let band = imageops::crop_imm(canvas, 0, top, width, visible).to_image();
        imageops::replace(&mut region, &band, 0, 0);
    }

    Some(region)
}
