//! Page stitching: stack page rasters into one tall canvas.
//!
//! Detection and slicing both work in the coordinate space of this canvas,
//! which is what lets a problem continue across a page break. Pages are
//! consumed one at a time so each page buffer is freed as soon as it has
//! been copied.

use crate::error::SplitError;
use image::{imageops, Rgba, RgbaImage};
use tracing::debug;

/// Background for canvas area not covered by a page.
pub(crate) const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// All pages stacked top to bottom.
#[derive(Debug, Clone)]
pub struct StitchedCanvas {
    pub image: RgbaImage,
    /// Top edge of page `i` in canvas coordinates.
    pub page_offsets: Vec<u32>,
}

impl StitchedCanvas {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Stack `pages` vertically, left-aligned, onto a white canvas.
///
/// Canvas width is the widest page; height is the sum of page heights.
///
/// # Errors
/// [`SplitError::EmptyDocument`] when `pages` is empty and
/// [`SplitError::CanvasTooLarge`] when the summed height overflows `u32`.
pub fn stitch_pages(pages: Vec<RgbaImage>) -> Result<StitchedCanvas, SplitError> {
    if pages.is_empty() {
        return Err(SplitError::EmptyDocument);
    }

    let width = pages.iter().map(|p| p.width()).max().unwrap_or(0);
    let total: u64 = pages.iter().map(|p| u64::from(p.height())).sum();
    let height = u32::try_from(total).map_err(|_| SplitError::CanvasTooLarge {
        width: u64::from(width),
        height: total,
    })?;
    let bytes = u64::from(width)
        .checked_mul(total)
        .and_then(|px| px.checked_mul(4));
    if bytes.is_none_or(|b| b > isize::MAX as u64) {
        return Err(SplitError::CanvasTooLarge {
            width: u64::from(width),
            height: total,
        });
    }

    let mut canvas = RgbaImage::from_pixel(width, height, WHITE);
    let mut page_offsets = Vec::with_capacity(pages.len());
    let mut y: u32 = 0;

    for (i, page) in pages.into_iter().enumerate() {
        debug!(
            "Stitching page {} ({}x{}) at y={}",
            i + 1,
            page.width(),
            page.height(),
            y
        );
        imageops::replace(&mut canvas, &page, 0, i64::from(y));
        page_offsets.push(y);
        y += page.height();
    }

    Ok(StitchedCanvas {
        image: canvas,
        page_offsets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, v: u8) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([v, v, v, 255]))
    }

    #[test]
    fn empty_input_is_empty_document() {
        assert!(matches!(
            stitch_pages(Vec::new()),
            Err(SplitError::EmptyDocument)
        ));
    }

    #[test]
    fn offsets_are_cumulative_heights() {
        let canvas = stitch_pages(vec![solid(10, 30, 0), solid(10, 50, 0), solid(10, 20, 0)])
            .unwrap();
        assert_eq!(canvas.page_offsets, vec![0, 30, 80]);
        assert_eq!(canvas.height(), 100);
        assert_eq!(canvas.width(), 10);
    }

    #[test]
    fn narrow_pages_are_left_aligned_on_white() {
        let canvas = stitch_pages(vec![solid(20, 5, 10), solid(8, 5, 50)]).unwrap();
        assert_eq!(canvas.width(), 20);
        // second page copied at x=0
        assert_eq!(canvas.image.get_pixel(0, 5), &Rgba([50, 50, 50, 255]));
        assert_eq!(canvas.image.get_pixel(7, 9), &Rgba([50, 50, 50, 255]));
        // area right of the narrow page stays white
        assert_eq!(canvas.image.get_pixel(8, 5), &WHITE);
        assert_eq!(canvas.image.get_pixel(19, 9), &WHITE);
        // first page untouched
        assert_eq!(canvas.image.get_pixel(19, 4), &Rgba([10, 10, 10, 255]));
    }
}
