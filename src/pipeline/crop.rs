//! Content cropping: trim margins and squeeze tall blank gaps out of a region.
//!
//! ## Occupancy
//!
//! A pixel is non-white when any colour channel is below
//! [`CropParams::white_level`]. A row counts as content only when its
//! non-white pixel count exceeds `max(min_row_pixels, width × min_row_density)`,
//! which keeps speckle and stray page numbers from stretching the crop. A
//! column is content when it has a non-white pixel inside some content row.
//!
//! ## Compaction
//!
//! Between the first and last content rows, blank rows are kept until a run
//! of them exceeds [`CropParams::max_gap_rows`]; the rest of that run is
//! dropped. Every surviving gap is therefore at most `max_gap_rows` tall.
//!
//! ## Composition
//!
//! Kept rows are copied one scanline at a time onto a white raster with
//! [`CropParams::padding`] on every side, left-cropped to the content columns.

use crate::config::CropParams;
use crate::pipeline::stitch::WHITE;
use image::{imageops, Rgba, RgbaImage};
use tracing::debug;

/// Outcome of [`crop_content`].
#[derive(Debug, Clone)]
pub enum Cropped {
    /// Margins trimmed and gaps compacted.
    Trimmed(RgbaImage),
    /// No content bounds were found; the input is returned as-is.
    Degenerate(RgbaImage),
}

impl Cropped {
    pub fn into_image(self) -> RgbaImage {
        match self {
            Cropped::Trimmed(img) | Cropped::Degenerate(img) => img,
        }
    }

    pub fn is_trimmed(&self) -> bool {
        matches!(self, Cropped::Trimmed(_))
    }
}

/// Row and column occupancy of a raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Occupancy {
    pub rows: Vec<bool>,
    pub cols: Vec<bool>,
}

impl Occupancy {
    /// Scan `img` for content rows and columns.
    pub fn scan(img: &RgbaImage, params: &CropParams) -> Self {
        let (w, h) = img.dimensions();
        let threshold = f64::from(params.min_row_pixels)
            .max(f64::from(w) * f64::from(params.min_row_density));

        let rows: Vec<bool> = img
            .rows()
            .map(|row| {
                let count = row.filter(|&p| is_ink(p, params.white_level)).count();
                count as f64 > threshold
            })
            .collect();

        let mut cols = vec![false; w as usize];
        for (y, &content) in rows.iter().enumerate() {
            if !content {
                continue;
            }
            for (x, col) in cols.iter_mut().enumerate() {
                if !*col && is_ink(img.get_pixel(x as u32, y as u32), params.white_level) {
                    *col = true;
                }
            }
        }

        debug_assert_eq!(rows.len(), h as usize);
        Self { rows, cols }
    }

    /// Inclusive `(top, bottom, left, right)` content bounds.
    ///
    /// `None` when there is no content or it collapses to a single row or
    /// column.
    pub fn bounds(&self) -> Option<(usize, usize, usize, usize)> {
        let top = self.rows.iter().position(|&r| r)?;
        let bottom = self.rows.iter().rposition(|&r| r)?;
        let left = self.cols.iter().position(|&c| c)?;
        let right = self.cols.iter().rposition(|&c| c)?;
        if top >= bottom || left >= right {
            return None;
        }
        Some((top, bottom, left, right))
    }

    /// Rows of `top..=bottom` surviving gap compaction.
    pub fn compact_rows(&self, top: usize, bottom: usize, max_gap: usize) -> Vec<usize> {
        let mut kept = Vec::with_capacity(bottom + 1 - top);
        let mut gap = 0usize;
        for y in top..=bottom {
            if self.rows[y] {
                gap = 0;
            } else {
                gap += 1;
            }
            if gap <= max_gap {
                kept.push(y);
            }
        }
        kept
    }
}

fn is_ink(p: &Rgba<u8>, white_level: u8) -> bool {
    p[0] < white_level || p[1] < white_level || p[2] < white_level
}

/// Crop `region` to its content, collapsing blank gaps taller than the limit.
pub fn crop_content(region: RgbaImage, params: &CropParams) -> Cropped {
    let occupancy = Occupancy::scan(&region, params);

    let Some((top, bottom, left, right)) = occupancy.bounds() else {
        debug!(
            "No content bounds in {}x{} region; leaving uncropped",
            region.width(),
            region.height()
        );
        return Cropped::Degenerate(region);
    };

    let kept = occupancy.compact_rows(top, bottom, params.max_gap_rows);
    let content_width = (right - left + 1) as u32;
    let pad = params.padding;
    let mut out = RgbaImage::from_pixel(
        content_width + pad * 2,
        kept.len() as u32 + pad * 2,
        WHITE,
    );

    for (new_y, &old_y) in kept.iter().enumerate() {
        let line = imageops::crop_imm(&region, left as u32, old_y as u32, content_width, 1).to_image();
        imageops::replace(
            &mut out,
            &line,
            i64::from(pad),
            i64::from(pad) + new_y as i64,
        );
    }

    debug!(
        "Cropped {}x{} → {}x{} ({} of {} rows kept)",
        region.width(),
        region.height(),
        out.width(),
        out.height(),
        kept.len(),
        bottom + 1 - top
    );

    Cropped::Trimmed(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn blank(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, WHITE)
    }

    fn fill(img: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, BLACK);
            }
        }
    }

    #[test]
    fn all_white_region_is_returned_unmodified() {
        let region = blank(120, 80);
        match crop_content(region.clone(), &CropParams::default()) {
            Cropped::Degenerate(img) => assert_eq!(img, region),
            Cropped::Trimmed(_) => panic!("blank region must not be trimmed"),
        }
    }

    #[test]
    fn single_content_row_is_degenerate() {
        let mut region = blank(100, 50);
        fill(&mut region, 10, 20, 90, 21);
        assert!(!crop_content(region, &CropParams::default()).is_trimmed());
    }

    #[test]
    fn margins_are_trimmed_and_padded() {
        let mut region = blank(400, 300);
        fill(&mut region, 50, 100, 150, 140);
        let out = crop_content(region, &CropParams::default()).into_image();
        assert_eq!(out.dimensions(), (100 + 48, 40 + 48));
        assert_eq!(out.get_pixel(23, 23), &WHITE);
        assert_eq!(out.get_pixel(24, 24), &BLACK);
        assert_eq!(out.get_pixel(123, 63), &BLACK);
        assert_eq!(out.get_pixel(124, 64), &WHITE);
    }

    #[test]
    fn sparse_noise_rows_do_not_count() {
        // threshold for width 1000 is 15 pixels
        let mut region = blank(1000, 200);
        fill(&mut region, 100, 50, 200, 70);
        fill(&mut region, 900, 150, 910, 151);
        let occ = Occupancy::scan(&region, &CropParams::default());
        assert!(occ.rows[60]);
        assert!(!occ.rows[150]);
        // noise is outside every content row, so its columns are blank too
        assert!(!occ.cols[905]);
        let out = crop_content(region, &CropParams::default()).into_image();
        assert_eq!(out.dimensions(), (100 + 48, 20 + 48));
    }

    #[test]
    fn light_grey_is_background() {
        let mut region = RgbaImage::from_pixel(100, 100, Rgba([245, 241, 250, 255]));
        fill(&mut region, 0, 0, 1, 1);
        assert!(!crop_content(region, &CropParams::default()).is_trimmed());
    }

    #[test]
    fn large_gaps_are_collapsed_to_limit() {
        let mut region = blank(200, 400);
        fill(&mut region, 20, 10, 180, 30);
        fill(&mut region, 20, 230, 180, 250);
        // 200 blank rows between the blocks; only 60 survive
        let occ = Occupancy::scan(&region, &CropParams::default());
        let kept = occ.compact_rows(10, 249, 60);
        assert_eq!(kept.len(), 20 + 60 + 20);
        let out = crop_content(region, &CropParams::default()).into_image();
        assert_eq!(out.dimensions(), (160 + 48, 100 + 48));
        // second block follows the compacted gap directly
        assert_eq!(out.get_pixel(30, 24 + 80), &BLACK);
        assert_eq!(out.get_pixel(30, 24 + 79), &WHITE);
    }

    #[test]
    fn small_gaps_are_preserved() {
        let mut region = blank(200, 200);
        fill(&mut region, 20, 10, 180, 30);
        fill(&mut region, 20, 90, 180, 110);
        let out = crop_content(region, &CropParams::default()).into_image();
        assert_eq!(out.height(), 100 + 48);
    }

    #[test]
    fn cropping_is_idempotent_on_dimensions() {
        let mut region = blank(600, 500);
        fill(&mut region, 40, 30, 300, 60);
        fill(&mut region, 60, 200, 500, 220);
        fill(&mut region, 45, 400, 120, 430);
        let params = CropParams::default();
        let once = crop_content(region, &params).into_image();
        let twice = crop_content(once.clone(), &params).into_image();
        assert_eq!(once.dimensions(), twice.dimensions());
        assert_eq!(once, twice);
    }
}
