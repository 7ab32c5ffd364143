//! Result types returned by the split entry points.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// One cropped problem (or section) image.
#[derive(Debug, Clone)]
pub struct ProblemImage {
    /// Position in the output list (0-based, boundary order).
    pub index: usize,
    /// `"Problem {n}"` for detected problems, `"Section {i}"` otherwise.
    pub label: String,
    /// The cropped raster.
    pub image: RgbaImage,
    /// False when the cropper found no content bounds and returned the slice as-is.
    pub cropped: bool,
}

impl ProblemImage {
    /// A lowercase, filesystem-safe stem such as `003_problem_12`.
    ///
    /// The index prefix keeps names unique when labels repeat.
    pub fn file_stem(&self) -> String {
        let slug: String = self
            .label
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{:03}_{}", self.index + 1, slug.trim_matches('_'))
    }

    /// Serialisable summary without pixel data.
    pub fn summary(&self) -> ProblemSummary {
        ProblemSummary {
            index: self.index,
            label: self.label.clone(),
            width: self.image.width(),
            height: self.image.height(),
            cropped: self.cropped,
            file: None,
        }
    }
}

/// Pixel-free description of a [`ProblemImage`], used for JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemSummary {
    pub index: usize,
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub cropped: bool,
    /// File name relative to the output directory, when written to disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Counters describing one split run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitStats {
    /// Pages that were rendered and stitched.
    pub pages: usize,
    /// Stitched canvas width in pixels.
    pub canvas_width: u32,
    /// Stitched canvas height in pixels.
    pub canvas_height: u32,
    /// Text rows found across all pages.
    pub rows: usize,
    /// Boundaries produced by detection or partitioning.
    pub boundaries: usize,
    /// Problem images returned.
    pub emitted: usize,
    /// Boundaries dropped for being thinner than the minimum height.
    pub dropped: usize,
    /// Regions returned uncropped because no content bounds were found.
    pub uncropped: usize,
    /// True when auto mode found no numbered problem and used equal sections.
    pub fell_back_to_manual: bool,
    pub render_duration_ms: u64,
    pub segment_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything produced by a split.
#[derive(Debug, Clone)]
pub struct SplitOutput {
    /// Problem images in boundary order.
    pub problems: Vec<ProblemImage>,
    pub stats: SplitStats,
}

impl SplitOutput {
    /// True when no region survived; callers should suggest manual mode.
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// Labels in output order.
    pub fn labels(&self) -> Vec<&str> {
        self.problems.iter().map(|p| p.label.as_str()).collect()
    }
}

/// The `manifest.json` written next to problem images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub source: String,
    pub problems: Vec<ProblemSummary>,
    pub stats: SplitStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn problem(index: usize, label: &str) -> ProblemImage {
        ProblemImage {
            index,
            label: label.to_string(),
            image: RgbaImage::from_pixel(4, 3, Rgba([255, 255, 255, 255])),
            cropped: true,
        }
    }

    #[test]
    fn file_stem_is_indexed_slug() {
        assert_eq!(problem(0, "Problem 12").file_stem(), "001_problem_12");
        assert_eq!(problem(9, "Section 3").file_stem(), "010_section_3");
    }

    #[test]
    fn duplicate_labels_get_distinct_stems() {
        let a = problem(0, "Problem 1").file_stem();
        let b = problem(1, "Problem 1").file_stem();
        assert_ne!(a, b);
    }

    #[test]
    fn summary_omits_missing_file() {
        let json = serde_json::to_string(&problem(0, "Problem 1").summary()).unwrap();
        assert!(json.contains("\"width\":4"));
        assert!(!json.contains("file"));
    }
}
