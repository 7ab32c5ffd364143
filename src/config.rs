//! Configuration types for splitting a document into problem images.
//!
//! All split behaviour is controlled through [`SplitConfig`], built via its
//! [`SplitConfigBuilder`]. Every threshold the segmentation stages use lives
//! in [`DetectionParams`] or [`CropParams`] so a run can be reproduced or
//! tuned from one place.

use crate::error::SplitError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Section count used when manual mode gets no usable number.
pub const DEFAULT_SECTIONS: usize = 5;

/// Configuration for a split.
///
/// # Example
/// ```rust
/// use pdf2problems::{SplitConfig, SplitMode};
///
/// let config = SplitConfig::builder()
///     .mode(SplitMode::Manual(4))
///     .render_scale(2.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.mode, SplitMode::Manual(4));
/// ```
#[derive(Clone)]
pub struct SplitConfig {
    /// How boundaries are found. Default: [`SplitMode::Auto`].
    pub mode: SplitMode,

    /// Render scale applied to PDF points. Range: 0.5–8.0. Default: 3.0.
    ///
    /// Every pixel threshold in [`DetectionParams`] and [`CropParams`] is
    /// expressed in rendered pixels, so the defaults assume this scale.
    pub render_scale: f32,

    /// Maximum rendered width or height in pixels. Default: 6000.
    pub max_rendered_pixels: u32,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Number of regions sliced and cropped at once. Default: available cores.
    pub concurrency: usize,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Sections used when auto mode finds no numbered problem. Default: 5.
    pub fallback_sections: usize,

    /// Row grouping and boundary detection thresholds.
    pub detection: DetectionParams,

    /// Content cropping thresholds.
    pub crop: CropParams,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            mode: SplitMode::default(),
            render_scale: 3.0,
            max_rendered_pixels: 6000,
            pages: PageSelection::default(),
            password: None,
            concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            download_timeout_secs: 120,
            fallback_sections: DEFAULT_SECTIONS,
            detection: DetectionParams::default(),
            crop: CropParams::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SplitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitConfig")
            .field("mode", &self.mode)
            .field("render_scale", &self.render_scale)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("pages", &self.pages)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("concurrency", &self.concurrency)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("fallback_sections", &self.fallback_sections)
            .field("detection", &self.detection)
            .field("crop", &self.crop)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn SplitProgressCallback>"),
            )
            .finish()
    }
}

impl SplitConfig {
    /// Create a new builder for `SplitConfig`.
    pub fn builder() -> SplitConfigBuilder {
        SplitConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SplitConfig`].
#[derive(Debug)]
pub struct SplitConfigBuilder {
    config: SplitConfig,
}

impl SplitConfigBuilder {
    pub fn mode(mut self, mode: SplitMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale.clamp(0.5, 8.0);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn fallback_sections(mut self, n: usize) -> Self {
        self.config.fallback_sections = n;
        self
    }

    pub fn detection(mut self, params: DetectionParams) -> Self {
        self.config.detection = params;
        self
    }

    pub fn crop(mut self, params: CropParams) -> Self {
        self.config.crop = params;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SplitConfig, SplitError> {
        let c = &self.config;
        if !c.render_scale.is_finite() || c.render_scale <= 0.0 {
            return Err(SplitError::InvalidConfig(format!(
                "Render scale must be positive, got {}",
                c.render_scale
            )));
        }
        if let SplitMode::Manual(0) = c.mode {
            return Err(SplitError::InvalidConfig(
                "Manual mode needs at least 1 section".into(),
            ));
        }
        if c.fallback_sections == 0 {
            return Err(SplitError::InvalidConfig(
                "Fallback section count must be ≥ 1".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(SplitError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.detection.row_tolerance < 0.0 {
            return Err(SplitError::InvalidConfig(format!(
                "Row tolerance must be ≥ 0, got {}",
                c.detection.row_tolerance
            )));
        }
        if c.crop.min_row_density < 0.0 {
            return Err(SplitError::InvalidConfig(format!(
                "Row density must be ≥ 0, got {}",
                c.crop.min_row_density
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the stitched canvas is divided into regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitMode {
    /// Detect "N." numbered rows; fall back to equal sections when none match.
    #[default]
    Auto,
    /// Divide the canvas into this many equal-height sections.
    Manual(usize),
}

impl SplitMode {
    /// Manual mode from free-form user input.
    ///
    /// Anything that is not a positive integer yields
    /// [`DEFAULT_SECTIONS`] sections.
    pub fn manual_from_input(input: &str) -> Self {
        let n = input
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_SECTIONS);
        SplitMode::Manual(n)
    }
}

impl FromStr for SplitMode {
    type Err = SplitError;

    /// Accepts `auto`, `manual` and `manual:N`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.split_once(':') {
            None if s == "auto" => Ok(SplitMode::Auto),
            None if s == "manual" => Ok(SplitMode::Manual(DEFAULT_SECTIONS)),
            Some(("manual", n)) => Ok(SplitMode::manual_from_input(n)),
            _ => Err(SplitError::InvalidConfig(format!(
                "Unknown split mode '{s}' (expected auto, manual or manual:N)"
            ))),
        }
    }
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitMode::Auto => f.write_str("auto"),
            SplitMode::Manual(n) => write!(f, "manual:{n}"),
        }
    }
}

/// Thresholds for row grouping and numbered-problem detection.
///
/// All distances are in rendered pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Largest vertical gap between consecutive fragments of one row. Default: 4.
    pub row_tolerance: f32,
    /// Space left above the tallest glyph of a numbered row. Default: 20.
    pub cut_buffer: f32,
    /// Height assumed for fragments that report none. Default: 20.
    pub default_fragment_height: f32,
    /// Sliced regions shorter than this are dropped. Default: 30.
    pub min_region_height: u32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            row_tolerance: 4.0,
            cut_buffer: 20.0,
            default_fragment_height: 20.0,
            min_region_height: 30,
        }
    }
}

/// Thresholds for the content cropper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropParams {
    /// A channel below this value makes a pixel non-white. Default: 240.
    pub white_level: u8,
    /// Floor of the per-row non-white pixel threshold. Default: 5.
    pub min_row_pixels: f32,
    /// Per-row non-white threshold as a fraction of the width. Default: 0.015.
    pub min_row_density: f32,
    /// Longest run of blank rows kept inside a region. Default: 60.
    pub max_gap_rows: usize,
    /// White border added on every side. Default: 24.
    pub padding: u32,
}

impl Default for CropParams {
    fn default() -> Self {
        Self {
            white_level: 240,
            min_row_pixels: 5.0,
            min_row_density: 0.015,
            max_gap_rows: 60,
            padding: 24,
        }
    }
}

/// Specifies which pages of a PDF to split.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// All pages (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_input_defaults_to_five() {
        assert_eq!(SplitMode::manual_from_input("8"), SplitMode::Manual(8));
        assert_eq!(SplitMode::manual_from_input(" 3 "), SplitMode::Manual(3));
        assert_eq!(SplitMode::manual_from_input("abc"), SplitMode::Manual(5));
        assert_eq!(SplitMode::manual_from_input(""), SplitMode::Manual(5));
        assert_eq!(SplitMode::manual_from_input("0"), SplitMode::Manual(5));
        assert_eq!(SplitMode::manual_from_input("-2"), SplitMode::Manual(5));
    }

    #[test]
    fn mode_from_str() {
        assert_eq!("auto".parse::<SplitMode>().unwrap(), SplitMode::Auto);
        assert_eq!("Manual".parse::<SplitMode>().unwrap(), SplitMode::Manual(5));
        assert_eq!(
            "manual:12".parse::<SplitMode>().unwrap(),
            SplitMode::Manual(12)
        );
        assert!("columns".parse::<SplitMode>().is_err());
        assert_eq!(SplitMode::Manual(3).to_string(), "manual:3");
    }

    #[test]
    fn builder_clamps_and_validates() {
        let c = SplitConfig::builder()
            .render_scale(40.0)
            .concurrency(0)
            .build()
            .unwrap();
        assert_eq!(c.render_scale, 8.0);
        assert_eq!(c.concurrency, 1);

        let err = SplitConfig::builder()
            .mode(SplitMode::Manual(0))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("at least 1"));

        assert!(SplitConfig::builder().fallback_sections(0).build().is_err());
    }

    #[test]
    fn defaults_match_documented_thresholds() {
        let d = DetectionParams::default();
        assert_eq!(d.row_tolerance, 4.0);
        assert_eq!(d.cut_buffer, 20.0);
        assert_eq!(d.min_region_height, 30);
        let c = CropParams::default();
        assert_eq!(c.white_level, 240);
        assert_eq!(c.max_gap_rows, 60);
        assert_eq!(c.padding, 24);
    }

    #[test]
    fn debug_redacts_password() {
        let c = SplitConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(3), vec![0, 1, 2]);
        assert_eq!(PageSelection::Single(2).to_indices(3), vec![1]);
        assert_eq!(PageSelection::Single(4).to_indices(3), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 9).to_indices(3), vec![1, 2]);
        assert_eq!(
            PageSelection::Set(vec![3, 1, 3]).to_indices(3),
            vec![0, 2]
        );
    }
}
