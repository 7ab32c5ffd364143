//! Document segmentation: rendered pages in, labelled problem images out.
//!
//! All per-document state lives in a [`DocumentContext`] that is built once
//! from the rendered pages and then only read. Nothing is global, so
//! independent documents can be segmented in parallel, and the regions of
//! one document can be sliced and cropped in parallel against a shared
//! canvas.

use crate::config::{SplitConfig, SplitMode};
use crate::error::SplitError;
use crate::output::{ProblemImage, SplitOutput, SplitStats};
use crate::page::RenderedPage;
use crate::pipeline::boundary::{self, Boundary, BoundaryPlan};
use crate::pipeline::crop::{self, Cropped};
use crate::pipeline::rows::{self, Row};
use crate::pipeline::slice;
use crate::pipeline::stitch;
use image::RgbaImage;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Stitched canvas, page offsets and text rows for one document.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    canvas: Arc<RgbaImage>,
    page_offsets: Vec<u32>,
    rows: Vec<Row>,
}

impl DocumentContext {
    /// Stitch `pages` and group their text into rows.
    ///
    /// # Errors
    /// [`SplitError::EmptyDocument`] when `pages` is empty.
    pub fn from_pages(pages: Vec<RenderedPage>, row_tolerance: f32) -> Result<Self, SplitError> {
        let (rasters, texts): (Vec<_>, Vec<_>) =
            pages.into_iter().map(|p| (p.raster, p.fragments)).unzip();

        let stitched = stitch::stitch_pages(rasters)?;
        let fragments = rows::absolutize(texts, &stitched.page_offsets);
        let fragment_count = fragments.len();
        let rows = rows::group_into_rows(fragments, row_tolerance);

        info!(
            "Stitched {} pages into {}x{} canvas; {} fragments in {} rows",
            stitched.page_offsets.len(),
            stitched.width(),
            stitched.height(),
            fragment_count,
            rows.len()
        );

        Ok(Self {
            canvas: Arc::new(stitched.image),
            page_offsets: stitched.page_offsets,
            rows,
        })
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Shared handle for slicing on other threads.
    pub fn shared_canvas(&self) -> Arc<RgbaImage> {
        Arc::clone(&self.canvas)
    }

    pub fn page_offsets(&self) -> &[u32] {
        &self.page_offsets
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn total_height(&self) -> u32 {
        self.canvas.height()
    }

    /// Boundaries for `mode`.
    pub fn plan(&self, config: &SplitConfig) -> BoundaryPlan {
        let total = f64::from(self.total_height());
        match config.mode {
            SplitMode::Manual(n) => BoundaryPlan {
                boundaries: boundary::partition_uniform(total, n),
                fell_back: false,
            },
            SplitMode::Auto => boundary::detect_boundaries(
                &self.rows,
                total,
                &config.detection,
                config.fallback_sections,
            ),
        }
    }

    /// Base statistics before any region is processed.
    fn stats(&self, plan: &BoundaryPlan) -> SplitStats {
        SplitStats {
            pages: self.page_offsets.len(),
            canvas_width: self.canvas.width(),
            canvas_height: self.canvas.height(),
            rows: self.rows.len(),
            boundaries: plan.boundaries.len(),
            fell_back_to_manual: plan.fell_back,
            ..SplitStats::default()
        }
    }
}

/// Slice and crop one boundary. `None` when the band is too thin.
pub fn process_region(
    canvas: &RgbaImage,
    boundary: &Boundary,
    config: &SplitConfig,
) -> Option<Cropped> {
    let region = slice::slice_region(canvas, boundary, config.detection.min_region_height)?;
    Some(crop::crop_content(region, &config.crop))
}

/// Turn per-boundary outcomes (in boundary order) into numbered output.
pub(crate) fn assemble(
    boundaries: &[Boundary],
    outcomes: Vec<Option<Cropped>>,
    stats: &mut SplitStats,
) -> Vec<ProblemImage> {
    let mut problems = Vec::with_capacity(outcomes.len());

    for (boundary, outcome) in boundaries.iter().zip(outcomes) {
        match outcome {
            None => {
                debug!(
                    "Dropped {} ({:.1} px tall)",
                    boundary.label,
                    boundary.span()
                );
                stats.dropped += 1;
            }
            Some(cropped) => {
                let trimmed = cropped.is_trimmed();
                if !trimmed {
                    stats.uncropped += 1;
                }
                problems.push(ProblemImage {
                    index: problems.len(),
                    label: boundary.label.clone(),
                    image: cropped.into_image(),
                    cropped: trimmed,
                });
            }
        }
    }

    stats.emitted = problems.len();
    problems
}

/// Segment already-rendered pages on the calling thread.
///
/// This is the whole core pipeline with no I/O: stitch, group rows, find
/// boundaries, then slice and crop each region in boundary order.
///
/// # Errors
/// [`SplitError::EmptyDocument`] when `pages` is empty. An empty output is
/// not an error.
pub fn segment_pages(
    pages: Vec<RenderedPage>,
    config: &SplitConfig,
) -> Result<SplitOutput, SplitError> {
    let start = Instant::now();
    let ctx = DocumentContext::from_pages(pages, config.detection.row_tolerance)?;
    let plan = ctx.plan(config);
    let cb = config.progress_callback.as_ref();

    if let Some(cb) = cb {
        cb.on_boundaries_detected(plan.boundaries.len(), plan.fell_back);
    }

    let total = plan.boundaries.len();
    let outcomes: Vec<Option<Cropped>> = plan
        .boundaries
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let outcome = process_region(ctx.canvas(), b, config);
            if let Some(cb) = cb {
                cb.on_region_complete(i, total, &b.label, outcome.is_some());
            }
            outcome
        })
        .collect();

    let mut stats = ctx.stats(&plan);
    let problems = assemble(&plan.boundaries, outcomes, &mut stats);
    stats.segment_duration_ms = start.elapsed().as_millis() as u64;
    stats.total_duration_ms = stats.segment_duration_ms;

    if let Some(cb) = cb {
        cb.on_split_complete(problems.len());
    }

    Ok(SplitOutput { problems, stats })
}

/// Parallel form of the region loop used by the async entry points.
pub(crate) async fn segment_context(
    ctx: DocumentContext,
    config: &SplitConfig,
) -> Result<SplitOutput, SplitError> {
    use futures::stream::{self, StreamExt};

    let start = Instant::now();
    let plan = ctx.plan(config);
    let cb = config.progress_callback.clone();

    if let Some(ref cb) = cb {
        cb.on_boundaries_detected(plan.boundaries.len(), plan.fell_back);
    }

    let total = plan.boundaries.len();
    let results: Vec<Result<Option<Cropped>, SplitError>> =
        stream::iter(plan.boundaries.iter().cloned().enumerate().map(|(i, b)| {
            let canvas = ctx.shared_canvas();
            let config = config.clone();
            let cb = cb.clone();
            async move {
                tokio::task::spawn_blocking(move || {
                    let outcome = process_region(&canvas, &b, &config);
                    if let Some(ref cb) = cb {
                        cb.on_region_complete(i, total, &b.label, outcome.is_some());
                    }
                    outcome
                })
                .await
                .map_err(|e| SplitError::Internal(format!("Crop task panicked: {}", e)))
            }
        }))
        // `buffered` yields in submission order, keeping boundary order.
        // A zero limit would never poll anything.
        .buffered(config.concurrency.max(1))
        .collect()
        .await;

    let outcomes = results.into_iter().collect::<Result<Vec<_>, _>>()?;

    let mut stats = ctx.stats(&plan);
    let problems = assemble(&plan.boundaries, outcomes, &mut stats);
    stats.segment_duration_ms = start.elapsed().as_millis() as u64;

    if let Some(ref cb) = cb {
        cb.on_split_complete(problems.len());
    }

    Ok(SplitOutput { problems, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::TextFragment;
    use image::Rgba;

    fn page(h: u32, fragments: Vec<TextFragment>) -> RenderedPage {
        RenderedPage::new(
            RgbaImage::from_pixel(200, h, Rgba([255, 255, 255, 255])),
            fragments,
        )
    }

    #[test]
    fn empty_document_is_fatal() {
        let err = segment_pages(Vec::new(), &SplitConfig::default()).unwrap_err();
        assert!(matches!(err, SplitError::EmptyDocument));
    }

    #[test]
    fn text_on_later_pages_uses_page_offsets() {
        let ctx = DocumentContext::from_pages(
            vec![
                page(300, vec![]),
                page(300, vec![TextFragment::new("1. Add", 10.0, 100.0, None)]),
            ],
            4.0,
        )
        .unwrap();
        assert_eq!(ctx.page_offsets(), &[0, 300]);
        assert_eq!(ctx.rows().len(), 1);
        assert_eq!(ctx.rows()[0].fragments[0].absolute_y, 400.0);
        let plan = ctx.plan(&SplitConfig::default());
        assert_eq!(plan.boundaries[0].start_y, 360.0);
        assert_eq!(plan.boundaries[0].end_y, 600.0);
    }

    #[test]
    fn manual_mode_ignores_numbering() {
        let config = SplitConfig::builder()
            .mode(SplitMode::Manual(2))
            .build()
            .unwrap();
        let ctx = DocumentContext::from_pages(
            vec![page(400, vec![TextFragment::new("1. Add", 10.0, 100.0, None)])],
            4.0,
        )
        .unwrap();
        let plan = ctx.plan(&config);
        assert!(!plan.fell_back);
        let labels: Vec<_> = plan.boundaries.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Section 1", "Section 2"]);
    }

    #[test]
    fn blank_sections_come_back_uncropped() {
        let config = SplitConfig::builder()
            .mode(SplitMode::Manual(3))
            .build()
            .unwrap();
        let out = segment_pages(vec![page(300, vec![])], &config).unwrap();
        assert_eq!(out.problems.len(), 3);
        assert_eq!(out.stats.uncropped, 3);
        assert!(out.problems.iter().all(|p| !p.cropped));
        assert_eq!(out.problems[0].image.dimensions(), (200, 100));
    }

    #[tokio::test]
    async fn zero_concurrency_still_completes() {
        let config = SplitConfig {
            concurrency: 0,
            mode: SplitMode::Manual(2),
            ..SplitConfig::default()
        };
        let ctx = DocumentContext::from_pages(vec![page(200, vec![])], 4.0).unwrap();
        let out = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            segment_context(ctx, &config),
        )
        .await
        .expect("segmentation must not stall")
        .unwrap();
        assert_eq!(out.labels(), vec!["Section 1", "Section 2"]);
    }
}
