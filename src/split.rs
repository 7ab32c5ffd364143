//! Document-level entry points.
//!
//! [`split`] runs the whole pipeline for a path or URL and keeps every
//! problem image in memory. [`split_to_dir`] does the same and then writes
//! one PNG per problem plus a `manifest.json`. For pages that were rendered
//! elsewhere, [`split_pages`] starts at the stitching step.

use crate::config::SplitConfig;
use crate::error::SplitError;
use crate::output::{Manifest, SplitOutput, SplitStats};
use crate::page::RenderedPage;
use crate::pipeline::{encode, input, render};
use crate::segment::{self, DocumentContext};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Split a PDF or image (local path or HTTP/HTTPS URL) into problem images.
///
/// # Returns
/// `Ok(SplitOutput)` whenever the document could be read, including when no
/// region survived (`output.is_empty()`).
///
/// # Errors
/// Fatal errors only: unreadable or unsupported input, a password problem,
/// an empty page selection, or a canvas too large to allocate.
pub async fn split(
    input_str: impl AsRef<str>,
    config: &SplitConfig,
) -> Result<SplitOutput, SplitError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting split: {} (mode {})", input_str, config.mode);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;

    // ── Step 2: Render pages and read text ───────────────────────────────
    let render_start = Instant::now();
    let pages = render::render_document(&resolved, config).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!("Rendered {} pages in {}ms", pages.len(), render_duration_ms);

    // ── Step 3..6: Stitch, detect, slice, crop ───────────────────────────
    let mut output = split_pages(pages, config).await?;

    output.stats.render_duration_ms = render_duration_ms;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    if output.is_empty() {
        warn!("No problem regions survived; manual mode may work better");
    }
    info!(
        "Split complete: {} problems ({} dropped, {} uncropped), {}ms total",
        output.stats.emitted,
        output.stats.dropped,
        output.stats.uncropped,
        output.stats.total_duration_ms
    );

    Ok(output)
}

/// Split pages that are already rendered.
///
/// Regions are sliced and cropped on the blocking pool, at most
/// `config.concurrency` at a time, and returned in boundary order.
pub async fn split_pages(
    pages: Vec<RenderedPage>,
    config: &SplitConfig,
) -> Result<SplitOutput, SplitError> {
    let start = Instant::now();
    let tolerance = config.detection.row_tolerance;

    // Stitching copies every page raster; keep it off the async workers.
    let ctx = tokio::task::spawn_blocking(move || DocumentContext::from_pages(pages, tolerance))
        .await
        .map_err(|e| SplitError::Internal(format!("Stitch task panicked: {}", e)))??;

    let mut output = segment::segment_context(ctx, config).await?;
    output.stats.segment_duration_ms = start.elapsed().as_millis() as u64;
    output.stats.total_duration_ms = output.stats.segment_duration_ms;
    Ok(output)
}

/// Synchronous wrapper around [`split`].
///
/// Creates a temporary tokio runtime internally.
pub fn split_sync(
    input_str: impl AsRef<str>,
    config: &SplitConfig,
) -> Result<SplitOutput, SplitError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SplitError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(split(input_str, config))
}

/// Split a document held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed when this
/// function returns.
///
/// # Example
/// ```rust,no_run
/// use pdf2problems::{split_from_bytes, SplitConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("worksheet.pdf")?;
/// let output = split_from_bytes(&bytes, &SplitConfig::default()).await?;
/// for p in &output.problems {
///     println!("{}: {}x{}", p.label, p.image.width(), p.image.height());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn split_from_bytes(
    bytes: &[u8],
    config: &SplitConfig,
) -> Result<SplitOutput, SplitError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| SplitError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| SplitError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `split` returns
    split(&path, config).await
}

/// Split a document and write `NNN_<label>.png` files plus `manifest.json`
/// into `output_dir`, creating it if needed.
///
/// Every file is written atomically (temp file + rename), so an interrupted
/// run never leaves a truncated PNG behind.
pub async fn split_to_dir(
    input_str: impl AsRef<str>,
    output_dir: impl AsRef<Path>,
    config: &SplitConfig,
) -> Result<SplitStats, SplitError> {
    let input_str = input_str.as_ref();
    let output = split(input_str, config).await?;
    let dir = output_dir.as_ref();

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| SplitError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let mut summaries = Vec::with_capacity(output.problems.len());
    for problem in &output.problems {
        let png = encode::encode_png(problem)?;
        let file_name = format!("{}.png", problem.file_stem());
        write_atomic(&dir.join(&file_name), &png).await?;
        debug!("Wrote {}", file_name);

        let mut summary = problem.summary();
        summary.file = Some(file_name);
        summaries.push(summary);
    }

    let manifest = Manifest {
        source: input_str.to_string(),
        problems: summaries,
        stats: output.stats.clone(),
    };
    let json = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| SplitError::Internal(format!("manifest serialisation: {e}")))?;
    write_atomic(&dir.join("manifest.json"), &json).await?;

    info!(
        "Wrote {} problem images to {}",
        output.problems.len(),
        dir.display()
    );
    Ok(output.stats)
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SplitError> {
    let tmp_path: PathBuf = {
        let mut name = path.as_os_str().to_owned();
        name.push(".tmp");
        name.into()
    };

    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| SplitError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| SplitError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SplitMode;
    use crate::page::TextFragment;
    use image::{Rgba, RgbaImage};

    fn worksheet() -> Vec<RenderedPage> {
        let mut raster = RgbaImage::from_pixel(300, 1000, Rgba([255, 255, 255, 255]));
        for y in [60u32, 70, 530, 540] {
            for x in 40..200 {
                raster.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        vec![RenderedPage::new(
            raster,
            vec![
                TextFragment::new("1. Solve", 10.0, 50.0, None),
                TextFragment::new("2. Graph", 10.0, 520.0, None),
            ],
        )]
    }

    #[tokio::test]
    async fn parallel_and_sequential_paths_agree() {
        let config = SplitConfig::builder().concurrency(3).build().unwrap();
        let parallel = split_pages(worksheet(), &config).await.unwrap();
        let sequential = segment::segment_pages(worksheet(), &config).unwrap();

        assert_eq!(parallel.labels(), sequential.labels());
        assert_eq!(parallel.labels(), vec!["Problem 1", "Problem 2"]);
        for (a, b) in parallel.problems.iter().zip(&sequential.problems) {
            assert_eq!(a.image, b.image);
        }
    }

    #[tokio::test]
    async fn png_input_writes_sections_and_manifest() {
        let src = tempfile::tempdir().unwrap();
        let input = src.path().join("scan.png");
        let mut img = RgbaImage::from_pixel(120, 400, Rgba([255, 255, 255, 255]));
        for y in 0..400 {
            img.put_pixel(60, y, Rgba([0, 0, 0, 255]));
        }
        img.save(&input).unwrap();

        let out = tempfile::tempdir().unwrap();
        let config = SplitConfig::builder()
            .mode(SplitMode::Manual(2))
            .build()
            .unwrap();
        let stats = split_to_dir(input.to_str().unwrap(), out.path(), &config)
            .await
            .unwrap();

        assert_eq!(stats.emitted, 2);
        assert!(out.path().join("001_section_1.png").exists());
        assert!(out.path().join("002_section_2.png").exists());

        let manifest: Manifest =
            serde_json::from_slice(&std::fs::read(out.path().join("manifest.json")).unwrap())
                .unwrap();
        assert_eq!(manifest.problems.len(), 2);
        assert_eq!(manifest.problems[1].file.as_deref(), Some("002_section_2.png"));
        assert!(!out.path().join("manifest.json.tmp").exists());
    }
}
