//! Page rendering: turn the input document into [`RenderedPage`]s.
//!
//! PDFs are rasterised with pdfium and their text layer is read back as
//! positioned segments; raster images become a single page with no text.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and blocks for the whole render. Running it inside
//! `tokio::task::spawn_blocking` keeps the async workers free. Pages are
//! rendered one after another and each pdfium bitmap is converted and
//! released before the next page is touched.
//!
//! ## Coordinates
//!
//! pdfium reports text bounds in PDF points with a bottom-left origin. Each
//! segment is mapped into the rendered bitmap's pixel space with a top-left
//! origin, using the bottom of its bounds as the baseline, so text
//! geometry and pixels share one scale.

use crate::config::{PageSelection, SplitConfig};
use crate::error::SplitError;
use crate::page::{RenderedPage, TextFragment};
use crate::pipeline::input::{InputKind, ResolvedInput};
use crate::progress::ProgressCallback;
use image::ImageFormat;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Render every selected page of the resolved input.
pub async fn render_document(
    input: &ResolvedInput,
    config: &SplitConfig,
) -> Result<Vec<RenderedPage>, SplitError> {
    let path = input.path().to_path_buf();
    let progress = config.progress_callback.clone();

    match input.kind() {
        InputKind::Image(format) => tokio::task::spawn_blocking(move || {
            if let Some(ref cb) = progress {
                cb.on_split_start(1);
            }
            let page = load_image_blocking(&path, format)?;
            if let Some(ref cb) = progress {
                cb.on_page_rendered(1, 1);
            }
            Ok(vec![page])
        })
        .await
        .map_err(|e| SplitError::Internal(format!("Image load task panicked: {}", e)))?,
        InputKind::Pdf => {
            let options = PdfRenderOptions {
                scale: config.render_scale,
                max_pixels: config.max_rendered_pixels,
                password: config.password.clone(),
                pages: config.pages.clone(),
            };
            tokio::task::spawn_blocking(move || render_pdf_blocking(&path, &options, progress))
                .await
                .map_err(|e| SplitError::Internal(format!("Render task panicked: {}", e)))?
        }
    }
}

/// Owned copy of the render settings, movable into a blocking task.
struct PdfRenderOptions {
    scale: f32,
    max_pixels: u32,
    password: Option<String>,
    pages: PageSelection,
}

/// Bind to pdfium: `PDFIUM_LIB_PATH`, then next to the executable, then the
/// working directory, then the system library.
pub fn bind_pdfium() -> Result<Pdfium, SplitError> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(p) = std::env::var("PDFIUM_LIB_PATH") {
        if !p.is_empty() {
            candidates.push(PathBuf::from(p));
        }
    }
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(Pdfium::pdfium_platform_library_name_at_path(&dir));
    }
    candidates.push(Pdfium::pdfium_platform_library_name_at_path("./"));

    let mut last_err = String::from("no candidate library paths");
    for candidate in &candidates {
        match Pdfium::bind_to_library(candidate) {
            Ok(bindings) => {
                debug!("Bound pdfium from {}", candidate.display());
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => last_err = format!("{}: {:?}", candidate.display(), e),
        }
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| SplitError::PdfiumBindingFailed(format!("{last_err}; system library: {e:?}")))
}

fn render_pdf_blocking(
    pdf_path: &Path,
    options: &PdfRenderOptions,
    progress: Option<ProgressCallback>,
) -> Result<Vec<RenderedPage>, SplitError> {
    let pdfium = bind_pdfium()?;
    let password = options.password.as_deref();

    let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                SplitError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                SplitError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            SplitError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let indices = options.pages.to_indices(total_pages);
    if indices.is_empty() {
        return Err(SplitError::PageOutOfRange {
            page: 0,
            total: total_pages,
        });
    }
    if let Some(ref cb) = progress {
        cb.on_split_start(indices.len());
    }

    let max_px = options.max_pixels as i32;
    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(options.scale)
        .set_maximum_width(max_px)
        .set_maximum_height(max_px);

    let mut results = Vec::with_capacity(indices.len());

    for (pos, &idx) in indices.iter().enumerate() {
        let page = pages
            .get(idx as u16)
            .map_err(|e| SplitError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let raster = page
            .render_with_config(&render_config)
            .map_err(|e| SplitError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?
            .as_image()
            .into_rgba8();

        let page_w = page.width().value;
        let page_h = page.height().value;
        let scale_x = raster.width() as f32 / page_w.max(1.0);
        let scale_y = raster.height() as f32 / page_h.max(1.0);

        let fragments = match page.text() {
            Ok(text) => {
                let segments = text.segments();
                let fragments: Vec<TextFragment> = segments
                    .iter()
                    .filter_map(|segment| {
                        let bounds = segment.bounds();
                        segment_to_fragment(
                            &segment.text(),
                            PdfBox {
                                left: bounds.left().value,
                                bottom: bounds.bottom().value,
                                top: bounds.top().value,
                            },
                            page_h,
                            scale_x,
                            scale_y,
                        )
                    })
                    .collect();
                fragments
            }
            Err(e) => {
                warn!("Page {}: no text layer ({:?}); detection will skip it", idx + 1, e);
                Vec::new()
            }
        };

        debug!(
            "Rendered page {} → {}x{} px, {} text fragments",
            idx + 1,
            raster.width(),
            raster.height(),
            fragments.len()
        );

        results.push(RenderedPage::new(raster, fragments));

        if let Some(ref cb) = progress {
            cb.on_page_rendered(pos + 1, indices.len());
        }
    }

    Ok(results)
}

/// Text bounds in PDF points (bottom-left origin).
#[derive(Debug, Clone, Copy)]
struct PdfBox {
    left: f32,
    bottom: f32,
    top: f32,
}

/// Map a pdfium text segment into rendered pixel coordinates.
///
/// Blank segments carry no anchor information and are skipped.
fn segment_to_fragment(
    text: &str,
    bounds: PdfBox,
    page_height: f32,
    scale_x: f32,
    scale_y: f32,
) -> Option<TextFragment> {
    if text.trim().is_empty() {
        return None;
    }
    let height = (bounds.top - bounds.bottom).abs() * scale_y;
    Some(TextFragment::new(
        text,
        bounds.left * scale_x,
        (page_height - bounds.bottom) * scale_y,
        Some(height),
    ))
}

/// Decode with the sniffed format; downloaded and in-memory inputs have no
/// usable extension.
fn load_image_blocking(path: &Path, format: ImageFormat) -> Result<RenderedPage, SplitError> {
    let decode_err = |detail: String| SplitError::ImageDecodeFailed {
        path: path.to_path_buf(),
        detail,
    };
    let mut reader = image::ImageReader::open(path).map_err(|e| decode_err(e.to_string()))?;
    reader.set_format(format);
    let image = reader.decode().map_err(|e| decode_err(e.to_string()))?;
    let raster = image.into_rgba8();
    debug!("Loaded image {}x{} px", raster.width(), raster.height());
    Ok(RenderedPage::image_only(raster))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_maps_to_top_left_pixels() {
        // Letter page, 3x render: a 12pt line whose baseline sits 72pt from the top.
        let frag = segment_to_fragment(
            "1. Add",
            PdfBox {
                left: 72.0,
                bottom: 720.0,
                top: 732.0,
            },
            792.0,
            3.0,
            3.0,
        )
        .unwrap();
        assert_eq!(frag.text, "1. Add");
        assert_eq!(frag.x, 216.0);
        assert_eq!(frag.y, 216.0);
        assert_eq!(frag.height, Some(36.0));
    }

    #[test]
    fn blank_segments_are_skipped() {
        let b = PdfBox {
            left: 0.0,
            bottom: 0.0,
            top: 10.0,
        };
        assert!(segment_to_fragment("   ", b, 100.0, 1.0, 1.0).is_none());
    }

    #[tokio::test]
    async fn image_input_is_one_page_without_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        image::RgbaImage::from_pixel(30, 40, image::Rgba([255, 255, 255, 255]))
            .save(&path)
            .unwrap();
        let resolved = crate::pipeline::input::resolve_input(path.to_str().unwrap(), 5)
            .await
            .unwrap();
        let pages = render_document(&resolved, &SplitConfig::default())
            .await
            .unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].raster.dimensions(), (30, 40));
        assert!(pages[0].fragments.is_empty());
    }
}
