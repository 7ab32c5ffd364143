//! Input resolution: normalise a user-supplied path or URL to a local file
//! and work out whether it is a PDF or a raster image.
//!
//! ## Why download to a temp file?
//!
//! pdfium opens documents from a file-system path. Downloading to a
//! `TempDir` gives it one, and the directory is removed when
//! `ResolvedInput` is dropped. The file kind is decided from magic bytes,
//! never from the extension, so a mislabelled upload still gets a precise
//! error.

use crate::error::SplitError;
use image::ImageFormat;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// What kind of document the input holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    /// A single-page raster image with no text layer.
    Image(ImageFormat),
}

/// A local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local { path: PathBuf, kind: InputKind },
    /// Input was a URL; the document was downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until processing completes.
    Downloaded {
        path: PathBuf,
        kind: InputKind,
        _temp_dir: TempDir,
    },
}

impl ResolvedInput {
    /// Path to the document regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local { path, .. } => path,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }

    pub fn kind(&self) -> InputKind {
        match self {
            ResolvedInput::Local { kind, .. } | ResolvedInput::Downloaded { kind, .. } => *kind,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Classify a document from its leading bytes.
pub fn detect_kind(path: &Path, header: &[u8]) -> Result<InputKind, SplitError> {
    if header.starts_with(b"%PDF") {
        return Ok(InputKind::Pdf);
    }
    match image::guess_format(header) {
        Ok(format) if format.reading_enabled() => Ok(InputKind::Image(format)),
        _ => {
            let mut magic = [0u8; 4];
            let n = header.len().min(4);
            magic[..n].copy_from_slice(&header[..n]);
            Err(SplitError::UnsupportedFormat {
                path: path.to_path_buf(),
                magic,
            })
        }
    }
}

/// Resolve the input string to a local document.
///
/// URLs are downloaded to a temporary directory; local files are checked
/// for existence, readability and a supported format.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, SplitError> {
    if input.trim().is_empty() {
        return Err(SplitError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, SplitError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(SplitError::FileNotFound { path });
    }

    let mut header = Vec::with_capacity(32);
    match std::fs::File::open(&path) {
        Ok(f) => {
            f.take(32)
                .read_to_end(&mut header)
                .map_err(|e| SplitError::Internal(format!("Failed to read '{}': {e}", path.display())))?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SplitError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(SplitError::FileNotFound { path });
        }
    }

    let kind = detect_kind(&path, &header)?;
    debug!("Resolved local {:?}: {}", kind, path.display());
    Ok(ResolvedInput::Local { path, kind })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, SplitError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| SplitError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            SplitError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            SplitError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(SplitError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = extract_filename(url);

    let temp_dir = TempDir::new().map_err(|e| SplitError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| SplitError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let kind = detect_kind(&file_path, &bytes[..bytes.len().min(32)])?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| SplitError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {:?} to: {}", kind, file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        kind,
        _temp_dir: temp_dir,
    })
}

/// Last non-empty URL path segment that looks like a file name.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn detects_pdf_and_png() {
        let p = Path::new("x");
        assert_eq!(detect_kind(p, b"%PDF-1.7\n").unwrap(), InputKind::Pdf);
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert_eq!(
            detect_kind(p, png).unwrap(),
            InputKind::Image(ImageFormat::Png)
        );
    }

    #[test]
    fn rejects_unknown_bytes() {
        let err = detect_kind(Path::new("notes.txt"), b"hello world").unwrap_err();
        match err {
            SplitError::UnsupportedFormat { magic, .. } => assert_eq!(&magic, b"hell"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(detect_kind(Path::new("empty"), b"").is_err());
    }

    #[test]
    fn filename_from_url() {
        assert_eq!(extract_filename("https://x.org/hw/week3.pdf"), "week3.pdf");
        assert_eq!(extract_filename("https://x.org/download"), "downloaded");
    }

    #[tokio::test]
    async fn missing_local_file_is_reported() {
        let err = resolve_input("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, SplitError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn local_png_resolves_as_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 255, 255, 255]))
            .save(&path)
            .unwrap();
        let resolved = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(resolved.kind(), InputKind::Image(ImageFormat::Png));
        assert_eq!(resolved.path(), path.as_path());
    }
}
