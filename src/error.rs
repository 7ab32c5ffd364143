//! Error types for the pdf2problems library.
//!
//! Only conditions that make the whole split impossible are errors. Anything
//! that affects a single region is recovered inside the pipeline:
//!
//! * a region with no detectable content is returned uncropped,
//! * a region thinner than the minimum height is dropped,
//! * a document without numbered problems falls back to equal sections.
//!
//! Those outcomes are visible through [`crate::output::SplitStats`] rather
//! than through `Err`. An empty result is therefore *not* an error either:
//! callers decide how to report "no problems found".

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2problems library.
#[derive(Debug, Error)]
pub enum SplitError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file is neither a PDF nor a supported raster image.
    #[error("Unsupported file type: '{path}'\nFirst bytes: {magic:?}\nPlease supply a PDF or a PNG/JPEG image.")]
    UnsupportedFormat { path: PathBuf, magic: [u8; 4] },

    /// A raster image input could not be decoded.
    #[error("Failed to decode image '{path}': {detail}")]
    ImageDecodeFailed { path: PathBuf, detail: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Page selection matched no page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── Segmentation errors ───────────────────────────────────────────────
    /// No pages were supplied to the stitcher.
    #[error("Document has no pages to split")]
    EmptyDocument,

    /// The stitched canvas would not fit in a single image buffer.
    #[error("Stitched canvas too large: {width}x{height} px\nSelect fewer pages with --pages or lower --scale.")]
    CanvasTooLarge { width: u64, height: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output image or manifest.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PNG encoding of a cropped problem failed.
    #[error("Failed to encode '{label}' as PNG: {detail}")]
    EncodeFailed { label: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Place libpdfium next to the pdf2problems executable.\n\
  • Install pdfium system-wide so the dynamic loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_display() {
        let msg = SplitError::EmptyDocument.to_string();
        assert!(msg.contains("no pages"), "got: {msg}");
    }

    #[test]
    fn unsupported_format_display() {
        let e = SplitError::UnsupportedFormat {
            path: PathBuf::from("notes.txt"),
            magic: *b"hell",
        };
        let msg = e.to_string();
        assert!(msg.contains("notes.txt"));
        assert!(msg.contains("PDF"));
    }

    #[test]
    fn canvas_too_large_display() {
        let e = SplitError::CanvasTooLarge {
            width: 2000,
            height: 5_000_000_000,
        };
        assert!(e.to_string().contains("2000x5000000000"));
    }

    #[test]
    fn output_write_failed_keeps_source() {
        use std::error::Error as _;
        let e = SplitError::OutputWriteFailed {
            path: PathBuf::from("/out/001_problem_1.png"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(e.to_string().contains("disk full"));
        assert!(e.source().is_some());
    }
}
