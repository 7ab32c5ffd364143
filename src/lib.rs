//! # pdf2problems
//!
//! Split worksheet PDFs and scanned pages into one image per numbered
//! problem.
//!
//! ## Why this crate?
//!
//! Worksheets are laid out for printing: problems run across page breaks,
//! sit between headers and footers, and leave wide blank answer space.
//! This crate reads the PDF text layer to find lines that start a numbered
//! problem (`1.`, `2.`, …), cuts the rendered document at those lines and
//! trims each piece down to its ink, so every problem ends up as a compact
//! standalone image.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / image
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Render    rasterise pages + read text via pdfium (spawn_blocking)
//!  ├─ 3. Stitch    stack pages into one tall canvas
//!  ├─ 4. Rows      cluster text fragments into visual lines
//!  ├─ 5. Boundary  cut above each "N." line, or equal sections as fallback
//!  ├─ 6. Slice     copy each band, drop slivers under 30 px
//!  └─ 7. Crop      trim white margins, collapse tall blank gaps
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2problems::{split, SplitConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let output = split("worksheet.pdf", &SplitConfig::default()).await?;
//!     for problem in &output.problems {
//!         problem.image.save(format!("{}.png", problem.file_stem()))?;
//!     }
//!     if output.stats.fell_back_to_manual {
//!         eprintln!("no numbered problems found; split into equal sections");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2problems` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2problems = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirement
//!
//! PDF input needs the pdfium shared library. It is looked up through
//! `PDFIUM_LIB_PATH`, next to the executable, in the working directory and
//! finally on the system library path. Image input does not need pdfium.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod page;
pub mod pipeline;
pub mod progress;
pub mod segment;
pub mod split;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    CropParams, DetectionParams, PageSelection, SplitConfig, SplitConfigBuilder, SplitMode,
    DEFAULT_SECTIONS,
};
pub use error::SplitError;
pub use output::{Manifest, ProblemImage, ProblemSummary, SplitOutput, SplitStats};
pub use page::{RenderedPage, TextFragment};
pub use progress::{NoopProgressCallback, ProgressCallback, SplitProgressCallback};
pub use segment::{segment_pages, DocumentContext};
pub use split::{split, split_from_bytes, split_pages, split_sync, split_to_dir};
