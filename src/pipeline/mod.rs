//! Pipeline stages for splitting a document into problem images.
//!
//! Each submodule implements exactly one transformation step, so each can
//! be tested on synthetic rasters without pdfium.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ stitch ──▶ rows ──▶ boundary ──▶ slice ──▶ crop ──▶ encode
//! (path/URL) (pdfium)   (canvas)   (lines)  (cuts)       (bands)   (trim)   (PNG)
//! ```
//!
//! 1. [`input`]: canonicalise the path or URL and detect PDF vs image
//! 2. [`render`]: rasterise selected pages and read their text layer;
//!    runs in `spawn_blocking` because pdfium is not async-safe
//! 3. [`stitch`]: stack page rasters into one canvas, recording offsets
//! 4. [`rows`]: cluster canvas-absolute text fragments into lines
//! 5. [`boundary`]: numbered-problem cuts, or equal sections as fallback
//! 6. [`slice`]: copy each boundary's band, dropping slivers
//! 7. [`crop`]: trim margins and collapse tall blank gaps
//! 8. [`encode`]: PNG-encode results for writing to disk

pub mod boundary;
pub mod crop;
pub mod encode;
pub mod input;
pub mod render;
pub mod rows;
pub mod slice;
pub mod stitch;
