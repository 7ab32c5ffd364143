//! Boundary detection: decide where one problem ends and the next begins.
//!
//! A problem starts at a row whose text begins with a top-level number
//! (`"12. Solve …"`). The cut is placed a fixed buffer above the tallest
//! glyph of that row. When no row matches, the canvas is divided into
//! equal sections instead.

use crate::config::DetectionParams;
use crate::pipeline::rows::Row;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

static RE_TOP_LEVEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([0-9]+)\.\s+\S").unwrap());

static RE_DIGITS_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[0-9]+\s*$").unwrap());

/// Half-open vertical interval `[start_y, end_y)` of the stitched canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub start_y: f64,
    pub end_y: f64,
    pub label: String,
}

impl Boundary {
    pub fn new(start_y: f64, end_y: f64, label: impl Into<String>) -> Self {
        Self {
            start_y,
            end_y,
            label: label.into(),
        }
    }

    pub fn span(&self) -> f64 {
        self.end_y - self.start_y
    }
}

/// A candidate problem start.
#[derive(Debug, Clone, PartialEq)]
pub struct Cut {
    pub y: f64,
    /// Digits as written in the document, e.g. `"7"` or `"07"`.
    pub number: String,
}

/// Boundaries plus how they were obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPlan {
    pub boundaries: Vec<Boundary>,
    /// True when auto detection found nothing and sections were used.
    pub fell_back: bool,
}

/// Find numbered-problem cuts in document order.
///
/// Rows made of a single all-digit fragment are skipped as page numbers.
pub fn find_cuts(rows: &[Row], params: &DetectionParams) -> Vec<Cut> {
    let mut cuts = Vec::new();

    for row in rows {
        let line = row.line_text();

        if row.len() == 1 && RE_DIGITS_ONLY.is_match(&line) {
            debug!("Skipping page-number row {:?}", line);
            continue;
        }

        let Some(caps) = RE_TOP_LEVEL.captures(&line) else {
            continue;
        };

        let top = row.top(params.default_fragment_height);
        let y = (top - f64::from(params.cut_buffer)).max(0.0);
        debug!("Problem {} starts at row top {:.1}, cut at {:.1}", &caps[1], top, y);

        cuts.push(Cut {
            y,
            number: caps[1].to_string(),
        });
    }

    cuts
}

/// Turn cuts into contiguous boundaries ending at `total_height`.
///
/// Numbers are passed through as written: duplicates and out-of-order
/// numbers are kept.
pub fn boundaries_from_cuts(cuts: &[Cut], total_height: f64) -> Vec<Boundary> {
    cuts.iter()
        .enumerate()
        .map(|(i, cut)| {
            let end_y = cuts.get(i + 1).map_or(total_height, |next| next.y);
            Boundary::new(cut.y, end_y, format!("Problem {}", cut.number))
        })
        .collect()
}

/// Divide `[0, total_height)` into `sections` equal intervals.
///
/// A section count of zero is treated as one.
pub fn partition_uniform(total_height: f64, sections: usize) -> Vec<Boundary> {
    let n = sections.max(1);
    let h = total_height / n as f64;
    (0..n)
        .map(|i| {
            Boundary::new(
                i as f64 * h,
                (i + 1) as f64 * h,
                format!("Section {}", i + 1),
            )
        })
        .collect()
}

/// Detect problem boundaries, falling back to `fallback_sections` equal sections.
pub fn detect_boundaries(
    rows: &[Row],
    total_height: f64,
    params: &DetectionParams,
    fallback_sections: usize,
) -> BoundaryPlan {
    let cuts = find_cuts(rows, params);

    if cuts.is_empty() {
        warn!(
            "No numbered problems found in {} rows; splitting into {} equal sections",
            rows.len(),
            fallback_sections
        );
        return BoundaryPlan {
            boundaries: partition_uniform(total_height, fallback_sections),
            fell_back: true,
        };
    }

    BoundaryPlan {
        boundaries: boundaries_from_cuts(&cuts, total_height),
        fell_back: false,
    }
}
