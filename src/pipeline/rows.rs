//! Row grouping: cluster text fragments into visual lines.
//!
//! Fragments are sorted by their canvas-absolute baseline and scanned once;
//! a new row starts whenever the gap to the *previous fragment* exceeds the
//! tolerance. Only the immediate predecessor is compared, so a row can
//! drift downward through a chain of small gaps.

use crate::page::TextFragment;

/// A fragment placed on the stitched canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct AbsoluteTextFragment {
    pub fragment: TextFragment,
    /// Index of the page (in render order) the fragment came from.
    pub page_index: usize,
    /// `page_offset + fragment.y`.
    pub absolute_y: f64,
}

impl AbsoluteTextFragment {
    pub fn new(fragment: TextFragment, page_index: usize, page_offset: u32) -> Self {
        let absolute_y = f64::from(page_offset) + f64::from(fragment.y);
        Self {
            fragment,
            page_index,
            absolute_y,
        }
    }
}

/// Fragments judged to share one visual line, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub fragments: Vec<AbsoluteTextFragment>,
}

impl Row {
    /// Fragment texts concatenated left to right, trimmed.
    pub fn line_text(&self) -> String {
        let joined: String = self
            .fragments
            .iter()
            .map(|f| f.fragment.text.as_str())
            .collect();
        joined.trim().to_string()
    }

    /// Highest glyph top in the row, substituting `default_height` for
    /// fragments without a height.
    pub fn top(&self, default_height: f32) -> f64 {
        self.fragments
            .iter()
            .map(|f| f.absolute_y - f64::from(f.fragment.effective_height(default_height)))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Convert page-local fragments to canvas coordinates.
///
/// `pages[i]` are the fragments of page `i`; `page_offsets[i]` its top edge.
pub fn absolutize(
    pages: Vec<Vec<TextFragment>>,
    page_offsets: &[u32],
) -> Vec<AbsoluteTextFragment> {
    pages
        .into_iter()
        .zip(page_offsets.iter())
        .enumerate()
        .flat_map(|(page_index, (fragments, &offset))| {
            fragments
                .into_iter()
                .map(move |f| AbsoluteTextFragment::new(f, page_index, offset))
        })
        .collect()
}

/// Group fragments into rows.
///
/// Every fragment lands in exactly one row. Rows come out in ascending
/// baseline order; fragments inside a row are ordered by `x`.
pub fn group_into_rows(mut fragments: Vec<AbsoluteTextFragment>, tolerance: f32) -> Vec<Row> {
    if fragments.is_empty() {
        return Vec::new();
    }

    fragments.sort_by(|a, b| a.absolute_y.total_cmp(&b.absolute_y));

    let mut rows = Vec::new();
    let mut current: Vec<AbsoluteTextFragment> = Vec::new();
    let tolerance = f64::from(tolerance);
    let mut prev_y = f64::NAN;

    for frag in fragments {
        if !current.is_empty() && (frag.absolute_y - prev_y).abs() > tolerance {
            rows.push(finish_row(std::mem::take(&mut current)));
        }
        prev_y = frag.absolute_y;
        current.push(frag);
    }
    rows.push(finish_row(current));

    rows
}

fn finish_row(mut fragments: Vec<AbsoluteTextFragment>) -> Row {
    fragments.sort_by(|a, b| a.fragment.x.total_cmp(&b.fragment.x));
    Row { fragments }
}
