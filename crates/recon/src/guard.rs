//! Title-drift guard.
//!
//! Some feed environments re-crawl and re-point publication ids, so the
//! record returned for an id can describe a different paper than the
//! repository item. When enabled, the guard compares titles and skips items
//! whose token overlap is too small to be the same work.

use crate::normalize::title_tokens;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleDrift {
    Consistent { overlap: usize, threshold: usize },
    Drifted { overlap: usize, threshold: usize },
}

impl TitleDrift {
    pub fn is_drifted(&self) -> bool {
        matches!(self, Self::Drifted { .. })
    }
}

/// Drifted iff `|A ∩ B| <= (|A| + |B|) / 4`.
///
/// `threshold` is reported floored; the comparison itself is exact.
pub fn check_title_drift(feed_title: &str, item_title: &str) -> TitleDrift {
    let a = title_tokens(feed_title);
    let b = title_tokens(item_title);
    let overlap = a.intersection(&b).count();
    let combined = a.len() + b.len();
    let threshold = combined / 4;

    if overlap * 4 <= combined {
        TitleDrift::Drifted { overlap, threshold }
    } else {
        TitleDrift::Consistent { overlap, threshold }
    }
}
