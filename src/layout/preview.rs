//! Cheap page-count estimate that skips tokenization

use crate::layout::metrics::ContentMetrics;
use crate::layout::tokenize::word_count;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewEstimate {
    pub word_count: usize,
    pub estimated_pages: usize,
    pub metrics: ContentMetrics,
}

/// ceil(words / words-per-page), never below one page
pub fn preview(content: &str, metrics: &ContentMetrics) -> PreviewEstimate {
    let words = word_count(content);
    let per_page = metrics.words_per_page();
    let estimated_pages = if per_page == 0 {
        // No capacity: one word per page
        words
    } else {
        words.div_ceil(per_page)
    };

    PreviewEstimate {
        word_count: words,
        estimated_pages: estimated_pages.max(1),
        metrics: *metrics,
    }
}
