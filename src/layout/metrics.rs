//! Capacity estimation from page geometry and font size

use crate::config::LayoutOptions;
use crate::layout::font::FontScaling;
use crate::layout::page_config::PageConfig;
use serde::{Deserialize, Serialize};

/// Derived page capacity. Recomputed on demand, never cached across
/// configuration changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetrics {
    pub characters_per_line: usize,
    pub lines_per_page: usize,
    pub words_per_line: usize,
    pub total_capacity: usize,
}

impl ContentMetrics {
    /// Words that fit on one page under the 5+1 character word model
    pub fn words_per_page(&self) -> usize {
        self.words_per_line * self.lines_per_page
    }

    /// A page with no capacity holds nothing
    pub fn has_capacity(&self) -> bool {
        self.total_capacity > 0
    }
}

/// Map geometry and typography to capacity numbers.
///
/// Uses a fixed average glyph width (`font_size * char_width_ratio`) rather
/// than real glyph metrics. Degenerate geometry yields zeros, never NaN.
pub fn estimate(
    config: &PageConfig,
    scaling: &FontScaling,
    line_height: f32,
    options: &LayoutOptions,
) -> ContentMetrics {
    let font_size = scaling.current_font_size;
    let avg_char_width = font_size * options.char_width_ratio;
    let line_height_px = font_size * line_height;

    let characters_per_line = fit(config.content_width(), avg_char_width);
    let lines_per_page = fit(config.content_height(), line_height_px);
    let words_per_line = characters_per_line / options.chars_per_word.max(1) as usize;

    ContentMetrics {
        characters_per_line,
        lines_per_page,
        words_per_line,
        total_capacity: characters_per_line * lines_per_page,
    }
}

/// Tolerance so exact fits (864 / 19.2) survive f32 rounding
const FIT_EPSILON: f32 = 1e-4;

/// floor(extent / unit), clamped to zero for non-positive or non-finite input
fn fit(extent: f32, unit: f32) -> usize {
    if !(extent > 0.0 && unit > 0.0) {
        return 0;
    }
    let count = (extent / unit + FIT_EPSILON).floor();
    if count.is_finite() {
        count as usize
    } else {
        0
    }
}
