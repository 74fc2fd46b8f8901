//! Tunables for layout estimation and live flow

use crate::layout::PageSize;
use serde::{Deserialize, Serialize};

/// Options consumed by the metrics estimator and the reflow coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutOptions {
    /// Font size used on the base (letter) page
    pub base_font_size: f32,
    /// Line height as a multiple of font size
    pub line_height: f32,
    /// Average glyph width as a fraction of font size
    pub char_width_ratio: f32,
    /// Characters per word including the trailing space
    pub chars_per_word: u32,
    /// Page size used when a session is opened without one
    pub default_page_size: PageSize,
    /// Smallest accepted explicit font size
    pub min_font_size: f32,
    /// Largest accepted explicit font size
    pub max_font_size: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            base_font_size: 12.0,
            line_height: 1.6,
            char_width_ratio: 0.6,
            chars_per_word: 6,
            default_page_size: PageSize::Letter,
            min_font_size: 6.0,
            max_font_size: 72.0,
        }
    }
}

impl LayoutOptions {
    /// Check whether an explicit font size is inside the accepted range
    pub fn accepts_font_size(&self, size: f32) -> bool {
        size.is_finite() && size >= self.min_font_size && size <= self.max_font_size
    }
}

/// Options for the live per-page flow controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowOptions {
    /// Occupancy below which a page pulls content from its successor
    pub underflow_ratio: f32,
    /// Maximum graphemes pulled back in one underflow step
    pub pull_limit: usize,
    /// How far back an overflow cut may snap to a newline
    pub newline_lookback: usize,
    /// How far back an overflow cut may snap to a space
    pub space_lookback: usize,
    /// Upper bound on scheduler ticks in a single settle
    pub settle_limit: usize,
    /// Font family handed to the measuring surface
    pub font_family: String,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            underflow_ratio: 0.4,
            pull_limit: 100,
            newline_lookback: 20,
            space_lookback: 10,
            settle_limit: 256,
            font_family: "serif".to_string(),
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    pub layout: LayoutOptions,
    pub flow: FlowOptions,
}

impl EngineOptions {
    /// Parse options from JSON; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
