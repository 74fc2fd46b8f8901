//! Font size scaling relative to the base page

use crate::layout::page_config::{PageConfig, PageSize};
use serde::{Deserialize, Serialize};

/// Font size state for the active page geometry.
///
/// The current size follows the page automatically (`base * ratio`) until a
/// caller sets it explicitly; from then on page changes only update the ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontScaling {
    pub base_font_size: f32,
    pub base_page_size: PageSize,
    pub current_font_size: f32,
    pub scaling_ratio: f32,
    /// Set once the current size was chosen explicitly
    pub overridden: bool,
}

impl FontScaling {
    /// Scaling for `config`, measured against the letter page
    pub fn new(base_font_size: f32, config: &PageConfig) -> Self {
        let mut scaling = Self {
            base_font_size,
            base_page_size: PageSize::Letter,
            current_font_size: base_font_size,
            scaling_ratio: 1.0,
            overridden: false,
        };
        scaling.rescale(config);
        scaling
    }

    /// Recompute the ratio after the page geometry changed
    pub fn rescale(&mut self, config: &PageConfig) {
        self.scaling_ratio = scaling_ratio(&self.base_page_size.config(), config);
        if !self.overridden {
            self.current_font_size = self.base_font_size * self.scaling_ratio;
        }
    }

    /// Pin the current size, bypassing automatic scaling
    pub fn override_font_size(&mut self, size: f32) {
        self.current_font_size = size;
        self.overridden = true;
    }
}

/// min(width ratio, height ratio), kept strictly positive
pub fn scaling_ratio(base: &PageConfig, config: &PageConfig) -> f32 {
    let ratio = (config.width / base.width).min(config.height / base.height);
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        f32::EPSILON
    }
}
