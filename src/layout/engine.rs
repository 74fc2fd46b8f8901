//! Layout configuration and the reflow coordinator

use crate::config::LayoutOptions;
use crate::error::CommandError;
use crate::layout::font::FontScaling;
use crate::layout::metrics::{self, ContentMetrics};
use crate::layout::page_config::{PageConfig, PageSize, PaddingPatch};
use crate::layout::pagination::{self, LayoutResult};
use crate::layout::preview::{self, PreviewEstimate};
use serde::{Deserialize, Serialize};

/// Immutable geometry and typography for one layout pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    pub page: PageConfig,
    pub font: FontScaling,
    /// Line height as a multiple of font size
    pub line_height: f32,
}

impl LayoutConfig {
    /// Config for a stock page size, optionally pinning the font size
    pub fn new(page_size: PageSize, font_size: Option<f32>, options: &LayoutOptions) -> Self {
        let page = page_size.config();
        let mut font = FontScaling::new(options.base_font_size, &page);
        if let Some(size) = font_size {
            font.override_font_size(size);
        }
        Self {
            page,
            font,
            line_height: options.line_height,
        }
    }

    pub fn metrics(&self, options: &LayoutOptions) -> ContentMetrics {
        metrics::estimate(&self.page, &self.font, self.line_height, options)
    }

    /// Line height in page units
    pub fn line_height_px(&self) -> f32 {
        self.font.current_font_size * self.line_height
    }
}

/// Parameters for `REFLOW_CONTENT`; unrecognized values are ignored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflowRequest {
    pub page_size: Option<String>,
    pub font_size: Option<f32>,
}

/// Parameters for `SET_PAGE_STYLE`; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageStyle {
    pub page_size: Option<String>,
    pub font_size: Option<f32>,
    pub line_height: Option<f32>,
    pub padding: Option<PaddingPatch>,
}

/// Per-document layout engine.
///
/// Owns the active [`LayoutConfig`]; every layout is recomputed from it and
/// the caller's content. The engine never holds or mutates content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEngine {
    config: LayoutConfig,
    options: LayoutOptions,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(PageSize::Letter, None, LayoutOptions::default())
    }
}

impl LayoutEngine {
    /// Create an engine for one document
    pub fn new(page_size: PageSize, font_size: Option<f32>, options: LayoutOptions) -> Self {
        Self {
            config: LayoutConfig::new(page_size, font_size, &options),
            options,
        }
    }

    /// Create an engine from a config produced elsewhere
    pub fn from_config(config: LayoutConfig, options: LayoutOptions) -> Self {
        Self { config, options }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn metrics(&self) -> ContentMetrics {
        self.config.metrics(&self.options)
    }

    /// Split `content` under the active configuration
    pub fn layout(&self, content: &str) -> LayoutResult {
        pagination::layout(content, &self.metrics())
    }

    /// Estimate a page count without splitting
    pub fn preview(&self, content: &str) -> PreviewEstimate {
        preview::preview(content, &self.metrics())
    }

    /// Replace the page geometry and rescale the font
    pub fn set_page_size(&mut self, size: PageSize) {
        self.config.page = size.config();
        self.config.font.rescale(&self.config.page);
    }

    /// Pin the font size
    pub fn set_font_size(&mut self, size: f32) {
        self.config.font.override_font_size(size);
    }

    /// Apply the recognized parts of `request` and re-split `content`.
    ///
    /// Returns `None` when neither parameter was recognized; the engine is
    /// then unchanged.
    pub fn reflow(&mut self, request: &ReflowRequest, content: &str) -> Option<LayoutResult> {
        let page_size = request
            .page_size
            .as_deref()
            .and_then(|key| key.parse::<PageSize>().ok());
        let font_size = request
            .font_size
            .filter(|size| self.options.accepts_font_size(*size));

        if page_size.is_none() && font_size.is_none() {
            return None;
        }

        if let Some(size) = page_size {
            self.set_page_size(size);
        }
        if let Some(size) = font_size {
            self.set_font_size(size);
        }

        log::debug!(
            "reflow: page={} font={:.2} ratio={:.3}",
            self.config.page.name,
            self.config.font.current_font_size,
            self.config.font.scaling_ratio
        );

        Some(self.layout(content))
    }

    /// Merge a style override into the active configuration.
    ///
    /// All fields are validated before any is applied.
    pub fn set_page_style(&mut self, style: &PageStyle) -> Result<(), CommandError> {
        let page_size = style
            .page_size
            .as_deref()
            .map(|key| {
                key.parse::<PageSize>()
                    .map_err(CommandError::UnknownPageSize)
            })
            .transpose()?;

        if let Some(size) = style.font_size {
            if !self.options.accepts_font_size(size) {
                return Err(CommandError::FontSizeOutOfRange {
                    size: f64::from(size),
                    min: self.options.min_font_size,
                    max: self.options.max_font_size,
                });
            }
        }

        if let Some(line_height) = style.line_height {
            if !(line_height.is_finite() && line_height > 0.0) {
                return Err(CommandError::InvalidStyle(format!(
                    "line height must be positive, got {line_height}"
                )));
            }
        }

        if let Some(padding) = &style.padding {
            if !padding.is_valid() {
                return Err(CommandError::InvalidStyle(
                    "padding must be finite and non-negative".to_string(),
                ));
            }
        }

        if let Some(size) = page_size {
            self.set_page_size(size);
        }
        if let Some(padding) = &style.padding {
            self.config.page = self.config.page.with_padding(padding);
        }
        if let Some(size) = style.font_size {
            self.set_font_size(size);
        }
        if let Some(line_height) = style.line_height {
            self.config.line_height = line_height;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine() {
        let engine = LayoutEngine::default();
        assert_eq!(engine.config().page.name, PageSize::Letter);
        assert_eq!(engine.config().font.current_font_size, 12.0);
        assert_eq!(engine.metrics().characters_per_line, 86);
    }

    #[test]
    fn test_reflow_ignores_unknown_parameters() {
        let mut engine = LayoutEngine::default();
        let before = engine.clone();
        let request = ReflowRequest {
            page_size: Some("bogus".to_string()),
            font_size: Some(500.0),
        };
        assert!(engine.reflow(&request, "text").is_none());
        assert_eq!(engine, before);
    }

    #[test]
    fn test_reflow_page_size_rescales_font() {
        let mut engine = LayoutEngine::default();
        let request = ReflowRequest {
            page_size: Some("executive".to_string()),
            font_size: None,
        };
        let result = engine.reflow(&request, "hello").unwrap();
        assert_eq!(engine.config().page.name, PageSize::Executive);
        assert!(engine.config().font.current_font_size < 12.0);
        assert_eq!(result.total_pages, 1);
    }

    #[test]
    fn test_reflow_is_idempotent() {
        let content = "lorem ipsum dolor sit amet ".repeat(400);
        let request = ReflowRequest {
            page_size: Some("a4".to_string()),
            font_size: Some(14.0),
        };
        let mut engine = LayoutEngine::default();
        let first = engine.reflow(&request, &content).unwrap();
        let second = engine.reflow(&request, &content).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_page_style_merges_padding() {
        let mut engine = LayoutEngine::default();
        let style = PageStyle {
            line_height: Some(2.0),
            padding: Some(PaddingPatch {
                top: Some(0.0),
                bottom: Some(0.0),
                ..PaddingPatch::default()
            }),
            ..PageStyle::default()
        };
        engine.set_page_style(&style).unwrap();
        assert_eq!(engine.config().line_height, 2.0);
        assert_eq!(engine.config().page.content_height(), 1056.0);
        assert_eq!(engine.config().page.padding.left, 96.0);
    }

    #[test]
    fn test_page_style_is_atomic() {
        let mut engine = LayoutEngine::default();
        let before = engine.clone();
        let style = PageStyle {
            page_size: Some("a3".to_string()),
            line_height: Some(-1.0),
            ..PageStyle::default()
        };
        assert!(engine.set_page_style(&style).is_err());
        assert_eq!(engine, before);
    }
}
