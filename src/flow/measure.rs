//! Rendered-height measurement behind a scoped probe
//!
//! A [`RenderSurface`] lends out a short-lived measuring probe. The probe is
//! attached by [`MeasureScope::new`] and detached when the scope drops, so it
//! is released on every exit path, unwinding included.

use crate::layout::{LayoutConfig, PageConfig};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Style a surface needs to measure content the way the page renders it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureStyle {
    pub font_family: String,
    pub font_size: f32,
    /// Multiple of font size
    pub line_height: f32,
    /// Content box width
    pub width: f32,
}

impl MeasureStyle {
    pub fn from_layout(config: &LayoutConfig, font_family: &str) -> Self {
        Self {
            font_family: font_family.to_string(),
            font_size: config.font.current_font_size,
            line_height: config.line_height,
            width: config.page.content_width(),
        }
    }

    pub fn line_height_px(&self) -> f32 {
        self.font_size * self.line_height
    }
}

/// Something that can render text off-document and report its height.
///
/// Heights are in page units and must be monotonic in content length for a
/// fixed style.
pub trait RenderSurface {
    /// Create the measuring probe
    fn attach_probe(&mut self, style: &MeasureStyle);
    /// Rendered height of `content` in the attached probe
    fn probe_height(&mut self, content: &str) -> f32;
    /// Tear the probe down
    fn detach_probe(&mut self);
}

/// An attached probe; detaches on drop
pub struct MeasureScope<'a, S: RenderSurface + ?Sized> {
    surface: &'a mut S,
}

impl<'a, S: RenderSurface + ?Sized> MeasureScope<'a, S> {
    pub fn new(surface: &'a mut S, style: &MeasureStyle) -> Self {
        surface.attach_probe(style);
        Self { surface }
    }

    pub fn height_of(&mut self, content: &str) -> f32 {
        self.surface.probe_height(content)
    }
}

impl<S: RenderSurface + ?Sized> Drop for MeasureScope<'_, S> {
    fn drop(&mut self) {
        self.surface.detach_probe();
    }
}

/// Surface backed by the capacity model: text wraps at whole graphemes every
/// `content width / (font size * char ratio)` clusters, `\n` breaks lines.
#[derive(Debug, Clone)]
pub struct EstimateSurface {
    char_width_ratio: f32,
    style: Option<MeasureStyle>,
}

impl Default for EstimateSurface {
    fn default() -> Self {
        Self::new(0.6)
    }
}

impl EstimateSurface {
    pub fn new(char_width_ratio: f32) -> Self {
        Self {
            char_width_ratio,
            style: None,
        }
    }

    fn chars_per_line(style: &MeasureStyle, ratio: f32) -> usize {
        let per_line = (style.width / (style.font_size * ratio) + 1e-4).floor();
        if per_line.is_finite() && per_line >= 1.0 {
            per_line as usize
        } else {
            1
        }
    }
}

impl RenderSurface for EstimateSurface {
    fn attach_probe(&mut self, style: &MeasureStyle) {
        self.style = Some(style.clone());
    }

    fn probe_height(&mut self, content: &str) -> f32 {
        let Some(style) = &self.style else {
            return 0.0;
        };
        if content.is_empty() {
            return 0.0;
        }
        let per_line = Self::chars_per_line(style, self.char_width_ratio);
        let lines: usize = content
            .split('\n')
            .map(|line| line.graphemes(true).count().div_ceil(per_line).max(1))
            .sum();
        lines as f32 * style.line_height_px()
    }

    fn detach_probe(&mut self) {
        self.style = None;
    }
}

/// Adapter for a plain `heightOf(content, style)` function
pub struct FnSurface<F> {
    height_of: F,
    style: Option<MeasureStyle>,
}

impl<F> FnSurface<F>
where
    F: FnMut(&str, &MeasureStyle) -> f32,
{
    pub fn new(height_of: F) -> Self {
        Self {
            height_of,
            style: None,
        }
    }
}

impl<F> RenderSurface for FnSurface<F>
where
    F: FnMut(&str, &MeasureStyle) -> f32,
{
    fn attach_probe(&mut self, style: &MeasureStyle) {
        self.style = Some(style.clone());
    }

    fn probe_height(&mut self, content: &str) -> f32 {
        match &self.style {
            Some(style) => (self.height_of)(content, style),
            None => 0.0,
        }
    }

    fn detach_probe(&mut self) {
        self.style = None;
    }
}

/// Viewport height of one page surface
pub fn viewport_height(page: &PageConfig) -> f32 {
    page.content_height().max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutOptions;
    use crate::layout::PageSize;

    struct CountingSurface {
        attached: usize,
        detached: usize,
    }

    impl RenderSurface for CountingSurface {
        fn attach_probe(&mut self, _style: &MeasureStyle) {
            self.attached += 1;
        }

        fn probe_height(&mut self, content: &str) -> f32 {
            if content == "boom" {
                panic!("measurement failed");
            }
            content.len() as f32
        }

        fn detach_probe(&mut self) {
            self.detached += 1;
        }
    }

    fn style() -> MeasureStyle {
        MeasureStyle {
            font_family: "serif".to_string(),
            font_size: 10.0,
            line_height: 1.5,
            width: 60.0,
        }
    }

    #[test]
    fn test_scope_detaches() {
        let mut surface = CountingSurface {
            attached: 0,
            detached: 0,
        };
        {
            let mut scope = MeasureScope::new(&mut surface, &style());
            assert_eq!(scope.height_of("abc"), 3.0);
        }
        assert_eq!(surface.attached, 1);
        assert_eq!(surface.detached, 1);
    }

    #[test]
    fn test_scope_detaches_on_panic() {
        let mut surface = CountingSurface {
            attached: 0,
            detached: 0,
        };
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut scope = MeasureScope::new(&mut surface, &style());
            scope.height_of("boom");
        }));
        assert!(result.is_err());
        assert_eq!(surface.detached, 1);
    }

    #[test]
    fn test_estimate_surface_wraps() {
        // 60 / (10 * 0.6) = 10 clusters per line, 15px lines
        let mut surface = EstimateSurface::default();
        let mut scope = MeasureScope::new(&mut surface, &style());
        assert_eq!(scope.height_of(""), 0.0);
        assert_eq!(scope.height_of("abc"), 15.0);
        assert_eq!(scope.height_of(&"a".repeat(10)), 15.0);
        assert_eq!(scope.height_of(&"a".repeat(11)), 30.0);
        assert_eq!(scope.height_of("a\nb"), 30.0);
    }

    #[test]
    fn test_fn_surface() {
        let mut surface = FnSurface::new(|content: &str, style: &MeasureStyle| {
            content.len() as f32 * style.font_size
        });
        let mut scope = MeasureScope::new(&mut surface, &style());
        assert_eq!(scope.height_of("ab"), 20.0);
    }

    #[test]
    fn test_style_from_layout() {
        let config = LayoutConfig::new(PageSize::Letter, None, &LayoutOptions::default());
        let style = MeasureStyle::from_layout(&config, "serif");
        assert_eq!(style.width, 624.0);
        assert_eq!(style.font_size, 12.0);
        assert_eq!(viewport_height(&config.page), 864.0);
    }
}
