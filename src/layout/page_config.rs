//! Named page geometries at 96 device-independent pixels per inch

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inner spacing between the page edge and its content box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Padding {
    /// Same padding on every side
    pub const fn all(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Apply a partial override, keeping sides the patch leaves unset
    pub fn merged(self, patch: &PaddingPatch) -> Self {
        Self {
            top: patch.top.unwrap_or(self.top),
            right: patch.right.unwrap_or(self.right),
            bottom: patch.bottom.unwrap_or(self.bottom),
            left: patch.left.unwrap_or(self.left),
        }
    }
}

/// Partial padding override used by `SET_PAGE_STYLE`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PaddingPatch {
    pub top: Option<f32>,
    pub right: Option<f32>,
    pub bottom: Option<f32>,
    pub left: Option<f32>,
}

impl PaddingPatch {
    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.right.is_none() && self.bottom.is_none() && self.left.is_none()
    }

    fn values(&self) -> impl Iterator<Item = f32> + '_ {
        [self.top, self.right, self.bottom, self.left]
            .into_iter()
            .flatten()
    }

    /// All provided sides are finite and non-negative
    pub fn is_valid(&self) -> bool {
        self.values().all(|v| v.is_finite() && v >= 0.0)
    }
}

/// The fixed table of supported page sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    Letter,
    Legal,
    A4,
    A3,
    Tabloid,
    Executive,
    Ledger,
}

impl PageSize {
    pub const ALL: [PageSize; 7] = [
        PageSize::Letter,
        PageSize::Legal,
        PageSize::A4,
        PageSize::A3,
        PageSize::Tabloid,
        PageSize::Executive,
        PageSize::Ledger,
    ];

    /// Lookup key used by commands and persistence
    pub fn key(self) -> &'static str {
        match self {
            PageSize::Letter => "letter",
            PageSize::Legal => "legal",
            PageSize::A4 => "a4",
            PageSize::A3 => "a3",
            PageSize::Tabloid => "tabloid",
            PageSize::Executive => "executive",
            PageSize::Ledger => "ledger",
        }
    }

    /// Geometry for this size: (width, height, padding)
    fn geometry(self) -> (f32, f32, Padding) {
        match self {
            PageSize::Letter => (816.0, 1056.0, Padding::all(96.0)),
            PageSize::Legal => (816.0, 1344.0, Padding::all(96.0)),
            // 20mm margins on ISO sizes
            PageSize::A4 => (794.0, 1123.0, Padding::all(76.0)),
            PageSize::A3 => (1123.0, 1587.0, Padding::all(76.0)),
            PageSize::Tabloid => (1056.0, 1632.0, Padding::all(96.0)),
            PageSize::Executive => (696.0, 1008.0, Padding::all(72.0)),
            PageSize::Ledger => (1632.0, 1056.0, Padding::all(96.0)),
        }
    }

    /// Build the stock configuration for this size
    pub fn config(self) -> PageConfig {
        let (width, height, padding) = self.geometry();
        PageConfig {
            width,
            height,
            padding,
            name: self,
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        PageSize::ALL
            .into_iter()
            .find(|size| size.key() == key)
            .ok_or_else(|| s.to_string())
    }
}

/// Geometry of one physical page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    pub width: f32,
    pub height: f32,
    pub padding: Padding,
    pub name: PageSize,
}

impl Default for PageConfig {
    fn default() -> Self {
        PageSize::Letter.config()
    }
}

impl PageConfig {
    /// Usable content width; may be zero or negative for extreme padding
    pub fn content_width(&self) -> f32 {
        self.width - self.padding.left - self.padding.right
    }

    /// Usable content height per page
    pub fn content_height(&self) -> f32 {
        self.height - self.padding.top - self.padding.bottom
    }

    /// Copy of this config with a padding override applied
    pub fn with_padding(self, patch: &PaddingPatch) -> Self {
        Self {
            padding: self.padding.merged(patch),
            ..self
        }
    }
}
