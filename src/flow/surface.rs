//! Per-page editable surfaces and the caret that moves between them

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Stable identifier for a surface; survives page renumbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

/// One editable page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSurface {
    pub id: SurfaceId,
    pub content: String,
}

impl PageSurface {
    pub fn new(id: SurfaceId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
        }
    }

    /// Length in grapheme clusters
    pub fn len(&self) -> usize {
        grapheme_len(&self.content)
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Caret and selection inside one surface, in grapheme offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Focus {
    pub surface: SurfaceId,
    /// Fixed end of the selection
    pub anchor: usize,
    /// Caret
    pub active: usize,
}

impl Focus {
    /// Collapsed selection at `offset`
    pub fn caret(surface: SurfaceId, offset: usize) -> Self {
        Self {
            surface,
            anchor: offset,
            active: offset,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.active
    }

    /// Shift onto `surface`, moving both ends back by `delta`.
    /// An anchor left behind on the old surface collapses the selection.
    pub fn transferred(&self, surface: SurfaceId, delta: usize) -> Self {
        let active = self.active.saturating_sub(delta);
        let anchor = if self.anchor >= delta {
            self.anchor - delta
        } else {
            active
        };
        Self {
            surface,
            anchor,
            active,
        }
    }
}

/// Keys with cross-page behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavKey {
    ArrowUp,
    ArrowDown,
    Tab,
}

/// Byte offsets of every grapheme start, plus the end of the text
pub fn grapheme_bounds(text: &str) -> Vec<usize> {
    let mut bounds: Vec<usize> = text.grapheme_indices(true).map(|(idx, _)| idx).collect();
    bounds.push(text.len());
    bounds
}

pub fn grapheme_len(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Byte offset of grapheme `offset`, clamped to the end
pub fn byte_offset(text: &str, offset: usize) -> usize {
    text.grapheme_indices(true)
        .nth(offset)
        .map_or(text.len(), |(idx, _)| idx)
}
