//! Capacity estimation and static page splitting

mod engine;
pub mod font;
mod metrics;
mod page_config;
mod pagination;
mod preview;
pub mod tokenize;

pub use engine::{LayoutConfig, LayoutEngine, PageStyle, ReflowRequest};
pub use font::FontScaling;
pub use metrics::{estimate, ContentMetrics};
pub use page_config::{Padding, PaddingPatch, PageConfig, PageSize};
pub use pagination::{join_pages, layout, renumber, ContentPage, LayoutResult};
pub use preview::{preview, PreviewEstimate};
