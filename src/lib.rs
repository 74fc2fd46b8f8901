//! Page Flow: document pagination and live page flow
//!
//! This crate provides the pagination core behind a paged document editor:
//! - Capacity estimation from page geometry and font size
//! - Static splitting of markup-bearing text into pages
//! - Reflow on page size, font size and style changes
//! - A command interface (`executeCommand`) over one document's state
//! - Live overflow/underflow between per-page editable surfaces

pub mod command;
pub mod config;
pub mod error;
pub mod flow;
pub mod layout;
pub mod persist;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::{WasmFlow, WasmSession};

// Re-export primary types
pub use command::{Command, CommandResult, DocumentSession, DocumentState, StateDelta};
pub use config::{EngineOptions, FlowOptions, LayoutOptions};
pub use error::{CommandError, PersistError};
pub use flow::{CheckOutcome, FlowReport, LiveFlowController, NavKey, RenderSurface, SurfaceId};
pub use layout::{
    ContentMetrics, ContentPage, LayoutConfig, LayoutEngine, LayoutResult, PageConfig, PageSize,
};
pub use persist::{DocumentStore, MemoryStore, PersistedDocument};
