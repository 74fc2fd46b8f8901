use thiserror::Error;

/// Validation failures raised by command handlers.
///
/// Every variant leaves the document untouched; the dispatcher turns them
/// into a failed [`CommandResult`](crate::command::CommandResult).
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Text to add must not be empty")]
    EmptyText,

    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: i64, total: usize },

    #[error("Cannot delete the only page in the document")]
    OnlyPage,

    #[error("Font size {size} is out of range ({min}-{max})")]
    FontSizeOutOfRange { size: f64, min: f32, max: f32 },

    #[error("Unknown page size: {0}")]
    UnknownPageSize(String),

    #[error("Search text must not be empty")]
    EmptySearch,

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid page style: {0}")]
    InvalidStyle(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{command} is missing argument {index}")]
    MissingArgument { command: &'static str, index: usize },

    #[error("{command} argument {index} is invalid: expected {expected}")]
    InvalidArgument {
        command: &'static str,
        index: usize,
        expected: &'static str,
    },

    #[error("Command failed unexpectedly: {0}")]
    Internal(String),
}

/// Failures crossing the persistence boundary
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown page size: {0}")]
    UnknownPageSize(String),

    #[error("Stored font size {0} is not usable")]
    InvalidFontSize(f32),
}
