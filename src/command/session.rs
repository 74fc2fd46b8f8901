//! The stateful document façade behind `executeCommand`

use std::panic::{self, AssertUnwindSafe};

use super::search::{find_in_pages, replace_all, MatchMode};
use super::{Command, CommandResult, StateDelta};
use crate::config::{FlowOptions, LayoutOptions};
use crate::error::{CommandError, PersistError};
use crate::flow::LiveFlowController;
use crate::layout::{
    join_pages, renumber, ContentMetrics, ContentPage, LayoutEngine, LayoutResult, PageSize,
    PageStyle, ReflowRequest,
};
use crate::persist::PersistedDocument;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything known about one open document.
///
/// `pages` always concatenate to `content`; `current_page` is 1-based and
/// clamped to the page list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    pub content: String,
    pub pages: Vec<ContentPage>,
    pub current_page: usize,
    pub engine: LayoutEngine,
    pub metrics: ContentMetrics,
}

impl DocumentState {
    pub fn new(content: impl Into<String>, engine: LayoutEngine) -> Self {
        let content = content.into();
        let result = engine.layout(&content);
        let mut state = Self {
            content,
            pages: Vec::new(),
            current_page: 1,
            engine,
            metrics: result.metrics,
        };
        state.apply_layout(result);
        state
    }

    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    /// Page `number`, or the range error a command should report
    pub fn page(&self, number: i64) -> Result<&ContentPage, CommandError> {
        let idx = self.page_index(number)?;
        Ok(&self.pages[idx])
    }

    fn page_index(&self, number: i64) -> Result<usize, CommandError> {
        let total = self.total_pages();
        match usize::try_from(number) {
            Ok(n) if (1..=total).contains(&n) => Ok(n - 1),
            _ => Err(CommandError::PageOutOfRange {
                page: number,
                total,
            }),
        }
    }

    fn relayout(&mut self) {
        let result = self.engine.layout(&self.content);
        self.apply_layout(result);
    }

    fn apply_layout(&mut self, result: LayoutResult) {
        self.pages = result.pages;
        self.metrics = result.metrics;
        self.current_page = self.current_page.clamp(1, self.pages.len().max(1));
    }

    fn layout_delta(&self) -> StateDelta {
        StateDelta {
            pages: Some(self.pages.clone()),
            total_pages: Some(self.total_pages()),
            current_page: Some(self.current_page),
            overflow: Some(false),
            metrics: Some(self.metrics),
            ..StateDelta::default()
        }
    }

    fn config_delta(&self) -> StateDelta {
        let config = self.engine.config();
        StateDelta {
            page_config: Some(config.page),
            font: Some(config.font),
            ..self.layout_delta()
        }
    }

    fn full_delta(&self) -> StateDelta {
        StateDelta {
            content: Some(self.content.clone()),
            ..self.config_delta()
        }
    }
}

/// One open document driven by named commands.
///
/// Each command runs against a copy of the state; the copy replaces the
/// live state only when the command succeeds and is not a preview.
#[derive(Debug, Clone)]
pub struct DocumentSession {
    state: DocumentState,
}

impl Default for DocumentSession {
    fn default() -> Self {
        Self::new("", PageSize::Letter, None, LayoutOptions::default())
    }
}

impl DocumentSession {
    pub fn new(
        content: impl Into<String>,
        page_size: PageSize,
        font_size: Option<f32>,
        options: LayoutOptions,
    ) -> Self {
        let engine = LayoutEngine::new(page_size, font_size, options);
        Self {
            state: DocumentState::new(content, engine),
        }
    }

    /// Read-only view of the current state
    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    /// Parse and run a named command. Never panics and never leaves the
    /// state partially updated.
    pub fn execute_command(&mut self, name: &str, args: &[Value]) -> CommandResult {
        match Command::parse(name, args) {
            Ok(command) => self.execute(command),
            Err(err) => {
                log::debug!("rejected command {name}: {err}");
                err.into()
            }
        }
    }

    pub fn execute(&mut self, command: Command) -> CommandResult {
        let mut draft = self.state.clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| apply(&mut draft, command)));
        match outcome {
            Ok(Ok(result)) => {
                if !result.preview_mode {
                    self.state = draft;
                }
                result
            }
            Ok(Err(err)) => {
                log::debug!("command failed: {err}");
                err.into()
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::debug!("command panicked: {message}");
                CommandError::Internal(message).into()
            }
        }
    }

    /// Fold live surfaces back into the canonical content and re-split
    pub fn reconcile(&mut self, flow: &LiveFlowController) -> CommandResult {
        self.execute(Command::LayoutText {
            content: flow.joined_content(),
        })
    }

    /// Live flow controller seeded from the current split
    pub fn live_flow(&self, options: FlowOptions) -> LiveFlowController {
        LiveFlowController::from_pages(&self.state.pages, self.state.engine.config(), options)
    }

    /// The three fields a store keeps
    pub fn snapshot(&self) -> PersistedDocument {
        let config = self.state.engine.config();
        PersistedDocument {
            content: self.state.content.clone(),
            page_size: config.page.name.key().to_string(),
            font_size: config
                .font
                .overridden
                .then_some(config.font.current_font_size),
        }
    }

    /// Reopen a stored document
    pub fn from_persisted(
        document: &PersistedDocument,
        options: LayoutOptions,
    ) -> Result<Self, PersistError> {
        let page_size = document
            .page_size
            .parse::<PageSize>()
            .map_err(PersistError::UnknownPageSize)?;
        if let Some(size) = document.font_size {
            if !options.accepts_font_size(size) {
                return Err(PersistError::InvalidFontSize(size));
            }
        }
        Ok(Self::new(
            document.content.clone(),
            page_size,
            document.font_size,
            options,
        ))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn apply(state: &mut DocumentState, command: Command) -> Result<CommandResult, CommandError> {
    match command {
        Command::AddText { text, page } => add_text(state, &text, page),
        Command::InsertPage { after_page } => insert_page(state, after_page),
        Command::DeletePage { page } => delete_page(state, page),
        Command::SetFontSize { size } => set_font_size(state, size),
        Command::SetPageSize { key } => set_page_size(state, &key),
        Command::SetPageStyle { style } => set_page_style(state, &style),
        Command::LayoutText { content } => {
            state.content = content;
            state.relayout();
            Ok(CommandResult::ok(
                format!("Laid out {} pages", state.total_pages()),
                StateDelta {
                    content: Some(state.content.clone()),
                    ..state.layout_delta()
                },
            ))
        }
        Command::PreviewLayout { content } => {
            let content = content.as_deref().unwrap_or(&state.content);
            let estimate = state.engine.preview(content);
            Ok(CommandResult::ok(
                format!("Estimated {} pages", estimate.estimated_pages),
                StateDelta {
                    preview: Some(estimate),
                    metrics: Some(estimate.metrics),
                    ..StateDelta::default()
                },
            )
            .with_preview())
        }
        Command::ReflowContent { request } => reflow(state, &request),
        Command::GoToPage { page } => go_to_page(state, page),
        Command::NextPage => {
            let next = state.current_page as i64 + 1;
            go_to_page(state, next)
        }
        Command::PreviousPage => {
            let previous = state.current_page as i64 - 1;
            go_to_page(state, previous)
        }
        Command::GetPage { page } => {
            let page = state.page(page)?.clone();
            Ok(CommandResult::ok(
                format!("Page {}", page.page_number),
                StateDelta {
                    page: Some(page),
                    ..StateDelta::default()
                },
            ))
        }
        Command::GetPageCount => Ok(CommandResult::ok(
            format!("{} pages", state.total_pages()),
            StateDelta {
                total_pages: Some(state.total_pages()),
                current_page: Some(state.current_page),
                ..StateDelta::default()
            },
        )),
        Command::GetMetrics => {
            let config = state.engine.config();
            Ok(CommandResult::ok(
                "Current metrics",
                StateDelta {
                    metrics: Some(state.metrics),
                    page_config: Some(config.page),
                    font: Some(config.font),
                    ..StateDelta::default()
                },
            ))
        }
        Command::GetState => Ok(CommandResult::ok("Current state", state.full_delta())),
        Command::ClearContent => {
            state.content.clear();
            state.current_page = 1;
            state.relayout();
            Ok(CommandResult::ok(
                "Content cleared",
                StateDelta {
                    content: Some(String::new()),
                    ..state.layout_delta()
                },
            ))
        }
        Command::ReplaceText {
            search,
            replace,
            mode,
        } => replace_text(state, &search, &replace, mode),
        Command::FindText { search, mode } => {
            let matches = find_in_pages(&state.pages, &search, mode)?;
            Ok(CommandResult::ok(
                format!("Found {} matches", matches.len()),
                StateDelta {
                    matches: Some(matches),
                    ..StateDelta::default()
                },
            )
            .with_preview())
        }
    }
}

fn add_text(
    state: &mut DocumentState,
    text: &str,
    page: Option<i64>,
) -> Result<CommandResult, CommandError> {
    if text.is_empty() {
        return Err(CommandError::EmptyText);
    }
    match page {
        Some(number) => {
            let idx = state.page_index(number)?;
            let at: usize = state.pages[..=idx].iter().map(|p| p.content.len()).sum();
            state.content.insert_str(at, text);
        }
        None => state.content.push_str(text),
    }
    state.relayout();
    Ok(CommandResult::ok(
        format!("Added {} characters", text.chars().count()),
        StateDelta {
            content: Some(state.content.clone()),
            ..state.layout_delta()
        },
    ))
}

fn insert_page(state: &mut DocumentState, after_page: i64) -> Result<CommandResult, CommandError> {
    let total = state.total_pages();
    let after = match usize::try_from(after_page) {
        Ok(n) if n <= total => n,
        _ => {
            return Err(CommandError::PageOutOfRange {
                page: after_page,
                total,
            })
        }
    };
    state.pages.insert(after, ContentPage::empty(after + 1));
    renumber(&mut state.pages);
    Ok(CommandResult::ok(
        format!("Inserted page {}", after + 1),
        state.layout_delta(),
    ))
}

fn delete_page(state: &mut DocumentState, page: i64) -> Result<CommandResult, CommandError> {
    let idx = state.page_index(page)?;
    if state.total_pages() == 1 {
        return Err(CommandError::OnlyPage);
    }
    state.pages.remove(idx);
    state.content = join_pages(&state.pages);
    state.relayout();
    Ok(CommandResult::ok(
        format!("Deleted page {page}"),
        StateDelta {
            content: Some(state.content.clone()),
            ..state.layout_delta()
        },
    ))
}

fn set_font_size(state: &mut DocumentState, size: f64) -> Result<CommandResult, CommandError> {
    let options = state.engine.options();
    let (min, max) = (options.min_font_size, options.max_font_size);
    if !(size >= f64::from(min) && size <= f64::from(max)) {
        return Err(CommandError::FontSizeOutOfRange { size, min, max });
    }
    state.engine.set_font_size(size as f32);
    state.relayout();
    Ok(CommandResult::ok(
        format!("Font size set to {size}"),
        state.config_delta(),
    ))
}

fn set_page_size(state: &mut DocumentState, key: &str) -> Result<CommandResult, CommandError> {
    let size = key
        .parse::<PageSize>()
        .map_err(CommandError::UnknownPageSize)?;
    state.engine.set_page_size(size);
    state.relayout();
    Ok(CommandResult::ok(
        format!("Page size set to {size}"),
        state.config_delta(),
    ))
}

fn set_page_style(
    state: &mut DocumentState,
    style: &PageStyle,
) -> Result<CommandResult, CommandError> {
    state.engine.set_page_style(style)?;
    state.relayout();
    Ok(CommandResult::ok("Page style updated", state.config_delta()))
}

fn reflow(
    state: &mut DocumentState,
    request: &ReflowRequest,
) -> Result<CommandResult, CommandError> {
    match state.engine.reflow(request, &state.content) {
        Some(result) => {
            state.apply_layout(result);
            Ok(CommandResult::ok(
                format!("Reflowed into {} pages", state.total_pages()),
                state.config_delta(),
            ))
        }
        None => Ok(CommandResult::ok(
            "Nothing to reflow",
            StateDelta::default(),
        )),
    }
}

fn go_to_page(state: &mut DocumentState, page: i64) -> Result<CommandResult, CommandError> {
    let idx = state.page_index(page)?;
    state.current_page = idx + 1;
    Ok(CommandResult::ok(
        format!("Moved to page {}", state.current_page),
        StateDelta {
            current_page: Some(state.current_page),
            page: Some(state.pages[idx].clone()),
            ..StateDelta::default()
        },
    ))
}

fn replace_text(
    state: &mut DocumentState,
    search: &str,
    replacement: &str,
    mode: MatchMode,
) -> Result<CommandResult, CommandError> {
    let (content, count) = replace_all(&state.content, search, replacement, mode)?;
    if count == 0 {
        return Ok(CommandResult::ok(
            "No matches found",
            StateDelta {
                replacements: Some(0),
                ..StateDelta::default()
            },
        ));
    }
    state.content = content;
    state.relayout();
    Ok(CommandResult::ok(
        format!("Replaced {count} occurrences"),
        StateDelta {
            content: Some(state.content.clone()),
            replacements: Some(count),
            ..state.layout_delta()
        },
    ))
}
