//! Named document commands and their results
//!
//! Hosts drive a document through [`DocumentSession::execute_command`] with
//! a command name and positional JSON arguments. Names are parsed into a
//! typed [`Command`] first, so handlers never see raw arguments.

mod search;
mod session;

pub use search::{find_in_pages, replace_all, FindMatch, MatchMode};
pub use session::{DocumentSession, DocumentState};

use crate::error::CommandError;
use crate::layout::{
    ContentMetrics, ContentPage, FontScaling, PageConfig, PageStyle, PreviewEstimate,
    ReflowRequest,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddText { text: String, page: Option<i64> },
    InsertPage { after_page: i64 },
    DeletePage { page: i64 },
    SetFontSize { size: f64 },
    SetPageSize { key: String },
    SetPageStyle { style: PageStyle },
    LayoutText { content: String },
    PreviewLayout { content: Option<String> },
    ReflowContent { request: ReflowRequest },
    GoToPage { page: i64 },
    NextPage,
    PreviousPage,
    GetPage { page: i64 },
    GetPageCount,
    GetMetrics,
    GetState,
    ClearContent,
    ReplaceText {
        search: String,
        replace: String,
        mode: MatchMode,
    },
    FindText { search: String, mode: MatchMode },
}

impl Command {
    /// Parse a command name and its positional arguments
    pub fn parse(name: &str, args: &[Value]) -> Result<Self, CommandError> {
        let upper = name.trim().to_ascii_uppercase();
        let command = match upper.as_str() {
            "ADD_TEXT" => {
                let args = Args::new("ADD_TEXT", args);
                Command::AddText {
                    text: args.string(0)?,
                    page: args.opt_int(1)?,
                }
            }
            "INSERT_PAGE" => Command::InsertPage {
                after_page: Args::new("INSERT_PAGE", args).int(0)?,
            },
            "DELETE_PAGE" => Command::DeletePage {
                page: Args::new("DELETE_PAGE", args).int(0)?,
            },
            "SET_FONT_SIZE" => Command::SetFontSize {
                size: Args::new("SET_FONT_SIZE", args).number(0)?,
            },
            "SET_PAGE_SIZE" => Command::SetPageSize {
                key: Args::new("SET_PAGE_SIZE", args).string(0)?,
            },
            "SET_PAGE_STYLE" => Command::SetPageStyle {
                style: Args::new("SET_PAGE_STYLE", args).object(0)?,
            },
            "LAYOUT_TEXT" => Command::LayoutText {
                content: Args::new("LAYOUT_TEXT", args).string(0)?,
            },
            "PREVIEW_LAYOUT" => Command::PreviewLayout {
                content: Args::new("PREVIEW_LAYOUT", args).opt_string(0)?,
            },
            "REFLOW_CONTENT" => {
                let args = Args::new("REFLOW_CONTENT", args);
                Command::ReflowContent {
                    request: ReflowRequest {
                        page_size: args.opt_string(0)?,
                        font_size: args.opt_number(1)?.map(|size| size as f32),
                    },
                }
            }
            "GO_TO_PAGE" => Command::GoToPage {
                page: Args::new("GO_TO_PAGE", args).int(0)?,
            },
            "NEXT_PAGE" => Command::NextPage,
            "PREVIOUS_PAGE" => Command::PreviousPage,
            "GET_PAGE" => Command::GetPage {
                page: Args::new("GET_PAGE", args).int(0)?,
            },
            "GET_PAGE_COUNT" => Command::GetPageCount,
            "GET_METRICS" => Command::GetMetrics,
            "GET_STATE" => Command::GetState,
            "CLEAR_CONTENT" => Command::ClearContent,
            "REPLACE_TEXT" => {
                let args = Args::new("REPLACE_TEXT", args);
                Command::ReplaceText {
                    search: args.string(0)?,
                    replace: args.opt_string(1)?.unwrap_or_default(),
                    mode: args.match_mode(2)?,
                }
            }
            "FIND_TEXT" => {
                let args = Args::new("FIND_TEXT", args);
                Command::FindText {
                    search: args.string(0)?,
                    mode: args.match_mode(1)?,
                }
            }
            _ => return Err(CommandError::UnknownCommand(name.to_string())),
        };
        Ok(command)
    }
}

/// Positional argument reader for one command
struct Args<'a> {
    command: &'static str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    fn new(command: &'static str, values: &'a [Value]) -> Self {
        Self { command, values }
    }

    /// Missing and `null` both read as absent
    fn get(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index).filter(|v| !v.is_null())
    }

    fn require(&self, index: usize) -> Result<&'a Value, CommandError> {
        self.get(index).ok_or(CommandError::MissingArgument {
            command: self.command,
            index,
        })
    }

    fn invalid(&self, index: usize, expected: &'static str) -> CommandError {
        CommandError::InvalidArgument {
            command: self.command,
            index,
            expected,
        }
    }

    fn string(&self, index: usize) -> Result<String, CommandError> {
        self.require(index)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid(index, "a string"))
    }

    fn opt_string(&self, index: usize) -> Result<Option<String>, CommandError> {
        match self.get(index) {
            None => Ok(None),
            Some(value) => value
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| self.invalid(index, "a string")),
        }
    }

    fn as_int(&self, index: usize, value: &Value) -> Result<i64, CommandError> {
        if let Some(n) = value.as_i64() {
            return Ok(n);
        }
        match value.as_f64() {
            Some(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Ok(n as i64),
            _ => Err(self.invalid(index, "an integer")),
        }
    }

    fn int(&self, index: usize) -> Result<i64, CommandError> {
        let value = self.require(index)?;
        self.as_int(index, value)
    }

    fn opt_int(&self, index: usize) -> Result<Option<i64>, CommandError> {
        self.get(index)
            .map(|value| self.as_int(index, value))
            .transpose()
    }

    fn number(&self, index: usize) -> Result<f64, CommandError> {
        self.require(index)?
            .as_f64()
            .ok_or_else(|| self.invalid(index, "a number"))
    }

    fn opt_number(&self, index: usize) -> Result<Option<f64>, CommandError> {
        match self.get(index) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(index, "a number")),
        }
    }

    fn object<T: DeserializeOwned>(&self, index: usize) -> Result<T, CommandError> {
        let value = self.require(index)?;
        serde_json::from_value(value.clone()).map_err(|_| self.invalid(index, "an object"))
    }

    /// `true`, `"pattern"` or `{"pattern": true}` select pattern mode
    fn match_mode(&self, index: usize) -> Result<MatchMode, CommandError> {
        let pattern = match self.get(index) {
            None => false,
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(mode)) => match mode.as_str() {
                "pattern" | "regex" => true,
                "literal" => false,
                _ => return Err(self.invalid(index, "\"literal\" or \"pattern\"")),
            },
            Some(Value::Object(options)) => options
                .get("pattern")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            Some(_) => return Err(self.invalid(index, "match options")),
        };
        Ok(if pattern {
            MatchMode::Pattern
        } else {
            MatchMode::Literal
        })
    }
}

/// Partial state carried back with a result; absent fields were not touched
/// or not requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<ContentPage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overflow: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ContentMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_config: Option<PageConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<FontScaling>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<ContentPage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<PreviewEstimate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<FindMatch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacements: Option<usize>,
}

/// Outcome of one command. Failures never mutate the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_state: Option<StateDelta>,
    /// Computed without committing anything
    pub preview_mode: bool,
}

impl CommandResult {
    pub fn ok(message: impl Into<String>, new_state: StateDelta) -> Self {
        Self {
            success: true,
            message: message.into(),
            new_state: Some(new_state),
            preview_mode: false,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            new_state: None,
            preview_mode: false,
        }
    }

    pub fn with_preview(mut self) -> Self {
        self.preview_mode = true;
        self
    }
}

impl From<CommandError> for CommandResult {
    fn from(err: CommandError) -> Self {
        Self::failure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_names_case_insensitively() {
        assert_eq!(Command::parse("get_metrics", &[]).unwrap(), Command::GetMetrics);
        assert_eq!(
            Command::parse("GO_TO_PAGE", &[json!(3)]).unwrap(),
            Command::GoToPage { page: 3 }
        );
    }

    #[test]
    fn test_parse_optional_arguments() {
        assert_eq!(
            Command::parse("ADD_TEXT", &[json!("hi")]).unwrap(),
            Command::AddText {
                text: "hi".to_string(),
                page: None
            }
        );
        assert_eq!(
            Command::parse("REFLOW_CONTENT", &[Value::Null, json!(14)]).unwrap(),
            Command::ReflowContent {
                request: ReflowRequest {
                    page_size: None,
                    font_size: Some(14.0)
                }
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Command::parse("FLY", &[]),
            Err(CommandError::UnknownCommand(_))
        ));
        assert!(matches!(
            Command::parse("DELETE_PAGE", &[]),
            Err(CommandError::MissingArgument { index: 0, .. })
        ));
        assert!(matches!(
            Command::parse("GO_TO_PAGE", &[json!(1.5)]),
            Err(CommandError::InvalidArgument { .. })
        ));
        assert!(matches!(
            Command::parse("LAYOUT_TEXT", &[]),
            Err(CommandError::MissingArgument { index: 0, .. })
        ));
        assert!(matches!(
            Command::parse("LAYOUT_TEXT", &[Value::Null]),
            Err(CommandError::MissingArgument { index: 0, .. })
        ));
    }

    #[test]
    fn test_parse_match_mode() {
        let parse_mode = |arg: Value| {
            match Command::parse("FIND_TEXT", &[json!("x"), arg]).unwrap() {
                Command::FindText { mode, .. } => mode,
                other => panic!("unexpected {other:?}"),
            }
        };
        assert_eq!(parse_mode(Value::Null), MatchMode::Literal);
        assert_eq!(parse_mode(json!(true)), MatchMode::Pattern);
        assert_eq!(parse_mode(json!("pattern")), MatchMode::Pattern);
        assert_eq!(parse_mode(json!({"pattern": false})), MatchMode::Literal);
    }

    #[test]
    fn test_parse_page_style() {
        let style = json!({"lineHeight": 2.0, "padding": {"top": 10.0}});
        let command = Command::parse("SET_PAGE_STYLE", &[style]).unwrap();
        let Command::SetPageStyle { style } = command else {
            panic!("expected SET_PAGE_STYLE");
        };
        assert_eq!(style.line_height, Some(2.0));
        assert_eq!(style.padding.unwrap().top, Some(10.0));
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = CommandResult::ok(
            "ok",
            StateDelta {
                total_pages: Some(2),
                ..StateDelta::default()
            },
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["newState"]["totalPages"], json!(2));
        assert_eq!(value["previewMode"], json!(false));
        assert!(value["newState"].get("pages").is_none());
    }
}
