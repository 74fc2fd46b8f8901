//! Find and replace over document text
//!
//! Search strings are literal unless pattern mode is requested explicitly.

use crate::error::CommandError;
use crate::layout::ContentPage;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

/// How a search string is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Exact substring; metacharacters have no meaning
    #[default]
    Literal,
    /// Regular expression; replacements may use `$1`-style groups
    Pattern,
}

/// One occurrence reported by `FIND_TEXT`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindMatch {
    pub page_number: usize,
    /// Character offset within the page's content
    pub offset: usize,
    pub text: String,
}

fn matcher(search: &str, mode: MatchMode) -> Result<Regex, CommandError> {
    if search.is_empty() {
        return Err(CommandError::EmptySearch);
    }
    let regex = match mode {
        MatchMode::Literal => Regex::new(&regex::escape(search))?,
        MatchMode::Pattern => Regex::new(search)?,
    };
    Ok(regex)
}

/// Replace every match; returns the new text and the number of matches
pub fn replace_all(
    content: &str,
    search: &str,
    replacement: &str,
    mode: MatchMode,
) -> Result<(String, usize), CommandError> {
    let regex = matcher(search, mode)?;
    let count = regex.find_iter(content).count();
    if count == 0 {
        return Ok((content.to_string(), 0));
    }
    let replaced = match mode {
        MatchMode::Literal => regex.replace_all(content, NoExpand(replacement)),
        MatchMode::Pattern => regex.replace_all(content, replacement),
    };
    Ok((replaced.into_owned(), count))
}

/// Every match inside each page. Matches never span a page boundary.
pub fn find_in_pages(
    pages: &[ContentPage],
    search: &str,
    mode: MatchMode,
) -> Result<Vec<FindMatch>, CommandError> {
    let regex = matcher(search, mode)?;
    let mut found = Vec::new();
    for page in pages {
        for m in regex.find_iter(&page.content) {
            found.push(FindMatch {
                page_number: page.page_number,
                offset: page.content[..m.start()].chars().count(),
                text: m.as_str().to_string(),
            });
        }
    }
    Ok(found)
}
