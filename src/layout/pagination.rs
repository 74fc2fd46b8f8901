//! Static page splitting for multi-page documents

use crate::layout::metrics::ContentMetrics;
use crate::layout::tokenize::{tokenize, Token, TokenKind};
use serde::{Deserialize, Serialize};

/// One page of the static split
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPage {
    /// 1-based, sequential
    pub page_number: usize,
    /// Markup-preserving slice of the canonical content
    pub content: String,
    pub word_count: usize,
    pub character_count: usize,
    /// Lines occupied under the capacity model
    pub line_count: usize,
    /// Closed because capacity was reached, not because content ran out
    pub is_full: bool,
}

impl ContentPage {
    /// Create an empty page
    pub fn empty(page_number: usize) -> Self {
        Self {
            page_number,
            ..Self::default()
        }
    }

    /// Page record for arbitrary content, counted the way the splitter counts
    pub fn from_content(page_number: usize, content: impl Into<String>) -> Self {
        let content = content.into();
        let mut page = Self::empty(page_number);
        for token in tokenize(&content) {
            page.count(&token);
            page.line_count += token.newlines();
        }
        if !content.is_empty() {
            page.line_count += 1;
        }
        page.content = content;
        page
    }

    fn count(&mut self, token: &Token<'_>) {
        self.character_count += token.visible_len;
        if token.kind == TokenKind::Word && token.visible_len > 0 {
            self.word_count += 1;
        }
    }

    fn push(&mut self, token: &Token<'_>) {
        self.content.push_str(token.text);
        self.count(token);
    }

    fn has_words(&self) -> bool {
        self.word_count > 0
    }
}

/// Output of a full split
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    pub pages: Vec<ContentPage>,
    pub total_pages: usize,
    /// Reserved; always false
    pub overflow: bool,
    pub metrics: ContentMetrics,
}

/// Running position on the page being filled
#[derive(Debug, Default)]
struct LineCursor {
    /// Completed lines on the current page
    lines_used: usize,
    /// Visible length of the open line
    line_len: usize,
}

impl LineCursor {
    fn lines_on_page(&self) -> usize {
        self.lines_used + usize::from(self.line_len > 0)
    }

    fn advance_whitespace(&mut self, token: &Token<'_>) {
        for ch in token.text.chars() {
            if ch == '\n' {
                self.lines_used += 1;
                self.line_len = 0;
            } else if self.line_len > 0 {
                self.line_len += 1;
            }
        }
    }
}

/// Split `content` into pages under `metrics`.
///
/// Greedy: words wrap when they would exceed the line width and the page
/// closes once its line budget is spent. A word wider than a whole line is
/// placed as-is. With no capacity at all every word lands on its own page.
/// Concatenating the pages' content reproduces `content` byte for byte.
pub fn layout(content: &str, metrics: &ContentMetrics) -> LayoutResult {
    let no_capacity = !metrics.has_capacity();
    let mut pages = Vec::new();
    let mut page = ContentPage::empty(1);
    let mut cursor = LineCursor::default();

    for token in tokenize(content) {
        if token.is_whitespace() {
            cursor.advance_whitespace(&token);
            page.push(&token);
            continue;
        }

        if cursor.line_len > 0
            && cursor.line_len + token.visible_len > metrics.characters_per_line
        {
            cursor.lines_used += 1;
            cursor.line_len = 0;
        }

        if page.has_words() && (no_capacity || cursor.lines_used >= metrics.lines_per_page) {
            page.line_count = cursor.lines_on_page();
            page.is_full = true;
            log::trace!(
                "closing page {} at {} lines, {} words",
                page.page_number,
                page.line_count,
                page.word_count
            );
            let next_number = page.page_number + 1;
            pages.push(std::mem::replace(&mut page, ContentPage::empty(next_number)));
            cursor = LineCursor::default();
        }

        page.push(&token);
        cursor.line_len += token.visible_len;
    }

    if page.has_words() || pages.is_empty() {
        page.line_count = cursor.lines_on_page();
        pages.push(page);
    } else if let Some(last) = pages.last_mut() {
        // Only whitespace or bare markup after the last close
        last.content.push_str(&page.content);
        last.character_count += page.character_count;
    }

    LayoutResult {
        total_pages: pages.len(),
        pages,
        overflow: false,
        metrics: *metrics,
    }
}

/// Concatenate page contents in order
pub fn join_pages(pages: &[ContentPage]) -> String {
    let len = pages.iter().map(|p| p.content.len()).sum();
    let mut out = String::with_capacity(len);
    for page in pages {
        out.push_str(&page.content);
    }
    out
}

/// Reassign 1-based page numbers in order
pub fn renumber(pages: &mut [ContentPage]) {
    for (idx, page) in pages.iter_mut().enumerate() {
        page.page_number = idx + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(characters_per_line: usize, lines_per_page: usize) -> ContentMetrics {
        ContentMetrics {
            characters_per_line,
            lines_per_page,
            words_per_line: characters_per_line / 6,
            total_capacity: characters_per_line * lines_per_page,
        }
    }

    #[test]
    fn test_empty_content() {
        let result = layout("", &metrics(80, 40));
        assert_eq!(result.total_pages, 1);
        assert_eq!(result.pages[0].page_number, 1);
        assert_eq!(result.pages[0].content, "");
        assert!(!result.pages[0].is_full);
        assert!(!result.overflow);
    }

    #[test]
    fn test_single_page() {
        let result = layout("Hello world", &metrics(80, 40));
        assert_eq!(result.total_pages, 1);
        assert_eq!(result.pages[0].word_count, 2);
        assert_eq!(result.pages[0].character_count, 11);
        assert_eq!(result.pages[0].line_count, 1);
    }

    #[test]
    fn test_wraps_into_pages() {
        // 11 chars per line fits "aaaa bbbb " + nothing more; 2 lines per page
        let text = "aaaa bbbb cccc dddd eeee ffff";
        let result = layout(text, &metrics(11, 2));
        assert_eq!(result.total_pages, 2);
        assert!(result.pages[0].is_full);
        assert_eq!(result.pages[0].content, "aaaa bbbb cccc dddd ");
        assert_eq!(result.pages[1].content, "eeee ffff");
        assert!(!result.pages[1].is_full);
        assert_eq!(join_pages(&result.pages), text);
    }

    #[test]
    fn test_page_numbers_are_sequential() {
        let text = "word ".repeat(500);
        let result = layout(&text, &metrics(20, 3));
        for (idx, page) in result.pages.iter().enumerate() {
            assert_eq!(page.page_number, idx + 1);
        }
        assert_eq!(join_pages(&result.pages), text);
    }

    #[test]
    fn test_long_word_is_not_split() {
        let long = "x".repeat(50);
        let text = format!("a {long} b");
        let result = layout(&text, &metrics(10, 1));
        assert!(result.pages.iter().any(|p| p.content.contains(&long)));
        assert_eq!(join_pages(&result.pages), text);
    }

    #[test]
    fn test_markup_stays_atomic() {
        let text = r#"<span style="color: red">one</span> two three four"#;
        let result = layout(text, &metrics(4, 1));
        assert_eq!(result.pages[0].content, r#"<span style="color: red">one</span> "#);
        assert_eq!(result.pages[0].character_count, 4);
        assert_eq!(join_pages(&result.pages), text);
    }

    #[test]
    fn test_hard_newlines_consume_lines() {
        let result = layout("a\nb\nc\nd", &metrics(80, 2));
        assert_eq!(result.total_pages, 2);
        assert_eq!(result.pages[0].content, "a\nb\n");
        assert_eq!(result.pages[1].content, "c\nd");
    }

    #[test]
    fn test_zero_capacity_puts_each_word_on_its_own_page() {
        let result = layout("one two three", &metrics(0, 0));
        assert_eq!(result.total_pages, 3);
        assert_eq!(result.pages[0].content, "one ");
        assert_eq!(result.pages[2].content, "three");
    }

    #[test]
    fn test_whitespace_only_is_kept() {
        let result = layout("  \n ", &metrics(80, 40));
        assert_eq!(result.total_pages, 1);
        assert_eq!(result.pages[0].content, "  \n ");
        assert_eq!(result.pages[0].word_count, 0);
    }

    #[test]
    fn test_page_from_content() {
        let page = ContentPage::from_content(3, "<b>one</b> two\nthree");
        assert_eq!(page.page_number, 3);
        assert_eq!(page.word_count, 3);
        assert_eq!(page.character_count, 13);
        assert_eq!(page.line_count, 2);
        assert!(!page.is_full);
    }

    #[test]
    fn test_renumber() {
        let mut pages = vec![ContentPage::empty(4), ContentPage::empty(9)];
        renumber(&mut pages);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[1].page_number, 2);
    }
}
