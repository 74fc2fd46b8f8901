//! Markup-aware tokenization for the page splitter
//!
//! Markup tags (`<...>`) are atomic: they are never split and never count
//! toward visible length. Whitespace runs are kept as their own tokens so
//! that concatenating every token reproduces the input exactly.

use unicode_segmentation::UnicodeSegmentation;

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of non-whitespace text, possibly containing markup tags
    Word,
    /// A run of whitespace outside any tag
    Whitespace,
}

/// A slice of the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub kind: TokenKind,
    /// Grapheme clusters outside markup
    pub visible_len: usize,
}

impl Token<'_> {
    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }

    /// Number of hard line breaks carried by this token
    pub fn newlines(&self) -> usize {
        match self.kind {
            TokenKind::Whitespace => self.text.matches('\n').count(),
            TokenKind::Word => 0,
        }
    }
}

/// Byte index just past the tag opening at `start`, if it is a closed tag
fn tag_end(text: &str, start: usize) -> Option<usize> {
    let rest = text.as_bytes().get(start + 1..)?;
    for (i, &b) in rest.iter().enumerate() {
        match b {
            b'>' => return Some(start + 1 + i + 1),
            b'<' => return None,
            _ => {}
        }
    }
    None
}

/// Split `text` into word and whitespace tokens with tags kept whole
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut kind: Option<TokenKind> = None;
    let mut iter = text.char_indices().peekable();

    while let Some((idx, ch)) = iter.next() {
        let (next_kind, end) = if ch == '<' {
            match tag_end(text, idx) {
                Some(end) => (TokenKind::Word, end),
                None => (TokenKind::Word, idx + ch.len_utf8()),
            }
        } else if ch.is_whitespace() {
            (TokenKind::Whitespace, idx + ch.len_utf8())
        } else {
            (TokenKind::Word, idx + ch.len_utf8())
        };

        if let Some(current) = kind {
            if current != next_kind {
                tokens.push(make_token(&text[start..idx], current));
                start = idx;
            }
        }
        kind = Some(next_kind);

        // Skip the remainder of a tag
        while let Some(&(next_idx, _)) = iter.peek() {
            if next_idx >= end {
                break;
            }
            iter.next();
        }
    }

    if let Some(current) = kind {
        tokens.push(make_token(&text[start..], current));
    }

    tokens
}

fn make_token(text: &str, kind: TokenKind) -> Token<'_> {
    let visible_len = match kind {
        TokenKind::Word => visible_len(text),
        TokenKind::Whitespace => text.chars().count(),
    };
    Token {
        text,
        kind,
        visible_len,
    }
}

/// Grapheme clusters in `text` once markup tags are removed
pub fn visible_len(text: &str) -> usize {
    strip_markup(text).graphemes(true).count()
}

/// Remove closed `<...>` tags, keeping everything else
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('<') {
        let open = pos + offset;
        out.push_str(&text[pos..open]);
        match tag_end(text, open) {
            Some(end) => pos = end,
            None => {
                out.push('<');
                pos = open + 1;
            }
        }
    }
    out.push_str(&text[pos..]);
    out
}

/// Whitespace-delimited non-empty word count
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(tokens: &[Token<'a>]) -> Vec<&'a str> {
        tokens.iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_plain_words() {
        let tokens = tokenize("Hello  world\n");
        assert_eq!(texts(&tokens), vec!["Hello", "  ", "world", "\n"]);
        assert_eq!(tokens[0].kind, TokenKind::Word);
        assert_eq!(tokens[1].kind, TokenKind::Whitespace);
        assert_eq!(tokens[3].newlines(), 1);
    }

    #[test]
    fn test_tag_with_spaces_is_atomic() {
        let text = r#"<span class="x y">hi</span> there"#;
        let tokens = tokenize(text);
        assert_eq!(
            texts(&tokens),
            vec![r#"<span class="x y">hi</span>"#, " ", "there"]
        );
        assert_eq!(tokens[0].visible_len, 2);
    }

    #[test]
    fn test_unclosed_angle_is_text() {
        let tokens = tokenize("a < b");
        assert_eq!(texts(&tokens), vec!["a", " ", "<", " ", "b"]);
        assert_eq!(tokens[2].visible_len, 1);
    }

    #[test]
    fn test_concatenation_is_lossless() {
        let text = "  <p>One</p>\n\n<b>two  three</b>\tfour é\u{301} ";
        let joined: String = tokenize(text).iter().map(|t| t.text).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn test_graphemes_count_once() {
        // e + combining acute is a single cluster
        assert_eq!(visible_len("e\u{301}x"), 2);
        assert_eq!(strip_markup("<i>a</i><br/>b"), "ab");
    }

    #[test]
    fn test_empty() {
        assert!(tokenize("").is_empty());
        assert_eq!(word_count("  \n "), 0);
        assert_eq!(word_count("one two  three"), 3);
    }
}
