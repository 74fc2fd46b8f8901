//! Document-level pagination behavior through the command interface

use page_flow::layout::join_pages;
use page_flow::{DocumentSession, LayoutEngine, LayoutOptions, PageSize};
use serde_json::json;

fn session(content: &str) -> DocumentSession {
    DocumentSession::new(content, PageSize::Letter, None, LayoutOptions::default())
}

fn long_text() -> String {
    "The quick brown fox jumps over the lazy dog. ".repeat(500)
}

#[test]
fn layout_of_empty_content_is_one_blank_page() {
    let mut doc = session("some text");
    let result = doc.execute_command("LAYOUT_TEXT", &[json!("")]);
    assert!(result.success);

    let delta = result.new_state.unwrap();
    assert_eq!(delta.total_pages, Some(1));
    let pages = delta.pages.unwrap();
    assert_eq!(pages[0].page_number, 1);
    assert_eq!(pages[0].content, "");
    assert!(!pages[0].is_full);
}

#[test]
fn pages_reconstruct_content() {
    let samples = [
        long_text(),
        "Tabs\tand  double  spaces\n\nand <b>bold</b> and <img src=\"a.png\"/> ".repeat(200),
        "naïve café 日本語 👩‍👩‍👧 ".repeat(400),
        "   leading and trailing   ".to_string(),
    ];
    let engine = LayoutEngine::default();
    for content in &samples {
        let result = engine.layout(content);
        assert_eq!(&join_pages(&result.pages), content);
        for (idx, page) in result.pages.iter().enumerate() {
            assert_eq!(page.page_number, idx + 1);
        }
        for page in &result.pages[..result.pages.len() - 1] {
            assert!(page.is_full);
        }
    }
}

#[test]
fn markup_tags_never_straddle_pages() {
    let content = "<span class=\"note\">annotated</span> text ".repeat(800);
    let result = LayoutEngine::default().layout(&content);
    assert!(result.total_pages > 1);
    for page in &result.pages {
        assert_eq!(
            page.content.matches('<').count(),
            page.content.matches('>').count()
        );
    }
}

#[test]
fn reflow_twice_gives_identical_pages() {
    let mut doc = session(&long_text());
    let first = doc.execute_command("REFLOW_CONTENT", &[json!("legal"), json!(10)]);
    let pages_first = doc.state().pages.clone();
    let second = doc.execute_command("REFLOW_CONTENT", &[json!("legal"), json!(10)]);
    assert!(first.success && second.success);
    assert_eq!(doc.state().pages, pages_first);
    assert_eq!(doc.state().content, long_text());
}

#[test]
fn appending_words_never_reduces_page_count() {
    let engine = LayoutEngine::default();
    let mut content = String::new();
    let mut previous = 0;
    for i in 0..3000 {
        content.push_str(if i % 7 == 0 { "extraordinarily " } else { "word " });
        if i % 50 == 0 {
            let total = engine.layout(&content).total_pages;
            assert!(total >= previous);
            previous = total;
        }
    }
    assert!(previous > 1);
}

#[test]
fn preview_stays_within_one_page_of_layout() {
    let engine = LayoutEngine::default();
    for words in [1, 10, 629, 630, 631, 2000, 5000, 12_345] {
        let content = "lorem ".repeat(words);
        let laid_out = engine.layout(&content).total_pages as i64;
        let estimated = engine.preview(&content).estimated_pages as i64;
        assert!(
            (laid_out - estimated).abs() <= 1,
            "{words} words: layout {laid_out}, preview {estimated}"
        );
    }
}

#[test]
fn deleting_a_page_removes_exactly_its_content() {
    let mut doc = session(&long_text());
    let pages = doc.state().pages.clone();
    assert!(pages.len() >= 3);

    let expected: String = pages
        .iter()
        .filter(|page| page.page_number != 2)
        .map(|page| page.content.as_str())
        .collect();

    let result = doc.execute_command("DELETE_PAGE", &[json!(2)]);
    assert!(result.success);
    assert_eq!(doc.state().content, expected);
}

#[test]
fn smaller_font_packs_more_per_page() {
    let mut doc = session(&long_text());
    assert!(doc.execute_command("SET_FONT_SIZE", &[json!(6)]).success);
    let small = doc.state().total_pages();
    assert!(doc.execute_command("SET_FONT_SIZE", &[json!(8)]).success);
    let larger = doc.state().total_pages();
    assert!(small >= larger);
    assert!(larger > 1);
}

#[test]
fn deleting_the_only_page_fails() {
    let mut doc = session("short");
    let result = doc.execute_command("DELETE_PAGE", &[json!(1)]);
    assert!(!result.success);
    assert!(result.message.contains("only page"));
    assert_eq!(doc.state().content, "short");
}

#[test]
fn unknown_page_size_is_rejected_without_change() {
    let mut doc = session(&long_text());
    let before = doc.state().clone();
    let result = doc.execute_command("SET_PAGE_SIZE", &[json!("bogus")]);
    assert!(!result.success);
    assert_eq!(doc.state(), &before);
}

#[test]
fn failures_never_touch_content() {
    let mut doc = session(&long_text());
    let before = doc.state().clone();
    let failing = [
        ("ADD_TEXT", vec![json!("")]),
        ("ADD_TEXT", vec![json!("x"), json!(99)]),
        ("INSERT_PAGE", vec![json!(-1)]),
        ("DELETE_PAGE", vec![json!(0)]),
        ("SET_FONT_SIZE", vec![json!(100)]),
        ("SET_PAGE_SIZE", vec![json!("b5")]),
        ("SET_PAGE_STYLE", vec![json!({"lineHeight": 0})]),
        ("GO_TO_PAGE", vec![json!(1000)]),
        ("REPLACE_TEXT", vec![json!("")]),
        ("REPLACE_TEXT", vec![json!("[unclosed"), json!("x"), json!(true)]),
        ("FIND_TEXT", vec![json!("")]),
        ("NOT_A_COMMAND", vec![]),
        ("GO_TO_PAGE", vec![json!("two")]),
    ];
    for (name, args) in failing {
        let result = doc.execute_command(name, &args);
        assert!(!result.success, "{name} should fail");
        assert!(!result.message.is_empty());
        assert_eq!(doc.state(), &before, "{name} mutated state");
    }
}

#[test]
fn every_page_size_lays_out() {
    for size in PageSize::ALL {
        let mut doc = session(&long_text());
        let result = doc.execute_command("SET_PAGE_SIZE", &[json!(size.key())]);
        assert!(result.success, "{size}");
        assert_eq!(doc.state().engine.config().page.name, size);
        assert_eq!(join_pages(&doc.state().pages), long_text());
    }
}

#[test]
fn extreme_geometry_does_not_hang() {
    let mut doc = session("a few words here");
    let style = json!({
        "padding": {"top": 600.0, "bottom": 600.0, "left": 500.0, "right": 500.0}
    });
    let result = doc.execute_command("SET_PAGE_STYLE", &[style]);
    assert!(result.success);
    assert_eq!(doc.state().metrics.total_capacity, 0);
    assert_eq!(doc.state().total_pages(), 4);
    assert_eq!(join_pages(&doc.state().pages), "a few words here");
}
