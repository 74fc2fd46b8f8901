//! Page Flow CLI (for testing purposes only)
//! The main interface is through WASM bindings.
//!
//! Usage: page-flow <file> [page-size] [font-size]

use page_flow::{DocumentSession, LayoutOptions, PageSize};
use std::process::ExitCode;

fn usage() -> ExitCode {
    eprintln!("Usage: page-flow <file> [page-size] [font-size]");
    eprintln!();
    eprintln!("Page sizes:");
    for size in PageSize::ALL {
        let config = size.config();
        eprintln!("  {:<10} {} x {}", size.key(), config.width, config.height);
    }
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(path) = args.first() else {
        return usage();
    };

    let page_size = match args.get(1).map(|key| key.parse::<PageSize>()) {
        Some(Ok(size)) => size,
        Some(Err(key)) => {
            eprintln!("Unknown page size: {key}");
            return usage();
        }
        None => PageSize::Letter,
    };

    let options = LayoutOptions::default();
    let font_size = match args.get(2).map(|size| size.parse::<f32>()) {
        Some(Ok(size)) if options.accepts_font_size(size) => Some(size),
        Some(_) => {
            eprintln!(
                "Font size must be a number between {} and {}",
                options.min_font_size, options.max_font_size
            );
            return ExitCode::FAILURE;
        }
        None => None,
    };

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Cannot read {path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let session = DocumentSession::new(content, page_size, font_size, options);
    let state = session.state();
    let config = state.engine.config();
    let metrics = state.metrics;

    println!("Page Flow");
    println!("=========");
    println!(
        "{} at {:.1}pt: {} chars/line, {} lines/page, {} words/line",
        config.page.name,
        config.font.current_font_size,
        metrics.characters_per_line,
        metrics.lines_per_page,
        metrics.words_per_line
    );
    println!("{} pages", state.total_pages());

    for page in &state.pages {
        println!();
        println!(
            "--- page {} ({} words, {} chars, {} lines{}) ---",
            page.page_number,
            page.word_count,
            page.character_count,
            page.line_count,
            if page.is_full { ", full" } else { "" }
        );
        println!("{}", page.content);
    }

    ExitCode::SUCCESS
}
