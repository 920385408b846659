//! Markdown to HTML conversion.
//!
//! Article summaries and bodies are authored in markdown. Conversion goes
//! through the [`MarkdownRenderer`] trait so the assembler can be tested with
//! a counting or stub renderer; [`CmarkRenderer`] is the real implementation.

use pulldown_cmark::{Options, Parser, html as md_html};

/// Converts markdown source to an HTML fragment.
///
/// Implementations must not fail: malformed input degrades to whatever HTML
/// the parser can make of it.
pub trait MarkdownRenderer: Sync {
    fn convert(&self, text: &str) -> String;
}

/// pulldown-cmark with the "extra" extensions enabled: tables, footnotes,
/// strikethrough, definition lists and `{#id .class}` heading attributes.
/// Fenced code blocks are part of CommonMark and always on.
#[derive(Debug, Clone, Copy)]
pub struct CmarkRenderer {
    options: Options,
}

impl CmarkRenderer {
    pub fn new() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_DEFINITION_LIST
                | Options::ENABLE_HEADING_ATTRIBUTES,
        }
    }
}

impl Default for CmarkRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer for CmarkRenderer {
    fn convert(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }
        let parser = Parser::new_ext(text, self.options);
        let mut out = String::with_capacity(text.len() * 3 / 2);
        md_html::push_html(&mut out, parser);
        out
    }
}
