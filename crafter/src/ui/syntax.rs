//! Syntect highlighting for the result panel.
//!
//! Highlighting runs once per new result, not per frame: the render path caches
//! the output in `AppState::result_lines`.

use std::sync::LazyLock;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static PS: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static TS: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// File extension whose syntax definition is used for generated code.
const CODE_EXTENSION: &str = "py";

/// Converts a syntect style to a ratatui style.
///
/// Only the foreground is carried over; the panel owns the background so changed
/// lines can be tinted.
fn syntect_style(style: syntect::highlighting::Style) -> Style {
    let fg = style.foreground;
    let mut out = Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b));
    if style.font_style.contains(FontStyle::BOLD) {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        out = out.add_modifier(Modifier::UNDERLINED);
    }
    out
}

/// Highlights `code` line by line. Falls back to plain lines if no theme loads
/// or a line fails to highlight.
pub fn highlight_code(code: &str) -> Vec<Line<'static>> {
    let syntax = PS
        .find_syntax_by_extension(CODE_EXTENSION)
        .unwrap_or_else(|| PS.find_syntax_plain_text());
    let Some(theme) = TS.themes.get("base16-ocean.dark").or_else(|| TS.themes.values().next()) else {
        return plain_lines(code);
    };

    let mut h = HighlightLines::new(syntax, theme);
    let mut out = Vec::new();
    for line in LinesWithEndings::from(code) {
        let spans = match h.highlight_line(line, &PS) {
            Ok(ranges) => ranges
                .into_iter()
                .map(|(style, text)| {
                    Span::styled(text.trim_end_matches(['\n', '\r']).to_owned(), syntect_style(style))
                })
                .collect(),
            Err(_) => vec![Span::raw(line.trim_end_matches(['\n', '\r']).to_owned())],
        };
        out.push(Line::from(spans));
    }
    out
}

fn plain_lines(code: &str) -> Vec<Line<'static>> {
    code.lines().map(|l| Line::raw(l.to_owned())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_per_source_line() {
        let lines = highlight_code("import pygame\n\nx = 1\n");
        assert_eq!(lines.len(), 3);
        let text: String = lines[2].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "x = 1");
    }

    #[test]
    fn empty_code_has_no_lines() {
        assert!(highlight_code("").is_empty());
    }
}
