use std::sync::LazyLock;

use regex::Regex;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<>()\[\]]+").expect("Invalid regex"));
static LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s").expect("Invalid regex"));
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#+\s").expect("Invalid regex"));

/// Tidy handwriting recognition output into Markdown.
///
/// List items, headings and fenced code pass through unchanged; table rows
/// get normalized `" | "` separators and bare URLs become links.
pub fn tidy_recognized_text(text: &str) -> String {
    let mut in_code = false;

    text.lines()
        .map(|line| {
            if line.trim_start().starts_with("```") {
                in_code = !in_code;
                return line.to_string();
            }
            if in_code || LIST_RE.is_match(line) || HEADING_RE.is_match(line) {
                return line.to_string();
            }
            if line.contains('|') {
                return normalize_table_row(line);
            }
            if line.contains('`') {
                return line.to_string();
            }
            linkify(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalize_table_row(line: &str) -> String {
    line.split('|')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" | ")
        .trim()
        .to_string()
}

fn linkify(line: &str) -> String {
    URL_RE.replace_all(line, "[$0]($0)").into_owned()
}
