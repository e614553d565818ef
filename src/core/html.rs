// src/core/html.rs
//
// Small helpers over `scraper` element trees.

use scraper::{ElementRef, Node, Selector};

use super::sanitize::normalize_ws;

/// Compile a selector that is a literal in this crate.
///
/// Panics on an invalid selector; only ever called with constants, and
/// every constant is exercised by the parser tests.
pub fn sel(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}

/// All text below `el`, whitespace-normalized.
pub fn text_of(el: ElementRef<'_>) -> String {
    let joined: String = el.text().collect::<Vec<_>>().join(" ");
    normalize_ws(&joined)
}

/// Text below `el` split into trimmed, non-empty lines.
///
/// `<br>` and block elements end a line, as do newlines inside text nodes.
/// Inline markup (`<b>Yea</b>`) stays on the line it sits in.
pub fn lines_of(el: ElementRef<'_>) -> Vec<String> {
    fn flush(lines: &mut Vec<String>, cur: &mut String) {
        let line = normalize_ws(cur);
        if !line.is_empty() {
            lines.push(line);
        }
        cur.clear();
    }

    let mut lines = Vec::new();
    let mut cur = s!();
    for node in el.descendants() {
        match node.value() {
            Node::Text(t) => {
                let mut parts = t.split('\n');
                if let Some(first) = parts.next() {
                    cur.push_str(first);
                }
                for part in parts {
                    flush(&mut lines, &mut cur);
                    cur.push_str(part);
                }
            }
            Node::Element(e) if matches!(e.name(), "br" | "p" | "div" | "li" | "tr") => {
                flush(&mut lines, &mut cur);
            }
            _ => {}
        }
    }
    flush(&mut lines, &mut cur);
    lines
}

/// Text of the first descendant matching `selector`.
pub fn first_text(el: ElementRef<'_>, selector: &Selector) -> Option<String> {
    el.select(selector)
        .next()
        .map(text_of)
        .filter(|s| !s.is_empty())
}
