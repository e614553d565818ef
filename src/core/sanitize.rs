// src/core/sanitize.rs

/// Collapse runs of whitespace (including `&nbsp;` already decoded to U+00A0) and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() || ch == '\u{a0}' {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Clean a metadata value the way the vote pages need it:
/// normalized whitespace, trailing periods dropped, and one pair of
/// parentheses removed when it wraps the entire value.
pub fn clean_field(s: &str) -> String {
    fn trim_periods(s: &mut String) {
        while s.ends_with('.') {
            s.pop();
        }
    }

    let mut out = normalize_ws(s);
    trim_periods(&mut out);
    if out.starts_with('(') && out.ends_with(')') && out.len() >= 2 {
        out = out[1..out.len() - 1].trim().to_string();
        trim_periods(&mut out);
    }
    out
}

/// Text after the first occurrence of `label`, cleaned; `None` if the label is absent.
pub fn value_after(text: &str, label: &str) -> Option<String> {
    text.find(label).map(|i| clean_field(&text[i + label.len()..]))
}

/// Leading ASCII digits of `s` (after leading whitespace), if any.
pub fn leading_digits(s: &str) -> Option<&str> {
    let t = s.trim_start();
    let end = t.find(|c: char| !c.is_ascii_digit()).unwrap_or(t.len());
    if end == 0 { None } else { Some(&t[..end]) }
}
