//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Whether a link target may be emitted into an `href`/`src`
///
/// Allows `http`, `https`, `mailto` and site-relative paths. Anything else
/// (`javascript:`, `data:`, protocol-relative `//host` or `/\host`) is
/// rejected.
pub fn is_safe_url(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() {
        return false;
    }
    if url.starts_with('/') {
        return !url.starts_with("//") && !url.starts_with("/\\");
    }
    if url.starts_with('#') {
        return true;
    }
    match url.split_once(':') {
        Some((scheme, _)) => {
            let scheme = scheme.to_ascii_lowercase();
            matches!(scheme.as_str(), "http" | "https" | "mailto")
        }
        None => !url.contains('\\'),
    }
}

/// Count whitespace-separated words
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}
