/// Find the first HTTP/HTTPS URL in free-form text.
///
/// Returns the raw substring, scheme included, extending to the next
/// whitespace character. The slice borrows from `text` so callers can
/// substitute the exact occurrence later.
pub fn extract_url(text: &str) -> Option<&str> {
    let lower = text.to_ascii_lowercase();
    let mut search = 0;

    while let Some(pos) = lower[search..].find("http") {
        let start = search + pos;
        if at_word_boundary(text, start)
            && let Some(url) = match_url_token(&text[start..])
        {
            return Some(url);
        }
        search = start + "http".len();
    }

    None
}

fn at_word_boundary(text: &str, start: usize) -> bool {
    text[..start]
        .chars()
        .next_back()
        .is_none_or(|c| !c.is_ascii_alphanumeric())
}

/// Match `https?://` (case-insensitive) plus at least one non-whitespace
/// character at the start of `s`.
fn match_url_token(s: &str) -> Option<&str> {
    let scheme = ["https://", "http://"].into_iter().find(|scheme| {
        s.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })?;

    let rest = &s[scheme.len()..];
    let end = rest
        .find(char::is_whitespace)
        .map_or(s.len(), |i| scheme.len() + i);

    if end > scheme.len() {
        Some(&s[..end])
    } else {
        None
    }
}
