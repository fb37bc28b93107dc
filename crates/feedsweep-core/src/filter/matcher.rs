/// Case-insensitive substring match against any of `patterns`
///
/// An empty pattern list never matches: an unset criterion must not select
/// anything. No regex, anchoring or word boundaries.
pub fn matches(text: &str, patterns: &[String]) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let text = text.to_lowercase();
    patterns
        .iter()
        .any(|pattern| text.contains(&pattern.to_lowercase()))
}
