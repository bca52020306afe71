use regex::RegexBuilder;

/// Returns true if `target` occurs in `transcript` as a whole token.
///
/// Matching is case-insensitive and the token must be bounded on both sides
/// by a non-letter or by the ends of the transcript, so "a cat ran" matches
/// "cat" but "cats" does not. Words of a multi-word target may be separated
/// by any run of whitespace. Empty input on either side never matches.
pub fn is_match(transcript: &str, target: &str) -> bool {
    let target = target.trim();
    if target.is_empty() || transcript.trim().is_empty() {
        return false;
    }

    let body = target
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let pattern = format!(r"(?:^|[^\p{{L}}]){body}(?:[^\p{{L}}]|$)");

    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(regex) => regex.is_match(transcript),
        Err(e) => {
            tracing::warn!("Could not build match pattern for {:?}: {}", target, e);
            false
        }
    }
}
