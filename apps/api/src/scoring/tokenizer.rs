use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

// Letters plus `+ # .` so "c++", "c#", ".net" and "node.js" stay whole.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z+#.]+").expect("token pattern is valid"));

/// Extracts the distinct lowercase tokens of `text`.
///
/// Trailing dots are trimmed so sentence punctuation does not stick to the word before it.
pub fn tokenize(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().trim_end_matches('.'))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
