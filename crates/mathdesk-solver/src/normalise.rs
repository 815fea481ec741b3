//! Rewrites word operators and filler phrases into symbolic form before parsing.

use regex::Regex;
use std::sync::OnceLock;

fn lazy_rewrite_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            // Leading filler: "what is 2 plus 2?"
            (r"^\s*(what\s+is|what's|calculate|compute|evaluate|solve)\s+", ""),
            (r"\?\s*$", ""),
            (r"\bto\s+the\s+power\s+of\b", "^"),
            // Infix "2 power 3"; the power(...) command is dispatched before this runs
            (r"\bpow(er)?\b", "^"),
            (r"\b(multiplied\s+by|multiply|times)\b", "*"),
            (r"\b(divided\s+by|divide\s+by|over)\b", "/"),
            (r"\b(plus|add)\b", "+"),
            (r"\b(minus|subtract)\b", "-"),
            (r"\bsquared\b", "^2"),
            (r"\bcubed\b", "^3"),
            (r"\*\*", "^"),
            ("×", "*"),
            ("÷", "/"),
            (r"\s+", " "),
        ]
        .into_iter()
        .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), replacement))
        .collect()
    })
}

fn lazy_conjunction_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\band\b").unwrap())
}

/// Split normalised text on the word `and`, trimming each part.
pub fn split_conjunction(text: &str) -> Vec<&str> {
    lazy_conjunction_regex().split(text).map(str::trim).collect()
}

/// Lower-case the input and apply the rewrite rules in order.
pub fn normalise(input: &str) -> String {
    let mut text = input.to_lowercase();
    for (re, replacement) in lazy_rewrite_rules() {
        text = re.replace_all(&text, *replacement).into_owned();
    }
    text.trim().to_string()
}
