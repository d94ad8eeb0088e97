use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;

use gradecheck_core::CanonicalGrade;

macro_rules! re {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).unwrap())
        }
    };
}

re!(re_block, r"Grade\s*\{\s*([^}]*)\}");
re!(re_bare_token, r"\b(?:\d\.\d{2}|[345]|INC)\b");

/// Render a grade sequence in the reference wire format:
/// `Grade{` on its own line, one canonical grade per line, `}`.
pub fn render_grade_block(grades: &[CanonicalGrade]) -> String {
    let mut out = String::from("Grade{\n");
    for g in grades {
        // writing to a String cannot fail
        let _ = writeln!(out, "{g}");
    }
    out.push_str("}\n");
    out
}

/// Parse a grade sequence from reference text. Prefers the braced
/// `Grade{...}` block; if no block is present, falls back to scanning the
/// whole text for bare grade tokens. Tokens that are not canonical grades
/// are skipped.
pub fn parse_grade_block(text: &str) -> Vec<CanonicalGrade> {
    if let Some(caps) = re_block().captures(text) {
        return caps[1]
            .split_whitespace()
            .filter_map(|t| t.parse().ok())
            .collect();
    }
    re_bare_token()
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}
