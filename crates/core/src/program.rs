use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

fn re_year_suffix() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| {
        Regex::new(r"(?i)/\s*(FIRST|SECOND|THIRD|FOURTH|1ST|2ND|3RD|4TH|[1-4])\s*$")
            .expect("invalid regex")
    })
}

fn re_bs_prefix() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"(?i)^\s*B\.?\s*S\.?\s+(.*)$").expect("invalid regex"))
}

/// A composite program string taken apart: base degree program,
/// specialization track, and the year-level ordinal word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDecomposition {
    pub base_program: String,
    /// Upper-cased specialization, empty when the program has none.
    pub track: String,
    /// Year ordinal word (FIRST..FOURTH), empty when absent.
    pub year_word: String,
}

fn year_ordinal_word(tok: &str) -> &'static str {
    match tok.to_uppercase().as_str() {
        "1" | "1ST" | "FIRST" => "FIRST",
        "2" | "2ND" | "SECOND" => "SECOND",
        "3" | "3RD" | "THIRD" => "THIRD",
        "4" | "4TH" | "FOURTH" => "FOURTH",
        _ => "",
    }
}

/// Re-normalize any "B.S." spelling variant to a plain "BS " prefix.
fn normalize_bs_prefix(text: &str) -> String {
    match re_bs_prefix().captures(text.trim()) {
        Some(c) => format!("BS {}", c[1].trim()),
        None => text.trim().to_string(),
    }
}

/// Decompose a raw program string like
/// `"BS Information Technology -NETWORKING/THIRD"` into its parts.
///
/// The trailing `/<year>` suffix is split off first. The remainder yields
/// a track only when it looks like a degree program (a B.S. variant or a
/// "BACHELOR" title) and contains a hyphen separator; the text after the
/// last hyphen is the track, upper-cased.
pub fn split_program(raw: &str) -> ProgramDecomposition {
    let s = raw.trim();

    let (left, year_word) = match re_year_suffix().captures(s) {
        Some(c) => {
            let m = c.get(0).expect("whole match");
            (s[..m.start()].trim_end(), year_ordinal_word(&c[1]).to_string())
        }
        None => (s, String::new()),
    };

    let left_upper = left.to_uppercase();
    let has_bs_prefix = re_bs_prefix().is_match(left) || left_upper.starts_with("BS ");
    let has_bachelor = left_upper.contains("BACHELOR");

    // Most inputs have been scrubbed to ASCII already, but a stray en-dash
    // still counts as a track separator.
    let sep_idx = match (left.rfind('-'), left.rfind('\u{2013}')) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    if let (Some(idx), true) = (sep_idx, has_bs_prefix || has_bachelor) {
        let sep_len = left[idx..].chars().next().map_or(1, char::len_utf8);
        let base_candidate = left[..idx].trim();
        let track = left[idx + sep_len..].trim().to_uppercase();
        let base = if has_bs_prefix {
            normalize_bs_prefix(base_candidate)
        } else {
            base_candidate.to_string()
        };
        ProgramDecomposition { base_program: base, track, year_word }
    } else {
        let base = if has_bs_prefix {
            normalize_bs_prefix(left)
        } else {
            left.trim().to_string()
        };
        ProgramDecomposition { base_program: base, track: String::new(), year_word }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_track_and_year() {
        let d = split_program("BS Information Technology -NETWORKING/THIRD");
        assert_eq!(d.base_program, "BS Information Technology");
        assert_eq!(d.track, "NETWORKING");
        assert_eq!(d.year_word, "THIRD");
    }

    #[test]
    fn dotted_bs_prefix_normalized() {
        let d = split_program("B.S. Information Technology - Business Analytics/2ND");
        assert_eq!(d.base_program, "BS Information Technology");
        assert_eq!(d.track, "BUSINESS ANALYTICS");
        assert_eq!(d.year_word, "SECOND");
    }

    #[test]
    fn bachelor_title_keeps_base_verbatim() {
        let d = split_program("Bachelor of Science in Nursing - Clinical/4");
        assert_eq!(d.base_program, "Bachelor of Science in Nursing");
        assert_eq!(d.track, "CLINICAL");
        assert_eq!(d.year_word, "FOURTH");
    }

    #[test]
    fn no_separator_means_empty_track() {
        let d = split_program("BS Computer Science/FIRST");
        assert_eq!(d.base_program, "BS Computer Science");
        assert_eq!(d.track, "");
        assert_eq!(d.year_word, "FIRST");
    }

    #[test]
    fn no_year_suffix() {
        let d = split_program("BS Information Technology");
        assert_eq!(d.base_program, "BS Information Technology");
        assert_eq!(d.track, "");
        assert_eq!(d.year_word, "");
    }

    #[test]
    fn hyphen_without_degree_marker_is_not_a_track() {
        let d = split_program("Mid-Wifery Program");
        assert_eq!(d.base_program, "Mid-Wifery Program");
        assert_eq!(d.track, "");
    }

    #[test]
    fn last_separator_wins() {
        let d = split_program("BS Arts - Design - ANIMATION/1ST");
        assert_eq!(d.base_program, "BS Arts - Design");
        assert_eq!(d.track, "ANIMATION");
        assert_eq!(d.year_word, "FIRST");
    }

    #[test]
    fn empty_input() {
        let d = split_program("");
        assert_eq!(d.base_program, "");
        assert_eq!(d.track, "");
        assert_eq!(d.year_word, "");
    }
}
