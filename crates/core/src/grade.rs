use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_inc_fuzzy, r"(?i)^I[\W_]*N[\W_]*C$");
re!(re_three_digits, r"^(\d)(\d{2})$");
re!(re_decimal, r"^(\d)\.(\d{2})$");
re!(re_weird_sep, r"^(\d)[,·•:;](\d{2})$");
re!(re_integer_grade, r"^([345])(?:\.00)?$");

/// The closed set of grade symbols the registrar issues. Nothing outside
/// this set may ever come out of normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalGrade {
    #[serde(rename = "1.00")]
    G100,
    #[serde(rename = "1.25")]
    G125,
    #[serde(rename = "1.50")]
    G150,
    #[serde(rename = "1.75")]
    G175,
    #[serde(rename = "2.00")]
    G200,
    #[serde(rename = "2.25")]
    G225,
    #[serde(rename = "2.50")]
    G250,
    #[serde(rename = "2.75")]
    G275,
    #[serde(rename = "3.00")]
    G300,
    #[serde(rename = "4.00")]
    G400,
    #[serde(rename = "5.00")]
    G500,
    #[serde(rename = "INC")]
    Inc,
}

/// Allowed numeric grades in ascending order, as hundredths.
/// Order matters: the snap scan keeps the first (lower) value on a tie.
const DECIMAL_TABLE: [(CanonicalGrade, i32); 11] = [
    (CanonicalGrade::G100, 100),
    (CanonicalGrade::G125, 125),
    (CanonicalGrade::G150, 150),
    (CanonicalGrade::G175, 175),
    (CanonicalGrade::G200, 200),
    (CanonicalGrade::G225, 225),
    (CanonicalGrade::G250, 250),
    (CanonicalGrade::G275, 275),
    (CanonicalGrade::G300, 300),
    (CanonicalGrade::G400, 400),
    (CanonicalGrade::G500, 500),
];

impl CanonicalGrade {
    /// Numeric value in hundredths (e.g. 1.75 → 175). `None` for INC.
    pub fn hundredths(self) -> Option<i32> {
        DECIMAL_TABLE
            .iter()
            .find(|(g, _)| *g == self)
            .map(|(_, h)| *h)
    }

    pub fn is_numeric(self) -> bool {
        self != CanonicalGrade::Inc
    }
}

impl std::fmt::Display for CanonicalGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.hundredths() {
            Some(h) => write!(f, "{}.{:02}", h / 100, h % 100),
            None => write!(f, "INC"),
        }
    }
}

impl std::str::FromStr for CanonicalGrade {
    type Err = String;

    /// Accepts the canonical forms plus the bare integers `3`, `4`, `5`
    /// that older result files carry for the unsuffixed passing grades.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.00" => Ok(CanonicalGrade::G100),
            "1.25" => Ok(CanonicalGrade::G125),
            "1.50" => Ok(CanonicalGrade::G150),
            "1.75" => Ok(CanonicalGrade::G175),
            "2.00" => Ok(CanonicalGrade::G200),
            "2.25" => Ok(CanonicalGrade::G225),
            "2.50" => Ok(CanonicalGrade::G250),
            "2.75" => Ok(CanonicalGrade::G275),
            "3.00" | "3" => Ok(CanonicalGrade::G300),
            "4.00" | "4" => Ok(CanonicalGrade::G400),
            "5.00" | "5" => Ok(CanonicalGrade::G500),
            "INC" => Ok(CanonicalGrade::Inc),
            other => Err(format!("not a canonical grade: '{other}'")),
        }
    }
}

/// Snap a noisy reading (in hundredths) to the nearest allowed decimal.
/// Ties break toward the lower value via the strict `<` on an ascending
/// table.
fn nearest_allowed(hundredths: i32) -> CanonicalGrade {
    let mut best = DECIMAL_TABLE[0];
    for cand in DECIMAL_TABLE.iter().skip(1) {
        if (cand.1 - hundredths).abs() < (best.1 - hundredths).abs() {
            best = *cand;
        }
    }
    best.0
}

/// OCR routinely mangles "INC": dropped strokes, stray separators,
/// 1-for-I substitution.
fn is_inc_variant(tok: &str) -> bool {
    let compact = tok.to_uppercase().replace(' ', "");
    matches!(compact.as_str(), "INC" | "IINC" | "1NC") || re_inc_fuzzy().is_match(tok)
}

fn snap_parts(whole: &str, frac: &str) -> Option<CanonicalGrade> {
    let w: i32 = whole.parse().ok()?;
    let f: i32 = frac.parse().ok()?;
    Some(nearest_allowed(w * 100 + f))
}

/// Map an arbitrary OCR token to a canonical grade, or reject it.
///
/// Priority order: fuzzy INC, three bare digits read as `D.DD`, canonical
/// decimal, weird-separator decimal (all three snapped to the nearest
/// allowed value), slash/pipe/backslash alternative readings, exact
/// membership. Anything else is `None` — callers treat that as "grade not
/// found", never as an error.
pub fn normalize_grade_token(token: &str) -> Option<CanonicalGrade> {
    let t = token.trim();
    if t.is_empty() {
        return None;
    }

    if is_inc_variant(t) {
        return Some(CanonicalGrade::Inc);
    }

    // "175" → 1.75: a dropped decimal point is the most common table noise.
    if let Some(c) = re_three_digits().captures(t) {
        return snap_parts(&c[1], &c[2]);
    }

    if let Some(c) = re_decimal().captures(t) {
        return snap_parts(&c[1], &c[2]);
    }

    if let Some(c) = re_weird_sep().captures(t) {
        return snap_parts(&c[1], &c[2]);
    }

    // Alternative readings like "3/4" or "INC|1.00": an INC variant wins,
    // otherwise the first bare integer passing grade does.
    if t.contains(['/', '\\', '|']) {
        let parts: Vec<&str> = t
            .split(['/', '\\', '|'])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.iter().any(|p| is_inc_variant(p)) {
            return Some(CanonicalGrade::Inc);
        }
        for p in parts {
            if re_integer_grade().is_match(p) {
                return p.trim_end_matches(".00").parse().ok();
            }
        }
        return None;
    }

    // Exact membership only: "3" alone is not a table token, so require the
    // canonical rendering to match the input byte-for-byte.
    t.parse::<CanonicalGrade>()
        .ok()
        .filter(|g| g.to_string() == t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_forms_are_idempotent() {
        for s in [
            "1.00", "1.25", "1.50", "1.75", "2.00", "2.25", "2.50", "2.75", "3.00", "4.00",
            "5.00", "INC",
        ] {
            let g = normalize_grade_token(s).unwrap();
            assert_eq!(g.to_string(), s, "round trip for {s}");
        }
    }

    #[test]
    fn three_bare_digits_read_as_decimal() {
        assert_eq!(normalize_grade_token("175"), Some(CanonicalGrade::G175));
        assert_eq!(normalize_grade_token("250"), Some(CanonicalGrade::G250));
        assert_eq!(normalize_grade_token("100"), Some(CanonicalGrade::G100));
    }

    #[test]
    fn near_miss_decimals_snap() {
        // 2.10 is 0.10 from 2.00 and 0.15 from 2.25.
        assert_eq!(normalize_grade_token("2.10"), Some(CanonicalGrade::G200));
        assert_eq!(normalize_grade_token("1.80"), Some(CanonicalGrade::G175));
        assert_eq!(normalize_grade_token("3.60"), Some(CanonicalGrade::G400));
        // Even an out-of-range reading snaps to the nearest table value.
        assert_eq!(normalize_grade_token("6.00"), Some(CanonicalGrade::G500));
    }

    #[test]
    fn snap_tie_prefers_lower() {
        // 1.125 in hundredths is equidistant from 1.00 and 1.25.
        assert_eq!(nearest_allowed(112), CanonicalGrade::G100);
        assert_eq!(nearest_allowed(113), CanonicalGrade::G125);
    }

    #[test]
    fn inc_variants() {
        assert_eq!(normalize_grade_token("INC"), Some(CanonicalGrade::Inc));
        assert_eq!(normalize_grade_token("1NC"), Some(CanonicalGrade::Inc));
        assert_eq!(normalize_grade_token("iinc"), Some(CanonicalGrade::Inc));
        assert_eq!(normalize_grade_token("I-N-C"), Some(CanonicalGrade::Inc));
        assert_eq!(normalize_grade_token("i n c"), Some(CanonicalGrade::Inc));
    }

    #[test]
    fn weird_separators_snap() {
        assert_eq!(normalize_grade_token("1,75"), Some(CanonicalGrade::G175));
        assert_eq!(normalize_grade_token("2:50"), Some(CanonicalGrade::G250));
        assert_eq!(normalize_grade_token("2;50"), Some(CanonicalGrade::G250));
    }

    #[test]
    fn slash_alternatives() {
        assert_eq!(normalize_grade_token("3/4"), Some(CanonicalGrade::G300));
        assert_eq!(normalize_grade_token("4.00|5"), Some(CanonicalGrade::G400));
        assert_eq!(normalize_grade_token("INC/3"), Some(CanonicalGrade::Inc));
        assert_eq!(normalize_grade_token(r"1NC\2"), Some(CanonicalGrade::Inc));
        // Non-integer alternatives do not resolve.
        assert_eq!(normalize_grade_token("1.75/2.00"), None);
    }

    #[test]
    fn unrecognized_tokens_rejected() {
        assert_eq!(normalize_grade_token("XYZ"), None);
        assert_eq!(normalize_grade_token(""), None);
        assert_eq!(normalize_grade_token("12"), None);
        assert_eq!(normalize_grade_token("1234"), None);
    }

    #[test]
    fn integer_passing_grades_never_snap() {
        // Bare 3/4/5 only resolve through the alternatives path or exact
        // membership — "3" alone is not a table token.
        assert_eq!(normalize_grade_token("3.00"), Some(CanonicalGrade::G300));
        assert_eq!(normalize_grade_token("5.00"), Some(CanonicalGrade::G500));
        assert_eq!(normalize_grade_token("3"), None);
        assert_eq!(normalize_grade_token("5"), None);
    }

    #[test]
    fn hundredths_values() {
        assert_eq!(CanonicalGrade::G175.hundredths(), Some(175));
        assert_eq!(CanonicalGrade::Inc.hundredths(), None);
        assert!(!CanonicalGrade::Inc.is_numeric());
    }

    #[test]
    fn serde_uses_display_strings() {
        let json = serde_json::to_string(&CanonicalGrade::G150).unwrap();
        assert_eq!(json, "\"1.50\"");
        let back: CanonicalGrade = serde_json::from_str("\"INC\"").unwrap();
        assert_eq!(back, CanonicalGrade::Inc);
    }
}
