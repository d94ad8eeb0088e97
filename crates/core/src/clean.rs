use std::sync::OnceLock;

use regex::Regex;

fn re_hspace() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"[ \t]+").expect("invalid regex"))
}

fn re_comma() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"\s*,\s*").expect("invalid regex"))
}

/// Fold common OCR punctuation noise into plain ASCII before any pattern
/// matching: non-breaking spaces, smart quotes, en/em dashes, ragged
/// whitespace, and comma spacing. Pure and total — garbage in, cleaner
/// garbage out.
pub fn scrub_ocr_noise(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let t = s
        .replace('\u{2013}', "-")
        .replace('\u{2014}', "-")
        .replace('\u{00A0}', " ")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"");
    let t = re_hspace().replace_all(&t, " ");
    re_comma().replace_all(&t, ", ").into_owned()
}
