use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use gradecheck_core::record::{DocumentMetadata, SkipEntry, SkipReason};
use gradecheck_core::scrub_ocr_noise;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// Most specific first: semester and academic year co-located on one line,
// as the COE prints them ("SECOND, A.Y. 2023-2024").
re!(re_coe_sem_ay,
    r"(?i)\b(FIRST|SECOND|1ST|2ND|MID[- ]?YEAR|SUMMER)\b\s*[, ]\s*(?:A\.?\s*Y\.?|S\.?\s*Y\.?)?\s*(20\d{2}\s*[-/]\s*20\d{2})");
re!(re_label_semester, r"(?i)\bSemester\s*:?\s*([A-Za-z0-9\- ]+)");
re!(re_label_ay,
    r"(?i)(?:A\.?\s*Y\.?|S\.?\s*Y\.?|Academic\s*Year\s*:?)\s*(20\d{2}\s*[-/]\s*20\d{2})");
re!(re_label_ay_loose, r"(?i)\bAcademic\s*Year\s*:?\s*([^:\n]+)");
re!(re_any_year_range, r"(20\d{2})\s*[-/]\s*(20\d{2})");
re!(re_label_sr_code, r"(?i)\bSR\s*Code\s*:?\s*([A-Za-z0-9\- ]+)");
re!(re_label_srcode, r"(?i)\bSRCODE\s*:?\s*([A-Za-z0-9\- ]+)");
re!(re_slash_year, r"(?i)/\s*(FIRST|SECOND|THIRD|FOURTH|1ST|2ND|3RD|4TH)\b");
re!(re_label_year_level, r"(?i)\bYear\s*Level\s*:?\s*([A-Za-z0-9\- ]+)");
re!(re_coe_name, r"(?i)\bName\s*:?\s*([A-Z ,']+\s+[A-Z0]\.?)");
re!(re_coe_program, r"(?i)\bProgram\s*:?\s*([^\n\r]*)");
re!(re_cog_fullname, r"(?i)\bFullname\s*:?\s*([^:\n]+)");
re!(re_cog_college, r"(?i)\bCollege\s*:?\s*([^:\n]+)");
re!(re_cog_program, r"(?i)\bProgram\s*:?\s*([^:\n]+)");
re!(re_semester_word, r"(?i)\b(FIRST|SECOND|1ST|2ND|MID[- ]?YEAR|SUMMER|[12])\b");
re!(re_year_level_word, r"(?i)\b(FIRST|SECOND|THIRD|FOURTH|1ST|2ND|3RD|4TH|[1-4])\b");
re!(re_trailing_label, r"(?i)\s*\b(SR\s*CODE|SRCODE|Academic\s*Year|Semester|Year\s*Level)\b.*$");

/// A metadata extraction result: the normalized fields plus any tokens
/// that were located but failed normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataExtraction {
    pub metadata: DocumentMetadata,
    pub issues: Vec<SkipEntry>,
}

// ── Token normalizers ────────────────────────────────────────────────────────

fn digits_only(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

fn norm_acad_year(s: &str) -> Option<String> {
    let c = re_any_year_range().captures(s)?;
    Some(format!("{}-{}", &c[1], &c[2]))
}

fn norm_semester(s: &str) -> Option<String> {
    let up = s.to_uppercase();
    if up.contains("MID") && up.contains("YEAR") {
        return Some("midyear".to_string());
    }
    let c = re_semester_word().captures(&up)?;
    match &c[1] {
        "FIRST" | "1ST" | "1" => Some("1st".to_string()),
        "SECOND" | "2ND" | "2" => Some("2nd".to_string()),
        "SUMMER" => Some("summer".to_string()),
        _ => Some("midyear".to_string()),
    }
}

fn norm_year_level(s: &str) -> Option<String> {
    let up = s.to_uppercase();
    let c = re_year_level_word().captures(&up)?;
    let n = match &c[1] {
        "FIRST" | "1ST" | "1" => "1",
        "SECOND" | "2ND" | "2" => "2",
        "THIRD" | "3RD" | "3" => "3",
        _ => "4",
    };
    Some(n.to_string())
}

/// Run a token through its normalizer, degrading to empty and recording
/// the reason when a located token fails to normalize.
fn resolve(
    raw: Option<&str>,
    norm: impl Fn(&str) -> Option<String>,
    reason: SkipReason,
    issues: &mut Vec<SkipEntry>,
) -> String {
    match raw {
        None => String::new(),
        Some(tok) => match norm(tok) {
            Some(v) => v,
            None => {
                tracing::debug!(%reason, token = tok, "metadata token failed normalization");
                issues.push(SkipEntry::new(reason, tok.trim()));
                String::new()
            }
        },
    }
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Academic-year fallback chain: strict labeled range, then whatever text
/// follows the label (reported when unparseable), then any bare year range
/// in the document.
fn academic_year_chain(txt: &str, issues: &mut Vec<SkipEntry>) -> String {
    if let Some(v) = capture(re_label_ay(), txt).and_then(|t| norm_acad_year(t)) {
        return v;
    }
    if let Some(tok) = capture(re_label_ay_loose(), txt) {
        match norm_acad_year(tok) {
            Some(v) => return v,
            None => {
                tracing::debug!(token = tok, "academic-year token failed normalization");
                issues.push(SkipEntry::new(SkipReason::UnparseableYear, tok.trim()));
            }
        }
    }
    re_any_year_range()
        .captures(txt)
        .map(|c| format!("{}-{}", &c[1], &c[2]))
        .unwrap_or_default()
}

// ── Certificate of Enrollment ────────────────────────────────────────────────

/// Extract metadata from the COE/registration-summary shape. Every field
/// degrades independently to an empty string.
pub fn extract_metadata_coe(raw_text: &str) -> MetadataExtraction {
    let txt = scrub_ocr_noise(raw_text);
    let mut issues = Vec::new();
    let mut meta = DocumentMetadata::default();

    // Semester + academic year co-located beats the per-label fallbacks.
    if let Some(c) = re_coe_sem_ay().captures(&txt) {
        meta.semester = resolve(
            Some(c.get(1).map(|m| m.as_str()).unwrap_or_default()),
            norm_semester,
            SkipReason::UnparseableSemester,
            &mut issues,
        );
        meta.academic_year = resolve(
            Some(c.get(2).map(|m| m.as_str()).unwrap_or_default()),
            norm_acad_year,
            SkipReason::UnparseableYear,
            &mut issues,
        );
    } else {
        meta.semester = resolve(
            capture(re_label_semester(), &txt),
            norm_semester,
            SkipReason::UnparseableSemester,
            &mut issues,
        );
        meta.academic_year = academic_year_chain(&txt, &mut issues);
    }

    meta.sr_code = capture(re_label_sr_code(), &txt)
        .or_else(|| capture(re_label_srcode(), &txt))
        .map(digits_only)
        .unwrap_or_default();

    // Year level rides the program string ("…/THIRD") on the COE; the
    // labeled field is the fallback.
    let yl = capture(re_slash_year(), &txt).or_else(|| capture(re_label_year_level(), &txt));
    meta.year_level = yl.and_then(|t| norm_year_level(t)).unwrap_or_default();

    if let Some(name) = capture(re_coe_name(), &txt) {
        meta.full_name = fix_coe_name(name);
    }
    if let Some(program) = capture(re_coe_program(), &txt) {
        meta.program_raw = truncate_at_fee_noise(program);
    }

    MetadataExtraction { metadata: meta, issues }
}

/// OCR reads the middle-initial "O" as a zero often enough to special-case;
/// the registrar always prints a trailing period.
fn fix_coe_name(raw: &str) -> String {
    static RE0: OnceLock<Regex> = OnceLock::new();
    let re0 = RE0.get_or_init(|| Regex::new(r"([A-Z ])0(\.|$)").expect("invalid regex"));
    let mut name = re0.replace_all(raw.trim(), "${1}O${2}").into_owned();
    if !name.ends_with('.') {
        name.push('.');
    }
    name
}

/// The COE program line runs into the assessment table; cut at the first
/// fee/discount word.
fn truncate_at_fee_noise(program: &str) -> String {
    const NOISE: [&str; 7] = [
        "Free Tuition", "Discount", "Fee", "Assessment", "Medical", "Dental", "Security",
    ];
    let mut out = program.trim();
    for w in NOISE {
        if let Some(idx) = out.find(w) {
            out = out[..idx].trim_end();
        }
    }
    out.to_string()
}

// ── Certificate of Grades ────────────────────────────────────────────────────

/// Extract metadata from the COG (copy-of-grades) shape, where every field
/// carries an explicit label but neighboring labels bleed into captures.
pub fn extract_metadata_cog(raw_text: &str) -> MetadataExtraction {
    let txt = scrub_ocr_noise(raw_text);
    let mut issues = Vec::new();
    let mut meta = DocumentMetadata::default();

    meta.sr_code = capture(re_label_srcode(), &txt)
        .or_else(|| capture(re_label_sr_code(), &txt))
        .map(digits_only)
        .unwrap_or_default();

    if let Some(name) = capture(re_cog_fullname(), &txt) {
        meta.full_name = strip_trailing_label(name);
    }
    if let Some(college) = capture(re_cog_college(), &txt) {
        meta.college = strip_trailing_label(college);
    }
    if let Some(program) = capture(re_cog_program(), &txt) {
        meta.program_raw = strip_trailing_label(program);
    }

    meta.academic_year = academic_year_chain(&txt, &mut issues);

    meta.semester = resolve(
        capture(re_label_semester(), &txt),
        norm_semester,
        SkipReason::UnparseableSemester,
        &mut issues,
    );

    meta.year_level = capture(re_label_year_level(), &txt)
        .and_then(|t| norm_year_level(t))
        .unwrap_or_default();

    MetadataExtraction { metadata: meta, issues }
}

/// Single-line OCR output chains labels together
/// ("College : ... Academic Year : ..."); drop everything from the next
/// label onward.
fn strip_trailing_label(s: &str) -> String {
    re_trailing_label().replace(s.trim(), "").trim().to_string()
}
