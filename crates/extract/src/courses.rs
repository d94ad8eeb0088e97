use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use gradecheck_core::record::{CourseRecord, CourseTable, SkipEntry, SkipReason};
use gradecheck_core::{normalize_grade_token, scrub_ocr_noise};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_code_prefix, r"^[A-Za-z]{2,6}$");
re!(re_code_number, r"^\d{3}$");
re!(re_bare_integer, r"^\d+$");
re!(re_section, r"^[A-Za-z]+-[A-Za-z]+-\d{2,4}$");

/// First token of the table header line and the terminal sentinel row, as
/// the registrar's print layout emits them.
const TABLE_HEADER: &str = "# Course Code";
const TABLE_SENTINEL: &str = "** NOTHING FOLLOWS **";

/// Course codes dropped from records and totals even when well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionSet(BTreeSet<String>);

impl Default for ExclusionSet {
    /// NSTP courses appear on the report card but are outside the weighted
    /// average by university rule.
    fn default() -> Self {
        Self(["NSTP 111", "NSTP 121"].map(String::from).into())
    }
}

impl ExclusionSet {
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains(code)
    }
}

impl FromIterator<String> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    SeekingHeader,
    InTable,
}

/// Scan line-oriented OCR text for the course table and extract one record
/// per readable row. Lines that cannot be read are logged with a reason
/// and never abort the scan; an input with no table header simply yields
/// zero records.
pub fn extract_course_records(text: &str, exclusions: &ExclusionSet) -> CourseTable {
    let cleaned = scrub_ocr_noise(text);
    let mut table = CourseTable::default();
    let mut state = ScanState::SeekingHeader;

    for line in cleaned.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match state {
            ScanState::SeekingHeader => {
                if line.starts_with(TABLE_HEADER) {
                    state = ScanState::InTable;
                }
            }
            ScanState::InTable => {
                if line.starts_with(TABLE_SENTINEL) {
                    continue;
                }
                scan_row(line, exclusions, &mut table);
            }
        }
    }
    table
}

fn scan_row(line: &str, exclusions: &ExclusionSet, table: &mut CourseTable) {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let leading_number = tokens.first().is_some_and(|t| re_bare_integer().is_match(t));
    if !leading_number {
        tracing::debug!(reason = %SkipReason::NoRowNumber, line, "skipped table line");
        table.skips.push(SkipEntry::new(SkipReason::NoRowNumber, line));
        return;
    }

    // Course code is an adjacent letters/digits token pair anywhere past
    // the row number, e.g. "IT" "311".
    let code_idx = (1..tokens.len().saturating_sub(1)).find(|&i| {
        re_code_prefix().is_match(tokens[i]) && re_code_number().is_match(tokens[i + 1])
    });
    let Some(code_idx) = code_idx else {
        tracing::debug!(reason = %SkipReason::CodeNotFound, line, "skipped table line");
        table.skips.push(SkipEntry::new(SkipReason::CodeNotFound, line));
        return;
    };
    let course_code = format!("{} {}", tokens[code_idx].to_uppercase(), tokens[code_idx + 1]);

    if exclusions.contains(&course_code) {
        table.excluded_codes.insert(course_code);
        return;
    }

    // Units: first bare integer after the code pair; the grade candidate
    // sits right after it.
    let rest = &tokens[code_idx + 2..];
    let units_pos = rest.iter().position(|t| re_bare_integer().is_match(t));
    let units = units_pos.and_then(|p| rest[p].parse::<u32>().ok());
    let candidate = units_pos.and_then(|p| rest.get(p + 1).copied());

    let mut raw_grade_token = None;
    let mut grade = None;
    if let Some(tok) = candidate {
        if let Some(g) = normalize_grade_token(tok) {
            raw_grade_token = Some(tok.to_string());
            grade = Some(g);
        }
    }
    if grade.is_none() {
        // Fall back to the first recognizable token scanning from the end.
        // Only tokens past the code pair count — the 3-digit code number
        // would otherwise read as a grade.
        for tok in rest.iter().rev() {
            if let Some(g) = normalize_grade_token(tok) {
                raw_grade_token = Some(tok.to_string());
                grade = Some(g);
                break;
            }
        }
    }
    let Some(grade) = grade else {
        tracing::debug!(reason = %SkipReason::GradeNotFound, line, "skipped table line");
        table.skips.push(SkipEntry::new(SkipReason::GradeNotFound, line));
        return;
    };

    let section_pos = rest.iter().position(|t| re_section().is_match(t));
    let section = section_pos.map(|p| rest[p].to_uppercase());
    let instructor = section_pos
        .map(|p| rest[p + 1..].join(" "))
        .filter(|s| !s.is_empty());

    table.records.push(CourseRecord {
        course_code,
        units,
        grade: Some(grade),
        section,
        instructor,
        raw_grade_token,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradecheck_core::CanonicalGrade;

    const SAMPLE: &str = "\
Fullname : DELA CRUZ, JUAN M.  SRCODE : 21-04738
# Course Code Course Title Units Grade Section Instructor
1 IT 311 Systems Integration and Architecture 3 1.50 IT-BA-2024 Dela Cruz
2 CS 101 Intro to Computing 3 INC IT-BA-2024 Reyes
** NOTHING FOLLOWS **";

    #[test]
    fn extracts_rows_after_header() {
        let t = extract_course_records(SAMPLE, &ExclusionSet::none());
        assert_eq!(t.records.len(), 2);
        assert!(t.skips.is_empty());

        let r = &t.records[0];
        assert_eq!(r.course_code, "IT 311");
        assert_eq!(r.units, Some(3));
        assert_eq!(r.grade, Some(CanonicalGrade::G150));
        assert_eq!(r.section.as_deref(), Some("IT-BA-2024"));
        assert_eq!(r.instructor.as_deref(), Some("Dela Cruz"));

        assert_eq!(t.records[1].grade, Some(CanonicalGrade::Inc));
    }

    #[test]
    fn no_header_yields_no_records() {
        let t = extract_course_records("1 IT 311 Something 3 1.50", &ExclusionSet::none());
        assert!(t.records.is_empty());
        assert!(t.skips.is_empty());
    }

    #[test]
    fn empty_input_is_fine() {
        let t = extract_course_records("", &ExclusionSet::none());
        assert!(t.records.is_empty());
    }

    #[test]
    fn line_without_row_number_is_skipped() {
        let text = "# Course Code Course Title\nIT 311 Systems Integration 3 1.50";
        let t = extract_course_records(text, &ExclusionSet::none());
        assert!(t.records.is_empty());
        assert_eq!(t.skips.len(), 1);
        assert_eq!(t.skips[0].reason, SkipReason::NoRowNumber);
        assert!(t.skips[0].raw_line.contains("IT 311"));
    }

    #[test]
    fn line_without_code_is_skipped() {
        let text = "# Course Code\n1 Systems Integration 1.50";
        let t = extract_course_records(text, &ExclusionSet::none());
        assert_eq!(t.skips.len(), 1);
        assert_eq!(t.skips[0].reason, SkipReason::CodeNotFound);
    }

    #[test]
    fn line_without_grade_is_skipped() {
        let text = "# Course Code\n2 IT 311 Systems Integration Section";
        let t = extract_course_records(text, &ExclusionSet::none());
        assert_eq!(t.skips.len(), 1);
        assert_eq!(t.skips[0].reason, SkipReason::GradeNotFound);
    }

    #[test]
    fn noisy_grade_tokens_normalize() {
        let text = "# Course Code\n1 IT 311 Platform Technologies 3 175 IT-BA-2024 Cruz";
        let t = extract_course_records(text, &ExclusionSet::none());
        assert_eq!(t.records[0].grade, Some(CanonicalGrade::G175));
        assert_eq!(t.records[0].raw_grade_token.as_deref(), Some("175"));
    }

    #[test]
    fn excluded_codes_dropped_and_remembered() {
        let text = "\
# Course Code
1 IT 311 Systems Integration 3 1.50 IT-BA-2024 Cruz
3 NSTP 111 National Service Training 3 1.00 IT-BA-2024 Santos";
        let t = extract_course_records(text, &ExclusionSet::default());
        assert_eq!(t.records.len(), 1);
        assert!(t.excluded_codes.contains("NSTP 111"));
        assert!(t.skips.is_empty());
    }

    #[test]
    fn sentinel_line_is_not_a_skip() {
        let text = "# Course Code\n** NOTHING FOLLOWS **";
        let t = extract_course_records(text, &ExclusionSet::none());
        assert!(t.records.is_empty());
        assert!(t.skips.is_empty());
    }

    #[test]
    fn lowercase_code_upper_cased() {
        let text = "# Course Code\n1 it 311 Systems Integration 3 2.00";
        let t = extract_course_records(text, &ExclusionSet::none());
        assert_eq!(t.records[0].course_code, "IT 311");
    }
}
