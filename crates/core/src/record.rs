use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::grade::CanonicalGrade;

/// One row of the course table, as far as it could be read.
/// A record only exists once a course code and a recognizable grade were
/// found; units, section, and instructor stay optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    /// Canonical spacing, e.g. "IT 311".
    pub course_code: String,
    pub units: Option<u32>,
    pub grade: Option<CanonicalGrade>,
    pub section: Option<String>,
    pub instructor: Option<String>,
    /// The grade token as OCR produced it, kept for auditing the snap.
    pub raw_grade_token: Option<String>,
}

/// Why a line could not become a `CourseRecord`, or why a located metadata
/// token could not be normalized. Closed taxonomy — diagnostics only,
/// never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoRowNumber,
    CodeNotFound,
    GradeNotFound,
    UnparseableYear,
    UnparseableSemester,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoRowNumber => write!(f, "no_row_number"),
            SkipReason::CodeNotFound => write!(f, "code_not_found"),
            SkipReason::GradeNotFound => write!(f, "grade_not_found"),
            SkipReason::UnparseableYear => write!(f, "unparseable_year"),
            SkipReason::UnparseableSemester => write!(f, "unparseable_semester"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipEntry {
    pub reason: SkipReason,
    pub raw_line: String,
}

impl SkipEntry {
    pub fn new(reason: SkipReason, raw_line: impl Into<String>) -> Self {
        Self { reason, raw_line: raw_line.into() }
    }
}

/// Everything the course-table scan produced: records in document order,
/// the skip log, and the codes dropped by the exclusion rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseTable {
    pub records: Vec<CourseRecord>,
    pub skips: Vec<SkipEntry>,
    pub excluded_codes: BTreeSet<String>,
}

/// Identity and enrollment metadata, normalized to one schema regardless
/// of which document shape (COE or COG) it came from. Unmatched fields
/// are empty strings, never errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Digits only.
    pub sr_code: String,
    pub full_name: String,
    pub college: String,
    pub program_raw: String,
    /// Always "YYYY-YYYY" when present.
    pub academic_year: String,
    /// One of "1st", "2nd", "midyear", "summer" when present.
    pub semester: String,
    /// One of "1".."4" when present.
    pub year_level: String,
}
