use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Serialize;

use gradecheck_core::record::{CourseRecord, DocumentMetadata, SkipEntry};
use gradecheck_core::{split_program, AggregateResult, CanonicalGrade, ProgramDecomposition};
use gradecheck_verify::{MetadataVerdict, TamperCheck};

// ── Weighted-grades table ────────────────────────────────────────────────────

/// Render the `Grades | Units | Weighted Grades` table: one row per course,
/// a `Total:` row, and the 4-dp weighted average (empty when no units parsed).
pub fn render_grade_with_units(agg: &AggregateResult) -> String {
    let mut out = vec!["Grades | Units | Weighted Grades |".to_string()];

    for row in &agg.rows {
        let grade = row.grade.map(|g| g.to_string()).unwrap_or_default();
        let units = row.units.map(|u| u.to_string()).unwrap_or_default();
        let weighted = row
            .weighted()
            .map(|w| w.normalize().to_string())
            .unwrap_or_default();
        out.push(format!("{grade:<6} | {units:<5} | {weighted:<14}|"));
    }

    let total_units = agg.total_units.to_string();
    let total_weighted = agg.total_weighted().normalize().to_string();
    out.push(format!("Total:   | {total_units:<5} | {total_weighted:<14}|"));

    let avg = agg
        .weighted_average
        .map(|a| format!("{a:.4}"))
        .unwrap_or_default();
    out.push(format!("Weighted Average: {avg}"));

    out.join("\n")
}

// ── Parsed-document summary ──────────────────────────────────────────────────

/// Human-readable summary of an extracted document: labeled metadata lines,
/// then one line per course record, then any skipped table lines.
pub fn render_document_summary(
    meta: &DocumentMetadata,
    records: &[CourseRecord],
    skips: &[SkipEntry],
) -> String {
    let mut out = String::new();
    out.push_str(&format!("Fullname : {} SRCODE : {}\n", meta.full_name, meta.sr_code));
    out.push_str(&format!(
        "College : {} Academic Year : {}\n",
        meta.college, meta.academic_year
    ));
    let program = split_program(&meta.program_raw);
    out.push_str(&format!(
        "Program : {} Semester : {}\n",
        program.base_program, meta.semester
    ));
    if !program.track.is_empty() {
        out.push_str(&format!("Track : {}\n", program.track));
    }
    out.push_str(&format!("Year Level : {}\n", meta.year_level));

    if !records.is_empty() {
        out.push_str("# Course Code Course Title Units Grade Section Instructor\n");
        for (i, r) in records.iter().enumerate() {
            let units = r.units.map(|u| u.to_string()).unwrap_or_default();
            let grade = r.grade.map(|g| g.to_string()).unwrap_or_default();
            let section = r.section.as_deref().unwrap_or_default();
            let instructor = r.instructor.as_deref().unwrap_or_default();
            out.push_str(
                format!(
                    "{} {} {units} {grade} {section} {instructor}\n",
                    i + 1,
                    r.course_code
                )
                .trim_end(),
            );
            out.push('\n');
        }
    }
    for s in skips {
        out.push_str(&format!("skipped ({}): {}\n", s.reason, s.raw_line));
    }
    out
}

// ── JSON transport shapes ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub hash: String,
    pub metadata: DocumentMetadata,
    /// `program_raw` taken apart into base program, track, and year word.
    pub program: ProgramDecomposition,
    pub metadata_issues: Vec<SkipEntry>,
    pub records: Vec<CourseRecord>,
    pub skips: Vec<SkipEntry>,
    pub excluded_codes: BTreeSet<String>,
    pub grades: Vec<CanonicalGrade>,
    pub total_units: u32,
    pub weighted_average: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct VerificationReport {
    /// Present only when both sides supplied metadata.
    pub metadata: Option<MetadataVerdict>,
    pub grades: TamperCheck,
    pub verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradecheck_core::record::CourseTable;
    use gradecheck_core::{aggregate_weighted_grades, CanonicalGrade::*};

    fn rec(code: &str, units: Option<u32>, grade: Option<CanonicalGrade>) -> CourseRecord {
        CourseRecord {
            course_code: code.to_string(),
            units,
            grade,
            section: None,
            instructor: None,
            raw_grade_token: None,
        }
    }

    #[test]
    fn table_rows_and_totals() {
        let table = CourseTable {
            records: vec![rec("IT 311", Some(3), Some(G175)), rec("CS 101", Some(3), Some(G200))],
            ..Default::default()
        };
        let text = render_grade_with_units(&aggregate_weighted_grades(&table));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Grades | Units | Weighted Grades |");
        assert_eq!(lines[1], "1.75   | 3     | 5.25          |");
        assert_eq!(lines[2], "2.00   | 3     | 6             |");
        assert_eq!(lines[3], "Total:   | 6     | 11.25         |");
        assert_eq!(lines[4], "Weighted Average: 1.8750");
    }

    #[test]
    fn empty_cells_for_inc_and_missing_units() {
        let table = CourseTable {
            records: vec![rec("CS 102", Some(3), Some(Inc)), rec("IT 312", None, Some(G100))],
            ..Default::default()
        };
        let text = render_grade_with_units(&aggregate_weighted_grades(&table));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "INC    | 3     |               |");
        assert_eq!(lines[2], "1.00   |       |               |");
    }

    #[test]
    fn no_units_renders_empty_average() {
        let text = render_grade_with_units(&aggregate_weighted_grades(&CourseTable::default()));
        assert!(text.ends_with("Weighted Average: "));
    }

    #[test]
    fn summary_carries_metadata_and_records() {
        let meta = DocumentMetadata {
            sr_code: "2104738".to_string(),
            full_name: "DELA CRUZ, JUAN M.".to_string(),
            semester: "2nd".to_string(),
            ..Default::default()
        };
        let records = vec![rec("IT 311", Some(3), Some(G150))];
        let text = render_document_summary(&meta, &records, &[]);
        assert!(text.contains("Fullname : DELA CRUZ, JUAN M. SRCODE : 2104738"));
        assert!(text.contains("1 IT 311 3 1.50"));
    }
}
