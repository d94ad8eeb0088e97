use serde::{Deserialize, Serialize};

use gradecheck_core::record::DocumentMetadata;
use gradecheck_core::CanonicalGrade;

// ── Metadata cross-check ─────────────────────────────────────────────────────

/// Per-field equality over the four fields both document shapes share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMatches {
    pub sr_code: bool,
    pub academic_year: bool,
    pub semester: bool,
    pub year_level: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataVerdict {
    pub matches: FieldMatches,
    pub all_match: bool,
}

/// Compare normalized metadata from two independently extracted documents.
/// Straight equality per field — both sides went through the same
/// normalization, so any residual difference is a real discrepancy.
pub fn verify_metadata(a: &DocumentMetadata, b: &DocumentMetadata) -> MetadataVerdict {
    let matches = FieldMatches {
        sr_code: a.sr_code == b.sr_code,
        academic_year: a.academic_year == b.academic_year,
        semester: a.semester == b.semester,
        year_level: a.year_level == b.year_level,
    };
    let all_match =
        matches.sr_code && matches.academic_year && matches.semester && matches.year_level;
    MetadataVerdict { matches, all_match }
}

// ── Grade-sequence tamper check ──────────────────────────────────────────────

/// Positional comparison of two grade sequences. Only exact element-for-
/// element equality counts as a pass; OCR noise was already absorbed by
/// grade normalization on both sides, so any difference here means the
/// printed document and its QR-linked source disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeComparison {
    pub exact_match: bool,
    pub same_length: bool,
    /// (position, side A, side B) for every index where both sides have a
    /// grade but they differ.
    pub positional_mismatches: Vec<(usize, CanonicalGrade, CanonicalGrade)>,
    pub only_in_a: Vec<CanonicalGrade>,
    pub only_in_b: Vec<CanonicalGrade>,
}

pub fn verify_grade_sequences(
    seq_a: &[CanonicalGrade],
    seq_b: &[CanonicalGrade],
) -> GradeComparison {
    let positional_mismatches: Vec<_> = seq_a
        .iter()
        .zip(seq_b.iter())
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(i, (a, b))| (i, *a, *b))
        .collect();

    // Count-aware set difference per side.
    let only_in_a = multiset_difference(seq_a, seq_b);
    let only_in_b = multiset_difference(seq_b, seq_a);

    GradeComparison {
        exact_match: seq_a == seq_b,
        same_length: seq_a.len() == seq_b.len(),
        positional_mismatches,
        only_in_a,
        only_in_b,
    }
}

fn multiset_difference(a: &[CanonicalGrade], b: &[CanonicalGrade]) -> Vec<CanonicalGrade> {
    let mut pool: Vec<CanonicalGrade> = b.to_vec();
    a.iter()
        .filter(|g| {
            match pool.iter().position(|p| p == *g) {
                Some(idx) => {
                    pool.swap_remove(idx);
                    false
                }
                None => true,
            }
        })
        .copied()
        .collect()
}

/// Which side of the tamper check is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSource {
    Document,
    Reference,
    Both,
}

/// Outcome of the full tamper check. A missing source is a distinguished
/// "cannot verify" result, not an error — and it counts as tampered for
/// acceptance purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TamperCheck {
    CannotVerify { missing: MissingSource },
    Compared(GradeComparison),
}

impl TamperCheck {
    pub fn is_verified(&self) -> bool {
        matches!(self, TamperCheck::Compared(c) if c.exact_match)
    }
}

/// Tamper-check two independently obtained grade sequences, either of
/// which may be absent (upload failed, QR page unreachable).
pub fn check_tamper(
    document: Option<&[CanonicalGrade]>,
    reference: Option<&[CanonicalGrade]>,
) -> TamperCheck {
    match (document, reference) {
        (None, None) => TamperCheck::CannotVerify { missing: MissingSource::Both },
        (None, Some(_)) => TamperCheck::CannotVerify { missing: MissingSource::Document },
        (Some(_), None) => TamperCheck::CannotVerify { missing: MissingSource::Reference },
        (Some(d), Some(r)) => {
            let cmp = verify_grade_sequences(d, r);
            if !cmp.exact_match {
                tracing::info!(
                    mismatches = cmp.positional_mismatches.len(),
                    same_length = cmp.same_length,
                    "grade sequences disagree"
                );
            }
            TamperCheck::Compared(cmp)
        }
    }
}
