use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::grade::CanonicalGrade;
use crate::record::CourseTable;

/// One display row of the weighted-grades table. Weighted value is in
/// hundredths (grade hundredths × units), the same exact-integer idiom as
/// keeping money in cents; `None` renders as an empty cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub grade: Option<CanonicalGrade>,
    pub units: Option<u32>,
    pub weighted_hundredths: Option<i64>,
}

impl AggregateRow {
    pub fn weighted(&self) -> Option<Decimal> {
        self.weighted_hundredths.map(|h| Decimal::new(h, 2))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    pub rows: Vec<AggregateRow>,
    pub total_units: u32,
    pub total_weighted_hundredths: i64,
    /// `total_weighted / total_units` at 4 decimal places; `None` when no
    /// units were parsed (renders as an empty value).
    pub weighted_average: Option<Decimal>,
    pub excluded_codes: BTreeSet<String>,
}

impl AggregateResult {
    pub fn total_weighted(&self) -> Decimal {
        Decimal::new(self.total_weighted_hundredths, 2)
    }
}

/// Compute per-course weighted grades and totals over an extracted course
/// table. INC grades and rows without units still display, but contribute
/// nothing to the totals.
pub fn aggregate_weighted_grades(table: &CourseTable) -> AggregateResult {
    let mut rows = Vec::with_capacity(table.records.len());
    let mut total_units: u32 = 0;
    let mut total_weighted: i64 = 0;

    for rec in &table.records {
        let grade_hundredths = rec.grade.and_then(CanonicalGrade::hundredths);
        let weighted = match (grade_hundredths, rec.units) {
            (Some(g), Some(u)) => Some(i64::from(g) * i64::from(u)),
            _ => None,
        };
        if let Some(u) = rec.units {
            total_units += u;
        }
        if let Some(w) = weighted {
            total_weighted += w;
        }
        rows.push(AggregateRow {
            grade: rec.grade,
            units: rec.units,
            weighted_hundredths: weighted,
        });
    }

    let weighted_average = if total_units > 0 {
        Some(
            (Decimal::new(total_weighted, 2) / Decimal::from(total_units)).round_dp(4),
        )
    } else {
        None
    };

    AggregateResult {
        rows,
        total_units,
        total_weighted_hundredths: total_weighted,
        weighted_average,
        excluded_codes: table.excluded_codes.clone(),
    }
}
