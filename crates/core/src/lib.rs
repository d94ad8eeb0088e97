pub mod aggregate;
pub mod clean;
pub mod grade;
pub mod program;
pub mod record;

pub use aggregate::{aggregate_weighted_grades, AggregateResult, AggregateRow};
pub use clean::scrub_ocr_noise;
pub use grade::{normalize_grade_token, CanonicalGrade};
pub use program::{split_program, ProgramDecomposition};
pub use record::{CourseRecord, CourseTable, DocumentMetadata, SkipEntry, SkipReason};
