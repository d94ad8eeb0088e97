pub mod grade_block;
pub mod verdict;

pub use grade_block::{parse_grade_block, render_grade_block};
pub use verdict::{
    check_tamper, verify_grade_sequences, verify_metadata, FieldMatches, GradeComparison,
    MetadataVerdict, MissingSource, TamperCheck,
};
