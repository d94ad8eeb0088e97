pub mod courses;
pub mod metadata;

pub use courses::{extract_course_records, ExclusionSet};
pub use metadata::{extract_metadata_coe, extract_metadata_cog, MetadataExtraction};
