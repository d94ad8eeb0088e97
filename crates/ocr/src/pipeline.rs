use std::path::{Path, PathBuf};
use thiserror::Error;

use gradecheck_core::record::{CourseTable, DocumentMetadata, SkipEntry};
use gradecheck_extract::{
    extract_course_records, extract_metadata_coe, extract_metadata_cog, ExclusionSet,
};

use crate::recognizer::{OcrBackend, OcrError};
use crate::store;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

/// Which document shape the pipeline should extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Certificate of Enrollment — metadata only, no course table.
    Coe,
    /// Certificate of Grades — metadata plus the course table.
    Cog,
}

/// The result of a single document processing run.
#[derive(Debug)]
pub struct ProcessedDocument {
    /// SHA-256 hex digest of the original file — the content-addressed key.
    pub hash_hex: String,
    /// Where the original file was stored in the documents tree.
    pub stored_path: PathBuf,
    /// Raw OCR text output, before cleanup.
    pub ocr_text: String,
    pub metadata: DocumentMetadata,
    /// Fields the extractor could not normalize.
    pub metadata_issues: Vec<SkipEntry>,
    /// Present only for COG documents.
    pub table: Option<CourseTable>,
}

/// Orchestrates: hash → content-store → OCR → scrub → extract.
pub struct DocumentPipeline<R: OcrBackend> {
    recognizer: R,
    documents_dir: PathBuf,
    exclusions: ExclusionSet,
}

impl<R: OcrBackend> DocumentPipeline<R> {
    pub fn new(recognizer: R, documents_dir: PathBuf) -> Self {
        Self { recognizer, documents_dir, exclusions: ExclusionSet::default() }
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Process an uploaded file on disk.
    pub async fn process_file(
        &self,
        path: &Path,
        kind: DocumentKind,
    ) -> Result<ProcessedDocument, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin")
            .to_lowercase();
        self.process_bytes(&bytes, &ext, kind).await
    }

    /// Process raw bytes (from an upload or file read).
    pub async fn process_bytes(
        &self,
        data: &[u8],
        ext: &str,
        kind: DocumentKind,
    ) -> Result<ProcessedDocument, PipelineError> {
        // 1. Hash for deduplication / content addressing.
        let hash_hex = store::to_hex(&store::sha256_bytes(data));

        // 2. Persist to content-addressed store.
        let dest = store::document_path(&self.documents_dir, &hash_hex, ext);
        store::write_atomic(&dest, data).await?;

        // 3. Run OCR.
        let ocr_text = self.recognizer.recognize(data)?;

        // 4. Extract per document shape.
        let extraction = match kind {
            DocumentKind::Coe => extract_metadata_coe(&ocr_text),
            DocumentKind::Cog => extract_metadata_cog(&ocr_text),
        };
        let table = match kind {
            DocumentKind::Coe => None,
            DocumentKind::Cog => Some(extract_course_records(&ocr_text, &self.exclusions)),
        };

        tracing::info!(
            hash = %hash_hex,
            kind = ?kind,
            issues = extraction.issues.len(),
            records = table.as_ref().map_or(0, |t| t.records.len()),
            "processed document"
        );

        Ok(ProcessedDocument {
            hash_hex,
            stored_path: dest,
            ocr_text,
            metadata: extraction.metadata,
            metadata_issues: extraction.issues,
            table,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::MockRecognizer;

    const COG_TEXT: &str = "\
Fullname : DELA CRUZ, JUAN M.
SRCODE : 21-04738
Academic Year : 2023-2024
Semester : Second
Year Level : Third
# Course Code Course Title Units Grade Section Instructor
1 IT 311 Systems Integration and Architecture 3 1.50 IT-BA-2024 Dela Cruz
2 CS 101 Intro to Computing 3 2.00 IT-BA-2024 Reyes
** NOTHING FOLLOWS **";

    #[tokio::test]
    async fn cog_run_stores_and_extracts() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline =
            DocumentPipeline::new(MockRecognizer::new(COG_TEXT), dir.path().to_path_buf());

        let result = pipeline
            .process_bytes(b"fake scan bytes", "png", DocumentKind::Cog)
            .await
            .unwrap();

        assert_eq!(result.hash_hex.len(), 64);
        assert!(result.stored_path.exists());
        assert_eq!(result.metadata.sr_code, "2104738");
        assert_eq!(result.metadata.semester, "2nd");

        let table = result.table.unwrap();
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0].course_code, "IT 311");
    }

    #[tokio::test]
    async fn coe_run_has_no_table() {
        let dir = tempfile::tempdir().unwrap();
        let text = "Name: DELA CRUZ, JUAN M.\nSECOND, A.Y. 2023-2024\nSR Code: 21-04738";
        let pipeline =
            DocumentPipeline::new(MockRecognizer::new(text), dir.path().to_path_buf());

        let result = pipeline
            .process_bytes(b"fake scan bytes", "jpg", DocumentKind::Coe)
            .await
            .unwrap();

        assert!(result.table.is_none());
        assert_eq!(result.metadata.sr_code, "2104738");
        assert_eq!(result.metadata.semester, "2nd");
        assert_eq!(result.metadata.academic_year, "2023-2024");
    }

    #[tokio::test]
    async fn storage_path_is_stable_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline =
            DocumentPipeline::new(MockRecognizer::new("irrelevant"), dir.path().to_path_buf());
        let data = b"same upload twice";

        let r1 = pipeline.process_bytes(data, "png", DocumentKind::Coe).await.unwrap();
        let r2 = pipeline.process_bytes(data, "png", DocumentKind::Coe).await.unwrap();

        assert_eq!(r1.hash_hex, r2.hash_hex);
        assert_eq!(r1.stored_path, r2.stored_path);
    }
}
